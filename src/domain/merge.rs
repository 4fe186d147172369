//! Structure-preserving bulk edit of the preload list.
//!
//! [`Merge`] walks the classified lines once. Entry lines named in the
//! [`RemovalSet`] are dropped, new entries are spliced in sorted order right
//! before the insertion marker, and every other line is reproduced verbatim.

use std::borrow::Cow;
use std::collections::{BTreeSet, VecDeque};

use itertools::Itertools;
use tracing::{debug, info};

use crate::domain::entry::{Entry, EntryTemplate};
use crate::domain::error::StructureError;
use crate::domain::line::{Document, Line, LineKind};

/// The comment line before which new bulk entries are inserted.
pub const DEFAULT_INSERTION_MARKER: &str = "    // END OF 1-YEAR BULK HSTS ENTRIES";

/// Domains still pending removal.
///
/// Shrinks while a merge consumes matches; what is left afterwards was not
/// found in the document. Use a fresh set for every merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalSet {
    pending: BTreeSet<String>,
}

impl RemovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `domain` from the set, returning whether it was pending.
    pub fn take(&mut self, domain: &str) -> bool {
        self.pending.remove(domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.pending.contains(domain)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Domains not (yet) matched, sorted.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RemovalSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            pending: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for RemovalSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.pending.extend(iter.into_iter().map(Into::into));
    }
}

/// Domains to insert, all with the same template.
///
/// Not deduplicated: repeated domains produce repeated lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionSet {
    domains: Vec<String>,
    template: EntryTemplate,
}

impl AdditionSet {
    pub fn new<S: Into<String>>(domains: impl IntoIterator<Item = S>, template: EntryTemplate) -> Self {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            template,
        }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn template(&self) -> &EntryTemplate {
        &self.template
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Encoded entry lines in ascending domain order.
    pub fn entry_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.domains
            .iter()
            .sorted()
            .map(|domain| self.template.entry(domain).to_line())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Entry lines dropped because their domain was pending removal
    pub removed: usize,
    /// Entry lines synthesized from the addition set
    pub inserted: usize,
    /// Entry lines passed through unchanged
    pub kept: usize,
    pub marker_seen: bool,
}

/// Lazy, single-pass merge over classified lines.
pub struct Merge<'r, 'l, I> {
    lines: I,
    removals: &'r mut RemovalSet,
    additions: &'r AdditionSet,
    marker: &'r str,
    queued: VecDeque<Cow<'l, str>>,
    stats: MergeStats,
    failed: bool,
}

impl<'r, 'l, I> Merge<'r, 'l, I>
where
    I: Iterator<Item = Line<'l>>,
{
    pub fn new(
        lines: I,
        removals: &'r mut RemovalSet,
        additions: &'r AdditionSet,
        marker: &'r str,
    ) -> Self {
        Self {
            lines,
            removals,
            additions,
            marker,
            queued: VecDeque::new(),
            stats: MergeStats::default(),
            failed: false,
        }
    }

    /// Counters so far; final once the iterator is exhausted.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    fn fail(&mut self, err: StructureError) -> Option<Result<Cow<'l, str>, StructureError>> {
        self.failed = true;
        Some(Err(err))
    }
}

impl<'r, 'l, I> Iterator for Merge<'r, 'l, I>
where
    I: Iterator<Item = Line<'l>>,
{
    type Item = Result<Cow<'l, str>, StructureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(queued) = self.queued.pop_front() {
            return Some(Ok(queued));
        }
        if self.failed {
            return None;
        }

        loop {
            let line = self.lines.next()?;

            if line.kind == LineKind::Entry {
                let entry = match Entry::from_line(line.content) {
                    Ok(entry) => entry,
                    Err(e) => {
                        return self.fail(StructureError::InvalidEntry {
                            line: line.number,
                            message: e.to_string(),
                        })
                    }
                };
                if self.removals.take(&entry.name) {
                    debug!("removing {} (line {})", entry.name, line.number);
                    self.stats.removed += 1;
                    continue;
                }
                self.stats.kept += 1;
                return Some(Ok(Cow::Borrowed(line.content)));
            }

            if line.content == self.marker {
                if self.stats.marker_seen {
                    return self.fail(StructureError::InsertionMarkerDuplicated {
                        line: line.number,
                        marker: self.marker.to_string(),
                    });
                }
                self.stats.marker_seen = true;
                self.queued.extend(self.additions.entry_lines().map(Cow::Owned));
                self.stats.inserted += self.additions.len();
                self.queued.push_back(Cow::Borrowed(line.content));
                return self.queued.pop_front().map(Ok);
            }

            return Some(Ok(Cow::Borrowed(line.content)));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub stats: MergeStats,
}

/// Run a merge to completion and render the result.
///
/// Fails if additions were requested but the insertion marker never showed up.
pub fn merge_document(
    doc: &Document<'_>,
    removals: &mut RemovalSet,
    additions: &AdditionSet,
    marker: &str,
) -> Result<MergeOutcome, StructureError> {
    let mut merge = Merge::new(doc.lines().iter().copied(), removals, additions, marker);
    let mut text = String::new();
    for line in merge.by_ref() {
        text.push_str(&line?);
        text.push('\n');
    }
    let stats = merge.stats();

    if !stats.marker_seen && !additions.is_empty() {
        return Err(StructureError::InsertionMarkerMissing(marker.to_string()));
    }

    info!("Removed: {}, inserted: {}", stats.removed, stats.inserted);
    Ok(MergeOutcome { text, stats })
}

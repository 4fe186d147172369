//! Check service
//!
//! Read-only validation of a preload list: band structure, JSON round trip
//! and duplicate entries.

use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::region::BandSummary;
use crate::domain::{find_duplicates, parse_without_comments, Document, LineKind};
use crate::infrastructure::traits::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub lines: usize,
    pub entry_lines: usize,
    pub comment_lines: usize,
    pub entries: usize,
    pub bulk_entries: usize,
    pub bands: Vec<BandSummary>,
    pub duplicates: Vec<String>,
}

pub struct CheckService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl CheckService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn check(&self, list_path: &Path) -> ApplicationResult<CheckReport> {
        let text = self
            .fs
            .read_to_string(list_path)
            .with_path_context("read preload list", list_path)?;
        let doc = Document::parse(&text);

        let extraction = self.settings.extractor()?.extract(&doc)?;
        let list = parse_without_comments(&text)?;

        Ok(CheckReport {
            lines: doc.len(),
            entry_lines: doc.count(LineKind::Entry),
            comment_lines: doc.count(LineKind::Comment),
            entries: list.entries.len(),
            bulk_entries: extraction.entries.len(),
            bands: extraction.bands,
            duplicates: find_duplicates(&list.entries).into_iter().collect(),
        })
    }
}

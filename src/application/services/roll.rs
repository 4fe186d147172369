//! Roll service
//!
//! Applies pending removals and additions to a preload list file and writes
//! the rejected pending additions next to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::pending::rejections_json;
use crate::domain::{
    find_duplicates, merge_document, parse_without_comments, partition_pending, sanity_check,
    AdditionSet, Document, PendingScanResult, RemovalSet,
};
use crate::infrastructure::traits::{FileSystem, PreloadSource};

/// Where pending removals come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalSource {
    /// hstspreload.org; optionally including the automated removal queue
    Fetch { automated: bool },
    /// JSON array of domain names
    File(PathBuf),
    /// No removals this run
    Skip,
}

#[derive(Debug, Clone)]
pub struct RollRequest {
    pub list_path: PathBuf,
    pub pending_scan_path: PathBuf,
    pub rejected_path: PathBuf,
    pub removals: RemovalSource,
}

/// Outcome of a successful roll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollReport {
    pub removed: usize,
    pub inserted: usize,
    pub rejected: usize,
    /// Removal requests with no matching entry
    pub unmatched_removals: Vec<String>,
    /// Domains with more than one entry after the roll
    pub duplicates: Vec<String>,
}

impl RollReport {
    /// No warnings for the operator.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.unmatched_removals.is_empty()
    }
}

pub struct RollService {
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn PreloadSource>,
    settings: Arc<Settings>,
}

impl RollService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn PreloadSource>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            source,
            settings,
        }
    }

    /// Roll the list. Nothing is written unless every step succeeds.
    #[instrument(level = "debug", skip(self))]
    pub fn roll(&self, request: &RollRequest) -> ApplicationResult<RollReport> {
        let text = self
            .fs
            .read_to_string(&request.list_path)
            .with_path_context("read preload list", &request.list_path)?;

        let mut removals = self.removals(&request.removals)?;
        info!("{} pending removals", removals.len());

        let scan = self.read_pending_scan(&request.pending_scan_path)?;
        let partition = partition_pending(scan);
        sanity_check(
            partition.additions.iter().map(String::as_str),
            &self.settings.deny_list,
        )?;
        let additions = AdditionSet::new(partition.additions, self.settings.entry_template());

        info!("Removing and adding entries...");
        let doc = Document::parse(&text);
        let outcome = merge_document(
            &doc,
            &mut removals,
            &additions,
            &self.settings.insertion_marker,
        )?;

        info!("Checking for duplicates...");
        let list = parse_without_comments(&outcome.text)?;
        let duplicates: Vec<String> = find_duplicates(&list.entries).into_iter().collect();

        let rejections = rejections_json(&partition.rejections).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize rejected domains".to_string(),
                source: Box::new(e),
            }
        })?;

        info!(
            "Writing to {} and {}...",
            request.list_path.display(),
            request.rejected_path.display()
        );
        self.fs
            .write_all(&[
                (request.list_path.as_path(), outcome.text.as_str()),
                (request.rejected_path.as_path(), rejections.as_str()),
            ])
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!(
                    "write {} and {}",
                    request.list_path.display(),
                    request.rejected_path.display()
                ),
                source: Box::new(e),
            })?;

        let unmatched_removals: Vec<String> = removals.remaining().map(String::from).collect();
        if !unmatched_removals.is_empty() {
            warn!("{} removals not found in the list", unmatched_removals.len());
        }
        if !duplicates.is_empty() {
            warn!("{} duplicate entries", duplicates.len());
        }

        Ok(RollReport {
            removed: outcome.stats.removed,
            inserted: outcome.stats.inserted,
            rejected: partition.rejections.len(),
            unmatched_removals,
            duplicates,
        })
    }

    fn removals(&self, source: &RemovalSource) -> ApplicationResult<RemovalSet> {
        match source {
            RemovalSource::Skip => Ok(RemovalSet::new()),
            RemovalSource::File(path) => {
                let content = self
                    .fs
                    .read_to_string(path)
                    .with_path_context("read pending removals", path)?;
                let domains: Vec<String> =
                    serde_json::from_str(&content).map_err(|e| ApplicationError::OperationFailed {
                        context: format!("parse pending removals {}", path.display()),
                        source: Box::new(e),
                    })?;
                Ok(domains.into_iter().collect())
            }
            RemovalSource::Fetch { automated } => {
                let mut removals: RemovalSet = self.source.pending_removals()?.into_iter().collect();
                if *automated {
                    removals.extend(self.source.pending_automated_removals()?);
                }
                Ok(removals)
            }
        }
    }

    fn read_pending_scan(&self, path: &Path) -> ApplicationResult<Vec<PendingScanResult>> {
        info!("Fetching pending list from {}", path.display());
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read pending scan", path)?;
        serde_json::from_str(&content).map_err(|e| ApplicationError::OperationFailed {
            context: format!("parse pending scan {}", path.display()),
            source: Box::new(e),
        })
    }
}

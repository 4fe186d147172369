//! Bulk export service
//!
//! Extracts the bulk-managed domains from the preload list bands and writes
//! them as a JSON object mapping each domain to `true`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::region::BandSummary;
use crate::domain::{sanity_check, Document, Extraction};
use crate::infrastructure::traits::{FileSystem, PreloadSource};

#[derive(Debug, Clone)]
pub struct BulkRequest {
    /// Local list; fetched from Chromium source when absent
    pub list_path: Option<PathBuf>,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub domains: usize,
    pub bands: Vec<BandSummary>,
}

pub struct BulkService {
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn PreloadSource>,
    settings: Arc<Settings>,
}

impl BulkService {
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

    #[instrument(level = "debug", skip(self))]
    pub fn export(&self, request: &BulkRequest) -> ApplicationResult<BulkReport> {
        let text = match &request.list_path {
            Some(path) => self
                .fs
                .read_to_string(path)
                .with_path_context("read preload list", path)?,
            None => self.source.preload_list()?,
        };

        let extraction = self.extract(&text)?;
        let json = domain_map_json(&extraction).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize bulk domains".to_string(),
            source: Box::new(e),
        })?;

        info!("Writing {}...", request.output_path.display());
        self.fs
            .write(&request.output_path, &json)
            .with_path_context("write bulk domains", &request.output_path)?;

        Ok(BulkReport {
            domains: extraction.entries.len(),
            bands: extraction.bands,
        })
    }

    /// Extract and sanity-check the bulk entries of `text`.
    pub fn extract(&self, text: &str) -> ApplicationResult<Extraction> {
        info!("Extracting bulk entries...");
        let extractor = self.settings.extractor()?;
        let extraction = extractor.extract(&Document::parse(text))?;
        sanity_check(extraction.domains(), &self.settings.deny_list)?;
        Ok(extraction)
    }
}

/// `{"domain": true, ...}` in document order, with `", "` and `": "`
/// separators on a single line.
fn domain_map_json(extraction: &Extraction) -> Result<String, serde_json::Error> {
    let members = extraction
        .domains()
        .map(|domain| -> Result<String, serde_json::Error> {
            Ok(format!("{}: true", serde_json::to_string(domain)?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{{{}}}", members.join(", ")))
}

//! Pending-addition scan results and their partition into additions and
//! rejections.

use serde::{Deserialize, Serialize};
use tracing::info;

/// One issue reported by the eligibility scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issues {
    #[serde(default)]
    pub errors: Vec<Issue>,
    #[serde(default)]
    pub warnings: Vec<Issue>,
}

/// A raw pending-addition record.
///
/// Errors are read from `issues.errors` (scan output) or from a top-level
/// `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingScanResult {
    pub domain: String,
    #[serde(default)]
    pub issues: Issues,
    #[serde(default)]
    pub errors: Vec<Issue>,
}

impl PendingScanResult {
    pub fn error_codes(&self) -> Vec<String> {
        self.issues
            .errors
            .iter()
            .chain(&self.errors)
            .map(|issue| issue.code.clone())
            .collect()
    }
}

/// A pending addition that was not preloaded, with the reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub domain: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Clean domains, in source order
    pub additions: Vec<String>,
    pub rejections: Vec<Rejection>,
}

/// Split scan results into domains to preload and rejections.
pub fn partition_pending(results: Vec<PendingScanResult>) -> Partition {
    let mut partition = Partition::default();
    for result in results {
        let codes = result.error_codes();
        if codes.is_empty() {
            partition.additions.push(result.domain);
        } else {
            partition.rejections.push(Rejection {
                domain: result.domain,
                errors: codes,
            });
        }
    }
    info!("Pending entries preloaded: {}", partition.additions.len());
    info!("Pending entries rejected: {}", partition.rejections.len());
    partition
}

/// Pretty-printed rejection list, as written next to the rolled list.
pub fn rejections_json(rejections: &[Rejection]) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(rejections)?;
    json.push('\n');
    Ok(json)
}

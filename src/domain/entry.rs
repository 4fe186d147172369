//! Preload list entries and the one-line codec.
//!
//! Every entry line written by this crate goes through [`Entry::to_line`], and
//! every entry line read goes through [`Entry::from_line`], so synthesized
//! lines and hand-written ones share field order and spacing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const BULK_1_YEAR: &str = "bulk-1-year";
pub const FORCE_HTTPS: &str = "force-https";

const INDENT: &str = "    ";

/// One entry of the preload list.
///
/// Only the fields the roll needs are typed; everything else (pins,
/// expect_ct, ...) is kept in `extra` in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_subdomains: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Decode an Entry-kind line (`    { ... },`).
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        let trimmed = line.trim_end();
        let object = trimmed.strip_suffix(',').unwrap_or(trimmed);
        serde_json::from_str(object)
    }

    /// Encode as a single indented line with a trailing separator.
    pub fn to_line(&self) -> String {
        let mut fields: Vec<(&str, Value)> = vec![("name", Value::from(self.name.as_str()))];
        if let Some(policy) = &self.policy {
            fields.push(("policy", Value::from(policy.as_str())));
        }
        if let Some(mode) = &self.mode {
            fields.push(("mode", Value::from(mode.as_str())));
        }
        if let Some(include) = self.include_subdomains {
            fields.push(("include_subdomains", Value::from(include)));
        }
        for (key, value) in &self.extra {
            fields.push((key.as_str(), value.clone()));
        }

        let body = fields
            .iter()
            .map(|(key, value)| format!("{}: {}", Value::from(*key), value))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{INDENT}{{ {body} }},")
    }
}

/// Fixed attributes for entries added by the roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTemplate {
    pub policy: String,
    pub mode: String,
    pub include_subdomains: bool,
}

impl EntryTemplate {
    pub fn bulk(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            mode: FORCE_HTTPS.to_string(),
            include_subdomains: true,
        }
    }

    pub fn entry(&self, domain: &str) -> Entry {
        Entry {
            name: domain.to_string(),
            policy: Some(self.policy.clone()),
            mode: Some(self.mode.clone()),
            include_subdomains: Some(self.include_subdomains),
            extra: Map::new(),
        }
    }
}

impl Default for EntryTemplate {
    fn default() -> Self {
        Self::bulk(BULK_1_YEAR)
    }
}

//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/hstsroll/hstsroll.toml`
//! 3. Explicit config file: `--config <file>`
//! 4. Environment variables: `HSTSROLL_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::entry::{EntryTemplate, BULK_1_YEAR};
use crate::domain::merge::DEFAULT_INSERTION_MARKER;
use crate::domain::region::{default_bands, Band, RegionExtractor, DEFAULT_MARKER_FAMILY};
use crate::domain::validate::default_deny_list;
use crate::domain::StructureError;

pub const PRELOAD_LIST_URL: &str = "https://chromium.googlesource.com/chromium/src/+/main/net/http/transport_security_state_static.json?format=TEXT";
pub const PENDING_REMOVAL_URL: &str = "https://hstspreload.org/api/v2/pending-removal";
pub const PENDING_AUTOMATED_REMOVAL_URL: &str =
    "https://hstspreload.org/api/v2/pending-automated-removal";

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub preload_list_url: Option<String>,
    pub pending_removal_url: Option<String>,
    pub pending_automated_removal_url: Option<String>,
    pub include_automated_removals: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub insertion_marker: Option<String>,
    pub bulk_policy: Option<String>,
    pub marker_family: Option<String>,
    pub bands: Option<Vec<Band>>,
    pub deny_list: Option<Vec<String>>,
}

/// Unified configuration for hstsroll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Chromium source of the list (base64, gitiles `?format=TEXT`)
    pub preload_list_url: String,
    pub pending_removal_url: String,
    pub pending_automated_removal_url: String,
    /// Also remove domains queued by the automated removal job
    pub include_automated_removals: bool,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Exact line before which new entries are inserted
    pub insertion_marker: String,
    /// Policy tier written on inserted entries
    pub bulk_policy: String,
    /// Substring shared by all band markers
    pub marker_family: String,
    /// Domains that must never appear in bulk output
    pub deny_list: Vec<String>,
    /// Bulk bands in document order
    pub bands: Vec<Band>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preload_list_url: PRELOAD_LIST_URL.to_string(),
            pending_removal_url: PENDING_REMOVAL_URL.to_string(),
            pending_automated_removal_url: PENDING_AUTOMATED_REMOVAL_URL.to_string(),
            include_automated_removals: true,
            timeout_secs: 30,
            insertion_marker: DEFAULT_INSERTION_MARKER.to_string(),
            bulk_policy: BULK_1_YEAR.to_string(),
            marker_family: DEFAULT_MARKER_FAMILY.to_string(),
            deny_list: default_deny_list(),
            bands: default_bands(),
        }
    }
}

/// Get the XDG config directory for hstsroll.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hstsroll").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("hstsroll.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            preload_list_url: overlay
                .preload_list_url
                .clone()
                .unwrap_or_else(|| self.preload_list_url.clone()),
            pending_removal_url: overlay
                .pending_removal_url
                .clone()
                .unwrap_or_else(|| self.pending_removal_url.clone()),
            pending_automated_removal_url: overlay
                .pending_automated_removal_url
                .clone()
                .unwrap_or_else(|| self.pending_automated_removal_url.clone()),
            include_automated_removals: overlay
                .include_automated_removals
                .unwrap_or(self.include_automated_removals),
            timeout_secs: overlay.timeout_secs.unwrap_or(self.timeout_secs),
            insertion_marker: overlay
                .insertion_marker
                .clone()
                .unwrap_or_else(|| self.insertion_marker.clone()),
            bulk_policy: overlay
                .bulk_policy
                .clone()
                .unwrap_or_else(|| self.bulk_policy.clone()),
            marker_family: overlay
                .marker_family
                .clone()
                .unwrap_or_else(|| self.marker_family.clone()),
            deny_list: overlay
                .deny_list
                .clone()
                .unwrap_or_else(|| self.deny_list.clone()),
            bands: overlay.bands.clone().unwrap_or_else(|| self.bands.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given on the command line; must exist
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/hstsroll/hstsroll.toml`
    /// 3. Explicit config file
    /// 4. Environment variables: `HSTSROLL_*` prefix
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = explicit {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply HSTSROLL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("HSTSROLL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("deny_list")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("preload_list_url") {
            settings.preload_list_url = val;
        }
        if let Ok(val) = config.get_string("pending_removal_url") {
            settings.pending_removal_url = val;
        }
        if let Ok(val) = config.get_string("pending_automated_removal_url") {
            settings.pending_automated_removal_url = val;
        }
        if let Ok(val) = config.get_bool("include_automated_removals") {
            settings.include_automated_removals = val;
        }
        if let Ok(val) = config.get_int("timeout_secs") {
            settings.timeout_secs = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("timeout_secs must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("insertion_marker") {
            settings.insertion_marker = val;
        }
        if let Ok(val) = config.get_string("bulk_policy") {
            settings.bulk_policy = val;
        }
        if let Ok(val) = config.get_string("marker_family") {
            settings.marker_family = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("deny_list") {
            settings.deny_list = val;
        }

        Ok(settings)
    }

    /// Region extractor for the configured bands.
    pub fn extractor(&self) -> Result<RegionExtractor, StructureError> {
        RegionExtractor::new(self.bands.clone(), self.marker_family.clone())
    }

    /// Attributes for inserted entries.
    pub fn entry_template(&self) -> EntryTemplate {
        EntryTemplate::bulk(self.bulk_policy.clone())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# hstsroll configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/hstsroll/hstsroll.toml
#   Explicit: --config <file>
#   Env:      HSTSROLL_* environment variables (e.g. HSTSROLL_TIMEOUT_SECS=60)

# pending_removal_url = "https://hstspreload.org/api/v2/pending-removal"
# pending_automated_removal_url = "https://hstspreload.org/api/v2/pending-automated-removal"
# include_automated_removals = true
# timeout_secs = 30

# Exact line before which new entries are inserted
# insertion_marker = "    // END OF 1-YEAR BULK HSTS ENTRIES"
# bulk_policy = "bulk-1-year"

# Never allowed in bulk output
# deny_list = ["google.com", "gmail.com", "hstspreload.org"]

# Bulk bands, in document order (replaces the built-in list)
# marker_family = "BULK"
# [[bands]]
# name = "1-year"
# start = "START OF 1-YEAR BULK HSTS ENTRIES"
# end = "END OF 1-YEAR BULK HSTS ENTRIES"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

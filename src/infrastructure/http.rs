//! HTTP implementation of [`PreloadSource`].
//!
//! Chromium gitiles serves raw files base64-encoded when asked for
//! `?format=TEXT`; hstspreload.org serves the removal queues as JSON arrays of
//! domain names.

use std::time::Duration;

use base64::Engine;
use tracing::{debug, info};

use crate::config::Settings;
use crate::infrastructure::traits::{FetchError, PreloadSource};
use crate::infrastructure::{InfraError, InfraResult};

const USER_AGENT: &str = concat!("hstsroll/", env!("CARGO_PKG_VERSION"));

pub struct HttpPreloadSource {
    http: reqwest::blocking::Client,
    preload_list_url: String,
    pending_removal_url: String,
    pending_automated_removal_url: String,
}

impl HttpPreloadSource {
    pub fn new(settings: &Settings) -> InfraResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InfraError::Http {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            preload_list_url: settings.preload_list_url.clone(),
            pending_removal_url: settings.pending_removal_url.clone(),
            pending_automated_removal_url: settings.pending_automated_removal_url.clone(),
        })
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        self.http
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| FetchError::new(url, e))
    }

    fn get_domains(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let body = self.get_text(url)?;
        let domains: Vec<String> =
            serde_json::from_str(&body).map_err(|e| FetchError::new(url, e))?;
        info!("{} domains from {}", domains.len(), url);
        Ok(domains)
    }
}

impl PreloadSource for HttpPreloadSource {
    fn preload_list(&self) -> Result<String, FetchError> {
        info!("Fetching preload list from Chromium source...");
        let body = self.get_text(&self.preload_list_url)?;
        decode_gitiles_text(&body).map_err(|e| FetchError::new(&self.preload_list_url, e))
    }

    fn pending_removals(&self) -> Result<Vec<String>, FetchError> {
        info!("Fetching pending removals...");
        self.get_domains(&self.pending_removal_url)
    }

    fn pending_automated_removals(&self) -> Result<Vec<String>, FetchError> {
        info!("Fetching pending automated removals...");
        self.get_domains(&self.pending_automated_removal_url)
    }
}

/// Decode a gitiles `?format=TEXT` body (base64, possibly line-wrapped).
pub fn decode_gitiles_text(body: &str) -> Result<String, String> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| format!("invalid base64: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))
}

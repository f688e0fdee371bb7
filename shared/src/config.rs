use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::lifecycle::TransitionPolicy;

pub const DEFAULT_API_BASE_URL: &str = "https://improve-my-city-backend-main.onrender.com/api";
pub const DEFAULT_TOAST_MS: u64 = 4_000;
pub const DEFAULT_ERROR_TOAST_MS: u64 = 6_000;

/// Runtime settings supplied by the shell as JSON. Every field is optional
/// on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub transition_policy: TransitionPolicy,
    pub toast_duration_ms: u64,
    pub error_toast_duration_ms: u64,
    pub demo_mode: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            transition_policy: TransitionPolicy::default(),
            toast_duration_ms: DEFAULT_TOAST_MS,
            error_toast_duration_ms: DEFAULT_ERROR_TOAST_MS,
            demo_mode: false,
        }
    }
}

impl PortalConfig {
    /// Parses and validates shell-provided JSON.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: PortalConfig =
            serde_json::from_str(json).map_err(|e| ValidationError::Invalid {
                field: "config",
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.base_url().map(|_| ())
    }

    /// Base URL with a trailing slash so relative joins keep the `/api` path.
    pub fn base_url(&self) -> Result<Url, ValidationError> {
        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| ValidationError::Invalid {
            field: "api_base_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ValidationError::Invalid {
                field: "api_base_url",
                reason: "must be an http(s) URL with a host".to_string(),
            });
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ValidationError::Invalid {
                field: "api_base_url",
                reason: "credentials in the URL are not allowed".to_string(),
            });
        }
        Ok(url)
    }
}

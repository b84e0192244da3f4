//! Credentials for the remote forecast archive.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{CommonError, CommonResult};

/// Environment variable holding the API endpoint.
pub const URL_ENV: &str = "CDSAPI_URL";
/// Environment variable holding the API key.
pub const KEY_ENV: &str = "CDSAPI_KEY";

/// API endpoint and key, handed unchanged to the remote client.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// Load from `CDSAPI_URL` / `CDSAPI_KEY`.
    pub fn from_env() -> CommonResult<Self> {
        let url = std::env::var(URL_ENV)
            .map_err(|_| CommonError::MissingCredentials(URL_ENV.to_string()))?;
        let key = std::env::var(KEY_ENV)
            .map_err(|_| CommonError::MissingCredentials(KEY_ENV.to_string()))?;
        Ok(Self::new(url, key))
    }

    /// Load from a YAML file with `url:` and `key:` entries.
    pub fn from_yaml_file(path: &Path) -> CommonResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let credentials: Credentials = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded credentials file");
        Ok(credentials)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

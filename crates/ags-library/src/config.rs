//! Service configuration
//!
//! Every endpoint base and file path the subsystem touches lives here so
//! tests can point the protocol at a local mock server and a temp
//! directory. Defaults match the real Amazon hosts and a per-user cache
//! directory; a TOML file can override any field.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for a [`PrimeGamingService`](crate::PrimeGamingService)
/// instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Auth API base (registration, token, profile endpoints)
    pub api_base: String,
    /// Software-distribution service base (entitlement sync)
    pub sds_base: String,
    /// Sign-in page base for the authorization URL
    pub signin_base: String,
    /// Path of the credential document
    pub user_path: PathBuf,
    /// Path of the whole-library cache file
    pub cache_path: PathBuf,
    /// When set, a sign-in callback without an authorization code becomes
    /// an explicit error instead of a silent "still pending".
    pub surface_callback_errors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ags");
        Self {
            api_base: ags_auth::DEFAULT_API_BASE.to_string(),
            sds_base: ags_auth::DEFAULT_SDS_BASE.to_string(),
            signin_base: ags_auth::DEFAULT_SIGNIN_BASE.to_string(),
            user_path: cache_dir.join(".amazon.user"),
            cache_path: cache_dir.join("amazon-library.json"),
            surface_callback_errors: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields fall back to the defaults. Base URLs are validated
    /// to carry an http(s) scheme.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let config: ServiceConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_base", &self.api_base),
            ("sds_base", &self.sds_base),
            ("signin_base", &self.signin_base),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(Error::Config(format!(
                    "{name} must start with http:// or https://, got: {value}"
                )));
            }
        }
        Ok(())
    }
}

//! Credential storage for the registered device
//!
//! Manages the single JSON document holding the bearer tokens and account
//! metadata returned by device registration. All writes use atomic
//! temp-file + rename to prevent corruption on crash. The document is the
//! single source of truth for token data; sync calls read it immediately
//! before use.
//!
//! The registration response carries more than this subsystem consumes
//! (customer info, mac_dms tokens); unknown fields are preserved through
//! load/save round-trips via flattened maps.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::token::TokenRefreshResponse;

/// The persisted user document: tokens, obtain time, device extensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub tokens: Tokens,
    /// Epoch seconds when the access token was last (re)issued. Absent on
    /// documents written before the first refresh stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_obtain_time: Option<u64>,
    #[serde(default)]
    pub extensions: Extensions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub bearer: BearerToken,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bearer token set from registration / refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BearerToken {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Seconds until the access token expires (delta from obtain time).
    /// The endpoint returns this as either a number or a numeric string.
    #[serde(default, deserialize_with = "expires_in_lenient")]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-confirmed device identity from the registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub device_serial_number: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept `expires_in` as a number, a numeric string, or null.
fn expires_in_lenient<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Same leniency as [`expires_in_lenient`] but for contexts where the
/// field must be present (the refresh response).
pub(crate) fn expires_in_required<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    expires_in_lenient(deserializer)?
        .ok_or_else(|| D::Error::custom("expires_in missing or not numeric"))
}

impl UserData {
    /// Whether the access token has outlived its validity window.
    ///
    /// Fail-open: a document missing `token_obtain_time` or `expires_in`
    /// reports "not expired" so incomplete local state never blocks
    /// operation. Expired only when `now` is strictly past the window end.
    pub fn is_token_expired(&self, now_secs: u64) -> bool {
        match (self.token_obtain_time, self.tokens.bearer.expires_in) {
            // A window end past u64::MAX can never be in the past
            (Some(obtained), Some(expires_in)) => match obtained.checked_add(expires_in) {
                Some(window_end) => now_secs > window_end,
                None => false,
            },
            _ => false,
        }
    }

    /// Stamp the moment the current access token was issued.
    pub fn stamp_obtain_time(&mut self, now_secs: u64) {
        self.token_obtain_time = Some(now_secs);
    }

    /// Apply a refresh response in place.
    ///
    /// Replaces the access token and validity window and resets the obtain
    /// time. The refresh token is never rotated by the endpoint and stays
    /// untouched.
    pub fn apply_refresh(&mut self, response: &TokenRefreshResponse, now_secs: u64) {
        self.tokens.bearer.access_token = response.access_token.clone();
        self.tokens.bearer.expires_in = Some(response.expires_in);
        self.token_obtain_time = Some(now_secs);
    }

    /// Server-confirmed serial used as the hardware identity for sync calls.
    pub fn device_serial_number(&self) -> Option<&str> {
        self.extensions
            .device_info
            .as_ref()
            .map(|d| d.device_serial_number.as_str())
    }
}

/// Fixed-path store for the user document.
///
/// The file is fully replaced on every write. This subsystem never deletes
/// it; credential wipe is an external operation.
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a credential document exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the user document.
    pub async fn load(&self) -> Result<UserData> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Io(format!("reading user file: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::CredentialParse(format!("parsing user file: {e}")))
    }

    /// Persist the user document.
    ///
    /// Uses atomic write (temp file + rename) to prevent corruption.
    /// File permissions are set to 0600 (owner read/write only).
    pub async fn save(&self, user_data: &UserData) -> Result<()> {
        let json = serde_json::to_string(user_data)
            .map_err(|e| Error::CredentialParse(format!("serializing user file: {e}")))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Io("user file path has no parent directory".into()))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating user file directory: {e}")))?;

        let tmp_path = dir.join(format!(".user.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| Error::Io(format!("writing temp user file: {e}")))?;

        // Set 0600 permissions (unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| Error::Io(format!("setting user file permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp user file: {e}")))?;

        debug!(path = %self.path.display(), "persisted user data");
        Ok(())
    }
}

/// Current time as epoch seconds.
pub fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

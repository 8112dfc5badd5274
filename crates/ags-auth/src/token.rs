//! Device registration, token refresh, and the profile liveness probe
//!
//! Three auth API interactions:
//! 1. Device registration — exchanges the authorization code (plus the PKCE
//!    verifier) for the full credential document. One-time per login.
//! 2. Token refresh — exchanges the long-lived refresh token for a new
//!    access token. The refresh token itself is never rotated.
//! 3. Profile fetch — an authenticated GET used only to confirm the stored
//!    credentials are still accepted by the server.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::constants::{APP_NAME, APP_VERSION, DEVICE_MODEL, DEVICE_TYPE, LANGUAGE, OS_VERSION, USER_AGENT};
use crate::credentials::UserData;
use crate::error::{Error, Result};
use crate::login::LoginAttempt;

/// Response from the token endpoint on refresh.
///
/// `expires_in` is a delta in seconds from the response time. The caller
/// stamps the obtain time when applying it to the stored document.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    #[serde(deserialize_with = "crate::credentials::expires_in_required")]
    pub expires_in: u64,
}

/// Register this device with the auth API, completing a login attempt.
///
/// POSTs the authorization code together with the attempt's code verifier
/// and client id, plus the fixed launcher/device metadata, requesting the
/// `customer_info`/`device_info` extensions and `bearer`/`mac_dms` token
/// types. On success returns the nested `response.success` object as the
/// new [`UserData`] — the caller still has to stamp `token_obtain_time`
/// and persist it.
///
/// Any transport failure is an error; the caller aborts the login rather
/// than retrying.
pub async fn register_device(
    client: &reqwest::Client,
    api_base: &str,
    attempt: &LoginAttempt,
    code: &str,
) -> Result<UserData> {
    info!(client_id = %attempt.client_id, "registering a device");

    let body = json!({
        "auth_data": {
            "authorization_code": code,
            "client_domain": "DeviceLegacy",
            "client_id": attempt.client_id,
            "code_algorithm": "SHA-256",
            "code_verifier": attempt.verifier,
            "use_global_authentication": false,
        },
        "registration_data": {
            "app_name": APP_NAME,
            "app_version": APP_VERSION,
            "device_model": DEVICE_MODEL,
            "device_name": null,
            "device_serial": attempt.serial,
            "device_type": DEVICE_TYPE,
            "domain": "Device",
            "os_version": OS_VERSION,
        },
        "requested_extensions": ["customer_info", "device_info"],
        "requested_token_type": ["bearer", "mac_dms"],
        "user_context_map": {},
    });

    let url = format!("{api_base}/auth/register");
    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("registration request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Registration(format!(
            "register endpoint returned {status}: {body}"
        )));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| Error::Registration(format!("invalid registration response: {e}")))?;

    let success = payload
        .get("response")
        .and_then(|r| r.get("success"))
        .cloned()
        .ok_or_else(|| {
            Error::Registration("registration response missing response.success".into())
        })?;

    let user_data: UserData = serde_json::from_value(success)
        .map_err(|e| Error::Registration(format!("malformed registration payload: {e}")))?;
    info!("successfully registered a device");
    Ok(user_data)
}

/// Exchange the stored refresh token for a new access token.
///
/// Fixed grant shape: `source_token_type=refresh_token`,
/// `requested_token_type=access_token`, plus the launcher identity.
pub async fn refresh_token(
    client: &reqwest::Client,
    api_base: &str,
    refresh: &str,
) -> Result<TokenRefreshResponse> {
    info!("refreshing token");

    let body = json!({
        "source_token": refresh,
        "source_token_type": "refresh_token",
        "requested_token_type": "access_token",
        "app_name": APP_NAME,
        "app_version": APP_VERSION,
    });

    let url = format!("{api_base}/auth/token");
    let response = client
        .post(&url)
        .header("Accept", "application/json")
        .header("Accept-Language", LANGUAGE)
        .header("User-Agent", USER_AGENT)
        .header("charset", "utf-8")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenRefresh(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenRefreshResponse>()
        .await
        .map_err(|e| Error::TokenRefresh(format!("invalid refresh response: {e}")))
}

/// Fetch the user profile with the given access token.
///
/// Used only as a liveness probe for `is_connected`; the payload is opaque
/// to this subsystem.
pub async fn fetch_profile(
    client: &reqwest::Client,
    api_base: &str,
    access_token: &str,
) -> Result<Value> {
    let url = format!("{api_base}/user/profile");
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .header("Accept-Language", LANGUAGE)
        .header("User-Agent", USER_AGENT)
        .header("Authorization", format!("bearer {access_token}"))
        .send()
        .await
        .map_err(|e| Error::Http(format!("profile request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::NotAuthenticated(format!(
            "profile endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Http(format!("invalid profile response: {e}")))
}

//! Login attempt state and authorization URL construction
//!
//! A [`LoginAttempt`] holds the verifier/challenge/serial/client-id
//! quadruple for exactly one sign-in flow. The caller creates it when
//! opening the login page and hands the same value back when the callback
//! fires, so two concurrent attempts cannot clobber each other's verifier.
//! Each attempt gets a fresh verifier; challenges are never reused.

use reqwest::Url;
use tracing::info;

use crate::constants::{ASSOC_HANDLE, LANGUAGE, MARKETPLACE_ID, RETURN_TO};
use crate::error::{Error, Result};
use crate::identity::{client_id, device_serial};
use crate::pkce::{compute_challenge, generate_verifier};

/// In-flight login attempt state.
///
/// Created at URL-build time, consumed at callback time. Dropping it aborts
/// the attempt; there is nothing to clean up server-side.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub verifier: String,
    pub challenge: String,
    pub serial: String,
    pub client_id: String,
}

impl LoginAttempt {
    /// Start a fresh login attempt.
    ///
    /// Generates a new PKCE pair and derives the device serial and client
    /// id for this machine.
    pub fn begin() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        let serial = device_serial();
        let client_id = client_id(&serial);
        Self {
            verifier,
            challenge,
            serial,
            client_id,
        }
    }

    /// Build the full sign-in URL for this attempt.
    ///
    /// Embeds the S256 challenge, the `device:{client_id}` client id, and
    /// the fixed marketplace/locale/redirect parameter set of the
    /// games-launcher sign-in flow.
    pub fn authorization_url(&self, signin_base: &str) -> Result<String> {
        let mut url = Url::parse(signin_base)
            .map_err(|e| Error::InvalidUrl(format!("sign-in base {signin_base}: {e}")))?;

        url.query_pairs_mut()
            .append_pair("openid.ns", "http://specs.openid.net/auth/2.0")
            .append_pair(
                "openid.claimed_id",
                "http://specs.openid.net/auth/2.0/identifier_select",
            )
            .append_pair(
                "openid.identity",
                "http://specs.openid.net/auth/2.0/identifier_select",
            )
            .append_pair("openid.mode", "checkid_setup")
            .append_pair("openid.oa2.scope", "device_auth_access")
            .append_pair("openid.ns.oa2", "http://www.amazon.com/ap/ext/oauth/2")
            .append_pair("openid.oa2.response_type", "code")
            .append_pair("openid.oa2.code_challenge_method", "S256")
            .append_pair("openid.oa2.client_id", &format!("device:{}", self.client_id))
            .append_pair("language", LANGUAGE)
            .append_pair("marketPlaceId", MARKETPLACE_ID)
            .append_pair("openid.return_to", RETURN_TO)
            .append_pair("openid.pape.max_auth_age", "0")
            .append_pair("openid.assoc_handle", ASSOC_HANDLE)
            .append_pair("pageId", ASSOC_HANDLE)
            .append_pair("openid.oa2.code_challenge", &self.challenge);

        Ok(url.into())
    }
}

/// Extract the authorization code from a sign-in callback URL.
///
/// Returns `None` when the `openid.oa2.authorization_code` query parameter
/// is absent — the user has not completed login, or a different callback
/// fired. Absence is not an error at this layer.
pub fn parse_authorization_code(callback_url: &str) -> Option<String> {
    let url = Url::parse(callback_url).ok()?;
    let code = url
        .query_pairs()
        .find(|(k, _)| k == "openid.oa2.authorization_code")
        .map(|(_, v)| v.into_owned())?;
    info!("got authorization code from callback");
    Some(code)
}

//! PKCE (Proof Key for Code Exchange) implementation
//!
//! Generates the code verifier and S256 challenge used during the sign-in
//! flow. The verifier is held in memory for the duration of one login
//! attempt and sent during device registration; the challenge is embedded
//! in the authorization URL so the auth server can verify the registration
//! request came from the same party that initiated the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Generate a cryptographically random PKCE code verifier.
///
/// Produces a 32-byte random value encoded as URL-safe base64 with the
/// trailing padding stripped, matching what the AGS launcher sends
/// (43 characters).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    debug!("generated code verifier");
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`, no padding. Deterministic for
/// a fixed verifier; a fresh verifier is generated per login attempt so a
/// challenge is never reused across attempts.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

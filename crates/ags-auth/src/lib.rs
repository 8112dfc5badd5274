//! Amazon Games authentication library
//!
//! Implements the device-auth flow the AGS launcher uses: PKCE challenge
//! generation, device identity derivation, authorization-code exchange via
//! device registration, and token refresh. Credentials are stored in a
//! single JSON document on disk. This crate is a standalone library with no
//! dependency on the library-sync crate — it can be tested and used
//! independently.
//!
//! Login flow:
//! 1. Caller creates a [`LoginAttempt`] (fresh verifier/challenge/serial)
//! 2. User authorizes via `LoginAttempt::authorization_url()`
//! 3. Callback URL yields the code via `login::parse_authorization_code()`
//! 4. Code is exchanged via `token::register_device()`
//! 5. Resulting [`UserData`] is stamped with the obtain time and persisted
//!    via [`UserStore`]
//! 6. Later calls refresh the access token via `token::refresh_token()`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod login;
pub mod pkce;
pub mod token;

pub use constants::*;
pub use credentials::{BearerToken, UserData, UserStore};
pub use error::{Error, Result};
pub use identity::{client_id, device_serial};
pub use login::{LoginAttempt, parse_authorization_code};
pub use pkce::{compute_challenge, generate_verifier};
pub use token::{TokenRefreshResponse, fetch_profile, refresh_token, register_device};

//! Amazon Prime Gaming library synchronization
//!
//! Retrieves the user's full game entitlement list from the Amazon
//! software-distribution service and maps it into library game entries for
//! an aggregator application. Builds on `ags-auth` for the device-auth
//! flow and token lifecycle.
//!
//! Sync flow:
//! 1. [`PrimeGamingService::begin_login`] opens the sign-in flow
//! 2. [`PrimeGamingService::complete_login`] exchanges the callback code
//!    and persists the credential document
//! 3. [`PrimeGamingService::load`] refreshes the access token on demand,
//!    runs the paginated entitlement fetch, and maps each record into a
//!    [`GameEntry`]
//! 4. Whole-library results are cached on disk and reused unconditionally
//!    until the cache file is removed

pub mod cache;
pub mod config;
pub mod entitlements;
pub mod error;
pub mod game;
pub mod service;

pub use cache::LibraryCache;
pub use config::ServiceConfig;
pub use entitlements::{Entitlement, fetch_entitlements, hardware_hash};
pub use error::{Error, Result};
pub use game::{GameEntry, GameRegistry};
pub use service::{LoadResult, LoginOutcome, PrimeGamingService};

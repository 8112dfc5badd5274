//! Prime Gaming service facade
//!
//! Owns the HTTP client, the credential document, the library cache, and
//! the login/sync orchestration the aggregator drives. Failure policy at
//! the outer boundary follows the launcher protocol: `load()` never
//! propagates an error — every failure is logged and absorbed into a
//! [`LoadResult`] — while the inner operations return typed errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use ags_auth::credentials::now_epoch_secs;
use ags_auth::{LoginAttempt, UserStore, parse_authorization_code};

use crate::cache::LibraryCache;
use crate::config::ServiceConfig;
use crate::entitlements::{Entitlement, fetch_entitlements};
use crate::error::{Error, Result};
use crate::game::{GameEntry, GameRegistry};

/// Outcome of handling a sign-in callback URL.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Registration succeeded and credentials were persisted.
    Authenticated,
    /// The callback carried no authorization code; the attempt is still
    /// waiting for the user to finish signing in.
    Pending,
}

/// Outcome of a library load.
///
/// `load()` never returns an error: failures become `Failed` plus a log
/// line, matching the "feature unavailable, not a diagnostic" contract of
/// the service boundary.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(Vec<GameEntry>),
    /// A previous load is still running on this instance.
    AlreadyLoading,
    NotAuthenticated,
    Failed,
}

/// Amazon Prime Gaming service instance.
///
/// One instance per account; the load guard and any in-flight login
/// attempt are scoped to it. Safe to share behind an `Arc`.
pub struct PrimeGamingService {
    config: ServiceConfig,
    http: reqwest::Client,
    users: UserStore,
    cache: LibraryCache,
    registry: Option<Arc<dyn GameRegistry>>,
    loading: AtomicBool,
}

impl PrimeGamingService {
    pub fn new(config: ServiceConfig) -> Self {
        let users = UserStore::new(config.user_path.clone());
        let cache = LibraryCache::new(config.cache_path.clone());
        Self {
            config,
            http: reqwest::Client::new(),
            users,
            cache,
            registry: None,
            loading: AtomicBool::new(false),
        }
    }

    /// Attach the aggregator's game registry.
    ///
    /// When set, [`load`](Self::load) saves every mapped entry through it
    /// before returning the list.
    pub fn with_registry(mut self, registry: Arc<dyn GameRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Start a sign-in flow.
    ///
    /// Returns the URL to open and the attempt state the caller must hand
    /// back to [`complete_login`](Self::complete_login) when the callback
    /// fires. Each call is a fresh attempt with a fresh challenge.
    pub fn begin_login(&self) -> Result<(String, LoginAttempt)> {
        let attempt = LoginAttempt::begin();
        let url = attempt.authorization_url(&self.config.signin_base)?;
        Ok((url, attempt))
    }

    /// Complete a sign-in flow from the callback redirect URL.
    ///
    /// A callback without an authorization code means the user has not
    /// finished signing in (or an unrelated callback fired): by default
    /// that is a silent [`LoginOutcome::Pending`]; with
    /// `surface_callback_errors` set it becomes an explicit error. On
    /// successful registration the credential document is stamped with the
    /// current time and persisted; on registration failure nothing is
    /// persisted.
    pub async fn complete_login(
        &self,
        attempt: &LoginAttempt,
        callback_url: &str,
    ) -> Result<LoginOutcome> {
        let Some(code) = parse_authorization_code(callback_url) else {
            if self.config.surface_callback_errors {
                return Err(Error::MissingAuthorizationCode);
            }
            debug!("callback carried no authorization code, still pending");
            return Ok(LoginOutcome::Pending);
        };

        let mut user_data =
            ags_auth::register_device(&self.http, &self.config.api_base, attempt, &code).await?;
        user_data.stamp_obtain_time(now_epoch_secs());
        self.users.save(&user_data).await?;
        info!("service login complete");
        Ok(LoginOutcome::Authenticated)
    }

    /// Whether local credentials exist. Purely local, no liveness check.
    pub fn is_authenticated(&self) -> bool {
        self.users.exists()
    }

    /// Whether the user is authenticated and the stored credentials are
    /// still accepted by the server.
    ///
    /// Performs a profile fetch every call; the result is not cached.
    pub async fn is_connected(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        self.profile().await.is_ok()
    }

    /// Fetch the user's profile data, refreshing the token first if needed.
    pub async fn profile(&self) -> Result<Value> {
        self.refresh_token_if_expired().await?;
        let user_data = self.users.load().await?;
        let profile = ags_auth::fetch_profile(
            &self.http,
            &self.config.api_base,
            &user_data.tokens.bearer.access_token,
        )
        .await?;
        Ok(profile)
    }

    /// Refresh the access token when its validity window has passed.
    ///
    /// Called before every authenticated operation; there is no proactive
    /// background refresh. A transport failure during refresh is logged
    /// and swallowed, leaving the stored credentials untouched — the
    /// caller proceeds and downstream calls surface the stale token as an
    /// authentication error.
    pub async fn refresh_token_if_expired(&self) -> Result<()> {
        let mut user_data = self.users.load().await?;
        if !user_data.is_token_expired(now_epoch_secs()) {
            return Ok(());
        }

        match ags_auth::refresh_token(
            &self.http,
            &self.config.api_base,
            &user_data.tokens.bearer.refresh_token,
        )
        .await
        {
            Ok(response) => {
                user_data.apply_refresh(&response, now_epoch_secs());
                self.users.save(&user_data).await?;
                info!("access token refreshed");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "token refresh failed, keeping stored credentials");
                Ok(())
            }
        }
    }

    /// Return the user's entitlement list.
    ///
    /// A pre-existing cache file is returned unconditionally with zero
    /// network calls, regardless of token state. Otherwise the token is
    /// refreshed on demand and the paginated fetch runs against the SDS
    /// endpoint; the result is cached only when every page succeeded.
    pub async fn get_library(&self) -> Result<Vec<Entitlement>> {
        if let Some(games) = self.cache.load().await? {
            return Ok(games);
        }

        self.refresh_token_if_expired().await?;
        let user_data = self.users.load().await?;
        let serial = user_data
            .device_serial_number()
            .ok_or_else(|| Error::Sync("user data has no device serial".into()))?
            .to_string();

        let games = fetch_entitlements(
            &self.http,
            &self.config.sds_base,
            &user_data.tokens.bearer.access_token,
            &serial,
        )
        .await?;

        self.cache.store(&games).await?;
        Ok(games)
    }

    /// Load the user's game library and map it into library entries.
    ///
    /// Guarded against re-entrant invocation from the same instance (a UI
    /// action firing twice): a second call while one is running returns
    /// [`LoadResult::AlreadyLoading`] without touching the network. The
    /// guard is taken before anything else and cleared only once fetching,
    /// mapping, and registry saves have all finished, success or failure.
    pub async fn load(&self) -> LoadResult {
        if self.loading.swap(true, Ordering::SeqCst) {
            warn!("Amazon games are already loading");
            return LoadResult::AlreadyLoading;
        }
        if !self.is_authenticated() {
            self.loading.store(false, Ordering::SeqCst);
            error!("user not connected to Amazon");
            return LoadResult::NotAuthenticated;
        }

        let result = self.fetch_and_map().await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(games) => {
                info!(count = games.len(), "loaded Amazon game library");
                LoadResult::Loaded(games)
            }
            Err(e) => {
                error!(error = %e, "unable to get games library");
                LoadResult::Failed
            }
        }
    }

    /// Fetch entitlements, map them, and save each entry to the registry.
    async fn fetch_and_map(&self) -> Result<Vec<GameEntry>> {
        let entitlements = self.get_library().await?;
        let games: Vec<GameEntry> = entitlements
            .iter()
            .map(GameEntry::from_entitlement)
            .collect();
        if let Some(registry) = &self.registry {
            for game in &games {
                registry.save(game).await?;
            }
        }
        Ok(games)
    }
}

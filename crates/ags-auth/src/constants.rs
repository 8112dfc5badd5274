//! AGS launcher protocol constants
//!
//! Public client configuration matching the Amazon Games launcher for
//! Windows. These values are not secrets — they identify the launcher
//! application and device class. The actual secrets (access/refresh tokens)
//! are managed by the credential store.

/// Default Amazon auth API host (registration, token, profile endpoints)
pub const DEFAULT_API_BASE: &str = "https://api.amazon.com";

/// Default software-distribution (entitlement sync) host
pub const DEFAULT_SDS_BASE: &str = "https://sds.amazon.com";

/// Default sign-in page base for the authorization URL
pub const DEFAULT_SIGNIN_BASE: &str = "https://amazon.com/ap/signin";

/// Marketplace the launcher authenticates against (US storefront)
pub const MARKETPLACE_ID: &str = "ATVPDKIKX0DER";

/// Device type identifier of the AGS launcher device class.
/// Also the suffix mixed into the derived client id.
pub const DEVICE_TYPE: &str = "A2UMVHOX7UP4V7";

/// OpenID association handle / page id of the games-launcher sign-in flow
pub const ASSOC_HANDLE: &str = "amzn_sonic_games_launcher";

/// Where the sign-in page redirects after authorization
pub const RETURN_TO: &str = "https://www.amazon.com";

/// Application identity sent with registration and refresh requests
pub const APP_NAME: &str = "AGSLauncher for Windows";
pub const APP_VERSION: &str = "1.0.0";

/// User agent for auth API calls
pub const USER_AGENT: &str = "AGSLauncher/1.0.0";

/// User agent for SDS sync calls (launcher build string)
pub const SDS_USER_AGENT: &str = "com.amazon.agslauncher.win/2.1.7437.6";

/// Device metadata reported at registration time
pub const DEVICE_MODEL: &str = "Windows";
pub const OS_VERSION: &str = "10.0.19044.0";

/// Accept-Language / language parameter value
pub const LANGUAGE: &str = "en_US";

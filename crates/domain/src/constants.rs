//! Client constants
//!
//! Endpoint paths, persisted key names and polling defaults shared by every
//! crate in the workspace.

// Backend endpoints (relative to the API base URL)
/// `POST`: username and password for a credential pair
pub const LOGIN_PATH: &str = "/auth/login/";
/// `POST`: create an account and log in
pub const REGISTER_PATH: &str = "/auth/register/";
/// `POST`: exchange a refresh token for an access token
pub const TOKEN_REFRESH_PATH: &str = "/token/refresh/";
/// Validation jobs
pub const JOBS_PATH: &str = "/jobs/";
/// Claim records
pub const CLAIMS_PATH: &str = "/claims/";
/// Per error type counts and amounts
pub const CLAIMS_STATISTICS_PATH: &str = "/claims/statistics/";
/// `POST`: re-run validation with the active rule set
pub const CLAIMS_REVALIDATE_PATH: &str = "/claims/revalidate/";
/// Rule sets
pub const RULESETS_PATH: &str = "/rulesets/";
/// The rule set used for new validations
pub const ACTIVE_RULESET_PATH: &str = "/rulesets/active/";

// Multipart field names for job submission
/// Claims spreadsheet part
pub const CLAIMS_FILE_FIELD: &str = "claims_file";
/// Technical rules PDF part
pub const TECHNICAL_RULES_FIELD: &str = "technical_rules_file";
/// Medical rules PDF part
pub const MEDICAL_RULES_FIELD: &str = "medical_rules_file";

// Persisted session keys
/// Access token entry
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Refresh token entry
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Serialized identity entry
pub const USER_KEY: &str = "user";

// Defaults
/// Local development backend
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Delay between job status fetches
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
/// Budget for tracking one job
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;
/// Keychain service name
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "rcm-client";
/// Session file name inside the data directory
pub const DEFAULT_SESSION_FILE: &str = "session.json";

/**
 * SDK-wide constants.
 *
 * The client identity triple is baked into every payload and tells the
 * backend which library produced the report.
 */

/// Reported as `details.client.identifier`.
pub const CLIENT_NAME: &str = "raygun-rust";

/// Reported as `details.client.version`.
/// Derived at compile time from the `raygun_core` package version.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reported as `details.client.clientUrl`.
pub const CLIENT_URL: &str = "https://raygun.com";

/// Base URL of the Raygun REST API. Payloads are POSTed to `{endpoint}/entries`.
pub const DEFAULT_ENDPOINT: &str = "https://api.raygun.io";

/// Header carrying the application's API key.
pub const API_KEY_HEADER: &str = "X-ApiKey";

/// The only status code the entries endpoint returns for an accepted report.
pub const ACCEPTED_STATUS: u16 = 202;

/// Substituted for the machine name when the hostname lookup fails.
pub const UNKNOWN_MACHINE_NAME: &str = "not available";

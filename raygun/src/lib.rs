/*!
 * Raygun: crash and error reporting for Rust.
 *
 * This is the crate users should depend on. It re-exports the reporting
 * client from `raygun_core` and panic recovery from `raygun_panic`.
 *
 * # Quick start
 *
 * ```ignore
 * use raygun::prelude::*;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let mut client = Client::new("my-app", "YOUR_API_KEY")?;
 *     client.version("1.0.0").tags(["production"]).user("alice");
 *
 *     // A panic inside the closure is reported and absorbed.
 *     let _ = client.handle_error(|| run());
 *
 *     // Manual reports.
 *     client.create_error("cache miss storm")?;
 *     if let Err(err) = std::fs::read("config.toml") {
 *         client.send_error(&err)?;
 *     }
 *     Ok(())
 * }
 * ```
 *
 * # Per-request clients
 *
 * ```ignore
 * let mut scoped = client.clone();
 * scoped.request(Arc::new(http_request)).user(session.user_id());
 * scoped.handle_error(|| handle(http_request));
 * ```
 *
 * Changes made to `scoped` never affect `client`, and vice versa.
 */

// ---------------------------------------------------------------------------
// Re-exports: the public surface area
// ---------------------------------------------------------------------------

pub use raygun_core::*;
pub use raygun_panic::{catch_panic, install, CaughtPanic, HandleError, RecoveredPanic};

/// The types needed by almost every user of the crate.
pub mod prelude {
    pub use crate::{Client, HandleError, HasStackTrace, Options, TracedError};
}

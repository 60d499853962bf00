/*!
 * Raygun Core: the crash-reporting engine.
 *
 * This crate turns an error plus a stack trace into a Raygun payload and
 * delivers it. End users should depend on the `raygun` facade crate
 * instead, which also re-exports panic recovery from `raygun_panic`.
 *
 * # Module structure
 *
 * - `protocol/`: what we send: wire types, constants
 * - `stack/`: stack dump parsing and capture, `HasStackTrace`
 * - `request`: flattening an HTTP request into the payload
 * - `context`: per-client metadata attached to every report
 * - `payload`: assembling a `Payload` from context, error and stack
 * - `transport/`: how we deliver: HTTP client, delivery modes
 * - `client`: configuration and the reporting entry points
 */

mod client;
mod context;
mod error;
mod payload;
mod protocol;
mod request;
mod stack;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{Client, Options};
pub use context::{Context, GroupingKeyFn};
pub use error::{ConfigError, DeliveryError};
pub use protocol::constants::{
    ACCEPTED_STATUS, API_KEY_HEADER, CLIENT_NAME, CLIENT_URL, CLIENT_VERSION, DEFAULT_ENDPOINT,
};
pub use protocol::types::{
    ClientData, ContextData, CustomData, Details, ErrorData, Payload, RequestData, StackFrame,
    UserData,
};
pub use request::{flatten, MultiValueMap, RequestInfo, RequestSource};
pub use stack::{
    capture_current, capture_user_stack, is_internal_frame, parse, render_current,
    trim_internal_frames, HasStackTrace, TracedError, DEFAULT_SKIP_FRAMES,
};
pub use transport::{Delivery, DeliveryMode, Transport};

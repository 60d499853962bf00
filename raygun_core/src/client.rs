/**
 * The reporting client: configuration, context and the manual entry points.
 *
 * Lifecycle:
 * 1. `Client::new(app_name, api_key)` validates both strings and creates
 *    a client with a fresh `Context` and default delivery mode.
 * 2. Chainable setters adjust the context and the delivery mode.
 * 3. `create_error` / `send_error` / `send_traced_error` capture a stack,
 *    assemble a `Payload` and hand it to the `Delivery`.
 *
 * Unlike a process-wide singleton SDK, a `Client` is a plain value. Clone
 * it to give each request handler its own independently configurable copy.
 */
use std::error::Error;
use std::sync::Arc;

use serde::Serialize;

use crate::context::Context;
use crate::error::{ConfigError, DeliveryError};
use crate::protocol::constants::DEFAULT_ENDPOINT;
use crate::protocol::types::{Payload, StackFrame};
use crate::request::RequestSource;
use crate::stack::{capture_user_stack, HasStackTrace, TracedError};
use crate::transport::{Delivery, DeliveryMode, Transport};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Construction-time configuration.
 *
 * # Example
 * ```ignore
 * let client = raygun::Client::with_options("my-app", "API_KEY", raygun::Options {
 *     asynchronous: true,
 *     ..Default::default()
 * })?;
 * ```
 */
#[derive(Debug, Clone)]
pub struct Options {
    /// Base URL of the error-tracking API. Reports go to `{endpoint}/entries`.
    ///
    /// Default: `https://api.raygun.io`
    pub endpoint: String,

    /// Print reports to stdout instead of sending them.
    pub silent: bool,

    /// Log delivery outcomes at `info`/`error` instead of `debug`.
    pub log_verbose: bool,

    /// Send reports on a detached thread and return immediately.
    pub asynchronous: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            silent: false,
            log_verbose: false,
            asynchronous: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Client {
    app_name: String,
    pub(crate) context: Context,
    pub(crate) delivery: Delivery,
}

impl Client {
    /// Creates a client with default options.
    pub fn new(app_name: &str, api_key: &str) -> Result<Self, ConfigError> {
        Self::with_options(app_name, api_key, Options::default())
    }

    /**
     * Creates a client with the given options.
     *
     * Fails if `app_name` or `api_key` is empty.
     */
    pub fn with_options(app_name: &str, api_key: &str, options: Options) -> Result<Self, ConfigError> {
        if app_name.is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let mode = DeliveryMode {
            silent: options.silent,
            log_verbose: options.log_verbose,
            asynchronous: options.asynchronous,
        };

        Ok(Self {
            app_name: app_name.to_string(),
            context: Context::new(),
            delivery: Delivery::new(Transport::new(options.endpoint, api_key), mode),
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn api_key(&self) -> &str {
        self.delivery.transport.api_key()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery.mode
    }

    pub fn is_silent(&self) -> bool {
        self.delivery.mode.silent
    }

    pub fn is_asynchronous(&self) -> bool {
        self.delivery.mode.asynchronous
    }

    pub fn endpoint_url(&self) -> &str {
        self.delivery.transport.endpoint()
    }

    // -- chainable setters --------------------------------------------------

    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.delivery.mode.silent = silent;
        self
    }

    pub fn log_verbose(&mut self, log_verbose: bool) -> &mut Self {
        self.delivery.mode.log_verbose = log_verbose;
        self
    }

    pub fn asynchronous(&mut self, asynchronous: bool) -> &mut Self {
        self.delivery.mode.asynchronous = asynchronous;
        self
    }

    /// Overrides the API base URL, e.g. to point at a test stub.
    pub fn endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.delivery.transport.set_endpoint(endpoint.into());
        self
    }

    /// Associates an HTTP request with every subsequent report.
    pub fn request(&mut self, request: Arc<dyn RequestSource>) -> &mut Self {
        self.context.set_request(request);
        self
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.context.set_version(version.into());
        self
    }

    /// Replaces the tags attached to every subsequent report.
    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.set_tags(tags.into_iter().map(Into::into).collect());
        self
    }

    /**
     * Attaches arbitrary data to every subsequent report.
     *
     * The value is converted to JSON immediately. If that fails the
     * failure is kept and surfaces as `DeliveryError::Serialization` when
     * a report is sent.
     */
    pub fn custom_data<T: Serialize + ?Sized>(&mut self, data: &T) -> &mut Self {
        self.context.set_custom_data(data);
        self
    }

    pub fn user(&mut self, user: impl Into<String>) -> &mut Self {
        self.context.set_user(user.into());
        self
    }

    /**
     * Sets the callback computing `details.groupingKey`.
     *
     * It receives the reported error and the assembled payload. An empty
     * return value keeps the backend's default grouping.
     */
    pub fn custom_grouping_key_fn<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&dyn Error, &Payload) -> String + Send + Sync + 'static,
    {
        self.context.set_grouping_key_fn(callback);
        self
    }

    // -- reporting ----------------------------------------------------------

    /// Assembles a payload for `error` from the current context.
    pub fn create_payload(&self, error: &dyn Error, stack: Vec<StackFrame>) -> Payload {
        Payload::assemble(&self.context, error, stack)
    }

    /// Delivers an already assembled payload.
    pub fn submit(&self, payload: Payload) -> Result<(), DeliveryError> {
        self.delivery.deliver(payload)
    }

    /// Reports a new error with the given message and the caller's stack.
    pub fn create_error(&self, message: &str) -> Result<(), DeliveryError> {
        self.send_traced_error(&TracedError::new(message))
    }

    /**
     * Reports an existing error.
     *
     * The error and its `source()` chain are searched for a `TracedError`;
     * the first one found supplies the stack. Errors wrapping a
     * `TracedError` (such as a caught panic) therefore keep their recorded
     * stack. Anything else is reported with the stack of this call.
     *
     * Other `HasStackTrace` types are not visible through `dyn Error`;
     * report those with `send_traced_error`.
     */
    pub fn send_error(&self, error: &(dyn Error + 'static)) -> Result<(), DeliveryError> {
        let stack = match find_traced(error) {
            Some(traced) => stack_or_capture(traced),
            None => capture_user_stack(),
        };
        self.submit(self.create_payload(error, stack))
    }

    /// Reports an error that may carry its own stack trace, falling back to
    /// the stack of this call.
    pub fn send_traced_error<E>(&self, error: &E) -> Result<(), DeliveryError>
    where
        E: Error + HasStackTrace,
    {
        let stack = stack_or_capture(error);
        self.submit(self.create_payload(error, stack))
    }
}

/// First `TracedError` in `error` or its chain of sources.
fn find_traced<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a TracedError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(traced) = err.downcast_ref::<TracedError>() {
            return Some(traced);
        }
        current = err.source();
    }
    None
}

fn stack_or_capture(error: &dyn HasStackTrace) -> Vec<StackFrame> {
    match error.stack_trace() {
        Some(stack) => stack.to_vec(),
        None => capture_user_stack(),
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("app_name", &self.app_name)
            .field("endpoint", &self.endpoint_url())
            .field("mode", &self.delivery.mode)
            .field("context", &self.context)
            .finish()
    }
}

/*!
 * Stack traces: parsing raw dumps and capturing the current thread.
 *
 * - `parse`: raw textual dump → `Vec<StackFrame>`
 * - `capture`: current thread → raw dump → `Vec<StackFrame>`
 *
 * Errors that already know where they came from expose it through
 * `HasStackTrace`; everything else gets a freshly captured stack.
 */

mod capture;
mod parse;

use thiserror::Error;

use crate::protocol::types::StackFrame;

pub use capture::{
    capture_current, capture_user_stack, is_internal_frame, render_current,
    trim_internal_frames, DEFAULT_SKIP_FRAMES,
};
pub use parse::parse;

/**
 * Capability of an error value to carry its own stack trace.
 *
 * `Client::send_traced_error` prefers this trace over a fresh capture,
 * which would point at the reporting call instead of the failure.
 */
pub trait HasStackTrace {
    /// The recorded frames, or `None` to fall back to a fresh capture.
    fn stack_trace(&self) -> Option<&[StackFrame]>;
}

/**
 * An error that records the user stack at the moment it is created.
 */
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TracedError {
    message: String,
    stack: Vec<StackFrame>,
}

impl TracedError {
    /// Creates the error and captures the caller's stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_stack(message, capture_user_stack())
    }

    /// Creates the error with an already known stack, e.g. one parsed
    /// from a stored dump.
    pub fn with_stack(message: impl Into<String>, stack: Vec<StackFrame>) -> Self {
        Self {
            message: message.into(),
            stack,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &[StackFrame] {
        &self.stack
    }
}

impl HasStackTrace for TracedError {
    fn stack_trace(&self) -> Option<&[StackFrame]> {
        Some(&self.stack)
    }
}

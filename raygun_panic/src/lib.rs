/*!
 * Raygun Panic: recovering from panics and reporting them.
 *
 * `Client::handle_error` (from the `HandleError` trait) runs a closure
 * and, if it panics:
 *
 * 1. Catches the unwind at the call boundary so the host keeps running.
 * 2. Converts the panic payload into an error message.
 * 3. Reports it with the stack of the panic site, not of the boundary.
 * 4. Returns `Err(RecoveredPanic)` carrying the delivery outcome.
 *
 * # Panic-site stacks
 *
 * By the time `catch_unwind` returns, the panicking frames are gone. The
 * process-wide hook registered by `install()` therefore records the stack
 * while the panic is still in flight, but only for threads currently
 * inside a recovery scope. Panics anywhere else go straight to the
 * previous hook, so the default stderr output is preserved for them.
 *
 * # Recursion safety
 *
 * The hook uses a `thread_local` boolean flag to prevent infinite recursion
 * if stack capture itself were to panic.
 */

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use raygun_core::{
    capture_user_stack, Client, DeliveryError, HasStackTrace, StackFrame, TracedError,
};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Ensures `install()` is idempotent: hooks are never stacked.
static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    /// Per-thread flag that prevents re-entrancy into the panic hook.
    static IN_HOOK: Cell<bool> = const { Cell::new(false) };

    /// Number of recovery scopes the thread is currently inside.
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };

    /// Stack recorded by the hook for the most recent panic in a scope.
    static PANIC_SITE: RefCell<Option<Vec<StackFrame>>> = const { RefCell::new(None) };
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/**
 * A panic caught by `catch_panic`, converted into an ordinary error.
 *
 * The stack is the one recorded at the panic site when the hook was
 * active, otherwise the stack of the recovery boundary. It is kept in a
 * `TracedError` exposed as the source, so `Client::send_error` finds it
 * as well as `send_traced_error`.
 */
#[derive(Debug, Clone, Error)]
#[error("{}", .trace.message())]
pub struct CaughtPanic {
    #[source]
    trace: TracedError,
}

impl CaughtPanic {
    pub fn message(&self) -> &str {
        self.trace.message()
    }

    pub fn stack(&self) -> &[StackFrame] {
        self.trace.stack()
    }
}

impl HasStackTrace for CaughtPanic {
    fn stack_trace(&self) -> Option<&[StackFrame]> {
        self.trace.stack_trace()
    }
}

/// Returned by `handle_error` in place of the value of a closure that
/// panicked.
#[derive(Debug, Error)]
#[error("recovered from panic: {message}")]
pub struct RecoveredPanic {
    /// The panic message.
    pub message: String,

    /// Outcome of reporting the panic. Always `Ok` in silent and
    /// asynchronous mode.
    pub delivery: Result<(), DeliveryError>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/**
 * Installs the panic-site recording hook.
 *
 * Replaces the current panic hook with one that:
 * 1. Inside a recovery scope: records the user stack and stays quiet.
 * 2. Outside: forwards to the *previous* hook unchanged.
 *
 * Idempotent; subsequent calls are silent no-ops. `catch_panic` calls it
 * on first use, so calling it explicitly is only needed to control the
 * hook ordering relative to other libraries.
 */
pub fn install() {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if SCOPE_DEPTH.with(Cell::get) == 0 {
            previous_hook(info);
            return;
        }

        let is_recursive = IN_HOOK.with(|flag| flag.replace(true));
        if is_recursive {
            return;
        }

        let _ = panic::catch_unwind(AssertUnwindSafe(record_panic_site));
        IN_HOOK.with(|flag| flag.set(false));
    }));
}

/**
 * Runs `f`, converting a panic into `Err(CaughtPanic)`.
 *
 * The panic does not propagate past this call. Payloads of type `&str`,
 * `String` and `Box<dyn Error + Send + Sync>` keep their message; any
 * other payload becomes `"<unknown panic>"`.
 */
pub fn catch_panic<F, R>(f: F) -> Result<R, CaughtPanic>
where
    F: FnOnce() -> R,
{
    install();

    SCOPE_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    SCOPE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));

    let recorded = PANIC_SITE.with(|slot| slot.borrow_mut().take());

    result.map_err(|payload| CaughtPanic {
        trace: TracedError::with_stack(
            panic_message(&*payload),
            recorded.unwrap_or_else(capture_user_stack),
        ),
    })
}

/**
 * Panic recovery for `raygun_core::Client`.
 *
 * # Example
 * ```ignore
 * use raygun::prelude::*;
 *
 * let client = Client::new("my-app", "API_KEY")?;
 * let total = client.handle_error(|| compute_totals(&orders));
 * ```
 */
pub trait HandleError {
    /**
     * Runs `f`. If it panics, the panic is reported and absorbed, and
     * `Err(RecoveredPanic)` is returned instead of the closure's value.
     * Without a panic this is a plain call returning `Ok`.
     */
    fn handle_error<F, R>(&self, f: F) -> Result<R, RecoveredPanic>
    where
        F: FnOnce() -> R;
}

impl HandleError for Client {
    fn handle_error<F, R>(&self, f: F) -> Result<R, RecoveredPanic>
    where
        F: FnOnce() -> R,
    {
        catch_panic(f).map_err(|caught| {
            tracing::warn!(panic = %caught.message(), "recovering from panic");

            RecoveredPanic {
                delivery: self.send_traced_error(&caught),
                message: caught.message().to_string(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn record_panic_site() {
    let stack = capture_user_stack();
    PANIC_SITE.with(|slot| *slot.borrow_mut() = Some(stack));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    if let Some(error) = payload.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return error.to_string();
    }
    "<unknown panic>".to_string()
}

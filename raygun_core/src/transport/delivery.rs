/**
 * Delivery modes: silent, synchronous and asynchronous submission.
 *
 * ```text
 *             ┌─ silent ──────► pretty-print to stdout ─────────► Ok
 *  deliver ───┼─ synchronous ─► Transport::send (blocking) ─────► Ok | Err
 *             └─ asynchronous ► detached thread ─► Transport::send ─► log
 *                               (caller gets Ok immediately)
 * ```
 *
 * Asynchronous submissions are fire-and-forget: one detached thread per
 * report, no handle, no upper bound on submissions in flight. Their
 * outcome is only ever visible in the logs.
 */
use std::thread;

use crate::error::DeliveryError;
use crate::protocol::types::Payload;

use super::http::Transport;

/// Flags selecting how `Delivery::deliver` submits a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryMode {
    /// Print the payload instead of sending it. Takes precedence over
    /// `asynchronous`.
    pub silent: bool,

    /// Log successful deliveries and synchronous failures at `info`/`error`
    /// instead of `debug`.
    pub log_verbose: bool,

    /// Send on a detached thread and return immediately.
    pub asynchronous: bool,
}

/// A transport plus the mode to use it in.
#[derive(Clone)]
pub struct Delivery {
    pub(crate) transport: Transport,
    pub(crate) mode: DeliveryMode,
}

impl Delivery {
    pub fn new(transport: Transport, mode: DeliveryMode) -> Self {
        Self { transport, mode }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /**
     * Submits `payload` according to the configured mode.
     *
     * Only a synchronous, non-silent submission can return an error.
     */
    pub fn deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
        if self.mode.silent {
            print_payload(&payload);
            return Ok(());
        }

        if self.mode.asynchronous {
            self.spawn(payload);
            return Ok(());
        }

        let result = self.transport.send(&payload);
        match &result {
            Ok(()) if self.mode.log_verbose => {
                tracing::info!("successfully sent message to Raygun");
            }
            Ok(()) => tracing::debug!("successfully sent message to Raygun"),
            Err(err) if self.mode.log_verbose => {
                tracing::error!(error = %err, "failed to send message to Raygun");
            }
            Err(err) => tracing::debug!(error = %err, "failed to send message to Raygun"),
        }
        result
    }

    /**
     * Runs the synchronous submission on its own named thread.
     *
     * The thread body is wrapped in `catch_unwind` so that a panic inside
     * the HTTP stack is logged instead of being reported as yet another
     * panic of the host application.
     */
    fn spawn(&self, payload: Payload) {
        let transport = self.transport.clone();
        let log_verbose = self.mode.log_verbose;

        let spawned = thread::Builder::new()
            .name("raygun-submit".into())
            .spawn(move || {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    transport.send(&payload)
                }));

                match result {
                    Ok(Ok(())) if log_verbose => {
                        tracing::info!("successfully sent message to Raygun");
                    }
                    Ok(Ok(())) => tracing::debug!("successfully sent message to Raygun"),
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "asynchronous delivery to Raygun failed");
                    }
                    Err(_) => {
                        tracing::warn!("asynchronous delivery thread panicked; report dropped");
                    }
                }
            });

        if let Err(err) = spawned {
            tracing::warn!(error = %err, "failed to spawn delivery thread; report dropped");
        }
    }
}

/// Silent mode output. Never fails the caller.
fn print_payload(payload: &Payload) {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::warn!(error = %err, "unable to convert payload to JSON"),
    }
}

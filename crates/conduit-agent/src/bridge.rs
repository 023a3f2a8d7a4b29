//! Sync/async execution bridge.
//!
//! The conversation loop is synchronous while the execution backend is async. Each
//! agent owns one [`ExecutionBridge`] wrapping a private current-thread Tokio
//! runtime; [`ExecutionBridge::run`] blocks the caller until a future completes on it.

use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};

use conduit_core::{Error, Result};
use tokio::runtime::{Builder, Runtime};
use tokio::task::try_id;

/// Private reactor for one agent instance.
///
/// Not reentrant: a `run` issued while another `run` is in flight fails instead of
/// blocking. Never shared between agents.
#[derive(Debug)]
pub struct ExecutionBridge {
    runtime: Option<Runtime>,
    in_flight: AtomicBool,
}

impl ExecutionBridge {
    /// Creates the reactor.
    ///
    /// # Errors
    /// Returns an error if the runtime cannot be built
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Bridge(format!("Failed to create runtime: {err}")))?;

        Ok(Self {
            runtime: Some(runtime),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Blocks until `future` completes on the private reactor.
    ///
    /// The reactor is the thread's current runtime only while the call lasts; the
    /// previous binding, if any, is restored afterwards. Threads that merely have a
    /// handle bound (blocking-pool workers, `Runtime::enter` scopes) may call this.
    /// Errors from `future` are returned unchanged.
    ///
    /// # Errors
    /// Returns the future's error, or a bridge error if the reactor is closed, a call
    /// is already in flight, or the caller is itself an async task
    pub fn run<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| Error::Bridge("Execution bridge is closed".to_owned()))?;

        if try_id().is_some() {
            return Err(Error::Bridge(
                "Cannot block on the execution bridge from inside an async task".to_owned(),
            ));
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(Error::Bridge(
                "Execution bridge is already running a call".to_owned(),
            ));
        }
        let _in_flight = InFlight(&self.in_flight);

        let _context = runtime.enter();
        runtime.block_on(future)
    }

    /// Whether the reactor has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.runtime.is_none()
    }

    /// Tears the reactor down.
    ///
    /// Returns `true` only for the call that actually closed it; later calls are no-ops.
    pub fn shutdown(&mut self) -> bool {
        match self.runtime.take() {
            Some(runtime) => {
                runtime.shutdown_background();
                tracing::debug!("execution bridge closed");
                true
            }
            None => false,
        }
    }
}

/// Clears the in-flight flag when a call ends, including by unwinding.
struct InFlight<'flag>(&'flag AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Drop for ExecutionBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

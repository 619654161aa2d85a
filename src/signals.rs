//! Process-wide shutdown signaling.
//!
//! `running` and `exit_requested` are single-writer (the `ctrlc` handler),
//! many-reader atomics, mirroring the `volatile sig_atomic_t running` /
//! `exit_requested` pair from the original control loop. There is no
//! `SIGALRM`-style no-op wakeup here: waits use a condvar with a timeout
//! instead of `pause()`, which spec.md explicitly allows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown flags, cheaply cloneable and safe to hand to the driver
/// callback and the orchestrator alike.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    running: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Install a `SIGINT`/`SIGTERM` handler that flips the flag. Safe to
    /// call once per process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let running = self.running.clone();
        ctrlc::set_handler(move || {
            log::warn!("shutdown signal received");
            running.store(false, Ordering::Release);
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

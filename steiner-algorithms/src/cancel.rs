use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative stop signal, polled by the local search between iterations.
pub trait Cancellation {
    fn expired(&self) -> bool;
}

/// Never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Cancellation for Unbounded {
    fn expired(&self) -> bool {
        false
    }
}

/// Expires at a fixed wall-clock instant.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }
}

impl Cancellation for Deadline {
    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Expires once any clone of the flag is raised.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Cancellation for StopFlag {
    fn expired(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

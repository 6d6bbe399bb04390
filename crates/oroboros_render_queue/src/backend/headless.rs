//! Headless backend: no window system, just counters.
//!
//! Used by the demo binary, the benchmarks and the tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{RenderBackend, WindowId};
use crate::error::{RenderQueueError, RenderQueueResult};

/// Hook call counts, shared between the backend and whoever observes it.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    attaches: AtomicU64,
    detaches: AtomicU64,
    presents: AtomicU64,
}

impl HeadlessStats {
    /// Successful attaches.
    #[must_use]
    pub fn attaches(&self) -> u64 {
        self.attaches.load(Ordering::Acquire)
    }

    /// Detaches.
    #[must_use]
    pub fn detaches(&self) -> u64 {
        self.detaches.load(Ordering::Acquire)
    }

    /// Presented frames.
    #[must_use]
    pub fn presents(&self) -> u64 {
        self.presents.load(Ordering::Acquire)
    }
}

/// A backend without a real graphics context.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    stats: Arc<HeadlessStats>,
    refuse_attach: bool,
    present_delay: Duration,
}

impl HeadlessBackend {
    /// Creates a backend that attaches and presents instantly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose attach always fails.
    #[must_use]
    pub fn refusing_attach() -> Self {
        Self {
            refuse_attach: true,
            ..Self::default()
        }
    }

    /// Sleeps for `delay` in every present, simulating vsync.
    #[must_use]
    pub fn with_present_delay(mut self, delay: Duration) -> Self {
        self.present_delay = delay;
        self
    }

    /// Returns the shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<HeadlessStats> {
        Arc::clone(&self.stats)
    }
}

impl RenderBackend for HeadlessBackend {
    fn render_thread_attach(&mut self, _window: WindowId) -> RenderQueueResult<()> {
        if self.refuse_attach {
            return Err(RenderQueueError::BackendFailure("headless attach refused"));
        }
        self.stats.attaches.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn render_thread_detach(&mut self) {
        self.stats.detaches.fetch_add(1, Ordering::AcqRel);
    }

    fn render_thread_present(&mut self, _window: WindowId) {
        if !self.present_delay.is_zero() {
            std::thread::sleep(self.present_delay);
        }
        self.stats.presents.fetch_add(1, Ordering::AcqRel);
    }
}

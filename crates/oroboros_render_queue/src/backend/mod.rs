//! # Window Backend Seam
//!
//! The render thread owns exactly one window's graphics context. The hooks
//! below are the only points where it touches the platform:
//!
//! - [`RenderBackend::render_thread_attach`] once, before anything runs
//! - [`RenderBackend::render_thread_present`] once per submitted frame
//! - [`RenderBackend::render_thread_detach`] once, on the way out (panics included)
//!
//! All three are called on the render thread and nowhere else.

mod headless;

pub use headless::{HeadlessBackend, HeadlessStats};

use std::fmt;

use crate::error::RenderQueueResult;

/// Opaque identifier of a platform window.
///
/// `0` is reserved as the null window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    /// The null window. Never valid for a render thread.
    pub const NULL: Self = Self(0);

    /// Wraps a raw platform handle.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true for [`WindowId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Platform hooks driven by the render thread.
pub trait RenderBackend: Send + 'static {
    /// Makes `window`'s graphics context current on the calling thread.
    ///
    /// # Errors
    ///
    /// Any error marks the runtime failed and aborts `start`.
    fn render_thread_attach(&mut self, window: WindowId) -> RenderQueueResult<()>;

    /// Releases the context. Called once after the loop exits, also when a
    /// command panicked on the render thread. Not called if attach failed.
    fn render_thread_detach(&mut self);

    /// Presents the current back buffer of `window`.
    fn render_thread_present(&mut self, window: WindowId);
}

//! # Render Queue Runtime
//!
//! **One Render Thread, One Frame In Flight**
//!
//! ```text
//!   Game thread                         Render thread (oroboros-render)
//!   ───────────                         ───────────────────────────────
//!   begin_frame ──> packet[i] open
//!   record_async ─> copy into packet[i]
//!   submit_frame ─> packet[i] submitted ──work_ready──> execute packet[i]
//!   begin_frame ──> packet[i^1] open                    present
//!   ...             <──────────────────present_done──── packet[i] free
//!   call_sync ────> flush open packet ──work_ready───> run job
//!                   <──────────────────sync_done─────── result
//! ```
//!
//! The render thread is the only thread that touches the graphics context.
//! Producers hand it work through two preallocated packets and a single
//! synchronous call slot, all guarded by one mutex.
//!
//! ## Lifecycle
//!
//! [`RenderQueue::start`] spawns the thread and blocks until it has attached
//! to the window (or failed to). [`RenderQueue::stop`] asks it to exit,
//! joins it and releases both packets. Dropping the queue stops it.

mod dispatch;
mod frame;
mod state;
mod worker;

use std::sync::Arc;
use std::thread;

use tracing::{error, info, warn};

use crate::backend::{RenderBackend, WindowId};
use crate::config::RenderThreadConfig;
use crate::diagnostics::RenderThreadDiagnostics;
use crate::error::{RenderQueueError, RenderQueueResult};
use crate::packet::CommandPacket;

use state::{QueueState, Shared};

/// Name of the spawned render thread.
pub const RENDER_THREAD_NAME: &str = "oroboros-render";

/// A running render thread bound to one window.
///
/// The handle is `Send + Sync`; share it behind an `Arc` to record from one
/// thread and query from others.
///
/// Dropping the last handle stops the queue. If that drop happens on the
/// render thread itself (a command or sync closure owning the handle), the
/// thread cannot be joined: it is told to exit after its current work item
/// and finishes detached.
pub struct RenderQueue {
    shared: Arc<Shared>,
    window: WindowId,
}

impl RenderQueue {
    /// Spawns the render thread for `window` and waits for it to attach.
    ///
    /// Zero capacities in `config` are replaced by the defaults.
    ///
    /// # Errors
    ///
    /// - [`RenderQueueError::InvalidArgument`] for the null window
    /// - [`RenderQueueError::OutOfMemory`] if the packets cannot be allocated
    /// - [`RenderQueueError::BackendFailure`] if the thread cannot be spawned
    ///   or the backend fails to attach; the thread is joined before returning
    pub fn start<B: RenderBackend>(
        window: WindowId,
        config: RenderThreadConfig,
        backend: B,
    ) -> RenderQueueResult<Self> {
        if window.is_null() {
            return Err(RenderQueueError::InvalidArgument("null window"));
        }

        let config = config.normalized();
        let commands = config.max_commands_per_frame as usize;
        let bytes = config.max_command_bytes_per_frame as usize;
        let packets = [
            CommandPacket::try_new(commands, bytes)?,
            CommandPacket::try_new(commands, bytes)?,
        ];

        let shared = Arc::new(Shared::new(QueueState::new(window, config, packets)));
        let worker_shared = Arc::clone(&shared);

        let mut state = shared.state.lock();
        state.thread_started = true;

        let spawned = thread::Builder::new()
            .name(RENDER_THREAD_NAME.into())
            .spawn(move || worker::run(&worker_shared, window, backend));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!(%window, error = %e, "failed to spawn render thread");
                state.thread_started = false;
                state.release_packets();
                return Err(RenderQueueError::BackendFailure("failed to spawn render thread"));
            }
        };

        while !state.started_signal {
            shared.started.wait(&mut state);
        }

        if !state.running || state.failed {
            drop(state);
            if handle.join().is_err() {
                error!(%window, "render thread panicked during attach");
            }
            let mut state = shared.state.lock();
            state.thread_started = false;
            state.release_packets();
            return Err(RenderQueueError::BackendFailure("render thread failed to attach"));
        }

        state.thread = Some(handle);
        drop(state);

        info!(
            %window,
            max_commands = commands,
            max_bytes = bytes,
            wait_on_submit = config.wait_on_submit,
            "render thread started"
        );

        Ok(Self { shared, window })
    }

    /// Stops the render thread if it belongs to `window`.
    ///
    /// In-progress work finishes its current iteration. Waiters are woken
    /// and the thread is joined. Safe to call after a failure and more than
    /// once.
    ///
    /// Returns true once the queue is stopped. Returns false, leaving the
    /// thread running, for another window, while a concurrent `stop` is
    /// still joining, or when called from the render thread itself.
    pub fn stop(&self, window: WindowId) -> bool {
        if window != self.window {
            return false;
        }

        let handle = {
            let mut state = self.shared.state.lock();
            if !state.thread_started {
                return true;
            }
            if state.stopping {
                return false;
            }
            if state.running && state.render_thread == Some(thread::current().id()) {
                warn!(%window, "stop requested from the render thread; ignored");
                return false;
            }
            state.stopping = true;
            self.shared.work_ready.notify_all();
            self.shared.wake_waiters();
            state.thread.take()
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(%window, "render thread panicked");
            }
        }

        let mut state = self.shared.state.lock();
        state.thread_started = false;
        state.running = false;
        state.frame_open = false;
        state.render_thread = None;
        state.sync_job = None;
        state.sync_pending = false;
        state.sync_completed = true;
        state.present_pending = false;
        state.pending_packet = None;
        state.release_packets();
        self.shared.wake_waiters();

        info!(
            %window,
            submitted = state.counters.submitted_frames,
            presented = state.counters.presented_frames,
            "render thread stopped"
        );
        true
    }

    /// The window this queue was started for.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> WindowId {
        self.window
    }

    /// True while the render thread is serving work and has not failed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        let state = self.shared.state.lock();
        state.running && !state.failed
    }

    /// True if the queue is running for `window`.
    #[must_use]
    pub fn is_running_for_window(&self, window: WindowId) -> bool {
        window == self.window && self.is_running()
    }

    /// True if the caller is the render thread.
    #[must_use]
    pub fn is_render_thread(&self) -> bool {
        let state = self.shared.state.lock();
        state.running && state.render_thread == Some(thread::current().id())
    }

    /// The window while the queue is running, `None` otherwise.
    #[must_use]
    pub fn active_window(&self) -> Option<WindowId> {
        self.is_running().then_some(self.window)
    }

    /// Blocks until no sync call, packet or present is pending and every
    /// submitted frame has been presented.
    ///
    /// Returns at once for another window or a stopped queue.
    pub fn wait_idle(&self, window: WindowId) {
        if window != self.window || self.is_render_thread() {
            return;
        }
        let mut state = self.shared.state.lock();
        while !state.is_idle() && state.running && !state.failed {
            if state.sync_pending || !state.sync_completed {
                self.shared.sync_done.wait(&mut state);
            } else {
                self.shared.present_done.wait(&mut state);
            }
        }
    }

    /// Snapshot of lifecycle flags and frame counters.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::NotFound`] for another window or when no
    /// render thread has been started.
    pub fn diagnostics(&self, window: WindowId) -> RenderQueueResult<RenderThreadDiagnostics> {
        let state = self.shared.state.lock();
        if window != self.window || !state.thread_started {
            return Err(RenderQueueError::NotFound(window));
        }
        Ok(state.diagnostics())
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        if !self.is_render_thread() {
            self.stop(self.window);
            return;
        }
        // Nobody is left to join the thread, so ask the loop to exit on its
        // own. It detaches and ends unjoined.
        let mut state = self.shared.state.lock();
        if !state.stopping {
            warn!(
                window = %self.window,
                "last queue handle dropped on the render thread; exiting unjoined"
            );
            state.stopping = true;
            self.shared.work_ready.notify_all();
            self.shared.wake_waiters();
        }
    }
}

impl std::fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderQueue")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

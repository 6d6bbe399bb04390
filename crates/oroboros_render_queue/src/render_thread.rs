//! # Render Thread Facade
//!
//! Process-wide entry points over the single active [`RenderQueue`].
//!
//! Every function reports success as `bool`/`Option` and records the
//! outcome in the calling thread's last-error slot ([`last_error`]). This
//! is the surface the window layer and the per-call command wrappers use:
//!
//! ```rust,ignore
//! render_thread::start(window, RenderThreadConfig::default(), backend);
//!
//! render_thread::begin_frame(window);
//! render_thread::dispatch(set_clear_color, &[0.1f32, 0.1, 0.1, 1.0]);
//! render_thread::submit_frame(window);
//!
//! render_thread::stop(window);
//! ```
//!
//! [`dispatch`] and [`dispatch_blob`] execute directly on the calling thread
//! when no render thread is active, so wrapper code behaves the same with
//! or without one.
//!
//! [`last_error`]: crate::error::last_error

use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::Mutex;
use tracing::warn;

use crate::backend::{RenderBackend, WindowId};
use crate::config::RenderThreadConfig;
use crate::diagnostics::{FrameStats, RenderThreadDiagnostics};
use crate::error::{report, set_last_error, RenderQueueError, ResultCode};
use crate::packet::{check_blob_alignment, CommandArgs, CommandFn};
use crate::queue::RenderQueue;

static ACTIVE: Mutex<Option<Arc<RenderQueue>>> = parking_lot::const_mutex(None);

fn active() -> Option<Arc<RenderQueue>> {
    ACTIVE.lock().clone()
}

fn reject(code: ResultCode) -> bool {
    set_last_error(code);
    false
}

/// Starts the render thread for `window`.
///
/// Fails with `InvalidArgument` for the null window and `Unsupported` while
/// another queue is active.
pub fn start<B: RenderBackend>(window: WindowId, config: RenderThreadConfig, backend: B) -> bool {
    if window.is_null() {
        return reject(ResultCode::InvalidArgument);
    }
    let mut slot = ACTIVE.lock();
    if let Some(current) = slot.as_ref() {
        warn!(%window, active = %current.window(), "render thread already active");
        return reject(ResultCode::Unsupported);
    }
    match report(RenderQueue::start(window, config, backend)) {
        Some(queue) => {
            *slot = Some(Arc::new(queue));
            true
        }
        None => false,
    }
}

/// Stops the render thread if `window` owns it. No-op otherwise.
///
/// From the render thread itself the request is refused with
/// [`ResultCode::Unsupported`] and the queue stays active.
pub fn stop(window: WindowId) {
    set_last_error(ResultCode::Ok);
    let Some(queue) = active().filter(|queue| queue.window() == window) else {
        return;
    };
    if !queue.stop(window) {
        set_last_error(ResultCode::Unsupported);
        return;
    }

    let mut slot = ACTIVE.lock();
    if slot.as_ref().is_some_and(|active| Arc::ptr_eq(active, &queue)) {
        *slot = None;
    }
}

/// True while a render thread is running.
#[must_use]
pub fn is_running() -> bool {
    active().is_some_and(|queue| queue.is_running())
}

/// True while a render thread is running for `window`.
#[must_use]
pub fn is_running_for_window(window: WindowId) -> bool {
    active().is_some_and(|queue| queue.is_running_for_window(window))
}

/// True when called from the active render thread.
#[must_use]
pub fn is_render_thread() -> bool {
    active().is_some_and(|queue| queue.is_render_thread())
}

/// The window owning the running render thread.
#[must_use]
pub fn active_window() -> Option<WindowId> {
    active().and_then(|queue| queue.active_window())
}

/// Blocks until the render thread for `window` has no pending work.
pub fn wait_idle(window: WindowId) {
    if let Some(queue) = active() {
        queue.wait_idle(window);
    }
}

/// Diagnostics for `window`, or `None` (`NotFound`) if it has no render thread.
#[must_use]
pub fn diagnostics(window: WindowId) -> Option<RenderThreadDiagnostics> {
    match active() {
        Some(queue) => report(queue.diagnostics(window)),
        None => report(Err(RenderQueueError::NotFound(window))),
    }
}

/// Opens a frame on `window`'s render thread.
pub fn begin_frame(window: WindowId) -> bool {
    with_window(window, |queue| report(queue.begin_frame(window)).is_some())
}

/// Submits the open frame on `window`'s render thread.
pub fn submit_frame(window: WindowId) -> bool {
    with_window(window, |queue| report(queue.submit_frame(window)).is_some())
}

/// Blocks until every frame submitted for `window` has been presented.
pub fn wait_presented(window: WindowId) {
    if let Some(queue) = active() {
        queue.wait_presented(window);
    }
}

/// Frame statistics for `window`, or `None` (`NotFound`) if it is not running.
#[must_use]
pub fn frame_stats(window: WindowId) -> Option<FrameStats> {
    match active() {
        Some(queue) => report(queue.frame_stats(window)),
        None => report(Err(RenderQueueError::NotFound(window))),
    }
}

/// Runs `f` on the render thread and returns its result.
pub fn call_sync<R, F>(f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    call_sync_sized(f, 0)
}

/// Runs `f` on the render thread, accounting `payload_bytes` to the open frame.
///
/// `None` with `Unsupported` when no render thread is active.
pub fn call_sync_sized<R, F>(f: F, payload_bytes: usize) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    match active() {
        Some(queue) => report(queue.call_sync_sized(f, payload_bytes)),
        None => report(Err(RenderQueueError::Unsupported("render thread is not active"))),
    }
}

/// Records an async command into the open frame.
pub fn record_async<P: Pod>(exec: CommandFn, payload: &P) -> bool {
    match active() {
        Some(queue) => report(queue.record_async(exec, payload)).is_some(),
        None => reject(ResultCode::Unsupported),
    }
}

/// Records an async command with a blob into the open frame.
pub fn record_async_blob<P: Pod, T: Pod>(exec: CommandFn, payload: &P, blob: &[T]) -> bool {
    match active() {
        Some(queue) => report(queue.record_async_blob(exec, payload, blob)).is_some(),
        None => reject(ResultCode::Unsupported),
    }
}

/// Records `exec` or runs it synchronously; runs it directly when no
/// render thread is active.
pub fn dispatch<P: Pod>(exec: CommandFn, payload: &P) -> bool {
    dispatch_raw(exec, bytemuck::bytes_of(payload), &[])
}

/// [`dispatch`] with a blob.
pub fn dispatch_blob<P: Pod, T: Pod>(exec: CommandFn, payload: &P, blob: &[T]) -> bool {
    if report(check_blob_alignment::<T>()).is_none() {
        return false;
    }
    dispatch_raw(exec, bytemuck::bytes_of(payload), bytemuck::cast_slice(blob))
}

fn dispatch_raw(exec: CommandFn, payload: &[u8], blob: &[u8]) -> bool {
    match active() {
        Some(queue) => report(queue.dispatch_raw(exec, payload, blob)).is_some(),
        None => {
            exec(&CommandArgs::new(payload, blob));
            set_last_error(ResultCode::Ok);
            true
        }
    }
}

fn with_window(window: WindowId, f: impl FnOnce(&RenderQueue) -> bool) -> bool {
    if window.is_null() {
        return reject(ResultCode::InvalidArgument);
    }
    match active() {
        Some(queue) => f(&*queue),
        None => reject(ResultCode::BackendFailure),
    }
}

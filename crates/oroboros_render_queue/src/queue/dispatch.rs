//! Cross-thread dispatch: async recording, synchronous round trips, and
//! the record-or-call fallback used by command wrappers.
//!
//! ## Ordering
//!
//! A synchronous call first flushes the producer's open packet through the
//! render thread, so it observes every command already recorded. Async
//! recording that gets rejected falls back to a synchronous call, which
//! keeps the fallback command behind everything recorded before it.

use bytemuck::Pod;
use crossbeam_channel::bounded;
use parking_lot::MutexGuard;
use tracing::{debug, warn};

use super::state::QueueState;
use super::RenderQueue;
use crate::error::{RenderQueueError, RenderQueueResult};
use crate::packet::{check_blob_alignment, CommandArgs, CommandFn, CommandPacket};

impl RenderQueue {
    /// Runs `f` on the render thread and returns its result.
    ///
    /// Equivalent to [`RenderQueue::call_sync_sized`] with no payload bytes.
    ///
    /// # Errors
    ///
    /// See [`RenderQueue::call_sync_sized`].
    pub fn call_sync<R, F>(&self, f: F) -> RenderQueueResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.call_sync_sized(f, 0)
    }

    /// Runs `f` on the render thread, blocking until it returns.
    ///
    /// On the render thread itself `f` runs inline. Otherwise the call waits
    /// out any frame in flight and any other sync call, flushes the open
    /// packet, then hands `f` over. `payload_bytes` is added to the open
    /// frame's byte counter.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::BackendFailure`] if the queue is not
    /// running or fails before `f` completes.
    pub fn call_sync_sized<R, F>(&self, f: F, payload_bytes: usize) -> RenderQueueResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_render_thread() {
            return Ok(f());
        }

        let mut state = self.shared.state.lock();
        if !state.is_healthy() {
            return Err(RenderQueueError::BackendFailure("render queue is not running"));
        }
        while (state.frame_in_flight() || state.present_pending) && state.is_healthy() {
            self.shared.present_done.wait(&mut state);
        }
        while (state.sync_pending || !state.sync_completed) && state.is_healthy() {
            self.shared.sync_done.wait(&mut state);
        }
        if !state.is_healthy() {
            return Err(RenderQueueError::BackendFailure(
                "render thread stopped before the call was dispatched",
            ));
        }

        self.flush_open_packet(&mut state)?;
        if state.frame_open {
            state.counters.current_command_count += 1;
            state.counters.current_command_bytes += payload_bytes as u64;
        }
        self.run_on_render_thread(&mut state, f)
    }

    /// Records `exec` with a typed payload into the open frame.
    ///
    /// # Errors
    ///
    /// See [`RenderQueue::record_async_raw`].
    pub fn record_async<P: Pod>(&self, exec: CommandFn, payload: &P) -> RenderQueueResult<()> {
        self.record_async_raw(exec, bytemuck::bytes_of(payload), &[])
    }

    /// Records `exec` with a typed payload and a blob into the open frame.
    ///
    /// The blob is copied; the caller may reuse it immediately.
    ///
    /// # Errors
    ///
    /// [`RenderQueueError::InvalidArgument`] if `T` is aligned beyond 8
    /// bytes, otherwise see [`RenderQueue::record_async_raw`].
    pub fn record_async_blob<P: Pod, T: Pod>(
        &self,
        exec: CommandFn,
        payload: &P,
        blob: &[T],
    ) -> RenderQueueResult<()> {
        check_blob_alignment::<T>()?;
        self.record_async_raw(exec, bytemuck::bytes_of(payload), bytemuck::cast_slice(blob))
    }

    /// Records `exec` with untyped argument bytes into the open frame.
    ///
    /// On the render thread the command runs inline instead.
    ///
    /// # Errors
    ///
    /// - [`RenderQueueError::BackendFailure`] if the queue is not running,
    ///   is stopping or has failed
    /// - [`RenderQueueError::Unsupported`] if no frame is open
    /// - [`RenderQueueError::CapacityExceeded`] if the packet is full
    pub fn record_async_raw(
        &self,
        exec: CommandFn,
        payload: &[u8],
        blob: &[u8],
    ) -> RenderQueueResult<()> {
        if self.is_render_thread() {
            exec(&CommandArgs::new(payload, blob));
            return Ok(());
        }

        let mut state = self.shared.state.lock();
        if !state.is_healthy() {
            return Err(RenderQueueError::BackendFailure("render queue is not running"));
        }
        if !state.frame_open {
            return Err(RenderQueueError::Unsupported("no frame is open"));
        }

        let index = state.record_packet;
        let (commands, bytes) = match state.packets[index].as_mut() {
            Some(packet) if !packet.is_submitted() => {
                packet.record(exec, payload, blob)?;
                (packet.len() as u64, packet.payload_used() as u64)
            }
            _ => {
                return Err(RenderQueueError::BackendFailure(
                    "recording packet is not available",
                ))
            }
        };
        state.counters.current_command_count = commands;
        state.counters.current_command_bytes = bytes;
        Ok(())
    }

    /// Records `exec`, or runs it synchronously if recording is rejected.
    ///
    /// # Errors
    ///
    /// Only fails when the synchronous fallback fails.
    pub fn dispatch<P: Pod>(&self, exec: CommandFn, payload: &P) -> RenderQueueResult<()> {
        self.dispatch_raw(exec, bytemuck::bytes_of(payload), &[])
    }

    /// [`RenderQueue::dispatch`] with a blob.
    ///
    /// # Errors
    ///
    /// [`RenderQueueError::InvalidArgument`] for over-aligned blob types,
    /// otherwise only when the synchronous fallback fails.
    pub fn dispatch_blob<P: Pod, T: Pod>(
        &self,
        exec: CommandFn,
        payload: &P,
        blob: &[T],
    ) -> RenderQueueResult<()> {
        check_blob_alignment::<T>()?;
        self.dispatch_raw(exec, bytemuck::bytes_of(payload), bytemuck::cast_slice(blob))
    }

    pub(crate) fn dispatch_raw(
        &self,
        exec: CommandFn,
        payload: &[u8],
        blob: &[u8],
    ) -> RenderQueueResult<()> {
        match self.record_async_raw(exec, payload, blob) {
            Ok(()) => Ok(()),
            Err(e) => {
                if matches!(e, RenderQueueError::CapacityExceeded { .. }) {
                    warn!(window = %self.window, error = %e, "packet full; executing synchronously");
                } else {
                    debug!(window = %self.window, error = %e, "async recording rejected; executing synchronously");
                }
                let snapshot = CommandPacket::snapshot(exec, payload, blob)?;
                self.call_sync_sized(move || snapshot.execute(), payload.len() + blob.len())
            }
        }
    }

    /// Executes the open packet's commands on the render thread without
    /// presenting, then hands the emptied packet back to the open frame.
    fn flush_open_packet(&self, state: &mut MutexGuard<'_, QueueState>) -> RenderQueueResult<()> {
        if !state.frame_open {
            return Ok(());
        }
        let index = state.record_packet;
        let has_commands = state.packets[index]
            .as_ref()
            .is_some_and(|packet| !packet.is_submitted() && !packet.is_empty());
        if !has_commands {
            return Ok(());
        }
        let Some(packet) = state.packets[index].take() else {
            return Ok(());
        };

        let commands = packet.len();
        let mut packet = self.run_on_render_thread(state, move || {
            packet.execute();
            packet
        })?;
        packet.reset();
        state.packets[index] = Some(packet);
        state.counters.current_command_count = 0;
        state.counters.current_command_bytes = 0;

        debug!(window = %self.window, commands, "flushed open packet ahead of synchronous call");
        Ok(())
    }

    /// Places `f` in the sync slot and waits for the render thread to run it.
    fn run_on_render_thread<R, F>(
        &self,
        state: &mut MutexGuard<'_, QueueState>,
        f: F,
    ) -> RenderQueueResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        state.sync_job = Some(Box::new(move || {
            // The caller only stops listening after the runtime died.
            let _ = tx.send(f());
        }));
        state.sync_completed = false;
        state.sync_pending = true;
        self.shared.work_ready.notify_one();

        while !state.sync_completed && state.running && !state.failed {
            self.shared.sync_done.wait(state);
        }

        rx.try_recv().map_err(|_| {
            RenderQueueError::BackendFailure("render thread exited before completing the call")
        })
    }
}

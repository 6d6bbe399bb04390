//! Frame recording protocol: `begin_frame`, `submit_frame`, pacing waits.

use std::time::Instant;

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use super::state::{elapsed_ms, QueueState, PACKET_COUNT};
use super::RenderQueue;
use crate::backend::WindowId;
use crate::diagnostics::FrameStats;
use crate::error::{RenderQueueError, RenderQueueResult};

impl RenderQueue {
    /// Opens a frame for recording.
    ///
    /// Blocks while the render thread still owns the packet this frame
    /// needs. That wait is what bounds the pipeline to one frame in flight.
    ///
    /// # Errors
    ///
    /// - [`RenderQueueError::Unsupported`] if a frame is already open
    /// - [`RenderQueueError::BackendFailure`] if the queue is not running,
    ///   belongs to another window, has failed, or stops while waiting
    pub fn begin_frame(&self, window: WindowId) -> RenderQueueResult<()> {
        let mut state = self.shared.state.lock();
        self.check_frame_owner(&state, window)?;
        if state.frame_open {
            warn!(%window, "begin_frame while a frame is already open");
            return Err(RenderQueueError::Unsupported("a frame is already open"));
        }

        let mut index = state.record_packet % PACKET_COUNT;
        if state.packet_busy(index) {
            index = (index + 1) % PACKET_COUNT;
            while state.packet_busy(index) && state.is_healthy() {
                self.shared.present_done.wait(&mut state);
            }
            if !state.is_healthy() {
                return Err(RenderQueueError::BackendFailure(
                    "render thread stopped while waiting for a free packet",
                ));
            }
        }

        let Some(packet) = state.packets[index].as_mut() else {
            return Err(RenderQueueError::BackendFailure("packet released"));
        };
        packet.reset();

        state.record_packet = index;
        state.frame_open = true;
        state.counters.current_command_count = 0;
        state.counters.current_command_bytes = 0;
        Ok(())
    }

    /// Hands the open frame to the render thread.
    ///
    /// Waits first for the previous frame to be presented. With
    /// `wait_on_submit` it also waits for this frame.
    ///
    /// # Errors
    ///
    /// - [`RenderQueueError::Unsupported`] if no frame is open
    /// - [`RenderQueueError::BackendFailure`] if the queue is unhealthy or
    ///   fails before the frame could be handed off or presented
    pub fn submit_frame(&self, window: WindowId) -> RenderQueueResult<()> {
        let wait_begin = Instant::now();
        let mut state = self.shared.state.lock();
        self.check_frame_owner(&state, window)?;
        if !state.frame_open {
            warn!(%window, "submit_frame without an open frame");
            return Err(RenderQueueError::Unsupported("no frame is open"));
        }

        if state.frame_in_flight() {
            state.counters.submit_stalls += 1;
            while state.frame_in_flight() && state.is_healthy() {
                self.shared.present_done.wait(&mut state);
            }
            if !state.is_healthy() {
                return Err(RenderQueueError::BackendFailure(
                    "render thread stopped while waiting to submit",
                ));
            }
        }
        state.counters.last_submit_wait_ms = elapsed_ms(wait_begin);

        let index = state.record_packet;
        let (commands, bytes) = match state.packets[index].as_mut() {
            Some(packet) if !packet.is_submitted() => {
                packet.set_submitted(true);
                (packet.len() as u64, packet.payload_used() as u64)
            }
            _ => {
                return Err(RenderQueueError::BackendFailure(
                    "recording packet is not available",
                ))
            }
        };

        state.frame_open = false;
        state.counters.submitted_frames += 1;
        state.counters.last_command_count = commands;
        state.counters.last_command_bytes = bytes;
        state.pending_packet = Some(index);
        state.present_pending = true;
        self.shared.work_ready.notify_one();

        debug!(
            %window,
            frame = state.counters.submitted_frames,
            commands,
            bytes,
            "frame submitted"
        );

        if state.config.wait_on_submit {
            self.wait_presented_locked(&mut state);
            if state.failed {
                return Err(RenderQueueError::BackendFailure(
                    "render thread failed before presenting",
                ));
            }
        }
        Ok(())
    }

    /// Blocks until every submitted frame has been presented.
    ///
    /// Returns at once for another window or a stopped queue.
    pub fn wait_presented(&self, window: WindowId) {
        if window != self.window || self.is_render_thread() {
            return;
        }
        let mut state = self.shared.state.lock();
        self.wait_presented_locked(&mut state);
    }

    /// Frame counters for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::NotFound`] for another window or when the
    /// queue is not running.
    pub fn frame_stats(&self, window: WindowId) -> RenderQueueResult<FrameStats> {
        let state = self.shared.state.lock();
        if window != self.window || !state.running {
            return Err(RenderQueueError::NotFound(window));
        }
        Ok(state.frame_stats())
    }

    fn wait_presented_locked(&self, state: &mut MutexGuard<'_, QueueState>) {
        while state.frame_in_flight() && state.running && !state.failed {
            self.shared.present_done.wait(state);
        }
    }

    fn check_frame_owner(&self, state: &QueueState, window: WindowId) -> RenderQueueResult<()> {
        if window != self.window {
            warn!(%window, owner = %self.window, "frame call for a window without the render thread");
            return Err(RenderQueueError::BackendFailure(
                "render thread belongs to another window",
            ));
        }
        if !state.is_healthy() {
            return Err(RenderQueueError::BackendFailure("render queue is not running"));
        }
        Ok(())
    }
}

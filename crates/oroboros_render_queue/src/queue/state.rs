//! Runtime state shared between producers and the render thread.
//!
//! Everything lives behind one mutex. The four condition variables are
//! the only way either side waits for the other.

use std::thread::{JoinHandle, ThreadId};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::backend::WindowId;
use crate::config::RenderThreadConfig;
use crate::diagnostics::{FrameStats, RenderThreadDiagnostics};
use crate::packet::CommandPacket;

/// Double buffering: one packet recording, one in flight.
pub(crate) const PACKET_COUNT: usize = 2;

/// A type-erased synchronous call, run once on the render thread.
pub(crate) type SyncJob = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct Shared {
    pub state: Mutex<QueueState>,
    /// Producer -> render thread: a sync call, packet or present is pending.
    pub work_ready: Condvar,
    /// Render thread -> `start`: attach finished, one way or the other.
    pub started: Condvar,
    /// Render thread -> sync callers: the pending call completed.
    pub sync_done: Condvar,
    /// Render thread -> frame callers: a frame was presented.
    pub present_done: Condvar,
}

impl Shared {
    pub fn new(state: QueueState) -> Self {
        Self {
            state: Mutex::new(state),
            work_ready: Condvar::new(),
            started: Condvar::new(),
            sync_done: Condvar::new(),
            present_done: Condvar::new(),
        }
    }

    /// Wakes every producer-side waiter.
    pub fn wake_waiters(&self) {
        self.sync_done.notify_all();
        self.present_done.notify_all();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameCounters {
    pub submitted_frames: u64,
    pub presented_frames: u64,
    pub submit_stalls: u64,
    pub last_command_count: u64,
    pub last_command_bytes: u64,
    pub current_command_count: u64,
    pub current_command_bytes: u64,
    pub last_submit_wait_ms: f64,
    pub last_execute_ms: f64,
    pub last_present_ms: f64,
}

pub(crate) struct QueueState {
    pub window: WindowId,
    pub config: RenderThreadConfig,

    pub thread_started: bool,
    pub started_signal: bool,
    pub running: bool,
    pub stopping: bool,
    pub failed: bool,
    pub frame_open: bool,
    pub render_thread: Option<ThreadId>,
    pub thread: Option<JoinHandle<()>>,

    pub sync_job: Option<SyncJob>,
    pub sync_pending: bool,
    pub sync_completed: bool,

    pub present_pending: bool,
    pub pending_packet: Option<usize>,
    pub record_packet: usize,
    /// `None` while the packet is out of its slot (executing) or released.
    pub packets: [Option<CommandPacket>; PACKET_COUNT],

    pub counters: FrameCounters,
}

impl QueueState {
    pub fn new(
        window: WindowId,
        config: RenderThreadConfig,
        packets: [CommandPacket; PACKET_COUNT],
    ) -> Self {
        let [first, second] = packets;
        Self {
            window,
            config,
            thread_started: false,
            started_signal: false,
            running: false,
            stopping: false,
            failed: false,
            frame_open: false,
            render_thread: None,
            thread: None,
            sync_job: None,
            sync_pending: false,
            sync_completed: true,
            present_pending: false,
            pending_packet: None,
            record_packet: 0,
            packets: [Some(first), Some(second)],
            counters: FrameCounters::default(),
        }
    }

    /// Running, not failed and not stopping.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.running && !self.failed && !self.stopping
    }

    /// A submitted frame has not been presented yet.
    #[inline]
    pub fn frame_in_flight(&self) -> bool {
        self.counters.submitted_frames > self.counters.presented_frames
    }

    /// Nothing pending and every submitted frame presented.
    #[inline]
    pub fn is_idle(&self) -> bool {
        !self.sync_pending
            && !self.present_pending
            && self.pending_packet.is_none()
            && !self.frame_in_flight()
    }

    /// The slot cannot be recorded into: submitted, executing or released.
    #[inline]
    pub fn packet_busy(&self, index: usize) -> bool {
        self.packets[index]
            .as_ref()
            .map_or(true, CommandPacket::is_submitted)
    }

    pub fn release_packets(&mut self) {
        self.packets = [None, None];
    }

    pub fn frame_stats(&self) -> FrameStats {
        let c = &self.counters;
        FrameStats {
            submitted_frames: c.submitted_frames,
            presented_frames: c.presented_frames,
            submit_stalls: c.submit_stalls,
            queue_depth: u32::from(self.frame_in_flight()),
            last_command_count: c.last_command_count,
            last_command_bytes: c.last_command_bytes,
            last_submit_wait_ms: c.last_submit_wait_ms,
            last_execute_ms: c.last_execute_ms,
            last_present_ms: c.last_present_ms,
        }
    }

    pub fn diagnostics(&self) -> RenderThreadDiagnostics {
        RenderThreadDiagnostics {
            running: self.running,
            stopping: self.stopping,
            failed: self.failed,
            frame_open: self.frame_open,
            open_frame_commands: self.counters.current_command_count,
            open_frame_bytes: self.counters.current_command_bytes,
            frames: self.frame_stats(),
        }
    }
}

/// Milliseconds elapsed since `since`.
#[inline]
pub(crate) fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> QueueState {
        let packets = [
            CommandPacket::try_new(4, 64).unwrap(),
            CommandPacket::try_new(4, 64).unwrap(),
        ];
        QueueState::new(WindowId::new(1), RenderThreadConfig::default(), packets)
    }

    #[test]
    fn test_fresh_state_is_idle() {
        let state = state();
        assert!(state.is_idle());
        assert!(!state.is_healthy());
        assert!(state.sync_completed);
        assert!(!state.packet_busy(0));
        assert_eq!(state.frame_stats().queue_depth, 0);
    }

    #[test]
    fn test_queue_depth_tracks_in_flight() {
        let mut state = state();
        state.counters.submitted_frames = 3;
        state.counters.presented_frames = 2;
        assert!(state.frame_in_flight());
        assert!(!state.is_idle());
        assert_eq!(state.frame_stats().queue_depth, 1);
    }

    #[test]
    fn test_packet_busy() {
        let mut state = state();
        if let Some(packet) = state.packets[1].as_mut() {
            packet.set_submitted(true);
        }
        assert!(state.packet_busy(1));

        state.packets[0] = None;
        assert!(state.packet_busy(0));

        state.release_packets();
        assert!(state.packet_busy(1));
    }
}

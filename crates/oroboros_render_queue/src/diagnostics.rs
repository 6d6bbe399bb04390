//! # Render Thread Diagnostics
//!
//! Point-in-time copies of the runtime counters. Taken under the runtime
//! lock, so every field in one snapshot is mutually consistent.

/// Lifecycle flags plus frame statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderThreadDiagnostics {
    /// The render thread is attached and serving work.
    pub running: bool,
    /// `stop` has been requested.
    pub stopping: bool,
    /// The render thread failed. Sticky until `stop`.
    pub failed: bool,
    /// A frame is open for recording.
    pub frame_open: bool,
    /// Commands accounted to the open frame so far.
    pub open_frame_commands: u64,
    /// Bytes accounted to the open frame so far.
    pub open_frame_bytes: u64,
    /// Frame statistics.
    pub frames: FrameStats,
}

/// Frame pacing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frames handed to the render thread.
    pub submitted_frames: u64,
    /// Frames the render thread has presented.
    pub presented_frames: u64,
    /// Submits that had to wait for the previous frame to present.
    pub submit_stalls: u64,
    /// Frames submitted but not yet presented (0 or 1).
    pub queue_depth: u32,
    /// Commands in the last submitted packet.
    pub last_command_count: u64,
    /// Arena bytes used by the last submitted packet.
    pub last_command_bytes: u64,
    /// Time the last submit spent waiting for the previous frame.
    pub last_submit_wait_ms: f64,
    /// Duration of the last packet or sync call executed.
    pub last_execute_ms: f64,
    /// Duration of the last present.
    pub last_present_ms: f64,
}

impl FrameStats {
    /// Returns true once every submitted frame has been presented.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.submitted_frames == self.presented_frames
    }
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "submitted={} presented={} stalls={} depth={} last_commands={} last_bytes={} \
             submit_wait={:.3}ms execute={:.3}ms present={:.3}ms",
            self.submitted_frames,
            self.presented_frames,
            self.submit_stalls,
            self.queue_depth,
            self.last_command_count,
            self.last_command_bytes,
            self.last_submit_wait_ms,
            self.last_execute_ms,
            self.last_present_ms,
        )
    }
}

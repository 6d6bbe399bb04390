//! # OROBOROS Render Queue
//!
//! A dedicated render thread that owns the window's graphics context, fed
//! by the game thread through double-buffered command packets.
//!
//! ## Architecture Rules
//!
//! 1. **One frame in flight** - `submit_frame` never runs ahead of the present
//! 2. **Snapshots only** - the render thread never reads caller memory
//! 3. **Always executes** - a command that cannot be recorded runs synchronously
//! 4. **Zero allocations while recording** - packets are reserved at start
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_render_queue::{CommandArgs, HeadlessBackend, RenderQueue, RenderThreadConfig, WindowId};
//!
//! fn clear(args: &CommandArgs<'_>) {
//!     let rgba: [f32; 4] = args.payload();
//!     // gl.clear_color(rgba) on the render thread
//! }
//!
//! let window = WindowId::new(1);
//! let queue = RenderQueue::start(window, RenderThreadConfig::default(), HeadlessBackend::new())?;
//!
//! queue.begin_frame(window)?;
//! queue.dispatch(clear, &[0.0f32, 0.0, 0.0, 1.0])?;
//! queue.submit_frame(window)?;
//!
//! let stats = queue.frame_stats(window)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod packet;
pub mod queue;
pub mod render_thread;

pub use backend::{HeadlessBackend, HeadlessStats, RenderBackend, WindowId};
pub use config::RenderThreadConfig;
pub use diagnostics::{FrameStats, RenderThreadDiagnostics};
pub use error::{last_error, set_last_error, RenderQueueError, RenderQueueResult, ResultCode};
pub use packet::{CommandArgs, CommandFn, CommandPacket};
pub use queue::{RenderQueue, RENDER_THREAD_NAME};

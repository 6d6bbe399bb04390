//! # Memory Management
//!
//! Pre-allocated arenas for zero-allocation recording.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once at startup. While recording:
//! - No heap allocations
//! - No garbage collection
//! - Predictable, flat latency

mod arena;

pub use arena::{Arena, ARENA_ALIGN};

//! # OROBOROS Core Engine
//!
//! Zero-allocation memory primitives shared by the engine's hot paths:
//! - Fixed-capacity storage, reserved once at startup
//! - O(1) reset between frames
//! - Zero garbage collection pressure
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - All memory is pre-allocated
//! 2. **Data-oriented design** - Snapshots are packed into contiguous words
//! 3. **Plain ownership** - Buffers are handed between threads by moving them
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_core::Arena;
//!
//! let mut arena = Arena::new(4 * 1024 * 1024);
//! // All memory pre-allocated, zero allocations while recording
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;

pub use memory::{Arena, ARENA_ALIGN};

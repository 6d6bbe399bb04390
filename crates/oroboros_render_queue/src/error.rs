//! # Render Queue Error Types
//!
//! All errors that can occur while recording, dispatching or presenting.
//!
//! Fallible operations on [`crate::RenderQueue`] return [`RenderQueueResult`].
//! The free-function facade in [`crate::render_thread`] reports through
//! `bool`/`Option` instead and leaves a [`ResultCode`] in a per-thread
//! last-error slot, readable with [`last_error`].

use std::cell::Cell;
use std::fmt;

use thiserror::Error;

use crate::backend::WindowId;

/// Errors that can occur in the render queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderQueueError {
    /// A caller passed an argument the queue cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation is not valid in the current state.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// The render thread is not running, is stopping, or has failed.
    #[error("backend failure: {0}")]
    BackendFailure(&'static str),

    /// The open packet cannot hold the command.
    #[error("{resource} capacity exceeded: capacity {capacity}, requested {requested}")]
    CapacityExceeded {
        /// Which limit was hit ("command" or "byte").
        resource: &'static str,
        /// The configured limit.
        capacity: usize,
        /// What the packet would need to hold the command.
        requested: usize,
    },

    /// No render thread is attached to this window.
    #[error("no render thread for {0}")]
    NotFound(WindowId),

    /// A packet or snapshot buffer could not be allocated.
    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory {
        /// Size of the failed allocation.
        bytes: usize,
    },
}

impl RenderQueueError {
    /// Maps the error onto its facade result code.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        match self {
            Self::InvalidArgument(_) | Self::InvalidConfig(_) => ResultCode::InvalidArgument,
            Self::Unsupported(_) => ResultCode::Unsupported,
            Self::BackendFailure(_) => ResultCode::BackendFailure,
            Self::CapacityExceeded { .. } => ResultCode::CapacityExceeded,
            Self::NotFound(_) => ResultCode::NotFound,
            Self::OutOfMemory { .. } => ResultCode::OutOfMemory,
        }
    }
}

/// Result type for render queue operations.
pub type RenderQueueResult<T> = Result<T, RenderQueueError>;

/// Outcome of the most recent facade call on this thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    /// The call succeeded.
    #[default]
    Ok = 0,
    /// See [`RenderQueueError::InvalidArgument`].
    InvalidArgument,
    /// See [`RenderQueueError::Unsupported`].
    Unsupported,
    /// See [`RenderQueueError::BackendFailure`].
    BackendFailure,
    /// See [`RenderQueueError::CapacityExceeded`].
    CapacityExceeded,
    /// See [`RenderQueueError::NotFound`].
    NotFound,
    /// See [`RenderQueueError::OutOfMemory`].
    OutOfMemory,
}

impl ResultCode {
    /// Stable lowercase name, suitable for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::Unsupported => "unsupported",
            Self::BackendFailure => "backend_failure",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::NotFound => "not_found",
            Self::OutOfMemory => "out_of_memory",
        }
    }

    /// Returns true for [`ResultCode::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

thread_local! {
    static LAST_ERROR: Cell<ResultCode> = const { Cell::new(ResultCode::Ok) };
}

/// Returns the result of the last facade call made on the calling thread.
#[must_use]
pub fn last_error() -> ResultCode {
    LAST_ERROR.with(Cell::get)
}

/// Overwrites the calling thread's last-error slot.
pub fn set_last_error(code: ResultCode) {
    LAST_ERROR.with(|slot| slot.set(code));
}

/// Stores the outcome of `result` in the last-error slot and returns the value.
pub(crate) fn report<T>(result: RenderQueueResult<T>) -> Option<T> {
    match result {
        Ok(value) => {
            set_last_error(ResultCode::Ok);
            Some(value)
        }
        Err(err) => {
            set_last_error(err.code());
            None
        }
    }
}

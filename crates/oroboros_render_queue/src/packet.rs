//! # Command Packets
//!
//! One frame's worth of recorded commands.
//!
//! ```text
//!   commands: [ entry0 | entry1 | entry2 | ... ]      (fixed slots)
//!                 │        │        │
//!   arena:    [ payload0 | payload1 blob1 | payload2 | ... ]  (word-aligned)
//! ```
//!
//! Every payload and blob is copied into the packet's own arena when the
//! command is recorded. The render thread only ever sees these snapshots,
//! so the caller may mutate or free its buffers the moment `record` returns.
//!
//! Both the slot array and the arena are allocated once. Recording never
//! touches the heap.

use bytemuck::Pod;
use oroboros_core::{Arena, ARENA_ALIGN};

use crate::error::{RenderQueueError, RenderQueueResult};

/// A recorded command. Runs on the render thread with a view of its snapshot.
pub type CommandFn = fn(&CommandArgs<'_>);

/// The arguments of one command, as seen by its [`CommandFn`].
#[derive(Clone, Copy, Debug)]
pub struct CommandArgs<'a> {
    payload: &'a [u8],
    blob: &'a [u8],
}

impl<'a> CommandArgs<'a> {
    /// Wraps raw payload and blob bytes.
    #[inline]
    #[must_use]
    pub const fn new(payload: &'a [u8], blob: &'a [u8]) -> Self {
        Self { payload, blob }
    }

    /// Raw payload bytes.
    #[inline]
    #[must_use]
    pub const fn payload_bytes(&self) -> &'a [u8] {
        self.payload
    }

    /// Raw blob bytes. Empty when the command has no blob.
    #[inline]
    #[must_use]
    pub const fn blob_bytes(&self) -> &'a [u8] {
        self.blob
    }

    /// Reads the payload as `P`.
    ///
    /// # Panics
    ///
    /// Panics if the payload is not exactly `size_of::<P>()` bytes.
    #[inline]
    #[must_use]
    pub fn payload<P: Pod>(&self) -> P {
        bytemuck::pod_read_unaligned(self.payload)
    }

    /// Reads the payload as `P`, or `None` on a size mismatch.
    #[inline]
    #[must_use]
    pub fn try_payload<P: Pod>(&self) -> Option<P> {
        bytemuck::try_pod_read_unaligned(self.payload).ok()
    }

    /// Views the blob as a slice of `T`.
    ///
    /// # Panics
    ///
    /// Panics if the blob length is not a multiple of `size_of::<T>()`.
    #[inline]
    #[must_use]
    pub fn blob<T: Pod>(&self) -> &'a [T] {
        if self.blob.is_empty() {
            return &[];
        }
        bytemuck::cast_slice(self.blob)
    }
}

/// Rejects blob element types the arena cannot hand back aligned.
pub(crate) fn check_blob_alignment<T: Pod>() -> RenderQueueResult<()> {
    if std::mem::align_of::<T>() > ARENA_ALIGN {
        return Err(RenderQueueError::InvalidArgument(
            "blob element alignment exceeds the packet arena alignment",
        ));
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct CommandEntry {
    exec: CommandFn,
    payload_offset: usize,
    payload_len: usize,
    blob_offset: usize,
    blob_len: usize,
}

/// A fixed-capacity list of commands plus the arena holding their arguments.
pub struct CommandPacket {
    commands: Vec<CommandEntry>,
    command_capacity: usize,
    arena: Arena,
    submitted: bool,
}

impl CommandPacket {
    /// Allocates a packet for `command_capacity` commands and `byte_capacity`
    /// argument bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::OutOfMemory`] if either buffer cannot be
    /// allocated.
    pub fn try_new(command_capacity: usize, byte_capacity: usize) -> RenderQueueResult<Self> {
        let mut commands = Vec::new();
        commands
            .try_reserve_exact(command_capacity)
            .map_err(|_| RenderQueueError::OutOfMemory {
                bytes: command_capacity.saturating_mul(std::mem::size_of::<CommandEntry>()),
            })?;
        let arena = Arena::try_new(byte_capacity).map_err(|_| RenderQueueError::OutOfMemory {
            bytes: byte_capacity,
        })?;

        Ok(Self {
            commands,
            command_capacity,
            arena,
            submitted: false,
        })
    }

    /// Builds a single-command packet sized exactly for `payload` and `blob`.
    ///
    /// This is the owned argument snapshot used when a command has to run
    /// synchronously instead of being recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::OutOfMemory`] if the snapshot cannot be
    /// allocated.
    pub fn snapshot(exec: CommandFn, payload: &[u8], blob: &[u8]) -> RenderQueueResult<Self> {
        let bytes = Arena::align_up(payload.len())
            .and_then(|padded| padded.checked_add(blob.len()))
            .ok_or(RenderQueueError::OutOfMemory { bytes: usize::MAX })?;
        let mut packet = Self::try_new(1, bytes)?;
        packet.record(exec, payload, blob)?;
        Ok(packet)
    }

    /// Appends a command, copying `payload` and `blob` into the arena.
    ///
    /// Either both copies land or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::CapacityExceeded`] if the command slots
    /// or the arena are full. The packet is left unchanged.
    pub fn record(&mut self, exec: CommandFn, payload: &[u8], blob: &[u8]) -> RenderQueueResult<()> {
        if self.commands.len() >= self.command_capacity {
            return Err(RenderQueueError::CapacityExceeded {
                resource: "command",
                capacity: self.command_capacity,
                requested: self.commands.len() + 1,
            });
        }

        let mark = self.arena.mark();
        let Some(payload_offset) = self.arena.alloc_bytes(payload) else {
            return Err(self.bytes_exceeded(payload.len() + blob.len()));
        };
        let blob_offset = if blob.is_empty() {
            0
        } else if let Some(offset) = self.arena.alloc_bytes(blob) {
            offset
        } else {
            self.arena.rewind(mark);
            return Err(self.bytes_exceeded(payload.len() + blob.len()));
        };

        self.commands.push(CommandEntry {
            exec,
            payload_offset,
            payload_len: payload.len(),
            blob_offset,
            blob_len: blob.len(),
        });
        Ok(())
    }

    /// Records a command with a typed payload and no blob.
    ///
    /// # Errors
    ///
    /// See [`CommandPacket::record`].
    pub fn record_pod<P: Pod>(&mut self, exec: CommandFn, payload: &P) -> RenderQueueResult<()> {
        self.record(exec, bytemuck::bytes_of(payload), &[])
    }

    /// Records a command with a typed payload and a typed blob.
    ///
    /// # Errors
    ///
    /// Returns [`RenderQueueError::InvalidArgument`] if `T` is aligned
    /// beyond the arena, otherwise see [`CommandPacket::record`].
    pub fn record_pod_blob<P: Pod, T: Pod>(
        &mut self,
        exec: CommandFn,
        payload: &P,
        blob: &[T],
    ) -> RenderQueueResult<()> {
        check_blob_alignment::<T>()?;
        self.record(exec, bytemuck::bytes_of(payload), bytemuck::cast_slice(blob))
    }

    /// Runs every command in recorded order.
    pub fn execute(&self) {
        for entry in &self.commands {
            let payload = self.arena.bytes(entry.payload_offset, entry.payload_len);
            let blob = if entry.blob_len == 0 {
                &[][..]
            } else {
                self.arena.bytes(entry.blob_offset, entry.blob_len)
            };
            (entry.exec)(&CommandArgs::new(payload, blob));
        }
    }

    /// Drops every command and rewinds the arena. Capacity is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.commands.clear();
        self.arena.reset();
    }

    /// Number of recorded commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing has been recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Arena bytes in use, including alignment padding.
    #[inline]
    #[must_use]
    pub const fn payload_used(&self) -> usize {
        self.arena.used()
    }

    /// Maximum number of commands.
    #[inline]
    #[must_use]
    pub const fn command_capacity(&self) -> usize {
        self.command_capacity
    }

    /// Arena capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// True while the render thread owns this packet.
    #[inline]
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.submitted
    }

    #[inline]
    pub(crate) fn set_submitted(&mut self, submitted: bool) {
        self.submitted = submitted;
    }

    fn bytes_exceeded(&self, incoming: usize) -> RenderQueueError {
        RenderQueueError::CapacityExceeded {
            resource: "byte",
            capacity: self.arena.capacity(),
            requested: self.arena.used().saturating_add(incoming),
        }
    }
}

impl std::fmt::Debug for CommandPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPacket")
            .field("commands", &self.commands.len())
            .field("command_capacity", &self.command_capacity)
            .field("arena", &self.arena)
            .field("submitted", &self.submitted)
            .finish()
    }
}

//! # Arena Allocator
//!
//! A word-aligned bump allocator for byte snapshots that are freed all at once.
//!
//! The backing storage is a slice of `u64` words, so every offset handed out
//! is 8-byte aligned relative to an 8-byte aligned base. Any `Pod` value with
//! alignment up to [`ARENA_ALIGN`] can be viewed in place without copying.

use std::collections::TryReserveError;

use bytemuck::Pod;

/// Alignment of every allocation in an [`Arena`], in bytes.
///
/// At least pointer-sized on every supported target.
pub const ARENA_ALIGN: usize = std::mem::align_of::<u64>();

/// A bump-pointer arena over a fixed block of memory.
///
/// Allocations copy bytes in and return their offset. Memory is reclaimed
/// all at once with [`Arena::reset`]; the arena never grows after creation.
///
/// # Thread Safety
///
/// The arena is a plain owned value. Move it between threads to hand it off;
/// it is never shared.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(1024);
///
/// let at = arena.alloc_pod(&[1.0f32, 2.0, 3.0]).unwrap();
/// let copy: &[f32] = bytemuck::cast_slice(arena.bytes(at, 12));
///
/// arena.reset();
/// ```
pub struct Arena {
    /// The backing storage. Length is fixed at creation.
    words: Vec<u64>,
    /// Usable capacity in bytes, as requested.
    capacity: usize,
    /// Current allocation offset.
    used: usize,
}

impl Arena {
    /// Creates a new arena with `capacity` usable bytes.
    ///
    /// Aborts on allocation failure like any other `Vec`; use
    /// [`Arena::try_new`] when the caller can recover.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0u64; capacity.div_ceil(ARENA_ALIGN)],
            capacity,
            used: 0,
        }
    }

    /// Creates a new arena, reporting allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns the allocator error if the backing block cannot be reserved.
    pub fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        let word_count = capacity.div_ceil(ARENA_ALIGN);
        let mut words = Vec::new();
        words.try_reserve_exact(word_count)?;
        words.resize(word_count, 0);
        Ok(Self {
            words,
            capacity,
            used: 0,
        })
    }

    /// Rounds `offset` up to the next multiple of [`ARENA_ALIGN`].
    ///
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn align_up(offset: usize) -> Option<usize> {
        match offset.checked_add(ARENA_ALIGN - 1) {
            Some(padded) => Some(padded & !(ARENA_ALIGN - 1)),
            None => None,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current used space in bytes, including alignment padding.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    /// Returns a mark that [`Arena::rewind`] can roll back to.
    #[inline]
    #[must_use]
    pub const fn mark(&self) -> usize {
        self.used
    }

    /// Discards every allocation made after `mark` was taken.
    ///
    /// Marks past the current offset are ignored.
    #[inline]
    pub fn rewind(&mut self, mark: usize) {
        if mark < self.used {
            self.used = mark;
        }
    }

    /// Copies `bytes` to the next aligned offset and returns that offset.
    ///
    /// This is a **O(len)** copy with **zero heap allocations**.
    ///
    /// Returns `None` if the arena is out of space; nothing is written then.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Option<usize> {
        let offset = Self::align_up(self.used)?;
        let end = offset.checked_add(bytes.len())?;
        if end > self.capacity {
            return None;
        }

        let storage: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words[..]);
        storage[offset..end].copy_from_slice(bytes);
        self.used = end;

        Some(offset)
    }

    /// Copies a single `Pod` value into the arena.
    #[inline]
    pub fn alloc_pod<T: Pod>(&mut self, value: &T) -> Option<usize> {
        self.alloc_bytes(bytemuck::bytes_of(value))
    }

    /// Copies a slice of `Pod` values into the arena.
    #[inline]
    pub fn alloc_slice<T: Pod>(&mut self, values: &[T]) -> Option<usize> {
        self.alloc_bytes(bytemuck::cast_slice(values))
    }

    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the arena's storage.
    #[inline]
    #[must_use]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        let storage: &[u8] = bytemuck::cast_slice(&self.words[..]);
        &storage[offset..offset + len]
    }

    /// Resets the arena, invalidating all previous allocations.
    ///
    /// This is a **zero-cost** operation - no memory is freed or reallocated.
    #[inline]
    pub fn reset(&mut self) {
        self.used = 0;
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_allocation() {
        let mut arena = Arena::new(1024);
        let offset = arena.alloc_slice(&[1.5f32; 10]).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(arena.used(), 40);

        let copy: &[f32] = bytemuck::cast_slice(arena.bytes(offset, 40));
        assert_eq!(copy, &[1.5f32; 10]);
    }

    #[test]
    fn test_arena_alignment() {
        let mut arena = Arena::new(64);
        assert_eq!(arena.alloc_bytes(&[7u8; 3]), Some(0));
        // Second allocation starts on the next word boundary.
        assert_eq!(arena.alloc_pod(&42u64), Some(ARENA_ALIGN));
        assert_eq!(arena.used(), ARENA_ALIGN + 8);
    }

    #[test]
    fn test_arena_full() {
        let mut arena = Arena::new(16);
        assert!(arena.alloc_bytes(&[0u8; 12]).is_some());
        // 12 rounds up to 16, no room left for even one byte.
        assert!(arena.alloc_bytes(&[1u8]).is_none());
        assert_eq!(arena.used(), 12);
        // Empty allocations still fit at the end.
        assert_eq!(arena.alloc_bytes(&[]), Some(16));
    }

    #[test]
    fn test_arena_rewind() {
        let mut arena = Arena::new(64);
        let _ = arena.alloc_pod(&1u32).unwrap();
        let mark = arena.mark();
        let _ = arena.alloc_pod(&[0u8; 20]).unwrap();
        arena.rewind(mark);
        assert_eq!(arena.used(), 4);

        arena.rewind(1000);
        assert_eq!(arena.used(), 4);
    }

    #[test]
    fn test_arena_reset() {
        let mut arena = Arena::new(1024);
        let _ = arena.alloc_slice(&[0u16; 10]).unwrap();
        assert!(arena.used() > 0);

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.remaining(), 1024);
    }

    #[test]
    fn test_try_new_reports_capacity() {
        let arena = Arena::try_new(100).unwrap();
        assert_eq!(arena.capacity(), 100);
        assert_eq!(arena.remaining(), 100);

        assert!(Arena::try_new(usize::MAX).is_err());
    }

    #[test]
    fn test_align_up() {
        assert_eq!(Arena::align_up(0), Some(0));
        assert_eq!(Arena::align_up(1), Some(ARENA_ALIGN));
        assert_eq!(Arena::align_up(ARENA_ALIGN), Some(ARENA_ALIGN));
        assert_eq!(Arena::align_up(usize::MAX), None);
    }
}

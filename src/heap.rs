//! Sources of fresh memory for the allocator.

use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};
use log::debug;

use crate::{
  align,
  align::{ALIGNMENT, is_aligned},
};

/// Hands out brand-new, never-returned regions of memory.
///
/// # Safety
///
/// Implementors must return regions that are aligned to [`ALIGNMENT`],
/// valid for reads and writes of at least the requested number of bytes,
/// and not handed out again for as long as the grower lives.
pub unsafe trait HeapGrower {
  /// Extends the heap by `bytes` and returns the start of the new region, or
  /// `None` when no more memory can be obtained. The allocator never retries.
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>>;
}

/// Grows the process data segment with `sbrk(2)`.
///
/// ```text
///   High Address ┌─────────────────────┐
///                │       Stack         │ ↓ grows down
///                │                     │
///                │       Heap          │ ↑ grows up (sbrk)
///                ├─────────────────────┤ ← Program Break
///                │       Data          │
///   Low Address  └─────────────────────┘
/// ```
///
/// Memory obtained this way is never given back to the operating system.
#[derive(Debug, Default)]
pub struct SbrkHeap {
  padding: usize,
}

impl SbrkHeap {
  pub const fn new() -> Self {
    Self { padding: 0 }
  }

  /// Bytes spent realigning a break that someone else left misaligned.
  /// They are part of the data segment but were never handed out.
  pub fn padding_bytes(&self) -> usize {
    self.padding
  }

  /// Current program break, as reported by `sbrk(0)`.
  pub fn program_break() -> *mut u8 {
    unsafe { sbrk(0).cast::<u8>() }
  }
}

fn sbrk_failed(address: *mut c_void) -> bool {
  address == usize::MAX as *mut c_void
}

unsafe impl HeapGrower for SbrkHeap {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    let increment = intptr_t::try_from(bytes).ok()?;

    unsafe {
      let current = sbrk(0);
      if sbrk_failed(current) {
        return None;
      }

      // Someone else may have left the break misaligned.
      let padding = align!(current.addr()) - current.addr();
      if padding != 0 {
        debug!("sbrk: realigning program break {:?} by {} bytes", current, padding);
        if sbrk_failed(sbrk(padding as intptr_t)) {
          return None;
        }
        self.padding += padding;
      }

      let address = sbrk(increment);
      if sbrk_failed(address) {
        debug!("sbrk: refused to grow by {} bytes", bytes);
        return None;
      }

      // The break moved under us between the two calls.
      if !is_aligned(address.addr()) {
        debug!("sbrk: region {:?} came back misaligned", address);
        return None;
      }

      debug!("sbrk: grew {} bytes at {:?}", bytes, address);
      NonNull::new(address.cast::<u8>())
    }
  }
}

#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct Unit([u8; ALIGNMENT]);

/// Fixed-capacity heap carved bump-style out of one aligned buffer.
///
/// Useful for independent heaps that must not touch the program break.
/// Growing past the capacity fails like an exhausted `sbrk` would.
pub struct ArenaHeap {
  base: NonNull<Unit>,
  units: usize,
  used: usize,
}

// The arena owns its buffer exclusively.
unsafe impl Send for ArenaHeap {}

impl ArenaHeap {
  /// Creates an arena able to hand out `capacity` bytes, rounded up to the
  /// alignment.
  pub fn with_capacity(capacity: usize) -> Self {
    let units = capacity.div_ceil(ALIGNMENT);
    let buffer = vec![Unit([0; ALIGNMENT]); units].into_boxed_slice();
    let base = NonNull::new(Box::into_raw(buffer).cast::<Unit>()).unwrap_or(NonNull::dangling());

    Self { base, units, used: 0 }
  }

  pub fn capacity(&self) -> usize {
    self.units * ALIGNMENT
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.used
  }

  pub fn remaining(&self) -> usize {
    self.capacity() - self.used
  }

  /// Whether `address` falls inside the arena's buffer.
  pub fn contains(
    &self,
    address: *const u8,
  ) -> bool {
    let start = self.base.as_ptr().addr();
    (start..start + self.capacity()).contains(&address.addr())
  }
}

unsafe impl HeapGrower for ArenaHeap {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    let bytes = bytes.checked_next_multiple_of(ALIGNMENT)?;
    if bytes > self.remaining() {
      debug!("arena: {} bytes requested, {} remaining", bytes, self.remaining());
      return None;
    }

    let region = unsafe { self.base.cast::<u8>().add(self.used) };
    self.used += bytes;
    Some(region)
  }
}

impl Drop for ArenaHeap {
  fn drop(&mut self) {
    unsafe {
      drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
        self.base.as_ptr(),
        self.units,
      )));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn arena_hands_out_consecutive_aligned_regions() {
    let mut arena = ArenaHeap::with_capacity(256);

    let first = arena.grow(48).unwrap();
    let second = arena.grow(20).unwrap();

    assert!(is_aligned(first.as_ptr().addr()));
    assert!(is_aligned(second.as_ptr().addr()));
    assert_eq!(second.as_ptr().addr() - first.as_ptr().addr(), 48);
    assert_eq!(arena.used(), 48 + 32);
    assert!(arena.contains(second.as_ptr()));
  }

  #[test]
  fn arena_fails_when_exhausted() {
    let mut arena = ArenaHeap::with_capacity(64);

    assert!(arena.grow(64).is_some());
    assert!(arena.grow(16).is_none());
    assert_eq!(arena.remaining(), 0);
  }

  #[test]
  fn arena_rounds_capacity_up() {
    let arena = ArenaHeap::with_capacity(10);
    assert_eq!(arena.capacity(), ALIGNMENT);

    let empty = ArenaHeap::with_capacity(0);
    assert_eq!(empty.capacity(), 0);
  }

  #[test]
  fn arena_rejects_overflowing_request() {
    let mut arena = ArenaHeap::with_capacity(64);
    assert!(arena.grow(usize::MAX).is_none());
    assert_eq!(arena.used(), 0);
  }
}

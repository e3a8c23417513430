//! Process-wide heap on the program break.
//!
//! The allocator core assumes a single allocation stream, so every entry
//! point here goes through one lock guarding the free list and heap growth
//! together. Failures come back as null pointers, the way `malloc` reports
//! them.

use std::ptr::{self, NonNull};

use parking_lot::{Mutex, MutexGuard};

use crate::{
  allocator::{FreeListAllocator, abort_on_corruption},
  error::AllocError,
  heap::SbrkHeap,
  stats::HeapStats,
};

static HEAP: Mutex<FreeListAllocator<SbrkHeap>> = Mutex::new(FreeListAllocator::new(SbrkHeap::new()));

fn heap() -> MutexGuard<'static, FreeListAllocator<SbrkHeap>> {
  HEAP.lock()
}

fn into_raw(result: Result<NonNull<u8>, AllocError>) -> *mut u8 {
  result.map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Returns at least `size` bytes, or null if the heap cannot grow.
pub fn allocate(size: usize) -> *mut u8 {
  into_raw(heap().allocate(size))
}

/// Returns `count * size` zeroed bytes, or null on overflow or exhaustion.
pub fn zero_allocate(
  count: usize,
  size: usize,
) -> *mut u8 {
  into_raw(heap().zero_allocate(count, size))
}

/// Resizes the block at `ptr`. On null the original block stays valid.
/// Aborts like [`release`] if `ptr`'s header is corrupted.
///
/// # Safety
///
/// `ptr` must be null or a live pointer returned by this module.
pub unsafe fn resize(
  ptr: *mut u8,
  new_size: usize,
) -> *mut u8 {
  match unsafe { heap().resize(NonNull::new(ptr), new_size) } {
    Ok(moved) => moved.as_ptr(),
    Err(err) if err.is_fatal() => abort_on_corruption(&err),
    Err(_) => ptr::null_mut(),
  }
}

/// Gives the block at `ptr` back. Null is ignored. Aborts the process if
/// the block's header is corrupted or it was already released.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by this module.
pub unsafe fn release(ptr: *mut u8) {
  unsafe { heap().release(NonNull::new(ptr)) }
}

/// Payload bytes behind a live pointer, or 0 for null and foreign pointers.
///
/// # Safety
///
/// Same as [`release`].
pub unsafe fn usable_size(ptr: *mut u8) -> usize {
  NonNull::new(ptr).map_or(0, |ptr| unsafe { heap().usable_size(ptr) }.unwrap_or(0))
}

pub fn stats() -> HeapStats {
  heap().stats()
}

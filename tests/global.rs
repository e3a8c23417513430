//! Exercises the process-wide heap on the real program break.
//!
//! Kept to a single test so nothing else in this binary moves the break
//! while it runs.

use std::{ptr, slice};

use rfreelist::{
  ALIGNMENT, SbrkHeap,
  ffi::{rfl_calloc, rfl_free, rfl_malloc, rfl_realloc},
  global,
};

fn is_aligned(ptr: *const u8) -> bool {
  ptr.addr() % ALIGNMENT == 0
}

#[test]
fn process_heap_round_trip() {
  let break_before = SbrkHeap::program_break();

  let ptr = global::allocate(100);
  assert!(!ptr.is_null());
  assert!(is_aligned(ptr));
  assert!(ptr.addr() >= break_before.addr());
  assert!(SbrkHeap::program_break().addr() > ptr.addr());

  unsafe {
    for i in 0..100 {
      ptr.add(i).write(i as u8);
    }

    let moved = global::resize(ptr, 400);
    assert!(!moved.is_null());
    assert!(is_aligned(moved));
    for i in 0..100 {
      assert_eq!(moved.add(i).read(), i as u8);
    }
    assert!(global::usable_size(moved) >= 400);

    global::release(moved);
    global::release(ptr::null_mut());
  }

  let growth = global::stats().growth_calls;
  let reused = global::allocate(64);
  assert_eq!(global::stats().growth_calls, growth);

  let zeroed = global::zero_allocate(10, 10);
  assert!(!zeroed.is_null());
  assert!(unsafe { slice::from_raw_parts(zeroed, 100) }.iter().all(|&b| b == 0));
  assert!(global::zero_allocate(usize::MAX, 2).is_null());
  assert_eq!(unsafe { global::usable_size(ptr::null_mut()) }, 0);

  unsafe {
    global::release(reused);
    global::release(zeroed);
  }

  // Same heap through the C entry points.
  unsafe {
    let c = rfl_malloc(24);
    assert!(!c.is_null());
    assert_eq!(rfl_realloc(c, 8), c);

    let zeros = rfl_calloc(3, 8).cast::<u8>();
    assert!(slice::from_raw_parts(zeros, 24).iter().all(|&b| b == 0));

    rfl_free(c);
    rfl_free(zeros.cast());
    rfl_free(ptr::null_mut());

    let fresh = rfl_realloc(ptr::null_mut(), 32);
    assert!(!fresh.is_null());
    rfl_free(fresh);
  }

  assert_eq!(global::stats().live_allocations, 0);
}

//! C entry points over the process-wide heap in [`global`](crate::global).
//!
//! ```c
//! void *rfl_malloc(size_t size);
//! void *rfl_calloc(size_t count, size_t size);
//! void *rfl_realloc(void *ptr, size_t new_size);
//! void  rfl_free(void *ptr);
//! ```

use libc::{c_void, size_t};

use crate::global;

#[unsafe(no_mangle)]
pub extern "C" fn rfl_malloc(size: size_t) -> *mut c_void {
  global::allocate(size).cast()
}

#[unsafe(no_mangle)]
pub extern "C" fn rfl_calloc(
  count: size_t,
  size: size_t,
) -> *mut c_void {
  global::zero_allocate(count, size).cast()
}

/// # Safety
///
/// `ptr` must be null or a live pointer returned by one of these functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rfl_realloc(
  ptr: *mut c_void,
  new_size: size_t,
) -> *mut c_void {
  unsafe { global::resize(ptr.cast(), new_size).cast() }
}

/// # Safety
///
/// `ptr` must be null or a pointer returned by one of these functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rfl_free(ptr: *mut c_void) {
  unsafe { global::release(ptr.cast()) }
}

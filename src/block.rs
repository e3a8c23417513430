use std::{mem, ptr::{self, NonNull}};

use crate::align::ALIGNMENT;

/// Metadata prefixed to every block, free or allocated.
///
/// ```text
///   ┌──────────────────────────────┬─────────────────────────────┐
///   │ BlockHeader (HEADER_SIZE)    │ payload (size bytes)        │
///   │  size                        │                             │
///   │  next: free-list link        │                             │
///   │        or sentinel           │                             │
///   └──────────────────────────────┴─────────────────────────────┘
///   ▲                              ▲
///   header address                 payload address
/// ```
///
/// While the block is free, `next` links it into the free list. While it is
/// allocated, the same slot holds the corruption sentinel instead.
#[repr(C, align(16))]
pub(crate) struct BlockHeader {
  pub size: usize,
  pub next: *mut BlockHeader,
}

/// Bytes taken by a header in front of each payload.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

const _: () = assert!(HEADER_SIZE % ALIGNMENT == 0);

impl BlockHeader {
  /// Writes a fresh header at `at` describing a payload of `size` bytes.
  ///
  /// # Safety
  ///
  /// `at` must be aligned and valid for writes of `HEADER_SIZE + size` bytes.
  pub unsafe fn init(
    at: NonNull<u8>,
    size: usize,
  ) -> *mut BlockHeader {
    let block = at.as_ptr().cast::<BlockHeader>();
    unsafe {
      block.write(BlockHeader {
        size,
        next: ptr::null_mut(),
      });
    }
    block
  }

  /// Recovers the header from a payload pointer handed out earlier.
  ///
  /// This and [`BlockHeader::payload`] are the only places that convert
  /// between what callers hold and the internal record.
  #[inline]
  pub fn from_payload(payload: NonNull<u8>) -> *mut BlockHeader {
    payload.as_ptr().wrapping_sub(HEADER_SIZE).cast::<BlockHeader>()
  }

  /// Payload address of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point at a live header.
  #[inline]
  pub unsafe fn payload(block: *mut BlockHeader) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(block.cast::<u8>().add(HEADER_SIZE)) }
  }

  /// One-past-the-end address of the block's payload, which is where a
  /// physically following block would start.
  ///
  /// # Safety
  ///
  /// `block` must point at a live header.
  #[inline]
  pub unsafe fn end(block: *mut BlockHeader) -> usize {
    unsafe { block.addr() + HEADER_SIZE + (*block).size }
  }

  /// Marks `block` as handed out to a caller.
  ///
  /// # Safety
  ///
  /// `block` must point at a live header that is not on the free list.
  #[inline]
  pub unsafe fn stamp(
    block: *mut BlockHeader,
    sentinel: usize,
  ) {
    unsafe {
      (*block).next = ptr::without_provenance_mut(sentinel);
    }
  }

  /// Raw value of the link slot, compared against the sentinel on release.
  ///
  /// # Safety
  ///
  /// `block` must be readable for `HEADER_SIZE` bytes.
  #[inline]
  pub unsafe fn mark(block: *mut BlockHeader) -> usize {
    unsafe { (*block).next.addr() }
  }

  /// Carves `block` into a `size`-byte block and a residual free block
  /// placed right after it.
  ///
  /// The residual inherits the remaining bytes and `block`'s old `next` link.
  /// Returns `None` and leaves `block` untouched when the leftover could not
  /// hold a header plus a non-empty payload.
  ///
  /// # Safety
  ///
  /// `block` must point at a live header, and `size` must be a multiple of
  /// [`ALIGNMENT`].
  pub unsafe fn split(
    block: *mut BlockHeader,
    size: usize,
  ) -> Option<*mut BlockHeader> {
    unsafe {
      let leftover = (*block).size.checked_sub(size)?;
      if leftover <= HEADER_SIZE {
        return None;
      }

      let residual = block.cast::<u8>().add(HEADER_SIZE + size).cast::<BlockHeader>();
      residual.write(BlockHeader {
        size: leftover - HEADER_SIZE,
        next: (*block).next,
      });
      (*block).size = size;

      Some(residual)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[repr(C, align(16))]
  struct Buffer([u8; 256]);

  #[test]
  fn header_round_trips_through_payload() {
    let mut buffer = Buffer([0; 256]);
    let at = NonNull::new(buffer.0.as_mut_ptr()).unwrap();

    unsafe {
      let block = BlockHeader::init(at, 64);
      let payload = BlockHeader::payload(block);

      assert_eq!(payload.as_ptr().addr() - at.as_ptr().addr(), HEADER_SIZE);
      assert_eq!(BlockHeader::from_payload(payload), block);
      assert_eq!(BlockHeader::end(block), at.as_ptr().addr() + HEADER_SIZE + 64);
    }
  }

  #[test]
  fn split_writes_residual_after_requested_size() {
    let mut buffer = Buffer([0; 256]);
    let at = NonNull::new(buffer.0.as_mut_ptr()).unwrap();

    unsafe {
      let block = BlockHeader::init(at, 256 - HEADER_SIZE);
      let residual = BlockHeader::split(block, 64).unwrap();

      assert_eq!((*block).size, 64);
      assert_eq!(residual.addr(), BlockHeader::end(block));
      assert_eq!((*residual).size, 256 - 64 - 2 * HEADER_SIZE);
      assert_eq!(BlockHeader::end(residual), at.as_ptr().addr() + 256);
      assert!((*residual).next.is_null());
    }
  }

  #[test]
  fn split_refuses_when_residual_would_be_empty() {
    let mut buffer = Buffer([0; 256]);
    let at = NonNull::new(buffer.0.as_mut_ptr()).unwrap();

    unsafe {
      let block = BlockHeader::init(at, 64 + HEADER_SIZE);

      assert!(BlockHeader::split(block, 64).is_none());
      assert!(BlockHeader::split(block, 128).is_none());
      assert_eq!((*block).size, 64 + HEADER_SIZE);
    }
  }

  #[test]
  fn stamp_overwrites_link_slot() {
    let mut buffer = Buffer([0; 256]);
    let at = NonNull::new(buffer.0.as_mut_ptr()).unwrap();

    unsafe {
      let block = BlockHeader::init(at, 32);
      assert_eq!(BlockHeader::mark(block), 0);

      BlockHeader::stamp(block, 0x0123_4567);
      assert_eq!(BlockHeader::mark(block), 0x0123_4567);
      assert_eq!((*block).size, 32);
    }
  }
}

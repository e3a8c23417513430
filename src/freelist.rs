use std::ptr;

use log::{debug, trace};

use crate::block::{BlockHeader, HEADER_SIZE};

/// Singly linked list of free blocks, threaded through their headers.
///
/// ```text
///   head ─▶ ┌────────┐     ┌────────┐     ┌────────┐
///           │ size   │  ┌─▶│ size   │  ┌─▶│ size   │
///           │ next ──┼──┘  │ next ──┼──┘  │ next ─┼─▶ null
///           └────────┘     └────────┘     └────────┘
/// ```
///
/// Entries are kept in insertion order: the most recently released block
/// is the head. Physical adjacency is discovered by scanning, never
/// tracked.
pub(crate) struct FreeList {
  head: *mut BlockHeader,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: ptr::null_mut() }
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_null()
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: self,
    }
  }

  /// Makes `block` the new head.
  ///
  /// # Safety
  ///
  /// `block` must be a live header not already on the list.
  pub unsafe fn push(
    &mut self,
    block: *mut BlockHeader,
  ) {
    unsafe {
      (*block).next = self.head;
    }
    self.head = block;
  }

  /// Removes `block` from the list. Returns `false` if it was not there.
  ///
  /// # Safety
  ///
  /// Every entry on the list must be a live header.
  pub unsafe fn unlink(
    &mut self,
    block: *mut BlockHeader,
  ) -> bool {
    unsafe {
      let mut link: *mut *mut BlockHeader = &raw mut self.head;

      while !(*link).is_null() {
        if *link == block {
          *link = (*block).next;
          return true;
        }
        link = &raw mut (**link).next;
      }

      false
    }
  }

  /// Takes the first block able to hold `size` bytes off the list.
  ///
  /// An oversized block is split first: the residual takes the block's
  /// place in the list and only the `size`-byte front part is removed.
  /// The scan stops at the first fit.
  ///
  /// # Safety
  ///
  /// Every entry on the list must be a live header, and `size` must be a
  /// multiple of the alignment.
  pub unsafe fn take_first_fit(
    &mut self,
    size: usize,
  ) -> Option<*mut BlockHeader> {
    unsafe {
      let mut link: *mut *mut BlockHeader = &raw mut self.head;

      while !(*link).is_null() {
        let current = *link;

        if (*current).size >= size {
          match BlockHeader::split(current, size) {
            Some(residual) => {
              trace!(
                "first fit {:?}: split off {} bytes, residual {:?} keeps {}",
                current,
                size,
                residual,
                (*residual).size
              );
              *link = residual;
            }
            None => {
              trace!("first fit {:?}: taking all {} bytes", current, (*current).size);
              *link = (*current).next;
            }
          }
          return Some(current);
        }

        link = &raw mut (*current).next;
      }

      None
    }
  }

  /// The free block that ends exactly where `block` starts.
  ///
  /// # Safety
  ///
  /// Every entry on the list must be a live header.
  pub unsafe fn find_prev(
    &self,
    block: *mut BlockHeader,
  ) -> *mut BlockHeader {
    self
      .iter()
      .find(|&candidate| unsafe { BlockHeader::end(candidate) == block.addr() })
      .unwrap_or(ptr::null_mut())
  }

  /// The free block that starts exactly where `block` ends.
  ///
  /// # Safety
  ///
  /// `block` and every entry on the list must be live headers.
  pub unsafe fn find_next(
    &self,
    block: *mut BlockHeader,
  ) -> *mut BlockHeader {
    let end = unsafe { BlockHeader::end(block) };
    self
      .iter()
      .find(|&candidate| candidate.addr() == end)
      .unwrap_or(ptr::null_mut())
  }

  /// Merges `block`, which must already be on the list, with the free
  /// blocks physically before and after it. Returns the merged block.
  ///
  /// Afterwards no two entries on the list are physically adjacent, given
  /// that none were before `block` was added.
  ///
  /// # Safety
  ///
  /// `block` and every entry on the list must be live headers.
  pub unsafe fn coalesce(
    &mut self,
    block: *mut BlockHeader,
  ) -> *mut BlockHeader {
    unsafe {
      let prev = self.find_prev(block);
      let next = self.find_next(block);
      let mut merged = block;

      if !prev.is_null() {
        self.unlink(block);
        (*prev).size += (*block).size + HEADER_SIZE;
        debug!("coalesce: {:?} absorbed into previous {:?}", block, prev);
        merged = prev;
      }

      if !next.is_null() {
        self.unlink(next);
        (*merged).size += (*next).size + HEADER_SIZE;
        debug!("coalesce: {:?} absorbed following {:?}", merged, next);
      }

      merged
    }
  }
}

/// Walks the list from the head.
pub(crate) struct Iter<'a> {
  current: *mut BlockHeader,
  _list: &'a FreeList,
}

impl Iterator for Iter<'_> {
  type Item = *mut BlockHeader;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    // Entries only get on the list through `push`, whose caller vouches
    // that they are live.
    self.current = unsafe { (*block).next };
    Some(block)
  }
}

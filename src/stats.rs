//! Diagnostic snapshot of a heap. Never used for allocation decisions.

/// Point-in-time view of a [`FreeListAllocator`](crate::FreeListAllocator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  /// Entries on the free list.
  pub free_blocks: usize,
  /// Payload bytes across all free blocks, headers excluded.
  pub free_bytes: usize,
  /// Payload bytes of the largest free block.
  pub largest_free: usize,
  /// Bytes requested from the heap grower so far. Padding a grower spends
  /// on alignment is not included; see [`SbrkHeap::padding_bytes`](crate::SbrkHeap::padding_bytes).
  pub heap_bytes: usize,
  /// Successful calls into the heap grower.
  pub growth_calls: usize,
  /// Blocks currently handed out to callers.
  pub live_allocations: usize,
}

impl HeapStats {
  /// Share of free memory outside the largest free block, from 0.0 (a
  /// single free block, or none) towards 1.0 (many small pieces).
  pub fn fragmentation(&self) -> f64 {
    if self.free_bytes == 0 {
      return 0.0;
    }
    1.0 - self.largest_free as f64 / self.free_bytes as f64
  }
}

use std::ptr::{self, NonNull};

use log::{error, trace};

use crate::{
  align,
  align::{ALIGNMENT, is_aligned},
  block::{BlockHeader, HEADER_SIZE},
  config::AllocatorConfig,
  error::AllocError,
  freelist::FreeList,
  heap::HeapGrower,
  stats::HeapStats,
};

/// Largest payload a single request may ask for.
const MAX_REQUEST: usize = isize::MAX as usize - HEADER_SIZE - ALIGNMENT;

/// Rounds a request up to whole alignment units, at least one.
fn normalize(size: usize) -> Result<usize, AllocError> {
  if size > MAX_REQUEST {
    return Err(AllocError::SizeOverflow { count: 1, size });
  }
  Ok(align!(size.max(1)))
}

/// Reports a corrupted header and takes the process down.
#[cold]
pub(crate) fn abort_on_corruption(err: &AllocError) -> ! {
  error!("{err}");
  eprintln!("MEMORY CORRUPTION DETECTED: {err}");
  std::process::abort()
}

/// First-fit free-list allocator over memory obtained from a
/// [`HeapGrower`].
///
/// All state lives in the instance, so several independent heaps can
/// coexist. Operations take `&mut self`: one instance serves one allocation
/// stream at a time.
pub struct FreeListAllocator<G: HeapGrower> {
  grower: G,
  free: FreeList,
  config: AllocatorConfig,
  heap_bytes: usize,
  growth_calls: usize,
  live: usize,
}

// Blocks belong to the instance alone; nothing else holds the free list.
unsafe impl<G: HeapGrower + Send> Send for FreeListAllocator<G> {}

impl<G: HeapGrower> FreeListAllocator<G> {
  pub const fn new(grower: G) -> Self {
    Self {
      grower,
      free: FreeList::new(),
      config: AllocatorConfig::DEFAULT,
      heap_bytes: 0,
      growth_calls: 0,
      live: 0,
    }
  }

  pub fn with_config(
    grower: G,
    config: AllocatorConfig,
  ) -> Result<Self, AllocError> {
    config.validate()?;

    Ok(Self {
      config,
      ..Self::new(grower)
    })
  }

  pub fn config(&self) -> &AllocatorConfig {
    &self.config
  }

  pub fn grower(&self) -> &G {
    &self.grower
  }

  /// Returns a block of at least `size` bytes, aligned to [`ALIGNMENT`].
  ///
  /// The free list is searched first-fit; an oversized block is split and
  /// only the front part handed out. The heap grows when nothing fits.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let size = normalize(size)?;

    let reused = if self.free.is_empty() {
      None
    } else {
      unsafe { self.free.take_first_fit(size) }
    };

    let block = match reused {
      Some(block) => block,
      None => self.grow(size)?,
    };

    unsafe {
      BlockHeader::stamp(block, self.config.sentinel);
    }
    self.live += 1;

    let payload = unsafe { BlockHeader::payload(block) };
    trace!("allocate({}) -> {:?}", size, payload);
    Ok(payload)
  }

  /// Allocates room for `count` elements of `size` bytes, all zeroed.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count
      .checked_mul(size)
      .ok_or(AllocError::SizeOverflow { count, size })?;
    let payload = self.allocate(total)?;

    unsafe {
      let usable = (*BlockHeader::from_payload(payload)).size;
      ptr::write_bytes(payload.as_ptr(), 0, usable);
    }

    Ok(payload)
  }

  /// Changes the size of the block at `ptr`, keeping its contents up to
  /// the smaller of the two sizes.
  ///
  /// Shrinking happens in place and frees the tail. Growing moves the data
  /// to a new block and releases the old one. If that allocation fails, the
  /// error is returned and `ptr` stays valid and untouched. `None` behaves
  /// like [`allocate`](Self::allocate).
  ///
  /// # Safety
  ///
  /// `ptr` must be `None` or a pointer returned by this allocator that has
  /// not been released.
  pub unsafe fn resize(
    &mut self,
    ptr: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(payload) = ptr else {
      return self.allocate(new_size);
    };

    unsafe {
      let block = self.live_header(payload)?;
      let new_size = normalize(new_size)?;
      let old_size = (*block).size;

      if new_size == old_size {
        return Ok(payload);
      }

      if new_size < old_size {
        if let Some(residual) = BlockHeader::split(block, new_size) {
          trace!("resize({:?}): shrunk {} -> {}", payload, old_size, new_size);
          self.free.push(residual);
          self.free.coalesce(residual);
        }
        return Ok(payload);
      }

      let moved = self.allocate(new_size)?;
      trace!("resize({:?}): moving {} bytes to {:?}", payload, old_size, moved);
      ptr::copy_nonoverlapping(payload.as_ptr(), moved.as_ptr(), old_size);
      self.reclaim(block);

      Ok(moved)
    }
  }

  /// Returns the block at `ptr` to the free list, or aborts the process if
  /// its header does not carry the sentinel. `None` is a no-op.
  ///
  /// # Safety
  ///
  /// `ptr` must be `None` or point into memory readable for the
  /// `HEADER_SIZE` bytes in front of it.
  pub unsafe fn release(
    &mut self,
    ptr: Option<NonNull<u8>>,
  ) {
    if let Err(err) = unsafe { self.try_release(ptr) } {
      abort_on_corruption(&err);
    }
  }

  /// Like [`release`](Self::release), but hands a corrupted header back as
  /// [`AllocError::Corruption`] instead of aborting. Heap state must not be
  /// trusted after such an error.
  ///
  /// # Safety
  ///
  /// Same as [`release`](Self::release).
  pub unsafe fn try_release(
    &mut self,
    ptr: Option<NonNull<u8>>,
  ) -> Result<(), AllocError> {
    let Some(payload) = ptr else {
      return Ok(());
    };

    unsafe {
      let block = self.live_header(payload)?;
      trace!("release({:?}) of {} bytes", payload, (*block).size);
      self.reclaim(block);
    }

    Ok(())
  }

  /// Payload bytes actually available behind `ptr`.
  ///
  /// # Safety
  ///
  /// Same as [`release`](Self::release).
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<usize, AllocError> {
    unsafe {
      let block = self.live_header(ptr)?;
      Ok((*block).size)
    }
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats {
      heap_bytes: self.heap_bytes,
      growth_calls: self.growth_calls,
      live_allocations: self.live,
      ..HeapStats::default()
    };

    for block in self.free.iter() {
      let size = unsafe { (*block).size };
      stats.free_blocks += 1;
      stats.free_bytes += size;
      stats.largest_free = stats.largest_free.max(size);
    }

    stats
  }

  /// Asks the grower for a new block of `size` payload bytes. Surplus from
  /// `min_growth` becomes a free block.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<*mut BlockHeader, AllocError> {
    let request = (size + HEADER_SIZE).max(align!(self.config.min_growth));

    let Some(region) = self.grower.grow(request) else {
      return Err(AllocError::OutOfMemory { requested: size });
    };
    self.heap_bytes += request;
    self.growth_calls += 1;

    unsafe {
      let block = BlockHeader::init(region, request - HEADER_SIZE);
      if let Some(surplus) = BlockHeader::split(block, size) {
        self.free.push(surplus);
        self.free.coalesce(surplus);
      }
      Ok(block)
    }
  }

  /// Header of a block currently handed out, checked against the sentinel.
  unsafe fn live_header(
    &self,
    payload: NonNull<u8>,
  ) -> Result<*mut BlockHeader, AllocError> {
    let address = payload.as_ptr().addr();
    let block = BlockHeader::from_payload(payload);

    let found = if is_aligned(address) && address >= HEADER_SIZE {
      unsafe { BlockHeader::mark(block) }
    } else {
      0
    };

    if found != self.config.sentinel {
      return Err(AllocError::Corruption {
        payload: address,
        header: block.addr(),
        found,
      });
    }

    Ok(block)
  }

  /// Puts a checked block back on the free list and merges it with its
  /// free neighbors.
  unsafe fn reclaim(
    &mut self,
    block: *mut BlockHeader,
  ) {
    unsafe {
      self.free.push(block);
      self.free.coalesce(block);
    }
    self.live = self.live.saturating_sub(1);
  }
}

impl<G: HeapGrower + Default> Default for FreeListAllocator<G> {
  fn default() -> Self {
    Self::new(G::default())
  }
}

use crate::{align::ALIGNMENT, error::AllocError};

/// Marker stamped into the header of every block handed out to a caller.
///
/// It is odd, so it can never be mistaken for a null or aligned free-list link.
pub const DEFAULT_SENTINEL: usize = 0x0123_4567;

/// Tuning knobs for a [`FreeListAllocator`](crate::FreeListAllocator).
/// All fields have sensible defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
  /// Value stamped into allocated headers and checked on release.
  /// Must not be a multiple of the alignment. Default: [`DEFAULT_SENTINEL`].
  pub sentinel: usize,

  /// Smallest number of bytes requested from the heap grower at once.
  /// Anything beyond what the triggering request needs goes onto the free
  /// list. Default: 0 (grow exactly as much as the request needs).
  pub min_growth: usize,
}

impl AllocatorConfig {
  pub const DEFAULT: Self = Self {
    sentinel: DEFAULT_SENTINEL,
    min_growth: 0,
  };

  pub const fn with_sentinel(
    mut self,
    sentinel: usize,
  ) -> Self {
    self.sentinel = sentinel;
    self
  }

  pub const fn with_min_growth(
    mut self,
    min_growth: usize,
  ) -> Self {
    self.min_growth = min_growth;
    self
  }

  pub fn validate(&self) -> Result<(), AllocError> {
    if self.sentinel % ALIGNMENT == 0 {
      return Err(AllocError::InvalidConfig(
        "sentinel must not be a multiple of the alignment",
      ));
    }
    if self.min_growth > isize::MAX as usize / 2 {
      return Err(AllocError::InvalidConfig("min_growth is too large"));
    }
    Ok(())
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

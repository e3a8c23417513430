/// Boundary every header and payload handed out by the allocator sits on.
pub const ALIGNMENT: usize = 16;

/// Rounds `value` up to the next multiple of [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use rfreelist::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(17), 32);
/// ```
///
/// The caller must make sure `value + ALIGNMENT - 1` does not overflow.
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Returns `true` when `address` sits on an [`ALIGNMENT`] boundary.
#[inline]
pub const fn is_aligned(address: usize) -> bool {
  address & (ALIGNMENT - 1) == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (ALIGNMENT * i + 1)..=(ALIGNMENT * (i + 1));

      let expected_alignment = ALIGNMENT * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn zero_stays_zero() {
    assert_eq!(align!(0usize), 0);
  }

  #[test]
  fn test_is_aligned() {
    assert!(is_aligned(0));
    assert!(is_aligned(ALIGNMENT * 3));
    assert!(!is_aligned(ALIGNMENT + 8));
    assert!(!is_aligned(1));
  }
}

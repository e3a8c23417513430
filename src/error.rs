use thiserror::Error;

/// Failures reported by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The heap could not be grown to fit the request.
  #[error("out of memory: cannot satisfy a request for {requested} bytes")]
  OutOfMemory { requested: usize },

  /// `count * size` does not fit in `usize`, or a single request is too
  /// large to round up and put behind a header (`count` is 1).
  #[error("allocation size overflow: {count} elements of {size} bytes")]
  SizeOverflow { count: usize, size: usize },

  /// The header in front of `payload` does not carry the sentinel. The
  /// pointer was never handed out, was already released, or its header has
  /// been overwritten.
  #[error(
    "memory corruption at block {header:#x} (pointer {payload:#x}): expected sentinel, found {found:#x}"
  )]
  Corruption {
    payload: usize,
    header: usize,
    found: usize,
  },

  #[error("invalid allocator configuration: {0}")]
  InvalidConfig(&'static str),
}

impl AllocError {
  /// Whether this error means heap state can no longer be trusted.
  pub fn is_fatal(&self) -> bool {
    matches!(self, AllocError::Corruption { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn corruption_message_carries_addresses() {
    let err = AllocError::Corruption {
      payload: 0x1010,
      header: 0x1000,
      found: 0xdead,
    };

    let message = err.to_string();
    assert!(message.contains("0x1000"));
    assert!(message.contains("0x1010"));
    assert!(message.contains("0xdead"));
    assert!(err.is_fatal());
  }

  #[test]
  fn exhaustion_is_recoverable() {
    assert!(!AllocError::OutOfMemory { requested: 8 }.is_fatal());
    assert!(!AllocError::SizeOverflow { count: 2, size: usize::MAX }.is_fatal());
  }
}

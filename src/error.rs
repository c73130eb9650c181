/// Everything that can go wrong while creating an arena or moving chunks in
/// and out of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
  /// A size argument was zero.
  #[error("invalid size {size}: sizes must be positive")]
  InvalidSize { size: usize },

  /// The requested arena cannot even hold its own header.
  #[error("arena of {size} bytes is smaller than its {minimum}-byte header")]
  TooSmall { size: usize, minimum: usize },

  /// The environment refused to hand out the backing bytes.
  #[error("failed to reserve {size} bytes for a new arena")]
  AllocationFailure { size: usize },

  /// No gap in the arena is large enough for the request.
  #[error("no gap can fit a {size}-byte chunk")]
  NoFit { size: usize },

  /// The handle was allocated from a different arena.
  #[error("chunk does not belong to this arena")]
  ForeignChunk,
}

pub type Result<T> = std::result::Result<T, ArenaError>;

use std::{fmt, marker::PhantomData, mem, ptr, ptr::NonNull};

use crate::arena::Arena;

/// Bookkeeping stored at the very start of every arena.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct ArenaHeader {
  pub first: *mut ChunkHeader,
  pub upper_limit: *mut u8,
}

/// Bookkeeping stored immediately before every payload.
///
/// Payload sizes are never rounded, so a header may start at any byte offset.
/// Always go through [`ChunkHeader::load`] and [`ChunkHeader::store`].
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct ChunkHeader {
  pub payload_size: usize,
  pub prev: *mut ChunkHeader,
  pub next: *mut ChunkHeader,
  pub owner: *mut ArenaHeader,
}

/// Bytes taken by the arena's own header at the start of its range.
pub const ARENA_HEADER_SIZE: usize = mem::size_of::<ArenaHeader>();

/// Bytes taken by the header in front of every payload.
pub const CHUNK_HEADER_SIZE: usize = mem::size_of::<ChunkHeader>();

impl ChunkHeader {
  pub fn new(
    payload_size: usize,
    prev: *mut ChunkHeader,
    next: *mut ChunkHeader,
    owner: *mut ArenaHeader,
  ) -> Self {
    Self {
      payload_size,
      prev,
      next,
      owner,
    }
  }

  pub unsafe fn load(at: *const ChunkHeader) -> Self {
    unsafe { ptr::read_unaligned(at) }
  }

  pub unsafe fn store(
    self,
    at: *mut ChunkHeader,
  ) {
    unsafe { ptr::write_unaligned(at, self) }
  }

  pub unsafe fn set_prev(
    at: *mut ChunkHeader,
    prev: *mut ChunkHeader,
  ) {
    unsafe {
      let mut header = Self::load(at);
      header.prev = prev;
      header.store(at);
    }
  }

  pub unsafe fn set_next(
    at: *mut ChunkHeader,
    next: *mut ChunkHeader,
  ) {
    unsafe {
      let mut header = Self::load(at);
      header.next = next;
      header.store(at);
    }
  }

  /// First byte past the payload of the header stored at `at`.
  pub unsafe fn end(
    &self,
    at: *mut ChunkHeader,
  ) -> *mut u8 {
    unsafe { (at as *mut u8).add(CHUNK_HEADER_SIZE + self.payload_size) }
  }
}

/// Unused bytes between `lower_end` and `upper`.
pub(crate) fn gap(
  lower_end: usize,
  upper: usize,
) -> usize {
  upper.saturating_sub(lower_end)
}

/// Whether a gap can host a header plus `size` payload bytes. A gap of exactly
/// that many bytes does not count.
pub(crate) fn fits(
  gap: usize,
  size: usize,
) -> bool {
  size
    .checked_add(CHUNK_HEADER_SIZE)
    .is_some_and(|needed| gap > needed)
}

/// Snapshot of one live chunk, with addresses given as offsets from the start
/// of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
  pub offset: usize,
  pub payload_size: usize,
  pub prev: Option<usize>,
  pub next: Option<usize>,
}

impl ChunkInfo {
  /// Offset of the payload that follows the header.
  pub fn payload_offset(&self) -> usize {
    self.offset + CHUNK_HEADER_SIZE
  }

  /// Offset of the first byte past the payload.
  pub fn end(&self) -> usize {
    self.payload_offset() + self.payload_size
  }
}

/// Handle to a live payload inside an [`Arena`].
///
/// A chunk stays allocated until it is handed back to
/// [`Arena::release`]. Dropping the handle without releasing it leaks the
/// chunk until the arena itself is destroyed.
pub struct Chunk<'a> {
  header: NonNull<ChunkHeader>,
  size: usize,
  _arena: PhantomData<&'a Arena>,
}

impl Chunk<'_> {
  pub(crate) fn new(
    header: NonNull<ChunkHeader>,
    size: usize,
  ) -> Self {
    Self {
      header,
      size,
      _arena: PhantomData,
    }
  }

  pub(crate) fn header(&self) -> *mut ChunkHeader {
    self.header.as_ptr()
  }

  /// Payload length in bytes.
  pub fn len(&self) -> usize {
    self.size
  }

  /// Pairs with [`Chunk::len`]; always `false` since zero-sized requests are
  /// rejected by [`Arena::allocate`].
  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  /// Offset of this chunk's header from the start of its arena.
  pub fn offset(&self) -> usize {
    let owner = unsafe { ChunkHeader::load(self.header()) }.owner;
    self.header() as usize - owner as usize
  }

  /// Raw pointer to the first payload byte.
  ///
  /// The pointer is valid for `len()` bytes until the chunk is released and
  /// carries no alignment guarantee.
  pub fn as_ptr(&self) -> *mut u8 {
    unsafe { (self.header() as *mut u8).add(CHUNK_HEADER_SIZE) }
  }

  /// Copies `bytes` into the payload starting at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the write would run past the end of the payload.
  pub fn write(
    &mut self,
    offset: usize,
    bytes: &[u8],
  ) {
    self.check_range(offset, bytes.len());
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.as_ptr().add(offset), bytes.len()) }
  }

  /// Sets every payload byte to `byte`.
  pub fn fill(
    &mut self,
    byte: u8,
  ) {
    unsafe { ptr::write_bytes(self.as_ptr(), byte, self.size) }
  }

  /// Copies payload bytes starting at `offset` into `buf`.
  ///
  /// # Panics
  ///
  /// Panics if the read would run past the end of the payload.
  pub fn read(
    &self,
    offset: usize,
    buf: &mut [u8],
  ) {
    self.check_range(offset, buf.len());
    unsafe { ptr::copy_nonoverlapping(self.as_ptr().add(offset), buf.as_mut_ptr(), buf.len()) }
  }

  pub fn to_vec(&self) -> Vec<u8> {
    let mut bytes = vec![0; self.size];
    self.read(0, &mut bytes);
    bytes
  }

  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) {
    assert!(
      offset.checked_add(len).is_some_and(|end| end <= self.size),
      "range {offset}..{offset}+{len} out of bounds for a {}-byte chunk",
      self.size
    );
  }
}

impl fmt::Debug for Chunk<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Chunk")
      .field("offset", &self.offset())
      .field("len", &self.size)
      .finish()
  }
}

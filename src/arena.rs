use std::{marker::PhantomData, ptr, ptr::NonNull};

use crate::{
  chunk::{ARENA_HEADER_SIZE, ArenaHeader, Chunk, ChunkHeader, ChunkInfo, fits, gap},
  dump::Report,
  error::{ArenaError, Result},
};

/// Byte written over the unused part of a fresh arena so that untouched memory
/// stands out in a dump.
pub const DEFAULT_FILLER: u8 = b'$';

/// Knobs for [`Arena::with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaOptions {
  filler: u8,
}

impl ArenaOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Byte used to initialize everything past the arena header.
  pub fn filler(
    mut self,
    byte: u8,
  ) -> Self {
    self.filler = byte;
    self
  }
}

impl Default for ArenaOptions {
  fn default() -> Self {
    Self {
      filler: DEFAULT_FILLER,
    }
  }
}

/// Which gap a new chunk is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
  Sole,
  Head,
  Between,
  Tail,
}

/// Where the gap search decided to put a new chunk.
struct Placement {
  at: *mut ChunkHeader,
  prev: *mut ChunkHeader,
  next: *mut ChunkHeader,
  position: Position,
}

/// A fixed-size region that hands out variable-sized chunks first-fit.
///
/// The region is reserved once in [`Arena::create`] and never grows. Live
/// chunks form an address-ordered doubly linked list threaded through their
/// headers; free space is never recorded and is derived from the distance
/// between neighbours.
pub struct Arena {
  header: NonNull<ArenaHeader>,
  size: usize,
}

impl Arena {
  /// Reserves `size` bytes, including the arena's own header.
  pub fn create(size: usize) -> Result<Self> {
    Self::with_options(size, ArenaOptions::default())
  }

  pub fn with_options(
    size: usize,
    options: ArenaOptions,
  ) -> Result<Self> {
    if size == 0 {
      return Err(ArenaError::InvalidSize { size });
    }

    if size < ARENA_HEADER_SIZE {
      return Err(ArenaError::TooSmall {
        size,
        minimum: ARENA_HEADER_SIZE,
      });
    }

    let base = unsafe { libc::malloc(size) } as *mut u8;
    let Some(base) = NonNull::new(base) else {
      return Err(ArenaError::AllocationFailure { size });
    };

    let header = base.cast::<ArenaHeader>();

    // malloc hands out memory aligned for any primitive type, so the arena
    // header itself can be written directly.
    unsafe {
      header.as_ptr().write(ArenaHeader {
        first: ptr::null_mut(),
        upper_limit: base.as_ptr().add(size),
      });
      ptr::write_bytes(
        base.as_ptr().add(ARENA_HEADER_SIZE),
        options.filler,
        size - ARENA_HEADER_SIZE,
      );
    }

    tracing::debug!(size, "created arena");

    Ok(Self { header, size })
  }

  /// Frees the whole region at once.
  ///
  /// Live chunks are a caller error: they are reported but do not stop the
  /// region from being freed.
  pub fn destroy(self) {
    drop(self);
  }

  /// Total bytes reserved for this arena, header included.
  pub fn size(&self) -> usize {
    self.size
  }

  pub(crate) fn base(&self) -> *mut u8 {
    self.header.as_ptr() as *mut u8
  }

  /// Number of live chunks.
  pub fn len(&self) -> usize {
    self.chunks().count()
  }

  pub fn is_empty(&self) -> bool {
    unsafe { (*self.header.as_ptr()).first.is_null() }
  }

  /// Live chunks in ascending address order.
  pub fn chunks(&self) -> Chunks<'_> {
    Chunks {
      base: self.base() as usize,
      current: unsafe { (*self.header.as_ptr()).first },
      _arena: PhantomData,
    }
  }

  /// Read-only snapshot of the arena for debugging.
  pub fn dump(&self) -> Report {
    Report::new(self)
  }

  /// Carves a chunk with a `size`-byte payload out of the first gap, in
  /// address order, that is strictly larger than `size` plus a chunk header.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<Chunk<'_>> {
    if size == 0 {
      return Err(ArenaError::InvalidSize { size });
    }

    let Some(placement) = (unsafe { self.find_gap(size) }) else {
      tracing::debug!(size, "no gap fits request");
      return Err(ArenaError::NoFit { size });
    };

    let position = placement.position;
    let chunk = unsafe { self.link(placement, size) };

    tracing::debug!(
      size,
      offset = chunk.offset(),
      ?position,
      "allocated chunk"
    );

    Ok(chunk)
  }

  /// Hands a chunk back to the arena. Releasing `None` does nothing.
  ///
  /// The freed bytes are left as they are and become part of whatever gap
  /// surrounds them.
  pub fn release<'a>(
    &'a self,
    chunk: impl Into<Option<Chunk<'a>>>,
  ) -> Result<()> {
    let Some(chunk) = chunk.into() else {
      return Ok(());
    };

    let arena = self.header.as_ptr();
    let at = chunk.header();

    unsafe {
      let mut node = ChunkHeader::load(at);

      if node.owner != arena {
        return Err(ArenaError::ForeignChunk);
      }

      match (node.prev.is_null(), node.next.is_null()) {
        (true, true) => {
          (*arena).first = ptr::null_mut();
        }
        (false, true) => {
          ChunkHeader::set_next(node.prev, ptr::null_mut());
          node.prev = ptr::null_mut();
          node.store(at);
        }
        (true, false) => {
          (*arena).first = node.next;
          ChunkHeader::set_prev(node.next, ptr::null_mut());
          node.next = ptr::null_mut();
          node.store(at);
        }
        (false, false) => {
          ChunkHeader::set_next(node.prev, node.next);
          ChunkHeader::set_prev(node.next, node.prev);
        }
      }

      tracing::debug!(
        size = node.payload_size,
        offset = at as usize - arena as usize,
        "released chunk"
      );
    }

    Ok(())
  }

  /// First-fit scan. The head gap is only considered once, before walking the
  /// list; after that each node is checked against its successor, or against
  /// the upper limit for the tail.
  unsafe fn find_gap(
    &self,
    size: usize,
  ) -> Option<Placement> {
    unsafe {
      let arena = self.header.as_ptr();
      let start = self.base().add(ARENA_HEADER_SIZE);
      let upper = (*arena).upper_limit;
      let head = (*arena).first;

      if head.is_null() {
        return fits(gap(start as usize, upper as usize), size).then_some(Placement {
          at: start as *mut ChunkHeader,
          prev: ptr::null_mut(),
          next: ptr::null_mut(),
          position: Position::Sole,
        });
      }

      if fits(gap(start as usize, head as usize), size) {
        return Some(Placement {
          at: start as *mut ChunkHeader,
          prev: ptr::null_mut(),
          next: head,
          position: Position::Head,
        });
      }

      let mut current = head;

      loop {
        let node = ChunkHeader::load(current);
        let end = node.end(current);

        tracing::trace!(
          offset = current as usize - arena as usize,
          size = node.payload_size,
          "visiting chunk"
        );

        if node.next.is_null() {
          return fits(gap(end as usize, upper as usize), size).then_some(Placement {
            at: end as *mut ChunkHeader,
            prev: current,
            next: ptr::null_mut(),
            position: Position::Tail,
          });
        }

        if fits(gap(end as usize, node.next as usize), size) {
          return Some(Placement {
            at: end as *mut ChunkHeader,
            prev: current,
            next: node.next,
            position: Position::Between,
          });
        }

        current = node.next;
      }
    }
  }

  /// Writes a fresh header at the placement and splices it into the list.
  unsafe fn link(
    &self,
    placement: Placement,
    size: usize,
  ) -> Chunk<'_> {
    let arena = self.header.as_ptr();
    let Placement { at, prev, next, .. } = placement;

    unsafe {
      ChunkHeader::new(size, prev, next, arena).store(at);

      if prev.is_null() {
        (*arena).first = at;
      } else {
        ChunkHeader::set_next(prev, at);
      }

      if !next.is_null() {
        ChunkHeader::set_prev(next, at);
      }

      Chunk::new(NonNull::new_unchecked(at), size)
    }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    if !self.is_empty() {
      tracing::warn!(
        live_chunks = self.len(),
        size = self.size,
        "destroying non-empty arena"
      );
    }

    unsafe { libc::free(self.header.as_ptr() as *mut libc::c_void) }
  }
}

/// Iterator over the live chunks of an [`Arena`], lowest address first.
pub struct Chunks<'a> {
  base: usize,
  current: *mut ChunkHeader,
  _arena: PhantomData<&'a Arena>,
}

impl Chunks<'_> {
  fn offset(
    &self,
    at: *mut ChunkHeader,
  ) -> Option<usize> {
    (!at.is_null()).then(|| at as usize - self.base)
  }
}

impl Iterator for Chunks<'_> {
  type Item = ChunkInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let at = self.current;
    let offset = self.offset(at)?;
    let node = unsafe { ChunkHeader::load(at) };

    self.current = node.next;

    Some(ChunkInfo {
      offset,
      payload_size: node.payload_size,
      prev: self.offset(node.prev),
      next: self.offset(node.next),
    })
  }
}

//! # contiguous - A First-Fit Sub-Allocator over a Fixed Region
//!
//! This crate carves variable-sized chunks out of one memory region that is
//! reserved up front with `malloc` and never grows afterwards.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout:
//!
//!   start                                                        upper_limit
//!   ┌────────┬────────┬─────────┬──────┬────────┬─────────┬───────────────┐
//!   │ arena  │ chunk  │ payload │ gap  │ chunk  │ payload │      gap      │
//!   │ header │ header │    A    │      │ header │    B    │               │
//!   └────────┴────────┴─────────┴──────┴────────┴─────────┴───────────────┘
//!       │        ▲  │                      ▲  │
//!       │ first  │  └──────── next ────────┘  │
//!       └────────┘  ◄──────── prev ───────────┘
//! ```
//!
//! Live chunks form a doubly linked list in ascending address order. Free
//! space is never recorded: the gap between two neighbours is simply the
//! distance from the end of one payload to the next header.
//!
//! ## Crate Structure
//!
//! ```text
//!   contiguous
//!   ├── arena      - Arena lifecycle, first-fit allocation and release
//!   ├── chunk      - Header layout, gap arithmetic and the Chunk handle
//!   ├── dump       - Read-only report of chunks and gaps
//!   └── error      - ArenaError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use contiguous::Arena;
//!
//! let arena = Arena::create(1024)?;
//!
//! let mut greeting = arena.allocate(5)?;
//! greeting.write(0, b"hello");
//! assert_eq!(greeting.to_vec(), b"hello");
//!
//! arena.release(greeting)?;
//! assert!(arena.is_empty());
//! # Ok::<(), contiguous::ArenaError>(())
//! ```
//!
//! ## Allocation Policy
//!
//! ```text
//!   1. head gap     arena header .. first chunk      (checked once)
//!   2. inner gaps   end of chunk N .. chunk N+1
//!   3. tail gap     end of last chunk .. upper_limit
//!
//!   A gap is used when it is strictly larger than header + payload.
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Arena` and `Chunk` are neither `Send` nor `Sync`
//! - **No resizing**: chunks cannot grow or shrink in place
//! - **No alignment**: payloads start right after their header, at any byte
//!   offset

mod arena;
mod chunk;
mod dump;
mod error;

pub use arena::{Arena, ArenaOptions, Chunks, DEFAULT_FILLER};
pub use chunk::{ARENA_HEADER_SIZE, CHUNK_HEADER_SIZE, Chunk, ChunkInfo};
pub use dump::{ChunkReport, Report, render_bytes};
pub use error::{ArenaError, Result};

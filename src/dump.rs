use std::{fmt, ptr};

use crate::{
  arena::Arena,
  chunk::{ARENA_HEADER_SIZE, ChunkInfo, gap},
};

/// One live chunk as seen by [`Report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
  pub info: ChunkInfo,
  pub payload: Vec<u8>,
  /// Unused bytes between this chunk and the next one, or the arena's upper
  /// limit for the last chunk.
  pub gap_after: usize,
}

/// Read-only snapshot of an arena and the implicit gaps between its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
  pub size: usize,
  /// Unused bytes between the arena header and the first chunk (or the
  /// upper limit when the arena is empty).
  pub leading_gap: usize,
  pub chunks: Vec<ChunkReport>,
}

impl Report {
  pub(crate) fn new(arena: &Arena) -> Self {
    let infos: Vec<ChunkInfo> = arena.chunks().collect();
    let size = arena.size();

    let leading_gap = gap(
      ARENA_HEADER_SIZE,
      infos.first().map_or(size, |info| info.offset),
    );

    let chunks = infos
      .iter()
      .enumerate()
      .map(|(index, info)| {
        let upper = infos.get(index + 1).map_or(size, |next| next.offset);

        ChunkReport {
          info: *info,
          payload: payload_bytes(arena, info),
          gap_after: gap(info.end(), upper),
        }
      })
      .collect();

    Self {
      size,
      leading_gap,
      chunks,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  /// Every implicit gap in address order: before the first chunk, between
  /// neighbours, and after the last chunk.
  pub fn gaps(&self) -> Vec<usize> {
    std::iter::once(self.leading_gap)
      .chain(self.chunks.iter().map(|chunk| chunk.gap_after))
      .collect()
  }
}

fn payload_bytes(
  arena: &Arena,
  info: &ChunkInfo,
) -> Vec<u8> {
  let mut bytes = vec![0; info.payload_size];
  let base = arena.base();

  unsafe {
    ptr::copy_nonoverlapping(
      base.add(info.payload_offset()),
      bytes.as_mut_ptr(),
      info.payload_size,
    );
  }

  bytes
}

/// Renders bytes with printable ASCII kept as is and everything else,
/// backslash included, escaped as `\xXX`.
pub fn render_bytes(bytes: &[u8]) -> String {
  bytes
    .iter()
    .map(|&byte| {
      if (0x20..0x80).contains(&byte) && byte != b'\\' {
        char::from(byte).to_string()
      } else {
        format!("\\x{byte:02X}")
      }
    })
    .collect()
}

fn presence(link: Option<usize>) -> &'static str {
  if link.is_some() { "*" } else { "NULL" }
}

const RULE: &str = "----------------------------------------------------------------";

impl fmt::Display for Report {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "{RULE}")?;
    writeln!(f, "arena ({} bytes)", self.size)?;
    writeln!(
      f,
      "    first: {}",
      presence(self.chunks.first().map(|chunk| chunk.info.offset))
    )?;

    if self.is_empty() || self.leading_gap != 0 {
      writeln!(f, "{} byte gap", self.leading_gap)?;
    }

    for chunk in &self.chunks {
      writeln!(f, "chunk @ {}", chunk.info.offset)?;
      writeln!(f, "    payload_size: {}", chunk.info.payload_size)?;
      writeln!(f, "    prev: {}", presence(chunk.info.prev))?;
      writeln!(f, "    next: {}", presence(chunk.info.next))?;
      writeln!(
        f,
        "{} byte chunk: {}",
        chunk.info.payload_size,
        render_bytes(&chunk.payload)
      )?;

      if chunk.gap_after != 0 {
        writeln!(f, "{} byte gap", chunk.gap_after)?;
      }
    }

    writeln!(f, "{RULE}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chunk::CHUNK_HEADER_SIZE;

  #[test]
  fn test_render_bytes() {
    assert_eq!(render_bytes(b"abc XYZ~"), "abc XYZ~");
    assert_eq!(render_bytes(b"a\\b"), "a\\x5Cb");
    assert_eq!(render_bytes(&[0x00, 0x1F, 0x7F, 0x80, 0xFF]), "\\x00\\x1F\x7F\\x80\\xFF");
  }

  #[test]
  fn test_empty_arena() {
    let arena = Arena::create(64).unwrap();
    let report = arena.dump();

    assert!(report.is_empty());
    assert_eq!(report.gaps(), [64 - ARENA_HEADER_SIZE]);

    let text = report.to_string();
    assert!(text.contains("    first: NULL\n"));
    assert!(text.contains(&format!("{} byte gap\n", 64 - ARENA_HEADER_SIZE)));
  }

  #[test]
  fn test_scenario_head_gap_reuse() {
    let arena = Arena::create(1024).unwrap();

    let first = arena.allocate(100).unwrap();
    let mut second = arena.allocate(200).unwrap();
    second.fill(b'b');
    arena.release(first).unwrap();

    let mut third = arena.allocate(50).unwrap();
    third.write(0, b"hi\n");
    assert_eq!(third.offset(), ARENA_HEADER_SIZE);

    let report = arena.dump();
    let sizes: Vec<usize> = report.chunks.iter().map(|c| c.info.payload_size).collect();
    assert_eq!(sizes, [50, 200]);
    assert!(report.chunks[0].info.offset < report.chunks[1].info.offset);
    assert_eq!(report.chunks[1].payload, vec![b'b'; 200]);
    assert_eq!(&report.chunks[0].payload[..3], b"hi\n");

    assert_eq!(
      report.gaps(),
      [
        0,
        100 - 50,
        1024 - ARENA_HEADER_SIZE - 2 * CHUNK_HEADER_SIZE - 300,
      ]
    );

    let text = report.to_string();
    assert!(text.contains("50 byte chunk: hi\\x0A$$$"));
    assert!(text.contains("    prev: NULL\n    next: *\n"));
    assert!(text.contains("    prev: *\n    next: NULL\n"));
    assert!(text.contains("50 byte gap\n"));
    assert_eq!(text.matches("byte gap").count(), 2);
  }
}

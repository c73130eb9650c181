use std::io::Read;

use contiguous::{Arena, ArenaError};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER, so each step's dump can be read before
/// the next one scrolls by.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() -> Result<(), ArenaError> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // 1 KiB region. Everything past the arena header starts out as '$'.
  let arena = Arena::create(1024)?;

  println!("[0] Fresh arena");
  print!("{}", arena.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) First chunk goes right after the arena header.
  // --------------------------------------------------------------------
  let mut first = arena.allocate(100)?;
  first.write(0, b"first chunk");
  println!("\n[1] Allocate 100 bytes at offset {}", first.offset());
  print!("{}", arena.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Second chunk is appended after the first one.
  // --------------------------------------------------------------------
  let mut second = arena.allocate(200)?;
  second.fill(b'2');
  println!("\n[2] Allocate 200 bytes at offset {}", second.offset());
  print!("{}", arena.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Releasing the head reopens the gap below the second chunk.
  //    The bytes are not cleared.
  // --------------------------------------------------------------------
  arena.release(first)?;
  println!("\n[3] Release the first chunk");
  print!("{}", arena.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A small request lands in the reopened head gap.
  // --------------------------------------------------------------------
  let third = arena.allocate(50)?;
  println!(
    "\n[4] Allocate 50 bytes at offset {} (head gap reused: {})",
    third.offset(),
    third.offset() == contiguous::ARENA_HEADER_SIZE
  );
  print!("{}", arena.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) A request larger than any gap is refused, not fatal.
  // --------------------------------------------------------------------
  match arena.allocate(4096) {
    Ok(chunk) => println!("\n[5] Unexpectedly placed 4096 bytes at {}", chunk.offset()),
    Err(err) => println!("\n[5] Allocate 4096 bytes: {err}"),
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) Leave the second chunk live and destroy the arena; run with
  //    RUST_LOG=warn to see the report.
  // --------------------------------------------------------------------
  arena.release(third)?;
  println!("\n[6] Destroying arena with {} live chunk(s)", arena.len());
  arena.destroy();

  Ok(())
}

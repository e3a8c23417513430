//! Corruption must take the process down. Each test re-runs itself in a
//! child process that does the bad release, and checks how the child died.

use std::{env, process::Command};

use rfreelist::{ArenaHeap, FreeListAllocator, HEADER_SIZE};
use test_env_log::test;

const CHILD: &str = "RFREELIST_ABORT_CHILD";

fn in_child() -> bool {
  env::var_os(CHILD).is_some()
}

fn run_child(test: &str) -> String {
  let output = Command::new(env::current_exe().unwrap())
    .args(["--exact", test, "--nocapture", "--test-threads=1"])
    .env(CHILD, "1")
    .env("RUST_LOG", "error")
    .output()
    .unwrap();

  assert!(!output.status.success(), "child survived the corrupted release");
  let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
  text.push_str(&String::from_utf8_lossy(&output.stdout));
  text
}

/// The logger installed for the child saw the report before the abort.
fn assert_logged(output: &str) {
  assert!(output.contains("ERROR"), "output: {output}");
  assert!(output.contains("rfreelist::allocator"), "output: {output}");
}

#[test]
fn double_release_aborts() {
  if in_child() {
    let mut allocator = FreeListAllocator::new(ArenaHeap::with_capacity(256));
    let ptr = allocator.allocate(32).unwrap();
    unsafe {
      allocator.release(Some(ptr));
      allocator.release(Some(ptr));
    }
    return;
  }

  let output = run_child("double_release_aborts");
  assert!(output.contains("MEMORY CORRUPTION DETECTED"), "output: {output}");
  assert_logged(&output);
}

#[test]
fn overwritten_header_aborts() {
  if in_child() {
    let mut allocator = FreeListAllocator::new(ArenaHeap::with_capacity(256));
    let ptr = allocator.allocate(32).unwrap();
    unsafe {
      ptr.as_ptr().sub(HEADER_SIZE).write_bytes(0, HEADER_SIZE);
      allocator.release(Some(ptr));
    }
    return;
  }

  let output = run_child("overwritten_header_aborts");
  assert!(output.contains("memory corruption at block"), "output: {output}");
  assert_logged(&output);
}

//! # rfreelist - A First-Fit Free-List Allocator
//!
//! This crate provides a `malloc`-style allocator in Rust that manages memory
//! obtained from the program break with the `sbrk` system call, or from any
//! other [`HeapGrower`].
//!
//! ## Overview
//!
//! Every block carries a small header in front of its payload. Released
//! blocks are threaded into a singly linked free list and reused by later
//! requests:
//!
//! ```text
//!   Heap after a few allocations and releases:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌───┬──────┬───┬──────────┬───┬──────┬───┬────────────────┐          │
//!   │ │ H │ used │ H │   free   │ H │ used │ H │      free      │          │
//!   │ └───┴──────┴───┴──────────┴───┴──────┴───┴────────────────┘          │
//!   │                ▲                         ▲                    ▲      │
//!   │                │                         │                    │      │
//!   │                └──── free list ──────────┘                 Program   │
//!   │                      (insertion order)                      Break    │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Allocate** takes the first free block that is large enough, splitting
//!   off whatever it does not need. If nothing fits, the heap grows.
//! - **Release** pushes the block onto the free list and merges it with any
//!   free block physically before or after it.
//! - Allocated headers carry a sentinel. Releasing a block whose sentinel is
//!   missing (a double release, a foreign pointer, an overwritten header)
//!   aborts the process.
//!
//! ## Crate Structure
//!
//! ```text
//!   rfreelist
//!   ├── align      - Alignment macro (align!) and ALIGNMENT
//!   ├── block      - Block header layout, splitting (internal)
//!   ├── freelist   - Free list, first fit, neighbors, coalescing (internal)
//!   ├── heap       - HeapGrower trait, SbrkHeap, ArenaHeap
//!   ├── allocator  - FreeListAllocator
//!   ├── config     - AllocatorConfig
//!   ├── error      - AllocError
//!   ├── stats      - HeapStats
//!   ├── global     - Process-wide locked heap on the program break
//!   └── ffi        - rfl_malloc, rfl_calloc, rfl_realloc, rfl_free
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rfreelist::{ArenaHeap, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::new(ArenaHeap::with_capacity(4096));
//!
//! let ptr = allocator.allocate(64).unwrap();
//! unsafe {
//!   ptr.as_ptr().write_bytes(0x2A, 64);
//!
//!   let ptr = allocator.resize(Some(ptr), 256).unwrap();
//!   assert_eq!(ptr.as_ptr().read(), 0x2A);
//!
//!   allocator.release(Some(ptr));
//! }
//!
//! assert_eq!(allocator.stats().live_allocations, 0);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ next / sentinel │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │      16 bytes         │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user (16-byte aligned)
//! ```
//!
//! ## Limitations
//!
//! - **Single allocation stream**: a [`FreeListAllocator`] takes `&mut self`;
//!   the [`global`] heap serializes callers behind one lock.
//! - **Memory is never returned** to the operating system.
//! - **Linear scans**: first fit and neighbor lookup walk the whole free list.
//! - **Alignment**: every block is 16-byte aligned, never more.
//!
//! ## Safety
//!
//! Releasing and resizing take raw pointers and are `unsafe`: the allocator
//! reads the header in front of whatever pointer it is given.

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
pub mod ffi;
mod freelist;
pub mod global;
mod heap;
mod stats;

pub use align::ALIGNMENT;
pub use allocator::FreeListAllocator;
pub use block::HEADER_SIZE;
pub use config::{AllocatorConfig, DEFAULT_SENTINEL};
pub use error::AllocError;
pub use heap::{ArenaHeap, HeapGrower, SbrkHeap};
pub use stats::HeapStats;

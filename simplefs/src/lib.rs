//! A minimal inode/bitmap filesystem layered over a fixed-geometry block device.
//!
//! There is no directory tree, no file names, and no permissions: an inode is identified purely
//! by its inumber, addressed with a handful of direct pointers plus one level of indirection.
//! [`Filesystem`] is the entry point: it owns a [`BlockDevice`] and exposes `format`/`mount`/
//! `create`/`delete`/`read`/`write`/`getsize`/`debug` with the classic numeric return-code
//! convention. [`Volume`] underneath carries the richer, `Result`-typed API for callers who want
//! it directly.

mod alloc;
mod debug;
mod device;
mod error;
mod facade;
mod inode;
mod io;
mod layout;
mod volume;

pub use device::{BlockDevice, FileDevice, MemDevice};
pub use error::{Error, Result};
pub use facade::Filesystem;
pub use layout::{BLOCK_SIZE, MAX_INODE_SIZE, POINTERS_PER_BLOCK, POINTERS_PER_INODE};
pub use volume::Volume;

//! Error types shared by every module of the crate.

use std::fmt;

/// An error produced by a filesystem operation.
///
/// Internal code returns [`Result`], while the numeric facade in [`crate::facade`] converts
/// each variant to the return-value sentinel documented for the corresponding operation.
#[derive(Debug)]
pub enum Error {
	/// The operation requires a mounted volume, but none is mounted.
	NotMounted,
	/// `format`/`mount` was called on a volume that is already mounted.
	AlreadyMounted,
	/// The superblock's magic number does not match, so the device holds no known filesystem.
	BadMagic,
	/// An inumber fell outside `[0, ninodes)`.
	OutOfRangeInumber,
	/// The inode at the given slot is not in use.
	InvalidInode,
	/// The allocator has no free block left to satisfy a request.
	OutOfSpace,
	/// The underlying block device failed to read or write a block.
	Device(std::io::Error),
}

/// Shorthand for this crate's `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotMounted => write!(f, "volume is not mounted"),
			Self::AlreadyMounted => write!(f, "volume is already mounted"),
			Self::BadMagic => write!(f, "device does not hold a simplefs volume"),
			Self::OutOfRangeInumber => write!(f, "inumber out of range"),
			Self::InvalidInode => write!(f, "inode is not valid"),
			Self::OutOfSpace => write!(f, "no free block available"),
			Self::Device(e) => write!(f, "device error: {e}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Device(e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Self::Device(e)
	}
}

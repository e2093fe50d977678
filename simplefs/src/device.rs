//! The block device contract this filesystem is layered over, and two concrete adapters.
//!
//! The real driver is always external to this crate (per the purpose/scope of this system);
//! [`FileDevice`] and [`MemDevice`] exist only to give the demonstration shell and the test
//! suite something to mount.

use crate::error::Result;
use crate::layout::BLOCK_SIZE;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A fixed-geometry block device: blocks are addressed by integer index, all the same size.
pub trait BlockDevice {
	/// Returns the total number of blocks on the device.
	fn block_count(&self) -> u32;

	/// Reads block `block` into `buf`.
	fn read_block(&mut self, block: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;

	/// Writes `buf` to block `block`.
	fn write_block(&mut self, block: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()>;
}

/// A block device backed by a regular file, used as a disk image.
pub struct FileDevice {
	file: File,
	block_count: u32,
}

impl FileDevice {
	/// Opens an existing disk image at `path`. The image's length must be a multiple of the
	/// block size; its block count is derived from the file's length.
	pub fn open(path: &Path) -> std::io::Result<Self> {
		let file = OpenOptions::new().read(true).write(true).open(path)?;
		let len = file.metadata()?.len();
		let block_count = (len / BLOCK_SIZE as u64) as u32;
		Ok(Self { file, block_count })
	}

	/// Creates a new disk image at `path` holding exactly `block_count` zeroed blocks,
	/// truncating any file already present.
	pub fn create(path: &Path, block_count: u32) -> std::io::Result<Self> {
		let mut file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.open(path)?;
		file.set_len(block_count as u64 * BLOCK_SIZE as u64)?;
		Ok(Self { file, block_count })
	}
}

impl BlockDevice for FileDevice {
	fn block_count(&self) -> u32 {
		self.block_count
	}

	fn read_block(&mut self, block: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
		self.file
			.seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
		self.file.read_exact(buf)?;
		Ok(())
	}

	fn write_block(&mut self, block: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
		self.file
			.seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
		self.file.write_all(buf)?;
		Ok(())
	}
}

/// A block device backed by an in-memory buffer, for unit and integration tests.
pub struct MemDevice {
	blocks: Vec<[u8; BLOCK_SIZE]>,
}

impl MemDevice {
	/// Creates a new, zeroed in-memory device of `block_count` blocks.
	pub fn new(block_count: u32) -> Self {
		Self {
			blocks: vec![[0u8; BLOCK_SIZE]; block_count as usize],
		}
	}
}

impl BlockDevice for MemDevice {
	fn block_count(&self) -> u32 {
		self.blocks.len() as u32
	}

	fn read_block(&mut self, block: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
		buf.copy_from_slice(&self.blocks[block as usize]);
		Ok(())
	}

	fn write_block(&mut self, block: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
		self.blocks[block as usize].copy_from_slice(buf);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mem_device_round_trip() {
		let mut dev = MemDevice::new(4);
		assert_eq!(dev.block_count(), 4);

		let mut block = [0u8; BLOCK_SIZE];
		block[0] = 0xab;
		block[BLOCK_SIZE - 1] = 0xcd;
		dev.write_block(2, &block).unwrap();

		let mut read_back = [0u8; BLOCK_SIZE];
		dev.read_block(2, &mut read_back).unwrap();
		assert_eq!(read_back, block);

		let mut untouched = [0u8; BLOCK_SIZE];
		dev.read_block(0, &mut untouched).unwrap();
		assert_eq!(untouched, [0u8; BLOCK_SIZE]);
	}
}

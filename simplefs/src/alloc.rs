//! The block and inode allocators: deterministic first-fit scans over the in-memory bitmaps.
//!
//! First-fit is specified, not incidental (see the design notes in the project spec): two
//! identical sequences of operations against the same freshly formatted device must make the
//! same allocation choices, so tests can assert on exact block numbers.

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::volume::Volume;

impl<D: BlockDevice> Volume<D> {
	/// Allocates the lowest-numbered free data block, marking it used in the bitmap.
	///
	/// Returns [`Error::OutOfSpace`] if every block is taken.
	pub(crate) fn alloc_block(&mut self) -> Result<u32> {
		let sb = *self.superblock()?;
		let start = sb.first_data_block() as usize;
		let bitmap = self.bitmap_mut()?;
		let found = (start..bitmap.len()).find(|&b| !bitmap[b]);
		match found {
			Some(b) => {
				bitmap[b] = true;
				Ok(b as u32)
			}
			None => Err(Error::OutOfSpace),
		}
	}

	/// Marks a data block free again.
	pub(crate) fn free_block(&mut self, block: u32) -> Result<()> {
		let bitmap = self.bitmap_mut()?;
		if let Some(slot) = bitmap.get_mut(block as usize) {
			*slot = false;
		}
		Ok(())
	}

	/// Allocates the lowest-numbered free inode slot, marking it used.
	///
	/// Returns `None` if every slot is occupied; inumber `0` is never considered (it is the
	/// reserved failure sentinel).
	pub(crate) fn alloc_inode(&mut self) -> Result<Option<u32>> {
		let inode_used = self.inode_used_mut()?;
		let found = (1..inode_used.len()).find(|&i| !inode_used[i]);
		if let Some(i) = found {
			inode_used[i] = true;
		}
		Ok(found.map(|i| i as u32))
	}

	/// Marks an inode slot free again.
	pub(crate) fn free_inode(&mut self, inumber: u32) -> Result<()> {
		let inode_used = self.inode_used_mut()?;
		if let Some(slot) = inode_used.get_mut(inumber as usize) {
			*slot = false;
		}
		Ok(())
	}
}

//! The in-memory volume state: bitmap, inode-allocation map, and the cached superblock.
//!
//! A [`Volume`] owns everything a mounted filesystem needs to track in memory. There is no
//! process-wide global here, every operation is a method on an owned value, so nothing
//! prevents two volumes (e.g. two disk images in a test) from existing side by side.

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{
	self, IndirectBlock, InodeRecord, Superblock, BLOCK_SIZE, FS_MAGIC, INODES_PER_BLOCK,
	SUPERBLOCK_BLOCK,
};

/// Owns the device handle plus all in-memory metadata for a mounted (or not-yet-mounted)
/// volume.
pub struct Volume<D: BlockDevice> {
	pub(crate) device: D,
	pub(crate) superblock: Option<Superblock>,
	/// `bitmap[b] == true` iff block `b` is in use. `None` while unmounted.
	pub(crate) bitmap: Option<Vec<bool>>,
	/// `inode_used[i] == true` iff inode `i` is valid. `None` while unmounted.
	pub(crate) inode_used: Option<Vec<bool>>,
}

impl<D: BlockDevice> Volume<D> {
	/// Wraps a block device, unmounted.
	pub fn new(device: D) -> Self {
		Self {
			device,
			superblock: None,
			bitmap: None,
			inode_used: None,
		}
	}

	/// Tells whether the volume is currently mounted.
	pub fn is_mounted(&self) -> bool {
		self.bitmap.is_some()
	}

	/// Reads and decodes the current superblock from block 0, without requiring the volume to
	/// be mounted. Used by `format` (to detect a previous filesystem) and `debug`.
	pub(crate) fn read_superblock(&mut self) -> Result<Superblock> {
		let mut buf = [0u8; BLOCK_SIZE];
		self.device.read_block(SUPERBLOCK_BLOCK, &mut buf)?;
		Ok(layout::decode_superblock(&buf))
	}

	/// Formats the device: writes a fresh superblock and clears every inode slot.
	///
	/// Fails without touching the disk if the volume is currently mounted.
	pub fn format(&mut self) -> Result<()> {
		if self.is_mounted() {
			return Err(Error::AlreadyMounted);
		}

		let nblocks = self.device.block_count();
		let ninodeblocks = ((nblocks as u64 + 9) / 10).max(1) as i32;
		let ninodes = ninodeblocks * INODES_PER_BLOCK as i32;

		let sb = Superblock {
			magic: FS_MAGIC,
			nblocks: nblocks as i32,
			ninodeblocks,
			ninodes,
		};

		let empty_inode_block = [0u8; BLOCK_SIZE];
		for block in 1..=ninodeblocks as u32 {
			self.device.write_block(block, &empty_inode_block)?;
		}

		let sb_buf = layout::encode_superblock(&sb);
		self.device.write_block(SUPERBLOCK_BLOCK, &sb_buf)?;

		Ok(())
	}

	/// Mounts the volume: validates the magic number and rebuilds the in-memory bitmap and
	/// inode-allocation map by scanning every inode.
	pub fn mount(&mut self) -> Result<()> {
		if self.is_mounted() {
			return Err(Error::AlreadyMounted);
		}

		let sb = self.read_superblock()?;
		if !sb.is_valid() {
			return Err(Error::BadMagic);
		}

		let nblocks = sb.nblocks as usize;
		let ninodes = sb.ninodes as usize;
		let mut bitmap = vec![false; nblocks];
		let mut inode_used = vec![false; ninodes];

		let mut block_buf = [0u8; BLOCK_SIZE];
		let mut indirect_buf = [0u8; BLOCK_SIZE];
		for block in 1..=sb.ninodeblocks as u32 {
			self.device.read_block(block, &mut block_buf)?;
			for slot in 0..INODES_PER_BLOCK {
				let inumber = (block - 1) as usize * INODES_PER_BLOCK + slot;
				if inumber >= ninodes {
					break;
				}
				let inode = layout::decode_inode(&block_buf, slot);
				if !inode.is_valid() {
					continue;
				}
				inode_used[inumber] = true;
				for &ptr in &inode.direct {
					if ptr != 0 {
						mark(&mut bitmap, ptr);
					}
				}
				if inode.indirect != 0 {
					mark(&mut bitmap, inode.indirect);
					self.device
						.read_block(inode.indirect as u32, &mut indirect_buf)?;
					let ib: IndirectBlock = layout::decode_indirect(&indirect_buf);
					for &ptr in &ib.pointers {
						if ptr != 0 {
							mark(&mut bitmap, ptr);
						}
					}
				}
			}
		}

		for b in 0..=sb.ninodeblocks as usize {
			bitmap[b] = true;
		}

		self.superblock = Some(sb);
		self.bitmap = Some(bitmap);
		self.inode_used = Some(inode_used);
		Ok(())
	}

	/// Unmounts the volume, dropping the in-memory bitmap and inode-allocation map.
	///
	/// All durable state was already written to disk by `create`/`write`/`delete`, so this is
	/// pure bookkeeping: no I/O is performed.
	pub fn unmount(&mut self) -> Result<()> {
		if !self.is_mounted() {
			return Err(Error::NotMounted);
		}
		self.superblock = None;
		self.bitmap = None;
		self.inode_used = None;
		Ok(())
	}

	/// Returns the cached superblock, requiring the volume to be mounted.
	pub(crate) fn superblock(&self) -> Result<&Superblock> {
		self.superblock.as_ref().ok_or(Error::NotMounted)
	}

	pub(crate) fn bitmap(&self) -> Result<&[bool]> {
		self.bitmap.as_deref().ok_or(Error::NotMounted)
	}

	pub(crate) fn bitmap_mut(&mut self) -> Result<&mut Vec<bool>> {
		self.bitmap.as_mut().ok_or(Error::NotMounted)
	}

	pub(crate) fn inode_used(&self) -> Result<&[bool]> {
		self.inode_used.as_deref().ok_or(Error::NotMounted)
	}

	pub(crate) fn inode_used_mut(&mut self) -> Result<&mut Vec<bool>> {
		self.inode_used.as_mut().ok_or(Error::NotMounted)
	}

	pub(crate) fn device_mut(&mut self) -> &mut D {
		&mut self.device
	}

	/// Loads the inode record for `inumber`, requiring the volume to be mounted and the
	/// inumber to be in range.
	pub(crate) fn load_inode_record(&mut self, inumber: u32) -> Result<InodeRecord> {
		let sb = *self.superblock()?;
		if inumber == 0 || inumber >= sb.ninodes as u32 {
			return Err(Error::OutOfRangeInumber);
		}
		let (block, slot) = layout::inode_location(inumber);
		let mut buf = [0u8; BLOCK_SIZE];
		self.device.read_block(block, &mut buf)?;
		Ok(layout::decode_inode(&buf, slot))
	}

	/// Writes back a single inode record.
	pub(crate) fn store_inode_record(&mut self, inumber: u32, inode: &InodeRecord) -> Result<()> {
		let (block, slot) = layout::inode_location(inumber);
		let mut buf = [0u8; BLOCK_SIZE];
		self.device.read_block(block, &mut buf)?;
		layout::encode_inode_into(&mut buf, slot, inode);
		self.device.write_block(block, &buf)?;
		Ok(())
	}
}

fn mark(bitmap: &mut [bool], block: i32) {
	if block >= 0 && (block as usize) < bitmap.len() {
		bitmap[block as usize] = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	#[test]
	fn format_then_mount_reports_classic_geometry() {
		let mut vol = Volume::new(MemDevice::new(100));
		vol.format().unwrap();
		vol.mount().unwrap();
		let sb = *vol.superblock().unwrap();
		assert_eq!(sb.nblocks, 100);
		assert_eq!(sb.ninodeblocks, 10);
		assert_eq!(sb.ninodes, 1280);
	}

	#[test]
	fn mount_rejects_unformatted_device() {
		let mut vol = Volume::new(MemDevice::new(10));
		assert!(matches!(vol.mount(), Err(Error::BadMagic)));
	}

	#[test]
	fn format_refuses_while_mounted() {
		let mut vol = Volume::new(MemDevice::new(20));
		vol.format().unwrap();
		vol.mount().unwrap();
		assert!(matches!(vol.format(), Err(Error::AlreadyMounted)));
	}

	#[test]
	fn mount_initializes_reserved_bitmap_region() {
		let mut vol = Volume::new(MemDevice::new(20));
		vol.format().unwrap();
		vol.mount().unwrap();
		let sb = *vol.superblock().unwrap();
		let bitmap = vol.bitmap().unwrap();
		for b in 0..=sb.ninodeblocks as usize {
			assert!(bitmap[b], "block {b} should be reserved");
		}
		assert!(!bitmap[sb.ninodeblocks as usize + 1]);
	}

	#[test]
	fn unmount_then_remount_round_trips() {
		let mut vol = Volume::new(MemDevice::new(20));
		vol.format().unwrap();
		vol.mount().unwrap();
		vol.unmount().unwrap();
		assert!(!vol.is_mounted());
		vol.mount().unwrap();
		assert!(vol.is_mounted());
	}
}

//! The inode store: validated access to individual inode records.
//!
//! [`Volume::load_inode_record`]/[`Volume::store_inode_record`] (in `volume.rs`) already know
//! how to translate an inumber into `(block, slot)` and move bytes through the codec; this
//! module adds the validity checks the facade operations need on top of that raw access.

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::InodeRecord;
use crate::volume::Volume;

impl<D: BlockDevice> Volume<D> {
	/// Loads the inode record for `inumber`, requiring it to be both in range and in use.
	pub(crate) fn load_valid_inode(&mut self, inumber: u32) -> Result<InodeRecord> {
		let inode = self.load_inode_record(inumber)?;
		if !inode.is_valid() {
			return Err(Error::InvalidInode);
		}
		Ok(inode)
	}
}

#[cfg(test)]
mod tests {
	use crate::device::MemDevice;
	use crate::error::Error;
	use crate::volume::Volume;

	#[test]
	fn load_valid_inode_rejects_free_slots() {
		let mut vol = Volume::new(MemDevice::new(20));
		vol.format().unwrap();
		vol.mount().unwrap();
		assert!(matches!(
			vol.load_valid_inode(1),
			Err(Error::InvalidInode)
		));
	}

	#[test]
	fn load_valid_inode_rejects_out_of_range() {
		let mut vol = Volume::new(MemDevice::new(20));
		vol.format().unwrap();
		vol.mount().unwrap();
		let sb = *vol.superblock().unwrap();
		assert!(matches!(
			vol.load_valid_inode(sb.ninodes as u32),
			Err(Error::OutOfRangeInumber)
		));
		assert!(matches!(
			vol.load_valid_inode(0),
			Err(Error::OutOfRangeInumber)
		));
	}
}

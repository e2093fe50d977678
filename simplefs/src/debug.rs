//! The read-only `debug` dump: superblock geometry plus every valid inode's size and pointers.
//!
//! Grounded in the disk-inspection output style of the partition and filesystem-probing tools
//! this crate was built from, a flat, labeled text report a human reads at a terminal, not a
//! machine-parsed format.

use std::fmt::Write as _;

use crate::device::BlockDevice;
use crate::layout::{self, BLOCK_SIZE, INODES_PER_BLOCK};
use crate::volume::Volume;

/// Renders the superblock and every valid inode as a multi-line report.
///
/// Works whether or not the volume is currently mounted: if unmounted, the superblock is read
/// straight off the device for this call only, and inode scanning uses the on-disk data
/// directly rather than any in-memory cache.
pub fn render<D: BlockDevice>(volume: &mut Volume<D>) -> String {
	let mut out = String::new();

	let sb = match volume.read_superblock() {
		Ok(sb) => sb,
		Err(e) => {
			let _ = writeln!(out, "debug: could not read superblock: {e}");
			return out;
		}
	};

	if !sb.is_valid() {
		let _ = writeln!(out, "superblock magic invalid: not a simplefs volume");
		return out;
	}

	let _ = writeln!(out, "superblock:");
	let _ = writeln!(out, "    {} blocks", sb.nblocks);
	let _ = writeln!(out, "    {} inode blocks", sb.ninodeblocks);
	let _ = writeln!(out, "    {} inodes total", sb.ninodes);

	let mut block_buf = [0u8; BLOCK_SIZE];
	let mut any = false;
	for block in 1..=sb.ninodeblocks as u32 {
		if volume.device_mut().read_block(block, &mut block_buf).is_err() {
			let _ = writeln!(out, "    <failed to read inode block {block}>");
			continue;
		}
		for slot in 0..INODES_PER_BLOCK {
			let inumber = (block - 1) as usize * INODES_PER_BLOCK + slot;
			if inumber >= sb.ninodes as usize {
				break;
			}
			let inode = layout::decode_inode(&block_buf, slot);
			if !inode.is_valid() {
				continue;
			}
			any = true;
			let _ = writeln!(out, "inode {inumber}:");
			let _ = writeln!(out, "    size: {} bytes", inode.size);
			let used: Vec<String> = inode
				.direct
				.iter()
				.filter(|&&p| p != 0)
				.map(i32::to_string)
				.collect();
			let _ = writeln!(out, "    direct blocks: {}", used.join(" "));
			if inode.indirect != 0 {
				let _ = writeln!(out, "    indirect block: {}", inode.indirect);
				let mut indirect_buf = [0u8; BLOCK_SIZE];
				if volume
					.device_mut()
					.read_block(inode.indirect as u32, &mut indirect_buf)
					.is_err()
				{
					let _ = writeln!(out, "    <failed to read indirect block {}>", inode.indirect);
				} else {
					let ib = layout::decode_indirect(&indirect_buf);
					let pointers: Vec<String> = ib
						.pointers
						.iter()
						.filter(|&&p| p != 0)
						.map(i32::to_string)
						.collect();
					let _ = writeln!(out, "    indirect data blocks: {}", pointers.join(" "));
				}
			}
		}
	}
	if !any {
		let _ = writeln!(out, "no valid inodes");
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	#[test]
	fn debug_reports_an_unformatted_device() {
		let mut vol = Volume::new(MemDevice::new(10));
		let report = render(&mut vol);
		assert!(report.contains("not a simplefs volume"));
	}

	#[test]
	fn debug_reports_geometry_and_inodes() {
		let mut vol = Volume::new(MemDevice::new(100));
		vol.format().unwrap();
		vol.mount().unwrap();
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &layout::InodeRecord::new_empty())
			.unwrap();
		vol.write(i, b"hi", 2, 0);

		let report = render(&mut vol);
		assert!(report.contains("100 blocks"));
		assert!(report.contains(&format!("inode {i}:")));
		assert!(report.contains("size: 2 bytes"));
	}

	#[test]
	fn debug_lists_the_indirect_block_s_non_zero_pointers() {
		let mut vol = Volume::new(MemDevice::new(2000));
		vol.format().unwrap();
		vol.mount().unwrap();
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &layout::InodeRecord::new_empty())
			.unwrap();

		let len = 6 * BLOCK_SIZE;
		let data = vec![0x42u8; len];
		vol.write(i, &data, len, 0);

		let report = render(&mut vol);
		let inode = vol.load_valid_inode(i).unwrap();
		assert_ne!(inode.indirect, 0);
		assert!(report.contains(&format!("indirect block: {}", inode.indirect)));

		let pointers_line = report
			.lines()
			.find(|l| l.trim_start().starts_with("indirect data blocks:"))
			.expect("indirect data blocks line");
		let pointers: Vec<&str> = pointers_line
			.split(':')
			.nth(1)
			.unwrap()
			.split_whitespace()
			.collect();
		assert_eq!(pointers.len(), 1);
	}
}

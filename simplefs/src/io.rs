//! The read and write paths: walking `direct[0..D)` and the indirect block, and growing an
//! inode's allocation on demand while writing.
//!
//! Per the spec, no exception escapes a read or write: every stopping condition (a hole, the
//! end of the inode, the allocator running out of blocks, even a device I/O failure partway
//! through) is reported by simply returning how many bytes were actually moved. Both functions
//! below are therefore infallible at their own boundary: any internal [`Error`] just ends the
//! loop early.

use crate::device::BlockDevice;
use crate::error::Error;
use crate::layout::{self, IndirectBlock, InodeRecord, BLOCK_SIZE, POINTERS_PER_BLOCK, POINTERS_PER_INODE};
use crate::volume::Volume;

impl<D: BlockDevice> Volume<D> {
	/// Reads up to `length` bytes of inode `inumber`'s content starting at `offset` into `out`.
	///
	/// Returns the number of bytes actually copied; `0` is returned (not an error) whenever the
	/// volume isn't mounted, the inumber is out of range or invalid, or `offset` is at or past
	/// the inode's size.
	pub fn read(&mut self, inumber: u32, out: &mut [u8], length: usize, offset: usize) -> usize {
		let Ok(inode) = self.load_valid_inode(inumber) else {
			return 0;
		};
		let size = inode.size.max(0) as usize;
		if offset >= size {
			return 0;
		}
		let end = (offset + length).min(size).min(offset + out.len());

		let mut pos = offset;
		let mut copied = 0usize;
		let mut indirect_cache: Option<IndirectBlock> = None;
		while pos < end {
			let bi = pos / BLOCK_SIZE;
			let bo = pos % BLOCK_SIZE;
			let ptr = match self.resolve_pointer_for_read(&inode, bi, &mut indirect_cache) {
				Some(p) => p,
				None => break,
			};
			if ptr == 0 {
				break;
			}
			let mut block = [0u8; BLOCK_SIZE];
			if self.device_mut().read_block(ptr as u32, &mut block).is_err() {
				break;
			}
			let take = (BLOCK_SIZE - bo).min(end - pos);
			out[copied..copied + take].copy_from_slice(&block[bo..bo + take]);
			pos += take;
			copied += take;
		}
		copied
	}

	/// Writes up to `length` bytes from `data` into inode `inumber` starting at `offset`,
	/// allocating direct/indirect/data blocks on demand.
	///
	/// Returns the number of bytes actually written. `0` is returned (not an error) whenever the
	/// volume isn't mounted, the inumber is out of range or invalid, `offset` is past the
	/// inode's current size, or `length` is `0`. If the allocator runs out of blocks partway
	/// through, the blocks allocated so far (and the inode's new size) are persisted and the
	/// short count is returned.
	pub fn write(&mut self, inumber: u32, data: &[u8], length: usize, offset: usize) -> usize {
		let Ok(mut inode) = self.load_valid_inode(inumber) else {
			return 0;
		};
		let size = inode.size.max(0) as usize;
		if offset > size || length == 0 {
			return 0;
		}
		let length = length.min(data.len());
		let end = offset + length;

		let mut pos = offset;
		let mut written = 0usize;
		let mut indirect: Option<IndirectBlock> = None;
		let mut indirect_dirty = false;

		while pos < end {
			let bi = pos / BLOCK_SIZE;
			let bo = pos % BLOCK_SIZE;
			let ptr = match self.resolve_pointer_for_write(&mut inode, bi, &mut indirect, &mut indirect_dirty) {
				Ok(p) => p,
				Err(_) => break,
			};

			let take = (BLOCK_SIZE - bo).min(end - pos);
			let mut block = [0u8; BLOCK_SIZE];
			// Preserve the rest of the block when the write doesn't cover it entirely.
			if bo != 0 || take != BLOCK_SIZE {
				if self.device_mut().read_block(ptr as u32, &mut block).is_err() {
					break;
				}
			}
			block[bo..bo + take].copy_from_slice(&data[written..written + take]);
			if self.device_mut().write_block(ptr as u32, &block).is_err() {
				break;
			}

			pos += take;
			written += take;
		}

		if written > 0 {
			inode.size = inode.size.max((offset + written) as i32);
		}
		if indirect_dirty {
			if let Some(ib) = &indirect {
				let buf = layout::encode_indirect(ib);
				let _ = self.device_mut().write_block(inode.indirect as u32, &buf);
			}
		}
		let _ = self.store_inode_record(inumber, &inode);

		written
	}

	/// Resolves the data-block pointer for block index `bi` without allocating; returns `None`
	/// on a device error, `Some(0)` for a hole (stop the caller's loop).
	fn resolve_pointer_for_read(
		&mut self,
		inode: &InodeRecord,
		bi: usize,
		indirect_cache: &mut Option<IndirectBlock>,
	) -> Option<i32> {
		if bi < POINTERS_PER_INODE {
			return Some(inode.direct[bi]);
		}
		let idx = bi - POINTERS_PER_INODE;
		if idx >= POINTERS_PER_BLOCK {
			return Some(0);
		}
		if inode.indirect == 0 {
			return Some(0);
		}
		if indirect_cache.is_none() {
			let mut buf = [0u8; BLOCK_SIZE];
			if self
				.device_mut()
				.read_block(inode.indirect as u32, &mut buf)
				.is_err()
			{
				return None;
			}
			*indirect_cache = Some(layout::decode_indirect(&buf));
		}
		Some(indirect_cache.as_ref().unwrap().pointers[idx])
	}

	/// Resolves (allocating as needed) the data-block pointer for block index `bi`, mutating
	/// `inode`'s direct/indirect fields and `indirect_cache` in place.
	fn resolve_pointer_for_write(
		&mut self,
		inode: &mut InodeRecord,
		bi: usize,
		indirect_cache: &mut Option<IndirectBlock>,
		indirect_dirty: &mut bool,
	) -> crate::error::Result<i32> {
		if bi < POINTERS_PER_INODE {
			if inode.direct[bi] == 0 {
				let b = self.alloc_block()?;
				inode.direct[bi] = b as i32;
			}
			return Ok(inode.direct[bi]);
		}

		let idx = bi - POINTERS_PER_INODE;
		if idx >= POINTERS_PER_BLOCK {
			return Err(Error::OutOfSpace);
		}

		if inode.indirect == 0 {
			let b = self.alloc_block()?;
			inode.indirect = b as i32;
			let empty = IndirectBlock::empty();
			let buf = layout::encode_indirect(&empty);
			self.device_mut().write_block(b, &buf)?;
		}
		if indirect_cache.is_none() {
			let mut buf = [0u8; BLOCK_SIZE];
			self.device_mut()
				.read_block(inode.indirect as u32, &mut buf)?;
			*indirect_cache = Some(layout::decode_indirect(&buf));
		}
		let ib = indirect_cache.as_mut().unwrap();
		if ib.pointers[idx] == 0 {
			let b = self.alloc_block()?;
			ib.pointers[idx] = b as i32;
			*indirect_dirty = true;
		}
		Ok(ib.pointers[idx])
	}
}

#[cfg(test)]
mod tests {
	use crate::device::MemDevice;
	use crate::layout::BLOCK_SIZE;
	use crate::volume::Volume;

	fn fresh(blocks: u32) -> Volume<MemDevice> {
		let mut vol = Volume::new(MemDevice::new(blocks));
		vol.format().unwrap();
		vol.mount().unwrap();
		vol
	}

	#[test]
	fn small_write_then_read_round_trips() {
		let mut vol = fresh(100);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		let written = vol.write(i, b"hello", 5, 0);
		assert_eq!(written, 5);

		let mut buf = [0u8; 5];
		let read = vol.read(i, &mut buf, 5, 0);
		assert_eq!(read, 5);
		assert_eq!(&buf, b"hello");
	}

	#[test]
	fn write_crossing_a_block_boundary_allocates_two_direct_blocks() {
		let mut vol = fresh(100);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		let len = BLOCK_SIZE + 10;
		let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
		let written = vol.write(i, &data, len, 0);
		assert_eq!(written, len);

		let mut buf = vec![0u8; len];
		let read = vol.read(i, &mut buf, len, 0);
		assert_eq!(read, len);
		assert_eq!(buf, data);

		let inode = vol.load_valid_inode(i).unwrap();
		assert_ne!(inode.direct[0], 0);
		assert_ne!(inode.direct[1], 0);
		assert_eq!(inode.direct[2], 0);
	}

	#[test]
	fn write_past_direct_region_allocates_indirect_block() {
		let mut vol = fresh(2000);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		let len = 6 * BLOCK_SIZE;
		let data = vec![0x42u8; len];
		let written = vol.write(i, &data, len, 0);
		assert_eq!(written, len);

		let inode = vol.load_valid_inode(i).unwrap();
		for d in inode.direct {
			assert_ne!(d, 0);
		}
		assert_ne!(inode.indirect, 0);
	}

	#[test]
	fn write_beyond_size_fails() {
		let mut vol = fresh(20);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		assert_eq!(vol.write(i, b"abc", 3, 10), 0);
	}

	#[test]
	fn write_preserves_already_allocated_blocks_under_overwrite() {
		let mut vol = fresh(100);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		assert_eq!(vol.write(i, b"0123456789", 10, 0), 10);
		assert_eq!(vol.write(i, b"XY", 2, 2), 2);

		let mut buf = [0u8; 10];
		vol.read(i, &mut buf, 10, 0);
		assert_eq!(&buf, b"01XY456789");
	}

	#[test]
	fn out_of_space_yields_a_short_write_and_persists_progress() {
		let mut vol = fresh(20);
		let i = vol.alloc_inode().unwrap().unwrap();
		vol.store_inode_record(i, &crate::layout::InodeRecord::new_empty())
			.unwrap();

		let len = 40 * BLOCK_SIZE;
		let data = vec![0x7u8; len];
		let written = vol.write(i, &data, len, 0);
		assert!(written < len);
		assert!(written > 0);

		let inode = vol.load_valid_inode(i).unwrap();
		assert_eq!(inode.size as usize, written);
	}
}

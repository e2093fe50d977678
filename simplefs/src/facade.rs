//! The filesystem facade: the seven operations a shell invokes, plus `unmount`.
//!
//! [`Filesystem`] is a thin numeric-return wrapper around [`Volume`]: it owns the typed
//! `Result`/`Option` API at [`Volume`]'s level and converts to the classic return-code
//! convention (`1`/`0`, `-1`, byte counts) right at this boundary, per the "return-code error
//! signaling" design note: internals stay `Result`-based, only the edge speaks sentinels.

use crate::device::BlockDevice;
use crate::layout::InodeRecord;
use crate::volume::Volume;

/// A mounted-or-not filesystem handle over a block device, exposing the classic numeric API.
pub struct Filesystem<D: BlockDevice> {
	volume: Volume<D>,
}

impl<D: BlockDevice> Filesystem<D> {
	/// Wraps a block device. The filesystem starts unmounted.
	pub fn new(device: D) -> Self {
		Self {
			volume: Volume::new(device),
		}
	}

	/// Gives access to the underlying [`Volume`] for callers that want the typed API directly
	/// (e.g. `fs.volume_mut().is_mounted()`).
	pub fn volume_mut(&mut self) -> &mut Volume<D> {
		&mut self.volume
	}

	/// Formats the device. Returns `1` on success, `0` on failure (already mounted, or a
	/// device I/O error).
	pub fn format(&mut self) -> i32 {
		bool_to_i32(self.volume.format().is_ok())
	}

	/// Mounts the volume. Returns `1` on success, `0` on failure (already mounted, bad magic,
	/// or a device I/O error).
	pub fn mount(&mut self) -> i32 {
		bool_to_i32(self.volume.mount().is_ok())
	}

	/// Unmounts the volume. Returns `1` on success, `0` if it wasn't mounted.
	pub fn unmount(&mut self) -> i32 {
		bool_to_i32(self.volume.unmount().is_ok())
	}

	/// Returns a human-readable dump of the superblock and every valid inode, matching the
	/// shell's `debug` command. Never mutates disk or in-memory state; safe to call before
	/// mounting.
	pub fn debug(&mut self) -> String {
		crate::debug::render(&mut self.volume)
	}

	/// Creates a new, empty inode. Returns the inumber (>= 1) on success, or `0` if the volume
	/// isn't mounted or every inode slot is occupied.
	pub fn create(&mut self) -> i32 {
		let Ok(inumber) = self.volume.alloc_inode() else {
			return 0;
		};
		let Some(inumber) = inumber else {
			return 0;
		};
		if self
			.volume
			.store_inode_record(inumber, &InodeRecord::new_empty())
			.is_err()
		{
			// Roll back the allocation so the slot isn't leaked as "used" with no record.
			let _ = self.volume.free_inode(inumber);
			return 0;
		}
		inumber as i32
	}

	/// Destroys inode `inumber`, freeing every block it references. Idempotent: deleting an
	/// already-free inode returns success. Returns `1` on success, `0` on failure (not mounted,
	/// out-of-range inumber).
	pub fn delete(&mut self, inumber: i32) -> i32 {
		let Ok(inumber) = to_inumber(inumber) else {
			return 0;
		};
		bool_to_i32(self.delete_inner(inumber).is_ok())
	}

	fn delete_inner(&mut self, inumber: u32) -> crate::error::Result<()> {
		let inode = match self.volume.load_inode_record(inumber) {
			Ok(inode) => inode,
			Err(crate::error::Error::OutOfRangeInumber) => {
				return Err(crate::error::Error::OutOfRangeInumber)
			}
			Err(e) => return Err(e),
		};
		if !inode.is_valid() {
			// Already free: idempotent no-op success.
			return Ok(());
		}

		for &ptr in &inode.direct {
			if ptr != 0 {
				self.volume.free_block(ptr as u32)?;
			}
		}
		if inode.indirect != 0 {
			let mut buf = [0u8; crate::layout::BLOCK_SIZE];
			self.volume.device_mut().read_block(inode.indirect as u32, &mut buf)?;
			let ib = crate::layout::decode_indirect(&buf);
			for &ptr in &ib.pointers {
				if ptr != 0 {
					self.volume.free_block(ptr as u32)?;
				}
			}
			// Zero the pointer array so a freed indirect block never leaves stale pointers
			// lying around between formats.
			let empty = crate::layout::encode_indirect(&crate::layout::IndirectBlock::empty());
			self.volume.device_mut().write_block(inode.indirect as u32, &empty)?;
			self.volume.free_block(inode.indirect as u32)?;
		}

		self.volume
			.store_inode_record(inumber, &InodeRecord::free())?;
		self.volume.free_inode(inumber)?;
		Ok(())
	}

	/// Returns inode `inumber`'s size, or `-1` if not mounted, out of range, or invalid.
	pub fn getsize(&mut self, inumber: i32) -> i32 {
		let Ok(inumber) = to_inumber(inumber) else {
			return -1;
		};
		match self.volume.load_valid_inode(inumber) {
			Ok(inode) => inode.size,
			Err(_) => -1,
		}
	}

	/// Reads up to `length` bytes of inode `inumber` starting at `offset` into `buf`. Returns
	/// the number of bytes copied (`0` is not an error, see [`Volume::read`]).
	pub fn read(&mut self, inumber: i32, buf: &mut [u8], length: i32, offset: i32) -> i32 {
		let (Ok(inumber), Ok(length), Ok(offset)) =
			(to_inumber(inumber), to_usize(length), to_usize(offset))
		else {
			return 0;
		};
		self.volume.read(inumber, buf, length, offset) as i32
	}

	/// Writes up to `length` bytes from `buf` into inode `inumber` starting at `offset`.
	/// Returns the number of bytes written (a short count signals the allocator ran out of
	/// space).
	pub fn write(&mut self, inumber: i32, buf: &[u8], length: i32, offset: i32) -> i32 {
		let (Ok(inumber), Ok(length), Ok(offset)) =
			(to_inumber(inumber), to_usize(length), to_usize(offset))
		else {
			return 0;
		};
		self.volume.write(inumber, buf, length, offset) as i32
	}
}

fn bool_to_i32(ok: bool) -> i32 {
	if ok {
		1
	} else {
		0
	}
}

fn to_inumber(inumber: i32) -> Result<u32, ()> {
	u32::try_from(inumber).map_err(|_| ())
}

fn to_usize(n: i32) -> Result<usize, ()> {
	usize::try_from(n).map_err(|_| ())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	fn fresh(blocks: u32) -> Filesystem<MemDevice> {
		let mut fs = Filesystem::new(MemDevice::new(blocks));
		assert_eq!(fs.format(), 1);
		assert_eq!(fs.mount(), 1);
		fs
	}

	#[test]
	fn create_then_getsize_then_delete() {
		let mut fs = fresh(100);
		let i = fs.create();
		assert_eq!(i, 1);
		assert_eq!(fs.getsize(i), 0);
		assert_eq!(fs.delete(i), 1);
		assert_eq!(fs.getsize(i), -1);
	}

	#[test]
	fn delete_is_idempotent() {
		let mut fs = fresh(20);
		let i = fs.create();
		assert_eq!(fs.delete(i), 1);
		assert_eq!(fs.delete(i), 1);
	}

	#[test]
	fn format_on_mounted_volume_fails_and_does_not_touch_disk() {
		let mut fs = fresh(20);
		let i = fs.create();
		assert_eq!(fs.format(), 0);
		// Disk untouched: the inode created before the rejected format is still there.
		assert_eq!(fs.getsize(i), 0);
	}

	#[test]
	fn small_write_and_read() {
		let mut fs = fresh(100);
		let i = fs.create();
		assert_eq!(fs.write(i, b"hello", 5, 0), 5);
		assert_eq!(fs.getsize(i), 5);

		let mut buf = [0u8; 5];
		assert_eq!(fs.read(i, &mut buf, 5, 0), 5);
		assert_eq!(&buf, b"hello");
	}

	#[test]
	fn read_returns_zero_past_end_of_file() {
		let mut fs = fresh(20);
		let i = fs.create();
		let mut buf = [0u8; 4];
		assert_eq!(fs.read(i, &mut buf, 4, 0), 0);
	}

	#[test]
	fn getsize_and_read_fail_when_not_mounted() {
		let mut fs = Filesystem::new(MemDevice::new(20));
		assert_eq!(fs.getsize(1), -1);
		let mut buf = [0u8; 4];
		assert_eq!(fs.read(1, &mut buf, 4, 0), 0);
	}

	#[test]
	fn delete_out_of_range_inumber_fails() {
		let mut fs = fresh(20);
		assert_eq!(fs.delete(99999), 0);
		assert_eq!(fs.delete(-1), 0);
	}
}

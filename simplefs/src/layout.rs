//! On-disk layout constants and the codec between raw block buffers and typed records.
//!
//! Every integer on disk is a 32-bit value stored little-endian; this choice is fixed and
//! documented here rather than left to the platform's native order, so that two
//! implementations (or two runs on different architectures) produce byte-identical images.
//!
//! None of the decoding below reinterprets a block buffer in place (no `#[repr(C)]` union, no
//! `transmute`): the raw `[u8; BLOCK_SIZE]` is always the single source of truth, and typed
//! views are produced and consumed through explicit, safe `encode_*`/`decode_*` functions.

/// The size of a block, in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// The magic number identifying a formatted volume.
pub const FS_MAGIC: i32 = 0xF0F0_3410u32 as i32;

/// The number of direct pointers held by an inode.
pub const POINTERS_PER_INODE: usize = 5;

/// The size of one on-disk inode record, in bytes: `isvalid`, `size`, 5 direct pointers,
/// `indirect`.
pub const INODE_SIZE: usize = 4 * (2 + POINTERS_PER_INODE + 1);

/// The number of inode records packed into one inode block.
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// The number of pointers held by one indirect block.
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// The maximum number of bytes a single inode can hold.
pub const MAX_INODE_SIZE: u64 =
	(POINTERS_PER_INODE as u64 + POINTERS_PER_BLOCK as u64) * BLOCK_SIZE as u64;

/// The block holding the superblock.
pub const SUPERBLOCK_BLOCK: u32 = 0;

/// The in-memory view of the superblock (block 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
	/// Identifies a formatted volume; must equal [`FS_MAGIC`].
	pub magic: i32,
	/// Total number of blocks on the device.
	pub nblocks: i32,
	/// Number of blocks reserved for inodes, starting at block 1.
	pub ninodeblocks: i32,
	/// `ninodeblocks * INODES_PER_BLOCK`.
	pub ninodes: i32,
}

impl Superblock {
	/// Tells whether the magic number identifies a formatted volume.
	pub fn is_valid(&self) -> bool {
		self.magic == FS_MAGIC
	}

	/// The block index of the first data block, i.e. the first block past the inode blocks.
	pub fn first_data_block(&self) -> u32 {
		1 + self.ninodeblocks as u32
	}
}

/// The in-memory view of one on-disk inode record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeRecord {
	/// `0` if the slot is free, `1` if it holds a live inode.
	pub isvalid: i32,
	/// Total bytes held by the inode.
	pub size: i32,
	/// Direct data block pointers; `0` means unused.
	pub direct: [i32; POINTERS_PER_INODE],
	/// Indirect block pointer; `0` means none.
	pub indirect: i32,
}

impl InodeRecord {
	/// Returns a fresh, free inode record (all fields zero).
	pub const fn free() -> Self {
		Self {
			isvalid: 0,
			size: 0,
			direct: [0; POINTERS_PER_INODE],
			indirect: 0,
		}
	}

	/// Tells whether this record is in use.
	pub fn is_valid(&self) -> bool {
		self.isvalid != 0
	}

	/// Returns a fresh, valid, empty inode record (`isvalid = 1, size = 0`, no pointers), the
	/// state `create` writes for a newly allocated inode.
	pub const fn new_empty() -> Self {
		Self {
			isvalid: 1,
			size: 0,
			direct: [0; POINTERS_PER_INODE],
			indirect: 0,
		}
	}
}

/// The in-memory view of an indirect block: a flat array of data-block pointers.
#[derive(Clone, Copy)]
pub struct IndirectBlock {
	/// The pointer slots; `0` means unused.
	pub pointers: [i32; POINTERS_PER_BLOCK],
}

impl IndirectBlock {
	/// An indirect block with every pointer cleared.
	pub const fn empty() -> Self {
		Self {
			pointers: [0; POINTERS_PER_BLOCK],
		}
	}
}

/// Encodes a superblock into a fresh, zero-padded block buffer.
pub fn encode_superblock(sb: &Superblock) -> [u8; BLOCK_SIZE] {
	let mut buf = [0u8; BLOCK_SIZE];
	buf[0..4].copy_from_slice(&sb.magic.to_le_bytes());
	buf[4..8].copy_from_slice(&sb.nblocks.to_le_bytes());
	buf[8..12].copy_from_slice(&sb.ninodeblocks.to_le_bytes());
	buf[12..16].copy_from_slice(&sb.ninodes.to_le_bytes());
	buf
}

/// Decodes the superblock from block 0's buffer.
pub fn decode_superblock(buf: &[u8; BLOCK_SIZE]) -> Superblock {
	Superblock {
		magic: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
		nblocks: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
		ninodeblocks: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
		ninodes: i32::from_le_bytes(buf[12..16].try_into().unwrap()),
	}
}

/// Decodes the inode record stored at `slot` within an inode block's buffer.
///
/// Panics if `slot >= INODES_PER_BLOCK`; callers derive `slot` from layout arithmetic that
/// guarantees this never happens.
pub fn decode_inode(buf: &[u8; BLOCK_SIZE], slot: usize) -> InodeRecord {
	let off = slot * INODE_SIZE;
	let isvalid = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
	let size = i32::from_le_bytes(buf[off + 4..off + 8].try_into().unwrap());
	let mut direct = [0i32; POINTERS_PER_INODE];
	for (i, slot) in direct.iter_mut().enumerate() {
		let p = off + 8 + i * 4;
		*slot = i32::from_le_bytes(buf[p..p + 4].try_into().unwrap());
	}
	let indirect_off = off + 8 + POINTERS_PER_INODE * 4;
	let indirect = i32::from_le_bytes(buf[indirect_off..indirect_off + 4].try_into().unwrap());
	InodeRecord {
		isvalid,
		size,
		direct,
		indirect,
	}
}

/// Encodes `inode` into the slot `slot` of an inode block's buffer, leaving the rest of the
/// buffer untouched.
pub fn encode_inode_into(buf: &mut [u8; BLOCK_SIZE], slot: usize, inode: &InodeRecord) {
	let off = slot * INODE_SIZE;
	buf[off..off + 4].copy_from_slice(&inode.isvalid.to_le_bytes());
	buf[off + 4..off + 8].copy_from_slice(&inode.size.to_le_bytes());
	for (i, ptr) in inode.direct.iter().enumerate() {
		let p = off + 8 + i * 4;
		buf[p..p + 4].copy_from_slice(&ptr.to_le_bytes());
	}
	let indirect_off = off + 8 + POINTERS_PER_INODE * 4;
	buf[indirect_off..indirect_off + 4].copy_from_slice(&inode.indirect.to_le_bytes());
}

/// Decodes an indirect block from its buffer.
pub fn decode_indirect(buf: &[u8; BLOCK_SIZE]) -> IndirectBlock {
	let mut pointers = [0i32; POINTERS_PER_BLOCK];
	for (i, slot) in pointers.iter_mut().enumerate() {
		let p = i * 4;
		*slot = i32::from_le_bytes(buf[p..p + 4].try_into().unwrap());
	}
	IndirectBlock { pointers }
}

/// Encodes an indirect block into a fresh buffer.
pub fn encode_indirect(ib: &IndirectBlock) -> [u8; BLOCK_SIZE] {
	let mut buf = [0u8; BLOCK_SIZE];
	for (i, ptr) in ib.pointers.iter().enumerate() {
		let p = i * 4;
		buf[p..p + 4].copy_from_slice(&ptr.to_le_bytes());
	}
	buf
}

/// Returns `(block, slot)` locating inumber `inumber` within the inode-block region.
pub fn inode_location(inumber: u32) -> (u32, usize) {
	let block = 1 + inumber / INODES_PER_BLOCK as u32;
	let slot = (inumber % INODES_PER_BLOCK as u32) as usize;
	(block, slot)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constants_match_the_classic_geometry() {
		assert_eq!(INODES_PER_BLOCK, 128);
		assert_eq!(POINTERS_PER_BLOCK, 1024);
		assert_eq!(INODE_SIZE, 32);
	}

	#[test]
	fn superblock_round_trips() {
		let sb = Superblock {
			magic: FS_MAGIC,
			nblocks: 100,
			ninodeblocks: 10,
			ninodes: 1280,
		};
		let buf = encode_superblock(&sb);
		assert_eq!(decode_superblock(&buf), sb);
	}

	#[test]
	fn inode_round_trips_at_every_slot() {
		let mut buf = [0u8; BLOCK_SIZE];
		let inode = InodeRecord {
			isvalid: 1,
			size: 12345,
			direct: [1, 2, 3, 0, 0],
			indirect: 42,
		};
		encode_inode_into(&mut buf, 7, &inode);
		assert_eq!(decode_inode(&buf, 7), inode);
		// Untouched slots stay free.
		assert_eq!(decode_inode(&buf, 0), InodeRecord::free());
		assert_eq!(decode_inode(&buf, 8), InodeRecord::free());
	}

	#[test]
	fn indirect_block_round_trips() {
		let mut ib = IndirectBlock::empty();
		ib.pointers[0] = 99;
		ib.pointers[1023] = 100;
		let buf = encode_indirect(&ib);
		let decoded = decode_indirect(&buf);
		assert_eq!(decoded.pointers[0], 99);
		assert_eq!(decoded.pointers[1023], 100);
		assert_eq!(decoded.pointers[500], 0);
	}

	#[test]
	fn inode_location_matches_spec_formula() {
		assert_eq!(inode_location(0), (1, 0));
		assert_eq!(inode_location(1), (1, 1));
		assert_eq!(inode_location(127), (1, 127));
		assert_eq!(inode_location(128), (2, 0));
	}
}

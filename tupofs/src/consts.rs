//! Fixed on-disk constants for the TupoFS format.

/// The size in bytes of one sector of the backing store. One sector holds
/// exactly one inode record.
pub const SECTOR_SIZE: usize = 2048;

/// The size in bytes of an inode record, equal to one sector.
pub const INODE_RECORD_SIZE: usize = SECTOR_SIZE;

/// The size in bytes of the variant payload of an inode record, i.e. the
/// record minus its 32-byte common header.
pub const INODE_DATA_PAYLOAD: usize = 2016;

/// The number of data-block indices a file inode can hold.
pub const MAX_BLOCKS_PER_FILE: usize = 503;

/// The number of directory entries a directory inode can hold.
pub const MAX_DIR_CHILDREN: usize = 62;

/// The largest byte size a file can have.
pub const MAX_FILE_SIZE: u64 = (SECTOR_SIZE * MAX_BLOCKS_PER_FILE) as u64;

/// The index of the root directory's inode.
pub const ROOT_INODE_INDEX: u32 = 1;

/// The default size in bytes of each bitmap (one sector), giving
/// `8 * 2048 = 16384` inodes and the same number of data blocks.
pub const DEFAULT_BITMAP_SIZE_BYTES: u32 = SECTOR_SIZE as u32;

/// The maximum number of components an absolute path may have.
pub const PATH_MAX_COMPONENTS: usize = 50;

/// The length in bytes of a directory entry's name field, including the
/// terminating NUL where the name is shorter than the field.
pub const DIRENT_NAME_SIZE: usize = 28;

/// The on-disk magic identifying a TupoFS image: `\0\x13\x37\0TupoFS` followed
/// by zero padding, 16 bytes total.
pub const MAGIC: [u8; 16] = *b"\x00\x13\x37\x00TupoFS\x00\x00\x00\x00\x00\x00";

/// Sector index of the superblock.
pub const SUPERBLOCK_SECTOR: u64 = 0;
/// Sector index of the inode bitmap.
pub const INODE_BITMAP_SECTOR: u64 = 1;
/// Sector index of the data bitmap.
pub const DATA_BITMAP_SECTOR: u64 = 2;
/// Sector index at which the inode table begins.
pub const INODE_TABLE_START_SECTOR: u64 = 3;

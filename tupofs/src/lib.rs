//! TupoFS: a toy single-volume filesystem stored inside a single host file.
//!
//! The crate is organized the way `ext2.rs` lays out its own format: fixed
//! on-disk constants ([`consts`]), a sector-addressable backing store
//! ([`block_device`]), the superblock ([`superblock`]), the two bitmap
//! allocators ([`bitmap`], [`inode_store`], [`data_store`]), the inode
//! record itself ([`inode`]), path resolution ([`path`]), and finally the
//! operations a caller actually wants ([`fs`]).

mod bitmap;
mod block_device;
mod consts;
mod data_store;
mod error;
mod fs;
mod inode;
mod inode_store;
mod path;
mod superblock;
mod util;

pub use block_device::BlockDevice;
pub use consts::{
    DIRENT_NAME_SIZE, MAX_BLOCKS_PER_FILE, MAX_DIR_CHILDREN, MAX_FILE_SIZE, PATH_MAX_COMPONENTS,
    ROOT_INODE_INDEX, SECTOR_SIZE,
};
pub use error::{LegacyCode, Result, TfsError};
pub use fs::{Filesystem, FormatOptions};
pub use inode::{DirEntry, Inode, InodeKind};
pub use inode_store::NewInodeType;
pub use path::Path;
pub use superblock::Superblock;

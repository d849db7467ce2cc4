//! The inode record: a sector-sized tagged union of Free, Directory and
//! File variants.
//!
//! `spec.md` §9 is explicit that this is a tagged variant serialized into a
//! fixed layout, not an inheritance hierarchy — a discriminator byte plus an
//! overlapping payload region is the wire format, exactly as `TFS_Inode` is
//! a C union behind a `type` tag. The byte-level (de)serialization follows
//! the same raw-pointer-free approach `fill_bitmap`/`BlockGroupDescriptor`
//! use in `ext2.rs`: read into a plain buffer, then pack/unpack fields by
//! hand, since our payload (a directory entry list or a `Vec<u32>`) isn't a
//! `#[repr(C)]`-able fixed-size type the way ext2's fixed-array inode is.

use crate::consts::{DIRENT_NAME_SIZE, INODE_RECORD_SIZE, MAX_BLOCKS_PER_FILE, MAX_DIR_CHILDREN};
use crate::error::{Result, TfsError};

const TYPE_OFFSET: usize = 0;
const INODE_IDX_OFFSET: usize = 28;
const PAYLOAD_OFFSET: usize = 32;

const TYPE_FREE: u8 = 0;
const TYPE_DIR: u8 = 1;
const TYPE_FILE: u8 = 2;

/// One entry of a directory's children list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_idx: u32,
    pub name: String,
}

/// The type-specific payload of an inode record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    Free,
    Directory { children: Vec<DirEntry> },
    File { file_size: u32, used_blocks: Vec<u32> },
}

impl InodeKind {
    pub fn is_free(&self) -> bool {
        matches!(self, InodeKind::Free)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, InodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, InodeKind::File { .. })
    }
}

/// A full inode record, value-typed and copied in and out of the backing
/// store — the store is the only owner of persistent state (§9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub inode_idx: u32,
    pub kind: InodeKind,
}

impl Inode {
    /// Builds a fresh, empty directory inode.
    pub fn new_directory(inode_idx: u32) -> Self {
        Self {
            inode_idx,
            kind: InodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    /// Builds a fresh, empty file inode.
    pub fn new_file(inode_idx: u32) -> Self {
        Self {
            inode_idx,
            kind: InodeKind::File {
                file_size: 0,
                used_blocks: Vec::new(),
            },
        }
    }

    /// Builds a free inode record preserving its own index, as written at
    /// format time.
    pub fn new_free(inode_idx: u32) -> Self {
        Self {
            inode_idx,
            kind: InodeKind::Free,
        }
    }

    /// Serializes the record into a sector-sized buffer, zero-padding
    /// anything the variant doesn't use.
    pub fn to_bytes(&self) -> [u8; INODE_RECORD_SIZE] {
        let mut buf = [0u8; INODE_RECORD_SIZE];
        let (ty, _) = match &self.kind {
            InodeKind::Free => (TYPE_FREE, ()),
            InodeKind::Directory { .. } => (TYPE_DIR, ()),
            InodeKind::File { .. } => (TYPE_FILE, ()),
        };
        buf[TYPE_OFFSET] = ty;
        buf[INODE_IDX_OFFSET..INODE_IDX_OFFSET + 4]
            .copy_from_slice(&(self.inode_idx as i32).to_ne_bytes());

        match &self.kind {
            InodeKind::Free => {}
            InodeKind::Directory { children } => {
                let payload = &mut buf[PAYLOAD_OFFSET..];
                payload[0..4].copy_from_slice(&(children.len() as i32).to_ne_bytes());
                for (i, entry) in children.iter().enumerate() {
                    let off = 4 + i * 32;
                    payload[off..off + 4].copy_from_slice(&(entry.inode_idx as i32).to_ne_bytes());
                    let name_bytes = entry.name.as_bytes();
                    // §6.1 allows a name field that is either NUL-terminated
                    // or exactly DIRENT_NAME_SIZE bytes with no terminator.
                    let n = name_bytes.len().min(DIRENT_NAME_SIZE);
                    payload[off + 4..off + 4 + n].copy_from_slice(&name_bytes[..n]);
                    // Any remaining bytes of the field are already zero,
                    // giving a NUL terminator for shorter names.
                }
            }
            InodeKind::File {
                file_size,
                used_blocks,
            } => {
                let payload = &mut buf[PAYLOAD_OFFSET..];
                payload[0..4].copy_from_slice(&(*file_size as i32).to_ne_bytes());
                for (i, &block) in used_blocks.iter().enumerate() {
                    let off = 4 + i * 4;
                    payload[off..off + 4].copy_from_slice(&(block as i32).to_ne_bytes());
                }
            }
        }

        buf
    }

    /// Parses a sector-sized buffer back into an inode record.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len(), INODE_RECORD_SIZE);
        let ty = buf[TYPE_OFFSET];
        let inode_idx =
            i32::from_ne_bytes(buf[INODE_IDX_OFFSET..INODE_IDX_OFFSET + 4].try_into().unwrap())
                as u32;
        let payload = &buf[PAYLOAD_OFFSET..];

        let kind = match ty {
            TYPE_FREE => InodeKind::Free,
            TYPE_DIR => {
                let children_cnt =
                    i32::from_ne_bytes(payload[0..4].try_into().unwrap()).max(0) as usize;
                let children_cnt = children_cnt.min(MAX_DIR_CHILDREN);
                let mut children = Vec::with_capacity(children_cnt);
                for i in 0..children_cnt {
                    let off = 4 + i * 32;
                    let idx =
                        i32::from_ne_bytes(payload[off..off + 4].try_into().unwrap()) as u32;
                    let name_bytes = &payload[off + 4..off + 4 + DIRENT_NAME_SIZE];
                    let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
                    let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();
                    children.push(DirEntry {
                        inode_idx: idx,
                        name,
                    });
                }
                InodeKind::Directory { children }
            }
            TYPE_FILE => {
                let file_size =
                    i32::from_ne_bytes(payload[0..4].try_into().unwrap()).max(0) as u32;
                let block_cnt = crate::util::ceil_div(file_size as u64, crate::consts::SECTOR_SIZE as u64)
                    as usize;
                let block_cnt = block_cnt.min(MAX_BLOCKS_PER_FILE);
                let mut used_blocks = Vec::with_capacity(block_cnt);
                for i in 0..block_cnt {
                    let off = 4 + i * 4;
                    let block = i32::from_ne_bytes(payload[off..off + 4].try_into().unwrap()) as u32;
                    used_blocks.push(block);
                }
                InodeKind::File {
                    file_size,
                    used_blocks,
                }
            }
            other => {
                return Err(TfsError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("unknown inode type tag {other}"),
                )))
            }
        };

        Ok(Self { inode_idx, kind })
    }
}

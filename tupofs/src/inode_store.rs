//! Maps an inode index to its on-disk record, allocating and freeing
//! entries through the inode bitmap.
//!
//! Sector math follows `TFS_Driver_GetInodeBlockIdx`: inode `i` (`i >= 1`)
//! lives at sector `3 + (i - 1)`.

use crate::bitmap::Bitmap;
use crate::block_device::BlockDevice;
use crate::consts::{INODE_BITMAP_SECTOR, INODE_TABLE_START_SECTOR};
use crate::error::{Result, TfsError};
use crate::inode::Inode;
use std::io::{Read, Seek, Write};

/// The type of a newly allocated inode. `Free` is not a valid argument to
/// [`InodeStore::allocate`] — that's the state an inode starts and ends in,
/// never one it's created into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewInodeType {
    Directory,
    File,
}

pub struct InodeStore {
    inode_map_size_bytes: u32,
}

impl InodeStore {
    pub fn new(inode_map_size_bytes: u32) -> Self {
        Self {
            inode_map_size_bytes,
        }
    }

    fn sector_for(inode_idx: u32) -> u64 {
        debug_assert!(inode_idx >= 1);
        INODE_TABLE_START_SECTOR + (inode_idx - 1) as u64
    }

    pub(crate) fn read_bitmap<S: Read + Write + Seek>(&self, dev: &mut BlockDevice<S>) -> Result<Bitmap> {
        let mut buf = vec![0u8; self.inode_map_size_bytes as usize];
        // The bitmap occupies one sector on disk, zero-padded beyond its
        // declared size; read the full sector, then keep only the prefix.
        let mut sector = BlockDevice::<S>::sector_buf();
        dev.read_sector(INODE_BITMAP_SECTOR, &mut sector)?;
        let len = buf.len();
        buf.copy_from_slice(&sector[..len]);
        Ok(Bitmap::from_bytes(buf))
    }

    fn write_bitmap<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        bitmap: &Bitmap,
    ) -> Result<()> {
        let mut sector = BlockDevice::<S>::sector_buf();
        sector[..bitmap.as_bytes().len()].copy_from_slice(bitmap.as_bytes());
        dev.write_sector(INODE_BITMAP_SECTOR, &sector)?;
        Ok(())
    }

    /// Reads inode `i`. Postcondition: the returned record's `inode_idx`
    /// equals `i`.
    pub fn get<S: Read + Write + Seek>(&self, dev: &mut BlockDevice<S>, i: u32) -> Result<Inode> {
        let mut sector = BlockDevice::<S>::sector_buf();
        dev.read_sector(Self::sector_for(i), &mut sector)?;
        let inode = Inode::from_bytes(&sector)?;
        debug_assert_eq!(inode.inode_idx, i, "on-disk inode index mismatch");
        Ok(inode)
    }

    /// Writes inode `i`'s record.
    pub fn put<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        i: u32,
        inode: &Inode,
    ) -> Result<()> {
        let bytes = inode.to_bytes();
        dev.write_sector(Self::sector_for(i), &bytes)?;
        Ok(())
    }

    /// Scans the inode bitmap for the first free index.
    pub fn find_free<S: Read + Write + Seek>(&self, dev: &mut BlockDevice<S>) -> Result<u32> {
        let bitmap = self.read_bitmap(dev)?;
        let free = bitmap.find_free(1)?;
        Ok(free[0] as u32 + 1)
    }

    /// Finds a free inode, initializes it for `ty`, writes the record and
    /// flips its bitmap bit.
    pub fn allocate<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        ty: NewInodeType,
    ) -> Result<Inode> {
        let idx = self.find_free(dev)?;
        let inode = match ty {
            NewInodeType::Directory => Inode::new_directory(idx),
            NewInodeType::File => Inode::new_file(idx),
        };
        self.put(dev, idx, &inode)?;

        let mut bitmap = self.read_bitmap(dev)?;
        bitmap.set((idx - 1) as usize, true);
        self.write_bitmap(dev, &bitmap)?;

        log::debug!("allocated inode {idx} as {ty:?}");
        Ok(inode)
    }

    /// Clears inode `i`'s bitmap bit and rewrites its record as `Free`,
    /// preserving `inode_idx`.
    pub fn free<S: Read + Write + Seek>(&self, dev: &mut BlockDevice<S>, i: u32) -> Result<()> {
        let mut bitmap = self.read_bitmap(dev)?;
        if !bitmap.get((i - 1) as usize)? {
            return Err(TfsError::NotFound);
        }
        bitmap.set((i - 1) as usize, false);
        self.write_bitmap(dev, &bitmap)?;

        self.put(dev, i, &Inode::new_free(i))?;
        log::debug!("freed inode {i}");
        Ok(())
    }

    /// Preloads every inode record's own index, as done once at format
    /// time so that `get(i).inode_idx == i` always holds.
    pub fn preload_indices<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        inode_count: u32,
    ) -> Result<()> {
        for i in 1..=inode_count {
            self.put(dev, i, &Inode::new_free(i))?;
        }
        Ok(())
    }
}

//! Maps a data-block index to its sector, and gives callers direct access
//! to the data bitmap.
//!
//! `spec.md` §4.4 is explicit that allocation is not a primitive of this
//! component: the file writer finds free bits in the data bitmap itself,
//! writes the blocks, then flips the bits — `DataStore` only supplies the
//! sector arithmetic and the bitmap I/O those callers need.

use crate::bitmap::Bitmap;
use crate::block_device::BlockDevice;
use crate::consts::DATA_BITMAP_SECTOR;
use crate::error::Result;
use std::io::{Read, Seek, Write};

pub struct DataStore {
    inode_map_size_bytes: u32,
    data_map_size_bytes: u32,
}

impl DataStore {
    pub fn new(inode_map_size_bytes: u32, data_map_size_bytes: u32) -> Self {
        Self {
            inode_map_size_bytes,
            data_map_size_bytes,
        }
    }

    fn sector_for(&self, data_idx: u32) -> u64 {
        debug_assert!(data_idx >= 1);
        crate::consts::INODE_TABLE_START_SECTOR
            + 8 * self.inode_map_size_bytes as u64
            + (data_idx - 1) as u64
    }

    /// Reads data block `d` in full.
    pub fn get<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        d: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        dev.read_sector(self.sector_for(d), buf)?;
        Ok(())
    }

    /// Writes data block `d` in full.
    pub fn put<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        d: u32,
        buf: &[u8],
    ) -> Result<()> {
        dev.write_sector(self.sector_for(d), buf)?;
        Ok(())
    }

    /// Reads the data bitmap.
    pub fn read_bitmap<S: Read + Write + Seek>(&self, dev: &mut BlockDevice<S>) -> Result<Bitmap> {
        let mut buf = vec![0u8; self.data_map_size_bytes as usize];
        let mut sector = BlockDevice::<S>::sector_buf();
        dev.read_sector(DATA_BITMAP_SECTOR, &mut sector)?;
        let len = buf.len();
        buf.copy_from_slice(&sector[..len]);
        Ok(Bitmap::from_bytes(buf))
    }

    /// Writes the data bitmap back.
    pub fn write_bitmap<S: Read + Write + Seek>(
        &self,
        dev: &mut BlockDevice<S>,
        bitmap: &Bitmap,
    ) -> Result<()> {
        let mut sector = BlockDevice::<S>::sector_buf();
        sector[..bitmap.as_bytes().len()].copy_from_slice(bitmap.as_bytes());
        dev.write_sector(DATA_BITMAP_SECTOR, &sector)?;
        Ok(())
    }
}

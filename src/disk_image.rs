//! the flat image buffer and its fixed regions
use std::{fmt, fs::OpenOptions, ops::Range, path::Path};

use byte_unit::Byte;
use log::{info, warn};
use memmap2::MmapMut;

use crate::fs::{
    FsError, Result, BLOCK_BITMAP_BLOCK, BLOCK_SIZE, BOOT_BLOCKS, DATA_START, FS_START,
    GROUP_DESC_BLOCK, IMAGE_SIZE, INODE_BITMAP_BLOCK, INODE_TABLE_START, SUPERBLOCK_BLOCK,
    TOTAL_SECTORS,
};

/// a fixed block range of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Boot,
    Kernel,
    SuperBlock,
    GroupDescriptor,
    InodeBitmap,
    BlockBitmap,
    InodeTable,
    Data,
}

impl Region {
    /// every region in image order
    pub const ALL: [Region; 8] = [
        Region::Boot,
        Region::Kernel,
        Region::SuperBlock,
        Region::GroupDescriptor,
        Region::InodeBitmap,
        Region::BlockBitmap,
        Region::InodeTable,
        Region::Data,
    ];

    /// block range of this region
    pub const fn blocks(self) -> Range<u32> {
        match self {
            Region::Boot => 0..BOOT_BLOCKS,
            Region::Kernel => BOOT_BLOCKS..FS_START,
            Region::SuperBlock => SUPERBLOCK_BLOCK..GROUP_DESC_BLOCK,
            Region::GroupDescriptor => GROUP_DESC_BLOCK..INODE_BITMAP_BLOCK,
            Region::InodeBitmap => INODE_BITMAP_BLOCK..BLOCK_BITMAP_BLOCK,
            Region::BlockBitmap => BLOCK_BITMAP_BLOCK..INODE_TABLE_START,
            Region::InodeTable => INODE_TABLE_START..DATA_START,
            Region::Data => DATA_START..TOTAL_SECTORS,
        }
    }

    /// byte range of this region
    pub fn bytes(self) -> Range<usize> {
        let Range { start, end } = self.blocks();
        start as usize * BLOCK_SIZE as usize..end as usize * BLOCK_SIZE as usize
    }

    pub fn len(self) -> usize {
        self.bytes().len()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Region::Boot => "bootloader",
            Region::Kernel => "kernel",
            Region::SuperBlock => "superblock",
            Region::GroupDescriptor => "group descriptor",
            Region::InodeBitmap => "inode bitmap",
            Region::BlockBitmap => "block bitmap",
            Region::InodeTable => "inode table",
            Region::Data => "data",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// read-only views of the filesystem regions
#[derive(Debug, Clone, Copy)]
pub struct FsRegions<'a> {
    pub superblock: &'a [u8],
    pub group_descriptor: &'a [u8],
    pub inode_bitmap: &'a [u8],
    pub block_bitmap: &'a [u8],
    pub inode_table: &'a [u8],
    pub data: &'a [u8],
}

/// disjoint mutable views of the filesystem regions
#[derive(Debug)]
pub struct FsRegionsMut<'a> {
    pub superblock: &'a mut [u8],
    pub group_descriptor: &'a mut [u8],
    pub inode_bitmap: &'a mut [u8],
    pub block_bitmap: &'a mut [u8],
    pub inode_table: &'a mut [u8],
    pub data: &'a mut [u8],
}

/// take the next `len` bytes off the front of `rest`
fn carve<'a>(rest: &mut &'a mut [u8], len: usize) -> &'a mut [u8] {
    let (head, tail) = std::mem::take(rest).split_at_mut(len);
    *rest = tail;
    head
}

/// the whole raw image, `TOTAL_SECTORS` blocks of `BLOCK_SIZE` bytes
#[derive(Clone, PartialEq, Eq)]
pub struct DiskImage {
    bytes: Vec<u8>,
}

impl fmt::Debug for DiskImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskImage")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl Default for DiskImage {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskImage {
    /// a zero-filled image
    pub fn new() -> Self {
        DiskImage {
            bytes: vec![0u8; IMAGE_SIZE as usize],
        }
    }

    /// adopt an existing buffer of exactly the image size
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() as u64 != IMAGE_SIZE {
            return Err(FsError::ImageSize {
                actual: bytes.len(),
                expected: IMAGE_SIZE as usize,
            });
        }
        Ok(DiskImage { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn region(&self, region: Region) -> &[u8] {
        &self.bytes[region.bytes()]
    }

    pub fn region_mut(&mut self, region: Region) -> &mut [u8] {
        &mut self.bytes[region.bytes()]
    }

    /// one block by absolute block number
    pub fn block(&self, block: u32) -> Option<&[u8]> {
        let start = block as usize * BLOCK_SIZE as usize;
        self.bytes.get(start..start + BLOCK_SIZE as usize)
    }

    /// whether no byte of the filesystem area has been written yet
    pub fn fs_area_is_zeroed(&self) -> bool {
        self.bytes[Region::SuperBlock.bytes().start..]
            .iter()
            .all(|b| *b == 0)
    }

    pub fn regions(&self) -> FsRegions<'_> {
        FsRegions {
            superblock: self.region(Region::SuperBlock),
            group_descriptor: self.region(Region::GroupDescriptor),
            inode_bitmap: self.region(Region::InodeBitmap),
            block_bitmap: self.region(Region::BlockBitmap),
            inode_table: self.region(Region::InodeTable),
            data: self.region(Region::Data),
        }
    }

    pub fn regions_mut(&mut self) -> FsRegionsMut<'_> {
        let mut rest = &mut self.bytes[Region::SuperBlock.bytes().start..];
        FsRegionsMut {
            superblock: carve(&mut rest, Region::SuperBlock.len()),
            group_descriptor: carve(&mut rest, Region::GroupDescriptor.len()),
            inode_bitmap: carve(&mut rest, Region::InodeBitmap.len()),
            block_bitmap: carve(&mut rest, Region::BlockBitmap.len()),
            inode_table: carve(&mut rest, Region::InodeTable.len()),
            data: carve(&mut rest, Region::Data.len()),
        }
    }

    /// write the image to `path`
    /// # Params
    /// - `path`: the image file to create
    /// - `overwrite`: replace an existing file instead of failing
    pub fn persist<P>(&self, path: P, overwrite: bool) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if overwrite {
            if path.exists() {
                warn!("overwriting existing image {}", path.display());
            }
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(path)?;
        file.set_len(IMAGE_SIZE)?;

        // Safety
        // the file was just created or truncated by us and is not shared,
        // the map lives only until the end of this function
        let mut file_mmap_area = unsafe { MmapMut::map_mut(&file)? };
        file_mmap_area.copy_from_slice(&self.bytes);
        file_mmap_area.flush()?;
        info!(
            "wrote {} to {}",
            Byte::from_bytes(IMAGE_SIZE as u128).get_appropriate_unit(true),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{ErrorKind, DATA_BLOCK_COUNT, INODE_TABLE_BLOCKS, KERNEL_BLOCKS};

    #[test]
    fn test_regions_tile_the_image() {
        let mut next = 0;
        for region in Region::ALL {
            assert_eq!(region.blocks().start, next, "{region} is not contiguous");
            next = region.blocks().end;
        }
        assert_eq!(next, TOTAL_SECTORS);
        assert_eq!(Region::Kernel.blocks().len(), KERNEL_BLOCKS as usize);
        assert_eq!(Region::InodeTable.blocks().len(), INODE_TABLE_BLOCKS as usize);
        assert_eq!(Region::Data.blocks().len(), DATA_BLOCK_COUNT as usize);
    }

    #[test]
    fn test_regions_mut_match_regions() {
        let mut image = DiskImage::new();
        {
            let regions = image.regions_mut();
            regions.superblock[0] = 1;
            regions.group_descriptor[0] = 2;
            regions.inode_bitmap[0] = 3;
            regions.block_bitmap[0] = 4;
            regions.inode_table[0] = 5;
            regions.data[0] = 6;
            assert_eq!(regions.data.len(), Region::Data.len());
        }
        let regions = image.regions();
        assert_eq!(regions.superblock[0], 1);
        assert_eq!(regions.group_descriptor[0], 2);
        assert_eq!(regions.inode_bitmap[0], 3);
        assert_eq!(regions.block_bitmap[0], 4);
        assert_eq!(regions.inode_table[0], 5);
        assert_eq!(regions.data[0], 6);
        assert_eq!(image.block(DATA_START).unwrap()[0], 6);
        assert!(image.block(TOTAL_SECTORS).is_none());
    }

    #[test]
    fn test_from_bytes_checks_size() {
        let err = DiskImage::from_bytes(vec![0u8; 512]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let mut bytes = vec![0u8; IMAGE_SIZE as usize];
        bytes[0] = 0xeb;
        let image = DiskImage::from_bytes(bytes).unwrap();
        assert_eq!(image.region(Region::Boot)[0], 0xeb);
        assert_eq!(image.into_bytes().len() as u64, IMAGE_SIZE);
    }

    #[test]
    fn test_fs_area_is_zeroed() {
        let mut image = DiskImage::new();
        image.region_mut(Region::Kernel).fill(0x90);
        assert!(image.fs_area_is_zeroed());
        image.region_mut(Region::Data)[17] = 1;
        assert!(!image.fs_area_is_zeroed());
    }

    #[test]
    fn test_persist() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("disk.bin");
        let mut image = DiskImage::new();
        image.region_mut(Region::Boot)[510] = 0x55;

        image.persist(&path, false)?;
        assert_eq!(std::fs::read(&path)?, image.as_bytes());

        // refuses to clobber unless asked
        let err = image.persist(&path, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        image.region_mut(Region::Boot)[511] = 0xaa;
        image.persist(&path, true)?;
        assert_eq!(std::fs::read(&path)?[511], 0xaa);
        Ok(())
    }
}

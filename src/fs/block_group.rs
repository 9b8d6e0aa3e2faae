use bincode::{Decode, Encode};

use crate::utils::traits::OnDiskRecord;

use super::{
    BLOCK_BITMAP_BLOCK, BLOCK_SIZE, DATA_BLOCK_COUNT, INODE_BITMAP_BLOCK, INODE_COUNT,
    INODE_TABLE_START,
};

/// flag byte of an allocated inode or data block
const OCCUPIED: u8 = 1;

/// locates the bitmaps and the inode table of the only group,
/// its free counts mirror the [SuperBlock](super::SuperBlock)
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct GroupDescriptor {
    pub inode_bitmap: u32,
    pub block_bitmap: u32,
    pub inode_table: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
}

impl GroupDescriptor {
    pub fn new() -> Self {
        Self {
            inode_bitmap: INODE_BITMAP_BLOCK,
            block_bitmap: BLOCK_BITMAP_BLOCK,
            inode_table: INODE_TABLE_START,
            free_blocks: DATA_BLOCK_COUNT,
            free_inodes: INODE_COUNT,
        }
    }
}

impl OnDiskRecord for GroupDescriptor {
    const SLOT_SIZE: usize = BLOCK_SIZE as usize;
}

/// the allocation bitmaps of one group, viewed straight from the image
#[derive(Debug)]
pub struct Group<'a> {
    inode_bitmap: &'a mut [u8],
    data_bitmap: &'a mut [u8],
}

impl<'a> Group<'a> {
    /// one flag byte per inode / data block,
    /// bytes past `INODE_COUNT` / `DATA_BLOCK_COUNT` are ignored
    pub fn new(inode_bitmap: &'a mut [u8], data_bitmap: &'a mut [u8]) -> Self {
        let inodes = inode_bitmap.len().min(INODE_COUNT as usize);
        let blocks = data_bitmap.len().min(DATA_BLOCK_COUNT as usize);
        Group {
            inode_bitmap: &mut inode_bitmap[..inodes],
            data_bitmap: &mut data_bitmap[..blocks],
        }
    }
}

/// for inode and data block allocation
impl Group<'_> {
    /// check if inode is allocated
    /// # Params
    /// - `i`: inode index, start at 0
    #[cfg(test)]
    pub(crate) fn has_inode(&self, i: usize) -> bool {
        self.inode_bitmap.get(i).is_some_and(|flag| *flag != 0)
    }

    /// check if data block is allocated
    /// # Params
    /// - `i`: data block index, start at 0
    #[cfg(test)]
    pub(crate) fn has_data_block(&self, i: usize) -> bool {
        self.data_bitmap.get(i).is_some_and(|flag| *flag != 0)
    }

    /// calculate the number of free inodes
    pub fn free_inodes(&self) -> usize {
        self.inode_bitmap.iter().filter(|flag| **flag == 0).count()
    }

    /// calculate the number of free data blocks
    pub fn free_data_blocks(&self) -> usize {
        self.data_bitmap.iter().filter(|flag| **flag == 0).count()
    }

    /// allocate the first free inode
    pub fn allocate_inode(&mut self) -> Option<usize> {
        self.next_free_inode().inspect(|index| {
            self.inode_bitmap[*index] = OCCUPIED;
        })
    }

    /// allocate the first free data block
    pub fn allocate_data_block(&mut self) -> Option<usize> {
        self.next_free_data_block().inspect(|index| {
            self.data_bitmap[*index] = OCCUPIED;
        })
    }

    // linear scan from 0
    fn next_free_inode(&self) -> Option<usize> {
        self.inode_bitmap.iter().position(|flag| *flag == 0)
    }

    fn next_free_data_block(&self) -> Option<usize> {
        self.data_bitmap.iter().position(|flag| *flag == 0)
    }
}

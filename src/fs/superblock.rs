use bincode::{Decode, Encode};

use crate::utils::traits::OnDiskRecord;

use super::{BLOCK_SIZE, DATA_BLOCK_COUNT, INODE_COUNT, TOTAL_SECTORS};

type InodeCountType = u32;
type BlockCountType = u32;
/// The superblock of this filesystem,
/// the kernel reads it field by field from block `FS_START`
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct SuperBlock {
    /// blocks of the whole image, payload regions included
    pub sector_count: u32,
    pub inode_count: InodeCountType,
    pub block_count: BlockCountType,
    pub free_inodes: InodeCountType,
    pub free_blocks: BlockCountType,
    /// data block size
    pub block_size: u32,
    pub blocks_per_group: BlockCountType,
    pub inodes_per_group: InodeCountType,
}

impl SuperBlock {
    /// a superblock describing an empty single-group filesystem
    pub fn new() -> Self {
        Self {
            sector_count: TOTAL_SECTORS,
            inode_count: INODE_COUNT,
            block_count: DATA_BLOCK_COUNT,
            free_inodes: INODE_COUNT,
            free_blocks: DATA_BLOCK_COUNT,
            block_size: BLOCK_SIZE,
            blocks_per_group: DATA_BLOCK_COUNT,
            inodes_per_group: INODE_COUNT,
        }
    }
}

impl OnDiskRecord for SuperBlock {
    const SLOT_SIZE: usize = BLOCK_SIZE as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superblock_layout() {
        let mut block = vec![0u8; BLOCK_SIZE as usize];
        let superblock = SuperBlock::new();
        assert_eq!(superblock.write_into(&mut block).unwrap(), 32);
        // sector count then inode count, little-endian u32
        assert_eq!(&block[0..4], &TOTAL_SECTORS.to_le_bytes());
        assert_eq!(&block[4..8], &INODE_COUNT.to_le_bytes());
        assert_eq!(&block[20..24], &BLOCK_SIZE.to_le_bytes());
        assert!(block[32..].iter().all(|b| *b == 0));
        assert_eq!(SuperBlock::read_from(&block).unwrap(), superblock);
    }
}

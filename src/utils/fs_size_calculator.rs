//! This module contains functions to calculate the size of different fs components

use crate::fs::{DIRENT_SIZE, INODE_SIZE};

/// calculate how many blocks a byte-per-entry bitmap needs
/// # Arguments
/// - `element_count`: the number of inodes or data blocks tracked
/// - `block_size`: the block size of the image
/// # Return
/// the number of blocks the bitmap occupies
/// # Example
/// ```
/// use initfs::utils::fs_size_calculator::bitmap_blocks;
/// assert_eq!(bitmap_blocks(512, 512), 1);
/// assert_eq!(bitmap_blocks(513, 512), 2);
/// ```
pub const fn bitmap_blocks(element_count: u32, block_size: u32) -> u32 {
    element_count.div_ceil(block_size)
}

/// calculate needed Inode Table size in blocks
/// # Arguments
/// - `inode_count`: the number of inodes
/// - `block_size`: the block size of the image
/// # Return
/// the number of blocks of the Inode Table
/// # Example
/// ```
/// use initfs::utils::fs_size_calculator::inode_table_blocks;
/// use initfs::INODE_SIZE;
/// let block_size = 512;
/// let table_blocks = inode_table_blocks(512, block_size);
/// assert_eq!(table_blocks, 512 * INODE_SIZE / block_size);
/// ```
pub const fn inode_table_blocks(inode_count: u32, block_size: u32) -> u32 {
    (inode_count * INODE_SIZE).div_ceil(block_size)
}

/// how many inode slots one block holds
pub const fn inodes_per_block(block_size: u32) -> u32 {
    block_size / INODE_SIZE
}

/// calculate how many directory entries fit in one data block
/// # Example
/// ```
/// use initfs::utils::fs_size_calculator::dirents_per_block;
/// assert_eq!(dirents_per_block(512), 8);
/// ```
pub const fn dirents_per_block(block_size: u32) -> u32 {
    block_size / DIRENT_SIZE
}

/// byte length of an image made of `sectors` blocks
pub const fn image_size(sectors: u32, block_size: u32) -> u64 {
    sectors as u64 * block_size as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::*;

    #[test]
    fn test_geometry_is_consistent() {
        assert_eq!(inode_table_blocks(INODE_COUNT, BLOCK_SIZE), INODE_TABLE_BLOCKS);
        assert_eq!(bitmap_blocks(INODE_COUNT, BLOCK_SIZE), 1);
        assert_eq!(bitmap_blocks(DATA_BLOCK_COUNT, BLOCK_SIZE), 1);
        assert_eq!(inodes_per_block(BLOCK_SIZE), 4);
        assert_eq!(FS_START, 201);
        assert_eq!(INODE_TABLE_START, 205);
        assert_eq!(DATA_START, 333);
        assert_eq!(TOTAL_SECTORS, 845);
        assert_eq!(image_size(TOTAL_SECTORS, BLOCK_SIZE), 845 * 512);
    }
}

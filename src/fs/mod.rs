//! the on-image filesystem: geometry, records and the builder
pub mod block_group;
pub mod error;
pub mod filekind;
pub mod fs_layout;
pub mod inode;
pub mod superblock;
mod directory;
pub use block_group::*;
pub use directory::*;
pub use error::*;
pub use filekind::*;
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

use crate::utils::fs_size_calculator::{
    bitmap_blocks, dirents_per_block, image_size, inode_table_blocks, inodes_per_block,
};

/// index into the inode table
pub type InodeIndex = u32;
/// index into the data region, block 0 is the first block after the inode table
pub type BlockIndex = u32;

pub const BLOCK_SIZE: u32 = 512;
/// blocks reserved for the bootloader payload at the start of the image
pub const BOOT_BLOCKS: u32 = 1;
/// blocks reserved for the kernel payload right after the bootloader
pub const KERNEL_BLOCKS: u32 = 200;

pub const FS_START: u32 = BOOT_BLOCKS + KERNEL_BLOCKS;
pub const SUPERBLOCK_BLOCK: u32 = FS_START;
pub const GROUP_DESC_BLOCK: u32 = FS_START + 1;
pub const INODE_BITMAP_BLOCK: u32 = FS_START + 2;
pub const BLOCK_BITMAP_BLOCK: u32 = FS_START + 3;
pub const INODE_TABLE_START: u32 = FS_START + 4;

pub const INODE_SIZE: u32 = 128;
pub const INODE_COUNT: u32 = 512;
pub const INODE_TABLE_BLOCKS: u32 = inode_table_blocks(INODE_COUNT, BLOCK_SIZE);

pub const DATA_START: u32 = INODE_TABLE_START + INODE_TABLE_BLOCKS;
pub const DATA_BLOCK_COUNT: u32 = 512;
pub const TOTAL_SECTORS: u32 = DATA_START + DATA_BLOCK_COUNT;
pub const IMAGE_SIZE: u64 = image_size(TOTAL_SECTORS, BLOCK_SIZE);

pub const ROOT_INODE: InodeIndex = 0;
pub const DIRECT_POINTERS: usize = 12;
pub const DIRENT_SIZE: u32 = 64;
/// name bytes of a directory entry, the last one is always NUL
pub const NAME_LEN: usize = 60;
pub const DIRENTS_PER_BLOCK: u32 = dirents_per_block(BLOCK_SIZE);

/// on-image value of an absent block pointer or parent
pub const ABSENT: u32 = u32::MAX;

// one flag byte per inode and per data block, each bitmap fits its single block
const _: () = assert!(
    bitmap_blocks(INODE_COUNT, BLOCK_SIZE) == 1 && bitmap_blocks(DATA_BLOCK_COUNT, BLOCK_SIZE) == 1
);
// inode slots and entries never straddle a block
const _: () = assert!(inodes_per_block(BLOCK_SIZE) * INODE_SIZE == BLOCK_SIZE);
const _: () = assert!(BLOCK_SIZE % DIRENT_SIZE == 0);

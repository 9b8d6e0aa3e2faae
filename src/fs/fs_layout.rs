//! building the filesystem inside the image buffer
//!
//! The image goes through one lifecycle:
//! [ImageBuilder] (payloads only) --`format`--> [FsBuilder] (create/list)
//! --`finalize`--> [DiskImage].

use log::{debug, info};

use crate::{
    disk_image::{DiskImage, Region},
    utils::{
        path::{components, split_file_name},
        traits::OnDiskRecord,
    },
};

use super::{
    directory::{validate_name, DirEntry},
    error::{ErrorKind, FsError, Result},
    BlockIndex, FileKind, Group, GroupDescriptor, Inode, InodeIndex, SuperBlock, BLOCK_SIZE,
    DATA_BLOCK_COUNT, DIRECT_POINTERS, DIRENTS_PER_BLOCK, DIRENT_SIZE, INODE_COUNT, INODE_SIZE,
    ROOT_INODE,
};

const BLOCK_SIZE_USIZE: usize = BLOCK_SIZE as usize;

/// an image whose filesystem area is not written yet
#[derive(Debug, Default)]
pub struct ImageBuilder {
    image: DiskImage,
}

impl ImageBuilder {
    /// start from a zero-filled image
    pub fn begin() -> Self {
        Self::default()
    }

    /// start from an existing buffer, e.g. one already holding payloads
    pub fn with_image(image: DiskImage) -> Self {
        ImageBuilder { image }
    }

    /// copy a bootloader or kernel payload to the start of its region
    /// # Return
    /// the number of blocks the payload touches
    pub fn load_payload(&mut self, region: Region, payload: &[u8]) -> Result<usize> {
        if !matches!(region, Region::Boot | Region::Kernel) {
            return Err(FsError::InvalidRegion(region));
        }
        let area = self.image.region_mut(region);
        if payload.len() > area.len() {
            return Err(FsError::PayloadTooLarge {
                region: region.name(),
                size: payload.len(),
                capacity: area.len(),
            });
        }
        area[..payload.len()].copy_from_slice(payload);
        let blocks = payload.len().div_ceil(BLOCK_SIZE_USIZE);
        info!("read {blocks} block(s) into the {region} region");
        Ok(blocks)
    }

    /// give the buffer back, payloads included
    pub fn into_image(self) -> DiskImage {
        self.image
    }

    /// lay out superblock, group descriptor, bitmaps, inode table and the root directory
    ///
    /// Fails with [FsError::AlreadyFormatted] if anything was written
    /// past the kernel region. The builder comes back inside the [FormatError]
    /// with its image untouched.
    pub fn format(self) -> std::result::Result<FsBuilder, FormatError> {
        if !self.image.fs_area_is_zeroed() {
            return Err(FormatError {
                source: FsError::AlreadyFormatted,
                builder: self,
            });
        }
        let mut fs = FsBuilder { image: self.image };
        match fs.lay_out() {
            Ok(root) => {
                info!("formatted filesystem, root directory on inode {root}");
                Ok(fs)
            }
            Err(source) => Err(FormatError {
                source,
                builder: ImageBuilder { image: fs.image },
            }),
        }
    }
}

/// a refused or failed [ImageBuilder::format]
#[derive(Debug, thiserror::Error)]
#[error("image could not be formatted")]
pub struct FormatError {
    source: FsError,
    builder: ImageBuilder,
}

impl FormatError {
    pub fn error(&self) -> &FsError {
        &self.source
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// the builder that was handed to `format`
    pub fn into_builder(self) -> ImageBuilder {
        self.builder
    }
}

/// a formatted image being populated,
/// owning the buffer makes it the only writer
#[derive(Debug)]
pub struct FsBuilder {
    image: DiskImage,
}

/// get [SuperBlock], [GroupDescriptor] and [Inode]s of this filesystem
impl FsBuilder {
    pub fn superblock(&self) -> Result<SuperBlock> {
        SuperBlock::read_from(self.image.regions().superblock)
    }

    pub fn group_descriptor(&self) -> Result<GroupDescriptor> {
        GroupDescriptor::read_from(self.image.regions().group_descriptor)
    }

    pub fn image(&self) -> &DiskImage {
        &self.image
    }

    /// decode inode `index` from the inode table
    pub fn inode(&self, index: InodeIndex) -> Result<Inode> {
        let slot = Self::inode_slot(index)?;
        Inode::read_from(&self.image.regions().inode_table[slot..])
    }

    fn write_inode(&mut self, index: InodeIndex, inode: &Inode) -> Result<()> {
        let slot = Self::inode_slot(index)?;
        inode.write_into(&mut self.image.regions_mut().inode_table[slot..])?;
        Ok(())
    }

    #[inline]
    fn inode_slot(index: InodeIndex) -> Result<usize> {
        if index >= INODE_COUNT {
            return Err(FsError::InvalidInode(index));
        }
        Ok(index as usize * INODE_SIZE as usize)
    }

    // byte offset of entry `slot` inside data block `block`
    #[inline]
    fn entry_offset(block: BlockIndex, slot: u32) -> Result<usize> {
        if block >= DATA_BLOCK_COUNT {
            return Err(FsError::InvalidBlock(block));
        }
        Ok(block as usize * BLOCK_SIZE_USIZE + (slot * DIRENT_SIZE) as usize)
    }

    fn write_entry(&mut self, block: BlockIndex, slot: u32, entry: &DirEntry) -> Result<()> {
        let offset = Self::entry_offset(block, slot)?;
        entry.write_into(&mut self.image.regions_mut().data[offset..])?;
        debug!("entry {:?} -> {:?} at block {block} slot {slot}", entry.name, entry.inode);
        Ok(())
    }

    /// the first `inode.size` entries of a directory, in slot order
    fn entries(&self, inode: &Inode) -> Result<Vec<DirEntry>> {
        let data = self.image.regions().data;
        let mut remaining = inode.size as usize;
        let mut entries = Vec::with_capacity(remaining);
        for block in inode.direct_blocks() {
            for slot in 0..DIRENTS_PER_BLOCK {
                if remaining == 0 {
                    return Ok(entries);
                }
                let offset = Self::entry_offset(block, slot)?;
                entries.push(DirEntry::read_from(&data[offset..])?);
                remaining -= 1;
            }
        }
        Ok(entries)
    }
}

/// inode and data block allocation
impl FsBuilder {
    // write the fixed records and the root directory into a zeroed area
    fn lay_out(&mut self) -> Result<InodeIndex> {
        let regions = self.image.regions_mut();
        SuperBlock::new().write_into(regions.superblock)?;
        GroupDescriptor::new().write_into(regions.group_descriptor)?;

        // root takes inode 0 and data block 0
        let root = self.allocate_inode()?;
        let block = self.allocate_block()?;
        if root != ROOT_INODE || block != 0 {
            return Err(FsError::Corrupted(format!(
                "root landed on inode {root} block {block}"
            )));
        }
        let mut inode = Inode::new(FileKind::Directory);
        inode.add_block(block, 0);
        inode.size = 2;
        self.write_entry(block, 0, &DirEntry::new(".", Some(root)))?;
        self.write_entry(block, 1, &DirEntry::new("..", None))?;
        self.write_inode(root, &inode)?;
        Ok(root)
    }

    /// allocate the first free inode
    pub fn allocate_inode(&mut self) -> Result<InodeIndex> {
        let mut superblock = self.superblock()?;
        let mut descriptor = self.group_descriptor()?;
        let regions = self.image.regions_mut();
        let mut group = Group::new(regions.inode_bitmap, regions.block_bitmap);
        if group.free_inodes() == 0 {
            return Err(FsError::InodesExhausted);
        }
        superblock.free_inodes = superblock
            .free_inodes
            .checked_sub(1)
            .ok_or_else(|| FsError::Corrupted("superblock free inodes out of sync".into()))?;
        descriptor.free_inodes = superblock.free_inodes;
        let index = group.allocate_inode().ok_or(FsError::InodesExhausted)? as InodeIndex;
        superblock.write_into(regions.superblock)?;
        descriptor.write_into(regions.group_descriptor)?;
        debug!("allocated inode {index}, {} left", superblock.free_inodes);
        Ok(index)
    }

    /// allocate the first free data block
    pub fn allocate_block(&mut self) -> Result<BlockIndex> {
        let mut superblock = self.superblock()?;
        let mut descriptor = self.group_descriptor()?;
        let regions = self.image.regions_mut();
        let mut group = Group::new(regions.inode_bitmap, regions.block_bitmap);
        if group.free_data_blocks() == 0 {
            return Err(FsError::BlocksExhausted);
        }
        superblock.free_blocks = superblock
            .free_blocks
            .checked_sub(1)
            .ok_or_else(|| FsError::Corrupted("superblock free blocks out of sync".into()))?;
        descriptor.free_blocks = superblock.free_blocks;
        let index = group
            .allocate_data_block()
            .ok_or(FsError::BlocksExhausted)? as BlockIndex;
        superblock.write_into(regions.superblock)?;
        descriptor.write_into(regions.group_descriptor)?;
        debug!("allocated data block {index}, {} left", superblock.free_blocks);
        Ok(index)
    }
}

/// path resolution, creation and listing
impl FsBuilder {
    /// walk `path` from the root directory down to its inode,
    /// the empty path is the root
    pub fn resolve(&self, path: &str) -> Result<InodeIndex> {
        let mut index = ROOT_INODE;
        for name in components(path)? {
            let current = self.inode(index)?;
            if !current.is_dir() {
                return Err(FsError::NotFound(path.to_owned()));
            }
            index = self
                .entries(&current)?
                .into_iter()
                .find(|entry| entry.name == name)
                .and_then(|entry| entry.inode)
                .ok_or_else(|| FsError::NotFound(path.to_owned()))?;
        }
        Ok(index)
    }

    /// create an empty directory holding "." and ".."
    pub fn create_directory(&mut self, path: &str) -> Result<InodeIndex> {
        self.create(path, FileKind::Directory)
    }

    /// create an empty regular file, it owns no data block
    pub fn create_file(&mut self, path: &str) -> Result<InodeIndex> {
        self.create(path, FileKind::RegularFile)
    }

    fn create(&mut self, path: &str, kind: FileKind) -> Result<InodeIndex> {
        // check everything before the first write, a failed create changes nothing
        let (parent_path, name) = split_file_name(path)?;
        validate_name(name)?;
        let parent_index = self.resolve(parent_path)?;
        let mut parent = self.inode(parent_index)?;
        if !parent.is_dir() {
            return Err(FsError::NotADirectory(parent_path.to_owned()));
        }
        if self.entries(&parent)?.iter().any(|entry| entry.name == name) {
            return Err(FsError::AlreadyExists(path.to_owned()));
        }

        let slot = parent.size;
        let pointer_index = (slot / DIRENTS_PER_BLOCK) as usize;
        let offset = slot % DIRENTS_PER_BLOCK;
        if pointer_index >= DIRECT_POINTERS {
            return Err(FsError::DirectoryFull(parent_path.to_owned()));
        }
        let parent_block = parent.find_direct_block(pointer_index);
        let blocks_needed =
            u32::from(kind == FileKind::Directory) + u32::from(parent_block.is_none());
        let superblock = self.superblock()?;
        if superblock.free_inodes == 0 {
            return Err(FsError::InodesExhausted);
        }
        if superblock.free_blocks < blocks_needed {
            return Err(FsError::BlocksExhausted);
        }

        let index = self.allocate_inode()?;
        let mut inode = Inode::new(kind);
        if kind == FileKind::Directory {
            let block = self.allocate_block()?;
            inode.add_block(block, 0);
            inode.size = 2;
            self.write_entry(block, 0, &DirEntry::new(".", Some(index)))?;
            self.write_entry(block, 1, &DirEntry::new("..", Some(parent_index)))?;
        }
        self.write_inode(index, &inode)?;

        let parent_block = match parent_block {
            Some(block) => block,
            None => {
                let block = self.allocate_block()?;
                parent.add_block(block, pointer_index);
                debug!("directory {parent_path:?} grew to block {block}");
                block
            }
        };
        self.write_entry(parent_block, offset, &DirEntry::new(name, Some(index)))?;
        parent.size += 1;
        self.write_inode(parent_index, &parent)?;

        info!("created {kind:?} {path} on inode {index}");
        Ok(index)
    }

    /// names in directory `path`, in slot order
    pub fn list(&self, path: &str) -> Result<Listing> {
        let inode = self.inode(self.resolve(path)?)?;
        if !inode.is_dir() {
            return Err(FsError::NotADirectory(path.to_owned()));
        }
        Ok(Listing {
            entries: self.entries(&inode)?.into_iter(),
        })
    }

    /// check the counters against the bitmaps and hand the image back
    pub fn finalize(self) -> Result<DiskImage> {
        let superblock = self.superblock()?;
        let descriptor = self.group_descriptor()?;
        let regions = self.image.regions();
        let free_inodes = regions.inode_bitmap[..INODE_COUNT as usize]
            .iter()
            .filter(|flag| **flag == 0)
            .count() as u32;
        let free_blocks = regions.block_bitmap[..DATA_BLOCK_COUNT as usize]
            .iter()
            .filter(|flag| **flag == 0)
            .count() as u32;
        if (superblock.free_inodes, superblock.free_blocks) != (free_inodes, free_blocks)
            || (descriptor.free_inodes, descriptor.free_blocks) != (free_inodes, free_blocks)
        {
            return Err(FsError::Corrupted(format!(
                "free counters disagree with the bitmaps ({free_inodes} inodes, {free_blocks} blocks free)"
            )));
        }
        info!(
            "filesystem finalized: {} of {} inodes and {} of {} blocks in use",
            INODE_COUNT - free_inodes,
            INODE_COUNT,
            DATA_BLOCK_COUNT - free_blocks,
            DATA_BLOCK_COUNT
        );
        Ok(self.image)
    }
}

/// names of one directory, produced once in slot order
#[derive(Debug)]
pub struct Listing {
    entries: std::vec::IntoIter<DirEntry>,
}

impl Iterator for Listing {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.entries.next().map(|entry| entry.name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Listing {}

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

use crate::utils::traits::OnDiskRecord;

use super::{filekind::FileKind, BlockIndex, ABSENT, DIRECT_POINTERS, INODE_SIZE};

/// `None` for the on-image sentinel
pub(crate) fn pointer_from_raw(raw: u32) -> Option<u32> {
    (raw != ABSENT).then_some(raw)
}

pub(crate) fn pointer_to_raw(pointer: Option<u32>) -> u32 {
    pointer.unwrap_or(ABSENT)
}

/// field order of an inode slot, the rest of the slot is zero padding
#[derive(Encode, Decode)]
struct RawInode {
    kind: u32,
    link_count: u32,
    block_count: u32,
    size: u32,
    direct_blocks: [u32; DIRECT_POINTERS],
    indirect_block: u32,
    double_indirect_block: u32,
    triple_indirect_block: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inode {
    pub file_kind: FileKind,
    pub link_count: u32,
    /// data blocks owned by this inode
    pub block_count: u32,
    /// entry count for a directory, byte count for a file
    pub size: u32,
    pub direct_blocks: [Option<BlockIndex>; DIRECT_POINTERS],
    pub indirect_block: Option<BlockIndex>,
    pub double_indirect_block: Option<BlockIndex>,
    pub triple_indirect_block: Option<BlockIndex>,
}

impl Inode {
    /// an empty inode with one link and no blocks
    pub fn new(file_kind: impl Into<FileKind>) -> Self {
        Inode {
            file_kind: file_kind.into(),
            link_count: 1,
            ..Inode::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_kind == FileKind::Directory
    }

    #[cfg(test)]
    pub(crate) fn is_regular_file(&self) -> bool {
        self.file_kind == FileKind::RegularFile
    }

    /// direct blocks in pointer order, up to the first absent pointer
    pub fn direct_blocks(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.direct_blocks.iter().map_while(|pointer| *pointer)
    }

    pub fn find_direct_block(&self, index: usize) -> Option<BlockIndex> {
        self.direct_blocks.get(index).copied().flatten()
    }

    /// put `block` into direct pointer `index` and count it
    pub fn add_block(&mut self, block: BlockIndex, index: usize) -> Option<()> {
        let pointer = self.direct_blocks.get_mut(index)?;
        *pointer = Some(block);
        self.block_count += 1;
        Some(())
    }
}

impl From<&Inode> for RawInode {
    fn from(inode: &Inode) -> Self {
        RawInode {
            kind: inode.file_kind.to_raw(),
            link_count: inode.link_count,
            block_count: inode.block_count,
            size: inode.size,
            direct_blocks: inode.direct_blocks.map(pointer_to_raw),
            indirect_block: pointer_to_raw(inode.indirect_block),
            double_indirect_block: pointer_to_raw(inode.double_indirect_block),
            triple_indirect_block: pointer_to_raw(inode.triple_indirect_block),
        }
    }
}

impl From<RawInode> for Inode {
    fn from(raw: RawInode) -> Self {
        Inode {
            file_kind: FileKind::from_raw(raw.kind),
            link_count: raw.link_count,
            block_count: raw.block_count,
            size: raw.size,
            direct_blocks: raw.direct_blocks.map(pointer_from_raw),
            indirect_block: pointer_from_raw(raw.indirect_block),
            double_indirect_block: pointer_from_raw(raw.double_indirect_block),
            triple_indirect_block: pointer_from_raw(raw.triple_indirect_block),
        }
    }
}

impl Encode for Inode {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        RawInode::from(self).encode(encoder)
    }
}

impl<Context> Decode<Context> for Inode {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        <RawInode as Decode<Context>>::decode(decoder).map(Inode::from)
    }
}

impl OnDiskRecord for Inode {
    const SLOT_SIZE: usize = INODE_SIZE as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inode_slot_layout() {
        let mut slot = vec![0u8; INODE_SIZE as usize];
        let mut inode = Inode::new(FileKind::Directory);
        inode.size = 2;
        inode.add_block(0, 0).unwrap();
        assert_eq!(inode.write_into(&mut slot).unwrap(), 76);

        assert_eq!(&slot[0..4], &1u32.to_le_bytes());
        assert_eq!(&slot[4..8], &1u32.to_le_bytes());
        assert_eq!(&slot[8..12], &1u32.to_le_bytes());
        assert_eq!(&slot[12..16], &2u32.to_le_bytes());
        // first direct pointer then eleven absent ones
        assert_eq!(&slot[16..20], &0u32.to_le_bytes());
        assert!(slot[20..76].iter().all(|b| *b == 0xff));
        assert!(slot[76..].iter().all(|b| *b == 0));

        assert_eq!(Inode::read_from(&slot).unwrap(), inode);
    }

    #[test]
    fn test_direct_blocks_stop_at_first_absent() {
        let mut inode = Inode::new(FileKind::Directory);
        inode.add_block(4, 0).unwrap();
        inode.add_block(9, 1).unwrap();
        inode.add_block(7, 3).unwrap();
        assert_eq!(inode.direct_blocks().collect::<Vec<_>>(), vec![4, 9]);
        assert_eq!(inode.block_count, 3);
        assert_eq!(inode.find_direct_block(3), Some(7));
        assert_eq!(inode.find_direct_block(2), None);
        assert!(inode.add_block(1, DIRECT_POINTERS).is_none());
    }

    #[test]
    fn test_new_inode() {
        let inode = Inode::new(FileKind::RegularFile);
        assert!(inode.is_regular_file());
        assert!(!inode.is_dir());
        assert_eq!(inode.link_count, 1);
        assert_eq!(inode.size, 0);
        assert_eq!(inode.direct_blocks().count(), 0);
        assert_eq!(inode.indirect_block, None);
    }
}

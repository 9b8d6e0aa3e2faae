use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

use crate::utils::traits::OnDiskRecord;

use super::{
    error::{FsError, Result},
    inode::{pointer_from_raw, pointer_to_raw},
    InodeIndex, DIRENT_SIZE, NAME_LEN,
};

/// on-image shape of an entry: inode word then NUL padded name
#[derive(Encode, Decode)]
struct RawDirEntry {
    inode: u32,
    name: [u8; NAME_LEN],
}

/// a `(name, inode)` pair stored inside a directory block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// `None` only for the root's ".."
    pub inode: Option<InodeIndex>,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, inode: Option<InodeIndex>) -> Self {
        DirEntry {
            name: name.into(),
            inode,
        }
    }
}

/// check that `name` fits an entry and can be found again by a path walk
pub fn validate_name(name: &str) -> Result<()> {
    // one byte stays NUL for readers that use C strings
    if name.is_empty() || name.len() >= NAME_LEN || name.contains(['\0', '/']) {
        return Err(FsError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl From<&DirEntry> for RawDirEntry {
    fn from(entry: &DirEntry) -> Self {
        let mut name = [0u8; NAME_LEN];
        let len = entry.name.len().min(NAME_LEN - 1);
        name[..len].copy_from_slice(&entry.name.as_bytes()[..len]);
        RawDirEntry {
            inode: pointer_to_raw(entry.inode),
            name,
        }
    }
}

impl From<RawDirEntry> for DirEntry {
    fn from(raw: RawDirEntry) -> Self {
        let len = raw.name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        DirEntry {
            name: String::from_utf8_lossy(&raw.name[..len]).into_owned(),
            inode: pointer_from_raw(raw.inode),
        }
    }
}

impl Encode for DirEntry {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> std::result::Result<(), EncodeError> {
        RawDirEntry::from(self).encode(encoder)
    }
}

impl<Context> Decode<Context> for DirEntry {
    fn decode<D: Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> std::result::Result<Self, DecodeError> {
        <RawDirEntry as Decode<Context>>::decode(decoder).map(DirEntry::from)
    }
}

impl OnDiskRecord for DirEntry {
    const SLOT_SIZE: usize = DIRENT_SIZE as usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ErrorKind;

    #[test]
    fn test_dir_entry_layout() {
        let mut slot = vec![0u8; DIRENT_SIZE as usize];
        let entry = DirEntry::new("stdin", Some(5));
        assert_eq!(entry.write_into(&mut slot).unwrap(), DIRENT_SIZE as usize);
        assert_eq!(&slot[0..4], &5u32.to_le_bytes());
        assert_eq!(&slot[4..9], b"stdin");
        assert!(slot[9..].iter().all(|b| *b == 0));
        assert_eq!(DirEntry::read_from(&slot).unwrap(), entry);
    }

    #[test]
    fn test_root_parent_is_absent() {
        let mut slot = vec![0u8; DIRENT_SIZE as usize];
        DirEntry::new("..", None).write_into(&mut slot).unwrap();
        assert_eq!(&slot[0..4], &[0xff; 4]);
        assert_eq!(DirEntry::read_from(&slot).unwrap().inode, None);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("uMain.elf").is_ok());
        assert!(validate_name(&"x".repeat(NAME_LEN - 1)).is_ok());
        for bad in ["", "a/b", "nul\0", "x".repeat(NAME_LEN).as_str()] {
            let err = validate_name(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }
}

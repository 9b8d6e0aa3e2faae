/// an enum to describe the type of a file
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// an regular file
    RegularFile,
    /// a directory
    Directory,
    /// a slot that was never initialized
    #[default]
    Unknown,
}

impl FileKind {
    /// the `type` word stored in the inode
    pub const fn to_raw(self) -> u32 {
        match self {
            FileKind::Directory => 1,
            FileKind::RegularFile => 2,
            FileKind::Unknown => 0,
        }
    }

    /// unrecognized words are treated as [FileKind::Unknown]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => FileKind::Directory,
            2 => FileKind::RegularFile,
            _ => FileKind::Unknown,
        }
    }
}

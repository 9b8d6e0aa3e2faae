use std::fmt;

use bincode::error::{DecodeError, EncodeError};

use crate::disk_image::Region;

/// coarse classes a driver can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// no free inode, data block or directory pointer left
    ResourceExhausted,
    /// a path component does not exist
    NotFound,
    /// the request itself is malformed or does not fit the image
    InvalidArgument,
    /// host file error while persisting
    Io,
    /// the image disagrees with itself
    Corrupted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResourceExhausted => "resource exhausted",
            Self::NotFound => "not found",
            Self::InvalidArgument => "invalid argument",
            Self::Io => "i/o",
            Self::Corrupted => "corrupted",
        };
        f.write_str(name)
    }
}

/// errors of the image builder
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no free inode left")]
    InodesExhausted,
    #[error("no free data block left")]
    BlocksExhausted,
    #[error("directory {0:?} has used all of its direct pointers")]
    DirectoryFull(String),
    #[error("no such file or directory: {0:?}")]
    NotFound(String),
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("invalid entry name {0:?}")]
    InvalidName(String),
    #[error("{0:?} already exists")]
    AlreadyExists(String),
    #[error("{0:?} is not a directory")]
    NotADirectory(String),
    #[error("image already carries a filesystem")]
    AlreadyFormatted,
    #[error("the {0} region does not take a payload")]
    InvalidRegion(Region),
    #[error("payload of {size} bytes does not fit the {region} region ({capacity} bytes)")]
    PayloadTooLarge {
        region: &'static str,
        size: usize,
        capacity: usize,
    },
    #[error("image buffer is {actual} bytes, expected {expected}")]
    ImageSize { actual: usize, expected: usize },
    #[error("inode {0} is out of range")]
    InvalidInode(u32),
    #[error("data block {0} is out of range")]
    InvalidBlock(u32),
    #[error("image corrupted: {0}")]
    Corrupted(String),
    #[error("record encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("record decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("image i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InodesExhausted | Self::BlocksExhausted | Self::DirectoryFull(_) => {
                ErrorKind::ResourceExhausted
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidPath { .. }
            | Self::InvalidName(_)
            | Self::AlreadyExists(_)
            | Self::NotADirectory(_)
            | Self::AlreadyFormatted
            | Self::InvalidRegion(_)
            | Self::PayloadTooLarge { .. }
            | Self::ImageSize { .. }
            | Self::InvalidInode(_)
            | Self::InvalidBlock(_) => ErrorKind::InvalidArgument,
            Self::Io(_) => ErrorKind::Io,
            Self::Corrupted(_) | Self::Encode(_) | Self::Decode(_) => ErrorKind::Corrupted,
        }
    }
}

/// unified result of the image builder
pub type Result<T> = std::result::Result<T, FsError>;

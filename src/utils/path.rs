//! absolute path handling shared by resolve and create
use smallvec::SmallVec;

use crate::fs::{FsError, Result};

/// path components, most paths in an initial tree are shallow
pub type Components<'a> = SmallVec<[&'a str; 8]>;

/// split a path at its last `/` into (parent path, leaf name)
/// # Example
/// ```
/// use initfs::split_file_name;
/// assert_eq!(split_file_name("/dev/stdin").unwrap(), ("/dev", "stdin"));
/// assert_eq!(split_file_name("/sbin").unwrap(), ("", "sbin"));
/// assert!(split_file_name("sbin").is_err());
/// ```
pub fn split_file_name(path: &str) -> Result<(&str, &str)> {
    let separator = path.rfind('/').ok_or_else(|| FsError::InvalidPath {
        path: path.to_owned(),
        reason: "no parent separator",
    })?;
    Ok((&path[..separator], &path[separator + 1..]))
}

/// break an absolute path into its non-empty components,
/// the empty path means the root directory
pub fn components(path: &str) -> Result<Components<'_>> {
    if path.is_empty() {
        return Ok(Components::new());
    }
    let rest = path.strip_prefix('/').ok_or_else(|| FsError::InvalidPath {
        path: path.to_owned(),
        reason: "must start with '/'",
    })?;
    Ok(rest.split('/').filter(|c| !c.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ErrorKind;

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("/a/b/c").unwrap(), ("/a/b", "c"));
        assert_eq!(split_file_name("/").unwrap(), ("", ""));
        assert_eq!(split_file_name("/a/").unwrap(), ("/a", ""));
        let err = split_file_name("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_components() {
        assert!(components("").unwrap().is_empty());
        assert!(components("/").unwrap().is_empty());
        assert_eq!(components("/dev/stdin").unwrap().as_slice(), ["dev", "stdin"]);
        // repeated separators collapse like strtok
        assert_eq!(components("//usr///test/").unwrap().as_slice(), ["usr", "test"]);
        let err = components("dev/stdin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

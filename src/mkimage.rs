//! create our disk image: payloads, filesystem and the initial tree
use crate::{
    disk_image::{DiskImage, Region},
    fs::{FsBuilder, ImageBuilder},
    utils::digest::digest,
};
use anyhow::Context;
use log::info;
use std::path::{Path, PathBuf};

/// paths created right after formatting, directories first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSpec {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl TreeSpec {
    /// a tree with nothing but the root
    pub fn empty() -> Self {
        TreeSpec {
            directories: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl Default for TreeSpec {
    /// the tree the kernel expects to boot with
    fn default() -> Self {
        TreeSpec {
            directories: ["/sbin", "/dev", "/usr"].map(String::from).to_vec(),
            files: [
                "/sbin/uMain.elf",
                "/dev/stdin",
                "/dev/stdout",
                "/dev/stderr",
                "/usr/test",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// raw contents of the bootloader and kernel regions
#[derive(Debug, Clone, Default)]
pub struct Payloads {
    pub bootloader: Option<Vec<u8>>,
    pub kernel: Option<Vec<u8>>,
}

impl Payloads {
    /// read the payload files, a missing path leaves its region zeroed
    pub fn read(bootloader: Option<&Path>, kernel: Option<&Path>) -> anyhow::Result<Self> {
        let read = |path: Option<&Path>, what: &str| {
            path.map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("reading {what} from {}", path.display()))
            })
            .transpose()
        };
        Ok(Payloads {
            bootloader: read(bootloader, "bootloader")?,
            kernel: read(kernel, "kernel")?,
        })
    }
}

/// log the names in `path` the way `ls -a` would print them
fn log_listing(fs: &FsBuilder, path: &str) -> anyhow::Result<()> {
    let names: Vec<String> = fs
        .list(path)
        .with_context(|| format!("listing {path}"))?
        .collect();
    info!("{path}: {}", names.join(" "));
    Ok(())
}

/// build a complete image in memory
/// # Params
/// - `payloads`: bootloader and kernel bytes
/// - `tree`: directories and files to create after formatting
pub fn build_image(payloads: &Payloads, tree: &TreeSpec) -> anyhow::Result<DiskImage> {
    let mut builder = ImageBuilder::begin();
    for (region, payload) in [
        (Region::Boot, &payloads.bootloader),
        (Region::Kernel, &payloads.kernel),
    ] {
        if let Some(payload) = payload {
            builder
                .load_payload(region, payload)
                .with_context(|| format!("placing the {region} payload"))?;
        }
    }

    let mut fs = builder.format().context("formatting the image")?;
    for dir in &tree.directories {
        fs.create_directory(dir)
            .with_context(|| format!("creating directory {dir}"))?;
    }
    for file in &tree.files {
        fs.create_file(file)
            .with_context(|| format!("creating file {file}"))?;
    }

    log_listing(&fs, "/")?;
    for dir in &tree.directories {
        log_listing(&fs, dir)?;
    }
    Ok(fs.finalize()?)
}

/// options of one `mkimage` run
#[derive(Debug, Clone, Default)]
pub struct MkimageOptions {
    pub bootloader: Option<PathBuf>,
    pub kernel: Option<PathBuf>,
    pub tree: TreeSpec,
    /// replace an existing output file
    pub overwrite: bool,
}

/// build an image and write it to `output`
///
/// # Return
/// the blake3 digest of the written image
pub fn mkimage<P>(output: P, options: &MkimageOptions) -> anyhow::Result<blake3::Hash>
where
    P: AsRef<Path>,
{
    let output = output.as_ref();
    let payloads = Payloads::read(options.bootloader.as_deref(), options.kernel.as_deref())?;
    let image = build_image(&payloads, &options.tree)?;
    image
        .persist(output, options.overwrite)
        .with_context(|| format!("writing image to {}", output.display()))?;
    let hash = digest(&image);
    info!("image {} blake3 {hash}", output.display());
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{
        FileKind, FsError, Inode, DATA_BLOCK_COUNT, INODE_COUNT, INODE_SIZE, ROOT_INODE,
        SUPERBLOCK_BLOCK,
    };
    use crate::utils::traits::OnDiskRecord;

    // inodes handed out by the default tree, in creation order
    const SBIN: u32 = 1;
    const DEV: u32 = 2;
    const USR: u32 = 3;
    const UMAIN: u32 = 4;

    fn read_inode(image: &DiskImage, index: u32) -> Inode {
        let table = image.region(Region::InodeTable);
        Inode::read_from(&table[(index * INODE_SIZE) as usize..]).unwrap()
    }

    #[test]
    fn test_default_tree() {
        let tree = TreeSpec::default();
        assert_eq!(tree.directories, ["/sbin", "/dev", "/usr"]);
        assert_eq!(tree.files.len(), 5);
    }

    #[test]
    fn test_build_default_image() {
        let payloads = Payloads {
            bootloader: Some(vec![0xeb; 512]),
            kernel: Some(b"\x7fELF".to_vec()),
        };
        let image = build_image(&payloads, &TreeSpec::default()).unwrap();
        assert_eq!(image.region(Region::Boot), &[0xeb; 512]);
        assert_eq!(&image.region(Region::Kernel)[..4], b"\x7fELF");

        let root = read_inode(&image, ROOT_INODE);
        assert_eq!(root.size, 5);
        for dir in [SBIN, DEV, USR] {
            assert!(read_inode(&image, dir).is_dir());
        }
        let umain = read_inode(&image, UMAIN);
        assert_eq!(umain.file_kind, FileKind::RegularFile);
        assert_eq!(read_inode(&image, DEV).size, 5);
        // 9 inodes, 4 directory blocks
        let superblock = image.block(SUPERBLOCK_BLOCK).unwrap();
        assert_eq!(&superblock[12..16], &(INODE_COUNT - 9).to_le_bytes());
        assert_eq!(&superblock[16..20], &(DATA_BLOCK_COUNT - 4).to_le_bytes());
    }

    #[test]
    fn test_build_is_deterministic() {
        let payloads = Payloads::default();
        let first = build_image(&payloads, &TreeSpec::default()).unwrap();
        let second = build_image(&payloads, &TreeSpec::default()).unwrap();
        assert_eq!(digest(&first), digest(&second));
        let bare = build_image(&payloads, &TreeSpec::empty()).unwrap();
        assert_ne!(digest(&first), digest(&bare));
    }

    #[test]
    fn test_build_reports_bad_tree() {
        let tree = TreeSpec {
            directories: vec!["/a/b".into()],
            files: vec![],
        };
        let err = build_image(&Payloads::default(), &tree).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FsError>(),
            Some(FsError::NotFound(_))
        ));
        assert!(format!("{err:#}").contains("/a/b"));
    }

    #[test]
    fn test_mkimage() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = dir.path().join("kernel.bin");
        std::fs::write(&kernel, [0x90u8; 700])?;
        let output = dir.path().join("disk.img");
        let options = MkimageOptions {
            kernel: Some(kernel),
            ..MkimageOptions::default()
        };

        let hash = mkimage(&output, &options)?;
        let written = std::fs::read(&output)?;
        assert_eq!(blake3::hash(&written), hash);
        assert_eq!(written[512 + 699], 0x90);

        // existing output is kept unless overwriting
        assert!(mkimage(&output, &options).is_err());
        let options = MkimageOptions {
            overwrite: true,
            ..options
        };
        assert_eq!(mkimage(&output, &options)?, hash);
        Ok(())
    }

    #[test]
    fn test_missing_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = MkimageOptions {
            bootloader: Some(dir.path().join("nope.bin")),
            ..MkimageOptions::default()
        };
        let err = mkimage(dir.path().join("disk.img"), &options).unwrap_err();
        assert!(format!("{err:#}").contains("bootloader"));
        assert!(!dir.path().join("disk.img").exists());
    }
}

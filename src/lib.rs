pub mod cli_interface;
pub mod disk_image;
mod fs;
pub mod mkimage;
pub mod utils;
pub use disk_image::{DiskImage, Region};
pub use fs::*;
pub use mkimage::{build_image, mkimage, MkimageOptions, Payloads, TreeSpec};
pub use utils::path::split_file_name;

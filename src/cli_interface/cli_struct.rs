use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum InitFsCli {
    /// build a new disk image
    Build(BuildArgs),
    /// print the fixed region table of the image
    Layout,
}

/// build an image subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(about = "build a bootable disk image")]
pub struct BuildArgs {
    /// the path of the image file to write
    #[clap(short, long)]
    pub output: PathBuf,
    /// raw bootloader placed in the first block
    #[clap(short, long)]
    pub bootloader: Option<PathBuf>,
    /// kernel placed right after the bootloader
    #[clap(short, long)]
    pub kernel: Option<PathBuf>,
    /// extra directory to create, may be repeated
    #[clap(short = 'd', long = "dir")]
    pub directories: Vec<String>,
    /// extra empty file to create, may be repeated
    #[clap(short = 't', long = "touch")]
    pub files: Vec<String>,
    /// skip the default /sbin, /dev and /usr tree
    #[clap(long)]
    pub no_default_tree: bool,
    /// overwrite an existing image file
    #[clap(short, long)]
    pub force: bool,
}

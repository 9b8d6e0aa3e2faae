use byte_unit::Byte;
use clap::Parser;
use initfs::{
    cli_interface::{BuildArgs, InitFsCli},
    MkimageOptions, Region, TreeSpec, BLOCK_SIZE, IMAGE_SIZE,
};
/// a CLI interface to users to build a bootable disk image,
/// or print where each region of the image lives.
///
/// Set `RUST_LOG=info` to see the payload, tree and digest lines.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = InitFsCli::parse();
    match args {
        InitFsCli::Build(args) => {
            let output = args.output.clone();
            let hash = initfs::mkimage(&output, &build_options(args))?;
            println!("{} {hash}", output.display());
        }
        InitFsCli::Layout => print_layout(),
    }
    Ok(())
}

fn build_options(args: BuildArgs) -> MkimageOptions {
    let mut tree = if args.no_default_tree {
        TreeSpec::empty()
    } else {
        TreeSpec::default()
    };
    tree.directories.extend(args.directories);
    tree.files.extend(args.files);
    MkimageOptions {
        bootloader: args.bootloader,
        kernel: args.kernel,
        tree,
        overwrite: args.force,
    }
}

fn print_layout() {
    println!("{:<18}{:>8}{:>8}{:>12}", "region", "first", "blocks", "size");
    for region in Region::ALL {
        let blocks = region.blocks();
        println!(
            "{:<18}{:>8}{:>8}{:>12}",
            region.name(),
            blocks.start,
            blocks.len(),
            Byte::from_bytes(region.len() as u128)
                .get_appropriate_unit(true)
                .to_string()
        );
    }
    println!(
        "{} blocks of {} bytes, {} in total",
        IMAGE_SIZE / BLOCK_SIZE as u64,
        BLOCK_SIZE,
        Byte::from_bytes(IMAGE_SIZE as u128).get_appropriate_unit(true)
    );
}

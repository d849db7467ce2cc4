//! `mkfs-tupofs` creates a fresh TupoFS image on a regular file, the way
//! `mkfs.ext2` creates a filesystem on a device.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::exit;

use tupofs::{FormatOptions, Filesystem};

/// Command line arguments.
#[derive(Default)]
struct Args {
    /// The name of the current program, as given in argv[0].
    prog: String,
    /// If true, print command line help.
    help: bool,
    /// The size in bytes of the inode bitmap, and so of the inode table.
    inode_map_size_bytes: Option<u32>,
    /// The size in bytes of the data bitmap, and so of the data region.
    data_map_size_bytes: Option<u32>,
    /// The path to the image file to create.
    image_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args: Args = Default::default();
    let mut iter = env::args();

    args.prog = iter.next().unwrap_or_else(|| "mkfs-tupofs".to_owned());

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => args.help = true,

            "--inode-map-bytes" => {
                args.inode_map_size_bytes = iter.next().and_then(|v| v.parse().ok());
            }
            "--data-map-bytes" => {
                args.data_map_size_bytes = iter.next().and_then(|v| v.parse().ok());
            }

            _ => {
                // TODO handle the case where several paths are given
                args.image_path = Some(PathBuf::from(arg));
            }
        }
    }

    args
}

fn print_help(prog: &str) {
    println!("Usage: {prog} [--inode-map-bytes N] [--data-map-bytes N] <image path>");
    println!();
    println!("Creates a fresh TupoFS image at <image path>, truncating it if it exists.");
}

fn main() {
    env_logger::init();

    let args = parse_args();
    if args.help {
        print_help(&args.prog);
        return;
    }

    let image_path = args.image_path.unwrap_or_else(|| {
        eprintln!("{}: specify a path for the image", args.prog);
        exit(1);
    });

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&image_path)
        .unwrap_or_else(|e| {
            eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
            exit(1);
        });

    let mut options = FormatOptions::default();
    if let Some(n) = args.inode_map_size_bytes {
        options.inode_map_size_bytes = n;
    }
    if let Some(n) = args.data_map_size_bytes {
        options.data_map_size_bytes = n;
    }

    Filesystem::format(file, options).unwrap_or_else(|e| {
        eprintln!("{}: failed to format {}: {}", args.prog, image_path.display(), e);
        exit(1);
    });

    log::info!("created TupoFS image at {}", image_path.display());
}

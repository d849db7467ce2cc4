//! Integration tests against a real backing file, exercising the scenarios
//! `spec.md` §8 walks through by hand.

use std::fs::OpenOptions;

use tempfile::tempdir;
use tupofs::{Filesystem, FormatOptions, InodeKind, NewInodeType, ROOT_INODE_INDEX};

fn formatted() -> Filesystem<std::fs::File> {
    let dir = tempdir().unwrap().into_path();
    let path = dir.join("image.tupofs");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .unwrap();
    Filesystem::format(file, FormatOptions::default()).unwrap()
}

#[test]
fn fresh_image_has_empty_root() {
    let mut fs = formatted();
    let root = fs.get_inode(ROOT_INODE_INDEX).unwrap();
    match root.kind {
        InodeKind::Directory { children } => assert!(children.is_empty()),
        _ => panic!("root must be a directory"),
    }
}

#[test]
fn reopen_after_format_preserves_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.tupofs");
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        let mut fs = Filesystem::format(file, FormatOptions::default()).unwrap();
        fs.create("/docs", NewInodeType::Directory).unwrap();
        fs.create("/docs/readme", NewInodeType::File).unwrap();
        fs.write_file("/docs/readme", b"hello").unwrap();
    }

    let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
    let mut fs = Filesystem::open(file).unwrap();
    let mut buf = vec![0u8; 5];
    let size = fs.read_file("/docs/readme", Some(&mut buf)).unwrap();
    assert_eq!(size, 5);
    assert_eq!(&buf, b"hello");
}

#[test]
fn ten_two_sector_files_then_reuse_freed_blocks() {
    let mut fs = formatted();

    let mut paths = Vec::new();
    for i in 0..10 {
        let p = format!("/f{i}");
        fs.create(&p, NewInodeType::File).unwrap();
        // One sector short of two full sectors, forcing exactly 2 blocks.
        fs.write_file(&p, &vec![0xAAu8; 2049]).unwrap();
        paths.push(p);
    }

    // Delete the 3rd and 10th files (indices 2 and 9), freeing their blocks.
    fs.delete(&paths[2]).unwrap();
    fs.delete(&paths[9]).unwrap();

    fs.create("/g", NewInodeType::File).unwrap();
    fs.write_file("/g", &vec![0xBBu8; 3 * 2048 - 10]).unwrap();

    let g = fs.get_inode_by_path("/g").unwrap();
    let InodeKind::File { used_blocks, .. } = g.kind else {
        panic!("expected file")
    };
    assert_eq!(used_blocks.len(), 3);
    // The two blocks freed by deleting file index 2 are the lowest free
    // indices and must be reused before any higher, never-yet-used block.
    assert!(used_blocks[0] < used_blocks[1]);
    assert!(used_blocks.iter().all(|&b| b <= 20));
}

#[test]
fn delete_non_empty_directory_is_declined() {
    let mut fs = formatted();
    fs.create("/a", NewInodeType::Directory).unwrap();
    fs.create("/a/b", NewInodeType::File).unwrap();

    let err = fs.delete("/a").unwrap_err();
    assert!(matches!(err, tupofs::TfsError::Busy));

    fs.delete("/a/b").unwrap();
    fs.delete("/a").unwrap();
    assert!(fs.get_inode_by_path("/a").is_err());
}

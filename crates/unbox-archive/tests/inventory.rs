use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use unbox_archive::{ArchiveFormat, EntryKind, Error, Inventory, detect_path};
use zip::write::SimpleFileOptions;

fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        if name.ends_with('/') {
            writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

fn write_fixture(dir: &Path, members: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join("payload.zip");
    std::fs::write(&path, build_zip(members)).unwrap();
    path
}

#[test]
fn traversal_members_are_excluded_from_zip() {
    let temp_dir = tempfile::Builder::new().prefix("unbox-test-zip-").tempdir().unwrap();
    let raw = [
        ("app/", b"" as &[u8]),
        ("app/run.sh", b"#!/bin/sh\n"),
        ("../../etc/passwd", b"root::0:0"),
        ("app/../../escape", b"x"),
        ("app/lib/core.so", b"elf"),
    ];
    let archive = write_fixture(temp_dir.path(), &raw);

    let mut inventory = Inventory::open(&archive).unwrap();
    let entries = inventory.scan().unwrap();

    assert!(entries.len() < raw.len());
    assert!(entries.iter().all(|e| !e.path.to_string_lossy().contains("..")));
    let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
    assert_eq!(
        paths,
        [PathBuf::from("app"), PathBuf::from("app/run.sh"), PathBuf::from("app/lib/core.so")]
    );
    assert_eq!(inventory.rejected(), 2);
    assert_eq!(inventory.total_bytes().unwrap(), 13);
}

#[test]
fn zip_entries_open_by_origin() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = write_fixture(temp_dir.path(), &[("docs/", b""), ("docs/guide.txt", b"hello guide")]);

    let mut inventory = Inventory::open(&archive).unwrap();
    let entry = inventory.scan().unwrap()[1].clone();
    assert_eq!(entry.kind, EntryKind::File);

    let mut content = String::new();
    inventory.open_entry(&entry).unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "hello guide");
}

#[test]
fn directory_tree_is_an_archive_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("tree");
    std::fs::create_dir_all(root.join("bin")).unwrap();
    std::fs::write(root.join("bin/tool"), "1234").unwrap();

    assert_eq!(detect_path(&root).unwrap(), ArchiveFormat::Directory);
    let mut inventory = Inventory::open(&root).unwrap();
    assert_eq!(inventory.scan().unwrap().len(), 2);
    assert_eq!(inventory.total_bytes().unwrap(), 4);
}

#[test]
fn plain_file_is_unsupported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("notes.txt");
    std::fs::write(&path, "just text").unwrap();

    assert!(matches!(Inventory::open(&path), Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn truncated_zip_is_corrupted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut bytes = build_zip(&[("a.txt", b"aaaa")]);
    bytes.truncate(bytes.len() - 10);
    let path = temp_dir.path().join("broken.zip");
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(Inventory::open(&path), Err(Error::Corrupted { .. })));
}

#[test]
fn bundle_is_staged_and_released() {
    let bytes = build_zip(&[("bin/", b""), ("bin/app", b"binary")]);
    let mut inventory = Inventory::from_bundle(Cursor::new(bytes)).unwrap();
    assert!(inventory.is_staged());

    let entries = inventory.scan().unwrap().to_vec();
    assert_eq!(entries.len(), 2);

    inventory.release_staging().unwrap();
    assert!(!inventory.is_staged());
    assert_eq!(inventory.entries().map(<[_]>::len), Some(2));
    assert!(matches!(inventory.open_entry(&entries[1]), Err(Error::SourceReleased { .. })));
}

#[test]
fn bundle_that_is_not_a_zip_is_rejected() {
    let result = Inventory::from_bundle(Cursor::new(b"\x1f\x8b gzip bytes".to_vec()));
    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn empty_zip_has_no_entries() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = write_fixture(temp_dir.path(), &[]);

    let mut inventory = Inventory::open(&archive).unwrap();
    assert!(inventory.scan().unwrap().is_empty());
    assert_eq!(inventory.total_bytes().unwrap(), 0);
}

#[test]
fn multiple_sources_are_concatenated() {
    let temp_dir = tempfile::tempdir().unwrap();
    let first = temp_dir.path().join("first.zip");
    std::fs::write(&first, build_zip(&[("a", b"1")])).unwrap();
    let second = temp_dir.path().join("second.zip");
    std::fs::write(&second, build_zip(&[("b", b"22")])).unwrap();

    let mut inventory = Inventory::new()
        .with_source(unbox_archive::ZipSource::new(File::open(&first).unwrap()).unwrap())
        .with_source(unbox_archive::ZipSource::open(&second).unwrap());

    assert_eq!(inventory.total_bytes().unwrap(), 3);
    assert_eq!(inventory.scan().unwrap()[1].origin.source, 1);
}

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{RawEntry, Source};
use crate::entry::{EntryKind, Member};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;

pub struct ZipSource<R: Read + Seek> {
    archive:  zip::ZipArchive<R>,
    location: PathBuf,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader)?;
        Ok(Self {
            archive,
            location: PathBuf::from("<stream>"),
        })
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = location.into();
        self
    }

    pub fn len(&self) -> usize { self.archive.len() }

    pub fn is_empty(&self) -> bool { self.archive.len() == 0 }
}

impl ZipSource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::ArchiveOpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(file)?.with_location(path))
    }
}

impl<R: Read + Seek + Send> Source for ZipSource<R> {
    fn format(&self) -> ArchiveFormat { ArchiveFormat::Zip }

    fn location(&self) -> &Path { &self.location }

    fn members(&mut self) -> Result<Vec<RawEntry>> {
        let mut members = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            // metadata only, nothing is decompressed here
            let file = self.archive.by_index_raw(index)?;
            let kind = if file.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let stamp: Option<zip::DateTime> = file.last_modified().into();

            members.push(RawEntry {
                name: file.name().to_string(),
                kind,
                size: if kind == EntryKind::Directory { 0 } else { file.size() },
                mode: file.unix_mode(),
                modified: stamp.and_then(dos_time_to_system),
                member: Member::ZipIndex(index),
            });
        }
        Ok(members)
    }

    fn open(&mut self, member: &Member) -> Result<Box<dyn Read + '_>> {
        match member {
            Member::ZipIndex(index) => Ok(Box::new(self.archive.by_index(*index)?)),
            Member::Path(path) => Ok(Box::new(self.archive.by_name(&path.to_string_lossy())?)),
        }
    }
}

/// Zip stores local DOS time without a zone; it is read as UTC.
fn dos_time_to_system(stamp: zip::DateTime) -> Option<SystemTime> {
    let date = chrono::NaiveDate::from_ymd_opt(
        stamp.year().into(),
        stamp.month().into(),
        stamp.day().into(),
    )?;
    let time = date.and_hms_opt(
        stamp.hour().into(),
        stamp.minute().into(),
        stamp.second().into(),
    )?;
    Some(SystemTime::from(time.and_utc()))
}

impl<R: Read + Seek> std::fmt::Debug for ZipSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipSource")
            .field("location", &self.location)
            .field("members", &self.archive.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn fixture() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.add_directory("bin/", SimpleFileOptions::default()).unwrap();
        writer
            .start_file("bin/tool", SimpleFileOptions::default().unix_permissions(0o755))
            .unwrap();
        writer.write_all(b"#!/bin/sh\necho hi\n").unwrap();
        writer.start_file("README", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"read me").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn members_in_storage_order() {
        let mut source = ZipSource::new(Cursor::new(fixture())).unwrap();
        let members = source.members().unwrap();

        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["bin/", "bin/tool", "README"]);
        assert_eq!(members[0].kind, EntryKind::Directory);
        assert_eq!(members[0].size, 0);
        assert_eq!(members[1].size, 18);
        assert_eq!(members[1].mode.map(|m| m & 0o777), Some(0o755));
        assert_eq!(members[2].member, Member::ZipIndex(2));
    }

    #[test]
    fn open_member_reads_bytes() {
        let mut source = ZipSource::new(Cursor::new(fixture())).unwrap();
        let mut content = String::new();
        source
            .open(&Member::ZipIndex(2))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "read me");
    }

    #[test]
    fn garbage_is_corrupted() {
        let err = ZipSource::new(Cursor::new(b"PK\x03\x04 not really".to_vec())).unwrap_err();
        assert!(matches!(err, Error::Corrupted { .. }));
    }

    #[test]
    fn dos_time_is_utc() {
        let stamp = zip::DateTime::from_date_and_time(2020, 1, 2, 3, 4, 6).unwrap();
        let expected = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_577_934_246);
        assert_eq!(dos_time_to_system(stamp), Some(expected));
    }
}

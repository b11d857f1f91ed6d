use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::entry::{Entry, EntryKind, Origin};
use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, detect_path};
use crate::sanitize::{sanitize_member, strip_subdir};
use crate::source::{Source, ZipSource, open_path};

const STAGED_BUNDLE_NAME: &str = "bundle.zip";

#[derive(Debug)]
struct Scan {
    entries:     Vec<Entry>,
    total_bytes: u64,
    rejected:    usize,
}

/// Ordered list of the members that are safe to install.
///
/// The scan runs once and is cached until [`Inventory::invalidate`] is
/// called. A failing source aborts the whole scan and nothing is cached.
#[derive(Default)]
pub struct Inventory {
    sources: Vec<Option<Box<dyn Source>>>,
    subdir:  Option<PathBuf>,
    cache:   Option<Scan>,
    staging: Option<Staging>,
}

struct Staging {
    dir:     TempDir,
    sources: Vec<usize>,
}

impl Inventory {
    pub fn new() -> Self { Self::default() }

    /// Inventory over the zip file or directory tree at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut inventory = Self::new();
        inventory.push_source(open_path(path)?);
        Ok(inventory)
    }

    /// Copy a bundled archive stream into a private staging directory and
    /// open it from there.
    ///
    /// The staging directory lives until [`Inventory::release_staging`] is
    /// called or the inventory is dropped.
    pub fn from_bundle<R: Read>(mut reader: R) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("unbox-staging-")
            .tempdir()
            .map_err(|e| Error::StagingFailed { source: e })?;
        let staged = dir.path().join(STAGED_BUNDLE_NAME);

        let mut file = File::create(&staged).map_err(|e| Error::StagingFailed { source: e })?;
        let copied =
            std::io::copy(&mut reader, &mut file).map_err(|e| Error::StagingFailed { source: e })?;
        drop(file);
        tracing::debug!("staged {} bytes of bundled archive in {}", copied, dir.path().display());

        if detect_path(&staged)? != ArchiveFormat::Zip {
            return Err(Error::UnsupportedFormat { path: staged });
        }

        let mut inventory = Self::new();
        let index = inventory.push_source(Box::new(ZipSource::open(&staged)?));
        inventory.staging = Some(Staging {
            dir,
            sources: vec![index],
        });
        Ok(inventory)
    }

    pub fn with_source(mut self, source: impl Source + 'static) -> Self {
        self.push_source(Box::new(source));
        self
    }

    /// Add a source after the existing ones and return its index.
    pub fn push_source(&mut self, source: Box<dyn Source>) -> usize {
        self.sources.push(Some(source));
        self.cache = None;
        self.sources.len() - 1
    }

    /// Only keep members below `prefix`, re-rooted relative to it.
    ///
    /// An empty or unsafe prefix clears the filter.
    pub fn with_subdir(mut self, prefix: impl AsRef<str>) -> Self {
        self.set_subdir(prefix);
        self
    }

    pub fn set_subdir(&mut self, prefix: impl AsRef<str>) {
        self.subdir = sanitize_member(prefix.as_ref());
        self.cache = None;
    }

    /// Entries in archive order, scanning on first use.
    pub fn scan(&mut self) -> Result<&[Entry]> {
        if self.cache.is_none() {
            self.cache = Some(self.build()?);
        }
        Ok(self.cache.as_ref().map(|scan| scan.entries.as_slice()).unwrap_or_default())
    }

    /// Cached entries, if a scan has completed.
    pub fn entries(&self) -> Option<&[Entry]> { self.cache.as_ref().map(|scan| scan.entries.as_slice()) }

    /// Uncompressed size of all file entries.
    pub fn total_bytes(&mut self) -> Result<u64> {
        self.scan()?;
        Ok(self.cache.as_ref().map_or(0, |scan| scan.total_bytes))
    }

    /// Members dropped by the last scan because their path was unsafe.
    pub fn rejected(&self) -> usize { self.cache.as_ref().map_or(0, |scan| scan.rejected) }

    /// Forget the cached scan; the next query rescans every source.
    pub fn invalidate(&mut self) { self.cache = None; }

    /// Open the bytes of `entry`.
    pub fn open_entry(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        match self.sources.get_mut(entry.origin.source).and_then(Option::as_mut) {
            Some(source) => source.open(&entry.origin.member),
            None => Err(Error::SourceReleased {
                path: entry.path.clone(),
            }),
        }
    }

    pub fn is_staged(&self) -> bool { self.staging.is_some() }

    /// Close the staged sources and delete the staging directory.
    ///
    /// The cached entries stay available; opening a staged entry afterwards
    /// fails with [`Error::SourceReleased`]. No-op without staging.
    pub fn release_staging(&mut self) -> Result<()> {
        let Some(staging) = self.staging.take() else {
            return Ok(());
        };
        for index in staging.sources {
            if let Some(slot) = self.sources.get_mut(index) {
                *slot = None;
            }
        }
        let location = staging.dir.path().to_path_buf();
        staging.dir.close().map_err(|e| Error::StagingFailed { source: e })?;
        tracing::debug!("removed staging directory {}", location.display());
        Ok(())
    }

    fn build(&mut self) -> Result<Scan> {
        let mut scan = Scan {
            entries:     Vec::new(),
            total_bytes: 0,
            rejected:    0,
        };

        for (index, slot) in self.sources.iter_mut().enumerate() {
            let Some(source) = slot.as_mut() else {
                continue;
            };
            let members = source.members()?;
            tracing::debug!("{} members in {}", members.len(), source.location().display());

            for raw in members {
                let Some(path) = sanitize_member(&raw.name) else {
                    tracing::debug!("skipping unsafe member '{}'", raw.name);
                    scan.rejected += 1;
                    continue;
                };
                let path = match &self.subdir {
                    Some(prefix) => match strip_subdir(&path, prefix) {
                        Some(rest) => rest,
                        None => continue,
                    },
                    None => path,
                };

                if raw.kind == EntryKind::File {
                    scan.total_bytes += raw.size;
                }
                scan.entries.push(Entry {
                    path,
                    kind: raw.kind,
                    size: raw.size,
                    mode: raw.mode,
                    modified: raw.modified,
                    origin: Origin {
                        source: index,
                        member: raw.member,
                    },
                });
            }
        }

        Ok(scan)
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locations: Vec<_> = self
            .sources
            .iter()
            .map(|slot| slot.as_ref().map(|s| s.location().to_path_buf()))
            .collect();
        f.debug_struct("Inventory")
            .field("sources", &locations)
            .field("subdir", &self.subdir)
            .field("scanned", &self.cache.is_some())
            .field("staging", &self.staging.as_ref().map(|s| s.dir.path().to_path_buf()))
            .finish()
    }
}

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::archive::{Archive, ArchiveFormat};
use crate::automatic;
use crate::descriptor::{DESCRIPTOR_FILE, DescriptorDecoder, JsonDescriptorDecoder};
use crate::error::FindError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::locator::{self, Unit};

use super::{ContentSource, ModuleFinder, ModuleReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Entries before the cursor have been scanned.
    Pending,
    Complete,
    Failed,
}

/// Finds modules on a module path.
///
/// Entries are scanned in order, each one completely, and only as far as a
/// query needs. The first module of a given name wins; modules of the same
/// name in later entries are ignored. Two modules of the same name in one
/// directory are an error.
pub struct ModulePath<F: FileSystem = RealFileSystem, D: DescriptorDecoder = JsonDescriptorDecoder>
{
    fs: F,
    decoder: D,
    entries: Vec<PathBuf>,
    next: usize,
    cached: BTreeMap<String, ModuleReference>,
    state: ScanState,
}

impl ModulePath {
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::with(RealFileSystem, JsonDescriptorDecoder, entries)
    }
}

impl<F: FileSystem, D: DescriptorDecoder> ModulePath<F, D> {
    pub fn with<I, P>(fs: F, decoder: D, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            fs,
            decoder,
            entries: entries.into_iter().map(Into::into).collect(),
            next: 0,
            cached: BTreeMap::new(),
            state: ScanState::Pending,
        }
    }

    fn ensure_usable(&self) -> Result<(), FindError> {
        if self.state == ScanState::Failed {
            return Err(FindError::Unusable);
        }
        Ok(())
    }

    /// Scan the entry under the cursor and merge its modules into the cache.
    fn scan_next(&mut self) -> Result<(), FindError> {
        let entry = self.entries[self.next].clone();
        let modules = match self.scan_entry(&entry) {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Scanning {:?} failed: {}", entry, e);
                self.state = ScanState::Failed;
                return Err(e);
            }
        };

        self.next += 1;
        if self.next == self.entries.len() {
            self.state = ScanState::Complete;
        }

        for module in modules {
            match self.cached.entry(module.name().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(module);
                }
                Entry::Occupied(existing) => {
                    debug!(
                        "Module {} in {:?} is shadowed by {:?}",
                        existing.key(),
                        entry,
                        existing.get().source()
                    );
                }
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn scan_entry(&self, entry: &Path) -> Result<Vec<ModuleReference>, FindError> {
        match locator::classify(&self.fs, entry)? {
            Unit::Absent(path) => {
                debug!("Ignoring nonexistent module path entry {:?}", path);
                Ok(Vec::new())
            }
            Unit::Directory(dir) => self.scan_directory(&dir),
            Unit::Unrecognized(path) => Err(FindError::malformed(
                path,
                "module format not recognized",
            )),
            unit => Ok(self.read_unit(&unit)?.into_iter().collect()),
        }
    }

    fn scan_directory(&self, dir: &Path) -> Result<Vec<ModuleReference>, FindError> {
        let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut modules = Vec::new();

        for unit in locator::list_units(&self.fs, dir)? {
            let Some(module) = self.read_unit(&unit)? else {
                continue;
            };
            if let Some(first) = seen.get(module.name()) {
                return Err(FindError::DuplicateModule {
                    name: module.name().to_string(),
                    dir: dir.to_path_buf(),
                    first: first.clone(),
                    second: unit.path().to_path_buf(),
                });
            }
            seen.insert(module.name().to_string(), unit.path().to_path_buf());
            modules.push(module);
        }
        Ok(modules)
    }

    fn read_unit(&self, unit: &Unit) -> Result<Option<ModuleReference>, FindError> {
        match unit {
            Unit::Packaged(path, format) => self.read_packaged(path, *format).map(Some),
            Unit::Exploded(dir) => self.read_exploded(dir).map(Some),
            other => {
                debug!("Ignoring {:?}: not a module", other.path());
                Ok(None)
            }
        }
    }

    fn read_packaged(&self, path: &Path, format: ArchiveFormat) -> Result<ModuleReference, FindError> {
        let mut archive = Archive::open(&self.fs, path, format)?;

        let descriptor = match archive.read_entry(DESCRIPTOR_FILE)? {
            Some(bytes) => self
                .decoder
                .decode(&bytes)
                .map_err(|source| FindError::Descriptor {
                    path: path.to_path_buf(),
                    source,
                })?,
            None if archive.format() == ArchiveFormat::Jar => automatic::derive_descriptor(&mut archive)?,
            None => {
                return Err(FindError::malformed(
                    path,
                    format!("{}{} not found", format.content_prefix(), DESCRIPTOR_FILE),
                ));
            }
        };

        debug!("Found module {} in {:?}", descriptor.to_name_and_version(), path);
        Ok(ModuleReference::new(
            descriptor,
            ContentSource::Packaged {
                path: path.to_path_buf(),
                format,
            },
        ))
    }

    fn read_exploded(&self, dir: &Path) -> Result<ModuleReference, FindError> {
        let file = dir.join(DESCRIPTOR_FILE);
        let bytes = self.fs.read(&file).map_err(|e| FindError::io(&file, e))?;
        let descriptor = self
            .decoder
            .decode(&bytes)
            .map_err(|source| FindError::Descriptor { path: file, source })?;

        debug!("Found exploded module {} in {:?}", descriptor.to_name_and_version(), dir);
        Ok(ModuleReference::new(
            descriptor,
            ContentSource::Exploded(dir.to_path_buf()),
        ))
    }
}

impl<F: FileSystem, D: DescriptorDecoder> ModuleFinder for ModulePath<F, D> {
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError> {
        self.ensure_usable()?;
        loop {
            if let Some(module) = self.cached.get(name) {
                return Ok(Some(module.clone()));
            }
            if self.next >= self.entries.len() {
                self.state = ScanState::Complete;
                return Ok(None);
            }
            self.scan_next()?;
        }
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        self.ensure_usable()?;
        while self.next < self.entries.len() {
            self.scan_next()?;
        }
        self.state = ScanState::Complete;
        Ok(self.cached.values().cloned().collect())
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::archive::{Archive, ArchiveFormat};
use crate::descriptor::ModuleDescriptor;
use crate::error::FindError;
use crate::fs::{FileSystem, RealFileSystem};

static REAL_FS: RealFileSystem = RealFileSystem;

/// Where the content of a located module lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentSource {
    Packaged { path: PathBuf, format: ArchiveFormat },
    Exploded(PathBuf),
    /// A module inside the packed runtime image.
    Image { image: PathBuf, module: String },
}

/// A located module: its descriptor plus a way to get at its content.
///
/// References are cheap to clone; the descriptor is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleReference {
    descriptor: Arc<ModuleDescriptor>,
    source: ContentSource,
}

impl ModuleReference {
    pub fn new(descriptor: ModuleDescriptor, source: ContentSource) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            source,
        }
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    /// `file:` URL of the archive or directory, or `jrt:/<module>` for
    /// modules in the runtime image.
    pub fn location(&self) -> Option<Url> {
        match &self.source {
            ContentSource::Packaged { path, .. } => std::path::absolute(path)
                .ok()
                .and_then(|p| Url::from_file_path(p).ok()),
            ContentSource::Exploded(dir) => std::path::absolute(dir)
                .ok()
                .and_then(|p| Url::from_directory_path(p).ok()),
            ContentSource::Image { module, .. } => Url::parse(&format!("jrt:/{}", module)).ok(),
        }
    }

    pub fn open(&self) -> ModuleReader<'_, RealFileSystem> {
        self.open_with(&REAL_FS)
    }

    pub fn open_with<'a, F: FileSystem + ?Sized>(&'a self, fs: &'a F) -> ModuleReader<'a, F> {
        ModuleReader {
            fs,
            source: &self.source,
        }
    }
}

/// Reads resources of one module. Each call opens the underlying archive or
/// file and releases it before returning.
pub struct ModuleReader<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    source: &'a ContentSource,
}

impl<F: FileSystem + ?Sized> ModuleReader<'_, F> {
    /// Read a resource by its `/`-separated name.
    pub fn read(&self, name: &str) -> Result<Option<Vec<u8>>, FindError> {
        match self.source {
            ContentSource::Packaged { path, format } => {
                Archive::open(self.fs, path, *format)?.read_entry(name)
            }
            ContentSource::Image { image, module } => {
                Archive::open(self.fs, image, ArchiveFormat::Image)?
                    .read_entry(&format!("{}/{}", module, name))
            }
            ContentSource::Exploded(dir) => {
                if name.starts_with('/') || name.split('/').any(|part| part == "..") {
                    return Ok(None);
                }
                let path = dir.join(name);
                if !self.fs.is_file(&path) {
                    return Ok(None);
                }
                self.fs
                    .read(&path)
                    .map(Some)
                    .map_err(|e| FindError::io(&path, e))
            }
        }
    }

    /// Names of all resources in the module, sorted.
    pub fn list(&self) -> Result<Vec<String>, FindError> {
        let mut names = match self.source {
            ContentSource::Packaged { path, format } => {
                Archive::open(self.fs, path, *format)?.entry_names()
            }
            ContentSource::Image { image, module } => {
                let prefix = format!("{}/", module);
                Archive::open(self.fs, image, ArchiveFormat::Image)?
                    .entry_names()
                    .into_iter()
                    .filter_map(|n| n.strip_prefix(&prefix).map(str::to_string))
                    .collect()
            }
            ContentSource::Exploded(dir) => {
                let mut names = Vec::new();
                self.walk(dir, "", &mut names)?;
                names
            }
        };
        names.sort();
        Ok(names)
    }

    fn walk(&self, dir: &Path, prefix: &str, names: &mut Vec<String>) -> Result<(), FindError> {
        for child in self.fs.read_dir(dir).map_err(|e| FindError::io(dir, e))? {
            let Some(file_name) = child.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let name = format!("{}{}", prefix, file_name);
            if self.fs.is_dir(&child) {
                self.walk(&child, &format!("{}/", name), names)?;
            } else {
                names.push(name);
            }
        }
        Ok(())
    }
}

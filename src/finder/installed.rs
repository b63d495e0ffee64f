use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::archive::{Archive, ArchiveFormat};
use crate::descriptor::{DESCRIPTOR_FILE, DescriptorDecoder, JsonDescriptorDecoder};
use crate::error::FindError;
use crate::fs::{FileSystem, RealFileSystem};

use super::{ContentSource, ModuleFinder, ModulePath, ModuleReference};

/// Location of the packed image relative to the installation root.
const IMAGE_PATH: &str = "lib/modules";
/// Directory of exploded modules used when no packed image exists.
const EXPLODED_DIR: &str = "modules";

/// Decides whether a finder may read from an installation.
#[cfg_attr(test, mockall::automock)]
pub trait AccessGate: Send + Sync {
    fn permits_read(&self, path: &Path) -> bool;
}

/// Gate that permits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn permits_read(&self, _path: &Path) -> bool {
        true
    }
}

/// Finds the modules of a runtime installation.
pub enum InstalledFinder<F: FileSystem = RealFileSystem, D: DescriptorDecoder = JsonDescriptorDecoder>
{
    /// A packed image at `<home>/lib/modules`.
    Image(ImageFinder<F, D>),
    /// Exploded modules under `<home>/modules`.
    Directory(ModulePath<F, D>),
}

impl InstalledFinder {
    pub fn new(home: &Path) -> Result<Self, FindError> {
        Self::with(RealFileSystem, JsonDescriptorDecoder, &AllowAll, home)
    }
}

impl<F: FileSystem, D: DescriptorDecoder> InstalledFinder<F, D> {
    /// Detect the layout of the installation at `home`.
    ///
    /// Only the layout is probed here; modules are read on the first query.
    #[tracing::instrument(skip(fs, decoder, gate))]
    pub fn with<G: AccessGate + ?Sized>(
        fs: F,
        decoder: D,
        gate: &G,
        home: &Path,
    ) -> Result<Self, FindError> {
        if !gate.permits_read(home) {
            return Err(FindError::AccessDenied {
                path: home.to_path_buf(),
            });
        }

        let image = home.join(IMAGE_PATH);
        if fs.is_file(&image) {
            debug!("Using packed image {:?}", image);
            return Ok(InstalledFinder::Image(ImageFinder::with(fs, decoder, image)));
        }

        let exploded = home.join(EXPLODED_DIR);
        if fs.is_dir(&exploded) {
            debug!("Using exploded image {:?}", exploded);
            return Ok(InstalledFinder::Directory(ModulePath::with(
                fs,
                decoder,
                [exploded],
            )));
        }

        Err(FindError::ImageNotFound {
            home: home.to_path_buf(),
        })
    }
}

impl<F: FileSystem, D: DescriptorDecoder> ModuleFinder for InstalledFinder<F, D> {
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError> {
        match self {
            InstalledFinder::Image(finder) => finder.find(name),
            InstalledFinder::Directory(finder) => finder.find(name),
        }
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        match self {
            InstalledFinder::Image(finder) => finder.find_all(),
            InstalledFinder::Directory(finder) => finder.find_all(),
        }
    }
}

enum Index {
    Unread,
    Indexed(BTreeMap<String, ModuleReference>),
    Failed,
}

/// Finds the modules linked into a packed image.
///
/// The image is a zip archive with one top-level directory per module, each
/// holding that module's descriptor. The whole index is read on first query.
pub struct ImageFinder<F: FileSystem = RealFileSystem, D: DescriptorDecoder = JsonDescriptorDecoder>
{
    fs: F,
    decoder: D,
    image: PathBuf,
    index: Index,
}

impl<F: FileSystem, D: DescriptorDecoder> ImageFinder<F, D> {
    pub fn with(fs: F, decoder: D, image: PathBuf) -> Self {
        Self {
            fs,
            decoder,
            image,
            index: Index::Unread,
        }
    }

    fn index(&mut self) -> Result<&BTreeMap<String, ModuleReference>, FindError> {
        if matches!(self.index, Index::Unread) {
            self.index = match self.read_index() {
                Ok(modules) => Index::Indexed(modules),
                Err(e) => {
                    warn!("Reading image {:?} failed: {}", self.image, e);
                    self.index = Index::Failed;
                    return Err(e);
                }
            };
        }
        match &self.index {
            Index::Indexed(modules) => Ok(modules),
            Index::Unread | Index::Failed => Err(FindError::Unusable),
        }
    }

    #[tracing::instrument(skip(self), fields(image = %self.image.display()))]
    fn read_index(&self) -> Result<BTreeMap<String, ModuleReference>, FindError> {
        let mut archive = Archive::open(&self.fs, &self.image, ArchiveFormat::Image)?;

        let modules: Vec<String> = archive
            .entry_names()
            .into_iter()
            .filter_map(|entry| match entry.split_once('/') {
                Some((module, DESCRIPTOR_FILE)) => Some(module.to_string()),
                _ => None,
            })
            .collect();

        let mut index = BTreeMap::new();
        for module in modules {
            let entry = format!("{}/{}", module, DESCRIPTOR_FILE);
            let bytes = archive.read_entry(&entry)?.unwrap_or_default();
            let descriptor = self
                .decoder
                .decode(&bytes)
                .map_err(|source| FindError::Descriptor {
                    path: self.image.join(&entry),
                    source,
                })?;
            if descriptor.name() != module {
                return Err(FindError::malformed(
                    &self.image,
                    format!("{} describes module {}", entry, descriptor.name()),
                ));
            }
            index.insert(
                module.clone(),
                ModuleReference::new(
                    descriptor,
                    ContentSource::Image {
                        image: self.image.clone(),
                        module,
                    },
                ),
            );
        }
        debug!("Indexed {} modules in {:?}", index.len(), self.image);
        Ok(index)
    }
}

impl<F: FileSystem, D: DescriptorDecoder> ModuleFinder for ImageFinder<F, D> {
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError> {
        Ok(self.index()?.get(name).cloned())
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        Ok(self.index()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FindErrorKind;
    use crate::fs::MockFileSystem;
    use crate::test_utils::{descriptor_json, write_exploded, zip_bytes};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn write_image(home: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let image = home.join(IMAGE_PATH);
        fs::create_dir_all(image.parent().unwrap()).unwrap();
        fs::write(&image, zip_bytes(entries)).unwrap();
        image
    }

    #[test_log::test]
    fn test_packed_image() {
        let home = tempdir().unwrap();
        let image = write_image(
            home.path(),
            &[
                ("java.base/module-info.json", descriptor_json("java.base").as_slice()),
                ("java.base/java/lang/Object.class", b"".as_slice()),
                ("java.sql/module-info.json", descriptor_json("java.sql").as_slice()),
                ("java.sql/java/sql/Driver.class", b"".as_slice()),
            ],
        );

        let mut finder = InstalledFinder::new(home.path()).unwrap();
        assert!(matches!(finder, InstalledFinder::Image(_)));

        let sql = finder.find("java.sql").unwrap().unwrap();
        assert_eq!(
            sql.source(),
            &ContentSource::Image {
                image,
                module: "java.sql".into(),
            }
        );
        assert_eq!(finder.find("java.desktop").unwrap(), None);

        let names: Vec<_> = finder
            .find_all()
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["java.base", "java.sql"]);
    }

    #[test]
    fn test_exploded_fallback() {
        let home = tempdir().unwrap();
        let modules = home.path().join(EXPLODED_DIR);
        write_exploded(&modules.join("java.base"), "java.base");

        let mut finder = InstalledFinder::new(home.path()).unwrap();
        assert!(matches!(finder, InstalledFinder::Directory(_)));
        assert_eq!(
            finder.find("java.base").unwrap().unwrap().source(),
            &ContentSource::Exploded(modules.join("java.base"))
        );
    }

    #[test]
    fn test_no_image_is_configuration_error() {
        let home = tempdir().unwrap();
        let err = InstalledFinder::new(home.path()).err().unwrap();
        assert!(matches!(err, FindError::ImageNotFound { .. }));
        assert_eq!(err.kind(), FindErrorKind::Configuration);
    }

    #[test]
    fn test_access_denied_before_any_io() {
        // The file system mock has no expectations: probing it would panic
        let mut gate = MockAccessGate::new();
        gate.expect_permits_read()
            .with(eq(PathBuf::from("/jdk")))
            .times(1)
            .returning(|_| false);

        let err = InstalledFinder::with(
            MockFileSystem::new(),
            JsonDescriptorDecoder,
            &gate,
            Path::new("/jdk"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, FindError::AccessDenied { .. }));
        assert_eq!(err.kind(), FindErrorKind::AccessDenied);
    }

    #[test]
    fn test_layout_probe_with_mock() {
        let mut fs = MockFileSystem::new();
        fs.expect_is_file()
            .with(eq(PathBuf::from("/jdk/lib/modules")))
            .times(1)
            .returning(|_| true);

        let finder =
            InstalledFinder::with(fs, JsonDescriptorDecoder, &AllowAll, Path::new("/jdk")).unwrap();
        match finder {
            InstalledFinder::Image(image) => {
                assert_eq!(image.image, Path::new("/jdk/lib/modules"))
            }
            InstalledFinder::Directory(_) => panic!("expected packed image"),
        }
    }

    #[test_log::test]
    fn test_corrupt_image_fails_lazily_then_unusable() {
        let home = tempdir().unwrap();
        fs::create_dir_all(home.path().join("lib")).unwrap();
        fs::write(home.path().join(IMAGE_PATH), b"not a zip").unwrap();

        let mut finder = InstalledFinder::new(home.path()).unwrap();
        assert!(matches!(finder.find("java.base"), Err(FindError::Archive { .. })));
        assert!(matches!(finder.find("java.base"), Err(FindError::Unusable)));
        assert!(matches!(finder.find_all(), Err(FindError::Unusable)));
    }

    #[test]
    fn test_descriptor_name_must_match_directory() {
        let home = tempdir().unwrap();
        write_image(
            home.path(),
            &[("java.base/module-info.json", descriptor_json("java.other").as_slice())],
        );

        let mut finder = InstalledFinder::new(home.path()).unwrap();
        let err = finder.find_all().unwrap_err();
        assert!(matches!(err, FindError::Malformed { .. }));
    }
}

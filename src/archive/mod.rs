//! Read access to module archives.
//!
//! Packaged modules are JAR files (plain zip) or JMOD files (a four byte
//! magic header followed by a zip whose module content lives under
//! `classes/`). The packed runtime image is also read through [`Archive`].

mod jmod;
mod zip;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ::zip::ZipArchive;

use crate::error::FindError;
use crate::fs::FileSystem;

pub use jmod::JMOD_MAGIC;

/// Bytes needed to recognize an archive format.
pub const SIGNATURE_LEN: usize = 4;

/// Local file header, and end of central directory for an empty zip.
const ZIP_SIGNATURES: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Jar,
    Jmod,
    /// The packed runtime image: a zip with one top-level directory per module.
    Image,
}

impl ArchiveFormat {
    /// Recognize a packaged module by the first bytes of the file.
    pub fn from_signature(head: &[u8]) -> Option<Self> {
        if head.starts_with(&JMOD_MAGIC) {
            Some(ArchiveFormat::Jmod)
        } else if ZIP_SIGNATURES.iter().any(|sig| head.starts_with(sig)) {
            Some(ArchiveFormat::Jar)
        } else {
            None
        }
    }

    /// Prefix under which module content is stored inside the archive.
    pub fn content_prefix(self) -> &'static str {
        match self {
            ArchiveFormat::Jmod => "classes/",
            ArchiveFormat::Jar | ArchiveFormat::Image => "",
        }
    }
}

/// An archive read fully into memory.
///
/// Entry names given to and returned by this type are relative to the
/// format's content prefix.
pub struct Archive {
    path: PathBuf,
    format: ArchiveFormat,
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl Archive {
    #[tracing::instrument(skip(fs))]
    pub fn open<F: FileSystem + ?Sized>(
        fs: &F,
        path: &Path,
        format: ArchiveFormat,
    ) -> Result<Self, FindError> {
        let bytes = fs.read(path).map_err(|e| FindError::io(path, e))?;
        Self::from_bytes(path, format, bytes)
    }

    pub fn from_bytes(
        path: &Path,
        format: ArchiveFormat,
        bytes: Vec<u8>,
    ) -> Result<Self, FindError> {
        let bytes = match format {
            ArchiveFormat::Jmod => jmod::strip_header(path, bytes)?,
            ArchiveFormat::Jar | ArchiveFormat::Image => bytes,
        };
        let zip = zip::open(path, bytes)?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Names of all file entries under the content prefix, in archive order.
    pub fn entry_names(&self) -> Vec<String> {
        let prefix = self.format.content_prefix();
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .filter_map(|name| name.strip_prefix(prefix))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Read one entry, `None` if it is not in the archive.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, FindError> {
        let full = format!("{}{}", self.format.content_prefix(), name);
        zip::read_entry(&self.path, &mut self.zip, &full)
    }
}

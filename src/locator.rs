//! Classification of storage entries into module units.

use std::path::{Path, PathBuf};

use log::debug;

use crate::archive::{ArchiveFormat, SIGNATURE_LEN};
use crate::descriptor::DESCRIPTOR_FILE;
use crate::error::FindError;
use crate::fs::FileSystem;

/// What a path on the module path turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Nothing exists at the path.
    Absent(PathBuf),
    /// A single packaged module file.
    Packaged(PathBuf, ArchiveFormat),
    /// A directory with a descriptor at its top level.
    Exploded(PathBuf),
    /// A directory of modules.
    Directory(PathBuf),
    /// A file in no recognized module format.
    Unrecognized(PathBuf),
}

impl Unit {
    pub fn path(&self) -> &Path {
        match self {
            Unit::Absent(p)
            | Unit::Packaged(p, _)
            | Unit::Exploded(p)
            | Unit::Directory(p)
            | Unit::Unrecognized(p) => p,
        }
    }
}

/// Classify one storage entry.
///
/// Files are recognized by their leading bytes, not by their name.
#[tracing::instrument(skip(fs))]
pub fn classify<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Unit, FindError> {
    if !fs.exists(path) {
        return Ok(Unit::Absent(path.to_path_buf()));
    }
    if fs.is_dir(path) {
        return Ok(if fs.exists(&path.join(DESCRIPTOR_FILE)) {
            Unit::Exploded(path.to_path_buf())
        } else {
            Unit::Directory(path.to_path_buf())
        });
    }

    let head = fs
        .read_head(path, SIGNATURE_LEN)
        .map_err(|e| FindError::io(path, e))?;
    Ok(match ArchiveFormat::from_signature(&head) {
        Some(format) => Unit::Packaged(path.to_path_buf(), format),
        None => Unit::Unrecognized(path.to_path_buf()),
    })
}

/// Classify the immediate children of a directory of modules.
///
/// Hidden entries are skipped. A child directory without a descriptor is
/// reported as [`Unit::Unrecognized`]: directories of modules do not nest.
#[tracing::instrument(skip(fs))]
pub fn list_units<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> Result<Vec<Unit>, FindError> {
    let children = fs.read_dir(dir).map_err(|e| FindError::io(dir, e))?;

    let mut units = Vec::with_capacity(children.len());
    for child in children {
        let hidden = child
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if hidden {
            debug!("Skipping hidden entry {:?}", child);
            continue;
        }
        let unit = match classify(fs, &child)? {
            Unit::Directory(p) => Unit::Unrecognized(p),
            unit => unit,
        };
        units.push(unit);
    }
    Ok(units)
}

//! Error types surfaced by module finders.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::descriptor::DescriptorError;

/// Broad classification of a [`FindError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindErrorKind {
    /// A storage entry could not be read, decoded, or was inconsistent.
    Discovery,
    /// The access gate refused to let the finder read the installation.
    AccessDenied,
    /// The runtime installation has no recognizable layout.
    Configuration,
}

/// Errors raised by [`ModuleFinder`](crate::finder::ModuleFinder) queries and
/// by the installed-image constructor.
#[derive(Debug, Error)]
pub enum FindError {
    #[error("I/O error reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("malformed module {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("invalid module descriptor in {}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },

    #[error("unable to derive module descriptor for {}: {reason}", path.display())]
    Automatic { path: PathBuf, reason: String },

    #[error(
        "{entry} found in top-level directory of {} (unnamed package not allowed in module)",
        path.display()
    )]
    UnnamedPackage { path: PathBuf, entry: String },

    #[error(
        "two versions of module {name} found in {} ({} and {})",
        dir.display(),
        first.display(),
        second.display()
    )]
    DuplicateModule {
        name: String,
        dir: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("module finder cannot be used after an earlier scan failure")]
    Unusable,

    #[error("access denied reading {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("unable to detect the run-time image under {}", home.display())]
    ImageNotFound { home: PathBuf },
}

impl FindError {
    pub fn kind(&self) -> FindErrorKind {
        match self {
            FindError::AccessDenied { .. } => FindErrorKind::AccessDenied,
            FindError::ImageNotFound { .. } => FindErrorKind::Configuration,
            _ => FindErrorKind::Discovery,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FindError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FindError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

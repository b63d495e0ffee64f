//! Module finders.
//!
//! A [`ModuleFinder`] is a lazily populated catalog of modules keyed by
//! name. Finders provide a consistent view: once a name has been looked up,
//! the same answer comes back for the lifetime of the finder. After a
//! [`FindError`] the finder should be discarded; later queries fail with
//! [`FindError::Unusable`].
//!
//! - `path` - modules on a module path (directories, JARs, JMODs)
//! - `installed` - modules linked into a runtime installation
//! - `combinators` - `concat` and `empty`
//! - `reference` - located modules and their content

mod combinators;
mod installed;
mod path;
mod reference;

use std::path::{Path, PathBuf};

use crate::error::FindError;

pub use combinators::{Concat, Empty};
#[cfg(test)]
pub use installed::MockAccessGate;
pub use installed::{AccessGate, AllowAll, ImageFinder, InstalledFinder};
pub use path::ModulePath;
pub use reference::{ContentSource, ModuleReader, ModuleReference};

#[cfg_attr(test, mockall::automock)]
pub trait ModuleFinder: Send {
    /// Find a module by name.
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError>;

    /// All modules this finder can locate, ordered by name.
    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError>;
}

impl<T: ModuleFinder + ?Sized> ModuleFinder for Box<T> {
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError> {
        (**self).find(name)
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        (**self).find_all()
    }
}

/// A finder over a sequence of directories of modules, exploded modules and
/// packaged modules. No I/O happens until the first query.
pub fn of<I, P>(entries: I) -> ModulePath
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    ModulePath::new(entries)
}

/// A finder for the modules of the runtime installation rooted at `home`.
pub fn of_installed(home: &Path) -> Result<InstalledFinder, FindError> {
    InstalledFinder::new(home)
}

/// A finder that finds nothing.
pub fn empty() -> Empty {
    Empty
}

/// Look in `first`, then in `second`.
pub fn concat<A: ModuleFinder, B: ModuleFinder>(first: A, second: B) -> Concat<A, B> {
    Concat::new(first, second)
}

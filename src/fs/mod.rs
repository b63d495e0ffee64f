//! Filesystem abstraction used while scanning for modules.
//!
//! Finders never touch `std::fs` directly; they go through [`FileSystem`] so
//! that scanning can be exercised against mocks.

mod real;

use std::io;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    /// List the immediate children of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read a whole file into memory.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read at most `len` bytes from the start of a file.
    fn read_head(&self, path: &Path, len: usize) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_file_impl(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.read_impl(path)
    }

    fn read_head(&self, path: &Path, len: usize) -> io::Result<Vec<u8>> {
        self.read_head_impl(path, len)
    }
}

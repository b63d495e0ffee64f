use std::io::{Cursor, Read};
use std::path::Path;

use log::debug;
use zip::ZipArchive;

use crate::error::FindError;

/// Parse an in-memory zip. The zip crate needs `Read + Seek`, so archives
/// are always read whole before parsing.
pub(super) fn open(path: &Path, bytes: Vec<u8>) -> Result<ZipArchive<Cursor<Vec<u8>>>, FindError> {
    debug!("Parsing archive {:?} ({} bytes)", path, bytes.len());
    ZipArchive::new(Cursor::new(bytes)).map_err(|source| FindError::Archive {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn read_entry(
    path: &Path,
    zip: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Option<Vec<u8>>, FindError> {
    let Some(index) = zip.index_for_name(name) else {
        return Ok(None);
    };
    let mut entry = zip.by_index(index).map_err(|source| FindError::Archive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buffer = Vec::new();
    entry
        .read_to_end(&mut buffer)
        .map_err(|e| FindError::io(path, e))?;
    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::zip_bytes;

    #[test]
    fn test_open_and_read_entry() {
        let bytes = zip_bytes(&[("dir/file.txt", b"content".as_slice())]);
        let mut zip = open(Path::new("t.zip"), bytes).unwrap();

        let content = read_entry(Path::new("t.zip"), &mut zip, "dir/file.txt").unwrap();
        assert_eq!(content, Some(b"content".to_vec()));
        assert_eq!(read_entry(Path::new("t.zip"), &mut zip, "nope").unwrap(), None);
    }

    #[test]
    fn test_open_empty_archive() {
        let bytes = zip_bytes(&[]);
        let zip = open(Path::new("empty.zip"), bytes).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[test]
    fn test_open_corrupted() {
        let result = open(Path::new("bad.zip"), b"not a zip".to_vec());
        let err = result.err().unwrap();
        assert!(err.to_string().contains("bad.zip"));
    }
}

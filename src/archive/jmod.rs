use std::path::Path;

use crate::error::FindError;

/// Magic number and version at the start of every JMOD file.
pub const JMOD_MAGIC: [u8; 4] = [b'J', b'M', 0x01, 0x00];

/// Check the JMOD header and return the zip that follows it.
pub(super) fn strip_header(path: &Path, mut bytes: Vec<u8>) -> Result<Vec<u8>, FindError> {
    if bytes.len() < JMOD_MAGIC.len() || bytes[..JMOD_MAGIC.len()] != JMOD_MAGIC {
        return Err(FindError::malformed(path, "not a JMOD file (bad magic number)"));
    }
    bytes.drain(..JMOD_MAGIC.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_header() {
        let mut bytes = JMOD_MAGIC.to_vec();
        bytes.extend_from_slice(b"PK");
        assert_eq!(strip_header(Path::new("m.jmod"), bytes).unwrap(), b"PK");
    }

    #[test]
    fn test_bad_magic() {
        let err = strip_header(Path::new("m.jmod"), b"PK\x03\x04".to_vec()).unwrap_err();
        assert!(matches!(err, FindError::Malformed { .. }));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_truncated() {
        assert!(strip_header(Path::new("m.jmod"), b"JM".to_vec()).is_err());
    }
}

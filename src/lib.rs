pub mod archive;
pub mod automatic;
pub mod descriptor;
pub mod error;
pub mod finder;
pub mod fs;
pub mod locator;

pub use descriptor::ModuleDescriptor;
pub use error::{FindError, FindErrorKind};
pub use finder::{ModuleFinder, ModuleReference};

/// Builders for module fixtures used across unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::archive::JMOD_MAGIC;
    use crate::descriptor::DESCRIPTOR_FILE;
    use ::zip::CompressionMethod;
    use ::zip::ZipWriter;
    use ::zip::write::FileOptions;
    use std::io::{Cursor, Write};
    use std::path::Path;

    /// Zip the given entries in order. Names ending in `/` become
    /// directory entries.
    pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    /// A JMOD file: the magic header followed by a zip of `entries`.
    pub fn jmod_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut bytes = JMOD_MAGIC.to_vec();
        bytes.extend(zip_bytes(entries));
        bytes
    }

    /// A minimal JSON descriptor for module `name`.
    pub fn descriptor_json(name: &str) -> Vec<u8> {
        format!(r#"{{ "name": "{}" }}"#, name).into_bytes()
    }

    pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::write(path, zip_bytes(entries)).unwrap();
    }

    /// Create an exploded module for `name` at `dir`.
    pub fn write_exploded(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(DESCRIPTOR_FILE), descriptor_json(name)).unwrap();
    }
}

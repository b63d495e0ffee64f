//! Descriptors for automatic modules.
//!
//! A JAR without an embedded descriptor becomes an automatic module. Its
//! name and version come from the file name, its exports from the packages
//! of the classes it contains, its services from `META-INF/services/` and
//! its main class from the manifest.

mod manifest;
mod services;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::archive::Archive;
use crate::descriptor::{ModuleDescriptor, Version, is_qualified_name};
use crate::error::FindError;

pub use manifest::{MANIFEST_PATH, Manifest};
pub use services::{SERVICES_PREFIX, parse_providers};

/// A hyphen followed by a digit run that ends at a dot or at the end of the
/// name. `foo-1.2.jar` and `foo-1.jar` match; `a-2b.jar` does not.
static VERSION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([0-9]+(\.|$))").expect("version marker regex is valid"));

const JAR_SUFFIX: &str = ".jar";
const CLASS_SUFFIX: &str = ".class";

/// Derive the module name and version from a JAR file name.
///
/// Returns an error message when no usable name is left.
pub fn derive_name_and_version(file_name: &str) -> Result<(String, Option<Version>), String> {
    let split = file_name.len().saturating_sub(JAR_SUFFIX.len());
    let base = match file_name.get(split..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(JAR_SUFFIX) => &file_name[..split],
        _ => file_name,
    };

    let (name_part, version) = match VERSION_MARKER.find(base) {
        Some(marker) => {
            let raw = &base[marker.start() + 1..];
            let version = match Version::parse(raw) {
                Ok(version) => Some(version),
                Err(e) => {
                    debug!("Ignoring version in {}: {}", file_name, e);
                    None
                }
            };
            (&base[..marker.start()], version)
        }
        None => (base, None),
    };

    let name = normalize_name(name_part);
    if name.is_empty() {
        return Err(format!("no module name can be derived from '{}'", file_name));
    }
    Ok((name, version))
}

/// Replace every non-alphanumeric character with a dot, collapse runs of
/// dots and trim dots from both ends.
fn normalize_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if !name.is_empty() && !name.ends_with('.') {
            name.push('.');
        }
    }
    while name.ends_with('.') {
        name.pop();
    }
    name
}

/// Synthesize the descriptor of the automatic module packaged in `archive`.
#[tracing::instrument(skip(archive), fields(path = %archive.path().display()))]
pub fn derive_descriptor(archive: &mut Archive) -> Result<ModuleDescriptor, FindError> {
    let path = archive.path().to_path_buf();
    let automatic_error = |reason: String| FindError::Automatic {
        path: path.clone(),
        reason,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (name, version) = derive_name_and_version(&file_name).map_err(&automatic_error)?;

    let mut builder = ModuleDescriptor::builder(&name).automatic(true);
    if let Some(version) = version {
        builder = builder.version(version);
    }

    let entries = archive.entry_names();

    let mut packages = BTreeSet::new();
    for entry in &entries {
        if entry.starts_with("META-INF/") {
            continue;
        }
        let Some(class) = entry.strip_suffix(CLASS_SUFFIX) else {
            continue;
        };
        let Some((dir, _)) = class.rsplit_once('/') else {
            return Err(FindError::UnnamedPackage {
                path: path.clone(),
                entry: entry.clone(),
            });
        };
        let package = dir.replace('/', ".");
        if !is_qualified_name(&package) {
            return Err(automatic_error(format!(
                "{}: '{}' is not a legal package name",
                entry, package
            )));
        }
        packages.insert(package);
    }
    for package in &packages {
        builder = builder.exports(package);
    }

    for entry in &entries {
        let Some(service) = entry.strip_prefix(SERVICES_PREFIX) else {
            continue;
        };
        if service.contains('/') {
            continue;
        }
        if !is_qualified_name(service) {
            return Err(automatic_error(format!(
                "{}: '{}' is not a legal service type name",
                entry, service
            )));
        }
        let content = archive.read_entry(entry)?.unwrap_or_default();
        let providers =
            parse_providers(&content).map_err(|e| automatic_error(format!("{}: {}", entry, e)))?;
        if !providers.is_empty() {
            builder = builder.provides(service, &providers);
        }
    }

    if let Some(content) = archive.read_entry(MANIFEST_PATH)? {
        let manifest = Manifest::parse(&content)
            .map_err(|e| automatic_error(format!("{}: {}", MANIFEST_PATH, e)))?;
        if let Some(main_class) = manifest.main_attribute("Main-Class") {
            let main_class = main_class.trim().replace('/', ".");
            if is_qualified_name(&main_class) {
                builder = builder.main_class(&main_class);
            } else {
                debug!("Ignoring Main-Class '{}' in {:?}", main_class, path);
            }
        }
    }

    let descriptor = builder
        .build()
        .map_err(|e| automatic_error(e.to_string()))?;
    debug!(
        "Derived automatic module {} from {:?}",
        descriptor.to_name_and_version(),
        path
    );
    Ok(descriptor)
}

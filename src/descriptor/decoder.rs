use std::collections::BTreeMap;

use serde::Deserialize;

use super::{DescriptorError, ModuleDescriptor, RequiresModifier};

/// File name of the embedded descriptor, at the top level of an exploded
/// module or a JAR, and under `classes/` in a JMOD.
pub const DESCRIPTOR_FILE: &str = "module-info.json";

/// Turns the bytes of an embedded descriptor into a [`ModuleDescriptor`].
#[cfg_attr(test, mockall::automock)]
pub trait DescriptorDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<ModuleDescriptor, DescriptorError>;
}

/// Decoder for JSON descriptors:
///
/// ```json
/// {
///   "name": "com.example.app",
///   "version": "1.0",
///   "requires": ["com.example.lib", { "name": "java.sql", "modifiers": ["transitive"] }],
///   "exports": ["com.example.app.api"],
///   "provides": { "com.example.spi.Plugin": ["com.example.app.PluginImpl"] },
///   "main_class": "com.example.app.Main"
/// }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDescriptorDecoder;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requires: Vec<RawRequires>,
    #[serde(default)]
    exports: Vec<String>,
    #[serde(default)]
    provides: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    main_class: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRequires {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },
}

impl DescriptorDecoder for JsonDescriptorDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ModuleDescriptor, DescriptorError> {
        let raw: RawDescriptor = serde_json::from_slice(bytes)?;

        let mut builder = ModuleDescriptor::builder(&raw.name);
        if let Some(version) = &raw.version {
            builder = builder.raw_version(version);
        }
        for requires in raw.requires {
            builder = match requires {
                RawRequires::Name(name) => builder.requires(&name, []),
                RawRequires::Full { name, modifiers } => {
                    let modifiers = modifiers
                        .iter()
                        .map(|m| RequiresModifier::parse(m))
                        .collect::<Result<Vec<_>, _>>()?;
                    builder.requires(&name, modifiers)
                }
            };
        }
        for package in &raw.exports {
            builder = builder.exports(package);
        }
        for (service, providers) in &raw.provides {
            builder = builder.provides(service, providers);
        }
        if let Some(class) = &raw.main_class {
            builder = builder.main_class(class);
        }
        builder.build()
    }
}

//! Module descriptors.
//!
//! A [`ModuleDescriptor`] is the immutable description of one module: its
//! name, version, dependencies, exported packages, provided services and
//! entry point. Descriptors are only created through [`Builder`], which
//! validates every name it is given.

mod decoder;
mod version;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

pub use decoder::{DESCRIPTOR_FILE, DescriptorDecoder, JsonDescriptorDecoder};
#[cfg(test)]
pub use decoder::MockDescriptorDecoder;
pub use version::{Version, VersionError};

/// Name of the platform's base module; every other module depends on it.
pub const BASE_MODULE: &str = "java.base";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("malformed descriptor")]
    Json(#[from] serde_json::Error),

    #[error("'{0}' is not a legal module name")]
    InvalidModuleName(String),

    #[error("'{name}' is not a legal {what} name")]
    InvalidName { what: &'static str, name: String },

    #[error("module {0} cannot require itself")]
    RequiresSelf(String),

    #[error("unknown requires modifier '{0}'")]
    UnknownModifier(String),

    #[error("service {0} has no providers")]
    NoProviders(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiresModifier {
    Transitive,
    Static,
    Synthetic,
    Mandated,
}

impl RequiresModifier {
    pub fn parse(s: &str) -> Result<Self, DescriptorError> {
        match s {
            "transitive" => Ok(RequiresModifier::Transitive),
            "static" => Ok(RequiresModifier::Static),
            "synthetic" => Ok(RequiresModifier::Synthetic),
            "mandated" => Ok(RequiresModifier::Mandated),
            other => Err(DescriptorError::UnknownModifier(other.to_string())),
        }
    }
}

/// A dependency on another module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Requires {
    pub name: String,
    pub modifiers: BTreeSet<RequiresModifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_version: Option<String>,
    requires: BTreeSet<Requires>,
    exports: BTreeSet<String>,
    provides: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_class: Option<String>,
    is_automatic: bool,
}

impl ModuleDescriptor {
    pub fn builder(name: &str) -> Builder {
        Builder {
            name: name.to_string(),
            version: None,
            raw_version: None,
            requires: BTreeMap::new(),
            exports: BTreeSet::new(),
            provides: BTreeMap::new(),
            main_class: None,
            is_automatic: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// The version string as written, even if it could not be parsed.
    pub fn raw_version(&self) -> Option<&str> {
        self.raw_version.as_deref()
    }

    pub fn requires(&self) -> &BTreeSet<Requires> {
        &self.requires
    }

    pub fn exports(&self) -> &BTreeSet<String> {
        &self.exports
    }

    pub fn provides(&self) -> &BTreeMap<String, Vec<String>> {
        &self.provides
    }

    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    pub fn is_automatic(&self) -> bool {
        self.is_automatic
    }

    /// `name@version`, or just the name when there is no version.
    pub fn to_name_and_version(&self) -> String {
        match &self.raw_version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        }
    }
}

pub struct Builder {
    name: String,
    version: Option<Version>,
    raw_version: Option<String>,
    requires: BTreeMap<String, BTreeSet<RequiresModifier>>,
    exports: BTreeSet<String>,
    provides: BTreeMap<String, Vec<String>>,
    main_class: Option<String>,
    is_automatic: bool,
}

impl Builder {
    pub fn version(mut self, version: Version) -> Self {
        self.raw_version = Some(version.as_str().to_string());
        self.version = Some(version);
        self
    }

    /// Record a version string, keeping it raw when it does not parse.
    pub fn raw_version(mut self, raw: &str) -> Self {
        self.version = Version::parse(raw).ok();
        self.raw_version = Some(raw.to_string());
        self
    }

    pub fn requires(
        mut self,
        name: &str,
        modifiers: impl IntoIterator<Item = RequiresModifier>,
    ) -> Self {
        self.requires
            .entry(name.to_string())
            .or_default()
            .extend(modifiers);
        self
    }

    pub fn exports(mut self, package: &str) -> Self {
        self.exports.insert(package.to_string());
        self
    }

    /// Append providers for `service`, skipping ones already listed.
    pub fn provides(mut self, service: &str, providers: &[String]) -> Self {
        let list = self.provides.entry(service.to_string()).or_default();
        for provider in providers {
            if !list.contains(provider) {
                list.push(provider.clone());
            }
        }
        self
    }

    pub fn main_class(mut self, class: &str) -> Self {
        self.main_class = Some(class.to_string());
        self
    }

    pub fn automatic(mut self, is_automatic: bool) -> Self {
        self.is_automatic = is_automatic;
        self
    }

    pub fn build(self) -> Result<ModuleDescriptor, DescriptorError> {
        if !is_module_name(&self.name) {
            return Err(DescriptorError::InvalidModuleName(self.name));
        }

        let mut requires = BTreeSet::new();
        for (name, modifiers) in self.requires {
            if name == self.name {
                return Err(DescriptorError::RequiresSelf(name));
            }
            if !is_module_name(&name) {
                return Err(DescriptorError::InvalidModuleName(name));
            }
            requires.insert(Requires { name, modifiers });
        }
        if self.name != BASE_MODULE && !requires.iter().any(|r| r.name == BASE_MODULE) {
            requires.insert(Requires {
                name: BASE_MODULE.to_string(),
                modifiers: BTreeSet::from([RequiresModifier::Mandated]),
            });
        }

        for package in &self.exports {
            check_qualified("package", package)?;
        }
        for (service, providers) in &self.provides {
            check_qualified("service type", service)?;
            if providers.is_empty() {
                return Err(DescriptorError::NoProviders(service.clone()));
            }
            for provider in providers {
                check_qualified("provider class", provider)?;
            }
        }
        if let Some(class) = &self.main_class {
            check_qualified("main class", class)?;
        }

        Ok(ModuleDescriptor {
            name: self.name,
            version: self.version,
            raw_version: self.raw_version,
            requires,
            exports: self.exports,
            provides: self.provides,
            main_class: self.main_class,
            is_automatic: self.is_automatic,
        })
    }
}

fn check_qualified(what: &'static str, name: &str) -> Result<(), DescriptorError> {
    if is_qualified_name(name) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidName {
            what,
            name: name.to_string(),
        })
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Module names allow components that start with a digit, since automatic
/// module names are derived from file names such as `foo-1x.jar`.
pub fn is_module_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(is_name_char))
}

/// Dot-separated identifiers, each starting with a non-digit.
pub fn is_qualified_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            part.chars().next().is_some_and(|c| !c.is_ascii_digit())
                && part.chars().all(is_name_char)
        })
}

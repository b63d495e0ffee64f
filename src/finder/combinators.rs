use std::collections::BTreeSet;

use crate::error::FindError;

use super::{ModuleFinder, ModuleReference};

/// Finder that finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Empty;

impl ModuleFinder for Empty {
    fn find(&mut self, _name: &str) -> Result<Option<ModuleReference>, FindError> {
        Ok(None)
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        Ok(Vec::new())
    }
}

/// Finder that looks in `first` and then in `second`.
///
/// When both can find a module of the same name, the one from `first` wins,
/// for single lookups and for [`find_all`](ModuleFinder::find_all) alike.
pub struct Concat<A, B> {
    first: A,
    second: B,
    all: Option<Vec<ModuleReference>>,
}

impl<A: ModuleFinder, B: ModuleFinder> Concat<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            all: None,
        }
    }
}

impl<A: ModuleFinder, B: ModuleFinder> ModuleFinder for Concat<A, B> {
    fn find(&mut self, name: &str) -> Result<Option<ModuleReference>, FindError> {
        match self.first.find(name)? {
            Some(module) => Ok(Some(module)),
            None => self.second.find(name),
        }
    }

    fn find_all(&mut self) -> Result<Vec<ModuleReference>, FindError> {
        if let Some(all) = &self.all {
            return Ok(all.clone());
        }

        let names: BTreeSet<String> = self
            .first
            .find_all()?
            .into_iter()
            .chain(self.second.find_all()?)
            .map(|m| m.name().to_string())
            .collect();

        let mut all = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(module) = self.find(name)? {
                all.push(module);
            }
        }
        self.all = Some(all.clone());
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModuleDescriptor;
    use crate::finder::{ContentSource, MockModuleFinder, ModulePath, empty};
    use crate::test_utils::{descriptor_json, write_exploded, write_jar};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn module(name: &str, dir: &str) -> ModuleReference {
        ModuleReference::new(
            ModuleDescriptor::builder(name).build().unwrap(),
            ContentSource::Exploded(PathBuf::from(dir).join(name)),
        )
    }

    /// A mock finder answering from a fixed set of modules.
    fn finder_of(modules: Vec<ModuleReference>) -> MockModuleFinder {
        let mut finder = MockModuleFinder::new();
        let lookup = modules.clone();
        finder
            .expect_find()
            .returning(move |name| Ok(lookup.iter().find(|m| m.name() == name).cloned()));
        finder.expect_find_all().returning(move || Ok(modules.clone()));
        finder
    }

    #[test]
    fn test_empty() {
        let mut finder = empty();
        assert_eq!(finder.find("java.base").unwrap(), None);
        assert!(finder.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_first_wins() {
        let first = finder_of(vec![module("a", "/one"), module("shared", "/one")]);
        let second = finder_of(vec![module("b", "/two"), module("shared", "/two")]);
        let mut finder = Concat::new(first, second);

        assert_eq!(finder.find("shared").unwrap(), Some(module("shared", "/one")));
        assert_eq!(finder.find("b").unwrap(), Some(module("b", "/two")));
        assert_eq!(finder.find("c").unwrap(), None);

        assert_eq!(
            finder.find_all().unwrap(),
            vec![module("a", "/one"), module("b", "/two"), module("shared", "/one")]
        );
    }

    #[test]
    fn test_second_not_consulted_on_hit() {
        let first = finder_of(vec![module("a", "/one")]);
        // No expectations: any call would panic
        let second = MockModuleFinder::new();

        let mut finder = Concat::new(first, second);
        assert_eq!(finder.find("a").unwrap(), Some(module("a", "/one")));
    }

    #[test]
    fn test_error_propagates() {
        let mut first = MockModuleFinder::new();
        first.expect_find().returning(|_| Err(FindError::Unusable));
        let second = MockModuleFinder::new();

        let mut finder = Concat::new(first, second);
        assert!(matches!(finder.find("a"), Err(FindError::Unusable)));
    }

    #[test]
    fn test_find_all_is_memoized() {
        let mut first = MockModuleFinder::new();
        first
            .expect_find_all()
            .times(1)
            .returning(|| Ok(vec![module("a", "/one")]));
        first
            .expect_find()
            .times(1)
            .returning(|_| Ok(Some(module("a", "/one"))));

        let mut finder = Concat::new(first, empty());
        let all = finder.find_all().unwrap();
        assert_eq!(finder.find_all().unwrap(), all);
    }

    #[test]
    fn test_concat_with_empty_matches_inner_finder() {
        let dir = tempdir().unwrap();
        write_jar(
            &dir.path().join("app.jar"),
            &[("module-info.json", descriptor_json("com.app").as_slice())],
        );
        write_jar(&dir.path().join("foo-1.0.jar"), &[("foo/A.class", b"".as_slice())]);
        write_exploded(&dir.path().join("lib"), "com.lib");

        let mut plain = ModulePath::new([dir.path()]);
        let mut wrapped = Concat::new(ModulePath::new([dir.path()]), empty());

        for name in ["foo", "com.app", "com.lib", "absent"] {
            assert_eq!(wrapped.find(name).unwrap(), plain.find(name).unwrap());
        }
        let all = plain.find_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(wrapped.find_all().unwrap(), all);
    }

    #[test]
    fn test_find_all_error_propagates() {
        let mut first = MockModuleFinder::new();
        first.expect_find_all().returning(|| Err(FindError::Unusable));
        // No expectations: any call would panic
        let second = MockModuleFinder::new();

        let mut finder = Concat::new(first, second);
        assert!(matches!(finder.find_all(), Err(FindError::Unusable)));
    }

    #[test]
    fn test_find_all_error_from_second_propagates() {
        let first = finder_of(vec![module("a", "/one")]);
        let mut second = MockModuleFinder::new();
        second.expect_find_all().returning(|| Err(FindError::Unusable));

        let mut finder = Concat::new(first, second);
        assert!(matches!(finder.find_all(), Err(FindError::Unusable)));
    }

    #[test]
    fn test_boxed_finders_compose() {
        let boxed: Box<dyn ModuleFinder> = Box::new(finder_of(vec![module("a", "/one")]));
        let mut finder = Concat::new(boxed, Box::new(empty()) as Box<dyn ModuleFinder>);
        assert_eq!(finder.find_all().unwrap().len(), 1);
    }
}

//! Named configuration presets persisted as a single JSON document.
//!
//! The store maps a category (for example `lattice` or `scalar-property`) to
//! a map from preset name to an arbitrary JSON blob. It is constructed once
//! with the path of its backing file and handed to whoever needs it. Every
//! mutation rewrites the whole file; there is no locking, so two processes
//! sharing a file can lose each other's updates.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::PresetError;

/// Category names used by the application.
pub mod category {
    /// Complete settings of the main panel ([`crate::LatticeSettings`])
    pub const LATTICE: &str = "lattice";
    /// A single scalar parameter
    pub const SCALAR_PROPERTY: &str = "scalar-property";
    /// A single unit-cell site
    pub const VECTOR_PROPERTY: &str = "vector-property";
    /// A whole list of scalar parameters
    pub const SCALAR_PROPERTY_LIST: &str = "scalar-property-list";
    /// Basis vectors plus unit cell ([`crate::LatticeDefinition`])
    pub const LATTICE_DEFINITION: &str = "lattice-definition";
}

type Category = BTreeMap<String, Value>;

/// In-memory preset store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
    presets: BTreeMap<String, Category>,
}

impl PresetStore {
    /// Opens the store at `path`, loading it if the file exists.
    ///
    /// A missing file is not an error: the store starts empty and the file is
    /// created by the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PresetError> {
        let mut store = Self::empty(path);
        store.reload()?;
        Ok(store)
    }

    /// Creates an empty store for `path` without reading it.
    ///
    /// The file is overwritten by the first mutation.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            presets: BTreeMap::new(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the backing file, replacing the in-memory contents.
    pub fn reload(&mut self) -> Result<(), PresetError> {
        log::info!("Loading presets: {}", self.path.display());
        if !self.path.exists() {
            self.presets.clear();
            return Ok(());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| PresetError::Read {
            path: self.path.clone(),
            source,
        })?;
        self.presets = serde_json::from_str(&text).map_err(|source| PresetError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Writes the whole store to the backing file.
    pub fn save(&self) -> Result<(), PresetError> {
        log::info!("Saving presets: {}", self.path.display());
        let write_err = |source| PresetError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.presets).map_err(|source| {
            PresetError::Write {
                path: self.path.clone(),
                source: std::io::Error::other(source),
            }
        })?;
        std::fs::write(&self.path, json).map_err(write_err)
    }

    /// Preset names of a category in natural order ("item2" before "item10").
    pub fn names(&self, category: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .presets
            .get(category)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    /// Returns the raw blob stored under `(category, name)`.
    pub fn get(&self, category: &str, name: &str) -> Option<&Value> {
        self.presets.get(category).and_then(|c| c.get(name))
    }

    /// Returns the preset under `(category, name)` converted into `T`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if there is no such preset, an error if the stored blob has
    /// the wrong shape.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        category: &str,
        name: &str,
    ) -> Result<Option<T>, PresetError> {
        self.get(category, name)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| PresetError::Convert {
                    category: category.to_string(),
                    name: name.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Inserts or replaces a preset and saves the store.
    ///
    /// The configuration is serialized into an owned JSON value, so later
    /// changes to `config` never reach the stored preset.
    pub fn upsert<T: Serialize + ?Sized>(
        &mut self,
        category: &str,
        name: &str,
        config: &T,
    ) -> Result<(), PresetError> {
        log::info!("Updating preset: {category}: {name}");
        let value = serde_json::to_value(config).map_err(|source| PresetError::Convert {
            category: category.to_string(),
            name: name.to_string(),
            source,
        })?;
        self.presets
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), value);
        self.save()
    }

    /// Removes a preset and saves the store.
    ///
    /// # Returns
    ///
    /// Whether a preset was removed. The file is rewritten either way.
    pub fn delete(&mut self, category: &str, name: &str) -> Result<bool, PresetError> {
        let removed = self
            .presets
            .get_mut(category)
            .and_then(|c| c.remove(name))
            .is_some();
        self.save()?;
        Ok(removed)
    }

    /// All categories with their presets, for inspection and tests.
    pub fn categories(&self) -> &BTreeMap<String, BTreeMap<String, Value>> {
        &self.presets
    }
}

/// Numeric-aware string ordering: digit runs compare by value.
///
/// Letters compare case-insensitively; ties fall back to plain byte order so
/// the ordering stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trim = l_run.trim_start_matches('0');
                let r_trim = r_run.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LatticeSettings, ScalarParameter, UnitCellSite};
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, PresetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::open(dir.path().join("presets.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_natural_order() {
        let mut names = vec!["item10", "item2", "b1", "a2", "Item3", "item1"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a2", "b1", "item1", "item2", "Item3", "item10"]);
    }

    #[test]
    fn test_natural_cmp_leading_zeros_and_ties() {
        assert_eq!(natural_cmp("site02", "site2"), "site02".cmp("site2"));
        assert_eq!(natural_cmp("site9", "site010"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.categories().is_empty());
        assert!(store.names("lattice").is_empty());
        assert!(store.get("lattice", "x").is_none());
    }

    #[test]
    fn test_names_sorted_naturally() {
        let (_dir, mut store) = temp_store();
        store.upsert("cat", "b1", &json!(1)).unwrap();
        store.upsert("cat", "a2", &json!(2)).unwrap();
        store.upsert("cat", "item10", &json!(3)).unwrap();
        store.upsert("cat", "item2", &json!(4)).unwrap();
        assert_eq!(store.names("cat"), vec!["a2", "b1", "item2", "item10"]);
    }

    #[test]
    fn test_upsert_copies_the_configuration() {
        let (_dir, mut store) = temp_store();
        let mut param = ScalarParameter::new("a", "1");
        store
            .upsert(category::SCALAR_PROPERTY, "a", &param)
            .unwrap();

        param.value = "2".to_string();
        param.name = "changed".to_string();

        let stored: ScalarParameter = store
            .get_as(category::SCALAR_PROPERTY, "a")
            .unwrap()
            .unwrap();
        assert_eq!(stored, ScalarParameter::new("a", "1"));
    }

    #[test]
    fn test_every_mutation_persists() {
        let (dir, mut store) = temp_store();
        let path = dir.path().join("presets.json");
        store
            .upsert(category::VECTOR_PROPERTY, "A", &UnitCellSite::new("A", (0.5, 0.0)))
            .unwrap();
        assert!(path.exists());

        let reopened = PresetStore::open(&path).unwrap();
        assert_eq!(reopened.names(category::VECTOR_PROPERTY), vec!["A"]);

        assert!(store.delete(category::VECTOR_PROPERTY, "A").unwrap());
        let reopened = PresetStore::open(&path).unwrap();
        assert!(reopened.names(category::VECTOR_PROPERTY).is_empty());
    }

    #[test]
    fn test_delete_missing_preset_reports_false() {
        let (_dir, mut store) = temp_store();
        assert!(!store.delete("nothing", "here").unwrap());
    }

    #[test]
    fn test_roundtrip_reproduces_mapping() {
        let (dir, mut store) = temp_store();
        store
            .upsert(category::LATTICE, "square", &LatticeSettings::default())
            .unwrap();
        store
            .upsert(category::SCALAR_PROPERTY, "r", &ScalarParameter::new("r", "2.5"))
            .unwrap();
        store
            .upsert("custom", "blob", &json!({"nested": [1, 2, {"k": null}]}))
            .unwrap();

        let reopened = PresetStore::open(dir.path().join("presets.json")).unwrap();
        assert_eq!(reopened.categories(), store.categories());

        let settings: LatticeSettings = reopened
            .get_as(category::LATTICE, "square")
            .unwrap()
            .unwrap();
        assert_eq!(settings, LatticeSettings::default());
    }

    #[test]
    fn test_file_format_is_category_then_name() {
        let (dir, mut store) = temp_store();
        store
            .upsert(category::SCALAR_PROPERTY, "a", &ScalarParameter::new("a", "1"))
            .unwrap();
        let text = std::fs::read_to_string(dir.path().join("presets.json")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"scalar-property": {"a": {"name": "a", "value": "1"}}})
        );
        assert!(text.contains("\n  \""), "expected two-space indentation");
    }

    #[test]
    fn test_get_as_reports_shape_mismatch() {
        let (_dir, mut store) = temp_store();
        store.upsert(category::LATTICE, "bad", &json!(42)).unwrap();
        let result: Result<Option<LatticeSettings>, _> = store.get_as(category::LATTICE, "bad");
        assert!(matches!(result, Err(PresetError::Convert { .. })));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PresetStore::open(&path),
            Err(PresetError::Parse { .. })
        ));
    }
}

use std::collections::BTreeMap;

use anyhow::Result;

use crate::UnitCategory;

/// Host catalog of installed units for one category: unit identifier mapped
/// to the directory slug the unit declares.
///
/// Plugins are identified by their main file (`foo/foo.php`), themes by their
/// directory, so for themes identifier and slug are the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    units: BTreeMap<String, String>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a plugin inventory from plugin file identifiers, deriving each
    /// slug from the identifier's directory.
    pub fn from_plugin_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        files
            .into_iter()
            .map(|file| {
                let file = file.into();
                let slug = plugin_slug(&file).to_string();
                (file, slug)
            })
            .collect()
    }

    pub fn from_theme_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        slugs
            .into_iter()
            .map(|slug| {
                let slug = slug.into();
                (slug.clone(), slug)
            })
            .collect()
    }

    pub fn insert(&mut self, id: impl Into<String>, slug: impl Into<String>) {
        self.units.insert(id.into(), slug.into());
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn slug_of(&self, id: &str) -> Option<&str> {
        self.units.get(id).map(String::as_str)
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.units.values().any(|value| value == slug)
    }

    /// Unit identifiers declared by `slug`, in identifier order.
    pub fn ids_for_slug(&self, slug: &str) -> Vec<&str> {
        self.units
            .iter()
            .filter(|(_, value)| value.as_str() == slug)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units
            .iter()
            .map(|(id, slug)| (id.as_str(), slug.as_str()))
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.units.values().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

/// Directory part of a plugin file identifier. Single-file plugins have no
/// directory and are their own slug.
pub fn plugin_slug(file: &str) -> &str {
    match file.split_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir,
        _ => file,
    }
}

pub trait InventoryProvider {
    fn list_units(&self, category: UnitCategory) -> Result<Inventory>;
}

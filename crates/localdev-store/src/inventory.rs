use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use localdev_core::Inventory;
use tracing::debug;

use crate::SiteLayout;

const PLUGIN_HEADER_SCAN_BYTES: u64 = 8 * 1024;
const PLUGIN_HEADER_MARKER: &str = "Plugin Name:";
const THEME_STYLESHEET: &str = "style.css";

/// Every `<plugins_dir>/<slug>/<file>.php` whose header declares a plugin
/// name, keyed as `<slug>/<file>.php`. A missing plugins directory yields an
/// empty inventory.
pub fn scan_plugins(layout: &SiteLayout) -> Result<Inventory> {
    let mut inventory = Inventory::new();
    for slug in list_subdirectories(layout.plugins_dir())? {
        let dir = layout.plugins_dir().join(&slug);
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read plugin directory: {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) != Some("php") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|v| v.to_str()) else {
                continue;
            };
            if !declares_plugin_header(&path)? {
                continue;
            }
            inventory.insert(format!("{slug}/{file_name}"), slug.clone());
        }
    }

    debug!(
        dir = %layout.plugins_dir().display(),
        units = inventory.len(),
        "scanned plugins"
    );
    Ok(inventory)
}

/// Every `<themes_dir>/<slug>/` holding a `style.css`.
pub fn scan_themes(layout: &SiteLayout) -> Result<Inventory> {
    let slugs = list_subdirectories(layout.themes_dir())?
        .into_iter()
        .filter(|slug| layout.themes_dir().join(slug).join(THEME_STYLESHEET).is_file())
        .collect::<Vec<_>>();
    let inventory = Inventory::from_theme_slugs(slugs);

    debug!(
        dir = %layout.themes_dir().display(),
        units = inventory.len(),
        "scanned themes"
    );
    Ok(inventory)
}

fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn declares_plugin_header(path: &Path) -> Result<bool> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open plugin file: {}", path.display()))?;
    let mut head = Vec::new();
    file.take(PLUGIN_HEADER_SCAN_BYTES)
        .read_to_end(&mut head)
        .with_context(|| format!("failed to read plugin file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&head).contains(PLUGIN_HEADER_MARKER))
}

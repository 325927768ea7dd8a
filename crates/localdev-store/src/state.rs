use std::fs;
use std::io;

use anyhow::{Context, Result};
use localdev_core::OverrideState;

use crate::fs_utils::write_atomic;
use crate::SiteLayout;

pub fn read_overrides(layout: &SiteLayout) -> Result<OverrideState> {
    let path = layout.overrides_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(OverrideState::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed reading override state: {}", path.display()));
        }
    };

    OverrideState::from_toml_str(&raw)
        .with_context(|| format!("failed parsing override state: {}", path.display()))
}

pub fn write_overrides(layout: &SiteLayout, state: &OverrideState) -> Result<()> {
    let path = layout.overrides_path();
    let content = state
        .to_toml_string()
        .with_context(|| format!("failed serializing override state: {}", path.display()))?;
    write_atomic(&path, content.as_bytes())
        .with_context(|| format!("failed writing override state: {}", path.display()))
}

/// Active plugin identifiers in activation order, one per line. Blank lines
/// and `#` comments are skipped.
pub fn read_active_plugins(layout: &SiteLayout) -> Result<Vec<String>> {
    let path = layout.active_plugins_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed reading active plugins: {}", path.display()));
        }
    };

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub fn write_active_plugins(layout: &SiteLayout, plugins: &[String]) -> Result<()> {
    let path = layout.active_plugins_path();
    let mut payload = String::new();
    for plugin in plugins {
        payload.push_str(plugin);
        payload.push('\n');
    }
    write_atomic(&path, payload.as_bytes())
        .with_context(|| format!("failed writing active plugins: {}", path.display()))
}

pub fn read_active_theme(layout: &SiteLayout) -> Result<Option<String>> {
    let path = layout.active_theme_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed reading active theme: {}", path.display()));
        }
    };

    let theme = raw.trim();
    if theme.is_empty() {
        return Ok(None);
    }
    Ok(Some(theme.to_string()))
}

pub fn write_active_theme(layout: &SiteLayout, theme: &str) -> Result<()> {
    let path = layout.active_theme_path();
    write_atomic(&path, format!("{theme}\n").as_bytes())
        .with_context(|| format!("failed writing active theme: {}", path.display()))
}

use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use localdev_core::{VariantNaming, DEFAULT_LOCAL_PREFIX, DEFAULT_SELF_SLUG};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "localdev.toml";

/// Site settings read from `localdev.toml` at the site root. Every field is
/// optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_self_slug")]
    pub self_slug: String,
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: String,
    #[serde(default = "default_themes_dir")]
    pub themes_dir: String,
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            self_slug: default_self_slug(),
            plugins_dir: default_plugins_dir(),
            themes_dir: default_themes_dir(),
            state_dir: default_state_dir(),
        }
    }
}

impl SiteConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse site config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `<root>/localdev.toml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed reading site config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid site config: {}", path.display()))
    }

    pub fn naming(&self) -> Result<VariantNaming> {
        VariantNaming::new(self.prefix.clone(), self.self_slug.clone())
    }

    fn validate(&self) -> Result<()> {
        self.naming()?;
        for (field, value) in [
            ("plugins_dir", &self.plugins_dir),
            ("themes_dir", &self.themes_dir),
            ("state_dir", &self.state_dir),
        ] {
            validate_relative_dir(field, value)?;
        }
        Ok(())
    }
}

fn validate_relative_dir(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{field} must not be empty");
    }
    let path = Path::new(value);
    if path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
    {
        anyhow::bail!("{field} must be a relative path inside the site root: {value}");
    }
    Ok(())
}

fn default_prefix() -> String {
    DEFAULT_LOCAL_PREFIX.to_string()
}

fn default_self_slug() -> String {
    DEFAULT_SELF_SLUG.to_string()
}

fn default_plugins_dir() -> String {
    "plugins".to_string()
}

fn default_themes_dir() -> String {
    "themes".to_string()
}

fn default_state_dir() -> String {
    ".localdev".to_string()
}

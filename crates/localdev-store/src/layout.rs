use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::SiteConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    root: PathBuf,
    plugins_dir: PathBuf,
    themes_dir: PathBuf,
    state_dir: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        let root = root.into();
        Self {
            plugins_dir: root.join(&config.plugins_dir),
            themes_dir: root.join(&config.themes_dir),
            state_dir: root.join(&config.state_dir),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.state_dir.join("overrides.toml")
    }

    pub fn active_plugins_path(&self) -> PathBuf {
        self.state_dir.join("active_plugins")
    }

    pub fn active_theme_path(&self) -> PathBuf {
        self.state_dir.join("active_theme")
    }

    pub fn transactions_dir(&self) -> PathBuf {
        self.state_dir.join("transactions")
    }

    pub fn transaction_active_path(&self) -> PathBuf {
        self.transactions_dir().join("active")
    }

    pub fn transaction_metadata_path(&self, txid: &str) -> PathBuf {
        self.transactions_dir().join(format!("{txid}.json"))
    }

    pub fn transaction_journal_path(&self, txid: &str) -> PathBuf {
        self.transactions_dir().join(format!("{txid}.journal"))
    }

    pub fn ensure_state_dirs(&self) -> Result<()> {
        for dir in [self.state_dir.clone(), self.transactions_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Site root from `LOCALDEV_SITE_ROOT`, else the current directory.
pub fn default_site_root() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os("LOCALDEV_SITE_ROOT") {
        if !root.is_empty() {
            return Ok(PathBuf::from(root));
        }
    }
    std::env::current_dir().context("cannot resolve current directory as site root")
}

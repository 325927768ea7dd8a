use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{UnitCategory, VariantKind};

/// Per-category set of base identifiers forced to their local variant.
///
/// A base identifier that is absent resolves to the VCS variant. Entries for
/// bases that are no longer paired stay in the record and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideState {
    #[serde(default = "override_state_version")]
    pub version: u32,
    #[serde(default)]
    pub plugins: BTreeSet<String>,
    #[serde(default)]
    pub themes: BTreeSet<String>,
}

impl Default for OverrideState {
    fn default() -> Self {
        Self {
            version: override_state_version(),
            plugins: BTreeSet::new(),
            themes: BTreeSet::new(),
        }
    }
}

impl OverrideState {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let state: Self = toml::from_str(input).context("failed to parse override state")?;
        let expected = override_state_version();
        if state.version != expected {
            anyhow::bail!(
                "unsupported override state version {} (expected {})",
                state.version,
                expected
            );
        }
        Ok(state)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("failed to serialize override state")
    }

    pub fn category(&self, category: UnitCategory) -> &BTreeSet<String> {
        match category {
            UnitCategory::Plugins => &self.plugins,
            UnitCategory::Themes => &self.themes,
        }
    }

    fn category_mut(&mut self, category: UnitCategory) -> &mut BTreeSet<String> {
        match category {
            UnitCategory::Plugins => &mut self.plugins,
            UnitCategory::Themes => &mut self.themes,
        }
    }

    pub fn is_local(&self, category: UnitCategory, base: &str) -> bool {
        self.category(category).contains(base)
    }

    pub fn effective_kind(&self, category: UnitCategory, base: &str) -> VariantKind {
        if self.is_local(category, base) {
            VariantKind::Local
        } else {
            VariantKind::Vcs
        }
    }

    /// Forces `base` to `kind`. Returns whether the record changed.
    pub fn set_kind(&mut self, category: UnitCategory, base: &str, kind: VariantKind) -> bool {
        let entries = self.category_mut(category);
        match kind {
            VariantKind::Local => entries.insert(base.to_string()),
            VariantKind::Vcs => entries.remove(base),
        }
    }

    /// Flips `base` and returns the kind that is effective afterwards.
    pub fn toggle(&mut self, category: UnitCategory, base: &str) -> VariantKind {
        let next = self.effective_kind(category, base).opposite();
        self.set_kind(category, base, next);
        next
    }

    /// Override entries whose base is not in `pairs`.
    pub fn stale_entries(&self, category: UnitCategory, pairs: &BTreeSet<String>) -> Vec<String> {
        self.category(category)
            .iter()
            .filter(|base| !pairs.contains(*base))
            .cloned()
            .collect()
    }
}

fn override_state_version() -> u32 {
    1
}

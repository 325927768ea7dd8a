use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCAL_PREFIX: &str = "localdev-";
pub const DEFAULT_SELF_SLUG: &str = "localdev-switcher";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Plugins,
    Themes,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 2] = [UnitCategory::Plugins, UnitCategory::Themes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugins => "plugins",
            Self::Themes => "themes",
        }
    }

    /// Singular noun used in messages ("plugin pair", "theme pair").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Plugins => "plugin",
            Self::Themes => "theme",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plugins" | "plugin" => Ok(Self::Plugins),
            "themes" | "theme" => Ok(Self::Themes),
            other => Err(anyhow!("invalid unit category: {other}")),
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Vcs,
    Local,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vcs => "vcs",
            Self::Local => "local",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Vcs => Self::Local,
            Self::Local => Self::Vcs,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming rules shared by every operation: the prefix that marks a local
/// development copy and the slug of the switcher itself, which never takes
/// part in pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantNaming {
    prefix: String,
    self_slug: String,
}

impl Default for VariantNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_LOCAL_PREFIX.to_string(),
            self_slug: DEFAULT_SELF_SLUG.to_string(),
        }
    }
}

impl VariantNaming {
    pub fn new(prefix: impl Into<String>, self_slug: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let self_slug = self_slug.into();
        validate_prefix(&prefix)?;
        if self_slug.trim().is_empty() {
            return Err(anyhow!("self slug must not be empty"));
        }
        Ok(Self { prefix, self_slug })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn self_slug(&self) -> &str {
        &self.self_slug
    }

    pub fn is_self(&self, slug: &str) -> bool {
        slug == self.self_slug
    }

    /// Splits a slug into its base identifier and variant kind.
    ///
    /// A slug equal to the bare prefix has nothing left to name, so it is
    /// treated as a VCS unit whose base is the slug itself.
    pub fn classify(&self, slug: &str) -> (String, VariantKind) {
        match slug.strip_prefix(self.prefix.as_str()) {
            Some(base) if !base.is_empty() => (base.to_string(), VariantKind::Local),
            _ => (slug.to_string(), VariantKind::Vcs),
        }
    }

    pub fn kind_of(&self, slug: &str) -> VariantKind {
        self.classify(slug).1
    }

    pub fn variant_id(&self, base: &str, kind: VariantKind) -> String {
        match kind {
            VariantKind::Vcs => base.to_string(),
            VariantKind::Local => format!("{}{}", self.prefix, base),
        }
    }

    pub fn twin(&self, slug: &str) -> String {
        let (base, kind) = self.classify(slug);
        self.variant_id(&base, kind.opposite())
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(anyhow!("local variant prefix must not be empty"));
    }
    if !prefix
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        return Err(anyhow!(
            "local variant prefix contains invalid character(s): {prefix}"
        ));
    }
    Ok(())
}

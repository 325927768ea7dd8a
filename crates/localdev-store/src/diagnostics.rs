use anyhow::Result;
use localdev_core::{
    detect_pairs, plugin_slug, InventoryProvider, SwitchStateStore, UnitCategory, VariantKind,
};

use crate::transactions::{read_active_transaction, read_transaction_metadata};
use crate::Site;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

impl DiagnosticSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticFinding {
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl DiagnosticFinding {
    fn info(code: &'static str, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            code,
            message,
        }
    }

    fn warning(code: &'static str, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code,
            message,
        }
    }
}

pub fn diagnose_site(site: &Site) -> Result<Vec<DiagnosticFinding>> {
    let layout = site.layout();
    let naming = site.naming();
    let mut findings = Vec::new();

    for (category, dir) in [
        (UnitCategory::Plugins, layout.plugins_dir()),
        (UnitCategory::Themes, layout.themes_dir()),
    ] {
        if !dir.is_dir() {
            findings.push(DiagnosticFinding::warning(
                "missing-unit-dir",
                format!("{} directory not found: {}", category, dir.display()),
            ));
        }
    }

    let plugins = site.list_units(UnitCategory::Plugins)?;
    let themes = site.list_units(UnitCategory::Themes)?;
    let has_local_units = plugins
        .slugs()
        .chain(themes.slugs())
        .any(|slug| !naming.is_self(slug) && naming.kind_of(slug) == VariantKind::Local);
    if !has_local_units {
        findings.push(DiagnosticFinding::info(
            "no-local-units",
            format!(
                "no local development units found; create {}/{}<slug>/ next to the VCS copy to pair it",
                layout.plugins_dir().display(),
                naming.prefix()
            ),
        ));
    }

    let overrides = site.read_overrides()?;
    for (category, inventory) in [
        (UnitCategory::Plugins, &plugins),
        (UnitCategory::Themes, &themes),
    ] {
        let pairs = detect_pairs(inventory, naming);
        for base in overrides.stale_entries(category, &pairs) {
            findings.push(DiagnosticFinding::warning(
                "stale-override",
                format!(
                    "{} override '{}' has no pair installed and is ignored",
                    category.noun(),
                    base
                ),
            ));
        }
    }

    for entry in site.read_active_plugins()? {
        if !plugins.contains_id(&entry) {
            findings.push(DiagnosticFinding::warning(
                "missing-active-plugin",
                format!(
                    "active plugin '{}' is not installed (slug '{}')",
                    entry,
                    plugin_slug(&entry)
                ),
            ));
        }
    }
    if let Some(theme) = site.read_active_theme()? {
        if !themes.contains_id(&theme) {
            findings.push(DiagnosticFinding::warning(
                "missing-active-theme",
                format!("active theme '{theme}' is not installed"),
            ));
        }
    }

    if let Some(txid) = read_active_transaction(layout)? {
        let metadata = read_transaction_metadata(layout, &txid)?;
        let finished = metadata
            .as_ref()
            .is_some_and(|metadata| metadata.status.allows_stale_marker_cleanup());
        let status = metadata
            .map(|metadata| metadata.status.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let hint = if finished {
            "the transaction already finished; the next operation clears the marker"
        } else {
            "remove it if no switcher process is running"
        };
        findings.push(DiagnosticFinding::warning(
            "active-transaction",
            format!(
                "transaction marker {} held by {txid} (status={status}): {hint}",
                layout.transaction_active_path().display()
            ),
        ));
    }

    Ok(findings)
}

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    detect_pairs, plugin_slug, Inventory, OverrideState, PairSet, SwitchStateStore, UnitCategory,
    VariantKind, VariantNaming,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error(
        "'{base}' is not a {noun} pair: '{base}' and '{local_slug}' must both be installed",
        noun = .category.noun()
    )]
    NotAPair {
        category: UnitCategory,
        base: String,
        local_slug: String,
    },
    #[error(
        "{noun} pair '{base}' has no installed unit for '{missing_slug}'",
        noun = .category.noun()
    )]
    InventoryInconsistency {
        category: UnitCategory,
        base: String,
        missing_slug: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleReport {
    pub category: UnitCategory,
    pub base: String,
    pub from: VariantKind,
    pub to: VariantKind,
    /// Unit identifier that was effective before the toggle.
    pub deactivated: String,
    /// Unit identifier that is effective now.
    pub activated: String,
    /// Active-set entries that were rewritten.
    pub rewritten: usize,
}

#[derive(Debug)]
pub enum ToggleOutcome {
    Applied(ToggleReport),
    Rejected(RejectReason),
    Failed(anyhow::Error),
}

impl ToggleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_result(self) -> Result<std::result::Result<ToggleReport, RejectReason>> {
        match self {
            Self::Applied(report) => Ok(Ok(report)),
            Self::Rejected(reason) => Ok(Err(reason)),
            Self::Failed(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRewrite {
    pub category: UnitCategory,
    pub base: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginTogglePlan {
    pub report: ToggleReport,
    pub overrides: OverrideState,
    pub active_plugins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeTogglePlan {
    pub report: ToggleReport,
    pub overrides: OverrideState,
    pub previous_theme: Option<String>,
    pub active_theme: String,
}

/// Computes the state after toggling plugin pair `base` without touching
/// any store.
pub fn plan_plugin_toggle(
    inventory: &Inventory,
    pairs: &PairSet,
    naming: &VariantNaming,
    overrides: &OverrideState,
    active_plugins: &[String],
    base: &str,
) -> std::result::Result<PluginTogglePlan, RejectReason> {
    let category = UnitCategory::Plugins;
    ensure_pair(category, pairs, naming, base)?;
    let (vcs_file, local_file) = resolve_plugin_files(inventory, naming, base)?;

    let mut next = overrides.clone();
    let from = overrides.effective_kind(category, base);
    let to = next.toggle(category, base);
    let (old_file, new_file) = match to {
        VariantKind::Local => (vcs_file, local_file),
        VariantKind::Vcs => (local_file, vcs_file),
    };
    let (active_plugins, rewritten) = replace_active_entry(active_plugins, &old_file, &new_file);

    Ok(PluginTogglePlan {
        report: ToggleReport {
            category,
            base: base.to_string(),
            from,
            to,
            deactivated: old_file,
            activated: new_file,
            rewritten,
        },
        overrides: next,
        active_plugins,
    })
}

/// Computes the state after toggling theme pair `base`. The active theme is
/// always moved to the newly effective variant.
pub fn plan_theme_toggle(
    inventory: &Inventory,
    pairs: &PairSet,
    naming: &VariantNaming,
    overrides: &OverrideState,
    active_theme: Option<&str>,
    base: &str,
) -> std::result::Result<ThemeTogglePlan, RejectReason> {
    let category = UnitCategory::Themes;
    ensure_pair(category, pairs, naming, base)?;
    let vcs_theme = first_unit_for_slug(inventory, category, base, base)?;
    let local_slug = naming.variant_id(base, VariantKind::Local);
    let local_theme = first_unit_for_slug(inventory, category, base, &local_slug)?;

    let mut next = overrides.clone();
    let from = overrides.effective_kind(category, base);
    let to = next.toggle(category, base);
    let (old_theme, new_theme) = match to {
        VariantKind::Local => (vcs_theme, local_theme),
        VariantKind::Vcs => (local_theme, vcs_theme),
    };
    if active_theme.is_some_and(|current| current != old_theme) {
        debug!(
            base,
            active = active_theme.unwrap_or_default(),
            "active theme was not the effective variant of the toggled pair"
        );
    }
    let rewritten = usize::from(active_theme != Some(new_theme.as_str()));

    Ok(ThemeTogglePlan {
        report: ToggleReport {
            category,
            base: base.to_string(),
            from,
            to,
            deactivated: old_theme,
            activated: new_theme.clone(),
            rewritten,
        },
        overrides: next,
        previous_theme: active_theme.map(str::to_string),
        active_theme: new_theme,
    })
}

/// Applies toggles and reconciliation against a [`SwitchStateStore`].
pub struct ToggleEngine<'a, S> {
    store: &'a S,
    naming: &'a VariantNaming,
}

impl<'a, S: SwitchStateStore> ToggleEngine<'a, S> {
    pub fn new(store: &'a S, naming: &'a VariantNaming) -> Self {
        Self { store, naming }
    }

    pub fn toggle_plugin(&self, inventory: &Inventory, pairs: &PairSet, base: &str) -> ToggleOutcome {
        if let Err(reason) = ensure_pair(UnitCategory::Plugins, pairs, self.naming, base) {
            return rejected(reason);
        }

        let result = self.store.with_exclusive("toggle-plugin", || {
            let overrides = self.store.read_overrides()?;
            let active = self.store.read_active_plugins()?;
            let plan =
                match plan_plugin_toggle(inventory, pairs, self.naming, &overrides, &active, base) {
                    Ok(plan) => plan,
                    Err(reason) => return Ok(Err(reason)),
                };

            commit_with_rollback(self.store, &overrides, &plan.overrides, || {
                if plan.report.rewritten == 0 {
                    return Ok(());
                }
                self.store
                    .write_active_plugins(&plan.active_plugins)
                    .context("failed to write active plugins")
            })?;
            Ok(Ok(plan.report))
        });

        finish(result)
    }

    pub fn toggle_theme(&self, inventory: &Inventory, pairs: &PairSet, base: &str) -> ToggleOutcome {
        if let Err(reason) = ensure_pair(UnitCategory::Themes, pairs, self.naming, base) {
            return rejected(reason);
        }

        let result = self.store.with_exclusive("toggle-theme", || {
            let overrides = self.store.read_overrides()?;
            let active = self.store.read_active_theme()?;
            let plan = match plan_theme_toggle(
                inventory,
                pairs,
                self.naming,
                &overrides,
                active.as_deref(),
                base,
            ) {
                Ok(plan) => plan,
                Err(reason) => return Ok(Err(reason)),
            };

            commit_with_rollback(self.store, &overrides, &plan.overrides, || {
                if plan.report.rewritten == 0 {
                    return Ok(());
                }
                self.store
                    .set_active_theme(&plan.active_theme)
                    .context("failed to set active theme")
            })?;
            Ok(Ok(plan.report))
        });

        finish(result)
    }

    /// Rewrites active entries that name the losing twin of a pair so they
    /// name the effective variant instead. Nothing is written when every
    /// entry already agrees with the overrides.
    pub fn reconcile(&self, plugins: &Inventory, themes: &Inventory) -> Result<Vec<ActiveRewrite>> {
        let plugin_pairs = detect_pairs(plugins, self.naming);
        let theme_pairs = detect_pairs(themes, self.naming);

        self.store.with_exclusive("reconcile", || {
            let overrides = self.store.read_overrides()?;
            let active = self.store.read_active_plugins()?;
            let (next_active, mut rewrites) =
                reconcile_plugins(plugins, &plugin_pairs, self.naming, &overrides, &active);
            if !rewrites.is_empty() {
                self.store
                    .write_active_plugins(&next_active)
                    .context("failed to write active plugins")?;
            }

            if let Some(theme) = self.store.read_active_theme()? {
                if let Some(rewrite) =
                    reconcile_theme(themes, &theme_pairs, self.naming, &overrides, &theme)
                {
                    self.store
                        .set_active_theme(&rewrite.to)
                        .context("failed to set active theme")?;
                    rewrites.push(rewrite);
                }
            }

            for rewrite in &rewrites {
                info!(
                    category = rewrite.category.as_str(),
                    from = rewrite.from.as_str(),
                    to = rewrite.to.as_str(),
                    "reconciled active unit"
                );
            }
            Ok(rewrites)
        })
    }
}

fn ensure_pair(
    category: UnitCategory,
    pairs: &PairSet,
    naming: &VariantNaming,
    base: &str,
) -> std::result::Result<(), RejectReason> {
    if pairs.contains(base) && !naming.is_self(base) {
        return Ok(());
    }
    Err(RejectReason::NotAPair {
        category,
        base: base.to_string(),
        local_slug: naming.variant_id(base, VariantKind::Local),
    })
}

fn rejected(reason: RejectReason) -> ToggleOutcome {
    match &reason {
        RejectReason::NotAPair { .. } => debug!(%reason, "toggle rejected"),
        RejectReason::InventoryInconsistency { .. } => warn!(%reason, "toggle rejected"),
    }
    ToggleOutcome::Rejected(reason)
}

fn finish(result: Result<std::result::Result<ToggleReport, RejectReason>>) -> ToggleOutcome {
    match result {
        Ok(Ok(report)) => {
            info!(
                category = report.category.as_str(),
                base = report.base.as_str(),
                to = report.to.as_str(),
                activated = report.activated.as_str(),
                rewritten = report.rewritten,
                "toggle applied"
            );
            ToggleOutcome::Applied(report)
        }
        Ok(Err(reason)) => rejected(reason),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "toggle failed");
            ToggleOutcome::Failed(err)
        }
    }
}

/// Writes `next`, then runs `write_active`. When either write fails the
/// previous override record is written back so the two never disagree.
fn commit_with_rollback<S, F>(
    store: &S,
    previous: &OverrideState,
    next: &OverrideState,
    write_active: F,
) -> Result<()>
where
    S: SwitchStateStore,
    F: FnOnce() -> Result<()>,
{
    if let Err(err) = store.write_overrides(next) {
        warn!("override state write failed; restoring previous override state");
        return Err(restore_overrides(
            store,
            previous,
            err.context("failed to write override state"),
        ));
    }

    if let Err(err) = write_active() {
        warn!("active state write failed; restoring previous override state");
        return Err(restore_overrides(store, previous, err));
    }
    Ok(())
}

fn restore_overrides<S: SwitchStateStore>(
    store: &S,
    previous: &OverrideState,
    err: anyhow::Error,
) -> anyhow::Error {
    match store.write_overrides(previous) {
        Ok(()) => err,
        Err(restore_err) => anyhow!(
            "{err:#}; additionally failed to restore override state: {restore_err:#}"
        ),
    }
}

fn resolve_plugin_files(
    inventory: &Inventory,
    naming: &VariantNaming,
    base: &str,
) -> std::result::Result<(String, String), RejectReason> {
    let category = UnitCategory::Plugins;
    let local_slug = naming.variant_id(base, VariantKind::Local);
    let vcs_files = inventory.ids_for_slug(base);
    let local_files = inventory.ids_for_slug(&local_slug);
    if vcs_files.is_empty() {
        return Err(inconsistency(category, base, base));
    }
    if local_files.is_empty() {
        return Err(inconsistency(category, base, &local_slug));
    }

    for vcs_file in &vcs_files {
        if let Some(local_file) = counterpart_file(&local_files, vcs_file) {
            return Ok((vcs_file.to_string(), local_file.to_string()));
        }
    }
    Ok((vcs_files[0].to_string(), local_files[0].to_string()))
}

fn first_unit_for_slug(
    inventory: &Inventory,
    category: UnitCategory,
    base: &str,
    slug: &str,
) -> std::result::Result<String, RejectReason> {
    inventory
        .ids_for_slug(slug)
        .first()
        .map(|id| id.to_string())
        .ok_or_else(|| inconsistency(category, base, slug))
}

fn inconsistency(category: UnitCategory, base: &str, missing_slug: &str) -> RejectReason {
    RejectReason::InventoryInconsistency {
        category,
        base: base.to_string(),
        missing_slug: missing_slug.to_string(),
    }
}

fn file_name(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

fn counterpart_file<'a>(candidates: &[&'a str], file: &str) -> Option<&'a str> {
    let wanted = file_name(file);
    candidates
        .iter()
        .copied()
        .find(|candidate| file_name(candidate) == wanted)
}

/// Replaces every `old` entry with `new`, keeping order and dropping later
/// duplicates. Returns the rewritten list and the number of replacements.
fn replace_active_entry(active: &[String], old: &str, new: &str) -> (Vec<String>, usize) {
    let mut rewritten = 0;
    let replaced = active.iter().map(|entry| {
        if entry == old {
            rewritten += 1;
            new.to_string()
        } else {
            entry.clone()
        }
    });
    let deduped = dedup_preserving_order(replaced.collect());
    (deduped, rewritten)
}

fn dedup_preserving_order(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

fn reconcile_plugins(
    inventory: &Inventory,
    pairs: &PairSet,
    naming: &VariantNaming,
    overrides: &OverrideState,
    active: &[String],
) -> (Vec<String>, Vec<ActiveRewrite>) {
    let category = UnitCategory::Plugins;
    let mut rewrites = Vec::new();
    let mut next = Vec::with_capacity(active.len());

    for entry in active {
        let slug = inventory
            .slug_of(entry)
            .unwrap_or_else(|| plugin_slug(entry));
        let (base, kind) = naming.classify(slug);
        let effective = overrides.effective_kind(category, &base);
        if !pairs.contains(&base) || naming.is_self(slug) || kind == effective {
            next.push(entry.clone());
            continue;
        }

        let target_slug = naming.variant_id(&base, effective);
        let candidates = inventory.ids_for_slug(&target_slug);
        let target = counterpart_file(&candidates, entry).or_else(|| candidates.first().copied());
        match target {
            Some(target) => {
                rewrites.push(ActiveRewrite {
                    category,
                    base,
                    from: entry.clone(),
                    to: target.to_string(),
                });
                next.push(target.to_string());
            }
            None => {
                warn!(
                    entry = entry.as_str(),
                    slug = target_slug.as_str(),
                    "effective variant has no plugin file; leaving entry as is"
                );
                next.push(entry.clone());
            }
        }
    }

    (dedup_preserving_order(next), rewrites)
}

fn reconcile_theme(
    inventory: &Inventory,
    pairs: &PairSet,
    naming: &VariantNaming,
    overrides: &OverrideState,
    theme: &str,
) -> Option<ActiveRewrite> {
    let category = UnitCategory::Themes;
    let slug = inventory.slug_of(theme).unwrap_or(theme);
    let (base, kind) = naming.classify(slug);
    if !pairs.contains(&base) || naming.is_self(slug) {
        return None;
    }
    let effective = overrides.effective_kind(category, &base);
    if kind == effective {
        return None;
    }
    let target_slug = naming.variant_id(&base, effective);
    let target = first_unit_for_slug(inventory, category, &base, &target_slug).ok()?;
    Some(ActiveRewrite {
        category,
        base,
        from: theme.to_string(),
        to: target,
    })
}

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use localdev_core::{
    detect_pairs, variant_statuses, ActiveRewrite, Inventory, InventoryProvider, ListingFilter,
    OverrideState, PairSet, SwitchStateStore, ToggleEngine, ToggleOutcome, UnitCategory,
    VariantNaming, VariantStatus,
};

use tracing::warn;

use crate::transactions::{append_transaction_journal_entry, execute_with_transaction};
use crate::{
    read_active_plugins, read_active_theme, read_overrides, scan_plugins, scan_themes,
    write_active_plugins, write_active_theme, write_overrides, SiteConfig, SiteLayout,
    TransactionJournalEntry,
};

#[derive(Debug)]
struct JournalCursor {
    txid: String,
    next_seq: u64,
}

/// A site on disk: unit directories plus the switcher's state directory.
#[derive(Debug)]
pub struct Site {
    layout: SiteLayout,
    config: SiteConfig,
    naming: VariantNaming,
    journal: RefCell<Option<JournalCursor>>,
}

impl Site {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = SiteConfig::load(&root)?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: impl Into<PathBuf>, config: SiteConfig) -> Result<Self> {
        let naming = config.naming().context("invalid variant naming in site config")?;
        Ok(Self {
            layout: SiteLayout::new(root, &config),
            config,
            naming,
            journal: RefCell::new(None),
        })
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn naming(&self) -> &VariantNaming {
        &self.naming
    }

    pub fn pairs(&self, category: UnitCategory) -> Result<PairSet> {
        let inventory = self.list_units(category)?;
        Ok(detect_pairs(&inventory, &self.naming))
    }

    pub fn listing_filter(&self, category: UnitCategory) -> Result<ListingFilter> {
        let inventory = self.list_units(category)?;
        self.listing_filter_for(category, &inventory)
    }

    fn listing_filter_for(
        &self,
        category: UnitCategory,
        inventory: &Inventory,
    ) -> Result<ListingFilter> {
        let pairs = detect_pairs(inventory, &self.naming);
        let overrides = self.read_overrides()?;
        let active_theme = match category {
            UnitCategory::Themes => self.read_active_theme()?,
            UnitCategory::Plugins => None,
        };
        Ok(ListingFilter::new(
            category,
            &self.naming,
            &pairs,
            &overrides,
            active_theme.as_deref(),
        ))
    }

    /// Installed units of `category` with the losing twin of each pair removed.
    pub fn filtered_listing(&self, category: UnitCategory) -> Result<Inventory> {
        let inventory = self.list_units(category)?;
        let filter = self.listing_filter_for(category, &inventory)?;
        Ok(filter.apply(&inventory))
    }

    pub fn statuses(&self, category: UnitCategory) -> Result<Vec<VariantStatus>> {
        let pairs = self.pairs(category)?;
        let overrides = self.read_overrides()?;
        Ok(variant_statuses(category, &self.naming, &pairs, &overrides))
    }

    pub fn toggle(&self, category: UnitCategory, base: &str) -> ToggleOutcome {
        let inventory = match self.list_units(category) {
            Ok(inventory) => inventory,
            Err(err) => return ToggleOutcome::Failed(err),
        };
        let pairs = detect_pairs(&inventory, &self.naming);
        let engine = ToggleEngine::new(self, &self.naming);
        match category {
            UnitCategory::Plugins => engine.toggle_plugin(&inventory, &pairs, base),
            UnitCategory::Themes => engine.toggle_theme(&inventory, &pairs, base),
        }
    }

    pub fn reconcile(&self) -> Result<Vec<ActiveRewrite>> {
        let plugins = self.list_units(UnitCategory::Plugins)?;
        let themes = self.list_units(UnitCategory::Themes)?;
        ToggleEngine::new(self, &self.naming).reconcile(&plugins, &themes)
    }

    /// Appends `id` to the active plugins unless it is already active.
    pub fn activate_plugin(&self, id: &str) -> Result<bool> {
        let inventory = self.list_units(UnitCategory::Plugins)?;
        if !inventory.contains_id(id) {
            anyhow::bail!("plugin '{id}' is not installed");
        }
        self.with_exclusive("activate-plugin", || {
            let mut active = self.read_active_plugins()?;
            if active.iter().any(|entry| entry == id) {
                return Ok(false);
            }
            active.push(id.to_string());
            self.write_active_plugins(&active)?;
            Ok(true)
        })
    }

    pub fn deactivate_plugin(&self, id: &str) -> Result<bool> {
        self.with_exclusive("deactivate-plugin", || {
            let mut active = self.read_active_plugins()?;
            let before = active.len();
            active.retain(|entry| entry != id);
            if active.len() == before {
                return Ok(false);
            }
            self.write_active_plugins(&active)?;
            Ok(true)
        })
    }

    pub fn activate_theme(&self, id: &str) -> Result<()> {
        let inventory = self.list_units(UnitCategory::Themes)?;
        if !inventory.contains_id(id) {
            anyhow::bail!("theme '{id}' is not installed");
        }
        self.with_exclusive("activate-theme", || self.set_active_theme(id))
    }

    /// Journals a state write that already happened. A journal failure is
    /// logged and never reported as a failure of the write itself.
    fn record_step(&self, step: &str, path: &Path) {
        let mut journal = self.journal.borrow_mut();
        let Some(cursor) = journal.as_mut() else {
            return;
        };
        let entry = TransactionJournalEntry {
            seq: cursor.next_seq,
            step: step.to_string(),
            state: "done".to_string(),
            path: Some(path.display().to_string()),
        };
        cursor.next_seq += 1;
        if let Err(err) = append_transaction_journal_entry(&self.layout, &cursor.txid, &entry) {
            warn!(
                txid = cursor.txid.as_str(),
                step,
                error = %format!("{err:#}"),
                "failed to journal completed state write"
            );
        }
    }
}

impl InventoryProvider for Site {
    fn list_units(&self, category: UnitCategory) -> Result<Inventory> {
        match category {
            UnitCategory::Plugins => scan_plugins(&self.layout),
            UnitCategory::Themes => scan_themes(&self.layout),
        }
    }
}

impl SwitchStateStore for Site {
    fn read_overrides(&self) -> Result<OverrideState> {
        read_overrides(&self.layout)
    }

    fn write_overrides(&self, state: &OverrideState) -> Result<()> {
        write_overrides(&self.layout, state)?;
        self.record_step("write_overrides", &self.layout.overrides_path());
        Ok(())
    }

    fn read_active_plugins(&self) -> Result<Vec<String>> {
        read_active_plugins(&self.layout)
    }

    fn write_active_plugins(&self, plugins: &[String]) -> Result<()> {
        write_active_plugins(&self.layout, plugins)?;
        self.record_step("write_active_plugins", &self.layout.active_plugins_path());
        Ok(())
    }

    fn read_active_theme(&self) -> Result<Option<String>> {
        read_active_theme(&self.layout)
    }

    fn set_active_theme(&self, theme: &str) -> Result<()> {
        write_active_theme(&self.layout, theme)?;
        self.record_step("write_active_theme", &self.layout.active_theme_path());
        Ok(())
    }

    fn with_exclusive<T, F>(&self, operation: &str, run: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.layout.ensure_state_dirs()?;
        execute_with_transaction(&self.layout, operation, |tx| {
            *self.journal.borrow_mut() = Some(JournalCursor {
                txid: tx.txid.clone(),
                next_seq: 1,
            });
            let result = run();
            *self.journal.borrow_mut() = None;
            result
        })
    }
}

use std::collections::BTreeSet;

use tracing::debug;

use crate::{Inventory, OverrideState, PairSet, UnitCategory, VariantNaming};

/// Hides the losing twin of every pair so each base identifier shows up once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    hidden_slugs: BTreeSet<String>,
}

impl ListingFilter {
    /// `active_theme` is only consulted for themes: the active theme stays
    /// listed even when the override says its twin should win.
    pub fn new(
        category: UnitCategory,
        naming: &VariantNaming,
        pairs: &PairSet,
        overrides: &OverrideState,
        active_theme: Option<&str>,
    ) -> Self {
        let mut hidden_slugs = BTreeSet::new();
        for base in pairs {
            if naming.is_self(base) {
                continue;
            }
            let losing_kind = overrides.effective_kind(category, base).opposite();
            let losing_slug = naming.variant_id(base, losing_kind);
            if category == UnitCategory::Themes && active_theme == Some(losing_slug.as_str()) {
                debug!(
                    base = base.as_str(),
                    theme = losing_slug.as_str(),
                    "keeping active theme visible"
                );
                continue;
            }
            if naming.is_self(&losing_slug) {
                continue;
            }
            hidden_slugs.insert(losing_slug);
        }

        Self { hidden_slugs }
    }

    pub fn hides(&self, slug: &str) -> bool {
        self.hidden_slugs.contains(slug)
    }

    pub fn hidden_slugs(&self) -> &BTreeSet<String> {
        &self.hidden_slugs
    }

    pub fn apply(&self, listing: &Inventory) -> Inventory {
        listing
            .iter()
            .filter(|(_, slug)| !self.hides(slug))
            .map(|(id, slug)| (id.to_string(), slug.to_string()))
            .collect()
    }

    /// Filters any ordered listing, keeping input order. `slug_of` maps an
    /// entry to the slug it declares.
    pub fn retain_visible<T, F>(&self, listing: &mut Vec<T>, slug_of: F)
    where
        F: Fn(&T) -> &str,
    {
        listing.retain(|entry| !self.hides(slug_of(entry)));
    }
}


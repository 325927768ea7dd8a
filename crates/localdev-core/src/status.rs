use crate::{OverrideState, PairSet, UnitCategory, VariantKind, VariantNaming};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStatus {
    pub category: UnitCategory,
    pub base: String,
    pub effective: VariantKind,
    pub vcs_slug: String,
    pub local_slug: String,
}

impl VariantStatus {
    pub fn is_local(&self) -> bool {
        self.effective == VariantKind::Local
    }

    pub fn effective_slug(&self) -> &str {
        match self.effective {
            VariantKind::Vcs => &self.vcs_slug,
            VariantKind::Local => &self.local_slug,
        }
    }

    pub fn badge_label(&self) -> &'static str {
        match self.effective {
            VariantKind::Vcs => "VCS ACTIVE",
            VariantKind::Local => "LOCAL ACTIVE",
        }
    }

    pub fn toggle_label(&self) -> &'static str {
        match self.effective {
            VariantKind::Vcs => "Switch to Local",
            VariantKind::Local => "Switch to VCS",
        }
    }
}

/// Status of `base`, or `None` when it is not a pair.
pub fn variant_status(
    category: UnitCategory,
    base: &str,
    naming: &VariantNaming,
    pairs: &PairSet,
    overrides: &OverrideState,
) -> Option<VariantStatus> {
    if !pairs.contains(base) {
        return None;
    }
    Some(VariantStatus {
        category,
        base: base.to_string(),
        effective: overrides.effective_kind(category, base),
        vcs_slug: naming.variant_id(base, VariantKind::Vcs),
        local_slug: naming.variant_id(base, VariantKind::Local),
    })
}

pub fn variant_statuses(
    category: UnitCategory,
    naming: &VariantNaming,
    pairs: &PairSet,
    overrides: &OverrideState,
) -> Vec<VariantStatus> {
    pairs
        .iter()
        .filter_map(|base| variant_status(category, base, naming, pairs, overrides))
        .collect()
}

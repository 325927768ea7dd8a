//! Override resolution for units that exist both as a version-controlled
//! checkout and as a local development copy.
//!
//! Everything in this crate is a pure function over an explicit inventory
//! snapshot, except [`ToggleEngine`], which talks to the host through
//! [`SwitchStateStore`].

mod engine;
mod identifier;
mod inventory;
mod listing;
mod overrides;
mod pairs;
mod status;
mod store;

pub use engine::{
    plan_plugin_toggle, plan_theme_toggle, ActiveRewrite, PluginTogglePlan, RejectReason,
    ThemeTogglePlan, ToggleEngine, ToggleOutcome, ToggleReport,
};
pub use identifier::{
    UnitCategory, VariantKind, VariantNaming, DEFAULT_LOCAL_PREFIX, DEFAULT_SELF_SLUG,
};
pub use inventory::{plugin_slug, Inventory, InventoryProvider};
pub use listing::ListingFilter;
pub use overrides::OverrideState;
pub use pairs::{detect_pairs, PairSet};
pub use status::{variant_status, variant_statuses, VariantStatus};
pub use store::SwitchStateStore;

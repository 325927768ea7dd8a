use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{Inventory, VariantKind, VariantNaming};

/// Base identifiers that currently have both a VCS and a local unit.
pub type PairSet = BTreeSet<String>;

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    vcs: bool,
    local: bool,
}

pub fn detect_pairs(inventory: &Inventory, naming: &VariantNaming) -> PairSet {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for slug in inventory.slugs() {
        if naming.is_self(slug) {
            continue;
        }
        let (base, kind) = naming.classify(slug);
        if naming.is_self(&base) {
            continue;
        }
        let bucket = buckets.entry(base).or_default();
        match kind {
            VariantKind::Vcs => bucket.vcs = true,
            VariantKind::Local => bucket.local = true,
        }
    }

    let pairs: PairSet = buckets
        .into_iter()
        .filter_map(|(base, bucket)| (bucket.vcs && bucket.local).then_some(base))
        .collect();
    debug!(
        units = inventory.len(),
        pairs = pairs.len(),
        "detected local development pairs"
    );
    pairs
}

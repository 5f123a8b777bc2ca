//! Count aggregation: decorate a parsed tree with species occurrence counts.
//!
//! Leaves are matched against the grouped count list in two passes, exact
//! first and fuzzy second, in leaf order and list order. Each grouped record
//! decorates at most one leaf. Internal nodes then receive the sum of their
//! children's counts, bottom-up. Zero sums stay unset.

use crate::log::log_debug;
use crate::tree::{NodeIndex, PhyloTree};

use super::matcher::{SpeciesMatcher, normalize};
use super::species::{SpeciesCount, group_counts};

/// What a call to [`attach_counts`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachSummary {
    /// Grouped records with a positive count.
    pub records: usize,
    /// Records that decorated a leaf.
    pub matched: usize,
    /// Count on the root after aggregation.
    pub total: u64,
}

/// Decorate `tree` with counts. Previous counts are discarded first, so the
/// call is idempotent.
pub fn attach_counts(
    tree: &mut PhyloTree,
    counts: &[SpeciesCount],
    matcher: &SpeciesMatcher,
) -> AttachSummary {
    for index in tree.preorder() {
        tree.node_mut(index).count = None;
    }

    let records: Vec<SpeciesCount> = group_counts(counts)
        .into_iter()
        .filter(|record| record.count > 0)
        .collect();
    let leaves = tree.leaves();

    let mut claimed = vec![false; records.len()];
    let mut assigned: Vec<Option<usize>> = vec![None; leaves.len()];

    // Exact pass
    for (slot, &leaf) in leaves.iter().enumerate() {
        let name = &tree.node(leaf).name;
        assigned[slot] = claim(&records, &mut claimed, |record| {
            matcher.matches_exactly(name, &record.species_name) || id_matches(record, name)
        });
    }

    // Fuzzy pass
    for (slot, &leaf) in leaves.iter().enumerate() {
        if assigned[slot].is_some() {
            continue;
        }
        let name = &tree.node(leaf).name;
        assigned[slot] = claim(&records, &mut claimed, |record| {
            matcher.matches(name, &record.species_name)
        });
    }

    let mut matched = 0;
    for (slot, &leaf) in leaves.iter().enumerate() {
        if let Some(record) = assigned[slot] {
            tree.node_mut(leaf).count = Some(records[record].count);
            matched += 1;
        }
    }

    aggregate_internal(tree);

    let summary = AttachSummary {
        records: records.len(),
        matched,
        total: tree.node(tree.root()).count.unwrap_or(0),
    };
    log_debug!(
        "attached {} of {} species counts (root total {})",
        summary.matched,
        summary.records,
        summary.total
    );
    summary
}

/// First unclaimed record (list order) accepted by `accept`, marked claimed.
fn claim(
    records: &[SpeciesCount],
    claimed: &mut [bool],
    accept: impl Fn(&SpeciesCount) -> bool,
) -> Option<usize> {
    let found = records
        .iter()
        .enumerate()
        .find(|&(i, record)| !claimed[i] && accept(record))
        .map(|(i, _)| i)?;
    claimed[found] = true;
    Some(found)
}

fn id_matches(record: &SpeciesCount, leaf_name: &str) -> bool {
    match record.species_id.as_deref() {
        Some(id) => {
            let id = normalize(id);
            !id.is_empty() && id == normalize(leaf_name)
        }
        None => false,
    }
}

/// Post-order sum of present child counts into every internal node.
fn aggregate_internal(tree: &mut PhyloTree) {
    for index in tree.postorder() {
        let children: Vec<NodeIndex> = tree.children(index);
        if children.is_empty() {
            continue;
        }
        let sum: u64 = children
            .iter()
            .filter_map(|&child| tree.node(child).count)
            .fold(0u64, u64::saturating_add);
        tree.node_mut(index).count = (sum > 0).then_some(sum);
    }
}

//! Species count records as delivered by the search layer.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

use super::matcher::normalize;

/// Occurrence count for one species. Keys are not unique across a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_id: Option<String>,
    pub species_name: String,
    pub count: u64,
}

impl SpeciesCount {
    pub fn new(species_name: impl Into<String>, count: u64) -> Self {
        Self {
            species_id: None,
            species_name: species_name.into(),
            count,
        }
    }

    pub fn with_id(mut self, species_id: impl Into<String>) -> Self {
        self.species_id = Some(species_id.into());
        self
    }

    /// Grouping key: the species id when present, the normalised name
    /// otherwise.
    fn key(&self) -> String {
        match self.species_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => format!("id:{id}"),
            _ => format!("name:{}", normalize(&self.species_name)),
        }
    }
}

/// Sum records that share a species, keeping first-seen order and the first
/// record's id and name.
pub fn group_counts(records: &[SpeciesCount]) -> Vec<SpeciesCount> {
    let mut grouped: Vec<SpeciesCount> = Vec::with_capacity(records.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        match slots.entry(record.key()) {
            Entry::Occupied(slot) => {
                let existing = &mut grouped[*slot.get()];
                existing.count = existing.count.saturating_add(record.count);
            }
            Entry::Vacant(slot) => {
                slot.insert(grouped.len());
                grouped.push(record.clone());
            }
        }
    }

    grouped
}

//! Species counts: input records, name matching and aggregation onto a tree.

mod aggregate;
mod matcher;
mod species;

pub use aggregate::{AttachSummary, attach_counts};
pub use matcher::{SpeciesMatcher, normalize};
pub use species::{SpeciesCount, group_counts};

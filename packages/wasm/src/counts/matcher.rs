//! Species name matching.
//!
//! Policy, first rule that applies wins:
//!
//! 1. Empty names never match.
//! 2. Equal after abbreviation expansion and normalisation.
//! 3. Short codes (`exact_only_max_len` characters or fewer) match nothing else.
//! 4. If either name is longer than `containment_min_len`, substring
//!    containment in either direction.
//! 5. Genus heuristic: equal genus longer than `genus_min_len`, and the
//!    epithets either share their first `epithet_prefix_len` characters (both
//!    longer than that) or one of them is empty.
//!
//! Every rule is symmetric, so `matches(a, b) == matches(b, a)`.
//!
//! Rule 3 is on by default (`exact_only_max_len = 3`), so a short code such
//! as `"sat"` never matches `"Oryza sativa"` by containment. Setting
//! `exact_only_max_len = 0` turns it off and leaves plain exact, containment
//! and genus matching. Count attachment additionally runs an exact pass over
//! every leaf before any fuzzy match is tried.

use std::collections::HashMap;

use crate::config::MatcherConfig;

/// Lowercase, trim, treat `_` as a space and collapse runs of whitespace.
pub fn normalize(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Name matcher configured with thresholds and an abbreviation table.
#[derive(Debug, Clone)]
pub struct SpeciesMatcher {
    config: MatcherConfig,
    /// Normalised abbreviation code → full name.
    normalized_abbreviations: HashMap<String, String>,
}

impl SpeciesMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        let normalized_abbreviations = config
            .abbreviations
            .iter()
            .map(|(code, name)| (normalize(code), name.clone()))
            .collect();
        Self {
            config,
            normalized_abbreviations,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MatcherConfig::default())
    }

    /// Full species name for an abbreviation code, or the name itself.
    ///
    /// Codes are looked up verbatim first, then normalised.
    pub fn expand<'a>(&'a self, name: &'a str) -> &'a str {
        let trimmed = name.trim();
        if let Some(full) = self.config.abbreviations.get(trimmed) {
            return full;
        }
        self.normalized_abbreviations
            .get(&normalize(trimmed))
            .map(String::as_str)
            .unwrap_or(name)
    }

    fn canonical(&self, name: &str) -> String {
        normalize(self.expand(name))
    }

    /// Rules 1-2 only.
    pub fn matches_exactly(&self, a: &str, b: &str) -> bool {
        let (a, b) = (self.canonical(a), self.canonical(b));
        !a.is_empty() && a == b
    }

    /// The full matching policy.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        let (a, b) = (self.canonical(a), self.canonical(b));
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }

        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        if len_a <= self.config.exact_only_max_len || len_b <= self.config.exact_only_max_len {
            return false;
        }

        if (len_a > self.config.containment_min_len || len_b > self.config.containment_min_len)
            && (a.contains(&b) || b.contains(&a))
        {
            return true;
        }

        self.genus_match(&a, &b)
    }

    fn genus_match(&self, a: &str, b: &str) -> bool {
        let (genus_a, epithet_a) = split_binomial(a);
        let (genus_b, epithet_b) = split_binomial(b);
        if genus_a != genus_b || genus_a.chars().count() <= self.config.genus_min_len {
            return false;
        }
        if epithet_a.is_empty() || epithet_b.is_empty() {
            return true;
        }

        let prefix = self.config.epithet_prefix_len;
        if epithet_a.chars().count() > prefix && epithet_b.chars().count() > prefix {
            return epithet_a.chars().take(prefix).eq(epithet_b.chars().take(prefix));
        }
        false
    }
}

impl Default for SpeciesMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Genus token and the remaining epithet of a normalised name.
fn split_binomial(name: &str) -> (&str, &str) {
    match name.split_once(' ') {
        Some((genus, epithet)) => (genus, epithet.trim()),
        None => (name, ""),
    }
}

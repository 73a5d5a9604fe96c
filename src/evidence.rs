//! Evidence types.
//!
//! An [`Evidence`] is one resource's claim about a relationship together
//! with the literature references it cites. Collections of evidence are
//! keyed by resource name, so adding the same claim twice never produces
//! a second entry: combining evidence is commutative, associative and
//! idempotent.

use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single claim made by one resource.
///
/// # Examples
///
/// ```
/// use interactome::Evidence;
///
/// let ev = Evidence::new("signor", ["10048479", "12345678"]);
/// assert_eq!(ev.resource, "signor");
/// assert_eq!(ev.references.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Name of the resource making the claim.
    pub resource: String,

    /// Literature references (PubMed ids) cited by the resource.
    #[serde(default)]
    pub references: BTreeSet<String>,

    /// Optional quantitative confidence reported by the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Evidence {
    /// Creates evidence from a resource and its references.
    #[must_use]
    pub fn new<I, S>(resource: impl Into<String>, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.into(),
            references: references.into_iter().map(Into::into).collect(),
            score: None,
        }
    }

    /// Creates evidence without references.
    #[must_use]
    pub fn bare(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            references: BTreeSet::new(),
            score: None,
        }
    }

    /// Attaches a quantitative score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Folds another claim of the same resource into this one.
    ///
    /// References are unioned and the larger score is kept.
    pub fn absorb(&mut self, other: &Self) {
        debug_assert_eq!(self.resource, other.resource);
        self.references.extend(other.references.iter().cloned());
        self.score = match (self.score, other.score) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.references.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            let refs: Vec<&str> = self.references.iter().map(String::as_str).collect();
            write!(f, "{}[{}]", self.resource, refs.join(","))
        }
    }
}

/// A set of evidence keyed by resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidences(BTreeMap<String, Evidence>);

impl Evidences {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one claim. A claim from a resource already present extends it.
    pub fn add(&mut self, evidence: Evidence) {
        match self.0.entry(evidence.resource.clone()) {
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().absorb(&evidence),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(evidence);
            }
        }
    }

    /// Unions another collection into this one.
    pub fn merge(&mut self, other: &Self) {
        for ev in other.0.values() {
            match self.0.get_mut(&ev.resource) {
                Some(existing) => existing.absorb(ev),
                None => {
                    self.0.insert(ev.resource.clone(), ev.clone());
                }
            }
        }
    }

    /// Removes all evidence of a resource. Returns true if anything was removed.
    pub fn remove_source(&mut self, resource: &str) -> bool {
        self.0.remove(resource).is_some()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns true if no resource supports this bucket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct supporting resources.
    #[must_use]
    pub fn count_sources(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the resource is among the supporters.
    #[must_use]
    pub fn contains_source(&self, resource: &str) -> bool {
        self.0.contains_key(resource)
    }

    /// Names of the supporting resources.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// All references cited by any supporter.
    #[must_use]
    pub fn references(&self) -> BTreeSet<&str> {
        self.0
            .values()
            .flat_map(|ev| ev.references.iter().map(String::as_str))
            .collect()
    }

    /// Evidence of a single resource.
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&Evidence> {
        self.0.get(resource)
    }

    /// Iterates over the evidence in resource order.
    pub fn iter(&self) -> impl Iterator<Item = &Evidence> {
        self.0.values()
    }
}

impl FromIterator<Evidence> for Evidences {
    fn from_iter<T: IntoIterator<Item = Evidence>>(iter: T) -> Self {
        let mut out = Self::new();
        for ev in iter {
            out.add(ev);
        }
        out
    }
}

impl Extend<Evidence> for Evidences {
    fn extend<T: IntoIterator<Item = Evidence>>(&mut self, iter: T) {
        for ev in iter {
            self.add(ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_new() {
        let ev = Evidence::new("signor", ["1", "2", "1"]);
        assert_eq!(ev.resource, "signor");
        assert_eq!(ev.references.len(), 2);
        assert!(ev.score.is_none());
    }

    #[test]
    fn test_evidence_absorb_keeps_max_score() {
        let mut a = Evidence::new("string", ["1"]).with_score(0.4);
        let b = Evidence::new("string", ["2"]).with_score(0.9);
        a.absorb(&b);
        assert_eq!(a.references.len(), 2);
        assert_eq!(a.score, Some(0.9));

        let mut c = Evidence::bare("string");
        c.absorb(&Evidence::bare("string").with_score(0.2));
        assert_eq!(c.score, Some(0.2));
    }

    #[test]
    fn test_evidences_add_is_idempotent() {
        let mut evs = Evidences::new();
        evs.add(Evidence::new("signor", ["1"]));
        evs.add(Evidence::new("signor", ["1"]));
        assert_eq!(evs.count_sources(), 1);
        assert_eq!(evs.references().len(), 1);
    }

    #[test]
    fn test_evidences_merge_commutes() {
        let a: Evidences = [Evidence::new("a", ["1"]), Evidence::new("b", ["2"])]
            .into_iter()
            .collect();
        let b: Evidences = [Evidence::new("b", ["3"]), Evidence::new("c", ["4"])]
            .into_iter()
            .collect();

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.count_sources(), 3);
        assert_eq!(ab.get("b").map(|e| e.references.len()), Some(2));
    }

    #[test]
    fn test_evidences_remove_source() {
        let mut evs: Evidences = [Evidence::bare("a"), Evidence::bare("b")].into_iter().collect();
        assert!(evs.remove_source("a"));
        assert!(!evs.remove_source("a"));
        assert!(!evs.contains_source("a"));
        assert!(evs.contains_source("b"));
    }

    #[test]
    fn test_evidence_display() {
        assert_eq!(format!("{}", Evidence::bare("kegg")), "kegg");
        assert_eq!(format!("{}", Evidence::new("kegg", ["2", "1"])), "kegg[1,2]");
    }

    #[test]
    fn test_evidences_serialization() {
        let evs: Evidences = [Evidence::new("a", ["1"]).with_score(0.5)].into_iter().collect();
        let json = serde_json::to_string(&evs).unwrap();
        let back: Evidences = serde_json::from_str(&json).unwrap();
        assert_eq!(evs, back);
    }
}

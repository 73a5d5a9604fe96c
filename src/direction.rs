//! Directionality ledger.
//!
//! Every edge owns one [`DirectionLedger`]. The ledger stores its two
//! partners in canonical (sorted) order and keeps evidence in three
//! buckets: straight (`X -> Y`), reverse (`Y -> X`) and undirected. Each
//! directed bucket additionally carries positive (stimulation) and
//! negative (inhibition) evidence.
//!
//! Claims are always addressed with [`Partners`], in whatever order the
//! record presented them; the ledger resolves them to its own buckets so
//! a bucket means the same thing no matter how the evidence arrived.
//! Both directions may be supported at once (mutual regulation), and a
//! supported direction may carry no sign at all.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::evidence::{Evidence, Evidences};

/// The partners a direction or sign claim is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Partners {
    /// A directed claim `from -> to`.
    Directed {
        /// Upstream partner.
        from: String,
        /// Downstream partner.
        to: String,
    },
    /// The claim has no direction.
    Undirected,
}

impl Partners {
    /// Creates a directed pair.
    #[must_use]
    pub fn directed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Directed {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Returns the pair with its direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match self {
            Self::Directed { from, to } => Self::Directed {
                from: to.clone(),
                to: from.clone(),
            },
            Self::Undirected => Self::Undirected,
        }
    }

    /// Returns true for the undirected sentinel.
    #[must_use]
    pub const fn is_undirected(&self) -> bool {
        matches!(self, Self::Undirected)
    }
}

impl fmt::Display for Partners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directed { from, to } => write!(f, "{from}->{to}"),
            Self::Undirected => write!(f, "undirected"),
        }
    }
}

/// One of the three evidence buckets of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// First canonical partner to second.
    Straight,
    /// Second canonical partner to first.
    Reverse,
    /// No direction.
    Undirected,
}

impl Bucket {
    /// The other directed bucket. Undirected maps to itself.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Straight => Self::Reverse,
            Self::Reverse => Self::Straight,
            Self::Undirected => Self::Undirected,
        }
    }
}

/// Effect of a directed interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    /// Stimulation / activation.
    Positive,
    /// Inhibition.
    Negative,
}

impl Sign {
    /// The other sign.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Outcome of the majority vote over the two directed buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorityDirection {
    /// More resources support the straight direction.
    Straight,
    /// More resources support the reverse direction.
    Reverse,
    /// Both directions have the same number of supporting resources.
    Ambiguous,
    /// No directed evidence at all.
    Undirected,
}

/// Outcome of the majority vote over the signs of one direction.
///
/// Both flags are set on a tie; callers decide what a tie means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignSupport {
    /// Positive evidence wins or ties.
    pub positive: bool,
    /// Negative evidence wins or ties.
    pub negative: bool,
}

impl SignSupport {
    /// Returns true when both signs are equally supported.
    #[must_use]
    pub const fn is_tie(&self) -> bool {
        self.positive && self.negative
    }
}

/// One row of the consensus view of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRow {
    /// The direction this row describes.
    pub partners: Partners,
    /// Consensus sign flags (both false for unsigned, both true on a tie).
    pub sign: SignSupport,
}

/// Read view of one bucket.
#[derive(Debug, Clone, Copy)]
pub struct LedgerEntry<'a> {
    bucket: Bucket,
    evidences: &'a Evidences,
}

impl<'a> LedgerEntry<'a> {
    /// The bucket the queried partners resolved to.
    #[must_use]
    pub const fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// Returns true if at least one resource supports the bucket.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !self.evidences.is_empty()
    }

    /// The evidence in the bucket.
    #[must_use]
    pub const fn evidences(&self) -> &'a Evidences {
        self.evidences
    }

    /// Names of the supporting resources.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<&'a str> {
        self.evidences.sources().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SignBuckets {
    #[serde(default)]
    positive: Evidences,
    #[serde(default)]
    negative: Evidences,
}

impl SignBuckets {
    fn get(&self, sign: Sign) -> &Evidences {
        match sign {
            Sign::Positive => &self.positive,
            Sign::Negative => &self.negative,
        }
    }

    fn get_mut(&mut self, sign: Sign) -> &mut Evidences {
        match sign {
            Sign::Positive => &mut self.positive,
            Sign::Negative => &mut self.negative,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.positive.merge(&other.positive);
        self.negative.merge(&other.negative);
    }

    fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Direction and sign evidence for one unordered pair of nodes.
///
/// # Examples
///
/// ```
/// use interactome::{DirectionLedger, Evidence, MajorityDirection, Partners, Sign};
///
/// let mut ledger = DirectionLedger::new("P00533", "P04626");
/// ledger
///     .set_sign(&Partners::directed("P04626", "P00533"), Sign::Positive, Evidence::bare("signor"))
///     .unwrap();
/// assert!(ledger.is_directed());
/// assert_eq!(ledger.majority_direction(), MajorityDirection::Reverse);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionLedger {
    nodes: (String, String),
    #[serde(default)]
    straight: Evidences,
    #[serde(default)]
    reverse: Evidences,
    #[serde(default)]
    undirected: Evidences,
    #[serde(default)]
    straight_signs: SignBuckets,
    #[serde(default)]
    reverse_signs: SignBuckets,
}

impl DirectionLedger {
    /// Creates an empty ledger for two partners, in any order.
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        let nodes = if a <= b { (a, b) } else { (b, a) };
        Self {
            nodes,
            straight: Evidences::new(),
            reverse: Evidences::new(),
            undirected: Evidences::new(),
            straight_signs: SignBuckets::default(),
            reverse_signs: SignBuckets::default(),
        }
    }

    /// The partners in canonical order.
    #[must_use]
    pub fn partners(&self) -> (&str, &str) {
        (&self.nodes.0, &self.nodes.1)
    }

    /// The straight direction in canonical order.
    #[must_use]
    pub fn straight(&self) -> Partners {
        Partners::directed(self.nodes.0.clone(), self.nodes.1.clone())
    }

    /// The reverse direction in canonical order.
    #[must_use]
    pub fn reverse(&self) -> Partners {
        Partners::directed(self.nodes.1.clone(), self.nodes.0.clone())
    }

    /// Returns true if both partners are the same node.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.nodes.0 == self.nodes.1
    }

    /// Resolves partners to a bucket, or `None` if they do not belong here.
    #[must_use]
    pub fn bucket_of(&self, pair: &Partners) -> Option<Bucket> {
        match pair {
            Partners::Undirected => Some(Bucket::Undirected),
            Partners::Directed { from, to } => {
                if *from == self.nodes.0 && *to == self.nodes.1 {
                    Some(Bucket::Straight)
                } else if *from == self.nodes.1 && *to == self.nodes.0 {
                    Some(Bucket::Reverse)
                } else {
                    None
                }
            }
        }
    }

    fn partners_of(&self, bucket: Bucket) -> Partners {
        match bucket {
            Bucket::Straight => self.straight(),
            Bucket::Reverse => self.reverse(),
            Bucket::Undirected => Partners::Undirected,
        }
    }

    fn invalid(&self, pair: &Partners) -> MergeError {
        MergeError::InvalidPartners {
            expected: format!("{}-{}", self.nodes.0, self.nodes.1),
            got: pair.to_string(),
        }
    }

    fn resolve(&self, pair: &Partners) -> Result<Bucket, MergeError> {
        self.bucket_of(pair).ok_or_else(|| self.invalid(pair))
    }

    fn resolve_directed(&self, pair: &Partners) -> Result<Bucket, MergeError> {
        match self.bucket_of(pair) {
            Some(bucket @ (Bucket::Straight | Bucket::Reverse)) => Ok(bucket),
            _ => Err(self.invalid(pair)),
        }
    }

    fn bucket(&self, bucket: Bucket) -> &Evidences {
        match bucket {
            Bucket::Straight => &self.straight,
            Bucket::Reverse => &self.reverse,
            Bucket::Undirected => &self.undirected,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Evidences {
        match bucket {
            Bucket::Straight => &mut self.straight,
            Bucket::Reverse => &mut self.reverse,
            Bucket::Undirected => &mut self.undirected,
        }
    }

    fn signs(&self, bucket: Bucket) -> Option<&SignBuckets> {
        match bucket {
            Bucket::Straight => Some(&self.straight_signs),
            Bucket::Reverse => Some(&self.reverse_signs),
            Bucket::Undirected => None,
        }
    }

    fn signs_mut(&mut self, bucket: Bucket) -> Option<&mut SignBuckets> {
        match bucket {
            Bucket::Straight => Some(&mut self.straight_signs),
            Bucket::Reverse => Some(&mut self.reverse_signs),
            Bucket::Undirected => None,
        }
    }

    /// Records evidence for a direction (or for the undirected bucket).
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidPartners`] if the pair does not match
    /// this ledger's endpoints.
    pub fn set_direction(&mut self, pair: &Partners, evidence: Evidence) -> Result<(), MergeError> {
        let bucket = self.resolve(pair)?;
        self.bucket_mut(bucket).add(evidence);
        Ok(())
    }

    /// Records a signed claim. A signed claim is also a directional one.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidPartners`] if the pair is undirected or
    /// does not match this ledger's endpoints.
    pub fn set_sign(
        &mut self,
        pair: &Partners,
        sign: Sign,
        evidence: Evidence,
    ) -> Result<(), MergeError> {
        let bucket = self.resolve_directed(pair)?;
        self.bucket_mut(bucket).add(evidence.clone());
        if let Some(signs) = self.signs_mut(bucket) {
            signs.get_mut(sign).add(evidence);
        }
        Ok(())
    }

    /// Withdraws direction evidence, from one resource or from all of them.
    ///
    /// Sign evidence of the same resources for that direction goes too, so a
    /// sign never outlives its direction.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidPartners`] for a foreign pair.
    pub fn unset_direction(&mut self, pair: &Partners, source: Option<&str>) -> Result<(), MergeError> {
        let bucket = self.resolve(pair)?;
        match source {
            Some(name) => {
                self.bucket_mut(bucket).remove_source(name);
                if let Some(signs) = self.signs_mut(bucket) {
                    signs.positive.remove_source(name);
                    signs.negative.remove_source(name);
                }
            }
            None => {
                self.bucket_mut(bucket).clear();
                if let Some(signs) = self.signs_mut(bucket) {
                    *signs = SignBuckets::default();
                }
            }
        }
        Ok(())
    }

    /// Withdraws sign evidence, from one resource or from all of them.
    /// The direction evidence itself is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidPartners`] for an undirected or foreign pair.
    pub fn unset_sign(
        &mut self,
        pair: &Partners,
        sign: Sign,
        source: Option<&str>,
    ) -> Result<(), MergeError> {
        let bucket = self.resolve_directed(pair)?;
        if let Some(signs) = self.signs_mut(bucket) {
            let evs = signs.get_mut(sign);
            match source {
                Some(name) => {
                    evs.remove_source(name);
                }
                None => evs.clear(),
            }
        }
        Ok(())
    }

    /// Reads the bucket addressed by `pair`.
    ///
    /// A pair that does not belong to this ledger yields `None`: it simply
    /// carries no information here.
    #[must_use]
    pub fn get(&self, pair: &Partners) -> Option<LedgerEntry<'_>> {
        let bucket = self.bucket_of(pair)?;
        Some(LedgerEntry {
            bucket,
            evidences: self.bucket(bucket),
        })
    }

    /// Reads the sign sub-bucket of a direction. `None` for undirected or
    /// foreign pairs.
    #[must_use]
    pub fn get_sign(&self, pair: &Partners, sign: Sign) -> Option<LedgerEntry<'_>> {
        let bucket = self.bucket_of(pair)?;
        let signs = self.signs(bucket)?;
        Some(LedgerEntry {
            bucket,
            evidences: signs.get(sign),
        })
    }

    /// Returns true if any directed bucket has evidence.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        !self.straight.is_empty() || !self.reverse.is_empty()
    }

    /// Returns true if any sign sub-bucket has evidence.
    #[must_use]
    pub fn has_sign(&self) -> bool {
        !self.straight_signs.is_empty() || !self.reverse_signs.is_empty()
    }

    /// Returns true if the given direction carries sign evidence.
    #[must_use]
    pub fn has_sign_in(&self, pair: &Partners) -> bool {
        self.bucket_of(pair)
            .and_then(|bucket| self.signs(bucket))
            .is_some_and(|signs| !signs.is_empty())
    }

    /// Returns true if both directions are supported.
    #[must_use]
    pub fn is_mutual(&self) -> bool {
        !self.straight.is_empty() && !self.reverse.is_empty()
    }

    /// Returns true if any direction carries positive evidence.
    #[must_use]
    pub fn is_stimulation(&self) -> bool {
        !self.straight_signs.positive.is_empty() || !self.reverse_signs.positive.is_empty()
    }

    /// Returns true if any direction carries negative evidence.
    #[must_use]
    pub fn is_inhibition(&self) -> bool {
        !self.straight_signs.negative.is_empty() || !self.reverse_signs.negative.is_empty()
    }

    /// The supported directions, straight first.
    #[must_use]
    pub fn which_directions(&self) -> Vec<Partners> {
        [Bucket::Straight, Bucket::Reverse]
            .into_iter()
            .filter(|b| !self.bucket(*b).is_empty())
            .map(|b| self.partners_of(b))
            .collect()
    }

    /// Which signs a direction carries, as `(positive, negative)`.
    #[must_use]
    pub fn which_signs(&self, pair: &Partners) -> Option<(bool, bool)> {
        let signs = self.signs(self.bucket_of(pair)?)?;
        Some((!signs.positive.is_empty(), !signs.negative.is_empty()))
    }

    /// Number of resources supporting a bucket.
    #[must_use]
    pub fn count_sources(&self, bucket: Bucket) -> usize {
        self.bucket(bucket).count_sources()
    }

    /// Number of resources supporting one sign of a directed bucket.
    #[must_use]
    pub fn count_sign_sources(&self, bucket: Bucket, sign: Sign) -> usize {
        self.signs(bucket).map_or(0, |s| s.get(sign).count_sources())
    }

    /// Returns true if the resource supports the bucket.
    #[must_use]
    pub fn supports(&self, bucket: Bucket, source: &str) -> bool {
        self.bucket(bucket).contains_source(source)
    }

    /// Returns true if the resource supports one sign of a directed bucket.
    #[must_use]
    pub fn supports_sign(&self, bucket: Bucket, sign: Sign, source: &str) -> bool {
        self.signs(bucket)
            .is_some_and(|s| s.get(sign).contains_source(source))
    }

    /// Every resource with evidence in any bucket.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<&str> {
        self.straight
            .sources()
            .chain(self.reverse.sources())
            .chain(self.undirected.sources())
            .collect()
    }

    /// Resources with evidence in a directed bucket.
    #[must_use]
    pub fn directed_sources(&self) -> BTreeSet<&str> {
        self.straight.sources().chain(self.reverse.sources()).collect()
    }

    /// All evidence of the ledger collapsed into one collection.
    #[must_use]
    pub fn all_evidences(&self) -> Evidences {
        let mut out = self.straight.clone();
        out.merge(&self.reverse);
        out.merge(&self.undirected);
        out
    }

    /// Majority vote between the two directed buckets.
    #[must_use]
    pub fn majority_direction(&self) -> MajorityDirection {
        let straight = self.straight.count_sources();
        let reverse = self.reverse.count_sources();
        match (straight, reverse) {
            (0, 0) => MajorityDirection::Undirected,
            (s, r) if s == r => MajorityDirection::Ambiguous,
            (s, r) if s > r => MajorityDirection::Straight,
            _ => MajorityDirection::Reverse,
        }
    }

    /// Majority vote between the signs of one direction.
    ///
    /// Returns `None` for undirected or foreign pairs. A direction without
    /// sign evidence yields both flags unset; a tie yields both set.
    #[must_use]
    pub fn majority_sign(&self, pair: &Partners) -> Option<SignSupport> {
        let signs = self.signs(self.bucket_of(pair)?)?;
        let pos = signs.positive.count_sources();
        let neg = signs.negative.count_sources();
        Some(SignSupport {
            positive: pos > 0 && pos >= neg,
            negative: neg > 0 && neg >= pos,
        })
    }

    /// Consensus rows: one per direction the majority vote keeps.
    ///
    /// An ambiguous vote keeps both directions. An edge with no directed
    /// evidence yields a single undirected row if anything supports it.
    #[must_use]
    pub fn consensus(&self) -> Vec<ConsensusRow> {
        let buckets: &[Bucket] = match self.majority_direction() {
            MajorityDirection::Straight => &[Bucket::Straight],
            MajorityDirection::Reverse => &[Bucket::Reverse],
            MajorityDirection::Ambiguous => &[Bucket::Straight, Bucket::Reverse],
            MajorityDirection::Undirected => {
                if self.undirected.is_empty() {
                    &[]
                } else {
                    &[Bucket::Undirected]
                }
            }
        };

        buckets
            .iter()
            .map(|&bucket| {
                let partners = self.partners_of(bucket);
                let sign = self.majority_sign(&partners).unwrap_or_default();
                ConsensusRow { partners, sign }
            })
            .collect()
    }

    /// Unions another ledger of the same pair into this one.
    ///
    /// Pure set union: commutative, associative, and a no-op when `other`
    /// holds nothing new.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidPartners`] if the ledgers describe
    /// different pairs.
    pub fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        if self.nodes != other.nodes {
            return Err(MergeError::InvalidPartners {
                expected: format!("{}-{}", self.nodes.0, self.nodes.1),
                got: format!("{}-{}", other.nodes.0, other.nodes.1),
            });
        }
        self.straight.merge(&other.straight);
        self.reverse.merge(&other.reverse);
        self.undirected.merge(&other.undirected);
        self.straight_signs.merge(&other.straight_signs);
        self.reverse_signs.merge(&other.reverse_signs);
        Ok(())
    }

    /// Produces a copy with both partners renamed through `map`.
    ///
    /// If the new names sort the other way round the directed buckets swap
    /// places. If both partners collapse into one node, the reverse bucket
    /// folds into the straight one.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::UnknownIdentifier`] if a partner is absent from
    /// the map.
    pub fn translate(&self, map: &HashMap<String, String>) -> Result<Self, MergeError> {
        let lookup = |id: &String| {
            map.get(id).cloned().ok_or_else(|| MergeError::UnknownIdentifier {
                identifier: id.clone(),
            })
        };
        let a = lookup(&self.nodes.0)?;
        let b = lookup(&self.nodes.1)?;

        let mut out = Self::new(a.clone(), b.clone());
        out.undirected = self.undirected.clone();

        if a == b {
            out.straight = self.straight.clone();
            out.straight.merge(&self.reverse);
            out.straight_signs = self.straight_signs.clone();
            out.straight_signs.merge(&self.reverse_signs);
        } else if a < b {
            out.straight = self.straight.clone();
            out.reverse = self.reverse.clone();
            out.straight_signs = self.straight_signs.clone();
            out.reverse_signs = self.reverse_signs.clone();
        } else {
            out.straight = self.reverse.clone();
            out.reverse = self.straight.clone();
            out.straight_signs = self.reverse_signs.clone();
            out.reverse_signs = self.straight_signs.clone();
        }
        Ok(out)
    }

    /// Returns true if no bucket holds evidence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.straight.is_empty() && self.reverse.is_empty() && self.undirected.is_empty()
    }
}

impl fmt::Display for DirectionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.partners();
        let names = |evs: &Evidences| evs.sources().collect::<Vec<_>>().join(",");
        write!(f, "{a}->{b} [{}]", names(&self.straight))?;
        write!(
            f,
            " (+[{}] -[{}])",
            names(&self.straight_signs.positive),
            names(&self.straight_signs.negative)
        )?;
        write!(f, "; {b}->{a} [{}]", names(&self.reverse))?;
        write!(
            f,
            " (+[{}] -[{}])",
            names(&self.reverse_signs.positive),
            names(&self.reverse_signs.negative)
        )?;
        write!(f, "; undirected [{}]", names(&self.undirected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Partners {
        Partners::directed("A", "B")
    }

    fn ba() -> Partners {
        Partners::directed("B", "A")
    }

    #[test]
    fn test_canonical_order() {
        let l1 = DirectionLedger::new("B", "A");
        let l2 = DirectionLedger::new("A", "B");
        assert_eq!(l1.partners(), ("A", "B"));
        assert_eq!(l1, l2);
        assert_eq!(l1.bucket_of(&ab()), Some(Bucket::Straight));
        assert_eq!(l1.bucket_of(&ba()), Some(Bucket::Reverse));
        assert_eq!(l1.bucket_of(&Partners::Undirected), Some(Bucket::Undirected));
        assert_eq!(l1.bucket_of(&Partners::directed("A", "C")), None);
    }

    #[test]
    fn test_set_direction_invalid_partners() {
        let mut ledger = DirectionLedger::new("A", "B");
        let err = ledger
            .set_direction(&Partners::directed("A", "C"), Evidence::bare("s"))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidPartners { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_set_sign_requires_direction() {
        let mut ledger = DirectionLedger::new("A", "B");
        let err = ledger
            .set_sign(&Partners::Undirected, Sign::Positive, Evidence::bare("s"))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidPartners { .. }));
    }

    #[test]
    fn test_set_sign_implies_direction() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Negative, Evidence::bare("s")).unwrap();
        assert!(ledger.is_directed());
        assert!(ledger.get(&ab()).unwrap().is_supported());
        assert!(ledger.get_sign(&ab(), Sign::Negative).unwrap().is_supported());
        assert!(!ledger.get_sign(&ab(), Sign::Positive).unwrap().is_supported());
        assert!(ledger.is_inhibition());
        assert!(!ledger.is_stimulation());
    }

    #[test]
    fn test_get_foreign_pair_is_none() {
        let ledger = DirectionLedger::new("A", "B");
        assert!(ledger.get(&Partners::directed("X", "Y")).is_none());
        assert!(ledger.get_sign(&Partners::Undirected, Sign::Positive).is_none());
        assert!(ledger.majority_sign(&Partners::directed("X", "Y")).is_none());
        assert!(!ledger.has_sign_in(&Partners::directed("X", "Y")));
    }

    #[test]
    fn test_direction_without_sign() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_direction(&ab(), Evidence::bare("s")).unwrap();
        assert!(ledger.is_directed());
        assert!(!ledger.has_sign());
        assert_eq!(ledger.which_signs(&ab()), Some((false, false)));
        assert_eq!(ledger.majority_sign(&ab()), Some(SignSupport::default()));
    }

    #[test]
    fn test_mutual_regulation_is_valid() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_direction(&ab(), Evidence::bare("s1")).unwrap();
        ledger.set_direction(&ba(), Evidence::bare("s1")).unwrap();
        assert!(ledger.is_mutual());
        assert_eq!(ledger.which_directions(), vec![ab(), ba()]);
    }

    #[test]
    fn test_opposing_records_scenario() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("src1")).unwrap();
        ledger.set_sign(&ba(), Sign::Negative, Evidence::bare("src2")).unwrap();

        assert_eq!(ledger.count_sources(Bucket::Straight), 1);
        assert_eq!(ledger.count_sources(Bucket::Reverse), 1);
        assert_eq!(ledger.which_signs(&ab()), Some((true, false)));
        assert_eq!(ledger.which_signs(&ba()), Some((false, true)));
        assert_eq!(ledger.majority_direction(), MajorityDirection::Ambiguous);
        assert!(ledger.has_sign_in(&ab()));
        assert!(ledger.has_sign_in(&ba()));
    }

    #[test]
    fn test_majority_direction() {
        let mut ledger = DirectionLedger::new("A", "B");
        assert_eq!(ledger.majority_direction(), MajorityDirection::Undirected);

        ledger.set_direction(&Partners::Undirected, Evidence::bare("s0")).unwrap();
        assert_eq!(ledger.majority_direction(), MajorityDirection::Undirected);

        ledger.set_direction(&ba(), Evidence::bare("s1")).unwrap();
        assert_eq!(ledger.majority_direction(), MajorityDirection::Reverse);

        ledger.set_direction(&ab(), Evidence::bare("s2")).unwrap();
        assert_eq!(ledger.majority_direction(), MajorityDirection::Ambiguous);

        ledger.set_direction(&ab(), Evidence::bare("s3")).unwrap();
        assert_eq!(ledger.majority_direction(), MajorityDirection::Straight);
    }

    #[test]
    fn test_majority_sign_tie_sets_both() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s1")).unwrap();
        ledger.set_sign(&ab(), Sign::Negative, Evidence::bare("s2")).unwrap();
        let support = ledger.majority_sign(&ab()).unwrap();
        assert!(support.is_tie());

        ledger.set_sign(&ab(), Sign::Negative, Evidence::bare("s3")).unwrap();
        let support = ledger.majority_sign(&ab()).unwrap();
        assert!(!support.positive);
        assert!(support.negative);
    }

    #[test]
    fn test_same_evidence_twice_counts_once() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_direction(&Partners::Undirected, Evidence::new("src1", ["1"])).unwrap();
        ledger.set_direction(&Partners::Undirected, Evidence::new("src1", ["1"])).unwrap();
        let entry = ledger.get(&Partners::Undirected).unwrap();
        assert_eq!(entry.evidences().count_sources(), 1);
        assert_eq!(entry.evidences().references().len(), 1);
    }

    #[test]
    fn test_unset_direction_drops_signs() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s1")).unwrap();
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s2")).unwrap();
        ledger.unset_direction(&ab(), Some("s1")).unwrap();
        assert_eq!(ledger.get(&ab()).unwrap().sources(), BTreeSet::from(["s2"]));
        assert_eq!(
            ledger.get_sign(&ab(), Sign::Positive).unwrap().sources(),
            BTreeSet::from(["s2"])
        );

        ledger.unset_direction(&ab(), None).unwrap();
        assert!(!ledger.is_directed());
        assert!(!ledger.has_sign());
    }

    #[test]
    fn test_unset_sign_keeps_direction() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ba(), Sign::Negative, Evidence::bare("s1")).unwrap();
        ledger.unset_sign(&ba(), Sign::Negative, None).unwrap();
        assert!(ledger.is_directed());
        assert!(!ledger.has_sign());
    }

    #[test]
    fn test_merge_idempotent_and_commutative() {
        let mut l1 = DirectionLedger::new("A", "B");
        l1.set_sign(&ab(), Sign::Positive, Evidence::new("s1", ["1"])).unwrap();
        let mut l2 = DirectionLedger::new("B", "A");
        l2.set_direction(&ba(), Evidence::new("s2", ["2"])).unwrap();
        l2.set_direction(&Partners::Undirected, Evidence::bare("s3")).unwrap();

        let mut same = l1.clone();
        same.merge(&l1).unwrap();
        assert_eq!(same, l1);

        let mut a = l1.clone();
        a.merge(&l2).unwrap();
        let mut b = l2.clone();
        b.merge(&l1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_rejects_other_pair() {
        let mut l1 = DirectionLedger::new("A", "B");
        let l2 = DirectionLedger::new("A", "C");
        assert!(matches!(l1.merge(&l2), Err(MergeError::InvalidPartners { .. })));
    }

    #[test]
    fn test_translate_keeps_orientation() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s1")).unwrap();

        // C sorts before Z, so the buckets swap.
        let map = HashMap::from([
            ("A".to_string(), "Z".to_string()),
            ("B".to_string(), "C".to_string()),
        ]);
        let out = ledger.translate(&map).unwrap();
        assert_eq!(out.partners(), ("C", "Z"));
        let zc = Partners::directed("Z", "C");
        assert!(out.get(&zc).unwrap().is_supported());
        assert_eq!(out.bucket_of(&zc), Some(Bucket::Reverse));
        assert_eq!(out.which_signs(&zc), Some((true, false)));
    }

    #[test]
    fn test_translate_collapse_to_loop() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_direction(&ab(), Evidence::bare("s1")).unwrap();
        ledger.set_sign(&ba(), Sign::Negative, Evidence::bare("s2")).unwrap();
        let map = HashMap::from([
            ("A".to_string(), "X".to_string()),
            ("B".to_string(), "X".to_string()),
        ]);
        let out = ledger.translate(&map).unwrap();
        assert!(out.is_loop());
        let xx = Partners::directed("X", "X");
        assert_eq!(out.get(&xx).unwrap().sources(), BTreeSet::from(["s1", "s2"]));
        assert_eq!(out.which_signs(&xx), Some((false, true)));
    }

    #[test]
    fn test_translate_unknown_identifier() {
        let ledger = DirectionLedger::new("A", "B");
        let map = HashMap::from([("A".to_string(), "X".to_string())]);
        assert!(matches!(
            ledger.translate(&map),
            Err(MergeError::UnknownIdentifier { identifier }) if identifier == "B"
        ));
    }

    #[test]
    fn test_consensus_rows() {
        let mut ledger = DirectionLedger::new("A", "B");
        assert!(ledger.consensus().is_empty());

        ledger.set_direction(&Partners::Undirected, Evidence::bare("s0")).unwrap();
        assert_eq!(ledger.consensus().len(), 1);
        assert_eq!(ledger.consensus()[0].partners, Partners::Undirected);

        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s1")).unwrap();
        ledger.set_sign(&ba(), Sign::Negative, Evidence::bare("s2")).unwrap();
        let rows = ledger.consensus();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].sign.positive && !rows[0].sign.negative);
        assert!(!rows[1].sign.positive && rows[1].sign.negative);
    }

    #[test]
    fn test_sources_views() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_direction(&ab(), Evidence::bare("s1")).unwrap();
        ledger.set_direction(&Partners::Undirected, Evidence::bare("s2")).unwrap();
        assert_eq!(ledger.sources(), BTreeSet::from(["s1", "s2"]));
        assert_eq!(ledger.directed_sources(), BTreeSet::from(["s1"]));
        assert_eq!(ledger.all_evidences().count_sources(), 2);
    }

    #[test]
    fn test_loop_ledger() {
        let mut ledger = DirectionLedger::new("A", "A");
        assert!(ledger.is_loop());
        ledger.set_direction(&Partners::directed("A", "A"), Evidence::bare("s")).unwrap();
        assert_eq!(ledger.majority_direction(), MajorityDirection::Straight);
    }

    #[test]
    fn test_display() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ab(), Sign::Positive, Evidence::bare("s1")).unwrap();
        let text = format!("{ledger}");
        assert!(text.starts_with("A->B [s1]"));
        assert!(text.contains("+[s1]"));
    }

    #[test]
    fn test_serialization() {
        let mut ledger = DirectionLedger::new("A", "B");
        ledger.set_sign(&ba(), Sign::Negative, Evidence::new("s1", ["9"])).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: DirectionLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(ledger, back);
    }
}

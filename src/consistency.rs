//! Pairwise agreement between sources.
//!
//! A single read-only pass over a finished graph. For every ordered pair of
//! sources `(s1, s2)` it counts the edges and claims on which both assert
//! the same direction (or sign) and those on which they assert opposite
//! ones. A source *exclusively* supports a direction when it is in that
//! bucket and not in the opposite one; only exclusive claims are compared.
//!
//! A disagreement is *major* for `s1` when strictly more sources back
//! `s1`'s side than `s2`'s, and *minor* otherwise (ties included).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::direction::{Bucket, DirectionLedger, Sign};
use crate::graph::GraphStore;

/// Agreement counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    /// Shared claims (one per direction or direction and sign).
    pub total: usize,
    /// Edges with at least one shared claim.
    pub edges: usize,
}

/// Disagreement counts split by majority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Every disagreement.
    pub all: usize,
    /// Disagreements where the first source sides with the majority.
    pub major: usize,
    /// The rest: the first source is in the minority or tied.
    pub minor: usize,
}

impl Split {
    fn add(&mut self, major: bool) {
        self.all += 1;
        if major {
            self.major += 1;
        } else {
            self.minor += 1;
        }
    }
}

/// Disagreement counts at claim and edge level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disagreement {
    /// One per contradicting claim.
    pub total: Split,
    /// One per edge; major if any claim on the edge was major.
    pub edges: Split,
}

/// Counters of one ordered source pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairStats {
    /// Both sources exclusively claim the same direction.
    pub direction_consistency: Agreement,
    /// The sources exclusively claim opposite directions.
    pub direction_inconsistency: Disagreement,
    /// Both sources exclusively claim the same sign on a direction.
    pub sign_consistency: Agreement,
    /// The sources exclusively claim opposite signs on a direction.
    pub sign_inconsistency: Disagreement,
}

/// Reliability summary of one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceScore {
    /// Agreements with other sources.
    pub consistent: usize,
    /// Disagreements where this source sides with the majority.
    pub major: usize,
    /// Disagreements where this source is in the minority or tied.
    pub minor: usize,
    /// `(consistent + major) / (consistent + major + minor)`, or 1.0 when the
    /// source was never compared.
    pub score: f64,
}

/// Result of a consistency pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Edges carrying directed evidence.
    pub edges_analyzed: usize,
    sources: BTreeSet<String>,
    pairs: BTreeMap<String, BTreeMap<String, PairStats>>,
}

impl ConsistencyReport {
    /// Counters of the ordered pair `(s1, s2)`, if they were ever compared.
    #[must_use]
    pub fn pair(&self, s1: &str, s2: &str) -> Option<&PairStats> {
        self.pairs.get(s1).and_then(|m| m.get(s2))
    }

    /// Every compared ordered pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, &PairStats)> {
        self.pairs.iter().flat_map(|(s1, row)| {
            row.iter()
                .map(move |(s2, stats)| (s1.as_str(), s2.as_str(), stats))
        })
    }

    /// Sources with directed evidence on at least one edge.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    fn entry(&mut self, s1: &str, s2: &str) -> &mut PairStats {
        self.pairs
            .entry(s1.to_string())
            .or_default()
            .entry(s2.to_string())
            .or_default()
    }

    /// Aggregates each source's comparisons into a reliability score.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn source_scores(&self) -> BTreeMap<String, SourceScore> {
        let mut scores: BTreeMap<String, SourceScore> = self
            .sources
            .iter()
            .map(|s| (s.clone(), SourceScore::default()))
            .collect();
        for (s1, _, stats) in self.pairs() {
            let score = scores.entry(s1.to_string()).or_default();
            score.consistent += stats.direction_consistency.total + stats.sign_consistency.total;
            score.major +=
                stats.direction_inconsistency.total.major + stats.sign_inconsistency.total.major;
            score.minor +=
                stats.direction_inconsistency.total.minor + stats.sign_inconsistency.total.minor;
        }
        for score in scores.values_mut() {
            let favourable = score.consistent + score.major;
            let compared = favourable + score.minor;
            score.score = if compared == 0 {
                1.0
            } else {
                favourable as f64 / compared as f64
            };
        }
        scores
    }
}

/// Computes a [`ConsistencyReport`] from a graph.
///
/// # Examples
///
/// ```
/// use interactome::{ConsistencyAnalyzer, DirectionLedger, Evidence, Partners};
///
/// let mut ledger = DirectionLedger::new("A", "B");
/// ledger.set_direction(&Partners::directed("A", "B"), Evidence::bare("s1")).unwrap();
/// ledger.set_direction(&Partners::directed("B", "A"), Evidence::bare("s2")).unwrap();
///
/// let report = ConsistencyAnalyzer::new().analyze_ledgers([&ledger]);
/// let stats = report.pair("s1", "s2").unwrap();
/// assert_eq!(stats.direction_inconsistency.total.minor, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyAnalyzer;

impl ConsistencyAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Analyzes every edge of `graph`. The graph is not modified.
    #[must_use]
    pub fn analyze(&self, graph: &GraphStore) -> ConsistencyReport {
        let report = self.analyze_ledgers(graph.edges().map(|(_, e)| &e.ledger));
        info!(
            edges = report.edges_analyzed,
            sources = report.sources.len(),
            pairs = report.pairs().count(),
            "consistency analysis finished"
        );
        report
    }

    /// Analyzes a set of ledgers.
    #[must_use]
    pub fn analyze_ledgers<'a, I>(&self, ledgers: I) -> ConsistencyReport
    where
        I: IntoIterator<Item = &'a DirectionLedger>,
    {
        let mut report = ConsistencyReport::default();
        for ledger in ledgers {
            if ledger.is_directed() {
                report.edges_analyzed += 1;
                report
                    .sources
                    .extend(ledger.directed_sources().into_iter().map(str::to_string));
                directions(&mut report, ledger);
                signs(&mut report, ledger);
            }
        }
        debug!(edges = report.edges_analyzed, "ledgers analyzed");
        report
    }
}

const DIRECTED: [Bucket; 2] = [Bucket::Straight, Bucket::Reverse];

fn exclusive_direction<'a>(ledger: &'a DirectionLedger, bucket: Bucket) -> Vec<&'a str> {
    ledger
        .directed_sources()
        .into_iter()
        .filter(|s| ledger.supports(bucket, s) && !ledger.supports(bucket.opposite(), s))
        .collect()
}

fn exclusive_sign<'a>(ledger: &'a DirectionLedger, bucket: Bucket, sign: Sign) -> Vec<&'a str> {
    ledger
        .directed_sources()
        .into_iter()
        .filter(|s| {
            ledger.supports_sign(bucket, sign, s) && !ledger.supports_sign(bucket, sign.opposite(), s)
        })
        .collect()
}

/// Per-edge flags of one ordered pair, folded into edge-level counters once
/// the edge is done.
#[derive(Default)]
struct EdgeFlags {
    agree: bool,
    disagree: Option<bool>,
}

impl EdgeFlags {
    fn disagree(&mut self, major: bool) {
        self.disagree = Some(self.disagree.unwrap_or(false) || major);
    }
}

fn directions(report: &mut ConsistencyReport, ledger: &DirectionLedger) {
    let mut flags: BTreeMap<(&str, &str), EdgeFlags> = BTreeMap::new();
    for bucket in DIRECTED {
        let here = exclusive_direction(ledger, bucket);
        let there = exclusive_direction(ledger, bucket.opposite());
        let major = ledger.count_sources(bucket) > ledger.count_sources(bucket.opposite());

        for &s1 in &here {
            for &s2 in here.iter().filter(|s2| **s2 != s1) {
                report.entry(s1, s2).direction_consistency.total += 1;
                flags.entry((s1, s2)).or_default().agree = true;
            }
            for &s2 in &there {
                report.entry(s1, s2).direction_inconsistency.total.add(major);
                flags.entry((s1, s2)).or_default().disagree(major);
            }
        }
    }
    for ((s1, s2), f) in flags {
        let stats = report.entry(s1, s2);
        if f.agree {
            stats.direction_consistency.edges += 1;
        }
        if let Some(major) = f.disagree {
            stats.direction_inconsistency.edges.add(major);
        }
    }
}

fn signs(report: &mut ConsistencyReport, ledger: &DirectionLedger) {
    let mut flags: BTreeMap<(&str, &str), EdgeFlags> = BTreeMap::new();
    for bucket in DIRECTED {
        for sign in [Sign::Positive, Sign::Negative] {
            let here = exclusive_sign(ledger, bucket, sign);
            let there = exclusive_sign(ledger, bucket, sign.opposite());
            let major = ledger.count_sign_sources(bucket, sign)
                > ledger.count_sign_sources(bucket, sign.opposite());

            for &s1 in &here {
                for &s2 in here.iter().filter(|s2| **s2 != s1) {
                    report.entry(s1, s2).sign_consistency.total += 1;
                    flags.entry((s1, s2)).or_default().agree = true;
                }
                for &s2 in &there {
                    report.entry(s1, s2).sign_inconsistency.total.add(major);
                    flags.entry((s1, s2)).or_default().disagree(major);
                }
            }
        }
    }
    for ((s1, s2), f) in flags {
        let stats = report.entry(s1, s2);
        if f.agree {
            stats.sign_consistency.edges += 1;
        }
        if let Some(major) = f.disagree {
            stats.sign_inconsistency.edges.add(major);
        }
    }
}

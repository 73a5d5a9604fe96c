use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// A fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Every record was processed; some may have been skipped.
    Completed,
    /// The adapter failed and the source was skipped entirely.
    Failed { reason: String },
}

/// Counters of one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Name of the adapter.
    pub source: String,
    pub status: SourceStatus,
    /// When the pipeline picked up the source.
    pub started_at: DateTime<Utc>,
    /// When the last record was processed or the adapter failed.
    pub finished_at: DateTime<Utc>,
    /// Records the adapter produced.
    pub records_seen: usize,
    /// Rows the adapter dropped before they became records.
    pub rows_rejected: usize,
    /// Records that reached the graph.
    pub records_ingested: usize,
    /// Records that failed validation.
    pub malformed: usize,
    /// Records with a partner no mapping was found for.
    pub unmapped: usize,
    /// Records outside the configured taxa.
    pub taxon_filtered: usize,
    /// Records that fanned out into more than one pair.
    pub ambiguous: usize,
    /// Node pairs produced by fan-out, beyond one per record.
    pub expanded_pairs: usize,
    /// Records whose every pair the merge engine refused.
    pub merge_errors: usize,
    /// Ingested records with some of their pairs refused.
    pub partially_ingested: usize,
    /// Node pairs refused, across all records.
    pub refused_pairs: usize,
    /// Nodes this source added.
    pub nodes_created: usize,
    /// Edges this source added.
    pub edges_created: usize,
}

impl SourceReport {
    pub(crate) fn start(source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            source: source.into(),
            status: SourceStatus::Completed,
            started_at: now,
            finished_at: now,
            records_seen: 0,
            rows_rejected: 0,
            records_ingested: 0,
            malformed: 0,
            unmapped: 0,
            taxon_filtered: 0,
            ambiguous: 0,
            expanded_pairs: 0,
            merge_errors: 0,
            partially_ingested: 0,
            refused_pairs: 0,
            nodes_created: 0,
            edges_created: 0,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub(crate) fn fail(mut self, reason: impl Into<String>) -> Self {
        self.status = SourceStatus::Failed {
            reason: reason.into(),
        };
        self.finish()
    }

    /// Returns true if the adapter failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }

    /// Records and rows that did not reach the graph.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.rows_rejected + self.malformed + self.unmapped + self.taxon_filtered + self.merge_errors
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One report per adapter, in input order.
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            started_at: now,
            finished_at: now,
            sources: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// The report of one source, if it took part.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == name)
    }

    /// Names of sources whose adapter failed.
    #[must_use]
    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.source.as_str())
            .collect()
    }

    fn total(&self, f: impl Fn(&SourceReport) -> usize) -> usize {
        self.sources.iter().map(f).sum()
    }

    /// Records that reached the graph, over all sources.
    #[must_use]
    pub fn records_ingested(&self) -> usize {
        self.total(|s| s.records_ingested)
    }

    /// Unmapped records, over all sources.
    #[must_use]
    pub fn unmapped(&self) -> usize {
        self.total(|s| s.unmapped)
    }

    /// Malformed records, over all sources.
    #[must_use]
    pub fn malformed(&self) -> usize {
        self.total(|s| s.malformed)
    }

    /// Skipped records and rows, over all sources.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.total(SourceReport::skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_report_totals() {
        let mut a = SourceReport::start("a");
        a.records_ingested = 3;
        a.unmapped = 1;
        a.rows_rejected = 2;
        let b = SourceReport::start("b").fail("connection refused");

        let mut report = IngestReport::start();
        report.sources = vec![a.finish(), b];
        let report = report.finish();

        assert_eq!(report.records_ingested(), 3);
        assert_eq!(report.unmapped(), 1);
        assert_eq!(report.skipped(), 3);
        assert_eq!(report.failed_sources(), vec!["b"]);
        assert!(report.source("a").is_some_and(|s| !s.is_failed()));
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_report_serialization() {
        let report = IngestReport::start().finish();
        let json = serde_json::to_string(&report).unwrap();
        let back: IngestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}

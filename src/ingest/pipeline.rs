use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::thread;

use crossbeam_channel::bounded;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::direction::{DirectionLedger, Partners, Sign};
use crate::entity::OriginalId;
use crate::error::{IngestError, MergeError, NetworkError, NetworkResult, ValidationError};
use crate::evidence::Evidence;
use crate::graph::{Edge, GraphStore, NodeId};
use crate::value::AttrValue;

use super::adapter::SourceAdapter;
use super::mapping::IdMapper;
use super::record::InteractionRecord;
use super::report::{IngestReport, SourceReport};

/// Steps a record goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ResolveIdentifiers,
    AmbiguousExpansion,
    UpsertNodes,
    UpsertEdge,
    ApplyEvidence,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::ResolveIdentifiers => "resolve_identifiers",
            Self::AmbiguousExpansion => "ambiguous_expansion",
            Self::UpsertNodes => "upsert_nodes",
            Self::UpsertEdge => "upsert_edge",
            Self::ApplyEvidence => "apply_evidence",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// What happened to one record.
#[derive(Debug)]
enum Outcome {
    /// At least one pair was written; `refused` lists the pairs that were not.
    Ingested {
        pairs: usize,
        refused: Vec<(Stage, MergeError)>,
    },
    Malformed(ValidationError),
    Unmapped(IngestError),
    TaxonFiltered,
    /// Every pair was refused.
    Refused(Vec<(Stage, MergeError)>),
}

/// Everything one node pair would write. Built against the current graph
/// and committed only once every step succeeded.
#[derive(Debug)]
struct StagedPair {
    attrs_a: BTreeMap<String, AttrValue>,
    attrs_b: BTreeMap<String, AttrValue>,
    edge_attrs: BTreeMap<String, AttrValue>,
    ledger: DirectionLedger,
}

/// Drives records from adapters into a [`GraphStore`].
///
/// # Examples
///
/// ```
/// use interactome::{
///     GraphStore, IdentityMapper, Ingestor, InteractionRecord, PipelineConfig, SourceAdapter,
///     StaticAdapter,
/// };
///
/// let ingestor = Ingestor::new(PipelineConfig::default(), IdentityMapper).unwrap();
/// let mut graph = GraphStore::new();
/// let adapter = StaticAdapter::new(
///     "signor",
///     vec![InteractionRecord::new("P00533", "P62993", "signor").directed(true)],
/// );
/// let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(adapter)];
/// let report = ingestor.run(&mut graph, adapters);
/// assert_eq!(report.records_ingested(), 1);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug)]
pub struct Ingestor<M> {
    config: PipelineConfig,
    mapper: M,
    reference_pattern: Regex,
}

impl<M: IdMapper> Ingestor<M> {
    /// Creates an ingestor after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] for unusable settings.
    pub fn new(config: PipelineConfig, mapper: M) -> NetworkResult<Self> {
        let config = config.validate()?;
        let reference_pattern = Regex::new(&config.reference_pattern).map_err(|e| {
            NetworkError::Validation(ValidationError::InvalidConfig {
                reason: e.to_string(),
            })
        })?;
        Ok(Self {
            config,
            mapper,
            reference_pattern,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    /// An empty store using the configured combiner.
    #[must_use]
    pub fn new_graph(&self) -> GraphStore {
        GraphStore::with_combiner(self.config.combiner())
    }

    /// Ingests every adapter in turn.
    ///
    /// Never fails: adapter failures and bad records are recorded in the
    /// report.
    pub fn run<I>(&self, graph: &mut GraphStore, adapters: I) -> IngestReport
    where
        I: IntoIterator<Item = Box<dyn SourceAdapter>>,
    {
        let mut report = IngestReport::start();
        info!(run_id = %report.run_id, "ingestion started");
        for mut adapter in adapters {
            report.sources.push(self.ingest_source(graph, adapter.as_mut()));
        }
        self.finish_run(graph, report)
    }

    /// Ingests adapters on worker threads, each into a private store, then
    /// folds the stores into `graph` one at a time.
    ///
    /// Source reports keep the order the adapters were given in; node and
    /// edge creation counts refer to the private store of each source.
    /// The merged graph matches a sequential run except for the element
    /// order of list attributes, which follows the order stores finish in.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned or if folding
    /// a private store into `graph` hits a merge contract error.
    pub fn run_parallel<I>(&self, graph: &mut GraphStore, adapters: I) -> NetworkResult<IngestReport>
    where
        I: IntoIterator<Item = Box<dyn SourceAdapter>>,
    {
        let adapters: Vec<Box<dyn SourceAdapter>> = adapters.into_iter().collect();
        let workers = self.config.workers.min(adapters.len()).max(1);
        let mut report = IngestReport::start();
        info!(run_id = %report.run_id, workers, sources = adapters.len(), "parallel ingestion started");

        let (job_tx, job_rx) = bounded::<(usize, Box<dyn SourceAdapter>)>(workers);
        let (out_tx, out_rx) = bounded::<(usize, SourceReport, GraphStore)>(workers);

        let mut reports: Vec<(usize, SourceReport)> = Vec::with_capacity(adapters.len());
        let mut first_error: Option<NetworkError> = None;

        thread::scope(|scope| {
            for idx in 0..workers {
                let job_rx = job_rx.clone();
                let out_tx = out_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("interactome-ingest-{idx}"))
                    .spawn_scoped(scope, move || {
                        for (slot, mut adapter) in &job_rx {
                            let mut local = self.new_graph();
                            let source = self.ingest_source(&mut local, adapter.as_mut());
                            if out_tx.send((slot, source, local)).is_err() {
                                break;
                            }
                        }
                    });
                if let Err(e) = spawned {
                    first_error.get_or_insert(NetworkError::Ingest(IngestError::Io(e)));
                    break;
                }
            }
            drop(job_rx);
            drop(out_tx);

            // Feed from a separate thread so a full output queue cannot stall
            // the job queue.
            let feeder = thread::Builder::new()
                .name("interactome-feeder".to_string())
                .spawn_scoped(scope, move || {
                    for job in adapters.into_iter().enumerate() {
                        if job_tx.send(job).is_err() {
                            break;
                        }
                    }
                });
            if let Err(e) = feeder {
                first_error.get_or_insert(NetworkError::Ingest(IngestError::Io(e)));
            }

            for (slot, source, local) in &out_rx {
                if first_error.is_none() {
                    if let Err(e) = graph.absorb(local) {
                        error!(source = %source.source, error = %e, "failed to fold source store");
                        first_error = Some(NetworkError::Merge(e));
                    }
                }
                reports.push((slot, source));
            }
        });

        if let Some(e) = first_error {
            return Err(e);
        }
        reports.sort_by_key(|(slot, _)| *slot);
        report.sources = reports.into_iter().map(|(_, r)| r).collect();
        Ok(self.finish_run(graph, report))
    }

    fn finish_run(&self, graph: &GraphStore, report: IngestReport) -> IngestReport {
        let report = report.finish();
        info!(
            run_id = %report.run_id,
            sources = report.sources.len(),
            failed = report.failed_sources().len(),
            ingested = report.records_ingested(),
            skipped = report.skipped(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "ingestion finished"
        );
        report
    }

    /// Ingests one source. A failing adapter leaves `graph` untouched and
    /// yields a failed report.
    pub fn ingest_source(&self, graph: &mut GraphStore, adapter: &mut dyn SourceAdapter) -> SourceReport {
        let name = adapter.name().to_string();
        let mut report = SourceReport::start(&name);
        info!(source = %name, "ingesting source");

        let records = match adapter.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(source = %name, error = %e, "adapter failed; skipping source");
                return report.fail(e.to_string());
            }
        };
        report.rows_rejected = adapter.rejected();

        for record in &records {
            report.records_seen += 1;
            let nodes_before = graph.node_count();
            let edges_before = graph.edge_count();

            match self.ingest_record(graph, &name, record) {
                Outcome::Ingested { pairs, refused } => {
                    report.records_ingested += 1;
                    if pairs > 1 {
                        report.ambiguous += 1;
                        report.expanded_pairs += pairs - 1;
                    }
                    if !refused.is_empty() {
                        report.partially_ingested += 1;
                        report.refused_pairs += refused.len();
                        for (stage, e) in &refused {
                            error!(source = %name, %stage, error = %e, "merge engine refused pair");
                        }
                    }
                }
                Outcome::Malformed(e) => {
                    report.malformed += 1;
                    warn!(source = %name, a = %record.name_a, b = %record.name_b, error = %e, "skipping malformed record");
                }
                Outcome::Unmapped(e) => {
                    report.unmapped += 1;
                    debug!(source = %name, error = %e, "skipping unmapped record");
                }
                Outcome::TaxonFiltered => report.taxon_filtered += 1,
                Outcome::Refused(refused) => {
                    report.merge_errors += 1;
                    report.refused_pairs += refused.len();
                    for (stage, e) in &refused {
                        error!(source = %name, %stage, error = %e, "merge engine refused record");
                    }
                }
            }

            report.nodes_created += graph.node_count().saturating_sub(nodes_before);
            report.edges_created += graph.edge_count().saturating_sub(edges_before);
        }

        let report = report.finish();
        info!(
            source = %name,
            seen = report.records_seen,
            ingested = report.records_ingested,
            unmapped = report.unmapped,
            malformed = report.malformed,
            rejected = report.rows_rejected,
            "source finished"
        );
        report
    }

    fn ingest_record(&self, graph: &mut GraphStore, source: &str, record: &InteractionRecord) -> Outcome {
        // Start
        let references = match record.validate(&self.reference_pattern) {
            Ok(refs) => refs,
            Err(e) => return Outcome::Malformed(e),
        };
        if !self.config.accepts_taxa(record.taxon_a, record.taxon_b) {
            return Outcome::TaxonFiltered;
        }

        // ResolveIdentifiers
        let target_a = self.config.target_id_type(&record.type_a);
        let target_b = self.config.target_id_type(&record.type_b);
        let ids_a = self
            .mapper
            .map_name(&record.name_a, &record.name_type_a, target_a, record.taxon_a);
        if ids_a.is_empty() {
            return Outcome::Unmapped(IngestError::UnmappedRecord {
                name: record.name_a.clone(),
                id_type: record.name_type_a.clone(),
            });
        }
        let ids_b = self
            .mapper
            .map_name(&record.name_b, &record.name_type_b, target_b, record.taxon_b);
        if ids_b.is_empty() {
            return Outcome::Unmapped(IngestError::UnmappedRecord {
                name: record.name_b.clone(),
                id_type: record.name_type_b.clone(),
            });
        }

        // AmbiguousExpansion
        let pairs = ids_a.len() * ids_b.len();
        if pairs > 1 {
            debug!(
                source,
                a = %record.name_a,
                b = %record.name_b,
                mapped_a = ids_a.len(),
                mapped_b = ids_b.len(),
                "ambiguous mapping fans out"
            );
        }

        let evidence = {
            let ev = Evidence::new(record.source.as_str(), references.iter().cloned());
            match record.score {
                Some(score) => ev.with_score(score),
                None => ev,
            }
        };
        let interaction_type = record
            .interaction_type
            .as_deref()
            .unwrap_or(&self.config.default_interaction_type);

        let mut applied = 0;
        let mut refused = Vec::new();
        for id_a in &ids_a {
            for id_b in &ids_b {
                let a = (id_a.as_str(), target_a);
                let b = (id_b.as_str(), target_b);
                let staged =
                    self.stage_pair(graph, record, a.0, b.0, &evidence, &references, interaction_type);
                match staged.and_then(|staged| Self::commit_pair(graph, record, a, b, staged)) {
                    Ok(()) => applied += 1,
                    Err(e) => refused.push(e),
                }
            }
        }
        if applied == 0 {
            Outcome::Refused(refused)
        } else {
            Outcome::Ingested { pairs, refused }
        }
    }

    /// Computes what one pair would write, without touching `graph`.
    #[allow(clippy::too_many_arguments)]
    fn stage_pair(
        &self,
        graph: &GraphStore,
        record: &InteractionRecord,
        id_a: &str,
        id_b: &str,
        evidence: &Evidence,
        references: &BTreeSet<String>,
        interaction_type: &str,
    ) -> Result<StagedPair, (Stage, MergeError)> {
        let at = |stage: Stage| move |e: MergeError| (stage, e);
        let combiner = graph.combiner();
        let node_a = graph.resolve_identifier(id_a);
        let node_b = graph.resolve_identifier(id_b);
        let name = |id: &str, node: Option<NodeId>| {
            node.and_then(|n| graph.node(n))
                .map_or_else(|| id.to_string(), |n| n.identifier.clone())
        };
        let (name_a, name_b) = (name(id_a, node_a), name(id_b, node_b));

        // UpsertNodes
        let existing = |node: Option<NodeId>| {
            node.and_then(|n| graph.node(n))
                .map(|n| n.attrs.clone())
                .unwrap_or_default()
        };
        let attrs_a = combiner
            .combine_maps(existing(node_a), record.extra_attrs_node_a.clone())
            .map_err(at(Stage::UpsertNodes))?;
        let base_b = if name_a == name_b {
            attrs_a.clone()
        } else {
            existing(node_b)
        };
        let attrs_b = combiner
            .combine_maps(base_b, record.extra_attrs_node_b.clone())
            .map_err(at(Stage::UpsertNodes))?;

        // UpsertEdge
        let edge = match (node_a, node_b) {
            (Some(a), Some(b)) => graph.find_edge(a, b).and_then(|e| graph.edge(e)),
            _ => None,
        };
        let (edge_attrs, mut ledger) = edge.map_or_else(
            || (BTreeMap::new(), DirectionLedger::new(name_a.as_str(), name_b.as_str())),
            |e| (e.attrs.clone(), e.ledger.clone()),
        );

        // ApplyEvidence
        let mut edge_attrs = combiner
            .combine_maps(edge_attrs, record.extra_attrs_edge.clone())
            .map_err(at(Stage::ApplyEvidence))?;
        Edge::fold_evidence(combiner, &mut edge_attrs, &record.source, references, interaction_type)
            .map_err(at(Stage::ApplyEvidence))?;

        let partners = self.partners(record, &name_a, &name_b);
        ledger
            .set_direction(&partners, evidence.clone())
            .map_err(at(Stage::ApplyEvidence))?;
        if !partners.is_undirected() {
            if record.stimulation {
                ledger
                    .set_sign(&partners, Sign::Positive, evidence.clone())
                    .map_err(at(Stage::ApplyEvidence))?;
            }
            if record.inhibition {
                ledger
                    .set_sign(&partners, Sign::Negative, evidence.clone())
                    .map_err(at(Stage::ApplyEvidence))?;
            }
        }

        Ok(StagedPair {
            attrs_a,
            attrs_b,
            edge_attrs,
            ledger,
        })
    }

    /// Writes a staged pair. Nothing is written if staging failed.
    fn commit_pair(
        graph: &mut GraphStore,
        record: &InteractionRecord,
        (id_a, id_type_a): (&str, &str),
        (id_b, id_type_b): (&str, &str),
        staged: StagedPair,
    ) -> Result<(), (Stage, MergeError)> {
        let a = graph.get_or_create_node(
            id_a,
            record.type_a.clone(),
            id_type_a,
            record.taxon_a,
            Some(OriginalId::new(&record.name_a, &record.name_type_a)),
        );
        let b = graph.get_or_create_node(
            id_b,
            record.type_b.clone(),
            id_type_b,
            record.taxon_b,
            Some(OriginalId::new(&record.name_b, &record.name_type_b)),
        );
        if let Some(node) = graph.node_mut(a) {
            node.attrs = staged.attrs_a;
        }
        if let Some(node) = graph.node_mut(b) {
            node.attrs = staged.attrs_b;
        }

        let edge_id = graph
            .get_or_create_edge(a, b)
            .map_err(|e| (Stage::UpsertEdge, e))?;
        let edge = graph.edge_mut(edge_id).ok_or_else(|| {
            (
                Stage::UpsertEdge,
                MergeError::EdgeNotFound {
                    id: edge_id.to_string(),
                },
            )
        })?;
        edge.attrs = staged.edge_attrs;
        edge.ledger = staged.ledger;
        debug!(stage = %Stage::Done, edge = %edge_id, "applied evidence");
        Ok(())
    }

    /// Partners as the record states them, named by node identifiers.
    fn partners(&self, record: &InteractionRecord, a: &str, b: &str) -> Partners {
        let directed =
            record.is_directed || (self.config.signs_imply_direction && record.is_signed());
        if !directed {
            if record.is_signed() {
                debug!(a = %record.name_a, b = %record.name_b, "ignoring sign of undirected record");
            }
            return Partners::Undirected;
        }
        Partners::directed(a, b)
    }
}

//! # interactome - evidence-preserving interaction network merging
//!
//! Builds one molecular interaction network out of records coming from many
//! independently formatted resources. Every pair of entities gets exactly
//! one edge, and that edge keeps the union of all evidence ever seen for it:
//! which resources claim which direction, with which effect sign and citing
//! which references.
//!
//! ## Core Concepts
//!
//! - **Evidence**: one resource's claim plus the references it cites
//! - **DirectionLedger**: per-edge evidence split by direction and sign
//! - **Combiner**: type-dispatching merge of arbitrary attribute values
//! - **GraphStore**: node and edge arenas, one edge per node pair
//! - **Ingestor**: drives adapter records into a store
//! - **ConsistencyAnalyzer**: pairwise agreement statistics between resources
//!
//! ## Usage
//!
//! ```rust
//! use interactome::{
//!     ConsistencyAnalyzer, IdentityMapper, Ingestor, InteractionRecord, MajorityDirection,
//!     PipelineConfig, SourceAdapter, StaticAdapter,
//! };
//!
//! let ingestor = Ingestor::new(PipelineConfig::default(), IdentityMapper)?;
//! let mut graph = ingestor.new_graph();
//!
//! let adapters: Vec<Box<dyn SourceAdapter>> = vec![
//!     Box::new(StaticAdapter::new("src1", vec![
//!         InteractionRecord::new("A", "B", "src1").directed(true).stimulation(true),
//!     ])),
//!     Box::new(StaticAdapter::new("src2", vec![
//!         InteractionRecord::new("B", "A", "src2").directed(true).inhibition(true),
//!     ])),
//! ];
//! let report = ingestor.run(&mut graph, adapters);
//! assert_eq!(report.records_ingested(), 2);
//!
//! let (_, edge) = graph.edges().next().unwrap();
//! assert_eq!(edge.ledger.majority_direction(), MajorityDirection::Ambiguous);
//!
//! let consistency = ConsistencyAnalyzer::new().analyze(&graph);
//! assert!(consistency.pair("src1", "src2").is_some());
//! # Ok::<(), interactome::NetworkError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Evidence model
pub mod combine;
pub mod direction;
pub mod entity;
pub mod error;
pub mod evidence;
pub mod value;

// Network, ingestion and analysis
pub mod config;
pub mod consistency;
pub mod graph;
pub mod ingest;

// Re-export primary types at crate root for convenience
pub use combine::{combine, Combiner, NumericReducer};
pub use config::PipelineConfig;
pub use consistency::{
    Agreement, ConsistencyAnalyzer, ConsistencyReport, Disagreement, PairStats, SourceScore, Split,
};
pub use direction::{
    Bucket, ConsensusRow, DirectionLedger, LedgerEntry, MajorityDirection, Partners, Sign,
    SignSupport,
};
pub use entity::{EntityType, OriginalId};
pub use error::{IngestError, MergeError, NetworkError, NetworkResult, ValidationError};
pub use evidence::{Evidence, Evidences};
pub use graph::{attr, Edge, EdgeId, GraphStore, Node, NodeId};
pub use ingest::{
    normalize_reference, CachedMapper, DelimitedAdapter, Directedness, IdMapper, IdentityMapper,
    IngestReport, Ingestor, InputFormat, InteractionRecord, ReferenceColumn, RunId, SignColumn,
    SourceAdapter, SourceReport, SourceStatus, Stage, StaticAdapter, TableMapper, TaxonSpec,
    DEFAULT_TAXON,
};
pub use value::AttrValue;

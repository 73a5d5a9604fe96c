//! Ingestion of normalized interaction records.
//!
//! Each source is processed record by record:
//!
//! ```text
//! START → RESOLVE_IDENTIFIERS → (AMBIGUOUS_EXPANSION)? → UPSERT_NODES → UPSERT_EDGE → APPLY_EVIDENCE → DONE
//! ```
//!
//! Bad records are counted and skipped; a failing adapter skips its source.
//! Neither stops the run.

mod adapter;
mod delimited;
mod mapping;
mod pipeline;
mod record;
mod report;

pub use adapter::{SourceAdapter, StaticAdapter};
pub use delimited::{
    DelimitedAdapter, Directedness, InputFormat, ReferenceColumn, SignColumn, TaxonSpec,
};
pub use mapping::{CachedMapper, IdMapper, IdentityMapper, TableMapper};
pub use pipeline::{Ingestor, Stage};
pub use record::{normalize_reference, InteractionRecord, DEFAULT_TAXON};
pub use report::{IngestReport, RunId, SourceReport, SourceStatus};

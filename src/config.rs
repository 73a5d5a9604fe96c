//! Pipeline configuration.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::combine::{Combiner, NumericReducer};
use crate::entity::EntityType;
use crate::error::{NetworkError, ValidationError};

/// Settings of an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Canonical namespace per entity type name (see [`EntityType::as_str`]).
    pub target_id_types: BTreeMap<String, String>,
    /// Namespace for entity types missing from `target_id_types`.
    pub default_id_type: String,
    /// Keep only records whose partners both belong to one of these taxa.
    pub taxa: Option<BTreeSet<u32>>,
    /// Pattern a normalized literature reference must match.
    pub reference_pattern: String,
    /// Interaction type of records that do not state one.
    pub default_interaction_type: String,
    /// How numeric attributes are reduced.
    pub reducer: NumericReducer,
    /// Worker threads for parallel ingestion.
    pub workers: usize,
    /// Treat a stimulation or inhibition flag as a directional claim even
    /// when the record is marked undirected.
    pub signs_imply_direction: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_id_types: BTreeMap::from([
                ("protein".to_string(), "uniprot".to_string()),
                ("complex".to_string(), "complexportal".to_string()),
                ("small_molecule".to_string(), "chebi".to_string()),
                ("mirna".to_string(), "mirbase".to_string()),
                ("lncrna".to_string(), "lncrna-genesymbol".to_string()),
            ]),
            default_id_type: "uniprot".to_string(),
            taxa: None,
            reference_pattern: r"^[0-9]{1,9}$".to_string(),
            default_interaction_type: "post_translational".to_string(),
            reducer: NumericReducer::Max,
            workers: 4,
            signs_imply_direction: true,
        }
    }
}

impl PipelineConfig {
    const MAX_WORKERS: usize = 256;

    /// Checks the settings, returning them unchanged if they are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] wrapped in a
    /// [`NetworkError`] naming the first offending field.
    pub fn validate(self) -> Result<Self, NetworkError> {
        if self.workers == 0 || self.workers > Self::MAX_WORKERS {
            return Err(invalid(format!(
                "workers must be between 1 and {} (got {})",
                Self::MAX_WORKERS,
                self.workers
            )));
        }

        if let Some(taxa) = &self.taxa {
            if taxa.is_empty() {
                return Err(invalid("taxa filter must name at least one taxon"));
            }
            if taxa.contains(&0) {
                return Err(invalid("taxon 0 is not a valid NCBI taxonomy id"));
            }
        }

        if self.default_id_type.trim().is_empty() {
            return Err(invalid("default_id_type must not be empty"));
        }
        if let Some((entity, _)) = self
            .target_id_types
            .iter()
            .find(|(_, id_type)| id_type.trim().is_empty())
        {
            return Err(invalid(format!("target id type for {entity} must not be empty")));
        }

        if self.default_interaction_type.trim().is_empty() {
            return Err(invalid("default_interaction_type must not be empty"));
        }

        Regex::new(&self.reference_pattern).map_err(|e| {
            invalid(format!(
                "reference_pattern {:?} does not compile: {e}",
                self.reference_pattern
            ))
        })?;

        Ok(self)
    }

    /// Canonical namespace for an entity type.
    #[must_use]
    pub fn target_id_type(&self, entity_type: &EntityType) -> &str {
        self.target_id_types
            .get(entity_type.as_str())
            .map_or(self.default_id_type.as_str(), String::as_str)
    }

    /// Returns true if a record between these taxa passes the filter.
    #[must_use]
    pub fn accepts_taxa(&self, taxon_a: u32, taxon_b: u32) -> bool {
        self.taxa
            .as_ref()
            .map_or(true, |t| t.contains(&taxon_a) && t.contains(&taxon_b))
    }

    /// The attribute combiner these settings describe.
    #[must_use]
    pub const fn combiner(&self) -> Combiner {
        Combiner::with_reducer(self.reducer)
    }
}

fn invalid(reason: impl Into<String>) -> NetworkError {
    NetworkError::Validation(ValidationError::InvalidConfig {
        reason: reason.into(),
    })
}

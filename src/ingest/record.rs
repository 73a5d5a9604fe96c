use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::error::ValidationError;
use crate::value::AttrValue;

/// Taxon assumed when a record does not state one (human).
pub const DEFAULT_TAXON: u32 = 9606;

/// One normalized interaction as an adapter emits it.
///
/// # Examples
///
/// ```
/// use interactome::InteractionRecord;
///
/// let record = InteractionRecord::new("EGFR", "GRB2", "signor")
///     .name_types("genesymbol", "genesymbol")
///     .directed(true)
///     .stimulation(true)
///     .references(["PMID:10022841"]);
/// assert!(record.is_directed);
/// assert_eq!(record.taxon_a, 9606);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub name_a: String,
    pub name_b: String,
    pub name_type_a: String,
    pub name_type_b: String,
    pub type_a: EntityType,
    pub type_b: EntityType,
    pub source: String,
    pub is_directed: bool,
    pub references: BTreeSet<String>,
    pub stimulation: bool,
    pub inhibition: bool,
    pub taxon_a: u32,
    pub taxon_b: u32,
    /// Numeric confidence the resource attached, if any.
    #[serde(default)]
    pub score: Option<f64>,
    /// Interaction category; the pipeline default applies when absent.
    #[serde(default)]
    pub interaction_type: Option<String>,
    #[serde(default)]
    pub extra_attrs_edge: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub extra_attrs_node_a: BTreeMap<String, AttrValue>,
    #[serde(default)]
    pub extra_attrs_node_b: BTreeMap<String, AttrValue>,
}

impl InteractionRecord {
    /// Creates an undirected, unsigned protein-protein record between two
    /// UniProt accessions of the default taxon.
    #[must_use]
    pub fn new(
        name_a: impl Into<String>,
        name_b: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name_a: name_a.into(),
            name_b: name_b.into(),
            name_type_a: "uniprot".to_string(),
            name_type_b: "uniprot".to_string(),
            type_a: EntityType::Protein,
            type_b: EntityType::Protein,
            source: source.into(),
            is_directed: false,
            references: BTreeSet::new(),
            stimulation: false,
            inhibition: false,
            taxon_a: DEFAULT_TAXON,
            taxon_b: DEFAULT_TAXON,
            score: None,
            interaction_type: None,
            extra_attrs_edge: BTreeMap::new(),
            extra_attrs_node_a: BTreeMap::new(),
            extra_attrs_node_b: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name_types(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.name_type_a = a.into();
        self.name_type_b = b.into();
        self
    }

    #[must_use]
    pub fn entity_types(mut self, a: EntityType, b: EntityType) -> Self {
        self.type_a = a;
        self.type_b = b;
        self
    }

    #[must_use]
    pub const fn directed(mut self, directed: bool) -> Self {
        self.is_directed = directed;
        self
    }

    #[must_use]
    pub const fn stimulation(mut self, stimulation: bool) -> Self {
        self.stimulation = stimulation;
        self
    }

    #[must_use]
    pub const fn inhibition(mut self, inhibition: bool) -> Self {
        self.inhibition = inhibition;
        self
    }

    #[must_use]
    pub fn references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references.extend(references.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn taxa(mut self, a: u32, b: u32) -> Self {
        self.taxon_a = a;
        self.taxon_b = b;
        self
    }

    #[must_use]
    pub const fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn interaction_type(mut self, interaction_type: impl Into<String>) -> Self {
        self.interaction_type = Some(interaction_type.into());
        self
    }

    #[must_use]
    pub fn edge_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.extra_attrs_edge.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn node_a_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.extra_attrs_node_a.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn node_b_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.extra_attrs_node_b.insert(key.into(), value.into());
        self
    }

    /// Returns true if the record carries an effect sign.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.stimulation || self.inhibition
    }

    /// Checks required fields and returns the normalized references.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: a blank identifier,
    /// source or namespace, a zero taxon, or a reference that does not match
    /// `reference_pattern` after normalization.
    pub fn validate(&self, reference_pattern: &Regex) -> Result<BTreeSet<String>, ValidationError> {
        if self.name_a.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier { side: 'a' });
        }
        if self.name_b.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier { side: 'b' });
        }
        for (field, value) in [
            ("source", &self.source),
            ("name_type_a", &self.name_type_a),
            ("name_type_b", &self.name_type_b),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        for taxon in [self.taxon_a, self.taxon_b] {
            if taxon == 0 {
                return Err(ValidationError::InvalidTaxon { taxon });
            }
        }

        let mut refs = BTreeSet::new();
        for raw in &self.references {
            let Some(reference) = normalize_reference(raw) else {
                continue;
            };
            if !reference_pattern.is_match(&reference) {
                return Err(ValidationError::InvalidReference {
                    reference: raw.clone(),
                });
            }
            refs.insert(reference);
        }
        Ok(refs)
    }
}

/// Trims a reference and strips a `PMID:` / `pubmed:` prefix. Blank input
/// yields `None`.
#[must_use]
pub fn normalize_reference(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let body = ["pmid:", "pubmed:"]
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map_or(trimmed, |prefix| &trimmed[prefix.len()..])
        .trim();
    (!body.is_empty()).then(|| body.to_string())
}

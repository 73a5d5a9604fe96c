//! Entity kinds and identifier provenance.
//!
//! Nodes of the network are molecular entities. Their canonical identifier
//! is the result of translating whatever a resource used into the target
//! namespace of the entity kind; the identifiers a resource originally
//! used are kept as [`OriginalId`]s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Classification of molecular entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A protein (the default kind of most resources).
    Protein,
    /// A protein complex.
    Complex,
    /// A small molecule, metabolite or drug-like compound.
    SmallMolecule,
    /// A generic RNA.
    Rna,
    /// A microRNA.
    Mirna,
    /// A long non-coding RNA.
    Lncrna,
    /// A custom entity kind.
    Custom(String),
}

impl EntityType {
    /// Canonical lower-case name, as used in configuration keys.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Protein => "protein",
            Self::Complex => "complex",
            Self::SmallMolecule => "small_molecule",
            Self::Rna => "rna",
            Self::Mirna => "mirna",
            Self::Lncrna => "lncrna",
            Self::Custom(name) => name,
        }
    }
}

impl Default for EntityType {
    fn default() -> Self {
        Self::Protein
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => write!(f, "custom:{name}"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let parsed = match key.as_str() {
            "" => {
                return Err(ValidationError::MissingField {
                    field: "entity_type".to_string(),
                })
            }
            "protein" => Self::Protein,
            "complex" => Self::Complex,
            "small_molecule" | "smallmolecule" | "compound" | "drug" => Self::SmallMolecule,
            "rna" => Self::Rna,
            "mirna" | "mirna_mature" => Self::Mirna,
            "lncrna" => Self::Lncrna,
            other => Self::Custom(other.to_string()),
        };
        Ok(parsed)
    }
}

/// An identifier as a resource presented it, before translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginalId {
    /// The identifier itself.
    pub name: String,
    /// Its namespace (e.g. `genesymbol`, `uniprot`, `chebi`).
    pub id_type: String,
}

impl OriginalId {
    /// Creates an original identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, id_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_type: id_type.into(),
        }
    }
}

impl fmt::Display for OriginalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("protein".parse::<EntityType>().unwrap(), EntityType::Protein);
        assert_eq!(" Small-Molecule ".parse::<EntityType>().unwrap(), EntityType::SmallMolecule);
        assert_eq!("drug".parse::<EntityType>().unwrap(), EntityType::SmallMolecule);
        assert_eq!("miRNA".parse::<EntityType>().unwrap(), EntityType::Mirna);
        assert_eq!(
            "phenotype".parse::<EntityType>().unwrap(),
            EntityType::Custom("phenotype".to_string())
        );
        assert!("".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_display() {
        assert_eq!(format!("{}", EntityType::Protein), "protein");
        assert_eq!(format!("{}", EntityType::SmallMolecule), "small_molecule");
        assert_eq!(format!("{}", EntityType::Custom("x".into())), "custom:x");
        assert_eq!(EntityType::Custom("x".into()).as_str(), "x");
    }

    #[test]
    fn test_entity_type_default() {
        assert_eq!(EntityType::default(), EntityType::Protein);
    }

    #[test]
    fn test_original_id() {
        let id = OriginalId::new("EGFR", "genesymbol");
        assert_eq!(format!("{id}"), "genesymbol:EGFR");
    }

    #[test]
    fn test_entity_type_serialization() {
        let json = serde_json::to_string(&EntityType::SmallMolecule).unwrap();
        assert_eq!(json, "\"small_molecule\"");
        let back: EntityType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityType::SmallMolecule);
    }
}

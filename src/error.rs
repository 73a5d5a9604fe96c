//! Error types for the interaction network.
//!
//! All errors are strongly typed using thiserror. Contract errors
//! (a caller handed the engine something it must never receive) are kept
//! apart from data-quality conditions, which are counted and skipped
//! but never abort a run.

use thiserror::Error;

/// Validation errors raised while checking a record or a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Identifier for partner {side} cannot be empty")]
    EmptyIdentifier {
        side: char,
    },

    #[error("Reference '{reference}' cannot be parsed")]
    InvalidReference {
        reference: String,
    },

    #[error("Taxon {taxon} is not a valid NCBI taxonomy id")]
    InvalidTaxon {
        taxon: u32,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Contract errors of the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("Partners {got} do not match the edge endpoints {expected}")]
    InvalidPartners {
        expected: String,
        got: String,
    },

    #[error("Cannot combine attribute values of type {existing} and {incoming}")]
    IncompatibleAttributeTypes {
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("Identifier '{identifier}' is missing from the translation map")]
    UnknownIdentifier {
        identifier: String,
    },

    #[error("Node not found: {id}")]
    NodeNotFound {
        id: String,
    },

    #[error("Edge not found: {id}")]
    EdgeNotFound {
        id: String,
    },
}

/// Soft conditions met while ingesting a source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Identifier '{name}' ({id_type}) has no mapping")]
    UnmappedRecord {
        name: String,
        id_type: String,
    },

    #[error("Adapter for '{source_name}' failed: {reason}")]
    AdapterFailure {
        source_name: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Creates an adapter failure.
    #[must_use]
    pub fn adapter(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AdapterFailure {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl NetworkError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true for programming errors that must fail the call.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::Merge(
                MergeError::InvalidPartners { .. } | MergeError::IncompatibleAttributeTypes { .. }
            )
        )
    }

    /// Returns true if the condition is a data-quality problem that a run
    /// records and moves past.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(e) => !matches!(e, ValidationError::InvalidConfig { .. }),
            Self::Merge(e) => matches!(e, MergeError::UnknownIdentifier { .. }),
            Self::Ingest(_) => true,
            Self::Serialization(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_missing_field() {
        let err = ValidationError::MissingField {
            field: "source".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("source"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_merge_error_invalid_partners() {
        let err = MergeError::InvalidPartners {
            expected: "P00533-P04626".to_string(),
            got: "P00533->Q9Y243".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Q9Y243"));
        assert!(msg.contains("P04626"));
    }

    #[test]
    fn test_ingest_error_adapter() {
        let err = IngestError::adapter("signor", "connection reset");
        let msg = format!("{err}");
        assert!(msg.contains("signor"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_contract_violations() {
        let err: NetworkError = MergeError::IncompatibleAttributeTypes {
            existing: "map",
            incoming: "int",
        }
        .into();
        assert!(err.is_contract_violation());
        assert!(!err.is_recoverable());

        let err: NetworkError = MergeError::InvalidPartners {
            expected: "A-B".to_string(),
            got: "A->C".to_string(),
        }
        .into();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_recoverable_conditions() {
        let err: NetworkError = IngestError::UnmappedRecord {
            name: "EGFR".to_string(),
            id_type: "genesymbol".to_string(),
        }
        .into();
        assert!(err.is_recoverable());
        assert!(!err.is_contract_violation());

        let err: NetworkError = MergeError::UnknownIdentifier {
            identifier: "P00533".to_string(),
        }
        .into();
        assert!(err.is_recoverable());

        let err: NetworkError = ValidationError::InvalidConfig {
            reason: "bad".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_internal_error() {
        let err = NetworkError::internal("unexpected state");
        assert!(!err.is_recoverable());
        assert!(format!("{err}").contains("unexpected state"));
    }
}

use crate::error::IngestError;

use super::record::InteractionRecord;

/// A producer of normalized interaction records for one resource.
///
/// Fetching and parsing the resource is the adapter's business. Records an
/// adapter could not even shape into an [`InteractionRecord`] (for example
/// short rows) are dropped by the adapter and reported via
/// [`SourceAdapter::rejected`].
pub trait SourceAdapter: Send {
    /// Resource name, used as the evidence source.
    fn name(&self) -> &str;

    /// Produces every record of the resource.
    ///
    /// # Errors
    ///
    /// Any failure to produce the records. The pipeline skips the whole
    /// resource when this fails.
    fn load(&mut self) -> Result<Vec<InteractionRecord>, IngestError>;

    /// Rows dropped before they became records.
    fn rejected(&self) -> usize {
        0
    }
}

/// Serves records held in memory.
#[derive(Debug, Clone)]
pub struct StaticAdapter {
    name: String,
    records: Vec<InteractionRecord>,
}

impl StaticAdapter {
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<InteractionRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<Vec<InteractionRecord>, IngestError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_adapter() {
        let mut adapter = StaticAdapter::new(
            "signor",
            vec![InteractionRecord::new("A", "B", "signor")],
        );
        assert_eq!(adapter.name(), "signor");
        assert_eq!(adapter.load().unwrap().len(), 1);
        assert_eq!(adapter.load().unwrap().len(), 1);
        assert_eq!(adapter.rejected(), 0);
    }
}

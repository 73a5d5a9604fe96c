//! Column-layout driven reader for delimited interaction tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::EntityType;
use crate::error::IngestError;
use crate::value::AttrValue;

use super::adapter::SourceAdapter;
use super::record::{InteractionRecord, DEFAULT_TAXON};

/// Where a table states whether an interaction is directed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directedness {
    /// Every row has the same directedness.
    Fixed { directed: bool },
    /// A column holds it; the listed values mean directed.
    Column {
        index: usize,
        directed_values: BTreeSet<String>,
    },
}

/// A column holding the effect sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignColumn {
    pub index: usize,
    pub positive: BTreeSet<String>,
    pub negative: BTreeSet<String>,
}

/// A column holding literature references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceColumn {
    pub index: usize,
    pub separator: char,
}

/// Where a table states the taxa of the partners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxonSpec {
    Fixed { taxon: u32 },
    Columns { a: usize, b: usize },
}

/// Column layout of one delimited resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFormat {
    pub id_col_a: usize,
    pub id_col_b: usize,
    pub id_type_a: String,
    pub id_type_b: String,
    pub entity_type_a: EntityType,
    pub entity_type_b: EntityType,
    pub separator: char,
    /// Leading lines to skip.
    pub header_rows: usize,
    pub directedness: Directedness,
    pub sign: Option<SignColumn>,
    pub references: Option<ReferenceColumn>,
    pub taxon: TaxonSpec,
    pub interaction_type: Option<String>,
    /// Edge attribute name to column index.
    pub edge_attrs: BTreeMap<String, usize>,
    pub node_attrs_a: BTreeMap<String, usize>,
    pub node_attrs_b: BTreeMap<String, usize>,
}

impl Default for InputFormat {
    fn default() -> Self {
        Self {
            id_col_a: 0,
            id_col_b: 1,
            id_type_a: "uniprot".to_string(),
            id_type_b: "uniprot".to_string(),
            entity_type_a: EntityType::Protein,
            entity_type_b: EntityType::Protein,
            separator: '\t',
            header_rows: 0,
            directedness: Directedness::Fixed { directed: false },
            sign: None,
            references: None,
            taxon: TaxonSpec::Fixed {
                taxon: DEFAULT_TAXON,
            },
            interaction_type: None,
            edge_attrs: BTreeMap::new(),
            node_attrs_a: BTreeMap::new(),
            node_attrs_b: BTreeMap::new(),
        }
    }
}

impl InputFormat {
    /// Number of fields a row must have.
    #[must_use]
    pub fn required_fields(&self) -> usize {
        let mut columns = vec![self.id_col_a, self.id_col_b];
        if let Directedness::Column { index, .. } = &self.directedness {
            columns.push(*index);
        }
        if let Some(sign) = &self.sign {
            columns.push(sign.index);
        }
        if let Some(refs) = &self.references {
            columns.push(refs.index);
        }
        if let TaxonSpec::Columns { a, b } = &self.taxon {
            columns.extend([*a, *b]);
        }
        columns.extend(self.edge_attrs.values());
        columns.extend(self.node_attrs_a.values());
        columns.extend(self.node_attrs_b.values());
        columns.into_iter().max().map_or(0, |max| max + 1)
    }

    /// Shapes one row into a record. Returns `None` if the row is short or
    /// a taxon field is not a number.
    #[must_use]
    pub fn parse_row(&self, source: &str, fields: &[&str]) -> Option<InteractionRecord> {
        if fields.len() < self.required_fields() {
            return None;
        }
        let field = |i: usize| fields[i].trim();

        let (taxon_a, taxon_b) = match &self.taxon {
            TaxonSpec::Fixed { taxon } => (*taxon, *taxon),
            TaxonSpec::Columns { a, b } => (field(*a).parse().ok()?, field(*b).parse().ok()?),
        };

        let mut record = InteractionRecord::new(field(self.id_col_a), field(self.id_col_b), source)
            .name_types(self.id_type_a.clone(), self.id_type_b.clone())
            .entity_types(self.entity_type_a.clone(), self.entity_type_b.clone())
            .taxa(taxon_a, taxon_b);

        record.is_directed = match &self.directedness {
            Directedness::Fixed { directed } => *directed,
            Directedness::Column {
                index,
                directed_values,
            } => directed_values.contains(field(*index)),
        };
        if let Some(sign) = &self.sign {
            let value = field(sign.index);
            record.stimulation = sign.positive.contains(value);
            record.inhibition = sign.negative.contains(value);
        }
        if let Some(refs) = &self.references {
            record.references = field(refs.index)
                .split(refs.separator)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
        record.interaction_type.clone_from(&self.interaction_type);

        let attrs = |columns: &BTreeMap<String, usize>| -> BTreeMap<String, AttrValue> {
            columns
                .iter()
                .filter(|(_, i)| !field(**i).is_empty())
                .map(|(k, i)| (k.clone(), AttrValue::from(field(*i))))
                .collect()
        };
        record.extra_attrs_edge = attrs(&self.edge_attrs);
        record.extra_attrs_node_a = attrs(&self.node_attrs_a);
        record.extra_attrs_node_b = attrs(&self.node_attrs_b);
        Some(record)
    }
}

/// Reads a delimited table with an [`InputFormat`].
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug)]
pub struct DelimitedAdapter<R> {
    name: String,
    format: InputFormat,
    reader: Option<R>,
    rejected: usize,
}

impl<R: BufRead + Send> DelimitedAdapter<R> {
    pub fn new(name: impl Into<String>, format: InputFormat, reader: R) -> Self {
        Self {
            name: name.into(),
            format,
            reader: Some(reader),
            rejected: 0,
        }
    }
}

impl DelimitedAdapter<BufReader<File>> {
    /// Opens a table on disk.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the file cannot be opened.
    pub fn open(
        name: impl Into<String>,
        format: InputFormat,
        path: impl AsRef<Path>,
    ) -> Result<Self, IngestError> {
        let file = File::open(path)?;
        Ok(Self::new(name, format, BufReader::new(file)))
    }
}

impl<R: BufRead + Send> SourceAdapter for DelimitedAdapter<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self) -> Result<Vec<InteractionRecord>, IngestError> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| IngestError::adapter(&self.name, "table was already consumed"))?;

        let mut records = Vec::new();
        let mut buf = Vec::new();
        let mut lineno = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lineno += 1;
            if lineno <= self.format.header_rows {
                continue;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim_end_matches(|c| c == '\n' || c == '\r'),
                Err(e) => {
                    self.rejected += 1;
                    warn!(source = %self.name, line = lineno, error = %e, "rejected row that is not UTF-8");
                    continue;
                }
            };
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(self.format.separator).collect();
            match self.format.parse_row(&self.name, &fields) {
                Some(record) => records.push(record),
                None => {
                    self.rejected += 1;
                    warn!(
                        source = %self.name,
                        line = lineno,
                        fields = fields.len(),
                        required = self.format.required_fields(),
                        "rejected malformed row"
                    );
                }
            }
        }
        debug!(source = %self.name, records = records.len(), rejected = self.rejected, "read table");
        Ok(records)
    }

    fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn signed_format() -> InputFormat {
        InputFormat {
            id_type_a: "genesymbol".into(),
            id_type_b: "genesymbol".into(),
            header_rows: 1,
            directedness: Directedness::Column {
                index: 2,
                directed_values: BTreeSet::from(["1".to_string()]),
            },
            sign: Some(SignColumn {
                index: 3,
                positive: BTreeSet::from(["stimulation".to_string()]),
                negative: BTreeSet::from(["inhibition".to_string()]),
            }),
            references: Some(ReferenceColumn {
                index: 4,
                separator: ';',
            }),
            edge_attrs: BTreeMap::from([("mechanism".to_string(), 5)]),
            ..InputFormat::default()
        }
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(InputFormat::default().required_fields(), 2);
        assert_eq!(signed_format().required_fields(), 6);
    }

    #[test]
    fn test_load_table() {
        let table = "a\tb\tdir\teffect\trefs\tmech\n\
                     EGFR\tGRB2\t1\tstimulation\t111;222\tbinding\n\
                     # comment\n\
                     \n\
                     PTEN\tAKT1\t1\tinhibition\t\t\n\
                     SHORT\tROW\n";
        let mut adapter = DelimitedAdapter::new("signor", signed_format(), Cursor::new(table));
        let records = adapter.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(adapter.rejected(), 1);

        let first = &records[0];
        assert_eq!(first.name_a, "EGFR");
        assert_eq!(first.name_type_a, "genesymbol");
        assert_eq!(first.source, "signor");
        assert!(first.is_directed && first.stimulation && !first.inhibition);
        assert_eq!(first.references.len(), 2);
        assert_eq!(first.extra_attrs_edge["mechanism"], AttrValue::from("binding"));

        let second = &records[1];
        assert!(second.inhibition);
        assert!(second.references.is_empty());
        assert!(second.extra_attrs_edge.is_empty());
    }

    #[test]
    fn test_taxon_columns() {
        let format = InputFormat {
            taxon: TaxonSpec::Columns { a: 2, b: 3 },
            ..InputFormat::default()
        };
        let table = "P1\tP2\t10090\t10090\nP3\tP4\tmouse\t10090\n";
        let mut adapter = DelimitedAdapter::new("x", format, Cursor::new(table));
        let records = adapter.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].taxon_a, 10090);
        assert_eq!(adapter.rejected(), 1);
    }

    #[test]
    fn test_invalid_utf8_row_is_rejected() {
        let table: &[u8] = b"A\tB\nC\t\xff\xfe\nD\tE\r\n";
        let mut adapter = DelimitedAdapter::new("x", InputFormat::default(), Cursor::new(table));
        let records = adapter.load().unwrap();
        let names: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.name_a.as_str(), r.name_b.as_str()))
            .collect();
        assert_eq!(names, vec![("A", "B"), ("D", "E")]);
        assert_eq!(adapter.rejected(), 1);
    }

    #[test]
    fn test_load_twice_fails() {
        let mut adapter = DelimitedAdapter::new("x", InputFormat::default(), Cursor::new("A\tB\n"));
        assert!(adapter.load().is_ok());
        assert!(matches!(adapter.load(), Err(IngestError::AdapterFailure { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DelimitedAdapter::open("x", InputFormat::default(), dir.path().join("none.tsv"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}

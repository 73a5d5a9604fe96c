//! Attribute values carried by nodes and edges.
//!
//! Resources attach arbitrary extra attributes to the interactions they
//! describe. [`AttrValue`] is the closed set of shapes those attributes may
//! take; the combiner in [`crate::combine`] dispatches on it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::DirectionLedger;

/// A typed attribute value.
///
/// # Examples
///
/// ```
/// use interactome::AttrValue;
///
/// let sources = AttrValue::set(["signor", "kegg"]);
/// assert!(sources.is_set());
/// assert_eq!(sources.type_name(), "set");
/// assert!(AttrValue::Null.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// No value.
    Null,
    /// A flag; two flags are or-ed.
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A single string.
    Str(String),
    /// Ordered values, unique where they can be compared.
    List(Vec<AttrValue>),
    /// Unordered unique strings.
    Set(BTreeSet<String>),
    /// Named values, combined key by key.
    Map(BTreeMap<String, AttrValue>),
    /// Direction and sign evidence nested inside an attribute.
    Ledger(Box<DirectionLedger>),
}

impl AttrValue {
    /// Builds a set value from strings.
    #[must_use]
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map value.
    #[must_use]
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true for values that carry no information: null, empty
    /// strings, empty collections and empty ledgers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Set(s) => s.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Ledger(l) => l.is_empty(),
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => false,
        }
    }

    /// Returns true for ints and floats.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Returns true for values that can join a list: bools, numbers and strings.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_))
    }

    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Returns true if the value can take part in uniqueness checks.
    /// Collections and ledgers cannot.
    #[must_use]
    pub const fn is_hashable(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// The value as a float, for ints and floats.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The string, for a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The set, for a set value.
    #[must_use]
    pub const fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// The map, for a map value.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The ledger, for a ledger value.
    #[must_use]
    pub fn as_ledger(&self) -> Option<&DirectionLedger> {
        match self {
            Self::Ledger(l) => Some(l),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Ledger(_) => "ledger",
        }
    }

    /// Strings held by a string or a set value.
    #[must_use]
    pub fn strings(&self) -> BTreeSet<&str> {
        match self {
            Self::Str(s) => BTreeSet::from([s.as_str()]),
            Self::Set(s) => s.iter().map(String::as_str).collect(),
            Self::List(v) => v.iter().filter_map(Self::as_str).collect(),
            _ => BTreeSet::new(),
        }
    }
}

impl Default for AttrValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::List(v) => write!(f, "list[{}]", v.len()),
            Self::Set(v) => write!(f, "set[{}]", v.len()),
            Self::Map(v) => write!(f, "map[{}]", v.len()),
            Self::Ledger(l) => write!(f, "ledger({}-{})", l.partners().0, l.partners().1),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<BTreeSet<String>> for AttrValue {
    fn from(v: BTreeSet<String>) -> Self {
        Self::Set(v)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(v: Vec<AttrValue>) -> Self {
        Self::List(v)
    }
}

impl From<DirectionLedger> for AttrValue {
    fn from(v: DirectionLedger) -> Self {
        Self::Ledger(Box::new(v))
    }
}

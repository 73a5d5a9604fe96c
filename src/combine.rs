//! Attribute combiner.
//!
//! Whenever two values meet for the same node or edge attribute they are
//! unified by [`Combiner::combine`]. Rules are tried in order and the first
//! match wins:
//!
//! 1. an empty value yields the other one;
//! 2. two numbers are reduced (max by default);
//! 3. two sets are unioned;
//! 4. two lists are unioned keeping first-seen order, or concatenated when
//!    their elements cannot be compared;
//! 5. two maps are combined key by key;
//! 6. two ledgers are merged;
//! 7. two different strings become a two-element set;
//! 8. a list meets a set or a scalar: the other side joins the list, set
//!    elements in sorted order; a set meets a string: the string joins the set;
//! 9. booleans are or-ed; anything else is incompatible.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::value::AttrValue;

/// How two numbers are reduced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericReducer {
    /// Keep the larger value.
    #[default]
    Max,
    /// Keep the smaller value.
    Min,
    /// Add both values. Not idempotent.
    Sum,
}

impl NumericReducer {
    fn reduce(self, a: AttrValue, b: AttrValue) -> AttrValue {
        match (self, a, b) {
            (Self::Sum, AttrValue::Int(x), AttrValue::Int(y)) => AttrValue::Int(x.saturating_add(y)),
            (Self::Sum, x, y) => {
                AttrValue::Float(x.as_f64().unwrap_or(0.0) + y.as_f64().unwrap_or(0.0))
            }
            (Self::Max, AttrValue::Int(x), AttrValue::Int(y)) => AttrValue::Int(x.max(y)),
            (Self::Min, AttrValue::Int(x), AttrValue::Int(y)) => AttrValue::Int(x.min(y)),
            (reducer, x, y) => {
                let (fx, fy) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
                let keep_y = match reducer {
                    Self::Max => fy > fx,
                    _ => fy < fx,
                };
                if keep_y {
                    y
                } else {
                    x
                }
            }
        }
    }
}

/// Type-dispatching merge of attribute values.
///
/// # Examples
///
/// ```
/// use interactome::{AttrValue, Combiner};
///
/// let c = Combiner::default();
/// let v = c.combine(AttrValue::from("kinase"), AttrValue::from("phosphatase")).unwrap();
/// assert_eq!(v, AttrValue::set(["kinase", "phosphatase"]));
///
/// let v = c.combine(AttrValue::Int(3), AttrValue::Float(4.5)).unwrap();
/// assert_eq!(v, AttrValue::Float(4.5));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combiner {
    reducer: NumericReducer,
}

impl Combiner {
    /// Creates a combiner reducing numbers with `max`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a combiner with a custom numeric reducer.
    #[must_use]
    pub const fn with_reducer(reducer: NumericReducer) -> Self {
        Self { reducer }
    }

    /// The numeric reducer in use.
    #[must_use]
    pub const fn reducer(&self) -> NumericReducer {
        self.reducer
    }

    /// Unifies two values.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::IncompatibleAttributeTypes`] when no rule
    /// applies, or [`MergeError::InvalidPartners`] when two ledgers describe
    /// different pairs.
    pub fn combine(&self, existing: AttrValue, incoming: AttrValue) -> Result<AttrValue, MergeError> {
        if existing.is_empty() {
            return Ok(incoming);
        }
        if incoming.is_empty() {
            return Ok(existing);
        }
        if existing.is_numeric() && incoming.is_numeric() {
            return Ok(self.reducer.reduce(existing, incoming));
        }

        match (existing, incoming) {
            (AttrValue::Set(mut a), AttrValue::Set(b)) => {
                a.extend(b);
                Ok(AttrValue::Set(a))
            }
            (AttrValue::List(a), AttrValue::List(b)) => Ok(AttrValue::List(union_lists(a, b))),
            (AttrValue::Map(a), AttrValue::Map(b)) => self.combine_maps(a, b).map(AttrValue::Map),
            (AttrValue::Ledger(mut a), AttrValue::Ledger(b)) => {
                a.merge(&b)?;
                Ok(AttrValue::Ledger(a))
            }
            (AttrValue::Str(a), AttrValue::Str(b)) => {
                if a == b {
                    Ok(AttrValue::Str(a))
                } else {
                    Ok(AttrValue::Set(BTreeSet::from([a, b])))
                }
            }
            (AttrValue::Set(a), AttrValue::List(b)) => Ok(AttrValue::List(union_lists(set_items(a), b))),
            (AttrValue::List(a), AttrValue::Set(b)) => Ok(AttrValue::List(union_lists(a, set_items(b)))),
            (AttrValue::Set(mut a), AttrValue::Str(b)) | (AttrValue::Str(b), AttrValue::Set(mut a)) => {
                a.insert(b);
                Ok(AttrValue::Set(a))
            }
            (AttrValue::List(a), scalar) if scalar.is_scalar() => {
                Ok(AttrValue::List(union_lists(a, vec![scalar])))
            }
            (scalar, AttrValue::List(b)) if scalar.is_scalar() => {
                Ok(AttrValue::List(union_lists(vec![scalar], b)))
            }
            (AttrValue::Bool(a), AttrValue::Bool(b)) => Ok(AttrValue::Bool(a || b)),
            (a, b) if a == b => Ok(a),
            (a, b) => Err(MergeError::IncompatibleAttributeTypes {
                existing: a.type_name(),
                incoming: b.type_name(),
            }),
        }
    }

    /// Combines two attribute maps key by key.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::combine`].
    pub fn combine_maps(
        &self,
        mut existing: BTreeMap<String, AttrValue>,
        incoming: BTreeMap<String, AttrValue>,
    ) -> Result<BTreeMap<String, AttrValue>, MergeError> {
        for (key, value) in incoming {
            self.combine_into(&mut existing, key, value)?;
        }
        Ok(existing)
    }

    /// Folds one value into a map slot, creating it if missing.
    ///
    /// On error the slot keeps its previous value.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Self::combine`].
    pub fn combine_into(
        &self,
        attrs: &mut BTreeMap<String, AttrValue>,
        key: impl Into<String>,
        value: AttrValue,
    ) -> Result<(), MergeError> {
        let key = key.into();
        match attrs.get_mut(&key) {
            Some(slot) => {
                let current = std::mem::take(slot);
                match self.combine(current.clone(), value) {
                    Ok(combined) => {
                        *slot = combined;
                        Ok(())
                    }
                    Err(e) => {
                        *slot = current;
                        Err(e)
                    }
                }
            }
            None => {
                attrs.insert(key, value);
                Ok(())
            }
        }
    }
}

/// Unifies two values with the default combiner.
///
/// # Errors
///
/// See [`Combiner::combine`].
pub fn combine(existing: AttrValue, incoming: AttrValue) -> Result<AttrValue, MergeError> {
    Combiner::default().combine(existing, incoming)
}

fn union_lists(a: Vec<AttrValue>, b: Vec<AttrValue>) -> Vec<AttrValue> {
    let comparable = a.iter().chain(b.iter()).all(AttrValue::is_hashable);
    if !comparable {
        let mut out = a;
        out.extend(b);
        return out;
    }

    let mut out: Vec<AttrValue> = Vec::with_capacity(a.len() + b.len());
    for item in a.into_iter().chain(b) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn set_items(set: BTreeSet<String>) -> Vec<AttrValue> {
    set.into_iter().map(AttrValue::Str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{DirectionLedger, Partners};
    use crate::evidence::Evidence;

    fn c() -> Combiner {
        Combiner::default()
    }

    #[test]
    fn test_empty_yields_other() {
        assert_eq!(c().combine(AttrValue::Null, AttrValue::Int(1)).unwrap(), AttrValue::Int(1));
        assert_eq!(
            c().combine(AttrValue::set(["a"]), AttrValue::List(vec![])).unwrap(),
            AttrValue::set(["a"])
        );
        assert_eq!(
            c().combine(AttrValue::from(""), AttrValue::Map(BTreeMap::new())).unwrap(),
            AttrValue::Map(BTreeMap::new())
        );
    }

    #[test]
    fn test_numeric_reducers() {
        assert_eq!(c().combine(AttrValue::Int(3), AttrValue::Int(7)).unwrap(), AttrValue::Int(7));
        assert_eq!(
            c().combine(AttrValue::Float(0.9), AttrValue::Int(0)).unwrap(),
            AttrValue::Float(0.9)
        );

        let min = Combiner::with_reducer(NumericReducer::Min);
        assert_eq!(min.combine(AttrValue::Int(3), AttrValue::Int(7)).unwrap(), AttrValue::Int(3));

        let sum = Combiner::with_reducer(NumericReducer::Sum);
        assert_eq!(sum.combine(AttrValue::Int(3), AttrValue::Int(7)).unwrap(), AttrValue::Int(10));
        assert_eq!(
            sum.combine(AttrValue::Int(1), AttrValue::Float(0.5)).unwrap(),
            AttrValue::Float(1.5)
        );
    }

    #[test]
    fn test_sets_union() {
        let v = c().combine(AttrValue::set(["a", "b"]), AttrValue::set(["b", "c"])).unwrap();
        assert_eq!(v, AttrValue::set(["a", "b", "c"]));
    }

    #[test]
    fn test_lists_unique_in_order() {
        let a = AttrValue::List(vec![AttrValue::from("x"), AttrValue::from("y")]);
        let b = AttrValue::List(vec![AttrValue::from("y"), AttrValue::from("z")]);
        let v = c().combine(a, b).unwrap();
        assert_eq!(
            v,
            AttrValue::List(vec![AttrValue::from("x"), AttrValue::from("y"), AttrValue::from("z")])
        );
    }

    #[test]
    fn test_lists_of_collections_concatenate() {
        let inner = AttrValue::set(["a"]);
        let a = AttrValue::List(vec![inner.clone()]);
        let b = AttrValue::List(vec![inner.clone()]);
        let v = c().combine(a, b).unwrap();
        assert_eq!(v, AttrValue::List(vec![inner.clone(), inner]));
    }

    #[test]
    fn test_maps_recursive() {
        let a = AttrValue::map([
            ("kinase", AttrValue::set(["s1"])),
            ("score", AttrValue::Int(1)),
        ]);
        let b = AttrValue::map([
            ("kinase", AttrValue::set(["s2"])),
            ("site", AttrValue::from("Y1068")),
        ]);
        let v = c().combine(a, b).unwrap();
        let m = v.as_map().unwrap();
        assert_eq!(m["kinase"], AttrValue::set(["s1", "s2"]));
        assert_eq!(m["score"], AttrValue::Int(1));
        assert_eq!(m["site"], AttrValue::from("Y1068"));
    }

    #[test]
    fn test_ledgers_merge() {
        let mut l1 = DirectionLedger::new("A", "B");
        l1.set_direction(&Partners::directed("A", "B"), Evidence::bare("s1")).unwrap();
        let mut l2 = DirectionLedger::new("A", "B");
        l2.set_direction(&Partners::directed("B", "A"), Evidence::bare("s2")).unwrap();

        let v = c().combine(l1.into(), l2.into()).unwrap();
        assert!(v.as_ledger().unwrap().is_mutual());
    }

    #[test]
    fn test_ledgers_of_different_pairs_fail() {
        let mut l1 = DirectionLedger::new("A", "B");
        l1.set_direction(&Partners::Undirected, Evidence::bare("s1")).unwrap();
        let mut l2 = DirectionLedger::new("A", "C");
        l2.set_direction(&Partners::Undirected, Evidence::bare("s1")).unwrap();
        assert!(matches!(
            c().combine(l1.into(), l2.into()),
            Err(MergeError::InvalidPartners { .. })
        ));
    }

    #[test]
    fn test_strings_promote_to_set() {
        assert_eq!(
            c().combine(AttrValue::from("a"), AttrValue::from("a")).unwrap(),
            AttrValue::from("a")
        );
        assert_eq!(
            c().combine(AttrValue::from("b"), AttrValue::from("a")).unwrap(),
            AttrValue::set(["a", "b"])
        );
    }

    #[test]
    fn test_scalar_joins_collection() {
        assert_eq!(
            c().combine(AttrValue::set(["a"]), AttrValue::from("b")).unwrap(),
            AttrValue::set(["a", "b"])
        );
        assert_eq!(
            c().combine(AttrValue::from("b"), AttrValue::set(["a"])).unwrap(),
            AttrValue::set(["a", "b"])
        );
        assert_eq!(
            c().combine(AttrValue::List(vec![AttrValue::Int(1)]), AttrValue::Int(2)).unwrap(),
            AttrValue::List(vec![AttrValue::Int(1), AttrValue::Int(2)])
        );
        assert_eq!(
            c().combine(AttrValue::List(vec![AttrValue::Int(1)]), AttrValue::Int(1)).unwrap(),
            AttrValue::List(vec![AttrValue::Int(1)])
        );
    }

    #[test]
    fn test_set_and_list_keep_list() {
        let v = c()
            .combine(AttrValue::set(["b", "a"]), AttrValue::List(vec![AttrValue::from("c"), AttrValue::from("a")]))
            .unwrap();
        assert_eq!(
            v,
            AttrValue::List(vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("c")])
        );
        let v = c()
            .combine(AttrValue::List(vec![AttrValue::Int(1)]), AttrValue::set(["a"]))
            .unwrap();
        assert_eq!(v, AttrValue::List(vec![AttrValue::Int(1), AttrValue::from("a")]));
    }

    #[test]
    fn test_list_string_string_grouping() {
        let x = AttrValue::List(vec![AttrValue::from("x")]);
        let (a, b) = (AttrValue::from("a"), AttrValue::from("b"));
        let left = c()
            .combine(c().combine(x.clone(), a.clone()).unwrap(), b.clone())
            .unwrap();
        let right = c().combine(x, c().combine(a, b).unwrap()).unwrap();
        let expected = AttrValue::List(vec![AttrValue::from("x"), AttrValue::from("a"), AttrValue::from("b")]);
        assert_eq!(left, expected);
        assert_eq!(right, expected);
    }

    #[test]
    fn test_bools_or() {
        assert_eq!(
            c().combine(AttrValue::Bool(false), AttrValue::Bool(true)).unwrap(),
            AttrValue::Bool(true)
        );
    }

    #[test]
    fn test_incompatible_types() {
        let err = c().combine(AttrValue::map([("k", AttrValue::Int(1))]), AttrValue::Int(3)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::IncompatibleAttributeTypes { existing: "map", incoming: "int" }
        ));
        assert!(c().combine(AttrValue::from("x"), AttrValue::Int(3)).is_err());
    }

    #[test]
    fn test_combine_into_keeps_slot_on_error() {
        let mut attrs = BTreeMap::from([("k".to_string(), AttrValue::from("x"))]);
        assert!(c().combine_into(&mut attrs, "k", AttrValue::Int(1)).is_err());
        assert_eq!(attrs["k"], AttrValue::from("x"));

        c().combine_into(&mut attrs, "k", AttrValue::from("y")).unwrap();
        assert_eq!(attrs["k"], AttrValue::set(["x", "y"]));
        c().combine_into(&mut attrs, "new", AttrValue::Int(5)).unwrap();
        assert_eq!(attrs["new"], AttrValue::Int(5));
    }

    #[test]
    fn test_associative_strings() {
        let (a, b, x) = (AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("c"));
        let left = c()
            .combine(c().combine(a.clone(), b.clone()).unwrap(), x.clone())
            .unwrap();
        let right = c().combine(a, c().combine(b, x).unwrap()).unwrap();
        assert_eq!(left, right);
    }
}

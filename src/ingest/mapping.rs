//! Identifier translation collaborators.
//!
//! The pipeline never translates identifiers itself; it asks an
//! [`IdMapper`]. Unknown identifiers map to an empty set, never to an error.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Translates identifiers between namespaces.
pub trait IdMapper: Send + Sync {
    /// Returns every identifier in `to` that `name` (in `from`) maps to.
    fn map_name(&self, name: &str, from: &str, to: &str, taxon: u32) -> BTreeSet<String>;
}

impl<T: IdMapper + ?Sized> IdMapper for &T {
    fn map_name(&self, name: &str, from: &str, to: &str, taxon: u32) -> BTreeSet<String> {
        (**self).map_name(name, from, to, taxon)
    }
}

impl<T: IdMapper + ?Sized> IdMapper for Arc<T> {
    fn map_name(&self, name: &str, from: &str, to: &str, taxon: u32) -> BTreeSet<String> {
        (**self).map_name(name, from, to, taxon)
    }
}

/// Passes every identifier through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl IdMapper for IdentityMapper {
    fn map_name(&self, name: &str, _from: &str, _to: &str, _taxon: u32) -> BTreeSet<String> {
        BTreeSet::from([name.to_string()])
    }
}

/// In-memory translation table.
///
/// Lookups within one namespace fall back to the identifier itself when the
/// table has no entry for it.
///
/// # Examples
///
/// ```
/// use interactome::{IdMapper, TableMapper};
///
/// let mut mapper = TableMapper::new();
/// mapper.insert("genesymbol", "uniprot", "EGFR", ["P00533"]);
/// assert!(mapper.map_name("EGFR", "genesymbol", "uniprot", 9606).contains("P00533"));
/// assert!(mapper.map_name("NOPE", "genesymbol", "uniprot", 9606).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableMapper {
    tables: HashMap<(String, String), HashMap<String, BTreeSet<String>>>,
    by_taxon: HashMap<(String, String, u32), HashMap<String, BTreeSet<String>>>,
}

impl TableMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds targets for `name` valid in every taxon.
    pub fn insert<I, S>(&mut self, from: &str, to: &str, name: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .entry((from.to_string(), to.to_string()))
            .or_default()
            .entry(name.to_string())
            .or_default()
            .extend(targets.into_iter().map(Into::into));
    }

    /// Adds targets for `name` valid in one taxon only. Taxon-specific
    /// entries take precedence over generic ones.
    pub fn insert_for_taxon<I, S>(&mut self, from: &str, to: &str, taxon: u32, name: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_taxon
            .entry((from.to_string(), to.to_string(), taxon))
            .or_default()
            .entry(name.to_string())
            .or_default()
            .extend(targets.into_iter().map(Into::into));
    }

    /// Number of source identifiers with at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum::<usize>()
            + self.by_taxon.values().map(HashMap::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdMapper for TableMapper {
    fn map_name(&self, name: &str, from: &str, to: &str, taxon: u32) -> BTreeSet<String> {
        let key = (from.to_string(), to.to_string());
        let specific = self
            .by_taxon
            .get(&(key.0.clone(), key.1.clone(), taxon))
            .and_then(|t| t.get(name));
        if let Some(found) = specific.or_else(|| self.tables.get(&key).and_then(|t| t.get(name))) {
            return found.clone();
        }
        if from == to {
            BTreeSet::from([name.to_string()])
        } else {
            BTreeSet::new()
        }
    }
}

type CacheKey = (String, String, String, u32);

/// Memoizes another mapper.
#[derive(Debug, Default)]
pub struct CachedMapper<M> {
    inner: M,
    cache: RwLock<HashMap<CacheKey, BTreeSet<String>>>,
}

impl<M: IdMapper> CachedMapper<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of memoized lookups.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: IdMapper> IdMapper for CachedMapper<M> {
    fn map_name(&self, name: &str, from: &str, to: &str, taxon: u32) -> BTreeSet<String> {
        let key = (name.to_string(), from.to_string(), to.to_string(), taxon);
        {
            let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = guard.get(&key) {
                return hit.clone();
            }
        }

        let mapped = self.inner.map_name(name, from, to, taxon);
        // Another thread may have filled the slot meanwhile; both values are equal.
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert_with(|| mapped.clone());
        mapped
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting {
        calls: AtomicUsize,
    }

    impl IdMapper for Counting {
        fn map_name(&self, name: &str, _from: &str, _to: &str, _taxon: u32) -> BTreeSet<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            BTreeSet::from([name.to_lowercase()])
        }
    }

    #[test]
    fn test_identity_mapper() {
        let m = IdentityMapper;
        assert_eq!(
            m.map_name("X", "genesymbol", "uniprot", 9606),
            BTreeSet::from(["X".to_string()])
        );
    }

    #[test]
    fn test_table_mapper_ambiguous_and_unknown() {
        let mut m = TableMapper::new();
        m.insert("genesymbol", "uniprot", "A", ["X1", "X2"]);
        assert_eq!(m.map_name("A", "genesymbol", "uniprot", 9606).len(), 2);
        assert!(m.map_name("B", "genesymbol", "uniprot", 9606).is_empty());
        assert_eq!(
            m.map_name("P1", "uniprot", "uniprot", 9606),
            BTreeSet::from(["P1".to_string()])
        );
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_table_mapper_taxon_specific() {
        let mut m = TableMapper::new();
        m.insert("genesymbol", "uniprot", "Egfr", ["GENERIC"]);
        m.insert_for_taxon("genesymbol", "uniprot", 10090, "Egfr", ["Q01279"]);
        assert!(m.map_name("Egfr", "genesymbol", "uniprot", 10090).contains("Q01279"));
        assert!(m.map_name("Egfr", "genesymbol", "uniprot", 9606).contains("GENERIC"));
    }

    #[test]
    fn test_cached_mapper_memoizes() {
        let m = CachedMapper::new(Counting {
            calls: AtomicUsize::new(0),
        });
        for _ in 0..3 {
            assert!(m.map_name("ABC", "a", "b", 1).contains("abc"));
        }
        assert_eq!(m.cached(), 1);
        assert_eq!(m.into_inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mapper_through_references() {
        let table = Arc::new(IdentityMapper);
        let by_ref: &dyn IdMapper = &*table;
        assert_eq!(by_ref.map_name("Q", "x", "y", 1).len(), 1);
        assert_eq!(table.map_name("Q", "x", "y", 1).len(), 1);
    }
}

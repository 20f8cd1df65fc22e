//! In-memory document collections backing the reference concepts

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors from collection operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("{0} conflicts with an existing document")]
    Conflict(String),
}

/// A key-addressed document collection
///
/// Documents are kept in insertion order so queries return stable,
/// predictable results. Every operation takes the lock once, which makes
/// each concept method atomic with respect to its own collection.
#[derive(Debug)]
pub struct Collection<D> {
    name: &'static str,
    inner: RwLock<Inner<D>>,
}

#[derive(Debug)]
struct Inner<D> {
    order: Vec<String>,
    docs: HashMap<String, D>,
}

impl<D: Clone> Collection<D> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Inner {
                order: Vec::new(),
                docs: HashMap::new(),
            }),
        }
    }

    /// Generate a fresh document id
    pub fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn insert(&self, id: impl Into<String>, doc: D) -> Result<(), StoreError> {
        let id = id.into();
        let mut inner = self.inner.write();
        if inner.docs.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("{} {}", self.name, id)));
        }
        inner.order.push(id.clone());
        inner.docs.insert(id, doc);
        Ok(())
    }

    /// Insert `doc` unless an existing document satisfies `conflicts`
    ///
    /// The check and the insert happen under one write lock, so two
    /// concurrent callers cannot both pass the check.
    pub fn insert_unique(
        &self,
        id: impl Into<String>,
        doc: D,
        conflicts: impl Fn(&D) -> bool,
    ) -> Result<(), StoreError> {
        let id = id.into();
        let mut inner = self.inner.write();
        if inner.docs.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("{} {}", self.name, id)));
        }
        if inner.docs.values().any(&conflicts) {
            return Err(StoreError::Conflict(format!("{} {}", self.name, id)));
        }
        inner.order.push(id.clone());
        inner.docs.insert(id, doc);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<D> {
        self.inner.read().docs.get(id).cloned()
    }

    /// All documents satisfying `predicate`, in insertion order
    pub fn find(&self, predicate: impl Fn(&D) -> bool) -> Vec<(String, D)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| {
                let doc = inner.docs.get(id)?;
                predicate(doc).then(|| (id.clone(), doc.clone()))
            })
            .collect()
    }

    pub fn find_one(&self, predicate: impl Fn(&D) -> bool) -> Option<(String, D)> {
        let inner = self.inner.read();
        inner.order.iter().find_map(|id| {
            let doc = inner.docs.get(id)?;
            predicate(doc).then(|| (id.clone(), doc.clone()))
        })
    }

    /// Apply `change` to a document and return the updated copy
    pub fn update(&self, id: &str, change: impl FnOnce(&mut D)) -> Result<D, StoreError> {
        let mut inner = self.inner.write();
        let doc = inner
            .docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", self.name, id)))?;
        change(doc);
        Ok(doc.clone())
    }

    pub fn delete(&self, id: &str) -> Result<D, StoreError> {
        let mut inner = self.inner.write();
        let doc = inner
            .docs
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", self.name, id)))?;
        inner.order.retain(|existing| existing != id);
        Ok(doc)
    }

    /// Remove every document satisfying `predicate`, returning how many went
    pub fn delete_where(&self, predicate: impl Fn(&D) -> bool) -> usize {
        let mut inner = self.inner.write();
        let doomed: Vec<String> = inner
            .order
            .iter()
            .filter(|id| inner.docs.get(*id).is_some_and(&predicate))
            .cloned()
            .collect();
        for id in &doomed {
            inner.docs.remove(id);
        }
        inner.order.retain(|id| !doomed.contains(id));
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_and_duplicate() {
        let docs = Collection::new("note");
        docs.insert("a", 1).unwrap();
        assert_eq!(docs.get("a"), Some(1));
        assert_eq!(
            docs.insert("a", 2),
            Err(StoreError::Duplicate("note a".into()))
        );
    }

    #[test]
    fn test_insert_unique_rejects_conflicts() {
        let docs = Collection::new("n");
        docs.insert_unique("a", 1, |n| *n == 1).unwrap();
        assert_eq!(
            docs.insert_unique("b", 1, |n| *n == 1),
            Err(StoreError::Conflict("n b".into()))
        );
        assert_eq!(
            docs.insert_unique("a", 2, |n| *n == 2),
            Err(StoreError::Duplicate("n a".into()))
        );
        docs.insert_unique("b", 2, |n| *n == 2).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_concurrent_insert_unique_admits_one() {
        let docs = std::sync::Arc::new(Collection::new("n"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let docs = docs.clone();
                std::thread::spawn(move || docs.insert_unique(format!("id{i}"), 7, |n| *n == 7))
            })
            .collect();
        let admitted = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter(Result::is_ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_find_keeps_insertion_order() {
        let docs = Collection::new("n");
        for (id, n) in [("z", 3), ("a", 1), ("m", 2)] {
            docs.insert(id, n).unwrap();
        }
        let found: Vec<_> = docs.find(|n| *n > 1).into_iter().map(|(id, _)| id).collect();
        assert_eq!(found, ["z", "m"]);
        assert_eq!(docs.find_one(|n| *n < 3).map(|(id, _)| id), Some("a".into()));
    }

    #[test]
    fn test_update_and_delete() {
        let docs = Collection::new("n");
        docs.insert("a", 1).unwrap();
        assert_eq!(docs.update("a", |n| *n += 10), Ok(11));
        assert_eq!(docs.delete("a"), Ok(11));
        assert!(docs.is_empty());
        assert!(matches!(docs.delete("a"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_where() {
        let docs = Collection::new("n");
        for (id, n) in [("a", 1), ("b", 2), ("c", 3)] {
            docs.insert(id, n).unwrap();
        }
        assert_eq!(docs.delete_where(|n| n % 2 == 1), 2);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.get("b"), Some(2));
    }
}

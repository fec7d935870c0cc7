pub mod matcher;
pub mod memory;

use std::fmt;
use async_trait::async_trait;
use uuid::Uuid;
use crate::core::error::Result;
use crate::core::types::{DerivedRecord, Record};
use crate::query::ast::Predicate;
use crate::query::planner::Pipeline;

/// Document store over one named collection of records.
/// The core only reads; it never writes through this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// Scoped session for one logical request
    async fn acquire(&self) -> Result<StoreSession>;

    async fn find(&self, session: &StoreSession, predicate: &Predicate) -> Result<Cursor<Record>>;

    async fn aggregate(&self, session: &StoreSession, pipeline: &Pipeline) -> Result<Cursor<Row>>;

    async fn count(&self, session: &StoreSession, predicate: &Predicate) -> Result<u64>;

    fn collection(&self) -> &str;
}

type ReleaseFn = Box<dyn FnOnce(Uuid) + Send + Sync>;

/// Session guard. Released exactly once, when dropped.
pub struct StoreSession {
    id: Uuid,
    release: Option<ReleaseFn>,
}

impl StoreSession {
    pub fn new(release: impl FnOnce(Uuid) + Send + Sync + 'static) -> Self {
        StoreSession {
            id: Uuid::new_v4(),
            release: Some(Box::new(release)),
        }
    }

    /// Session with nothing to release
    pub fn detached() -> Self {
        StoreSession { id: Uuid::new_v4(), release: None }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.id);
        }
    }
}

impl fmt::Debug for StoreSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSession").field("id", &self.id).finish()
    }
}

/// Aggregation output row
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Record(DerivedRecord),
    /// Count of the matched set plus the sliced page of that same set
    Facet { total: u64, data: Vec<DerivedRecord> },
    Count(u64),
    Group(GroupRow),
}

/// One group of a `Stage::Group`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: Option<String>,
    pub count: u64,
    pub top: Option<DerivedRecord>,
}

/// Buffered store results
#[derive(Debug, Clone)]
pub struct Cursor<T> {
    items: Vec<T>,
}

impl<T> Cursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Cursor { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_list(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for Cursor<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn session_releases_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let session = StoreSession::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(session);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cursor_materializes_in_order() {
        let cursor = Cursor::new(vec![3, 1, 2]);
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.to_list(), vec![3, 1, 2]);
    }
}

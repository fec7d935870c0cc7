use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::debug;
use uuid::Uuid;
use crate::age::derive_fields;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DerivedRecord, Record, RecordId};
use crate::query::ast::Predicate;
use crate::query::planner::{GroupBy, Pipeline, Stage};
use crate::query::sort::SortSpec;
use crate::query::types::SortOrder;
use crate::store::matcher::{compare_optional, field_value, RecordMatcher};
use crate::store::{Cursor, GroupRow, RecordStore, Row, StoreSession};

/// In-process store. Evaluates the same predicates and pipelines a
/// document database would, over records held in memory.
pub struct MemoryStore {
    collection: String,
    records: RwLock<BTreeMap<RecordId, Record>>,
    connected: AtomicBool,
    sessions: Arc<Mutex<HashSet<Uuid>>>,

    // Fault injection
    operations: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        MemoryStore {
            collection: collection.into(),
            records: RwLock::new(BTreeMap::new()),
            connected: AtomicBool::new(false),
            sessions: Arc::new(Mutex::new(HashSet::new())),
            operations: AtomicUsize::new(0),
            fail_after: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    pub fn with_records(collection: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new(collection);
        store.extend(records);
        store
    }

    pub fn insert(&self, record: Record) {
        self.records.write().insert(record.id, record);
    }

    pub fn extend(&self, records: impl IntoIterator<Item = Record>) {
        let mut guard = self.records.write();
        for record in records {
            guard.insert(record.id, record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Sessions acquired and not yet dropped
    pub fn open_session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// The next `operations` reads succeed, every later one fails.
    pub fn fail_after(&self, operations: usize) {
        self.operations.store(0, Ordering::SeqCst);
        *self.fail_after.lock() = Some(operations);
    }

    /// Delay applied to every read
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::store_unavailable(format!("collection {} is not connected", self.collection)))
        }
    }

    async fn begin_operation(&self, operation: &str) -> Result<()> {
        self.ensure_connected()?;

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let performed = self.operations.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_after.lock() {
            if performed >= limit {
                return Err(Error::store_unavailable(format!("{operation} failed: injected fault")));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<DerivedRecord> {
        self.records.read().values().cloned().map(DerivedRecord::bare).collect()
    }

    fn run_pipeline(&self, pipeline: &Pipeline) -> Result<Vec<Row>> {
        run_stages(self.snapshot(), &pipeline.stages)
    }
}

enum Output {
    Records(Vec<DerivedRecord>),
    Rows(Vec<Row>),
}

fn run_stages(mut docs: Vec<DerivedRecord>, stages: &[Stage]) -> Result<Vec<Row>> {
    for (index, stage) in stages.iter().enumerate() {
        match apply_stage(docs, stage)? {
            Output::Records(next) => docs = next,
            Output::Rows(rows) => {
                if index + 1 != stages.len() {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!("stage {index} must be the last stage of the pipeline"),
                    ));
                }
                return Ok(rows);
            }
        }
    }
    Ok(docs.into_iter().map(Row::Record).collect())
}

fn apply_stage(docs: Vec<DerivedRecord>, stage: &Stage) -> Result<Output> {
    let docs: Vec<DerivedRecord> = match stage {
        Stage::AddDerivedFields { now } => docs
            .into_par_iter()
            .map(|doc| derive_fields(doc.record, *now))
            .collect(),
        Stage::Match(predicate) => filter(docs, predicate)?,
        Stage::Sort(spec) => {
            let mut docs = docs;
            sort(&mut docs, spec);
            docs
        }
        Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
        Stage::Limit(n) => docs.into_iter().take(*n).collect(),
        Stage::Project(projection) => docs
            .into_iter()
            .map(|mut doc| {
                projection.apply(&mut doc.record);
                doc
            })
            .collect(),
        Stage::Facet { data } => {
            let total = docs.len() as u64;
            let page = run_stages(docs, data)?
                .into_iter()
                .map(|row| match row {
                    Row::Record(doc) => Ok(doc),
                    _ => Err(Error::new(ErrorKind::InvalidInput, "facet data must yield records".to_string())),
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Output::Rows(vec![Row::Facet { total, data: page }]));
        }
        Stage::Count => return Ok(Output::Rows(vec![Row::Count(docs.len() as u64)])),
        Stage::Group(group) => return Ok(Output::Rows(group_rows(docs, group))),
    };
    Ok(Output::Records(docs))
}

/// Keys descending; the keyless group sorts last
fn group_rows(docs: Vec<DerivedRecord>, group: &GroupBy) -> Vec<Row> {
    let mut groups: BTreeMap<Option<String>, Vec<DerivedRecord>> = BTreeMap::new();
    for doc in docs {
        let key = field_value(&doc, group.key)
            .map(|value| value.to_string())
            .or_else(|| group.missing.clone());
        groups.entry(key).or_default().push(doc);
    }

    groups
        .into_iter()
        .rev()
        .map(|(key, mut members)| {
            let count = members.len() as u64;
            let top = group.top.as_ref().and_then(|order| {
                sort(&mut members, order);
                members.into_iter().next()
            });
            Row::Group(GroupRow { key, count, top })
        })
        .collect()
}

/// Order-preserving parallel filter
fn filter(docs: Vec<DerivedRecord>, predicate: &Predicate) -> Result<Vec<DerivedRecord>> {
    if predicate.is_match_all() {
        return Ok(docs);
    }
    let matcher = RecordMatcher::new(predicate)?;
    Ok(docs.into_par_iter().filter(|doc| matcher.matches(doc)).collect())
}

/// Stable multi-key sort
fn sort(docs: &mut [DerivedRecord], spec: &SortSpec) {
    docs.sort_by(|a, b| {
        for key in &spec.keys {
            let left = field_value(a, key.field);
            let right = field_value(b, key.field);
            let ordering = compare_optional(left.as_ref(), right.as_ref());
            let ordering = match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        debug!(collection = %self.collection, "memory store connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        debug!(collection = %self.collection, "memory store disconnected");
        Ok(())
    }

    async fn acquire(&self) -> Result<StoreSession> {
        self.ensure_connected()?;
        let sessions = self.sessions.clone();
        let session = StoreSession::new(move |id| {
            sessions.lock().remove(&id);
        });
        self.sessions.lock().insert(session.id());
        Ok(session)
    }

    async fn find(&self, _session: &StoreSession, predicate: &Predicate) -> Result<Cursor<Record>> {
        self.begin_operation("find").await?;
        let matched = filter(self.snapshot(), predicate)?;
        Ok(Cursor::new(matched.into_iter().map(|doc| doc.record).collect()))
    }

    async fn aggregate(&self, _session: &StoreSession, pipeline: &Pipeline) -> Result<Cursor<Row>> {
        self.begin_operation("aggregate").await?;
        Ok(Cursor::new(self.run_pipeline(pipeline)?))
    }

    async fn count(&self, _session: &StoreSession, predicate: &Predicate) -> Result<u64> {
        self.begin_operation("count").await?;
        Ok(filter(self.snapshot(), predicate)?.len() as u64)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

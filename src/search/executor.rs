use std::future::Future;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DerivedRecord, Record};
use crate::query::ast::Predicate;
use crate::query::planner::{GroupBy, Pipeline, QueryPlan};
use crate::search::results::SearchPage;
use crate::store::{GroupRow, RecordStore, Row, StoreSession};

/// Runs plans against the store, one deadline per round-trip
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn RecordStore>,
    config: Arc<Config>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<Config>) -> Self {
        QueryExecutor { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn acquire(&self) -> Result<StoreSession> {
        self.bounded("acquire", self.store.acquire()).await
    }

    /// Returns `{total, data}` for the plan. Bounded plans are answered by
    /// one facet so the total and the slice describe the same matched set.
    #[instrument(skip_all, fields(collection = self.store.collection(), page = plan.pagination.page))]
    pub async fn execute(&self, session: &StoreSession, plan: &QueryPlan) -> Result<SearchPage> {
        let pipeline = plan.to_pipeline();
        debug!(stages = pipeline.stages.len(), bounded = plan.pagination.is_bounded(), "executing listing");

        let rows = self
            .bounded("aggregate", self.store.aggregate(session, &pipeline))
            .await?
            .to_list();

        let (total, data) = if plan.pagination.is_bounded() {
            match rows.into_iter().next() {
                Some(Row::Facet { total, data }) => (total, data),
                None => (0, Vec::new()),
                Some(other) => return Err(unexpected_row(&other)),
            }
        } else {
            let data = rows
                .into_iter()
                .map(|row| match row {
                    Row::Record(doc) => Ok(doc),
                    other => Err(unexpected_row(&other)),
                })
                .collect::<Result<Vec<DerivedRecord>>>()?;
            (data.len() as u64, data)
        };

        debug!(total, returned = data.len(), "listing executed");
        Ok(SearchPage { total, data, pagination: plan.pagination })
    }

    /// Count of records matching `predicate`, with derived fields
    /// computed against `now`.
    #[instrument(skip_all, fields(collection = self.store.collection()))]
    pub async fn count(&self, session: &StoreSession, predicate: Predicate, now: DateTime<Utc>) -> Result<u64> {
        let pipeline = Pipeline::count(predicate, now);
        let rows = self
            .bounded("count", self.store.aggregate(session, &pipeline))
            .await?
            .to_list();

        match rows.into_iter().next() {
            Some(Row::Count(count)) => Ok(count),
            None => Ok(0),
            Some(other) => Err(unexpected_row(&other)),
        }
    }

    /// The plan's matched set folded by `group`, one row per key
    #[instrument(skip_all, fields(collection = self.store.collection(), key = ?group.key))]
    pub async fn group(&self, session: &StoreSession, plan: &QueryPlan, group: GroupBy) -> Result<Vec<GroupRow>> {
        let pipeline = plan.to_group_pipeline(group);
        let rows = self
            .bounded("aggregate", self.store.aggregate(session, &pipeline))
            .await?
            .to_list();

        let groups = rows
            .into_iter()
            .map(|row| match row {
                Row::Group(group) => Ok(group),
                other => Err(unexpected_row(&other)),
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(groups = groups.len(), "grouped");
        Ok(groups)
    }

    /// Plain stored-field count, no derived fields
    pub async fn count_stored(&self, session: &StoreSession, predicate: &Predicate) -> Result<u64> {
        self.bounded("count", self.store.count(session, predicate)).await
    }

    pub async fn find(&self, session: &StoreSession, predicate: &Predicate) -> Result<Vec<Record>> {
        Ok(self
            .bounded("find", self.store.find(session, predicate))
            .await?
            .to_list())
    }

    pub async fn find_one(&self, session: &StoreSession, predicate: &Predicate) -> Result<Option<Record>> {
        Ok(self.find(session, predicate).await?.into_iter().next())
    }

    async fn bounded<T>(&self, operation: &'static str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.query_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                error!(operation, collection = self.store.collection(), error = %err, "store call failed");
                Err(err)
            }
            Err(elapsed) => {
                error!(operation, collection = self.store.collection(), timeout_ms = self.config.query_timeout_ms, "store call timed out");
                Err(elapsed.into())
            }
        }
    }
}

fn unexpected_row(row: &Row) -> Error {
    Error::new(ErrorKind::Internal, format!("unexpected aggregation row: {row:?}"))
}

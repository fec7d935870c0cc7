use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::config::Config;
use crate::core::types::FieldValue;
use crate::core::utils::parse_leading_int;
use crate::query::ast::{Field, Predicate};
use crate::query::projection::Projection;
use crate::query::sort::SortSpec;

/// Requested page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLimit {
    Bounded(usize),
    Unbounded,            // "all": skip and limit are bypassed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: PageLimit,
    pub skip: usize,
}

impl Pagination {
    /// Parse raw `page` / `limit` request values with the default limits.
    pub fn from_request(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::from_request_with(&Config::default(), page, limit)
    }

    /// `limit` must be one of the configured sizes, `"all"` or `-1`;
    /// anything else falls back to the default. Page defaults to 1.
    pub fn from_request_with(config: &Config, page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(parse_leading_int)
            .filter(|page| *page > 0)
            .map(|page| page as usize)
            .unwrap_or(1);

        let limit = match limit {
            Some("all") => PageLimit::Unbounded,
            Some(raw) => match parse_leading_int(raw) {
                Some(-1) => PageLimit::Unbounded,
                Some(n) if n > 0 && config.page_limits.contains(&(n as usize)) => PageLimit::Bounded(n as usize),
                _ => PageLimit::Bounded(config.default_page_limit),
            },
            None => PageLimit::Bounded(config.default_page_limit),
        };

        Self::new(page, limit)
    }

    pub fn new(page: usize, limit: PageLimit) -> Self {
        let page = page.max(1);
        let skip = match limit {
            PageLimit::Bounded(size) => (page - 1).saturating_mul(size),
            PageLimit::Unbounded => 0,
        };
        Pagination { page, limit, skip }
    }

    pub fn unbounded() -> Self {
        Self::new(1, PageLimit::Unbounded)
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self.limit, PageLimit::Bounded(_))
    }

    pub fn limit_value(&self) -> Option<usize> {
        match self.limit {
            PageLimit::Bounded(size) => Some(size),
            PageLimit::Unbounded => None,
        }
    }

    /// `ceil(total / limit)`; `None` when unbounded.
    pub fn total_pages(&self, total: u64) -> Option<u64> {
        self.limit_value().map(|size| total.div_ceil(size.max(1) as u64))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, PageLimit::Bounded(100))
    }
}

/// One step of a store aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    AddDerivedFields { now: DateTime<Utc> },
    Match(Predicate),
    Sort(SortSpec),
    Skip(usize),
    Limit(usize),
    Project(Projection),
    /// Total of the incoming set plus `data` applied to that same set
    Facet { data: Vec<Stage> },
    Count,
    /// One row per distinct key, keys descending
    Group(GroupBy),
}

/// Grouping of a matched set by one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub key: Field,
    /// Key for records without the field; `None` keeps them as a keyless group
    pub missing: Option<String>,
    /// Keep the first member of each group under this order
    pub top: Option<SortSpec>,
}

impl GroupBy {
    pub fn count(key: Field) -> Self {
        GroupBy { key, missing: None, top: None }
    }

    pub fn with_missing(mut self, label: impl Into<String>) -> Self {
        self.missing = Some(label.into());
        self
    }

    pub fn with_top(mut self, order: SortSpec) -> Self {
        self.top = Some(order);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }

    /// Derived fields, a match, then a single count row.
    pub fn count(predicate: Predicate, now: DateTime<Utc>) -> Self {
        Pipeline::new(vec![
            Stage::AddDerivedFields { now },
            Stage::Match(predicate),
            Stage::Count,
        ])
    }
}

/// Everything needed to run one listing
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub clauses: Vec<Predicate>,
    pub sort: SortSpec,
    pub pagination: Pagination,
    pub projection: Projection,
    pub now: DateTime<Utc>,
}

impl QueryPlan {
    /// Published-only guard ANDed with the compiled clauses
    pub fn predicate(&self) -> Predicate {
        let mut all = Vec::with_capacity(self.clauses.len() + 1);
        all.push(published());
        all.extend(self.clauses.iter().cloned());
        Predicate::and(all)
    }

    /// Bounded plans count and slice in one facet over the same matched set.
    pub fn to_pipeline(&self) -> Pipeline {
        let mut stages = vec![
            Stage::AddDerivedFields { now: self.now },
            Stage::Match(self.predicate()),
        ];

        match self.pagination.limit {
            PageLimit::Bounded(size) => stages.push(Stage::Facet {
                data: vec![
                    Stage::Sort(self.sort.clone()),
                    Stage::Skip(self.pagination.skip),
                    Stage::Limit(size),
                    Stage::Project(self.projection),
                ],
            }),
            PageLimit::Unbounded => {
                stages.push(Stage::Sort(self.sort.clone()));
                stages.push(Stage::Project(self.projection));
            }
        }

        Pipeline::new(stages)
    }

    /// Matched set, projected, then folded into one row per group.
    /// Sort and pagination do not apply.
    pub fn to_group_pipeline(&self, group: GroupBy) -> Pipeline {
        Pipeline::new(vec![
            Stage::AddDerivedFields { now: self.now },
            Stage::Match(self.predicate()),
            Stage::Project(self.projection),
            Stage::Group(group),
        ])
    }
}

pub fn published() -> Predicate {
    Predicate::eq(Field::Status, FieldValue::text("publish"))
}

/// Assembles a `QueryPlan`; each `with_*` returns a new builder.
#[derive(Debug, Clone)]
pub struct QueryPlanBuilder {
    clauses: Vec<Predicate>,
    sort: SortSpec,
    pagination: Pagination,
    projection: Projection,
    now: DateTime<Utc>,
}

impl QueryPlanBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        QueryPlanBuilder {
            clauses: Vec::new(),
            sort: SortSpec::default(),
            pagination: Pagination::default(),
            projection: Projection::Listing,
            now,
        }
    }

    pub fn with_clauses(mut self, clauses: Vec<Predicate>) -> Self {
        self.clauses = clauses;
        self
    }

    pub fn with_clause(mut self, clause: Predicate) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn build(self) -> QueryPlan {
        QueryPlan {
            clauses: self.clauses,
            sort: self.sort,
            pagination: self.pagination,
            projection: self.projection,
            now: self.now,
        }
    }
}

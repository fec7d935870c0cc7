pub mod core;
pub mod age;
pub mod query;
pub mod store;
pub mod search;
pub mod ranking;
pub mod registry;
pub mod telemetry;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, ErrorKind, Result};

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                           LONGEVIX QUERY ARCHITECTURE                        │
└──────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────── REQUEST ────────────────────────────────────┐
│  Criteria (typed)   orderBy / sort   page / limit   slug                     │
└───────┬─────────────────────┬──────────────┬──────────┬──────────────────────┘
        ▼                     ▼              ▼          │
┌────────────────┐  ┌─────────────────┐ ┌─────────────┐ │
│ FilterCompiler │  │  SortResolver   │ │ Pagination  │ │
│ ClauseBuilder  │  │  -> SortSpec    │ │ from_request│ │
│ DateClause...  │  └────────┬────────┘ └──────┬──────┘ │
│ -> Vec<Pred.>  │           │                 │        │
└───────┬────────┘           │                 │        │
        ▼                    ▼                 ▼        │
┌─────────────────────────────────────────────────────┐ │
│ QueryPlanBuilder -> QueryPlan -> Pipeline           │ │
│   AddDerivedFields{now}  Match  Facet[Sort Skip     │ │
│   Limit Project]  |  Sort Project (unbounded)       │ │
└───────────────────────────┬─────────────────────────┘ │
                            ▼                           ▼
┌─────────────────────────────────────┐   ┌────────────────────────────────────┐
│ QueryExecutor                       │◄──┤ RankingEngine                      │
│  timeout per store round-trip       │   │  target age (stored or AgeObject)  │
│  execute / count / find             │   │  try_join! world gender country    │
└───────────────┬─────────────────────┘   │  (+ living) counts, rank = n + 1   │
                ▼                         └────────────────────────────────────┘
┌─────────────────────────────────────┐
│ trait RecordStore (async)           │
│  acquire -> StoreSession (RAII)     │
│  find / aggregate / count -> Cursor │
│  MemoryStore: RecordMatcher + rayon │
└─────────────────────────────────────┘

age::calculator   calendar years + days (zone shifted), 365-day rounded years
registry          living / gender / country / prefecture / emigration / recent
                  listings, top-N, birthday month, profile, id, name search
*/

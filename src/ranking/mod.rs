pub mod engine;
pub mod result;

pub use engine::{RankScope, RankingEngine};
pub use result::{RankOutcome, RankResult};

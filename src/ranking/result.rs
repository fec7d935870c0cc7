use serde::{Deserialize, Serialize};

/// Ranks of one record. A rank is 1 + the number of other published,
/// validated records at least as old, so equal ages share a rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResult {
    pub country_name: String,
    pub gender_name: String,
    pub country: u64,
    pub gender: u64,
    pub world: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_living: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_living: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_living: Option<u64>,
    pub age_in_years: i64,
    pub age_in_days: i64,
}

impl RankResult {
    pub fn is_living(&self) -> bool {
        self.world_living.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RankOutcome {
    Ranked(RankResult),
    /// Below the eligibility age, or no usable age. Not an error.
    Ineligible,
}

impl RankOutcome {
    pub fn ranked(self) -> Option<RankResult> {
        match self {
            RankOutcome::Ranked(result) => Some(result),
            RankOutcome::Ineligible => None,
        }
    }
}

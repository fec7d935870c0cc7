use serde::{Deserialize, Serialize};
use crate::core::types::DerivedRecord;
use crate::query::planner::Pagination;

/// One executed listing: the matched total and the requested slice
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub total: u64,
    pub data: Vec<DerivedRecord>,
    pub pagination: Pagination,
}

impl SearchPage {
    pub fn into_response(self) -> ListingResponse {
        ListingResponse {
            count: self.total,
            page: self.pagination.is_bounded().then_some(self.pagination.page),
            limit: self.pagination.limit_value(),
            total_pages: self.pagination.total_pages(self.total),
            content: self.data,
        }
    }
}

/// Listing surface. Page fields are only present for bounded pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub count: u64,
    pub content: Vec<DerivedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

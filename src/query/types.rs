use serde::{Deserialize, Serialize};

/// Sort order for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,   // Ascending: youngest / earliest first
    Desc,  // Descending: oldest / latest first
}

impl SortOrder {
    /// Request direction: only `"ascending"` sorts ascending.
    pub fn from_direction(direction: &str) -> Self {
        if direction == "ascending" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    /// Store sort sign: +1 ascending, -1 descending
    pub fn sign(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

use serde::{Deserialize, Serialize};
use crate::core::types::Record;

/// Field-exclusion set applied to returned records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// List views: drops page-rendering payload and long-form content
    Listing,
    /// Single profile: keeps content, biography, recognition and gallery
    Profile,
}

impl Projection {
    pub fn apply(&self, record: &mut Record) {
        record.yoast_head = None;
        record.yoast_head_json = None;
        record.links = None;
        record.template = None;
        record.attribution = None;

        if *self == Projection::Listing {
            record.content = None;
            record.biography = None;
            record.recognition = None;
            record.gallery = None;
        }
    }
}

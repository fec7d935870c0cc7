use std::fmt;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use crate::core::utils::parse_date_string;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// Scalar value a predicate compares against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Id(RecordId),
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(id) => write!(f, "{}", id.value()),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Date(date) => f.write_str(&date.to_rfc3339()),
            FieldValue::Boolean(flag) => write!(f, "{}", flag),
        }
    }
}

/// Publication state. Only `Published` records are ever queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublicationStatus {
    #[default]
    #[serde(rename = "publish")]
    Published,
    #[serde(rename = "draft")]
    Draft,
    #[serde(other)]
    Other,
}

/// Categorical value (sex, country) with display name and stable slug
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub slug: String,
}

impl Term {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Term { name: name.into(), slug: slug.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Place {
    pub country: Term,
    #[serde(default)]
    pub city: String,
}

impl Place {
    pub fn in_country(country: Term) -> Self {
        Place { country, city: String::new() }
    }
}

/// IANA timezone ids per place
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeZones {
    pub birth_place: Option<String>,
    pub residence: Option<String>,
    pub death_place: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub name: String,
    pub lastname: String,
    /// Raw birth value as stored: ISO-8601 or `dd/mm/yyyy`.
    pub birth: String,
    pub date_of_death: Option<DateTime<Utc>>,
    pub is_dead: bool,
    pub sex: Term,
    pub nationality: Term,
    pub birth_place: Place,
    pub residence: Place,
    pub death_place: Option<Place>,
    pub prefecture: Option<String>,
    pub state: Option<String>,
}

impl PersonalInformation {
    pub fn birth_instant(&self) -> Option<DateTime<Utc>> {
        parse_date_string(&self.birth)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationInformation {
    #[serde(default)]
    pub researchers: Vec<String>,
    pub validation_date: Option<DateTime<Utc>>,
}

/// Calendar age: whole years plus remaining days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeBreakdown {
    pub years: i64,
    pub days: i64,
}

/// One longevity entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub slug: String,
    pub status: PublicationStatus,
    pub personal: PersonalInformation,
    pub time_zones: Option<TimeZones>,
    pub validated: bool,
    pub validation: Option<ValidationInformation>,
    pub total_milliseconds: Option<i64>,
    pub time_components: Option<AgeBreakdown>,

    // Heavy fields dropped by projections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoast_head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoast_head_json: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<bool>,
}

impl Record {
    pub fn new(id: RecordId, slug: impl Into<String>, personal: PersonalInformation) -> Self {
        Record {
            id,
            slug: slug.into(),
            personal,
            ..Default::default()
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PublicationStatus::Published
    }

    /// Timezone used for age math: death place, then residence.
    pub fn age_time_zone(&self) -> Option<&str> {
        let zones = self.time_zones.as_ref()?;
        zones.death_place.as_deref().or(zones.residence.as_deref())
    }
}

/// A record plus the values computed against a request's captured "now"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub current_date: Option<DateTime<Utc>>,
    pub age_in_milliseconds: Option<i64>,
    pub age_in_years: Option<f64>,
    pub rounded_age_in_years: Option<f64>,
}

impl DerivedRecord {
    /// Record with no derived fields yet
    pub fn bare(record: Record) -> Self {
        DerivedRecord {
            record,
            current_date: None,
            age_in_milliseconds: None,
            age_in_years: None,
            rounded_age_in_years: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_store_spelling() {
        let json = serde_json::to_string(&PublicationStatus::Published).unwrap();
        assert_eq!(json, "\"publish\"");
        let other: PublicationStatus = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(other, PublicationStatus::Other);
    }

    #[test]
    fn age_time_zone_prefers_death_place() {
        let mut record = Record::default();
        assert_eq!(record.age_time_zone(), None);

        record.time_zones = Some(TimeZones {
            birth_place: Some("Europe/Rome".into()),
            residence: Some("Asia/Tokyo".into()),
            death_place: None,
        });
        assert_eq!(record.age_time_zone(), Some("Asia/Tokyo"));

        record.time_zones.as_mut().unwrap().death_place = Some("America/New_York".into());
        assert_eq!(record.age_time_zone(), Some("America/New_York"));
    }

    #[test]
    fn heavy_fields_are_omitted_when_empty() {
        let value = serde_json::to_value(Record::default()).unwrap();
        assert!(value.get("biography").is_none());
        assert!(value.get("yoast_head").is_none());
        assert!(value.get("slug").is_some());
    }
}

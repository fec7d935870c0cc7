use std::cmp::Ordering;
use chrono::Datelike;
use regex::{Regex, RegexBuilder};
use crate::core::error::Result;
use crate::core::types::{DerivedRecord, FieldValue, PublicationStatus};
use crate::query::ast::{Field, Predicate, RangePredicate};

/// Value of `field` on a record, `None` when absent or unparseable.
pub fn field_value(doc: &DerivedRecord, field: Field) -> Option<FieldValue> {
    let record = &doc.record;
    let personal = &record.personal;

    match field {
        Field::RecordId => Some(FieldValue::Id(record.id)),
        Field::Slug => Some(FieldValue::text(&record.slug)),
        Field::Status => Some(FieldValue::text(match record.status {
            PublicationStatus::Published => "publish",
            PublicationStatus::Draft => "draft",
            PublicationStatus::Other => "other",
        })),
        Field::GivenName => Some(FieldValue::text(&personal.name)),
        Field::Surname => Some(FieldValue::text(&personal.lastname)),
        Field::SexName => Some(FieldValue::text(&personal.sex.name)),
        Field::NationalityName => Some(FieldValue::text(&personal.nationality.name)),
        Field::NationalitySlug => Some(FieldValue::text(&personal.nationality.slug)),
        Field::BirthCountryName => Some(FieldValue::text(&personal.birth_place.country.name)),
        Field::ResidenceCountryName => Some(FieldValue::text(&personal.residence.country.name)),
        Field::DeathCountryName => personal
            .death_place
            .as_ref()
            .map(|place| FieldValue::text(&place.country.name)),
        Field::Prefecture => personal.prefecture.as_deref().map(FieldValue::text),
        Field::State => personal.state.as_deref().map(FieldValue::text),
        Field::Validated => Some(FieldValue::Boolean(record.validated)),
        Field::IsDead => Some(FieldValue::Boolean(personal.is_dead)),
        Field::Birth => personal.birth_instant().map(FieldValue::Date),
        Field::BirthMonth => personal
            .birth_instant()
            .map(|birth| FieldValue::Number(birth.month() as f64)),
        Field::DateOfDeath => personal.date_of_death.map(FieldValue::Date),
        // Presence only; see `Predicate::Exists`
        Field::ValidationInformation => None,
        Field::ValidationDate => record
            .validation
            .as_ref()
            .and_then(|validation| validation.validation_date)
            .map(FieldValue::Date),
        Field::TotalMilliseconds => record.total_milliseconds.map(|ms| FieldValue::Number(ms as f64)),
        Field::CurrentDate => doc.current_date.map(FieldValue::Date),
        Field::AgeInMilliseconds => doc.age_in_milliseconds.map(|ms| FieldValue::Number(ms as f64)),
        Field::AgeInYears => doc.age_in_years.map(FieldValue::Number),
        Field::RoundedAgeInYears => doc.rounded_age_in_years.map(FieldValue::Number),
    }
}

/// Ordering between values of the same kind; mixed kinds do not compare.
pub fn compare_values(left: &FieldValue, right: &FieldValue) -> Option<Ordering> {
    match (left, right) {
        (FieldValue::Id(a), FieldValue::Id(b)) => Some(a.cmp(b)),
        (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
        (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
        (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort ordering where a missing value sorts below any present one.
pub fn compare_optional(left: Option<&FieldValue>, right: Option<&FieldValue>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

enum Compiled {
    All,
    Eq(Field, FieldValue),
    Ne(Field, FieldValue),
    Regex(Field, Regex),
    Range(RangePredicate),
    Exists(Field),
    FieldsEqual(Field, Field),
    FieldsDiffer(Field, Field),
    And(Vec<Compiled>),
    Or(Vec<Compiled>),
}

/// Predicate evaluator with regexes compiled up front
pub struct RecordMatcher {
    root: Compiled,
}

impl RecordMatcher {
    pub fn new(predicate: &Predicate) -> Result<Self> {
        Ok(RecordMatcher { root: compile(predicate)? })
    }

    pub fn matches(&self, doc: &DerivedRecord) -> bool {
        evaluate(&self.root, doc)
    }
}

fn compile(predicate: &Predicate) -> Result<Compiled> {
    Ok(match predicate {
        Predicate::MatchAll => Compiled::All,
        Predicate::Eq(eq) => Compiled::Eq(eq.field, eq.value.clone()),
        Predicate::Ne(ne) => Compiled::Ne(ne.field, ne.value.clone()),
        Predicate::Regex(regex) => Compiled::Regex(
            regex.field,
            RegexBuilder::new(&regex.pattern)
                .case_insensitive(regex.case_insensitive)
                .build()?,
        ),
        Predicate::Range(range) => Compiled::Range(range.clone()),
        Predicate::Exists(field) => Compiled::Exists(*field),
        Predicate::FieldsEqual(a, b) => Compiled::FieldsEqual(*a, *b),
        Predicate::FieldsDiffer(a, b) => Compiled::FieldsDiffer(*a, *b),
        Predicate::And(clauses) => Compiled::And(clauses.iter().map(compile).collect::<Result<_>>()?),
        Predicate::Or(clauses) => Compiled::Or(clauses.iter().map(compile).collect::<Result<_>>()?),
    })
}

fn evaluate(node: &Compiled, doc: &DerivedRecord) -> bool {
    match node {
        Compiled::All => true,
        Compiled::Eq(field, expected) => field_value(doc, *field)
            .is_some_and(|actual| compare_values(&actual, expected) == Some(Ordering::Equal)),
        // Absent fields are "not equal"
        Compiled::Ne(field, expected) => field_value(doc, *field)
            .is_none_or(|actual| compare_values(&actual, expected) != Some(Ordering::Equal)),
        Compiled::Regex(field, regex) => match field_value(doc, *field) {
            Some(FieldValue::Text(text)) => regex.is_match(&text),
            _ => false,
        },
        Compiled::Range(range) => in_range(doc, range),
        Compiled::Exists(Field::ValidationInformation) => doc.record.validation.is_some(),
        Compiled::Exists(field) => field_value(doc, *field).is_some(),
        Compiled::FieldsEqual(a, b) => field_value(doc, *a) == field_value(doc, *b),
        Compiled::FieldsDiffer(a, b) => field_value(doc, *a) != field_value(doc, *b),
        Compiled::And(clauses) => clauses.iter().all(|clause| evaluate(clause, doc)),
        Compiled::Or(clauses) => clauses.iter().any(|clause| evaluate(clause, doc)),
    }
}

fn in_range(doc: &DerivedRecord, range: &RangePredicate) -> bool {
    let Some(actual) = field_value(doc, range.field) else {
        return false;
    };
    let holds = |bound: &Option<FieldValue>, accept: fn(Ordering) -> bool| match bound {
        Some(bound) => compare_values(&actual, bound).is_some_and(accept),
        None => true,
    };

    holds(&range.gt, Ordering::is_gt)
        && holds(&range.gte, Ordering::is_ge)
        && holds(&range.lt, Ordering::is_lt)
        && holds(&range.lte, Ordering::is_le)
}

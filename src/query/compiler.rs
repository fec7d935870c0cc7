use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use crate::core::types::FieldValue;
use crate::core::utils::{is_any_sentinel, parse_date_string};
use crate::query::ast::{Field, Predicate, RangePredicate};
use crate::query::criteria::{AgeRange, Criteria, DateFilter, DateMode, DateTarget, SimpleKind};

/// Builds clauses for one simple criterion
pub trait ClauseBuilder: Send + Sync {
    fn name(&self) -> &'static str;
    fn build(&self, value: &str) -> Vec<Predicate>;
}

/// Builds clauses for one date mode
pub trait DateClauseBuilder: Send + Sync {
    fn name(&self) -> &'static str;
    fn build(&self, filter: &DateFilter) -> Vec<Predicate>;
}

impl SimpleKind {
    pub fn builder(self) -> &'static dyn ClauseBuilder {
        match self {
            SimpleKind::Validation => &ValidationClause,
            SimpleKind::Living => &LivingClause,
            SimpleKind::CountryOfDeath => &CountryOfDeathClause,
            SimpleKind::CountryOfBirth => &CountryOfBirthClause,
            SimpleKind::Gender => &GenderClause,
            SimpleKind::Name => &NameClause,
            SimpleKind::Prefecture => &PrefectureClause,
            SimpleKind::State => &StateClause,
        }
    }
}

impl DateMode {
    pub fn builder(self) -> &'static dyn DateClauseBuilder {
        match self {
            DateMode::On => &OnDate,
            DateMode::After => &AfterDate,
            DateMode::Before => &BeforeDate,
            DateMode::Between => &BetweenDate,
            DateMode::BeforeOrEqual => &BeforeOrEqualDate,
        }
    }
}

pub struct ValidationClause;

impl ClauseBuilder for ValidationClause {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::eq(Field::Validated, FieldValue::Boolean(value == "validated"))]
    }
}

pub struct LivingClause;

impl ClauseBuilder for LivingClause {
    fn name(&self) -> &'static str {
        "living"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::eq(Field::IsDead, FieldValue::Boolean(value != "living"))]
    }
}

/// Death place, or residence for the living
pub struct CountryOfDeathClause;

impl ClauseBuilder for CountryOfDeathClause {
    fn name(&self) -> &'static str {
        "countryOfDeath"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::or(vec![
            Predicate::contains(Field::DeathCountryName, value),
            Predicate::contains(Field::ResidenceCountryName, value),
        ])]
    }
}

pub struct CountryOfBirthClause;

impl ClauseBuilder for CountryOfBirthClause {
    fn name(&self) -> &'static str {
        "countryOfBirth"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::contains(Field::BirthCountryName, value)]
    }
}

pub struct GenderClause;

impl ClauseBuilder for GenderClause {
    fn name(&self) -> &'static str {
        "gender"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::contains(Field::SexName, value)]
    }
}

/// One OR clause per token: each token may hit given name or surname
pub struct NameClause;

impl ClauseBuilder for NameClause {
    fn name(&self) -> &'static str {
        "name"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        value
            .split_whitespace()
            .map(|token| {
                Predicate::or(vec![
                    Predicate::contains_ignore_case(Field::GivenName, token),
                    Predicate::contains_ignore_case(Field::Surname, token),
                ])
            })
            .collect()
    }
}

pub struct PrefectureClause;

impl ClauseBuilder for PrefectureClause {
    fn name(&self) -> &'static str {
        "prefecture"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::contains_ignore_case(Field::Prefecture, value)]
    }
}

pub struct StateClause;

impl ClauseBuilder for StateClause {
    fn name(&self) -> &'static str {
        "state"
    }

    fn build(&self, value: &str) -> Vec<Predicate> {
        vec![Predicate::contains_ignore_case(Field::State, value)]
    }
}

fn date_field(target: DateTarget) -> Field {
    match target {
        DateTarget::Birth => Field::Birth,
        DateTarget::Death => Field::DateOfDeath,
        DateTarget::ValidationDate => Field::ValidationDate,
    }
}

/// Validation-date clauses also require the validation block to exist.
fn guarded(target: DateTarget, clause: Predicate) -> Vec<Predicate> {
    match target {
        DateTarget::ValidationDate => vec![Predicate::and(vec![
            Predicate::Exists(Field::ValidationInformation),
            clause,
        ])],
        _ => vec![clause],
    }
}

/// Missing bound: always-true. Malformed bound: always-true, logged.
fn bound(filter: &DateFilter, raw: Option<&String>) -> Result<DateTime<Utc>, Vec<Predicate>> {
    let Some(raw) = raw else {
        return Err(vec![Predicate::MatchAll]);
    };
    parse_date_string(raw).ok_or_else(|| {
        warn!(target_field = date_field(filter.target).path(), value = %raw, "unparseable date bound, clause dropped");
        vec![Predicate::MatchAll]
    })
}

pub struct OnDate;

impl DateClauseBuilder for OnDate {
    fn name(&self) -> &'static str {
        "on"
    }

    fn build(&self, filter: &DateFilter) -> Vec<Predicate> {
        match bound(filter, filter.initial.as_ref()) {
            Ok(date) => guarded(
                filter.target,
                Predicate::eq(date_field(filter.target), FieldValue::Date(date)),
            ),
            Err(pass) => pass,
        }
    }
}

pub struct AfterDate;

impl DateClauseBuilder for AfterDate {
    fn name(&self) -> &'static str {
        "after"
    }

    fn build(&self, filter: &DateFilter) -> Vec<Predicate> {
        match bound(filter, filter.initial.as_ref()) {
            Ok(date) => guarded(
                filter.target,
                Predicate::range(RangePredicate::new(date_field(filter.target)).with_gt(FieldValue::Date(date))),
            ),
            Err(pass) => pass,
        }
    }
}

pub struct BeforeDate;

impl DateClauseBuilder for BeforeDate {
    fn name(&self) -> &'static str {
        "before"
    }

    fn build(&self, filter: &DateFilter) -> Vec<Predicate> {
        match bound(filter, filter.initial.as_ref()) {
            Ok(date) => guarded(
                filter.target,
                Predicate::range(RangePredicate::new(date_field(filter.target)).with_lt(FieldValue::Date(date))),
            ),
            Err(pass) => pass,
        }
    }
}

/// Upper bound only; a supplied initial bound is ignored and the
/// validation-block guard is not applied.
pub struct BeforeOrEqualDate;

impl DateClauseBuilder for BeforeOrEqualDate {
    fn name(&self) -> &'static str {
        "beforeOrEqual"
    }

    fn build(&self, filter: &DateFilter) -> Vec<Predicate> {
        match bound(filter, filter.final_.as_ref()) {
            Ok(date) => vec![Predicate::range(
                RangePredicate::new(date_field(filter.target)).with_lte(FieldValue::Date(date)),
            )],
            Err(pass) => pass,
        }
    }
}

pub struct BetweenDate;

impl DateClauseBuilder for BetweenDate {
    fn name(&self) -> &'static str {
        "between"
    }

    fn build(&self, filter: &DateFilter) -> Vec<Predicate> {
        if filter.initial.is_none() || filter.final_.is_none() {
            return vec![Predicate::MatchAll];
        }
        let start = match bound(filter, filter.initial.as_ref()) {
            Ok(date) => date,
            Err(pass) => return pass,
        };
        let end = match bound(filter, filter.final_.as_ref()) {
            Ok(date) => date,
            Err(pass) => return pass,
        };
        guarded(
            filter.target,
            Predicate::range(
                RangePredicate::new(date_field(filter.target))
                    .with_gte(FieldValue::Date(start))
                    .with_lte(FieldValue::Date(end)),
            ),
        )
    }
}

/// Turns typed criteria into AND-combined predicate clauses
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler;

impl FilterCompiler {
    pub fn new() -> Self {
        FilterCompiler
    }

    /// Compile `criteria`. When no simple criterion produces a clause the
    /// caller's `default_clauses` stand in, so an empty request stays scoped.
    /// Clauses are neither reordered nor deduplicated.
    pub fn compile(&self, criteria: &Criteria, default_clauses: &[Predicate]) -> Vec<Predicate> {
        let mut clauses = self.simple_clauses(criteria);
        if clauses.is_empty() {
            clauses.extend_from_slice(default_clauses);
        }

        clauses.extend(self.compound_clauses(criteria));

        debug!(clauses = clauses.len(), "compiled criteria");
        clauses
    }

    pub fn simple_clauses(&self, criteria: &Criteria) -> Vec<Predicate> {
        let mut clauses = Vec::new();
        for kind in SimpleKind::ALL {
            let Some(value) = criteria.simple(kind) else {
                continue;
            };
            if is_any_sentinel(value) {
                continue;
            }
            clauses.extend(kind.builder().build(value));
        }
        clauses
    }

    pub fn compound_clauses(&self, criteria: &Criteria) -> Vec<Predicate> {
        let mut clauses = Vec::new();

        if let Some(threshold) = criteria.min_age {
            clauses.push(Predicate::range(
                RangePredicate::new(Field::RoundedAgeInYears).with_gt(FieldValue::Number(threshold)),
            ));
        }

        if let Some(clause) = self.age_ranges(&criteria.age_ranges) {
            clauses.push(clause);
        }

        if let Some(instant) = criteria.alive_at.as_deref() {
            if !is_any_sentinel(instant) {
                clauses.extend(self.alive_at(instant));
            }
        }

        for filter in criteria.date_filters() {
            if let Some(mode) = filter.mode {
                clauses.extend(mode.builder().build(filter));
            }
        }

        clauses
    }

    fn age_ranges(&self, ranges: &[AgeRange]) -> Option<Predicate> {
        if ranges.is_empty() {
            return None;
        }
        let options = ranges
            .iter()
            .map(|range| {
                Predicate::and(vec![
                    Predicate::range(
                        RangePredicate::new(Field::RoundedAgeInYears).with_gte(FieldValue::Number(range.start)),
                    ),
                    Predicate::range(
                        RangePredicate::new(Field::RoundedAgeInYears).with_lte(FieldValue::Number(range.end)),
                    ),
                ])
            })
            .collect();
        Some(Predicate::or(options))
    }

    /// Born on/before the instant, and either died on/after it or still
    /// living with "now" past it.
    fn alive_at(&self, instant: &str) -> Vec<Predicate> {
        let Some(date) = parse_date_string(instant) else {
            warn!(value = %instant, "unparseable aliveAt instant, clause dropped");
            return vec![Predicate::MatchAll];
        };
        let at = FieldValue::Date(date);

        vec![
            Predicate::range(RangePredicate::new(Field::Birth).with_lte(at.clone())),
            Predicate::or(vec![
                Predicate::range(RangePredicate::new(Field::DateOfDeath).with_gte(at.clone())),
                Predicate::and(vec![
                    Predicate::eq(Field::IsDead, FieldValue::Boolean(false)),
                    Predicate::range(RangePredicate::new(Field::CurrentDate).with_gte(at)),
                ]),
            ]),
        ]
    }
}

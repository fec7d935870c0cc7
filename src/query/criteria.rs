use serde::{Deserialize, Serialize};

/// Which event a date filter constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTarget {
    Birth,
    Death,
    ValidationDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateMode {
    On,
    Before,
    After,
    Between,
    BeforeOrEqual,
}

/// One compound date criterion. Bounds stay raw strings so a malformed
/// value degrades to "no constraint" for that clause only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    pub target: DateTarget,
    pub mode: Option<DateMode>,
    pub initial: Option<String>,
    #[serde(rename = "final")]
    pub final_: Option<String>,
}

impl DateFilter {
    pub fn unset(target: DateTarget) -> Self {
        DateFilter { target, mode: None, initial: None, final_: None }
    }

    pub fn new(target: DateTarget, mode: DateMode) -> Self {
        DateFilter { target, mode: Some(mode), initial: None, final_: None }
    }

    pub fn with_initial(mut self, value: impl Into<String>) -> Self {
        self.initial = Some(value.into());
        self
    }

    pub fn with_final(mut self, value: impl Into<String>) -> Self {
        self.final_ = Some(value.into());
        self
    }
}

/// Inclusive rounded-age range in years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeRange {
    pub start: f64,
    pub end: f64,
}

/// Simple criterion tags, each compiled by its own clause builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleKind {
    Validation,
    Living,
    CountryOfDeath,
    CountryOfBirth,
    Gender,
    Name,
    Prefecture,
    State,
}

impl SimpleKind {
    pub const ALL: [SimpleKind; 8] = [
        SimpleKind::Validation,
        SimpleKind::Living,
        SimpleKind::CountryOfDeath,
        SimpleKind::CountryOfBirth,
        SimpleKind::Gender,
        SimpleKind::Name,
        SimpleKind::Prefecture,
        SimpleKind::State,
    ];
}

/// Request-scoped, typed filter request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Criteria {
    // Simple criteria
    pub name: Option<String>,
    pub gender: Option<String>,
    pub validation: Option<String>,     // "validated" or anything else
    pub country_of_birth: Option<String>,
    pub country_of_death: Option<String>,
    pub prefecture: Option<String>,
    pub state: Option<String>,
    pub living: Option<String>,         // "living" or anything else

    // Compound criteria
    pub min_age: Option<f64>,
    pub age_ranges: Vec<AgeRange>,
    pub alive_at: Option<String>,
    pub date_of_birth: DateFilter,
    pub date_of_death: DateFilter,
    pub validation_date: DateFilter,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            name: None,
            gender: None,
            validation: None,
            country_of_birth: None,
            country_of_death: None,
            prefecture: None,
            state: None,
            living: None,
            min_age: None,
            age_ranges: Vec::new(),
            alive_at: None,
            date_of_birth: DateFilter::unset(DateTarget::Birth),
            date_of_death: DateFilter::unset(DateTarget::Death),
            validation_date: DateFilter::unset(DateTarget::ValidationDate),
        }
    }
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simple(&self, kind: SimpleKind) -> Option<&str> {
        let value = match kind {
            SimpleKind::Validation => &self.validation,
            SimpleKind::Living => &self.living,
            SimpleKind::CountryOfDeath => &self.country_of_death,
            SimpleKind::CountryOfBirth => &self.country_of_birth,
            SimpleKind::Gender => &self.gender,
            SimpleKind::Name => &self.name,
            SimpleKind::Prefecture => &self.prefecture,
            SimpleKind::State => &self.state,
        };
        value.as_deref()
    }

    pub fn date_filters(&self) -> [&DateFilter; 3] {
        [&self.date_of_birth, &self.date_of_death, &self.validation_date]
    }

    pub fn with_simple(mut self, kind: SimpleKind, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match kind {
            SimpleKind::Validation => self.validation = value,
            SimpleKind::Living => self.living = value,
            SimpleKind::CountryOfDeath => self.country_of_death = value,
            SimpleKind::CountryOfBirth => self.country_of_birth = value,
            SimpleKind::Gender => self.gender = value,
            SimpleKind::Name => self.name = value,
            SimpleKind::Prefecture => self.prefecture = value,
            SimpleKind::State => self.state = value,
        }
        self
    }

    pub fn with_age_range(mut self, start: f64, end: f64) -> Self {
        self.age_ranges.push(AgeRange { start, end });
        self
    }

    pub fn with_min_age(mut self, years: f64) -> Self {
        self.min_age = Some(years);
        self
    }

    pub fn with_alive_at(mut self, instant: impl Into<String>) -> Self {
        self.alive_at = Some(instant.into());
        self
    }

    /// Replaces the date filter for the filter's own target
    pub fn with_date_filter(mut self, filter: DateFilter) -> Self {
        match filter.target {
            DateTarget::Birth => self.date_of_birth = filter,
            DateTarget::Death => self.date_of_death = filter,
            DateTarget::ValidationDate => self.validation_date = filter,
        }
        self
    }
}

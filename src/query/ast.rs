use serde::{Serialize, Deserialize};
use crate::core::types::FieldValue;

/// Addressable record field, stored or derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    RecordId,
    Slug,
    Status,
    GivenName,
    Surname,
    SexName,
    NationalityName,
    NationalitySlug,
    BirthCountryName,
    ResidenceCountryName,
    DeathCountryName,
    Prefecture,
    State,
    Validated,
    IsDead,
    Birth,
    BirthMonth,
    DateOfDeath,
    ValidationInformation,
    ValidationDate,
    TotalMilliseconds,

    // Derived per request
    CurrentDate,
    AgeInMilliseconds,
    AgeInYears,
    RoundedAgeInYears,
}

impl Field {
    /// Document path, used in logs and plan dumps
    pub fn path(&self) -> &'static str {
        match self {
            Field::RecordId => "id",
            Field::Slug => "slug",
            Field::Status => "status",
            Field::GivenName => "acf.personal_information.name",
            Field::Surname => "acf.personal_information.lastname",
            Field::SexName => "acf.personal_information.sex.name",
            Field::NationalityName => "acf.personal_information.nationality.name",
            Field::NationalitySlug => "acf.personal_information.nationality.slug",
            Field::BirthCountryName => "acf.personal_information.birth_place.country.name",
            Field::ResidenceCountryName => "acf.personal_information.residence.country.name",
            Field::DeathCountryName => "acf.personal_information.death_place.country.name",
            Field::Prefecture => "acf.personal_information.prefecture",
            Field::State => "acf.personal_information.state",
            Field::Validated => "acf.sc_validated",
            Field::IsDead => "acf.personal_information.is_dead",
            Field::Birth => "acf.personal_information.birth",
            Field::BirthMonth => "birth_month",
            Field::DateOfDeath => "acf.personal_information.date_of_death",
            Field::ValidationInformation => "acf.validation_information",
            Field::ValidationDate => "acf.validation_information.validation_date",
            Field::TotalMilliseconds => "total_milliseconds",
            Field::CurrentDate => "currentDate",
            Field::AgeInMilliseconds => "ageInMilliseconds",
            Field::AgeInYears => "ageInYears",
            Field::RoundedAgeInYears => "roundedAgeInYears",
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Field::CurrentDate | Field::AgeInMilliseconds | Field::AgeInYears | Field::RoundedAgeInYears
        )
    }
}

/// One boolean condition over a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    MatchAll,                      // Always true (empty clause)
    Eq(EqPredicate),
    Ne(EqPredicate),
    Regex(RegexPredicate),
    Range(RangePredicate),
    Exists(Field),
    FieldsEqual(Field, Field),     // Compare two fields of the same record
    FieldsDiffer(Field, Field),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqPredicate {
    pub field: Field,
    pub value: FieldValue,
}

/// Unanchored pattern match on a text field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegexPredicate {
    pub field: Field,
    pub pattern: String,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredicate {
    pub field: Field,
    pub gt: Option<FieldValue>,   // Greater than
    pub gte: Option<FieldValue>,  // Greater than or equal
    pub lt: Option<FieldValue>,   // Less than
    pub lte: Option<FieldValue>,  // Less than or equal
}

impl RangePredicate {
    pub fn new(field: Field) -> Self {
        RangePredicate { field, gt: None, gte: None, lt: None, lte: None }
    }

    pub fn with_gt(mut self, value: FieldValue) -> Self {
        self.gt = Some(value);
        self
    }

    pub fn with_gte(mut self, value: FieldValue) -> Self {
        self.gte = Some(value);
        self
    }

    pub fn with_lt(mut self, value: FieldValue) -> Self {
        self.lt = Some(value);
        self
    }

    pub fn with_lte(mut self, value: FieldValue) -> Self {
        self.lte = Some(value);
        self
    }
}

impl Predicate {
    pub fn eq(field: Field, value: FieldValue) -> Self {
        Predicate::Eq(EqPredicate { field, value })
    }

    pub fn ne(field: Field, value: FieldValue) -> Self {
        Predicate::Ne(EqPredicate { field, value })
    }

    /// User text matched literally, case-sensitive
    pub fn contains(field: Field, text: &str) -> Self {
        Predicate::Regex(RegexPredicate {
            field,
            pattern: regex::escape(text),
            case_insensitive: false,
        })
    }

    /// User text matched literally, ignoring case
    pub fn contains_ignore_case(field: Field, text: &str) -> Self {
        Predicate::Regex(RegexPredicate {
            field,
            pattern: regex::escape(text),
            case_insensitive: true,
        })
    }

    pub fn range(range: RangePredicate) -> Self {
        Predicate::Range(range)
    }

    pub fn and(clauses: Vec<Predicate>) -> Self {
        Predicate::And(clauses)
    }

    pub fn or(clauses: Vec<Predicate>) -> Self {
        Predicate::Or(clauses)
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    /// Depth-first visit of this predicate and all nested ones
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Predicate)) {
        visit(self);
        if let Predicate::And(children) | Predicate::Or(children) = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_escapes_regex_syntax() {
        let Predicate::Regex(regex) = Predicate::contains(Field::GivenName, "a.b*") else {
            panic!("expected regex predicate");
        };
        assert_eq!(regex.pattern, r"a\.b\*");
        assert!(!regex.case_insensitive);
    }

    #[test]
    fn walk_reaches_nested_clauses() {
        let predicate = Predicate::and(vec![
            Predicate::eq(Field::Validated, FieldValue::Boolean(true)),
            Predicate::or(vec![Predicate::MatchAll, Predicate::Exists(Field::ValidationInformation)]),
        ]);
        let mut seen = 0;
        predicate.walk(&mut |_| seen += 1);
        assert_eq!(seen, 5);
    }

    #[test]
    fn derived_fields_are_flagged() {
        assert!(Field::AgeInMilliseconds.is_derived());
        assert!(!Field::Birth.is_derived());
        assert_eq!(Field::RoundedAgeInYears.path(), "roundedAgeInYears");
    }
}

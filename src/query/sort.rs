use serde::{Deserialize, Serialize};
use crate::query::ast::Field;
use crate::query::types::SortOrder;

/// Requested primary ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderBy {
    DateOfBirth,
    DateOfDeath,
    ValidationDate,
    Age,
}

impl OrderBy {
    /// Unknown selections order by age.
    pub fn parse(value: &str) -> Self {
        match value {
            "date-of-birth" => OrderBy::DateOfBirth,
            "date-of-death" => OrderBy::DateOfDeath,
            "validation-date" => OrderBy::ValidationDate,
            _ => OrderBy::Age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: Field,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(field: Field, order: SortOrder) -> Self {
        SortKey { field, order }
    }
}

/// Ordered sort keys; earlier keys dominate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortSpec { keys }
    }

    /// Oldest first
    pub fn by_age() -> Self {
        SortSpec::new(vec![SortKey::new(Field::AgeInMilliseconds, SortOrder::Desc)])
    }

    /// Most recent death first, longest stored lifetime on ties.
    pub fn died_recently() -> Self {
        SortSpec::new(vec![
            SortKey::new(Field::DateOfDeath, SortOrder::Desc),
            SortKey::new(Field::TotalMilliseconds, SortOrder::Desc),
        ])
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::by_age()
    }
}

pub struct SortResolver;

impl SortResolver {
    /// The request's order and direction win over the caller's defaults.
    pub fn resolve(
        request_order: Option<OrderBy>,
        request_direction: Option<SortOrder>,
        default_order: Option<OrderBy>,
        default_direction: Option<SortOrder>,
    ) -> SortSpec {
        let order_by = request_order.or(default_order).unwrap_or(OrderBy::Age);
        let direction = request_direction.or(default_direction).unwrap_or_default();

        match order_by {
            OrderBy::DateOfBirth => SortSpec::new(vec![
                SortKey::new(Field::Birth, direction),
                SortKey::new(Field::AgeInMilliseconds, direction),
            ]),
            OrderBy::DateOfDeath => SortSpec::new(vec![
                SortKey::new(Field::DateOfDeath, direction),
                SortKey::new(Field::AgeInMilliseconds, direction),
            ]),
            OrderBy::ValidationDate => SortSpec::new(vec![SortKey::new(Field::ValidationDate, direction)]),
            OrderBy::Age => SortSpec::new(vec![SortKey::new(Field::AgeInMilliseconds, direction)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_sort_has_age_tiebreaker() {
        let spec = SortResolver::resolve(Some(OrderBy::DateOfBirth), Some(SortOrder::Asc), None, None);
        assert_eq!(
            spec.keys,
            vec![
                SortKey::new(Field::Birth, SortOrder::Asc),
                SortKey::new(Field::AgeInMilliseconds, SortOrder::Asc),
            ]
        );
    }

    #[test]
    fn validation_sort_has_no_tiebreaker() {
        let spec = SortResolver::resolve(Some(OrderBy::ValidationDate), None, None, None);
        assert_eq!(spec.keys, vec![SortKey::new(Field::ValidationDate, SortOrder::Desc)]);
    }

    #[test]
    fn absent_or_unknown_order_sorts_by_age_descending() {
        assert_eq!(SortResolver::resolve(None, None, None, None), SortSpec::by_age());
        let unknown = OrderBy::parse("height");
        assert_eq!(SortResolver::resolve(Some(unknown), None, None, None), SortSpec::by_age());
    }

    #[test]
    fn request_overrides_caller_default() {
        let spec = SortResolver::resolve(
            Some(OrderBy::DateOfDeath),
            None,
            Some(OrderBy::ValidationDate),
            Some(SortOrder::Asc),
        );
        assert_eq!(spec.keys[0], SortKey::new(Field::DateOfDeath, SortOrder::Asc));

        let defaulted = SortResolver::resolve(None, None, Some(OrderBy::ValidationDate), None);
        assert_eq!(defaulted.keys, vec![SortKey::new(Field::ValidationDate, SortOrder::Desc)]);
    }

    #[test]
    fn order_by_parses_request_spelling() {
        assert_eq!(OrderBy::parse("date-of-death"), OrderBy::DateOfDeath);
        let parsed: OrderBy = serde_json::from_str("\"validation-date\"").unwrap();
        assert_eq!(parsed, OrderBy::ValidationDate);
    }
}

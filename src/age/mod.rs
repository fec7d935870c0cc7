pub mod calculator;

pub use calculator::{age_breakdown, age_duration, derive_fields, rounded_age_in_years, AgeObject};

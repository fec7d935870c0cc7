use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use crate::age::calculator::{rounded_age_in_years, AgeObject};
use crate::core::error::{Error, Result};
use crate::core::types::{FieldValue, Record};
use crate::query::ast::{Field, Predicate, RangePredicate};
use crate::query::planner::published;
use crate::ranking::result::{RankOutcome, RankResult};
use crate::search::executor::QueryExecutor;
use crate::store::StoreSession;

/// Population a rank is computed within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankScope {
    World,
    Gender,
    Country,
}

/// Everything the counts need, captured once per request
#[derive(Debug, Clone)]
struct RankTarget {
    slug: String,
    gender: String,
    nationality: String,
    age_ms: i64,
    now: DateTime<Utc>,
}

impl RankTarget {
    /// Records of the scope at least as old as the target, itself excluded.
    fn better_or_equal(&self, scope: RankScope, living_only: bool) -> Predicate {
        let mut clauses = vec![
            published(),
            Predicate::eq(Field::Validated, FieldValue::Boolean(true)),
            Predicate::range(
                RangePredicate::new(Field::AgeInMilliseconds).with_gte(FieldValue::Number(self.age_ms as f64)),
            ),
            Predicate::ne(Field::Slug, FieldValue::text(&self.slug)),
        ];

        match scope {
            RankScope::World => {}
            RankScope::Gender => clauses.push(Predicate::eq(Field::SexName, FieldValue::text(&self.gender))),
            RankScope::Country => {
                clauses.push(Predicate::eq(Field::NationalitySlug, FieldValue::text(&self.nationality)))
            }
        }

        if living_only {
            clauses.push(Predicate::eq(Field::IsDead, FieldValue::Boolean(false)));
        }

        Predicate::and(clauses)
    }
}

pub struct RankingEngine {
    executor: QueryExecutor,
}

impl RankingEngine {
    pub fn new(executor: QueryExecutor) -> Self {
        RankingEngine { executor }
    }

    pub async fn rank(&self, slug: &str) -> Result<RankOutcome> {
        self.rank_at(slug, Utc::now()).await
    }

    /// Rank against the population as of `now`. Any failed count fails the
    /// whole ranking.
    #[instrument(skip(self, now))]
    pub async fn rank_at(&self, slug: &str, now: DateTime<Utc>) -> Result<RankOutcome> {
        if slug.trim().is_empty() {
            return Err(Error::validation("slug is required"));
        }

        let session = self.executor.acquire().await?;
        let lookup = Predicate::and(vec![published(), Predicate::eq(Field::Slug, FieldValue::text(slug))]);
        let record = self
            .executor
            .find_one(&session, &lookup)
            .await?
            .ok_or_else(|| Error::not_found(format!("no record with slug {slug}")))?;

        // Only validated records hold a rank
        if !record.validated {
            debug!("not validated, not ranked");
            return Ok(RankOutcome::Ineligible);
        }

        let age = AgeObject::for_record(&record, now);
        let Some(age_ms) = record.total_milliseconds.or(age.map(|age| age.total_milliseconds)) else {
            debug!("no usable age, not ranked");
            return Ok(RankOutcome::Ineligible);
        };

        let rounded = rounded_age_in_years(age_ms);
        if rounded < self.executor.config().eligible_age_years {
            debug!(rounded_age = rounded, "below eligibility age");
            return Ok(RankOutcome::Ineligible);
        }

        let target = RankTarget {
            slug: record.slug.clone(),
            gender: record.personal.sex.name.clone(),
            nationality: record.personal.nationality.slug.clone(),
            age_ms,
            now,
        };
        let living = !record.personal.is_dead;

        let (world, gender, country, living_ranks) = tokio::try_join!(
            self.rank_in(&session, &target, RankScope::World, false),
            self.rank_in(&session, &target, RankScope::Gender, false),
            self.rank_in(&session, &target, RankScope::Country, false),
            async {
                if !living {
                    return Ok(None);
                }
                tokio::try_join!(
                    self.rank_in(&session, &target, RankScope::World, true),
                    self.rank_in(&session, &target, RankScope::Gender, true),
                    self.rank_in(&session, &target, RankScope::Country, true),
                )
                .map(Some)
            },
        )?;

        info!(world, gender, country, living, "ranked");
        Ok(RankOutcome::Ranked(build_result(&record, age, world, gender, country, living_ranks)))
    }

    async fn rank_in(
        &self,
        session: &StoreSession,
        target: &RankTarget,
        scope: RankScope,
        living_only: bool,
    ) -> Result<u64> {
        let ahead = self
            .executor
            .count(session, target.better_or_equal(scope, living_only), target.now)
            .await?;
        debug!(?scope, living_only, ahead, "scope counted");
        Ok(ahead + 1)
    }
}

fn build_result(
    record: &Record,
    age: Option<AgeObject>,
    world: u64,
    gender: u64,
    country: u64,
    living: Option<(u64, u64, u64)>,
) -> RankResult {
    let display = age
        .map(|age| age.time_components)
        .or(record.time_components)
        .unwrap_or_default();

    RankResult {
        country_name: record.personal.nationality.name.clone(),
        gender_name: record.personal.sex.name.clone(),
        country,
        gender,
        world,
        world_living: living.map(|(world, _, _)| world),
        gender_living: living.map(|(_, gender, _)| gender),
        country_living: living.map(|(_, _, country)| country),
        age_in_years: display.years,
        age_in_days: display.days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> RankTarget {
        RankTarget {
            slug: "kane-tanaka".into(),
            gender: "Female".into(),
            nationality: "japan".into(),
            age_ms: 1_000,
            now: Utc::now(),
        }
    }

    #[test]
    fn world_scope_has_no_population_filter() {
        let Predicate::And(clauses) = target().better_or_equal(RankScope::World, false) else {
            panic!("expected AND");
        };
        assert_eq!(clauses.len(), 4);
        assert!(clauses.contains(&Predicate::ne(Field::Slug, FieldValue::text("kane-tanaka"))));
    }

    #[test]
    fn living_country_scope_adds_both_filters() {
        let Predicate::And(clauses) = target().better_or_equal(RankScope::Country, true) else {
            panic!("expected AND");
        };
        assert!(clauses.contains(&Predicate::eq(Field::NationalitySlug, FieldValue::text("japan"))));
        assert!(clauses.contains(&Predicate::eq(Field::IsDead, FieldValue::Boolean(false))));
    }
}

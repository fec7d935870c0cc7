#![allow(dead_code)]

use std::sync::Arc;
use chrono::{DateTime, Duration, TimeZone, Utc};
use longevix::core::types::{
    PersonalInformation, Place, PublicationStatus, Record, RecordId, Term, ValidationInformation,
};
use longevix::ranking::RankingEngine;
use longevix::registry::RegistryQueries;
use longevix::search::executor::QueryExecutor;
use longevix::store::memory::MemoryStore;
use longevix::store::RecordStore;
use longevix::Config;

/// Fixed "now" for every integration test
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Birth instant that makes a living person `years` (365-day) old at `now()`,
/// minus `offset_days`.
pub fn born_years_ago(years: i64, offset_days: i64) -> String {
    (now() - Duration::days(years * 365 + offset_days)).to_rfc3339()
}

pub struct PersonBuilder {
    record: Record,
}

impl PersonBuilder {
    pub fn new(id: u64, slug: &str) -> Self {
        let japan = Term::new("Japan", "japan");
        let personal = PersonalInformation {
            name: slug.to_string(),
            lastname: "Fixture".to_string(),
            birth: born_years_ago(100, 0),
            sex: Term::new("Female", "female"),
            nationality: japan.clone(),
            birth_place: Place::in_country(japan.clone()),
            residence: Place::in_country(japan),
            ..Default::default()
        };
        let mut record = Record::new(RecordId(id), slug, personal);
        record.validated = true;
        PersonBuilder { record }
    }

    pub fn name(mut self, given: &str, surname: &str) -> Self {
        self.record.personal.name = given.to_string();
        self.record.personal.lastname = surname.to_string();
        self
    }

    pub fn living_aged(mut self, years: i64, offset_days: i64) -> Self {
        self.record.personal.birth = born_years_ago(years, offset_days);
        self
    }

    pub fn born(mut self, birth: &str) -> Self {
        self.record.personal.birth = birth.to_string();
        self
    }

    pub fn died(mut self, death: DateTime<Utc>) -> Self {
        let country = self.record.personal.residence.country.clone();
        self.record.personal.date_of_death = Some(death);
        self.record.personal.is_dead = true;
        self.record.personal.death_place = Some(Place::in_country(country));
        self
    }

    pub fn male(mut self) -> Self {
        self.record.personal.sex = Term::new("Male", "male");
        self
    }

    pub fn nationality(mut self, name: &str, slug: &str) -> Self {
        let term = Term::new(name, slug);
        self.record.personal.nationality = term.clone();
        self.record.personal.residence = Place::in_country(term);
        self
    }

    pub fn born_in(mut self, name: &str, slug: &str) -> Self {
        self.record.personal.birth_place = Place::in_country(Term::new(name, slug));
        self
    }

    pub fn prefecture(mut self, prefecture: &str) -> Self {
        self.record.personal.prefecture = Some(prefecture.to_string());
        self
    }

    pub fn unvalidated(mut self) -> Self {
        self.record.validated = false;
        self
    }

    pub fn validated_on(mut self, date: DateTime<Utc>) -> Self {
        self.record.validation = Some(ValidationInformation {
            researchers: vec!["GRG".to_string()],
            validation_date: Some(date),
        });
        self
    }

    pub fn draft(mut self) -> Self {
        self.record.status = PublicationStatus::Draft;
        self
    }

    pub fn total_milliseconds(mut self, ms: i64) -> Self {
        self.record.total_milliseconds = Some(ms);
        self
    }

    pub fn biography(mut self, text: &str) -> Self {
        self.record.biography = Some(vec![text.to_string()]);
        self.record.yoast_head = Some("<meta>".to_string());
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub config: Arc<Config>,
    pub executor: QueryExecutor,
}

impl Harness {
    pub async fn new(records: Vec<Record>) -> Self {
        Self::with_config(records, Config::default()).await
    }

    pub async fn with_config(records: Vec<Record>, config: Config) -> Self {
        longevix::telemetry::init_test_tracing();
        let store = Arc::new(MemoryStore::with_records(config.collection.clone(), records));
        store.connect().await.unwrap();
        let config = Arc::new(config);
        let executor = QueryExecutor::new(store.clone(), config.clone());
        Harness { store, config, executor }
    }

    pub fn registry(&self) -> RegistryQueries {
        RegistryQueries::new(self.executor.clone()).with_fixed_now(now())
    }

    pub fn ranking(&self) -> RankingEngine {
        RankingEngine::new(self.executor.clone())
    }
}

/// `count` living validated Japanese women aged 110 + i years
pub fn population(count: u64) -> Vec<Record> {
    (0..count)
        .map(|i| {
            PersonBuilder::new(i + 1, &format!("person-{}", i + 1))
                .living_aged(110 + (i as i64 % 7), i as i64)
                .build()
        })
        .collect()
}

mod common;

use chrono::Duration;
use common::{born_years_ago, now, Harness, PersonBuilder};
use longevix::core::types::DerivedRecord;
use longevix::registry::GroupCount;

fn slugs(records: &[DerivedRecord]) -> Vec<String> {
    records.iter().map(|doc| doc.record.slug.clone()).collect()
}

fn counts(groups: &[GroupCount]) -> Vec<(&str, u64)> {
    groups.iter().map(|group| (group.name.as_str(), group.count)).collect()
}

#[tokio::test]
async fn counts_validated_records_per_nationality() {
    let harness = Harness::new(vec![
        PersonBuilder::new(1, "jp-1").build(),
        PersonBuilder::new(2, "jp-2").build(),
        PersonBuilder::new(3, "fr-1").nationality("France", "france").build(),
        PersonBuilder::new(4, "jp-pending").unvalidated().build(),
        PersonBuilder::new(5, "jp-draft").draft().build(),
    ])
    .await;

    let groups = harness.registry().count_by_country().await.unwrap();
    assert_eq!(counts(&groups), vec![("Japan", 2), ("France", 1)]);
    assert_eq!(harness.store.open_session_count(), 0);
}

#[tokio::test]
async fn prefecture_counts_put_missing_under_unknown() {
    let harness = Harness::new(vec![
        PersonBuilder::new(1, "tokyo-1").prefecture("Tokyo").build(),
        PersonBuilder::new(2, "tokyo-2").prefecture("Tokyo").build(),
        PersonBuilder::new(3, "osaka").prefecture("Osaka").build(),
        PersonBuilder::new(4, "nowhere").build(),
        PersonBuilder::new(5, "french-tokyo").nationality("France", "france").prefecture("Tokyo").build(),
    ])
    .await;

    let groups = harness.registry().count_by_prefecture("Japan").await.unwrap();
    assert_eq!(counts(&groups), vec![("Unknown", 1), ("Tokyo", 2), ("Osaka", 1)]);
}

#[tokio::test]
async fn title_holder_is_oldest_validated_per_residence_country() {
    let harness = Harness::new(vec![
        PersonBuilder::new(1, "jp-115").living_aged(115, 0).biography("long text").build(),
        PersonBuilder::new(2, "jp-112").living_aged(112, 0).build(),
        PersonBuilder::new(3, "fr-113").living_aged(113, 0).nationality("France", "france").build(),
        PersonBuilder::new(4, "us-120")
            .living_aged(120, 0)
            .nationality("United States", "usa")
            .unvalidated()
            .build(),
    ])
    .await;

    let holders = harness.registry().title_holders_by_country().await.unwrap();
    let summary: Vec<(&str, &str)> = holders
        .iter()
        .map(|holder| (holder.country.as_str(), holder.holder.record.slug.as_str()))
        .collect();
    assert_eq!(summary, vec![("Japan", "jp-115"), ("France", "fr-113")]);
    assert!(holders[0].holder.record.biography.is_none());
    assert_eq!(holders[0].holder.rounded_age_in_years, Some(115.0));
}

#[tokio::test]
async fn top_by_nationality_accepts_path_style_names() {
    let usa = |id, slug: &str| PersonBuilder::new(id, slug).nationality("United States", "usa");
    let harness = Harness::new(vec![
        usa(1, "us-111").living_aged(111, 0).build(),
        usa(2, "us-118").living_aged(118, 0).unvalidated().build(),
        usa(3, "us-dead-116")
            .born(&born_years_ago(126, 0))
            .died(now() - Duration::days(10 * 365))
            .build(),
        PersonBuilder::new(4, "jp-119").living_aged(119, 0).build(),
    ])
    .await;
    let registry = harness.registry();

    let top = registry.top_by_nationality("United States").await.unwrap();
    assert_eq!(slugs(&top), vec!["us-118", "us-dead-116", "us-111"]);

    let living = registry.top_living_by_nationality("united states").await.unwrap();
    assert_eq!(slugs(&living), vec!["us-118", "us-111"]);
}

#[tokio::test]
async fn validation_date_matches_exact_day() {
    let day = now() - Duration::days(3);
    let harness = Harness::new(vec![
        PersonBuilder::new(1, "same-day-110").living_aged(110, 0).validated_on(day).build(),
        PersonBuilder::new(2, "same-day-113").living_aged(113, 0).validated_on(day).build(),
        PersonBuilder::new(3, "other-day").validated_on(day - Duration::days(1)).build(),
        PersonBuilder::new(4, "pending").validated_on(day).unvalidated().build(),
    ])
    .await;

    let found = harness.registry().by_validation_date(day).await.unwrap();
    assert_eq!(slugs(&found), vec!["same-day-113", "same-day-110"]);
}

#[tokio::test]
async fn recent_centenarian_validations_stop_at_109() {
    let recent = now() - Duration::days(5);
    let harness = Harness::new(vec![
        PersonBuilder::new(1, "centenarian").living_aged(105, 0).validated_on(recent).build(),
        PersonBuilder::new(2, "exactly-109").living_aged(109, 0).validated_on(recent).build(),
        PersonBuilder::new(3, "supercentenarian").living_aged(112, 0).validated_on(recent).build(),
        PersonBuilder::new(4, "stale").living_aged(104, 0).validated_on(now() - Duration::days(40)).build(),
        PersonBuilder::new(5, "pending").living_aged(104, 0).validated_on(recent).unvalidated().build(),
    ])
    .await;

    let found = harness.registry().recent_centenarian_validations().await.unwrap();
    assert_eq!(slugs(&found), vec!["exactly-109", "centenarian"]);
}

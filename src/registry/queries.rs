use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use crate::age::calculator::AgeObject;
use crate::core::error::{Error, Result};
use crate::core::types::{DerivedRecord, FieldValue, Record, RecordId};
use crate::core::utils::is_any_sentinel;
use crate::query::ast::{Field, Predicate, RangePredicate};
use crate::query::compiler::{ClauseBuilder, FilterCompiler, NameClause};
use crate::query::criteria::Criteria;
use crate::query::planner::{published, GroupBy, PageLimit, Pagination, QueryPlanBuilder};
use crate::query::projection::Projection;
use crate::query::sort::{OrderBy, SortResolver, SortSpec};
use crate::query::types::SortOrder;
use crate::search::executor::QueryExecutor;
use crate::search::results::ListingResponse;
use crate::store::GroupRow;

/// One listing request: criteria, ordering and paging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRequest {
    pub criteria: Criteria,
    pub order_by: Option<OrderBy>,
    pub direction: Option<SortOrder>,
    pub pagination: Pagination,
}

impl ListingRequest {
    pub fn new(criteria: Criteria) -> Self {
        ListingRequest { criteria, ..Default::default() }
    }

    /// Raw `orderBy`, `sort`, `page` and `limit` request values
    pub fn from_params(
        criteria: Criteria,
        order_by: Option<&str>,
        direction: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Self {
        ListingRequest {
            criteria,
            order_by: order_by.map(OrderBy::parse),
            direction: direction.map(SortOrder::from_direction),
            pagination: Pagination::from_request(page, limit),
        }
    }

    pub fn with_order(mut self, order_by: OrderBy, direction: SortOrder) -> Self {
        self.order_by = Some(order_by);
        self.direction = Some(direction);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

/// Which population a listing defaults to when no simple criterion is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Population {
    #[default]
    All,
    Validated,
    Living,
}

impl Population {
    pub fn clauses(self) -> Vec<Predicate> {
        match self {
            Population::All => vec![Predicate::MatchAll],
            Population::Validated => vec![validated()],
            Population::Living => vec![validated(), alive()],
        }
    }

    fn validated_or_living(living: bool) -> Self {
        if living { Population::Living } else { Population::Validated }
    }
}

/// A profile: the record with long-form content plus its computed age
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub record: DerivedRecord,
    pub age: Option<AgeObject>,
}

/// Records sharing one group key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: u64,
}

/// Oldest validated record of one residence country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleHolder {
    pub country: String,
    pub holder: DerivedRecord,
}

/// Nationality as typed in a path to its stored slug: lower case,
/// whitespace runs become `-`, "united-states" is stored as "usa".
pub fn nationality_slug(raw: &str) -> String {
    let slug = raw.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    if slug == "united-states" { "usa".to_string() } else { slug }
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

/// Shape of one listing beyond the request itself
#[derive(Debug, Default)]
struct Listing {
    defaults: Vec<Predicate>,
    /// Always appended, whatever the criteria
    scope: Vec<Predicate>,
    default_order: Option<OrderBy>,
    fixed_sort: Option<SortSpec>,
}

/// Registry listings and lookups on top of the query core
pub struct RegistryQueries {
    executor: QueryExecutor,
    compiler: FilterCompiler,
    clock: Clock,
}

impl RegistryQueries {
    pub fn new(executor: QueryExecutor) -> Self {
        RegistryQueries { executor, compiler: FilterCompiler::new(), clock: Clock::System }
    }

    /// Pin "now" for every request, for reproducible windows and ages.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Clock::Fixed(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        match self.clock {
            Clock::System => Utc::now(),
            Clock::Fixed(now) => now,
        }
    }

    pub async fn list_living(&self, request: &ListingRequest) -> Result<ListingResponse> {
        self.run_listing(request, Listing { defaults: vec![alive()], ..Default::default() }).await
    }

    pub async fn list_supercentenarians(
        &self,
        request: &ListingRequest,
        population: Population,
    ) -> Result<ListingResponse> {
        self.run_listing(request, Listing { defaults: population.clauses(), ..Default::default() }).await
    }

    pub async fn list_by_gender(
        &self,
        gender: &str,
        request: &ListingRequest,
        population: Population,
    ) -> Result<ListingResponse> {
        let listing = Listing {
            defaults: population.clauses(),
            scope: vec![Predicate::eq(Field::SexName, FieldValue::text(gender))],
            ..Default::default()
        };
        self.run_listing(request, listing).await
    }

    pub async fn list_by_country(
        &self,
        nationality_slug: &str,
        request: &ListingRequest,
        living: bool,
    ) -> Result<ListingResponse> {
        let mut clauses = Population::validated_or_living(living).clauses();
        clauses.push(Predicate::eq(Field::NationalitySlug, FieldValue::text(nationality_slug)));
        self.run_listing(request, Listing { defaults: clauses.clone(), scope: clauses, ..Default::default() })
            .await
    }

    pub async fn list_by_prefecture(
        &self,
        nationality_slug: &str,
        prefecture: &str,
        request: &ListingRequest,
        living: bool,
    ) -> Result<ListingResponse> {
        let mut clauses = Population::validated_or_living(living).clauses();
        clauses.push(Predicate::eq(Field::NationalitySlug, FieldValue::text(nationality_slug)));
        clauses.push(Predicate::eq(Field::Prefecture, FieldValue::text(prefecture)));
        self.run_listing(request, Listing { defaults: clauses.clone(), scope: clauses, ..Default::default() })
            .await
    }

    /// Emigrants hold a nationality other than their birth country.
    pub async fn list_by_emigration(&self, is_emigrant: bool, request: &ListingRequest) -> Result<ListingResponse> {
        let comparison = if is_emigrant {
            Predicate::FieldsDiffer(Field::NationalityName, Field::BirthCountryName)
        } else {
            Predicate::FieldsEqual(Field::NationalityName, Field::BirthCountryName)
        };
        let listing = Listing {
            defaults: vec![comparison.clone()],
            scope: vec![comparison],
            ..Default::default()
        };
        self.run_listing(request, listing).await
    }

    /// Validated records that died inside the configured window, most
    /// recent first.
    pub async fn list_died_recently(&self, request: &ListingRequest) -> Result<ListingResponse> {
        let now = self.now();
        let days = self.executor.config().recent_death_days;
        let clauses = vec![validated(), within_days(Field::DateOfDeath, now, days)];
        let listing = Listing {
            defaults: clauses.clone(),
            scope: clauses,
            fixed_sort: Some(SortSpec::died_recently()),
            ..Default::default()
        };
        self.run_listing_at(request, listing, now).await
    }

    /// Supercentenarians validated inside the configured window
    pub async fn list_recent_validations(&self, request: &ListingRequest) -> Result<ListingResponse> {
        let now = self.now();
        let config = self.executor.config();
        let listing = Listing {
            defaults: vec![validated()],
            scope: vec![
                Predicate::range(
                    RangePredicate::new(Field::RoundedAgeInYears)
                        .with_gte(FieldValue::Number(config.eligible_age_years)),
                ),
                within_days(Field::ValidationDate, now, config.recent_validation_days),
            ],
            default_order: Some(OrderBy::ValidationDate),
            ..Default::default()
        };
        self.run_listing_at(request, listing, now).await
    }

    /// Oldest living records. `None` uses the configured size.
    pub async fn top_living(&self, limit: Option<usize>) -> Result<Vec<DerivedRecord>> {
        let limit = limit.unwrap_or(self.executor.config().top_overall);
        self.top(vec![alive()], limit).await
    }

    pub async fn top_living_by_gender(&self, gender: &str) -> Result<Vec<DerivedRecord>> {
        let limit = self.executor.config().top_by_gender;
        self.top(vec![alive(), Predicate::eq(Field::SexName, FieldValue::text(gender))], limit)
            .await
    }

    /// Oldest published records of a nationality, living or not
    pub async fn top_by_nationality(&self, nationality: &str) -> Result<Vec<DerivedRecord>> {
        let limit = self.executor.config().top_by_nationality;
        self.top(vec![nationality_is(nationality)], limit).await
    }

    pub async fn top_living_by_nationality(&self, nationality: &str) -> Result<Vec<DerivedRecord>> {
        let limit = self.executor.config().top_by_nationality;
        self.top(vec![alive(), nationality_is(nationality)], limit).await
    }

    /// Validated records whose validation date is exactly `date`, oldest first
    pub async fn by_validation_date(&self, date: DateTime<Utc>) -> Result<Vec<DerivedRecord>> {
        let limit = self.executor.config().top_by_validation_date;
        let clauses = vec![validated(), Predicate::eq(Field::ValidationDate, FieldValue::Date(date))];
        self.top(clauses, limit).await
    }

    /// Validated records still under supercentenarian age whose validation
    /// falls inside the configured window, oldest first
    pub async fn recent_centenarian_validations(&self) -> Result<Vec<DerivedRecord>> {
        let now = self.now();
        let config = self.executor.config();
        let clauses = vec![
            validated(),
            Predicate::range(
                RangePredicate::new(Field::AgeInYears).with_lte(FieldValue::Number(config.centenarian_max_age_years)),
            ),
            within_days(Field::ValidationDate, now, config.recent_validation_days),
        ];
        self.fetch_all(clauses, Projection::Listing).await
    }

    /// Validated records per nationality name, names descending
    pub async fn count_by_country(&self) -> Result<Vec<GroupCount>> {
        let rows = self.group(vec![validated()], GroupBy::count(Field::NationalityName)).await?;
        Ok(rows.into_iter().map(group_count).collect())
    }

    /// Validated records of a nationality per prefecture; records without
    /// one are counted under "Unknown"
    pub async fn count_by_prefecture(&self, nationality: &str) -> Result<Vec<GroupCount>> {
        let clauses = vec![validated(), nationality_is(nationality)];
        let rows = self
            .group(clauses, GroupBy::count(Field::Prefecture).with_missing("Unknown"))
            .await?;
        Ok(rows.into_iter().map(group_count).collect())
    }

    /// Oldest validated record per residence country, countries descending
    pub async fn title_holders_by_country(&self) -> Result<Vec<TitleHolder>> {
        let group = GroupBy::count(Field::ResidenceCountryName).with_top(SortSpec::by_age());
        let rows = self.group(vec![validated()], group).await?;
        Ok(rows
            .into_iter()
            .filter_map(|GroupRow { key, top, .. }| {
                top.map(|holder| TitleHolder { country: key.unwrap_or_default(), holder })
            })
            .collect())
    }

    /// Living validated records born in `month` (1-12), oldest first
    pub async fn by_birthday_month(&self, month: u32) -> Result<Vec<DerivedRecord>> {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!("month must be between 1 and 12, got {month}")));
        }
        let clauses = vec![
            Predicate::eq(Field::BirthMonth, FieldValue::Number(month as f64)),
            validated(),
            alive(),
        ];
        self.fetch_all(clauses, Projection::Listing).await
    }

    pub async fn profile_by_slug(&self, slug: &str) -> Result<Profile> {
        if slug.trim().is_empty() {
            return Err(Error::validation("slug is required"));
        }
        let clauses = vec![Predicate::eq(Field::Slug, FieldValue::text(slug))];
        let record = self
            .fetch_all(clauses, Projection::Profile)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("no record with slug {slug}")))?;

        let age = record
            .current_date
            .and_then(|now| AgeObject::for_record(&record.record, now));
        Ok(Profile { record, age })
    }

    pub async fn by_record_id(&self, id: RecordId) -> Result<DerivedRecord> {
        let clauses = vec![Predicate::eq(Field::RecordId, FieldValue::Id(id))];
        self.fetch_all(clauses, Projection::Listing)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("no record with id {}", id.value())))
    }

    pub async fn count_published_validated(&self) -> Result<u64> {
        let session = self.executor.acquire().await?;
        let predicate = Predicate::and(vec![published(), validated()]);
        self.executor.count_stored(&session, &predicate).await
    }

    /// Published records whose given name or surname contains every word
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Record>> {
        if is_any_sentinel(name.trim()) {
            return Err(Error::validation("name is required"));
        }
        let mut clauses = vec![published()];
        clauses.extend(NameClause.build(name));

        let session = self.executor.acquire().await?;
        let mut records = self.executor.find(&session, &Predicate::and(clauses)).await?;
        for record in &mut records {
            Projection::Listing.apply(record);
        }
        Ok(records)
    }

    async fn run_listing(&self, request: &ListingRequest, listing: Listing) -> Result<ListingResponse> {
        self.run_listing_at(request, listing, self.now()).await
    }

    #[instrument(skip_all, fields(page = request.pagination.page))]
    async fn run_listing_at(
        &self,
        request: &ListingRequest,
        listing: Listing,
        now: DateTime<Utc>,
    ) -> Result<ListingResponse> {
        let mut clauses = self.compiler.compile(&request.criteria, &listing.defaults);
        clauses.extend(listing.scope);

        let sort = listing.fixed_sort.unwrap_or_else(|| {
            SortResolver::resolve(request.order_by, request.direction, listing.default_order, None)
        });

        let plan = QueryPlanBuilder::new(now)
            .with_clauses(clauses)
            .with_sort(sort)
            .with_pagination(request.pagination)
            .build();

        let session = self.executor.acquire().await?;
        let page = self.executor.execute(&session, &plan).await?;
        Ok(page.into_response())
    }

    async fn top(&self, clauses: Vec<Predicate>, limit: usize) -> Result<Vec<DerivedRecord>> {
        let plan = QueryPlanBuilder::new(self.now())
            .with_clauses(clauses)
            .with_pagination(Pagination::new(1, PageLimit::Bounded(limit)))
            .build();
        let session = self.executor.acquire().await?;
        Ok(self.executor.execute(&session, &plan).await?.data)
    }

    async fn group(&self, clauses: Vec<Predicate>, group: GroupBy) -> Result<Vec<GroupRow>> {
        let plan = QueryPlanBuilder::new(self.now()).with_clauses(clauses).build();
        let session = self.executor.acquire().await?;
        self.executor.group(&session, &plan, group).await
    }

    async fn fetch_all(&self, clauses: Vec<Predicate>, projection: Projection) -> Result<Vec<DerivedRecord>> {
        let plan = QueryPlanBuilder::new(self.now())
            .with_clauses(clauses)
            .with_pagination(Pagination::unbounded())
            .with_projection(projection)
            .build();
        let session = self.executor.acquire().await?;
        let page = self.executor.execute(&session, &plan).await?;
        debug!(found = page.total, "fetched");
        Ok(page.data)
    }
}

fn validated() -> Predicate {
    Predicate::eq(Field::Validated, FieldValue::Boolean(true))
}

fn alive() -> Predicate {
    Predicate::eq(Field::IsDead, FieldValue::Boolean(false))
}

fn nationality_is(nationality: &str) -> Predicate {
    Predicate::eq(Field::NationalitySlug, FieldValue::text(nationality_slug(nationality)))
}

fn group_count(row: GroupRow) -> GroupCount {
    GroupCount { name: row.key.unwrap_or_default(), count: row.count }
}

/// `[now - days, now)`
fn within_days(field: Field, now: DateTime<Utc>, days: i64) -> Predicate {
    Predicate::range(
        RangePredicate::new(field)
            .with_gte(FieldValue::Date(now - Duration::days(days)))
            .with_lt(FieldValue::Date(now)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn population_defaults() {
        assert_eq!(Population::All.clauses(), vec![Predicate::MatchAll]);
        assert_eq!(Population::Living.clauses(), vec![validated(), alive()]);
    }

    #[test]
    fn window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let Predicate::Range(range) = within_days(Field::DateOfDeath, now, 60) else {
            panic!("expected range");
        };
        assert_eq!(range.gte, Some(FieldValue::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())));
        assert_eq!(range.lt, Some(FieldValue::Date(now)));
        assert!(range.lte.is_none());
    }

    #[test]
    fn nationality_input_becomes_slug() {
        assert_eq!(nationality_slug("United  States"), "usa");
        assert_eq!(nationality_slug("Costa Rica"), "costa-rica");
        assert_eq!(nationality_slug("japan"), "japan");
    }

    #[test]
    fn request_params_are_parsed() {
        let request = ListingRequest::from_params(
            Criteria::new(),
            Some("date-of-birth"),
            Some("ascending"),
            Some("2"),
            Some("all"),
        );
        assert_eq!(request.order_by, Some(OrderBy::DateOfBirth));
        assert_eq!(request.direction, Some(SortOrder::Asc));
        assert_eq!(request.pagination.limit, PageLimit::Unbounded);
    }
}

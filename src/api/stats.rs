use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Query;
use axum::Json;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::models::{self, grand_totals, BoxCounts, StatsFilter, StatsGrouping};
use crate::request_state::RequestState;

use super::entries::EntryDto;
use super::parse_flag;

const RECENT_ENTRIES: i64 = 5;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .route("/stats/company", axum::routing::get(stats_by_company))
        .route("/stats/month", axum::routing::get(stats_by_month))
        .route("/stats/quarter", axum::routing::get(stats_by_quarter))
        .api_route("/dashboard", get_with(get_dashboard, get_dashboard_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct TotalsDto {
    pub total_e2_in: i64,
    pub total_e1_in: i64,
    pub total_e2_out: i64,
    pub total_e1_out: i64,
    pub balance_e2: i64,
    pub balance_e1: i64,
    pub balance_total: i64,
}

impl From<&BoxCounts> for TotalsDto {
    fn from(value: &BoxCounts) -> Self {
        Self {
            total_e2_in: value.e2_in,
            total_e1_in: value.e1_in,
            total_e2_out: value.e2_out,
            total_e1_out: value.e1_out,
            balance_e2: value.balance_e2(),
            balance_e1: value.balance_e1(),
            balance_total: value.balance_total(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct GroupStatsDto {
    pub label: String,
    #[serde(flatten)]
    pub totals: TotalsDto,
    pub entry_count: i64,
}

impl From<&models::GroupStats> for GroupStatsDto {
    fn from(value: &models::GroupStats) -> Self {
        Self {
            label: value.label.to_owned(),
            totals: TotalsDto::from(&value.counts),
            entry_count: value.entry_count,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct StatsDto {
    pub groups: Vec<GroupStatsDto>,
    pub totals: TotalsDto,
    pub entry_count: i64,
    pub include_starting_balances: bool,
}

impl StatsDto {
    fn new(groups: &[models::GroupStats], include_starting_balances: bool) -> Self {
        let (totals, entry_count) = grand_totals(groups);
        Self {
            groups: groups.iter().map(GroupStatsDto::from).collect(),
            totals: TotalsDto::from(&totals),
            entry_count,
            include_starting_balances,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub include_starting_balances: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Build the filter, the stored setting decides when the query does not.
async fn stats_filter(state: &mut RequestState, query: &StatsQuery) -> ServiceResult<StatsFilter> {
    let include_starting_balances = match query.include_starting_balances.as_deref() {
        Some(value) => parse_flag(Some(value)),
        None => state.db.get_include_starting_balances().await?,
    };

    Ok(StatsFilter {
        include_starting_balances,
        start_date: query.start_date,
        end_date: query.end_date,
    })
}

async fn stats(
    mut state: RequestState,
    query: StatsQuery,
    grouping: StatsGrouping,
) -> ServiceResult<Json<StatsDto>> {
    state.session_require()?;

    let filter = stats_filter(&mut state, &query).await?;
    let groups = state.db.get_stats(grouping, filter).await?;

    Ok(Json(StatsDto::new(&groups, filter.include_starting_balances)))
}

async fn stats_by_company(
    state: RequestState,
    Query(query): Query<StatsQuery>,
) -> ServiceResult<Json<StatsDto>> {
    stats(state, query, StatsGrouping::Company).await
}

async fn stats_by_month(
    state: RequestState,
    Query(query): Query<StatsQuery>,
) -> ServiceResult<Json<StatsDto>> {
    stats(state, query, StatsGrouping::Month).await
}

async fn stats_by_quarter(
    state: RequestState,
    Query(query): Query<StatsQuery>,
) -> ServiceResult<Json<StatsDto>> {
    stats(state, query, StatsGrouping::Quarter).await
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct DashboardDto {
    pub totals: TotalsDto,
    pub entry_count: i64,
    pub companies: Vec<GroupStatsDto>,
    pub months: Vec<GroupStatsDto>,
    pub recent_entries: Vec<EntryDto>,
    pub include_starting_balances: bool,
}

async fn get_dashboard(mut state: RequestState) -> ServiceResult<Json<DashboardDto>> {
    state.session_require()?;

    let include_starting_balances = state.db.get_include_starting_balances().await?;
    let filter = StatsFilter::new(include_starting_balances);

    let companies = state.db.get_stats(StatsGrouping::Company, filter).await?;
    let months = state.db.get_stats(StatsGrouping::Month, filter).await?;
    let recent_entries = state.db.get_entries(RECENT_ENTRIES, 0).await?;

    let (totals, entry_count) = grand_totals(&companies);

    Ok(Json(DashboardDto {
        totals: TotalsDto::from(&totals),
        entry_count,
        companies: companies.iter().map(GroupStatsDto::from).collect(),
        months: months.iter().map(GroupStatsDto::from).collect(),
        recent_entries: recent_entries.iter().map(EntryDto::from).collect(),
        include_starting_balances,
    }))
}

fn get_dashboard_docs(op: TransformOperation) -> TransformOperation {
    op.description("Grand totals, balances, per company and per month statistics and the most recent entries.")
        .tag("stats")
        .response::<200, Json<DashboardDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

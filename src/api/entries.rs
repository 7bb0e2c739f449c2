use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Form, Json};
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{self, BoxCounts};
use crate::request_state::RequestState;

use super::{count_of, flag_of, LenientValue};

const DEFAULT_LIMIT: i64 = 100;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/entry/:id",
            get_with(get_entry, get_entry_docs)
                .put_with(update_entry, update_entry_docs)
                .delete_with(delete_entry, delete_entry_docs),
        )
        .api_route("/entries", post_with(create_entry, create_entry_docs))
        .route("/entries", axum::routing::get(list_entries))
        .route("/entries/form", axum::routing::post(create_entry_form))
        .api_route(
            "/entries/delete",
            post_with(delete_entries, delete_entries_docs),
        )
        .api_route(
            "/entries/starting-balances",
            get_with(list_starting_balances, list_starting_balances_docs),
        )
        .api_route(
            "/entries/date-range",
            get_with(get_entry_date_range, get_entry_date_range_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct EntryDto {
    pub id: i32,
    pub entry_date: NaiveDate,
    pub company_id: i32,
    pub company: String,
    pub e2_in: i64,
    pub e1_in: i64,
    pub e2_out: i64,
    pub e1_out: i64,
    pub balance_e2: i64,
    pub balance_e1: i64,
    pub photo_url: Option<String>,
    pub is_starting_balance: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&models::Entry> for EntryDto {
    fn from(value: &models::Entry) -> Self {
        Self {
            id: value.id,
            entry_date: value.entry_date,
            company_id: value.company_id,
            company: value.company.to_owned(),
            e2_in: value.counts.e2_in,
            e1_in: value.counts.e1_in,
            e2_out: value.counts.e2_out,
            e1_out: value.counts.e1_out,
            balance_e2: value.counts.balance_e2(),
            balance_e1: value.counts.balance_e1(),
            photo_url: value.photo_url.to_owned(),
            is_starting_balance: value.is_starting_balance,
            created_at: value.created_at,
        }
    }
}

/// Counts and flags are read leniently, unparsable counts become 0.
#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveEntryDto {
    #[serde(default)]
    pub entry_date: String,
    pub company_id: Option<LenientValue>,
    #[serde(alias = "e2in", alias = "value1")]
    pub e2_in: Option<LenientValue>,
    #[serde(alias = "e1in", alias = "value2")]
    pub e1_in: Option<LenientValue>,
    #[serde(alias = "e2out", alias = "value3")]
    pub e2_out: Option<LenientValue>,
    #[serde(alias = "e1out", alias = "value4")]
    pub e1_out: Option<LenientValue>,
    pub photo_url: Option<String>,
    pub is_starting_balance: Option<LenientValue>,
}

impl SaveEntryDto {
    fn into_new_entry(self) -> ServiceResult<models::NewEntry> {
        let entry_date = NaiveDate::parse_from_str(self.entry_date.trim(), "%Y-%m-%d")
            .map_err(|_| ServiceError::BadRequest("A valid entry date is required".to_owned()))?;

        let company_id = self
            .company_id
            .as_ref()
            .and_then(LenientValue::as_id)
            .ok_or_else(|| ServiceError::BadRequest("Company is required".to_owned()))?;

        Ok(models::NewEntry {
            entry_date,
            company_id,
            counts: BoxCounts {
                e2_in: count_of(&self.e2_in),
                e1_in: count_of(&self.e1_in),
                e2_out: count_of(&self.e2_out),
                e1_out: count_of(&self.e1_out),
            },
            photo_url: self
                .photo_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
            is_starting_balance: flag_of(&self.is_starting_balance),
        })
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct ListEntriesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn list_entries(
    mut state: RequestState,
    Query(query): Query<ListEntriesQuery>,
) -> ServiceResult<Json<Vec<EntryDto>>> {
    state.session_require()?;

    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.filter(|o| *o >= 0).unwrap_or(0);

    let entries = state.db.get_entries(limit, offset).await?;
    Ok(Json(entries.iter().map(|e| e.into()).collect()))
}

async fn get_entry(mut state: RequestState, Path(id): Path<i32>) -> ServiceResult<Json<EntryDto>> {
    state.session_require()?;

    let entry = state.db.get_entry_by_id(id).await?;

    if let Some(entry) = entry {
        return Ok(Json(EntryDto::from(&entry)));
    }

    Err(ServiceError::NotFound)
}

fn get_entry_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get an entry by id.")
        .tag("entries")
        .response::<200, Json<EntryDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested entry does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

async fn store_new_entry(state: &mut RequestState, form: SaveEntryDto) -> ServiceResult<EntryDto> {
    state.session_require_admin()?;

    let entry = form.into_new_entry()?;
    let entry = state.db.create_entry(entry).await?;
    Ok(EntryDto::from(&entry))
}

async fn create_entry(
    mut state: RequestState,
    form: Json<SaveEntryDto>,
) -> ServiceResult<Json<EntryDto>> {
    Ok(Json(store_new_entry(&mut state, form.0).await?))
}

fn create_entry_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a new entry.")
        .tag("entries")
        .response::<200, Json<EntryDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing date or company!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

async fn create_entry_form(
    mut state: RequestState,
    Form(form): Form<SaveEntryDto>,
) -> ServiceResult<Json<EntryDto>> {
    Ok(Json(store_new_entry(&mut state, form).await?))
}

async fn update_entry(
    mut state: RequestState,
    Path(id): Path<i32>,
    form: Json<SaveEntryDto>,
) -> ServiceResult<Json<EntryDto>> {
    state.session_require_admin()?;

    let entry = form.0.into_new_entry()?;
    let entry = state.db.update_entry(id, entry).await?;

    if let Some(entry) = entry {
        return Ok(Json(EntryDto::from(&entry)));
    }

    Err(ServiceError::NotFound)
}

fn update_entry_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update an existing entry.")
        .tag("entries")
        .response::<200, Json<EntryDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested entry does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

async fn delete_entry(mut state: RequestState, Path(id): Path<i32>) -> ServiceResult<StatusCode> {
    state.session_require_admin()?;

    state.db.delete_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn delete_entry_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete an entry. Deleting a missing entry succeeds.")
        .tag("entries")
        .response_with::<204, (), _>(|res| res.description("The entry was deleted!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct DeleteEntriesDto {
    pub ids: Vec<i32>,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct DeleteEntriesResultDto {
    pub success: bool,
    pub deleted: u64,
}

async fn delete_entries(
    mut state: RequestState,
    form: Json<DeleteEntriesDto>,
) -> ServiceResult<Json<DeleteEntriesResultDto>> {
    state.session_require_admin()?;

    let deleted = state.db.delete_entries(&form.ids).await?;
    log::info!("Deleted {} of {} selected entries", deleted, form.ids.len());

    Ok(Json(DeleteEntriesResultDto {
        success: true,
        deleted,
    }))
}

fn delete_entries_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete multiple entries by id. Missing ids are ignored.")
        .tag("entries")
        .response::<200, Json<DeleteEntriesResultDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct StartingBalancesDto {
    pub entries: Vec<EntryDto>,
    pub total_e2_in: i64,
    pub total_e1_in: i64,
    pub total_e2_out: i64,
    pub total_e1_out: i64,
    pub balance_e2: i64,
    pub balance_e1: i64,
    pub balance_total: i64,
}

impl From<&[models::Entry]> for StartingBalancesDto {
    fn from(entries: &[models::Entry]) -> Self {
        let totals: BoxCounts = entries.iter().map(|e| &e.counts).sum();
        Self {
            entries: entries.iter().map(EntryDto::from).collect(),
            total_e2_in: totals.e2_in,
            total_e1_in: totals.e1_in,
            total_e2_out: totals.e2_out,
            total_e1_out: totals.e1_out,
            balance_e2: totals.balance_e2(),
            balance_e1: totals.balance_e1(),
            balance_total: totals.balance_total(),
        }
    }
}

async fn list_starting_balances(
    mut state: RequestState,
) -> ServiceResult<Json<StartingBalancesDto>> {
    state.session_require()?;

    let entries = state.db.get_starting_balances().await?;
    Ok(Json(StartingBalancesDto::from(entries.as_slice())))
}

fn list_starting_balances_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all starting balance entries with column totals.")
        .tag("entries")
        .response::<200, Json<StartingBalancesDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct DateRangeDto {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

async fn get_entry_date_range(mut state: RequestState) -> ServiceResult<Json<DateRangeDto>> {
    state.session_require()?;

    let (min_date, max_date) = state.db.get_entry_date_range().await?;
    Ok(Json(DateRangeDto { min_date, max_date }))
}

fn get_entry_date_range_docs(op: TransformOperation) -> TransformOperation {
    op.description("Earliest and latest entry date.")
        .tag("entries")
        .response::<200, Json<DateRangeDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_entry_is_parsed_leniently() {
        let form: SaveEntryDto = serde_json::from_str(
            r#"{
                "entryDate": "2024-03-01",
                "companyId": "2",
                "e2In": 5,
                "e1In": "abc",
                "e2Out": "7",
                "photoUrl": "",
                "isStartingBalance": "on"
            }"#,
        )
        .unwrap();

        let entry = form.into_new_entry().unwrap();
        assert_eq!(entry.entry_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(entry.company_id, 2);
        assert_eq!(
            entry.counts,
            BoxCounts {
                e2_in: 5,
                e1_in: 0,
                e2_out: 7,
                e1_out: 0,
            }
        );
        assert_eq!(entry.photo_url, None);
        assert!(entry.is_starting_balance);
    }

    #[test]
    fn test_original_form_field_names_are_accepted() {
        let form: SaveEntryDto = serde_json::from_str(
            r#"{"entryDate": "2024-01-02", "companyId": 1, "value1": "3", "value4": "9", "isStartingBalance": "false"}"#,
        )
        .unwrap();

        let entry = form.into_new_entry().unwrap();
        assert_eq!(entry.counts.e2_in, 3);
        assert_eq!(entry.counts.e1_out, 9);
        assert!(!entry.is_starting_balance);
    }

    #[tokio::test]
    async fn test_form_counts_keep_leading_number() {
        use axum::body::Body;
        use axum::extract::{FromRequest, Request};

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(
                "entryDate=2024-01-02&companyId=1&value1=114.00&value2=7%20szt&value3=12.5&value4=x",
            ))
            .unwrap();
        let Form(form) = Form::<SaveEntryDto>::from_request(request, &()).await.unwrap();

        let entry = form.into_new_entry().unwrap();
        assert_eq!(
            entry.counts,
            BoxCounts {
                e2_in: 114,
                e1_in: 7,
                e2_out: 12,
                e1_out: 0,
            }
        );
    }

    #[test]
    fn test_missing_date_or_company_is_rejected() {
        let form: SaveEntryDto = serde_json::from_str(r#"{"companyId": 1}"#).unwrap();
        assert!(matches!(
            form.into_new_entry(),
            Err(ServiceError::BadRequest(_))
        ));

        let form: SaveEntryDto = serde_json::from_str(r#"{"entryDate": "2024-01-02"}"#).unwrap();
        assert_eq!(
            form.into_new_entry(),
            Err(ServiceError::BadRequest("Company is required".to_owned()))
        );
    }

    #[test]
    fn test_starting_balance_totals() {
        let entry = |e1_in, e1_out| models::Entry {
            id: 1,
            entry_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            company_id: 1,
            company: "duda".to_owned(),
            counts: BoxCounts {
                e2_in: 0,
                e1_in,
                e2_out: 0,
                e1_out,
            },
            photo_url: None,
            is_starting_balance: true,
            created_at: None,
        };

        let dto = StartingBalancesDto::from(vec![entry(114, 160), entry(119, 120)].as_slice());
        assert_eq!(dto.entries.len(), 2);
        assert_eq!(dto.total_e1_in, 233);
        assert_eq!(dto.total_e1_out, 280);
        assert_eq!(dto.balance_e1, 47);
        assert_eq!(dto.balance_total, 47);
    }
}

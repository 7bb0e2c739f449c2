use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::import::{self, ImportResult, PreviewRow};
use crate::models::BoxCounts;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .route("/import/preview", axum::routing::post(preview_csv))
        .route("/import/csv", axum::routing::post(import_csv))
        .api_route("/import", post_with(import_rows, import_rows_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PreviewRowDto {
    #[serde(default)]
    pub index: usize,
    pub date: String,
    #[serde(default)]
    pub date_valid: bool,
    pub company_id: Option<i32>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub e2_in: i64,
    #[serde(default)]
    pub e1_in: i64,
    #[serde(default)]
    pub e2_out: i64,
    #[serde(default)]
    pub e1_out: i64,
    #[serde(default)]
    pub is_starting_balance: bool,
    #[serde(default)]
    pub include: bool,
}

impl From<&PreviewRow> for PreviewRowDto {
    fn from(value: &PreviewRow) -> Self {
        Self {
            index: value.index,
            date: value.date.to_owned(),
            date_valid: value.entry_date.is_some(),
            company_id: value.company_id,
            company_name: value.company_name.to_owned(),
            e2_in: value.counts.e2_in,
            e1_in: value.counts.e1_in,
            e2_out: value.counts.e2_out,
            e1_out: value.counts.e1_out,
            is_starting_balance: value.is_starting_balance,
            include: value.include,
        }
    }
}

impl From<PreviewRowDto> for PreviewRow {
    fn from(value: PreviewRowDto) -> Self {
        Self {
            index: value.index,
            // Dates may have been edited in the preview, they are parsed again on import.
            entry_date: NaiveDate::parse_from_str(value.date.trim(), "%Y-%m-%d").ok(),
            date: value.date,
            company_id: value.company_id,
            company_name: value.company_name,
            counts: BoxCounts {
                e2_in: value.e2_in,
                e1_in: value.e1_in,
                e2_out: value.e2_out,
                e1_out: value.e1_out,
            },
            is_starting_balance: value.is_starting_balance,
            include: value.include,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ImportResultDto {
    pub success: bool,
    pub count: u64,
    pub error: Option<String>,
}

impl From<ImportResult> for ImportResultDto {
    fn from(value: ImportResult) -> Self {
        Self {
            success: value.error.is_none(),
            count: value.count,
            error: value.error,
        }
    }
}

async fn preview_csv(
    mut state: RequestState,
    body: String,
) -> ServiceResult<Json<Vec<PreviewRowDto>>> {
    state.session_require_admin()?;

    let companies = state.db.get_all_companies().await?;
    let rows = import::preview(&body, &companies)?;

    Ok(Json(rows.iter().map(PreviewRowDto::from).collect()))
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct ImportRowsDto {
    pub rows: Vec<PreviewRowDto>,
}

async fn import_rows(
    mut state: RequestState,
    form: Json<ImportRowsDto>,
) -> ServiceResult<Json<ImportResultDto>> {
    state.session_require_admin()?;

    let rows: Vec<PreviewRow> = form.0.rows.into_iter().map(PreviewRow::from).collect();
    let result = import::import_rows(&mut state.db, &rows).await;
    log::info!("Imported {} of {} csv rows", result.count, rows.len());

    Ok(Json(result.into()))
}

fn import_rows_docs(op: TransformOperation) -> TransformOperation {
    op.description("Import previewed rows. Rows without a company or not included are skipped.")
        .tag("import")
        .response::<200, Json<ImportResultDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

async fn import_csv(mut state: RequestState, body: String) -> ServiceResult<Json<ImportResultDto>> {
    state.session_require_admin()?;

    let companies = state.db.get_all_companies().await?;
    let result = import::import_csv(&mut state.db, &body, &companies).await?;
    log::info!("Imported {} csv rows", result.count);

    Ok(Json(result.into()))
}

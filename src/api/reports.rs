use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::Query;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::models::{DisplayMode, Language};
use crate::report::{Report, ReportRequest, ReportSummary};
use crate::request_state::RequestState;

use super::entries::EntryDto;
use super::stats::TotalsDto;
use super::{flag_of, parse_flag, LenientValue};

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/reports", post_with(post_report, post_report_docs))
        .route("/reports", axum::routing::get(get_report))
        .route(
            "/reports/print",
            axum::routing::get(get_report_print).post(post_report_print),
        )
        .with_state(app_state)
}

/// Query form of the report parameters, lists arrive as repeated keys.
#[derive(Debug, Default, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub box_types: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub include_summary: Option<String>,
    pub include_parameters: Option<String>,
    pub include_entries: Option<String>,
    pub display_mode: Option<String>,
    pub entries_order: Option<String>,
    pub language: Option<String>,
}

/// Box types may also be given as one comma separated value. Company names are taken as they
/// are since they may contain commas.
fn box_type_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_owned())
        .collect()
}

fn is_ascending(order: Option<&str>) -> bool {
    order.map(|o| o.trim().eq_ignore_ascii_case("asc")) == Some(true)
}

impl From<&ReportQuery> for ReportRequest {
    fn from(value: &ReportQuery) -> Self {
        Self {
            start_date: value.start_date.to_owned(),
            end_date: value.end_date.to_owned(),
            box_types: box_type_list(&value.box_types),
            companies: value.companies.clone(),
            include_summary: parse_flag(value.include_summary.as_deref()),
            include_parameters: parse_flag(value.include_parameters.as_deref()),
            include_entries: value
                .include_entries
                .as_deref()
                .map(|v| parse_flag(Some(v)))
                .unwrap_or(true),
            display_mode: value.display_mode.to_owned(),
            entries_ascending: is_ascending(value.entries_order.as_deref()),
        }
    }
}

#[derive(Debug, Default, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportBodyDto {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub box_types: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub include_summary: Option<LenientValue>,
    pub include_parameters: Option<LenientValue>,
    pub include_entries: Option<LenientValue>,
    pub display_mode: Option<String>,
    pub entries_order: Option<String>,
    pub language: Option<String>,
}

impl From<&ReportBodyDto> for ReportRequest {
    fn from(value: &ReportBodyDto) -> Self {
        Self {
            start_date: value.start_date.to_owned(),
            end_date: value.end_date.to_owned(),
            box_types: value.box_types.clone(),
            companies: value.companies.clone(),
            include_summary: flag_of(&value.include_summary),
            include_parameters: flag_of(&value.include_parameters),
            include_entries: value
                .include_entries
                .as_ref()
                .map(LenientValue::as_flag)
                .unwrap_or(true),
            display_mode: value.display_mode.to_owned(),
            entries_ascending: is_ascending(value.entries_order.as_deref()),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ReportParametersDto {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub box_types: Vec<String>,
    pub companies: Vec<String>,
    pub include_summary: bool,
    pub include_parameters: bool,
    pub include_entries: bool,
    pub display_mode: String,
    pub entries_order: String,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CompanyTotalsDto {
    pub company: String,
    #[serde(flatten)]
    pub totals: TotalsDto,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ReportSummaryDto {
    pub totals: TotalsDto,
    pub by_company: Vec<CompanyTotalsDto>,
}

impl From<&ReportSummary> for ReportSummaryDto {
    fn from(value: &ReportSummary) -> Self {
        Self {
            totals: TotalsDto::from(&value.totals),
            by_company: value
                .by_company
                .iter()
                .map(|c| CompanyTotalsDto {
                    company: c.company.to_owned(),
                    totals: TotalsDto::from(&c.counts),
                })
                .collect(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ReportDto {
    pub parameters: ReportParametersDto,
    pub entries: Vec<EntryDto>,
    pub summary: Option<ReportSummaryDto>,
    pub filename: String,
}

impl From<&Report> for ReportDto {
    fn from(value: &Report) -> Self {
        let params = &value.params;
        Self {
            parameters: ReportParametersDto {
                start_date: params.start_date,
                end_date: params.end_date,
                box_types: params
                    .box_types
                    .iter()
                    .map(|b| b.as_str().to_owned())
                    .collect(),
                companies: value.companies.clone(),
                include_summary: params.include_summary,
                include_parameters: params.include_parameters,
                include_entries: params.include_entries,
                display_mode: match params.display_mode {
                    DisplayMode::Raw => "raw".to_owned(),
                    DisplayMode::Balance => "balance".to_owned(),
                },
                entries_order: if params.entries_ascending {
                    "asc".to_owned()
                } else {
                    "desc".to_owned()
                },
            },
            entries: if params.include_entries {
                value.entries.iter().map(EntryDto::from).collect()
            } else {
                Vec::new()
            },
            summary: value.summary.as_ref().map(ReportSummaryDto::from),
            filename: value.filename(),
        }
    }
}

async fn build_report(state: &mut RequestState, request: ReportRequest) -> ServiceResult<Report> {
    state.session_require()?;

    let params = request.validate()?;
    let entries = state
        .db
        .get_entries_in_range(params.start_date, params.end_date, &params.companies)
        .await?;
    let all_companies = if params.companies.is_empty() {
        state
            .db
            .get_all_companies()
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect()
    } else {
        Vec::new()
    };

    Ok(Report::new(params, entries, all_companies))
}

async fn get_report(
    mut state: RequestState,
    Query(query): Query<ReportQuery>,
) -> ServiceResult<Json<ReportDto>> {
    let report = build_report(&mut state, ReportRequest::from(&query)).await?;
    Ok(Json(ReportDto::from(&report)))
}

async fn post_report(
    mut state: RequestState,
    form: Json<ReportBodyDto>,
) -> ServiceResult<Json<ReportDto>> {
    let report = build_report(&mut state, ReportRequest::from(&form.0)).await?;
    Ok(Json(ReportDto::from(&report)))
}

fn post_report_docs(op: TransformOperation) -> TransformOperation {
    op.description("Generate a report over a date range, optionally with a summary.")
        .tag("reports")
        .response::<200, Json<ReportDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing dates or box types!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

pub struct HtmlReport {
    filename: String,
    html: String,
}

impl OperationOutput for HtmlReport {
    type Inner = String;
}
impl IntoResponse for HtmlReport {
    fn into_response(self) -> axum::response::Response {
        let mut header = HeaderMap::new();
        header.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        let disposition = format!("inline; filename=\"{}.html\"", self.filename);
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            header.insert(header::CONTENT_DISPOSITION, value);
        }
        (StatusCode::OK, header, self.html).into_response()
    }
}

async fn print_report(
    mut state: RequestState,
    request: ReportRequest,
    language: Option<&str>,
) -> ServiceResult<HtmlReport> {
    let report = build_report(&mut state, request).await?;
    let language = match language.and_then(|l| l.trim().parse::<Language>().ok()) {
        Some(language) => language,
        None => state.db.get_language().await?,
    };

    let html = report.render_html(&state.templates, language)?;
    Ok(HtmlReport {
        filename: report.filename(),
        html,
    })
}

async fn get_report_print(
    state: RequestState,
    Query(query): Query<ReportQuery>,
) -> ServiceResult<HtmlReport> {
    print_report(state, ReportRequest::from(&query), query.language.as_deref()).await
}

async fn post_report_print(
    state: RequestState,
    form: Json<ReportBodyDto>,
) -> ServiceResult<HtmlReport> {
    print_report(state, ReportRequest::from(&form.0), form.language.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse_query(uri: &str) -> ReportQuery {
        use axum::extract::FromRequestParts;
        use axum::http::Request;

        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        let Query(query) = Query::<ReportQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        query
    }

    #[tokio::test]
    async fn test_query_lists_are_repeated_keys() {
        let query = parse_query(
            "/reports?startDate=2025-01-01&endDate=2025-01-31&boxTypes=E1&boxTypes=E2\
             &companies=publimar&companies=Smith%2C%20Ltd&includeSummary=on",
        )
        .await;

        let request = ReportRequest::from(&query);
        assert_eq!(request.start_date.as_deref(), Some("2025-01-01"));
        assert_eq!(request.box_types, vec!["E1", "E2"]);
        assert_eq!(request.companies, vec!["publimar", "Smith, Ltd"]);
        assert!(request.include_summary);
        assert!(!request.include_parameters);
        assert!(request.include_entries);
        assert!(!request.entries_ascending);
    }

    #[tokio::test]
    async fn test_query_single_values() {
        let query = parse_query("/reports?startDate=2025-01-01&boxTypes=E1,%20E2&companies=duda").await;

        let request = ReportRequest::from(&query);
        assert_eq!(request.box_types, vec!["E1", "E2"]);
        assert_eq!(request.companies, vec!["duda"]);

        let query = parse_query("/reports?startDate=2025-01-01").await;
        assert!(query.box_types.is_empty());
        assert!(query.companies.is_empty());
    }

    #[test]
    fn test_body_flags_are_lenient() {
        let body: ReportBodyDto = serde_json::from_str(
            r#"{
                "startDate": "2025-01-01",
                "endDate": "2025-01-31",
                "boxTypes": ["E2"],
                "includeSummary": true,
                "includeEntries": "false",
                "entriesOrder": "ASC"
            }"#,
        )
        .unwrap();

        let request = ReportRequest::from(&body);
        assert!(request.include_summary);
        assert!(!request.include_entries);
        assert!(request.entries_ascending);
        assert!(request.companies.is_empty());
    }

    #[test]
    fn test_report_dto_omits_entries_when_excluded() {
        let request = ReportRequest {
            start_date: Some("2025-01-01".to_owned()),
            end_date: Some("2025-01-31".to_owned()),
            box_types: vec!["E1".to_owned()],
            include_entries: false,
            ..Default::default()
        };
        let report = Report::new(request.validate().unwrap(), vec![], vec!["duda".to_owned()]);

        let dto = ReportDto::from(&report);
        assert!(dto.entries.is_empty());
        assert_eq!(dto.parameters.companies, vec!["duda"]);
        assert_eq!(dto.parameters.display_mode, "raw");
        assert_eq!(dto.parameters.entries_order, "desc");
        assert_eq!(dto.summary, None);
    }
}

//! Box balance reports over a date range.
//!
//! A report lists the entries of the selected companies and box types and optionally a summary
//! with grand totals and per company totals. The same report can be rendered as a printable A4
//! html page.
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoxCounts, BoxType, DisplayMode, Entry, Language};

mod i18n;
mod layout;

pub use i18n::format_date;
pub use layout::spacer_rows;

const REPORT_TEMPLATE: &str = "report";

pub fn templates() -> ServiceResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_template_string(REPORT_TEMPLATE, include_str!("templates/report.hbs"))?;
    Ok(handlebars)
}

/// Report parameters as received, before validation.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ReportRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub box_types: Vec<String>,
    pub companies: Vec<String>,
    pub include_summary: bool,
    pub include_parameters: bool,
    pub include_entries: bool,
    pub display_mode: Option<String>,
    pub entries_ascending: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReportParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub box_types: Vec<BoxType>,
    /// Company filter, empty selects all companies.
    pub companies: Vec<String>,
    pub include_summary: bool,
    pub include_parameters: bool,
    pub include_entries: bool,
    pub display_mode: DisplayMode,
    pub entries_ascending: bool,
}

fn parse_report_date(value: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::BadRequest(format!("Invalid date '{}'", value)))
}

/// Keep the first occurrence of every value.
fn dedup<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut result = Vec::new();
    for value in values {
        if !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

impl ReportRequest {
    pub fn validate(self) -> ServiceResult<ReportParams> {
        let (start_date, end_date) = match (
            self.start_date.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            self.end_date.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        ) {
            (Some(start), Some(end)) => (parse_report_date(start)?, parse_report_date(end)?),
            _ => {
                return Err(ServiceError::BadRequest(
                    "Start date and end date are required".to_owned(),
                ))
            }
        };

        let box_types = dedup(self.box_types.iter().filter_map(|b| b.parse::<BoxType>().ok()));
        if box_types.is_empty() {
            return Err(ServiceError::BadRequest(
                "At least one box type must be selected".to_owned(),
            ));
        }

        let companies = dedup(
            self.companies
                .into_iter()
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
        );

        let display_mode = match self.display_mode.as_deref().map(str::trim) {
            Some("balance") => DisplayMode::Balance,
            _ => DisplayMode::Raw,
        };

        Ok(ReportParams {
            start_date,
            end_date,
            box_types,
            companies,
            include_summary: self.include_summary,
            include_parameters: self.include_parameters,
            include_entries: self.include_entries,
            display_mode,
            entries_ascending: self.entries_ascending,
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompanyTotals {
    pub company: String,
    pub counts: BoxCounts,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReportSummary {
    pub totals: BoxCounts,
    pub by_company: Vec<CompanyTotals>,
}

/// Totals of the selected box types, counts of other box types stay 0.
pub fn summarize(entries: &[Entry], box_types: &[BoxType]) -> ReportSummary {
    let mut by_company = BTreeMap::<&str, BoxCounts>::new();
    for entry in entries {
        let counts = by_company.entry(entry.company.as_str()).or_default();
        *counts = *counts + entry.counts.restricted_to(box_types);
    }

    let totals = by_company.values().sum();
    ReportSummary {
        totals,
        by_company: by_company
            .into_iter()
            .map(|(company, counts)| CompanyTotals {
                company: company.to_owned(),
                counts,
            })
            .collect(),
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Report {
    pub params: ReportParams,
    /// The company filter, or all company names when no filter was given.
    pub companies: Vec<String>,
    pub entries: Vec<Entry>,
    pub summary: Option<ReportSummary>,
}

impl Report {
    /// `entries` are expected in date descending order, as returned by the database.
    pub fn new(params: ReportParams, mut entries: Vec<Entry>, all_companies: Vec<String>) -> Self {
        if params.entries_ascending {
            entries.reverse();
        }

        let summary = if params.include_summary {
            Some(summarize(&entries, &params.box_types))
        } else {
            None
        };

        let companies = if params.companies.is_empty() {
            all_companies
        } else {
            params.companies.clone()
        };

        Self {
            params,
            companies,
            entries,
            summary,
        }
    }

    pub fn filename(&self) -> String {
        format!(
            "raport_stanu_pojemnikow_{}_{}",
            self.params.start_date.format("%Y-%m-%d"),
            self.params.end_date.format("%Y-%m-%d")
        )
    }

    /// Box type columns in print order, E2 before E1.
    fn columns(&self) -> Vec<BoxType> {
        [BoxType::E2, BoxType::E1]
            .into_iter()
            .filter(|b| self.params.box_types.contains(b))
            .collect()
    }

    fn column_labels(&self, labels: &i18n::Labels) -> Vec<&'static str> {
        let mut result = Vec::new();
        for box_type in self.columns() {
            match (self.params.display_mode, box_type) {
                (DisplayMode::Raw, BoxType::E2) => {
                    result.extend([labels.e2_intake, labels.e2_output])
                }
                (DisplayMode::Raw, BoxType::E1) => {
                    result.extend([labels.e1_intake, labels.e1_output])
                }
                (DisplayMode::Balance, BoxType::E2) => result.push(labels.e2_balance),
                (DisplayMode::Balance, BoxType::E1) => result.push(labels.e1_balance),
            }
        }
        result
    }

    fn cells(&self, counts: &BoxCounts) -> Vec<i64> {
        let mut result = Vec::new();
        for box_type in self.columns() {
            match self.params.display_mode {
                DisplayMode::Raw => {
                    result.extend([counts.intake(box_type), counts.output(box_type)])
                }
                DisplayMode::Balance => result.push(counts.balance(box_type)),
            }
        }
        result
    }

    /// Render the printable html page.
    pub fn render_html(
        &self,
        templates: &Handlebars<'static>,
        language: Language,
    ) -> ServiceResult<String> {
        let context = self.print_context(language, Local::now().naive_local());
        Ok(templates.render(REPORT_TEMPLATE, &context)?)
    }

    fn print_context(&self, language: Language, now: chrono::NaiveDateTime) -> PrintContext {
        let labels = i18n::labels(language);
        let params = &self.params;

        let mut rows = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            rows.push(PrintRow {
                date: format_date(entry.entry_date, language),
                company: entry.company.to_owned(),
                cells: self.cells(&entry.counts),
                is_starting_balance: entry.is_starting_balance,
                odd: index % 2 == 1,
                spacers: vec![(); spacer_rows(index, params.include_parameters)],
            });
        }

        let summary = self.summary.as_ref().map(|summary| PrintSummary {
            totals: self
                .column_labels(labels)
                .into_iter()
                .zip(self.cells(&summary.totals))
                .map(|(label, value)| PrintTotal { label, value })
                .collect(),
            companies: summary
                .by_company
                .iter()
                .map(|c| PrintCompany {
                    company: c.company.to_owned(),
                    cells: self.cells(&c.counts),
                })
                .collect(),
        });

        let display_mode = match params.display_mode {
            DisplayMode::Raw => labels.raw_values,
            DisplayMode::Balance => labels.balances,
        };

        PrintContext {
            lang: language.as_str(),
            labels,
            start_date: format_date(params.start_date, language),
            end_date: format_date(params.end_date, language),
            display_mode,
            totals_heading: match params.display_mode {
                DisplayMode::Raw => labels.values,
                DisplayMode::Balance => labels.balances,
            },
            box_types: params
                .box_types
                .iter()
                .map(|b| b.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            companies: if self.companies.is_empty() {
                labels.all.to_owned()
            } else {
                self.companies.join(", ")
            },
            include_parameters: params.include_parameters,
            include_entries: params.include_entries,
            include_summary: self.summary.is_some(),
            column_span: self.column_labels(labels).len() + 2,
            columns: self.column_labels(labels),
            rows,
            summary,
            generated_date: format_date(now.date(), language),
            generated_time: now.format("%H:%M:%S").to_string(),
            filename: self.filename(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PrintRow {
    date: String,
    company: String,
    cells: Vec<i64>,
    is_starting_balance: bool,
    odd: bool,
    spacers: Vec<()>,
}

#[derive(Debug, Serialize)]
struct PrintTotal {
    label: &'static str,
    value: i64,
}

#[derive(Debug, Serialize)]
struct PrintCompany {
    company: String,
    cells: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct PrintSummary {
    totals: Vec<PrintTotal>,
    companies: Vec<PrintCompany>,
}

#[derive(Debug, Serialize)]
struct PrintContext {
    lang: &'static str,
    labels: &'static i18n::Labels,
    start_date: String,
    end_date: String,
    display_mode: &'static str,
    totals_heading: &'static str,
    box_types: String,
    companies: String,
    include_parameters: bool,
    include_entries: bool,
    include_summary: bool,
    columns: Vec<&'static str>,
    column_span: usize,
    rows: Vec<PrintRow>,
    summary: Option<PrintSummary>,
    generated_date: String,
    generated_time: String,
    filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, date: &str, company: &str, counts: [i64; 4]) -> Entry {
        Entry {
            id,
            entry_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            company_id: 1,
            company: company.to_owned(),
            counts: BoxCounts {
                e2_in: counts[0],
                e1_in: counts[1],
                e2_out: counts[2],
                e1_out: counts[3],
            },
            photo_url: None,
            is_starting_balance: false,
            created_at: None,
        }
    }

    fn request() -> ReportRequest {
        ReportRequest {
            start_date: Some("2025-01-01".to_owned()),
            end_date: Some("2025-01-31".to_owned()),
            box_types: vec!["E1".to_owned(), "E2".to_owned()],
            include_summary: true,
            include_entries: true,
            ..Default::default()
        }
    }

    fn entries() -> Vec<Entry> {
        vec![
            entry(4, "2025-01-03", "publimar", [151, 0, 81, 0]),
            entry(3, "2025-01-02", "indykpol", [40, 7, 21, 2]),
            entry(2, "2025-01-02", "publimar", [119, 0, 120, 0]),
        ]
    }

    #[test]
    fn test_missing_dates_are_rejected() {
        let result = ReportRequest {
            start_date: None,
            ..request()
        }
        .validate();
        assert_eq!(
            result,
            Err(ServiceError::BadRequest(
                "Start date and end date are required".to_owned()
            ))
        );

        let result = ReportRequest {
            end_date: Some(" ".to_owned()),
            ..request()
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_box_types_are_required() {
        let result = ReportRequest {
            box_types: vec!["E3".to_owned()],
            ..request()
        }
        .validate();
        assert_eq!(
            result,
            Err(ServiceError::BadRequest(
                "At least one box type must be selected".to_owned()
            ))
        );
    }

    #[test]
    fn test_parameters_are_deduplicated() {
        let params = ReportRequest {
            box_types: vec!["E1".to_owned(), "e1".to_owned(), "E2".to_owned()],
            companies: vec!["duda".to_owned(), "duda".to_owned(), "".to_owned()],
            display_mode: Some("balance".to_owned()),
            ..request()
        }
        .validate()
        .unwrap();

        assert_eq!(params.box_types, vec![BoxType::E1, BoxType::E2]);
        assert_eq!(params.companies, vec!["duda".to_owned()]);
        assert_eq!(params.display_mode, DisplayMode::Balance);
    }

    #[test]
    fn test_summary_only_counts_selected_box_types() {
        let summary = summarize(&entries(), &[BoxType::E1]);

        assert_eq!(summary.totals.e2_in, 0);
        assert_eq!(summary.totals.e2_out, 0);
        assert_eq!(summary.totals.e1_in, 7);
        assert_eq!(summary.totals.e1_out, 2);

        assert_eq!(summary.by_company.len(), 2);
        assert_eq!(summary.by_company[0].company, "indykpol");
        assert_eq!(summary.by_company[1].company, "publimar");
        assert_eq!(summary.by_company[1].counts, BoxCounts::zero());
    }

    #[test]
    fn test_summary_balance_matches_entry_balances() {
        let entries = entries();
        let summary = summarize(&entries, &[BoxType::E1, BoxType::E2]);

        let balance: i64 = entries.iter().map(|e| e.counts.balance_total()).sum();
        assert_eq!(summary.totals.balance_total(), balance);
    }

    #[test]
    fn test_report_lists_all_companies_without_filter() {
        let params = request().validate().unwrap();
        let report = Report::new(
            params,
            entries(),
            vec!["duda".to_owned(), "indykpol".to_owned()],
        );
        assert_eq!(report.companies, vec!["duda", "indykpol"]);
        assert!(report.summary.is_some());
        assert_eq!(report.filename(), "raport_stanu_pojemnikow_2025-01-01_2025-01-31");
    }

    #[test]
    fn test_report_ascending_order() {
        let params = ReportRequest {
            entries_ascending: true,
            include_summary: false,
            ..request()
        }
        .validate()
        .unwrap();
        let report = Report::new(params, entries(), vec![]);

        let ids: Vec<i32> = report.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(report.summary, None);
    }

    #[test]
    fn test_balance_cells() {
        let params = ReportRequest {
            display_mode: Some("balance".to_owned()),
            ..request()
        }
        .validate()
        .unwrap();
        let report = Report::new(params, entries(), vec![]);

        let labels = i18n::labels(Language::En);
        assert_eq!(report.column_labels(labels), vec!["E2 Balance", "E1 Balance"]);
        assert_eq!(report.cells(&report.entries[1].counts), vec![-19, -5]);
    }

    #[test]
    fn test_print_context_inserts_spacer_rows() {
        let many: Vec<Entry> = (0..30)
            .map(|i| entry(i, "2025-01-05", "duda", [1, 2, 3, 4]))
            .collect();
        let report = Report::new(request().validate().unwrap(), many, vec![]);

        let now = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let context = report.print_context(Language::Pl, now);

        assert_eq!(context.rows.len(), 30);
        assert_eq!(context.rows[21].spacers.len(), 3);
        assert_eq!(context.rows[20].spacers.len(), 0);
        assert_eq!(context.rows[0].date, "05.01.2025");
        assert_eq!(context.generated_date, "01.02.2025");
        assert_eq!(context.columns.len(), 4);
    }

    #[test]
    fn test_render_html() {
        let templates = templates().unwrap();
        let params = ReportRequest {
            include_parameters: true,
            ..request()
        }
        .validate()
        .unwrap();
        let report = Report::new(params, entries(), vec!["publimar".to_owned()]);

        let html = report.render_html(&templates, Language::En).unwrap();
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("Box Balance Report"));
        assert!(html.contains("01/03/2025"));
        assert!(html.contains("Report Parameters"));
        assert!(html.contains("indykpol"));
        assert!(html.contains("By Company"));
    }
}

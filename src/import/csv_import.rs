use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::ServiceResult;
use crate::models::{count_prefix, BoxCounts, Company};

use super::PreviewRow;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Column {
    Date,
    Company,
    E2In,
    E1In,
    E2Out,
    E1Out,
}

const KNOWN_HEADERS: [(Column, &[&str]); 6] = [
    (Column::Date, &["data", "date", "entry date"]),
    (Column::Company, &["firma", "company", "company name"]),
    (
        Column::E2In,
        &["pojemniki przyjęte e2", "e2 intake", "e2in", "e2 in"],
    ),
    (
        Column::E1In,
        &["pojemniki przyjęte e1", "e1 intake", "e1in", "e1 in"],
    ),
    (
        Column::E2Out,
        &["pojemniki oddane e2", "e2 output", "e2out", "e2 out"],
    ),
    (
        Column::E1Out,
        &["pojemniki oddane e1", "e1 output", "e1out", "e1 out"],
    ),
];

/// Semicolon separated files are common in polish spreadsheet exports.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let commas = header_line.split(',').count();
    let semicolons = header_line.split(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn match_header(header: &str) -> Option<Column> {
    let header = normalize_header(header);

    for (column, names) in KNOWN_HEADERS.iter() {
        if names.iter().any(|name| *name == header) {
            return Some(*column);
        }
    }

    // Fallback for headers like "Przyjęte pojemniki (E2)".
    let e1 = header.contains("e1");
    let e2 = header.contains("e2");
    if e1 == e2 {
        return None;
    }

    let output = header.contains("odd") || header.contains("out");
    let intake = header.contains("przyj") || header.contains("in");

    match (e2, output, intake) {
        (true, true, _) => Some(Column::E2Out),
        (false, true, _) => Some(Column::E1Out),
        (true, false, true) => Some(Column::E2In),
        (false, false, true) => Some(Column::E1In),
        _ => None,
    }
}

#[derive(Debug, Default, PartialEq)]
struct ColumnIndices {
    date: Option<usize>,
    company: Option<usize>,
    e2_in: Option<usize>,
    e1_in: Option<usize>,
    e2_out: Option<usize>,
    e1_out: Option<usize>,
}

impl ColumnIndices {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut indices = ColumnIndices::default();

        for (index, header) in headers.iter().enumerate() {
            let slot = match match_header(header) {
                Some(Column::Date) => &mut indices.date,
                Some(Column::Company) => &mut indices.company,
                Some(Column::E2In) => &mut indices.e2_in,
                Some(Column::E1In) => &mut indices.e1_in,
                Some(Column::E2Out) => &mut indices.e2_out,
                Some(Column::E1Out) => &mut indices.e1_out,
                None => continue,
            };
            if slot.is_none() {
                *slot = Some(index);
            }
        }

        indices
    }
}

fn cell(record: &StringRecord, index: Option<usize>) -> &str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn count_cell(record: &StringRecord, index: Option<usize>) -> i64 {
    count_prefix(cell(record, index))
}

/// Accepts `DD/MM/YYYY`, `DD.MM.YYYY` (one or two digit day and month) and ISO dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let parts: Vec<&str> = raw.split(['/', '.']).collect();
    if parts.len() != 3 {
        return None;
    }

    let (day, month, year) = (parts[0], parts[1], parts[2]);
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };
    if !digits(day, 1, 2) || !digits(month, 1, 2) || !digits(year, 4, 4) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn resolve_company<'a>(companies: &'a [Company], name: &str) -> Option<&'a Company> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    companies
        .iter()
        .find(|c| c.name.trim().to_lowercase() == name)
}

/// Parse csv text into preview rows, resolving company names against the known companies.
pub fn parse_preview(text: &str, companies: &[Company]) -> ServiceResult<Vec<PreviewRow>> {
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text.lines().next().unwrap_or("");

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let indices = ColumnIndices::from_headers(reader.headers()?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let raw_date = cell(&record, indices.date);
        let entry_date = parse_date(raw_date);
        let company_name = cell(&record, indices.company);
        let company = resolve_company(companies, company_name);

        rows.push(PreviewRow {
            index: rows.len(),
            date: entry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw_date.to_owned()),
            entry_date,
            company_id: company.map(|c| c.id),
            company_name: if company_name.is_empty() {
                "Unknown".to_owned()
            } else {
                company_name.to_owned()
            },
            counts: BoxCounts {
                e2_in: count_cell(&record, indices.e2_in),
                e1_in: count_cell(&record, indices.e1_in),
                e2_out: count_cell(&record, indices.e2_out),
                e1_out: count_cell(&record, indices.e1_out),
            },
            is_starting_balance: false,
            include: company.is_some(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: i32, name: &str) -> Company {
        Company {
            id,
            name: name.to_owned(),
            address: None,
            phone: None,
            email: None,
            balance: None,
        }
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("data;firma;E2in"), b';');
        assert_eq!(detect_delimiter("date,company,E2in"), b',');
        assert_eq!(detect_delimiter("date"), b',');
        // Equal field counts keep the comma.
        assert_eq!(detect_delimiter("a;b,c"), b',');
    }

    #[test]
    fn test_match_exact_headers() {
        assert_eq!(match_header("data"), Some(Column::Date));
        assert_eq!(match_header("\u{feff}Data"), Some(Column::Date));
        assert_eq!(match_header("Entry Date"), Some(Column::Date));
        assert_eq!(match_header("firma"), Some(Column::Company));
        assert_eq!(match_header("pojemniki przyjęte E2"), Some(Column::E2In));
        assert_eq!(match_header("pojemniki oddane E1"), Some(Column::E1Out));
        assert_eq!(match_header("E1 intake"), Some(Column::E1In));
        assert_eq!(match_header(" E2out "), Some(Column::E2Out));
    }

    #[test]
    fn test_match_fuzzy_headers() {
        assert_eq!(match_header("Przyjęte (E2)"), Some(Column::E2In));
        assert_eq!(match_header("Oddane E1 razem"), Some(Column::E1Out));
        assert_eq!(match_header("E2 returned out"), Some(Column::E2Out));
        assert_eq!(match_header("notes"), None);
        assert_eq!(match_header("E1 E2 in"), None);
    }

    #[test]
    fn test_parse_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(parse_date("03/01/2025"), Some(date));
        assert_eq!(parse_date("3.1.2025"), Some(date));
        assert_eq!(parse_date("2025-01-03"), Some(date));
        assert_eq!(parse_date("31/02/2025"), None);
        assert_eq!(parse_date("01/2025"), None);
        assert_eq!(parse_date("03/01/25"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_preview_polish_semicolon_file() {
        let text = "\u{feff}data;firma;pojemniki przyjęte E2;pojemniki przyjęte E1;pojemniki oddane E2;pojemniki oddane E1\n\
                    02/01/2025;Publimar;119;0;120;0\n\
                    \n\
                    02/01/2025;Indykpol;40;7;21\n";
        let companies = vec![company(1, "publimar"), company(3, "indykpol")];

        let rows = parse_preview(text, &companies).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, "2025-01-02");
        assert_eq!(rows[0].company_id, Some(1));
        assert_eq!(rows[0].counts.e2_in, 119);
        assert_eq!(rows[0].counts.e2_out, 120);
        assert!(rows[0].include);

        // Short rows are padded.
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].company_id, Some(3));
        assert_eq!(rows[1].counts.e1_in, 7);
        assert_eq!(rows[1].counts.e2_out, 21);
        assert_eq!(rows[1].counts.e1_out, 0);
    }

    #[test]
    fn test_unknown_company_and_invalid_date() {
        let text = "date,company,E2 in,E1 in,E2 out,E1 out\n\
                    someday,Unknown Co,1,x,3,4\n\
                    2025-01-05,,1,2,3,4\n";

        let rows = parse_preview(text, &[company(1, "publimar")]).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, "someday");
        assert_eq!(rows[0].entry_date, None);
        assert_eq!(rows[0].company_id, None);
        assert_eq!(rows[0].company_name, "Unknown Co");
        assert_eq!(rows[0].counts.e1_in, 0);
        assert!(!rows[0].include);

        assert_eq!(rows[1].company_name, "Unknown");
        assert!(!rows[1].include);
    }

    #[test]
    fn test_counts_keep_leading_number() {
        let text = "data;firma;pojemniki przyjęte E2;pojemniki przyjęte E1;pojemniki oddane E2;pojemniki oddane E1\n\
                    01/01/2025;publimar;114.00;12.5;7 szt;brak\n";

        let rows = parse_preview(text, &[company(1, "publimar")]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].counts.e2_in, 114);
        assert_eq!(rows[0].counts.e1_in, 12);
        assert_eq!(rows[0].counts.e2_out, 7);
        assert_eq!(rows[0].counts.e1_out, 0);
    }

    #[test]
    fn test_header_only_file() {
        let rows = parse_preview("data,firma\n", &[]).unwrap();
        assert!(rows.is_empty());
        assert!(parse_preview("", &[]).unwrap().is_empty());
    }
}

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Language;

/// Static texts of the printable report.
#[derive(Debug, PartialEq, Serialize)]
pub struct Labels {
    pub title: &'static str,
    pub to: &'static str,
    pub displaying: &'static str,
    pub raw_values: &'static str,
    pub balances: &'static str,
    pub values: &'static str,
    pub report_parameters: &'static str,
    pub date_range: &'static str,
    pub box_types: &'static str,
    pub companies: &'static str,
    pub all: &'static str,
    pub entries_included: &'static str,
    pub summary_included: &'static str,
    pub display_mode: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
    pub entries: &'static str,
    pub no_entries: &'static str,
    pub date: &'static str,
    pub company: &'static str,
    pub starting_balance: &'static str,
    pub summary: &'static str,
    pub total: &'static str,
    pub by_company: &'static str,
    pub e1_intake: &'static str,
    pub e1_output: &'static str,
    pub e1_balance: &'static str,
    pub e2_intake: &'static str,
    pub e2_output: &'static str,
    pub e2_balance: &'static str,
    pub generated_on: &'static str,
    pub at: &'static str,
}

const EN: Labels = Labels {
    title: "Box Balance Report",
    to: "to",
    displaying: "Displaying",
    raw_values: "Raw values",
    balances: "Balances",
    values: "Values",
    report_parameters: "Report Parameters",
    date_range: "Date range",
    box_types: "Box types",
    companies: "Companies",
    all: "All",
    entries_included: "Entries included",
    summary_included: "Summary included",
    display_mode: "Display mode",
    yes: "Yes",
    no: "No",
    entries: "Entries",
    no_entries: "No entries in the selected period",
    date: "Date",
    company: "Company",
    starting_balance: "Starting balance",
    summary: "Summary",
    total: "Total",
    by_company: "By Company",
    e1_intake: "E1 Intake",
    e1_output: "E1 Output",
    e1_balance: "E1 Balance",
    e2_intake: "E2 Intake",
    e2_output: "E2 Output",
    e2_balance: "E2 Balance",
    generated_on: "Generated on",
    at: "at",
};

const PL: Labels = Labels {
    title: "Raport stanu pojemników",
    to: "do",
    displaying: "Wyświetlanie",
    raw_values: "Surowe wartości",
    balances: "Salda",
    values: "Wartości",
    report_parameters: "Parametry raportu",
    date_range: "Zakres dat",
    box_types: "Typy pojemników",
    companies: "Firmy",
    all: "Wszystkie",
    entries_included: "Wpisy uwzględnione",
    summary_included: "Podsumowanie uwzględnione",
    display_mode: "Tryb wyświetlania",
    yes: "Tak",
    no: "Nie",
    entries: "Wpisy",
    no_entries: "Brak wpisów w wybranym okresie",
    date: "Data",
    company: "Firma",
    starting_balance: "Bilans otwarcia",
    summary: "Podsumowanie",
    total: "Suma",
    by_company: "Według firmy",
    e1_intake: "Przyjęte E1",
    e1_output: "Oddane E1",
    e1_balance: "Saldo E1",
    e2_intake: "Przyjęte E2",
    e2_output: "Oddane E2",
    e2_balance: "Saldo E2",
    generated_on: "Wygenerowano",
    at: "o",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Pl => &PL,
    }
}

/// `DD.MM.YYYY` in polish, `MM/DD/YYYY` in english.
pub fn format_date(date: NaiveDate, language: Language) -> String {
    match language {
        Language::Pl => date.format("%d.%m.%Y").to_string(),
        Language::En => date.format("%m/%d/%Y").to_string(),
    }
}

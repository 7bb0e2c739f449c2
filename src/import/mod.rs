//! CSV import of entries.
//!
//! Importing is a two step process: a csv file is parsed into preview rows that can be corrected
//! by the user, afterwards the selected rows are stored one by one. A failing row does not abort
//! the import.
use chrono::NaiveDate;

use crate::database::DatabaseConnection;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoxCounts, Company, NewEntry};

mod csv_import;

use csv_import::{parse_date, parse_preview};

#[derive(Debug, PartialEq, Clone)]
pub struct PreviewRow {
    pub index: usize,
    /// ISO date if the input could be parsed, the raw cell otherwise.
    pub date: String,
    pub entry_date: Option<NaiveDate>,
    pub company_id: Option<i32>,
    pub company_name: String,
    pub counts: BoxCounts,
    pub is_starting_balance: bool,
    pub include: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ImportResult {
    pub count: u64,
    pub error: Option<String>,
}

/// Destination of imported rows.
#[allow(async_fn_in_trait)]
pub trait EntryStore {
    async fn store_entry(&mut self, entry: NewEntry) -> ServiceResult<()>;
}

impl EntryStore for DatabaseConnection {
    async fn store_entry(&mut self, entry: NewEntry) -> ServiceResult<()> {
        self.create_entry(entry).await.map(|_| ())
    }
}

impl PreviewRow {
    /// `None` for rows that are not selected or have no resolved company.
    fn to_new_entry(&self) -> Option<Result<NewEntry, String>> {
        if !self.include {
            return None;
        }
        let company_id = self.company_id?;

        let entry_date = match self.entry_date.or_else(|| parse_date(&self.date)) {
            Some(date) => date,
            None => return Some(Err(format!("invalid date '{}'", self.date))),
        };

        Some(Ok(NewEntry {
            entry_date,
            company_id,
            counts: self.counts,
            photo_url: None,
            is_starting_balance: self.is_starting_balance,
        }))
    }
}

pub fn preview(text: &str, companies: &[Company]) -> ServiceResult<Vec<PreviewRow>> {
    parse_preview(text, companies)
}

/// Store all selected rows, rows that fail are logged and skipped.
pub async fn import_rows<S: EntryStore>(store: &mut S, rows: &[PreviewRow]) -> ImportResult {
    let mut count = 0;

    for row in rows {
        let entry = match row.to_new_entry() {
            Some(Ok(entry)) => entry,
            Some(Err(reason)) => {
                log::warn!("Skipping csv row {}: {}", row.index + 1, reason);
                continue;
            }
            None => continue,
        };

        match store.store_entry(entry).await {
            Ok(()) => count += 1,
            Err(e) => log::warn!("Skipping csv row {}: {:?}", row.index + 1, e),
        }
    }

    ImportResult {
        count,
        error: if count == 0 {
            Some("No valid entries to import".to_owned())
        } else {
            None
        },
    }
}

/// Preview and import in one step.
pub async fn import_csv<S: EntryStore>(
    store: &mut S,
    text: &str,
    companies: &[Company],
) -> ServiceResult<ImportResult> {
    if text.trim().is_empty() {
        return Err(ServiceError::BadRequest("No file provided".to_owned()));
    }

    let rows = preview(text, companies)?;
    Ok(import_rows(store, &rows).await)
}

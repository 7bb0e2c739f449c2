use chrono::NaiveDate;

use crate::database::DatabaseConnection;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoxCounts, NewEntry};

pub const DEMO_COMPANIES: [&str; 4] = ["publimar", "duda", "indykpol", "łuków"];

/// (date, company, e2 in, e1 in, e2 out, e1 out, starting balance)
type DemoEntry = (&'static str, &'static str, i64, i64, i64, i64, bool);

const DEMO_ENTRIES: [DemoEntry; 10] = [
    ("2023-12-31", "publimar", 4322, 0, 0, 0, true),
    ("2024-12-31", "publimar", 1547, 0, 0, 0, true),
    ("2024-12-31", "duda", 116, 0, 0, 0, true),
    ("2024-12-31", "indykpol", 321, 17, 0, 0, true),
    ("2024-12-31", "łuków", 352, 59, 0, 0, true),
    ("2025-01-01", "publimar", 114, 0, 160, 0, false),
    ("2025-01-02", "publimar", 119, 0, 120, 0, false),
    ("2025-01-02", "indykpol", 40, 7, 21, 2, false),
    ("2025-01-03", "publimar", 151, 0, 81, 0, false),
    ("2025-01-03", "łuków", 9, 0, 9, 0, false),
];

fn demo_entry(entry: &DemoEntry, company_id: i32) -> ServiceResult<NewEntry> {
    let (date, _, e2_in, e1_in, e2_out, e1_out, is_starting_balance) = *entry;
    let entry_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| ServiceError::InternalServerError(format!("invalid demo date: {e}")))?;

    Ok(NewEntry {
        entry_date,
        company_id,
        counts: BoxCounts {
            e2_in,
            e1_in,
            e2_out,
            e1_out,
        },
        photo_url: None,
        is_starting_balance,
    })
}

/// Insert the demo companies, starting balances and entries. Existing rows are left alone, so
/// seeding twice does not duplicate anything. Returns the number of inserted entries.
pub async fn load_demo_data(db: &mut DatabaseConnection) -> ServiceResult<u64> {
    for name in DEMO_COMPANIES {
        db.ensure_company(name).await?;
    }

    let mut inserted = 0;
    for entry in DEMO_ENTRIES.iter() {
        let company = db.get_company_by_name(entry.1).await?;
        let Some(company) = company else {
            log::warn!("Demo company {} is missing, skipping entry", entry.1);
            continue;
        };

        if db.create_entry_if_missing(demo_entry(entry, company.id)?).await? {
            inserted += 1;
        }
    }

    log::info!("Seeded {} demo entries", inserted);
    Ok(inserted)
}

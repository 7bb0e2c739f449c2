use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::error::ServiceResult;
use crate::models::{BoxCounts, Entry, NewEntry};

use super::DatabaseConnection;

#[derive(Debug, FromRow)]
struct EntryRow {
    id: i32,
    entry_date: NaiveDate,
    company_id: i32,
    company: String,
    e2in: i32,
    e1in: i32,
    e2out: i32,
    e1out: i32,
    photo_url: Option<String>,
    is_starting_balance: bool,
    created_at: Option<DateTime<Utc>>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            entry_date: row.entry_date,
            company_id: row.company_id,
            company: row.company,
            counts: BoxCounts {
                e2_in: row.e2in as i64,
                e1_in: row.e1in as i64,
                e2_out: row.e2out as i64,
                e1_out: row.e1out as i64,
            },
            photo_url: row.photo_url,
            is_starting_balance: row.is_starting_balance,
            created_at: row.created_at,
        }
    }
}

const ENTRY_COLUMNS: &str = r#"
    e.id, e.entry_date, e.company_id, c.name AS company,
    e.e2in, e.e1in, e.e2out, e.e1out,
    e.photo_url, e.is_starting_balance, e.created_at
"#;

fn count_column(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl DatabaseConnection {
    /// Entries ordered from the most recent date, ties broken by id.
    pub async fn get_entries(&mut self, limit: i64, offset: i64) -> ServiceResult<Vec<Entry>> {
        let query = format!(
            r#"
                SELECT {ENTRY_COLUMNS}
                FROM entries e
                JOIN companies c ON e.company_id = c.id
                ORDER BY e.entry_date DESC, e.id DESC
                LIMIT $1 OFFSET $2
            "#
        );

        let rows = sqlx::query_as::<_, EntryRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.connection)
            .await?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    pub async fn get_entry_by_id(&mut self, id: i32) -> ServiceResult<Option<Entry>> {
        let query = format!(
            r#"
                SELECT {ENTRY_COLUMNS}
                FROM entries e
                JOIN companies c ON e.company_id = c.id
                WHERE e.id = $1
            "#
        );

        let row = sqlx::query_as::<_, EntryRow>(&query)
            .bind(id)
            .fetch_optional(&mut *self.connection)
            .await?;

        Ok(row.map(Entry::from))
    }

    /// Entries between both dates (inclusive). An empty company list selects all companies.
    pub async fn get_entries_in_range(
        &mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        company_names: &[String],
    ) -> ServiceResult<Vec<Entry>> {
        let query = format!(
            r#"
                SELECT {ENTRY_COLUMNS}
                FROM entries e
                JOIN companies c ON e.company_id = c.id
                WHERE e.entry_date >= $1
                  AND e.entry_date <= $2
                  AND (cardinality($3::text[]) = 0 OR c.name = ANY($3))
                ORDER BY e.entry_date DESC, e.id DESC
            "#
        );

        let rows = sqlx::query_as::<_, EntryRow>(&query)
            .bind(start_date)
            .bind(end_date)
            .bind(company_names)
            .fetch_all(&mut *self.connection)
            .await?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    pub async fn get_starting_balances(&mut self) -> ServiceResult<Vec<Entry>> {
        let query = format!(
            r#"
                SELECT {ENTRY_COLUMNS}
                FROM entries e
                JOIN companies c ON e.company_id = c.id
                WHERE e.is_starting_balance = true
                ORDER BY c.name, e.entry_date
            "#
        );

        let rows = sqlx::query_as::<_, EntryRow>(&query)
            .fetch_all(&mut *self.connection)
            .await?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    pub async fn create_entry(&mut self, entry: NewEntry) -> ServiceResult<Entry> {
        let query = format!(
            r#"
                WITH e AS (
                    INSERT INTO entries (
                        entry_date, company_id, e2in, e1in, e2out, e1out,
                        photo_url, is_starting_balance
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING *
                )
                SELECT {ENTRY_COLUMNS}
                FROM e
                JOIN companies c ON e.company_id = c.id
            "#
        );

        let row = sqlx::query_as::<_, EntryRow>(&query)
            .bind(entry.entry_date)
            .bind(entry.company_id)
            .bind(count_column(entry.counts.e2_in))
            .bind(count_column(entry.counts.e1_in))
            .bind(count_column(entry.counts.e2_out))
            .bind(count_column(entry.counts.e1_out))
            .bind(&entry.photo_url)
            .bind(entry.is_starting_balance)
            .fetch_one(&mut *self.connection)
            .await?;

        Ok(row.into())
    }

    /// Insert the entry unless an identical one exists, returns whether a row was inserted.
    pub async fn create_entry_if_missing(&mut self, entry: NewEntry) -> ServiceResult<bool> {
        let result = sqlx::query(
            r#"
                INSERT INTO entries (
                    entry_date, company_id, e2in, e1in, e2out, e1out, is_starting_balance
                )
                SELECT $1, $2, $3, $4, $5, $6, $7
                WHERE NOT EXISTS (
                    SELECT 1 FROM entries
                    WHERE entry_date = $1 AND company_id = $2
                      AND e2in = $3 AND e1in = $4 AND e2out = $5 AND e1out = $6
                      AND is_starting_balance = $7
                )
            "#,
        )
        .bind(entry.entry_date)
        .bind(entry.company_id)
        .bind(count_column(entry.counts.e2_in))
        .bind(count_column(entry.counts.e1_in))
        .bind(count_column(entry.counts.e2_out))
        .bind(count_column(entry.counts.e1_out))
        .bind(entry.is_starting_balance)
        .execute(&mut *self.connection)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `None` if no entry with the given id exists.
    pub async fn update_entry(&mut self, id: i32, entry: NewEntry) -> ServiceResult<Option<Entry>> {
        let query = format!(
            r#"
                WITH e AS (
                    UPDATE entries
                    SET entry_date = $2,
                        company_id = $3,
                        e2in = $4,
                        e1in = $5,
                        e2out = $6,
                        e1out = $7,
                        photo_url = $8,
                        is_starting_balance = $9
                    WHERE id = $1
                    RETURNING *
                )
                SELECT {ENTRY_COLUMNS}
                FROM e
                JOIN companies c ON e.company_id = c.id
            "#
        );

        let row = sqlx::query_as::<_, EntryRow>(&query)
            .bind(id)
            .bind(entry.entry_date)
            .bind(entry.company_id)
            .bind(count_column(entry.counts.e2_in))
            .bind(count_column(entry.counts.e1_in))
            .bind(count_column(entry.counts.e2_out))
            .bind(count_column(entry.counts.e1_out))
            .bind(&entry.photo_url)
            .bind(entry.is_starting_balance)
            .fetch_optional(&mut *self.connection)
            .await?;

        Ok(row.map(Entry::from))
    }

    /// Deleting an id that does not exist is not an error.
    pub async fn delete_entry(&mut self, id: i32) -> ServiceResult<()> {
        self.delete_entries(&[id]).await.map(|_| ())
    }

    /// Delete all entries with one of the given ids, returns the number of deleted rows.
    pub async fn delete_entries(&mut self, ids: &[i32]) -> ServiceResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM entries WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *self.connection)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_entries_for_company(&mut self, company_id: i32) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(&mut *self.connection)
            .await?;
        Ok(count)
    }

    /// Earliest and latest entry date, both `None` for an empty table.
    pub async fn get_entry_date_range(
        &mut self,
    ) -> ServiceResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let range: (Option<NaiveDate>, Option<NaiveDate>) =
            sqlx::query_as("SELECT MIN(entry_date), MAX(entry_date) FROM entries")
                .fetch_one(&mut *self.connection)
                .await?;
        Ok(range)
    }
}

use sqlx::FromRow;

use crate::error::ServiceResult;
use crate::models::{BoxCounts, GroupStats, StatsFilter, StatsGrouping};

use super::DatabaseConnection;

#[derive(Debug, FromRow)]
struct GroupRow {
    label: String,
    total_e2in: i64,
    total_e1in: i64,
    total_e2out: i64,
    total_e1out: i64,
    entry_count: i64,
}

impl From<GroupRow> for GroupStats {
    fn from(row: GroupRow) -> Self {
        GroupStats {
            label: row.label,
            counts: BoxCounts {
                e2_in: row.total_e2in,
                e1_in: row.total_e1in,
                e2_out: row.total_e2out,
                e1_out: row.total_e1out,
            },
            entry_count: row.entry_count,
        }
    }
}

/// Label expression, join and ordering for a grouping.
fn grouping_sql(grouping: StatsGrouping) -> (&'static str, &'static str, &'static str) {
    match grouping {
        StatsGrouping::Company => (
            "c.name",
            "JOIN companies c ON e.company_id = c.id",
            "label ASC",
        ),
        StatsGrouping::Month => ("TO_CHAR(e.entry_date, 'YYYY-MM')", "", "label DESC"),
        StatsGrouping::Quarter => (
            "TO_CHAR(e.entry_date, 'YYYY') || '-Q' || TO_CHAR(e.entry_date, 'Q')",
            "",
            "label DESC",
        ),
    }
}

fn stats_query(grouping: StatsGrouping) -> String {
    let (label, join, order) = grouping_sql(grouping);
    format!(
        r#"
            SELECT
                {label} AS label,
                COALESCE(SUM(e.e2in), 0)::BIGINT AS total_e2in,
                COALESCE(SUM(e.e1in), 0)::BIGINT AS total_e1in,
                COALESCE(SUM(e.e2out), 0)::BIGINT AS total_e2out,
                COALESCE(SUM(e.e1out), 0)::BIGINT AS total_e1out,
                COUNT(*) AS entry_count
            FROM entries e
            {join}
            WHERE ($1 OR e.is_starting_balance = false)
              AND ($2::date IS NULL OR e.entry_date >= $2)
              AND ($3::date IS NULL OR e.entry_date <= $3)
            GROUP BY {label}
            ORDER BY {order}
        "#
    )
}

impl DatabaseConnection {
    /// Sum the counts of all entries matching the filter, grouped by company, month or quarter.
    pub async fn get_stats(
        &mut self,
        grouping: StatsGrouping,
        filter: StatsFilter,
    ) -> ServiceResult<Vec<GroupStats>> {
        let query = stats_query(grouping);

        let rows = sqlx::query_as::<_, GroupRow>(&query)
            .bind(filter.include_starting_balances)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&mut *self.connection)
            .await?;

        Ok(rows.into_iter().map(GroupStats::from).collect())
    }
}

use std::sync::Arc;

use handlebars::Handlebars;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::error::ServiceResult;
use crate::report;

mod companies;
mod entries;
mod migration;
mod photos;
mod settings;
mod stats;
mod users;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub templates: Arc<Handlebars<'static>>,
}

impl AppState {
    pub async fn connect(url: &str) -> ServiceResult<AppState> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        AppState::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Postgres>) -> ServiceResult<AppState> {
        let migrator = Migrator::new(migration::postgresql_migrations()).await?;
        migrator.run(&pool).await?;

        Ok(AppState {
            pool,
            templates: Arc::new(report::templates()?),
        })
    }

    pub async fn connection(&self) -> ServiceResult<DatabaseConnection> {
        let connection = self.pool.acquire().await?;
        Ok(DatabaseConnection { connection })
    }
}

pub struct DatabaseConnection {
    pub connection: PoolConnection<Postgres>,
}

impl DatabaseConnection {
    /// Round trip to check that the database is reachable.
    pub async fn ping(&mut self) -> ServiceResult<()> {
        sqlx::query("SELECT 1")
            .execute(&mut *self.connection)
            .await?;
        Ok(())
    }
}

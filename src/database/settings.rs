use crate::error::ServiceResult;
use crate::models::{Language, SETTING_INCLUDE_STARTING_BALANCES, SETTING_LANGUAGE};

use super::DatabaseConnection;

impl DatabaseConnection {
    pub async fn get_setting(&mut self, key: &str) -> ServiceResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *self.connection)
            .await?;
        Ok(value)
    }

    pub async fn set_setting(&mut self, key: &str, value: &str) -> ServiceResult<()> {
        sqlx::query(
            r#"
                INSERT INTO settings (key, value)
                VALUES ($1, $2)
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *self.connection)
        .await?;
        Ok(())
    }

    /// The stored ui language, unknown or missing values fall back to english.
    pub async fn get_language(&mut self) -> ServiceResult<Language> {
        let value = self.get_setting(SETTING_LANGUAGE).await?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or_default())
    }

    pub async fn set_language(&mut self, language: Language) -> ServiceResult<()> {
        self.set_setting(SETTING_LANGUAGE, language.as_str()).await
    }

    pub async fn get_include_starting_balances(&mut self) -> ServiceResult<bool> {
        let value = self.get_setting(SETTING_INCLUDE_STARTING_BALANCES).await?;
        Ok(include_flag(value.as_deref()))
    }

    pub async fn set_include_starting_balances(&mut self, include: bool) -> ServiceResult<()> {
        let value = if include { "true" } else { "false" };
        self.set_setting(SETTING_INCLUDE_STARTING_BALANCES, value).await
    }
}

/// Starting balances are included unless the setting is explicitly `false`.
fn include_flag(value: Option<&str>) -> bool {
    value != Some("false")
}

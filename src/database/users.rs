use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::ServiceResult;
use crate::models::User;

use super::DatabaseConnection;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    password: String,
    is_admin: bool,
    #[sqlx(rename = "emailVerified")]
    email_verified: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password,
            is_admin: row.is_admin,
            email_verified: row.email_verified,
        }
    }
}

impl DatabaseConnection {
    pub async fn get_user_by_email(&mut self, email: &str) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT id, email, name, password, is_admin, "emailVerified"
                FROM users
                WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.connection)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn get_user_by_id(&mut self, id: i32) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT id, email, name, password, is_admin, "emailVerified"
                FROM users
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.connection)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn create_user(
        &mut self,
        email: &str,
        name: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> ServiceResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                INSERT INTO users (email, name, password, is_admin)
                VALUES ($1, $2, $3, $4)
                RETURNING id, email, name, password, is_admin, "emailVerified"
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&mut *self.connection)
        .await?;

        Ok(row.into())
    }
}

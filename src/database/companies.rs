use sqlx::FromRow;

use crate::error::ServiceResult;
use crate::models::Company;

use super::DatabaseConnection;

#[derive(Debug, FromRow)]
struct CompanyRow {
    id: i32,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    balance: Option<i64>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            balance: row.balance,
        }
    }
}

impl DatabaseConnection {
    pub async fn get_all_companies(&mut self) -> ServiceResult<Vec<Company>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
                SELECT id, name, address, phone, email, balance
                FROM companies
                ORDER BY name
            "#,
        )
        .fetch_all(&mut *self.connection)
        .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    pub async fn get_company_by_id(&mut self, id: i32) -> ServiceResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
                SELECT id, name, address, phone, email, balance
                FROM companies
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.connection)
        .await?;

        Ok(row.map(Company::from))
    }

    pub async fn get_company_by_name(&mut self, name: &str) -> ServiceResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
                SELECT id, name, address, phone, email, balance
                FROM companies
                WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.connection)
        .await?;

        Ok(row.map(Company::from))
    }

    /// Insert the company if `id` is 0, update the existing row otherwise.
    pub async fn store_company(&mut self, company: Company) -> ServiceResult<Company> {
        let row = if company.id == 0 {
            sqlx::query_as::<_, CompanyRow>(
                r#"
                    INSERT INTO companies (name, address, phone, email, balance)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, name, address, phone, email, balance
                "#,
            )
            .bind(&company.name)
            .bind(&company.address)
            .bind(&company.phone)
            .bind(&company.email)
            .bind(company.balance)
            .fetch_one(&mut *self.connection)
            .await?
        } else {
            sqlx::query_as::<_, CompanyRow>(
                r#"
                    UPDATE companies
                    SET name = $2, address = $3, phone = $4, email = $5, balance = $6
                    WHERE id = $1
                    RETURNING id, name, address, phone, email, balance
                "#,
            )
            .bind(company.id)
            .bind(&company.name)
            .bind(&company.address)
            .bind(&company.phone)
            .bind(&company.email)
            .bind(company.balance)
            .fetch_one(&mut *self.connection)
            .await?
        };

        Ok(row.into())
    }

    /// Insert a company by name unless a company with that name exists.
    pub async fn ensure_company(&mut self, name: &str) -> ServiceResult<()> {
        sqlx::query("INSERT INTO companies (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *self.connection)
            .await?;
        Ok(())
    }

    pub async fn delete_company(&mut self, id: i32) -> ServiceResult<()> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *self.connection)
            .await?;
        Ok(())
    }
}

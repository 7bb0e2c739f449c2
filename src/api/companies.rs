use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Form, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/company/:id",
            get_with(get_company, get_company_docs)
                .put_with(update_company, update_company_docs)
                .delete_with(delete_company, delete_company_docs),
        )
        .api_route(
            "/companies",
            get_with(list_companies, list_companies_docs)
                .post_with(create_company, create_company_docs),
        )
        .route("/companies/form", axum::routing::post(create_company_form))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CompanyDto {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub balance: Option<i64>,
}

impl From<&models::Company> for CompanyDto {
    fn from(value: &models::Company) -> Self {
        Self {
            id: value.id,
            name: value.name.to_owned(),
            address: value.address.to_owned(),
            phone: value.phone.to_owned(),
            email: value.email.to_owned(),
            balance: value.balance,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct SaveCompanyDto {
    #[serde(default)]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub balance: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl SaveCompanyDto {
    fn into_company(self, id: i32) -> ServiceResult<models::Company> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ServiceError::BadRequest(
                "Company name is required".to_owned(),
            ));
        }

        Ok(models::Company {
            id,
            name,
            address: non_empty(self.address),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            balance: self.balance,
        })
    }
}

fn duplicate_name(error: ServiceError) -> ServiceError {
    match error {
        ServiceError::Conflict(_) => {
            ServiceError::Conflict("A company with this name already exists".to_owned())
        }
        e => e,
    }
}

async fn list_companies(mut state: RequestState) -> ServiceResult<Json<Vec<CompanyDto>>> {
    state.session_require()?;

    let companies = state.db.get_all_companies().await?;
    Ok(Json(companies.iter().map(|c| c.into()).collect()))
}

fn list_companies_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all companies ordered by name.")
        .tag("companies")
        .response::<200, Json<Vec<CompanyDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

async fn get_company(
    mut state: RequestState,
    Path(id): Path<i32>,
) -> ServiceResult<Json<CompanyDto>> {
    state.session_require()?;

    let company = state.db.get_company_by_id(id).await?;

    if let Some(company) = company {
        return Ok(Json(CompanyDto::from(&company)));
    }

    Err(ServiceError::NotFound)
}

fn get_company_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a company by id.")
        .tag("companies")
        .response::<200, Json<CompanyDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested company does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

async fn store_new_company(
    state: &mut RequestState,
    form: SaveCompanyDto,
) -> ServiceResult<CompanyDto> {
    state.session_require_admin()?;

    let company = form.into_company(0)?;
    let company = state
        .db
        .store_company(company)
        .await
        .map_err(duplicate_name)?;

    log::info!("Created company {}", company.name);
    Ok(CompanyDto::from(&company))
}

async fn create_company(
    mut state: RequestState,
    form: Json<SaveCompanyDto>,
) -> ServiceResult<Json<CompanyDto>> {
    Ok(Json(store_new_company(&mut state, form.0).await?))
}

fn create_company_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a new company.")
        .tag("companies")
        .response::<200, Json<CompanyDto>>()
        .response_with::<400, (), _>(|res| res.description("Company name is required!"))
        .response_with::<409, (), _>(|res| res.description("The company already exists!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

async fn create_company_form(
    mut state: RequestState,
    Form(form): Form<SaveCompanyDto>,
) -> ServiceResult<Json<CompanyDto>> {
    Ok(Json(store_new_company(&mut state, form).await?))
}

async fn update_company(
    mut state: RequestState,
    Path(id): Path<i32>,
    form: Json<SaveCompanyDto>,
) -> ServiceResult<Json<CompanyDto>> {
    state.session_require_admin()?;

    if state.db.get_company_by_id(id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let company = form.0.into_company(id)?;
    let company = state
        .db
        .store_company(company)
        .await
        .map_err(duplicate_name)?;

    Ok(Json(CompanyDto::from(&company)))
}

fn update_company_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update an existing company.")
        .tag("companies")
        .response::<200, Json<CompanyDto>>()
        .response_with::<400, (), _>(|res| res.description("Company name is required!"))
        .response_with::<404, (), _>(|res| res.description("The requested company does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The company name is already taken!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

async fn delete_company(
    mut state: RequestState,
    Path(id): Path<i32>,
) -> ServiceResult<StatusCode> {
    state.session_require_admin()?;

    if state.db.count_entries_for_company(id).await? > 0 {
        return Err(ServiceError::Conflict(
            "Company still has entries and cannot be deleted".to_owned(),
        ));
    }

    state.db.delete_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn delete_company_docs(op: TransformOperation) -> TransformOperation {
    op.description("Delete a company without entries.")
        .tag("companies")
        .response_with::<204, (), _>(|res| res.description("The company was deleted!"))
        .response_with::<409, (), _>(|res| res.description("The company still has entries!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(name: &str) -> SaveCompanyDto {
        SaveCompanyDto {
            name: name.to_owned(),
            address: Some("  ".to_owned()),
            phone: Some(" 123 ".to_owned()),
            email: None,
            balance: None,
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert_eq!(
            dto("   ").into_company(0),
            Err(ServiceError::BadRequest(
                "Company name is required".to_owned()
            ))
        );
    }

    #[test]
    fn test_optional_fields_are_trimmed() {
        let company = dto(" publimar ").into_company(3).unwrap();
        assert_eq!(company.id, 3);
        assert_eq!(company.name, "publimar");
        assert_eq!(company.address, None);
        assert_eq!(company.phone, Some("123".to_owned()));
    }
}

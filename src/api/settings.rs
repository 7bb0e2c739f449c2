use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Language;
use crate::request_state::RequestState;

use super::{flag_of, LenientValue};

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/settings/language",
            get_with(get_language, get_language_docs).post_with(set_language, set_language_docs),
        )
        .api_route(
            "/settings/starting-balances",
            get_with(get_starting_balances, get_starting_balances_docs)
                .post_with(set_starting_balances, set_starting_balances_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct LanguageDto {
    pub success: bool,
    pub language: String,
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct SaveLanguageDto {
    #[serde(alias = "language")]
    pub lang: String,
}

async fn get_language(mut state: RequestState) -> ServiceResult<Json<LanguageDto>> {
    state.session_require()?;

    let language = state.db.get_language().await?;
    Ok(Json(LanguageDto {
        success: true,
        language: language.as_str().to_owned(),
    }))
}

fn get_language_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get the ui language, `en` when unset.")
        .tag("settings")
        .response::<200, Json<LanguageDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

async fn set_language(
    mut state: RequestState,
    form: Json<SaveLanguageDto>,
) -> ServiceResult<Json<LanguageDto>> {
    state.session_require_admin()?;

    let language: Language = form
        .lang
        .parse()
        .map_err(|_| ServiceError::BadRequest("Invalid language code".to_owned()))?;

    state.db.set_language(language).await?;
    Ok(Json(LanguageDto {
        success: true,
        language: language.as_str().to_owned(),
    }))
}

fn set_language_docs(op: TransformOperation) -> TransformOperation {
    op.description("Set the ui language, either `en` or `pl`.")
        .tag("settings")
        .response::<200, Json<LanguageDto>>()
        .response_with::<400, (), _>(|res| res.description("Invalid language code!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct StartingBalancesSettingDto {
    pub success: bool,
    pub include: bool,
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct SaveStartingBalancesSettingDto {
    #[serde(alias = "includeStartingBalances")]
    pub include: Option<LenientValue>,
}

async fn get_starting_balances(
    mut state: RequestState,
) -> ServiceResult<Json<StartingBalancesSettingDto>> {
    state.session_require()?;

    let include = state.db.get_include_starting_balances().await?;
    Ok(Json(StartingBalancesSettingDto {
        success: true,
        include,
    }))
}

fn get_starting_balances_docs(op: TransformOperation) -> TransformOperation {
    op.description("Whether starting balances are included in statistics, `true` when unset.")
        .tag("settings")
        .response::<200, Json<StartingBalancesSettingDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

async fn set_starting_balances(
    mut state: RequestState,
    form: Json<SaveStartingBalancesSettingDto>,
) -> ServiceResult<Json<StartingBalancesSettingDto>> {
    state.session_require_admin()?;

    let include = flag_of(&form.include);
    state.db.set_include_starting_balances(include).await?;
    log::info!("Starting balances setting updated: {}", include);

    Ok(Json(StartingBalancesSettingDto {
        success: true,
        include,
    }))
}

fn set_starting_balances_docs(op: TransformOperation) -> TransformOperation {
    op.description("Include or exclude starting balances in statistics.")
        .tag("settings")
        .response::<200, Json<StartingBalancesSettingDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

use crate::database::AppState;
use crate::demo_data;
use crate::error::ServiceResult;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/seed", post_with(seed, seed_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct SeedResultDto {
    pub success: bool,
    pub message: String,
    pub inserted_entries: u64,
}

async fn seed(mut state: RequestState) -> ServiceResult<Json<SeedResultDto>> {
    state.session_require_admin()?;

    let inserted_entries = demo_data::load_demo_data(&mut state.db).await?;

    Ok(Json(SeedResultDto {
        success: true,
        message: "Database seeded successfully".to_owned(),
        inserted_entries,
    }))
}

fn seed_docs(op: TransformOperation) -> TransformOperation {
    op.description("Insert the default companies and sample entries.")
        .tag("admin")
        .response::<200, Json<SeedResultDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

use crate::database::AppState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/health", get_with(health, health_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct HealthDto {
    pub success: bool,
    pub database: String,
}

impl HealthDto {
    fn connected() -> Self {
        Self {
            success: true,
            database: "connected".to_owned(),
        }
    }

    fn disconnected() -> Self {
        Self {
            success: false,
            database: "disconnected".to_owned(),
        }
    }
}

impl OperationOutput for HealthDto {
    type Inner = HealthDto;
}
impl IntoResponse for HealthDto {
    fn into_response(self) -> axum::response::Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

async fn health(State(app_state): State<AppState>) -> HealthDto {
    let result = match app_state.connection().await {
        Ok(mut db) => db.ping().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => HealthDto::connected(),
        Err(e) => {
            log::error!("Database health check failed: {:?}", e);
            HealthDto::disconnected()
        }
    }
}

fn health_docs(op: TransformOperation) -> TransformOperation {
    op.description("Check the database connection.")
        .tag("health")
        .response::<200, Json<HealthDto>>()
        .response_with::<503, Json<HealthDto>, _>(|res| {
            res.description("The database is not reachable!")
        })
}

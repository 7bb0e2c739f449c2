use std::sync::Arc;

use aide::{
    axum::{
        routing::{get, get_with},
        ApiRouter, IntoApiResponse,
    },
    openapi::{OpenApi, Tag},
    redoc::Redoc,
    transform::TransformOpenApi,
};
use axum::{response::IntoResponse, Extension, Json};

const TAGS: [(&str, &str); 10] = [
    ("auth", "Login and session handling"),
    ("companies", "Company management"),
    ("entries", "Box intake and output entries"),
    ("stats", "Aggregated balances"),
    ("settings", "Application settings"),
    ("import", "CSV import"),
    ("reports", "Reports over a date range"),
    ("photos", "Delivery note photos"),
    ("admin", "Demo data"),
    ("health", "Database health check"),
];

pub fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    let api = api
        .title("box-ledger")
        .summary("Box intake and output ledger")
        .description("Tracks E1 and E2 boxes exchanged with companies and reports their balances.");

    TAGS.iter()
        .fold(api, |api, (name, description)| {
            api.tag(Tag {
                name: (*name).into(),
                description: Some((*description).into()),
                ..Default::default()
            })
        })
        .security_scheme(
            "SessionToken",
            aide::openapi::SecurityScheme::ApiKey {
                location: aide::openapi::ApiKeyLocation::Header,
                name: "Authorization".into(),
                description: Some(
                    "A session token from `/auth/login` as `Bearer <token>`. The `session` cookie is accepted as well."
                        .into(),
                ),
                extensions: Default::default(),
            },
        )
}

pub fn docs_routes() -> ApiRouter {
    // Response inference sets the `text/html` content type of the redoc page.
    aide::gen::infer_responses(true);

    let router = ApiRouter::new()
        .api_route(
            "/",
            get_with(
                Redoc::new("/docs/api.json")
                    .with_title("box-ledger")
                    .axum_handler(),
                |op| op.description("This documentation page."),
            ),
        )
        .route("/api.json", get(serve_docs));

    // Inference might be incorrect for the other routes.
    aide::gen::infer_responses(false);

    router
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

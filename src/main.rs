use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::Extension;
use tower_http::cors::{Any, CorsLayer};

use crate::database::AppState;
use crate::error::ServiceResult;

mod api;
mod database;
mod demo_data;
mod docs;
mod env;
mod error;
mod import;
mod models;
mod report;
mod request_state;
mod session;

#[tokio::main]
async fn main() {
    let result = init().await;

    let exit_code = match result {
        Ok(_) => 0,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn init() -> ServiceResult<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app_state = AppState::connect(env::DATABASE_URL.as_str()).await?;
    log::info!("Database connection established");

    create_admin_user(&app_state).await?;

    let mut api = OpenApi::default();
    let app = ApiRouter::new()
        .nest_api_service("/api/v1", api::init(app_state))
        .nest_api_service("/docs", docs::docs_routes())
        .finish_api_with(&mut api, docs::api_docs)
        .layer(Extension(Arc::new(api)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let address = format!("{}:{}", env::API_HOST.as_str(), env::API_PORT.as_str());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("Listening on http://{}", address);
    log::info!("Api documentation on http://{}/docs", address);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the configured admin user on first start.
async fn create_admin_user(app_state: &AppState) -> ServiceResult<()> {
    let (email, password) = match (env::ADMIN_EMAIL.as_ref(), env::ADMIN_PASSWORD.as_ref()) {
        (Some(email), Some(password)) => (email, password),
        _ => return Ok(()),
    };

    let mut db = app_state.connection().await?;
    if db.get_user_by_email(email).await?.is_some() {
        return Ok(());
    }

    let hash = api::password_hash_create(password)?;
    db.create_user(email, env::ADMIN_NAME.as_str(), &hash, true)
        .await?;
    log::info!("Created admin user '{}'", email);

    Ok(())
}

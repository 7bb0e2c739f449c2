use aide::axum::routing::{delete_with, get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;
use crate::session::{self, SESSION_COOKIE_NAME};
use crate::env;

use super::password_hash_verify;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/auth/login", post_with(auth_login, auth_login_docs))
        .api_route(
            "/auth/account",
            get_with(auth_get_account, auth_get_account_docs),
        )
        .api_route("/auth", delete_with(auth_delete, auth_delete_docs))
        .with_state(app_state)
}

fn session_cookie(value: &str, max_age: Option<i64>) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/api/v1; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, value
    );
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if *env::COOKIE_SECURE {
        cookie.push_str("; Secure");
    }

    match HeaderValue::from_str(&cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Could not build session cookie: {}", e);
            None
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

impl From<&models::User> for UserDto {
    fn from(value: &models::User) -> Self {
        Self {
            id: value.id,
            email: value.email.to_owned(),
            name: value.name.to_owned(),
            is_admin: value.is_admin,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct AuthTokenDto {
    pub token: String,
    pub valid_until: DateTime<Utc>,
    pub user: UserDto,
}

impl OperationOutput for AuthTokenDto {
    type Inner = AuthTokenDto;
}
impl IntoResponse for AuthTokenDto {
    fn into_response(self) -> axum::response::Response {
        let max_age = (self.valid_until - Utc::now()).num_seconds().max(0);

        let mut header = HeaderMap::new();
        if let Some(cookie) = session_cookie(&self.token, Some(max_age)) {
            header.insert(header::SET_COOKIE, cookie);
        }
        (StatusCode::OK, header, Json(self)).into_response()
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct AuthLoginDto {
    pub email: String,
    pub password: String,
}

async fn auth_login(
    mut state: RequestState,
    form: Json<AuthLoginDto>,
) -> ServiceResult<AuthTokenDto> {
    let form = form.0;
    let user = state.db.get_user_by_email(form.email.trim()).await?;

    if let Some(user) = user {
        if password_hash_verify(&user.password_hash, &form.password)? {
            let session = session::create_session(&user)?;
            log::info!("User {} logged in", user.email);

            return Ok(AuthTokenDto {
                token: session.token,
                valid_until: session.valid_until,
                user: UserDto::from(&user),
            });
        }
    }

    Err(ServiceError::Unauthorized("Invalid email or password"))
}

fn auth_login_docs(op: TransformOperation) -> TransformOperation {
    op.description("Login with email and password.")
        .tag("auth")
        .response::<200, Json<AuthTokenDto>>()
        .response_with::<401, (), _>(|res| res.description("Invalid email or password!"))
}

pub struct LogoutResponse;

impl OperationOutput for LogoutResponse {
    type Inner = ();
}
impl IntoResponse for LogoutResponse {
    fn into_response(self) -> axum::response::Response {
        let mut header = HeaderMap::new();
        if let Some(cookie) = session_cookie("", Some(0)) {
            header.insert(header::SET_COOKIE, cookie);
        }
        (StatusCode::NO_CONTENT, header).into_response()
    }
}

async fn auth_delete() -> LogoutResponse {
    LogoutResponse
}

fn auth_delete_docs(op: TransformOperation) -> TransformOperation {
    op.description("Logout the current session by clearing the session cookie.")
        .tag("auth")
        .response_with::<204, (), _>(|res| res.description("Logout was successfull!"))
}

async fn auth_get_account(mut state: RequestState) -> ServiceResult<Json<UserDto>> {
    let user_id = state.session_require()?.user_id;

    let user = state.db.get_user_by_id(user_id).await?;

    if let Some(user) = user {
        return Ok(Json(UserDto::from(&user)));
    }

    Err(ServiceError::Unauthorized("Not authenticated"))
}

fn auth_get_account_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get the user of the current session.")
        .tag("auth")
        .response::<200, Json<UserDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement("SessionToken")
}

use std::sync::Arc;

use aide::OperationInput;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::TypedHeader;
use handlebars::Handlebars;
use headers::{authorization::Bearer, Authorization, Cookie};

use crate::{
    database::{AppState, DatabaseConnection},
    error::{ServiceError, ServiceResult},
    models::Session,
    session::{self, SESSION_COOKIE_NAME},
};

/// Per request state: a pooled database connection and the optional caller session.
pub struct RequestState {
    pub db: DatabaseConnection,
    pub session: Option<Session>,
    pub templates: Arc<Handlebars<'static>>,
}

impl RequestState {
    pub fn session_require(&self) -> ServiceResult<&Session> {
        self.session
            .as_ref()
            .ok_or(ServiceError::Unauthorized("Not authenticated"))
    }

    pub fn session_require_admin(&self) -> ServiceResult<&Session> {
        let session = self.session_require()?;
        if !session.is_admin {
            return Err(ServiceError::Forbidden);
        }
        Ok(session)
    }
}

/// Restore the session from the bearer token, falling back to the session cookie. Invalid
/// tokens are treated like missing ones.
async fn restore_session(parts: &mut Parts) -> Option<Session> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        parts.extract::<TypedHeader<Authorization<Bearer>>>().await
    {
        if let Ok(session) = session::get_session_by_token(bearer.token()) {
            return Some(session);
        }
    }

    if let Ok(TypedHeader(cookie)) = parts.extract::<TypedHeader<Cookie>>().await {
        if let Some(token) = cookie.get(SESSION_COOKIE_NAME) {
            return session::get_session_by_token(token).ok();
        }
    }

    None
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestState
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let db = state.connection().await?;

        // Routes decide if a session is required.
        let session = restore_session(parts).await;

        Ok(Self {
            db,
            session,
            templates: state.templates.clone(),
        })
    }
}

impl OperationInput for RequestState {}

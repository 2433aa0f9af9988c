//! Request handlers.
//!
//! Handlers on protected routes take the [`BearerAuth`] extractor first,
//! so an unusable or unverifiable token short-circuits with a 401 before
//! any handler logic runs. Record ids are positional indices; the path
//! segment must parse as a non-negative integer before the store is
//! consulted.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use roster_auth::{AuthError, BearerAuth, LoginRequest, LoginResponse};
use roster_store::{StoreError, UserRecord};

use crate::server::AppState;

/// Errors surfaced by the handler layer.
///
/// Everything renders as the service's `{"error": "..."}` body shape.
#[derive(Debug)]
pub enum ApiError {
    /// The request payload or path is unusable.
    BadRequest(String),

    /// A record store operation failed.
    Store(StoreError),

    /// An authentication operation failed.
    Auth(AuthError),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Store(err) => {
                if err.is_not_found() {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "error": err.to_string() })),
                    )
                        .into_response()
                } else {
                    // Load/persist detail goes to the log, not the caller.
                    tracing::error!(error = %err, "record store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Storage failure" })),
                    )
                        .into_response()
                }
            }
            Self::Auth(err) => err.into_response(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

/// `GET /healthz` — liveness probe, unauthenticated.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `POST /login` — delegates credential verification to Cognito.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body?;
    let tokens = state
        .login
        .initiate_auth(&request.username, &request.password)
        .await?;
    Ok(Json(tokens))
}

/// `GET /profile` — a probe for the authenticated caller's identity.
pub async fn profile(BearerAuth(claims): BearerAuth) -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "sub": claims.subject(),
    }))
}

/// `GET /users` — the full record sequence.
pub async fn list_users(
    _auth: BearerAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.store.load_all().await?;
    Ok(Json(users))
}

/// `GET /users/{id}` — a single record by index.
pub async fn get_user(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    let index = parse_index(&id)?;
    let user = state.store.get(index).await?;
    Ok(Json(user))
}

/// `POST /users` — appends a record.
pub async fn create_user(
    _auth: BearerAuth,
    State(state): State<AppState>,
    body: Result<Json<UserRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), ApiError> {
    let Json(record) = body?;
    let index = state.store.create(record.clone()).await?;
    tracing::debug!(index, "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /users/{id}` — replaces the record at an index.
pub async fn update_user(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserRecord>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let index = parse_index(&id)?;
    let Json(record) = body?;
    state.store.update(index, record.clone()).await?;
    tracing::debug!(index, "record updated");
    Ok(Json(record))
}

/// `DELETE /users/{id}` — removes the record at an index.
///
/// Every record after the removed one shifts down by one position.
pub async fn delete_user(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let index = parse_index(&id)?;
    state.store.delete(index).await?;
    tracing::debug!(index, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Parses a path segment as a record index.
///
/// Negative or non-integer segments are a 400, not a 404: the store is
/// never consulted for an id that cannot name a position.
fn parse_index(id: &str) -> Result<usize, ApiError> {
    id.parse::<usize>()
        .map_err(|_| ApiError::bad_request(format!("Invalid record id {id:?}")))
}

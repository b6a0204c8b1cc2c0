//! Local HTTP front-end for the note service.
//!
//! # Overview
//! Five routes (`/create`, `/get`, `/index`, `/update`, `/delete`) that check
//! the HTTP method, pull parameters out of the form body or query string,
//! call the shared `Session` and write the result back as JSON.
//!
//! # Design
//! - The session is injected through axum `State`; it is never mutated, so
//!   one `Arc` serves every request.
//! - `Session` calls block, so each one runs on tokio's blocking pool.
//! - A wrong method answers 405 with `"<METHOD> is not allowed"`, HEAD
//!   included.
//! - A POST without a form content type reads as empty content; only a
//!   malformed form body is an error.
//! - `/delete` accepts DELETE (hard delete) and POST (move to trash) for
//!   callers that cannot send DELETE.

pub mod config;
pub mod error;

use std::num::IntErrorKind;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{on, post, MethodFilter},
    Json, Router,
};
use serde::Deserialize;
use simplenote_core::{
    ApiError, IndexListing, Note, Session, Transport, DEFAULT_INDEX_LENGTH, MAX_INDEX_LENGTH,
};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, GatewayConfig, LogConfig};
pub use error::GatewayError;

pub type SharedSession<T> = Arc<Session<T>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyParams {
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    pub length: Option<String>,
    pub since: String,
    pub mark: String,
}

impl IndexParams {
    /// Missing `length` means the default page size. An unparsable one
    /// counts as 0 and a too-large one as the maximum; the client clamps both.
    pub fn limit(&self) -> i64 {
        match self.length.as_deref() {
            Some(value) if !value.is_empty() => match value.parse() {
                Ok(limit) => limit,
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => MAX_INDEX_LENGTH,
                Err(_) => 0,
            },
            _ => DEFAULT_INDEX_LENGTH,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentForm {
    pub content: String,
}

impl ContentForm {
    /// A body that is not form-encoded carries no content. A form body that
    /// fails to decode is an error.
    pub fn from_extracted(form: Result<Form<Self>, FormRejection>) -> Result<Self, GatewayError> {
        match form {
            Ok(Form(form)) => Ok(form),
            Err(FormRejection::InvalidFormContentType(_)) => Ok(Self::default()),
            Err(rejection) => {
                tracing::warn!(%rejection, "rejected form body");
                Err(GatewayError::BadForm)
            }
        }
    }
}

/// The five note routes, unprefixed.
pub fn app<T>(session: SharedSession<T>) -> Router
where
    T: Transport + Send + Sync + 'static,
{
    Router::new()
        .route("/create", post(create_note::<T>).fallback(reject_method))
        .route("/get", on(MethodFilter::GET, get_note::<T>).fallback(reject_method))
        .route("/index", on(MethodFilter::GET, index_notes::<T>).fallback(reject_method))
        .route("/update", post(update_note::<T>).fallback(reject_method))
        .route(
            "/delete",
            post(trash_note::<T>)
                .delete(delete_note::<T>)
                .fallback(reject_method),
        )
        .with_state(session)
}

/// `app` nested under `prefix`, with request tracing.
pub fn router<T>(session: SharedSession<T>, prefix: &str) -> Router
where
    T: Transport + Send + Sync + 'static,
{
    let routes = app(session);
    let prefix = prefix.trim_end_matches('/');
    let router = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    router.layer(TraceLayer::new_for_http())
}

async fn reject_method(method: Method) -> (StatusCode, String) {
    (StatusCode::METHOD_NOT_ALLOWED, format!("{method} is not allowed"))
}

/// Run a blocking client call off the async workers.
async fn run_blocking<T, R, F>(session: SharedSession<T>, call: F) -> Result<R, GatewayError>
where
    T: Transport + Send + Sync + 'static,
    R: Send + 'static,
    F: FnOnce(&Session<T>) -> Result<R, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&session))
        .await
        .map_err(|e| GatewayError::Task(e.to_string()))?
        .map_err(GatewayError::from)
}

async fn create_note<T>(
    State(session): State<SharedSession<T>>,
    form: Result<Form<ContentForm>, FormRejection>,
) -> Result<Json<Note>, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    let form = ContentForm::from_extracted(form)?;
    let note = run_blocking(session, move |s| s.add(&form.content, &[])).await?;
    Ok(Json(note))
}

async fn get_note<T>(
    State(session): State<SharedSession<T>>,
    Query(params): Query<KeyParams>,
) -> Result<Json<Note>, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    let note = run_blocking(session, move |s| s.get(&params.key)).await?;
    Ok(Json(note))
}

async fn index_notes<T>(
    State(session): State<SharedSession<T>>,
    Query(params): Query<IndexParams>,
) -> Result<Json<IndexListing>, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    let limit = params.limit();
    let listing = run_blocking(session, move |s| s.index(limit, &params.since, &params.mark)).await?;
    tracing::info!(count = listing.count, "returning index");
    Ok(Json(listing))
}

async fn update_note<T>(
    State(session): State<SharedSession<T>>,
    Query(params): Query<KeyParams>,
    form: Result<Form<ContentForm>, FormRejection>,
) -> Result<Json<Note>, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    let form = ContentForm::from_extracted(form)?;
    let note = run_blocking(session, move |s| s.update(&params.key, &form.content, false)).await?;
    Ok(Json(note))
}

/// POST on `/delete`: move the note to the trash.
async fn trash_note<T>(
    State(session): State<SharedSession<T>>,
    Query(params): Query<KeyParams>,
) -> Result<Response, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    let note = run_blocking(session, move |s| s.update(&params.key, "", true)).await?;
    if note.key.is_empty() {
        return Ok("OK".into_response());
    }
    Ok(Json(note).into_response())
}

/// DELETE on `/delete`: remove the note for good.
async fn delete_note<T>(
    State(session): State<SharedSession<T>>,
    Query(params): Query<KeyParams>,
) -> Result<&'static str, GatewayError>
where
    T: Transport + Send + Sync + 'static,
{
    run_blocking(session, move |s| s.delete(&params.key)).await?;
    Ok("OK")
}

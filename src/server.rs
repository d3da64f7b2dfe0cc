//! JSON HTTP surface over the forge manager and the changelog generators.
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{
    error::MergelogError,
    forge::{factory::ForgeFactory, manager::ForgeManager},
    narrative::NarrativeGenerator,
    result::Result,
    types::{DateWindow, PullRequest, ReleaseFilter, RepoRef, Visibility},
};

/// Error body message for any failed pull request fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch pull requests";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub forges: ForgeFactory,
    pub narrative: Arc<NarrativeGenerator>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

/// Wrapper to make MergelogError usable as an axum error response.
struct ApiErr(MergelogError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MergelogError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            MergelogError::FetchFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                FETCH_FAILED_MESSAGE.to_string(),
            ),
            MergelogError::UpstreamTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, self.0.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };

        if status.is_server_error() {
            error!("{}", self.0);
        }

        (status, Json(ApiError { error: message })).into_response()
    }
}

impl From<MergelogError> for ApiErr {
    fn from(err: MergelogError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(MergelogError::invalid_input(rejection.body_text()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoRequest {
    owner: Option<String>,
    repo: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullsRequest {
    owner: Option<String>,
    repo: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangelogRequest {
    pull_requests: Option<Vec<PullRequest>>,
    start_date: Option<String>,
    end_date: Option<String>,
    repo_name: Option<String>,
    custom_style: Option<String>,
    #[serde(default)]
    release_filter: ReleaseFilter,
}

#[derive(Debug, Serialize)]
struct ValidateResponse {
    valid: bool,
}

#[derive(Debug, Serialize)]
struct VisibilityResponse {
    valid: bool,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullsResponse {
    pull_requests: Vec<PullRequest>,
}

#[derive(Debug, Serialize)]
struct ChangelogResponse {
    changelog: String,
}

/// Returns a required, non-blank string field.
fn required<'a>(
    value: &'a Option<String>,
    field: &str,
) -> std::result::Result<&'a str, ApiErr> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiErr(MergelogError::invalid_input(format!("{field} is required")))
        })
}

impl AppState {
    fn manager(
        &self,
        owner: &Option<String>,
        repo: &Option<String>,
        token: &Option<String>,
    ) -> std::result::Result<ForgeManager, ApiErr> {
        let repo =
            RepoRef::new(required(owner, "owner")?, required(repo, "repo")?);

        self.forges
            .create(repo, token.clone())
            .map_err(|err| ApiErr(MergelogError::Other(err)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/validate", post(validate))
        .route("/check-visibility", post(check_visibility))
        .route("/pulls", post(pulls))
        .route("/changelog", post(changelog))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `bind` and serves the API until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("listening on http://{}", listener.local_addr()?);

    if !state.narrative.ai_enabled() {
        info!("narrative changelogs disabled: using automatic categorization");
    }

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn validate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RepoRequest>, JsonRejection>,
) -> std::result::Result<Json<ValidateResponse>, ApiErr> {
    let Json(req) = payload?;
    let manager = state.manager(&req.owner, &req.repo, &req.token)?;

    Ok(Json(ValidateResponse {
        valid: manager.validate().await,
    }))
}

async fn check_visibility(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RepoRequest>, JsonRejection>,
) -> std::result::Result<Json<VisibilityResponse>, ApiErr> {
    let Json(req) = payload?;
    let manager = state.manager(&req.owner, &req.repo, &req.token)?;
    let visibility = manager.check_visibility().await;

    Ok(Json(VisibilityResponse {
        valid: visibility != Visibility::NotFound,
        visibility,
    }))
}

async fn pulls(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PullsRequest>, JsonRejection>,
) -> std::result::Result<Json<PullsResponse>, ApiErr> {
    let Json(req) = payload?;

    let window = DateWindow::parse(
        required(&req.start_date, "startDate")?,
        required(&req.end_date, "endDate")?,
    )?;

    let manager = state.manager(&req.owner, &req.repo, &req.token)?;
    let pull_requests = manager.fetch_pull_requests(&window).await?;

    info!("fetched {} merged pull requests", pull_requests.len());

    Ok(Json(PullsResponse { pull_requests }))
}

async fn changelog(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChangelogRequest>, JsonRejection>,
) -> std::result::Result<Json<ChangelogResponse>, ApiErr> {
    let Json(req) = payload?;

    let pulls = req.pull_requests.ok_or_else(|| {
        ApiErr(MergelogError::invalid_input("pullRequests is required"))
    })?;
    let window = DateWindow::parse(
        required(&req.start_date, "startDate")?,
        required(&req.end_date, "endDate")?,
    )?;
    let repo_name = required(&req.repo_name, "repoName")?;

    let pulls = req.release_filter.apply(pulls);

    let changelog = state
        .narrative
        .generate(&pulls, &window, repo_name, req.custom_style.as_deref())
        .await;

    Ok(Json(ChangelogResponse { changelog }))
}

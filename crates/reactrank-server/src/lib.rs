//! HTTP API for reactrank.
//!
//! Records visual and auditory test results, registers users, and serves
//! percentile ranks and trimmed statistics as JSON.

use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequest, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use reactrank_core::{
    Modality, RankError, RankService, Stimulus, TestSubmission, UserId, UserProfile,
};

/// Shared server state.
struct AppState {
    service: RankService,
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct UserParams {
    user: Option<String>,
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    id: String,
    nickname: String,
    age: Option<u32>,
    sex: Option<String>,
    phone: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    success: bool,
    user_id: String,
}

#[derive(Deserialize)]
struct VisualRequest {
    #[serde(default)]
    user: String,
    value: Option<f64>,
    #[serde(default)]
    samples: Vec<f64>,
    lightness: Option<f64>,
    chroma: Option<f64>,
    hue: Option<f64>,
}

#[derive(Deserialize)]
struct AuditoryRequest {
    #[serde(default)]
    user: String,
    value: Option<f64>,
    #[serde(default)]
    samples: Vec<f64>,
    frequency: Option<f64>,
}

#[derive(Serialize)]
struct RecordResponse {
    success: bool,
    value: f64,
    recorded_at: u64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    summaries: Vec<SummaryStatus>,
}

#[derive(Serialize)]
struct SummaryStatus {
    modality: Modality,
    cached: bool,
    sample_count: Option<usize>,
    computed_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// [`RankError`] rendered as a JSON error body with a matching status.
struct ApiError(RankError);

impl From<RankError> for ApiError {
    fn from(err: RankError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RankError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RankError::NotFound { .. } => StatusCode::NOT_FOUND,
            RankError::Conflict(_) => StatusCode::CONFLICT,
            RankError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("{} {}", status.as_u16(), self.0);
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// [`Json`] body extractor that rejects malformed bodies as [`ApiError`].
struct JsonBody<T>(T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(RankError::InvalidInput(rejection.body_text())))?;
        Ok(Self(value))
    }
}

fn required_user(params: &UserParams) -> Result<UserId, RankError> {
    UserId::parse(params.user.as_deref().unwrap_or_default())
}

fn optional_user(params: &UserParams) -> Result<Option<UserId>, RankError> {
    match params.user.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => UserId::parse(raw).map(Some),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    let id = UserId::parse(&req.id)?;
    state.service.register(UserProfile {
        id: id.clone(),
        nickname: req.nickname,
        age: req.age,
        sex: req.sex,
        phone: req.phone,
    })?;
    Ok(Json(RegisterResponse {
        success: true,
        user_id: id.to_string(),
    }))
}

fn record(
    state: &AppState,
    user: &str,
    modality: Modality,
    submission: TestSubmission,
) -> ApiResult<RecordResponse> {
    let user = UserId::parse(user)?;
    let m = state.service.record(user, modality, submission)?;
    Ok(Json(RecordResponse {
        success: true,
        value: m.value,
        recorded_at: m.recorded_at,
    }))
}

async fn handle_visual(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<VisualRequest>,
) -> ApiResult<RecordResponse> {
    let stimulus = Stimulus {
        lightness: req.lightness,
        chroma: req.chroma,
        hue: req.hue,
        frequency: None,
    };
    let submission = TestSubmission {
        value: req.value,
        samples: req.samples,
        stimulus: Some(stimulus).filter(|s| !s.is_empty()),
    };
    record(&state, &req.user, Modality::Visual, submission)
}

async fn handle_auditory(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AuditoryRequest>,
) -> ApiResult<RecordResponse> {
    let stimulus = Stimulus {
        frequency: req.frequency,
        ..Default::default()
    };
    let submission = TestSubmission {
        value: req.value,
        samples: req.samples,
        stimulus: Some(stimulus).filter(|s| !s.is_empty()),
    };
    record(&state, &req.user, Modality::Auditory, submission)
}

async fn handle_rank(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> ApiResult<reactrank_core::RankReport> {
    let user = required_user(&params)?;
    Ok(Json(state.service.rank(&user)?))
}

async fn handle_result(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = required_user(&params)?;
    let latest = state.service.latest_results(&user)?;
    Ok(Json(serde_json::json!({
        "visual": latest.visual.samples,
        "auditory": latest.auditory.samples,
    })))
}

async fn handle_statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> ApiResult<reactrank_core::StatisticsReport> {
    let user = optional_user(&params)?;
    Ok(Json(state.service.statistics(user.as_ref())?))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let mut summaries = Vec::with_capacity(Modality::ALL.len());
    for modality in Modality::ALL {
        let cached = state.service.cache().peek(modality)?;
        summaries.push(SummaryStatus {
            modality,
            cached: cached.is_some(),
            sample_count: cached.as_ref().map(|s| s.sample_count),
            computed_at: cached.as_ref().map(|s| s.computed_at),
        });
    }
    Ok(Json(HealthResponse {
        status: "ok",
        summaries,
    }))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "reactrank",
        "version": reactrank_core::VERSION,
        "stats_ttl_secs": state.service.cache().ttl().as_secs(),
        "endpoints": {
            "/": "This API index",
            "/health": "Health check with cached summary ages",
            "/api/user": {
                "method": "POST",
                "body": "{id, nickname, age?, sex?, phone?}",
            },
            "/api/visual": {
                "method": "POST",
                "body": "{user, value? | samples, lightness?, chroma?, hue?}",
            },
            "/api/auditory": {
                "method": "POST",
                "body": "{user, value? | samples, frequency?}",
            },
            "/api/rank": {
                "method": "GET",
                "params": { "user": "User id (required)" },
            },
            "/api/result": {
                "method": "GET",
                "params": { "user": "User id (required)" },
            },
            "/api/statistics": {
                "method": "GET",
                "params": { "user": "User id (optional; global statistics when absent)" },
            },
        },
    }))
}

/// Build the axum router.
pub fn build_router(service: RankService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/user", post(handle_register))
        .route("/api/visual", post(handle_visual))
        .route("/api/auditory", post(handle_auditory))
        .route("/api/rank", get(handle_rank))
        .route("/api/result", get(handle_result))
        .route("/api/statistics", get(handle_statistics))
        .with_state(state)
}

/// Run the HTTP server until ctrl-c.
pub async fn run_server(service: RankService, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(service);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}

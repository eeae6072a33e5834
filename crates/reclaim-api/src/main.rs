//! reclaim-api - HTTP API server for the reclaim handover coordinator

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use reclaim_clients::{
    CollaboratorConfig, HttpFoundRecordService, HttpLostRecordService, HttpNotificationService,
    HttpUserDirectoryService,
};
use reclaim_core::defaults::{self, MatchTuning};
use reclaim_core::{
    Caller, CreateHandoverRequest, Error, FoundRecordService, HandoverRecord, HandoverStore,
    LostRecordService, NotificationService, ReasonRequest, Role, ScheduleRequest,
    UserDirectoryService,
};
use reclaim_handover::{HandoverWorkflow, Notifier};
use reclaim_match::MatchEngine;
use reclaim_store::{InMemoryCandidateStore, InMemoryHandoverStore};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so request IDs sort chronologically in
/// logs, which keeps cross-collaborator correlation cheap.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    workflow: Arc<HandoverWorkflow>,
    engine: Arc<MatchEngine>,
    /// Item collaborators, used directly only for list-view title lookups.
    lost: Arc<dyn LostRecordService>,
    found: Arc<dyn FoundRecordService>,
    tuning: MatchTuning,
}

// =============================================================================
// STANDARD RESPONSE TYPES
// =============================================================================

/// Pagination metadata attached to every list response.
#[derive(Serialize, Deserialize, Debug)]
pub struct PaginationMeta {
    /// Total number of items matching the query (across all pages)
    pub total: usize,
    /// Maximum number of items per page (request parameter)
    pub limit: usize,
    /// Number of items skipped (request parameter)
    pub offset: usize,
    /// True if more items are available after this page
    pub has_more: bool,
}

/// List response wrapper with pagination metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        let has_more = offset + data.len() < total;
        Self {
            data,
            pagination: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        }
    }
}

/// One handover in the admin listing, with item titles resolved for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HandoverSummary {
    #[serde(flatten)]
    record: HandoverRecord,
    lost_title: String,
    found_title: String,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopNQuery {
    top_n: Option<usize>,
}

// =============================================================================
// CORS CONFIGURATION HELPER
// =============================================================================

/// Parse allowed origins from a comma-separated environment variable.
///
/// `ALLOWED_ORIGINS` holds the whitelist; unset or empty falls back to the
/// local portal dev origin. Invalid entries are skipped with a warning.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static("http://localhost:3000")];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,reclaim_api=debug,reclaim_handover=debug,reclaim_match=debug,reclaim_clients=debug,reclaim_store=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("reclaim-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| defaults::SERVER_PORT.to_string())
        .parse()
        .unwrap_or(defaults::SERVER_PORT);

    let collaborators = CollaboratorConfig::from_env();
    info!(
        lost_url = %collaborators.lost_url,
        found_url = %collaborators.found_url,
        notification_url = %collaborators.notification_url,
        user_url = %collaborators.user_url,
        timeout_secs = collaborators.timeout_secs,
        "Collaborator endpoints configured"
    );

    let tuning = MatchTuning::from_env();
    info!(
        top_n = tuning.top_n,
        bulk_fetch_size = tuning.bulk_fetch_size,
        "Match tuning loaded"
    );

    // Stores
    let store = Arc::new(InMemoryHandoverStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());

    // Collaborator clients. The item clients take the bulk fetch size so the
    // matching scan and the tuning knob stay in step.
    let lost: Arc<dyn LostRecordService> = Arc::new(HttpLostRecordService::new(
        collaborators.lost_url.clone(),
        collaborators.timeout_secs,
        tuning.bulk_fetch_size,
    ));
    let found: Arc<dyn FoundRecordService> = Arc::new(HttpFoundRecordService::new(
        collaborators.found_url.clone(),
        collaborators.timeout_secs,
        tuning.bulk_fetch_size,
    ));
    let notifications: Arc<dyn NotificationService> =
        Arc::new(HttpNotificationService::from_config(&collaborators));
    let users: Arc<dyn UserDirectoryService> =
        Arc::new(HttpUserDirectoryService::from_config(&collaborators));

    // Core services
    let notifier = Notifier::new(notifications, users);
    let workflow = Arc::new(HandoverWorkflow::new(
        Arc::clone(&store) as Arc<dyn HandoverStore>,
        Arc::clone(&lost),
        Arc::clone(&found),
        notifier,
    ));
    let engine = Arc::new(MatchEngine::new(
        Arc::clone(&lost),
        Arc::clone(&found),
        candidates,
    ));

    let state = AppState {
        workflow,
        engine,
        lost,
        found,
        tuning,
    };

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Handover lifecycle
        .route("/handovers", post(create_handover).get(list_handovers))
        .route("/handovers/count", get(count_handovers))
        .route("/handovers/my-requests", get(my_requests))
        .route("/handovers/my-responses", get(my_responses))
        .route("/handovers/:id", get(get_handover))
        .route("/handovers/:id/accept", post(accept_handover))
        .route("/handovers/:id/reject", post(reject_handover))
        .route("/handovers/:id/verify", post(verify_handover))
        .route("/handovers/:id/approve", post(approve_handover))
        .route("/handovers/:id/schedule", post(schedule_handover))
        .route("/handovers/:id/complete", post(complete_handover))
        .route("/handovers/:id/cancel", post(cancel_handover))
        // Matching queries
        .route("/matching/lost/:lost_id", get(match_for_lost))
        .route("/matching/found/:found_id", get(match_for_found))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static("x-user-id"),
                    HeaderName::from_static("x-user-role"),
                ])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(defaults::CORS_MAX_AGE_SECS))
        })
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_SIZE_BYTES))
        .with_state(state)
}

// =============================================================================
// CALLER IDENTITY
// =============================================================================

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Builds the caller identity from the gateway-set headers.
///
/// `X-User-Id` is required on every operation that mutates or is scoped to
/// a user; `X-User-Role` is optional. Values are trusted as-is, only
/// presence and shape are checked here.
fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, ApiError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("missing X-User-Id header".to_string()))?;
    let user_id: i64 = raw.trim().parse().map_err(|_| {
        ApiError::Unauthenticated(format!("invalid X-User-Id header: {}", raw))
    })?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<Role>().ok());

    Ok(match role {
        Some(role) => Caller::with_role(user_id, role),
        None => Caller::new(user_id),
    })
}

// =============================================================================
// SYSTEM HANDLERS
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// HANDOVER HANDLERS
// =============================================================================

async fn create_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateHandoverRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_handover(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.workflow.get(id).await?;
    Ok(Json(record))
}

async fn my_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let records = state.workflow.my_requests(&caller).await?;
    Ok(Json(records))
}

async fn my_responses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let records = state.workflow.my_responses(&caller).await?;
    Ok(Json(records))
}

async fn list_handovers(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(defaults::PAGE_LIMIT)
        .clamp(1, defaults::PAGE_LIMIT_MAX);
    let offset = query.offset.unwrap_or(defaults::PAGE_OFFSET);

    let (records, total) = state.workflow.list(limit, offset).await?;
    let summaries = enrich_page(&state, records).await;
    Ok(Json(ListResponse::new(summaries, total, limit, offset)))
}

async fn count_handovers(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = completion_window(&query)?;
    let count = state.workflow.count_completed(window).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

async fn accept_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.accept(&caller, id).await?;
    Ok(Json(record))
}

async fn reject_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ReasonRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let reason = body.and_then(|Json(r)| r.reason);
    let record = state.workflow.reject(&caller, id, reason).await?;
    Ok(Json(record))
}

async fn verify_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.verify(&caller, id).await?;
    Ok(Json(record))
}

async fn approve_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.approve(&caller, id).await?;
    Ok(Json(record))
}

async fn schedule_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<ScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.schedule(&caller, id, request).await?;
    Ok(Json(record))
}

async fn complete_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let record = state.workflow.complete(&caller, id).await?;
    Ok(Json(record))
}

async fn cancel_handover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ReasonRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let reason = body.and_then(|Json(r)| r.reason);
    let record = state.workflow.cancel(&caller, id, reason).await?;
    Ok(Json(record))
}

/// Turns the optional `start`/`end` day range into a UTC window, inclusive
/// of the start day and exclusive of the day after the end day. An inverted
/// range stays as-is; the resulting empty window counts zero records.
fn completion_window(
    query: &CountQuery,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ApiError> {
    let (start, end) = match (query.start, query.end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) => return Ok(None),
        _ => {
            return Err(ApiError::Core(Error::InvalidInput(
                "start and end must be supplied together".to_string(),
            )))
        }
    };
    let day_after = end.succ_opt().ok_or_else(|| {
        ApiError::Core(Error::InvalidInput(format!("end date {} out of range", end)))
    })?;
    Ok(Some((
        start.and_time(NaiveTime::MIN).and_utc(),
        day_after.and_time(NaiveTime::MIN).and_utc(),
    )))
}

/// Attaches display titles to a page of records, deduplicating lookups per
/// item id. Unresolvable items fall back to a placeholder title so a flaky
/// collaborator cannot break the listing.
async fn enrich_page(state: &AppState, records: Vec<HandoverRecord>) -> Vec<HandoverSummary> {
    let lost_ids: BTreeSet<i64> = records.iter().map(|r| r.lost_id).collect();
    let found_ids: BTreeSet<i64> = records.iter().map(|r| r.found_id).collect();

    let lost_titles: HashMap<i64, String> = join_all(lost_ids.into_iter().map(|id| async move {
        let title = match state.lost.fetch(id).await {
            Ok(view) => view.title.unwrap_or_else(|| format!("lost item #{}", id)),
            Err(e) => {
                warn!(
                    subsystem = "api",
                    lost_id = id,
                    error = %e,
                    "Title lookup failed; using placeholder"
                );
                format!("lost item #{}", id)
            }
        };
        (id, title)
    }))
    .await
    .into_iter()
    .collect();

    let found_titles: HashMap<i64, String> =
        join_all(found_ids.into_iter().map(|id| async move {
            let title = match state.found.fetch(id).await {
                Ok(view) => view.title.unwrap_or_else(|| format!("found item #{}", id)),
                Err(e) => {
                    warn!(
                        subsystem = "api",
                        found_id = id,
                        error = %e,
                        "Title lookup failed; using placeholder"
                    );
                    format!("found item #{}", id)
                }
            };
            (id, title)
        }))
        .await
        .into_iter()
        .collect();

    records
        .into_iter()
        .map(|record| {
            let lost_title = lost_titles
                .get(&record.lost_id)
                .cloned()
                .unwrap_or_else(|| format!("lost item #{}", record.lost_id));
            let found_title = found_titles
                .get(&record.found_id)
                .cloned()
                .unwrap_or_else(|| format!("found item #{}", record.found_id));
            HandoverSummary {
                record,
                lost_title,
                found_title,
            }
        })
        .collect()
}

// =============================================================================
// MATCHING HANDLERS
// =============================================================================

async fn match_for_lost(
    State(state): State<AppState>,
    Path(lost_id): Path<i64>,
    Query(query): Query<TopNQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let top_n = query
        .top_n
        .unwrap_or(state.tuning.top_n)
        .clamp(1, defaults::MATCH_TOP_N_MAX);
    let ranked = state.engine.rank_for_lost(lost_id, top_n).await?;
    Ok(Json(ranked))
}

async fn match_for_found(
    State(state): State<AppState>,
    Path(found_id): Path<i64>,
    Query(query): Query<TopNQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let top_n = query
        .top_n
        .unwrap_or(state.tuning.top_n)
        .clamp(1, defaults::MATCH_TOP_N_MAX);
    let ranked = state.engine.rank_for_found(found_id, top_n).await?;
    Ok(Json(ranked))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Core(Error),
    Unauthenticated(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Core(err) => {
                let status = match &err {
                    Error::NotFound(_) | Error::HandoverNotFound(_) => StatusCode::NOT_FOUND,
                    Error::InvalidTransition(_) | Error::InvalidInput(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::Unauthorized(_) => StatusCode::FORBIDDEN,
                    Error::CollaboratorUnavailable(_) => StatusCode::BAD_GATEWAY,
                    Error::Serialization(_) | Error::Config(_) | Error::Internal(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

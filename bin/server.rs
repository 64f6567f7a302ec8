// Auditor Timeline - Web Server
// JSON API over one in-memory timeline snapshot

use anyhow::{bail, Context, Result};
use auditor_timeline::{
    init_logging, load_addendums, load_letters, parse_date, LayoutCache,
    TimelineConfig, TimelineIndex, TimelineLayout, ViewMode, WorkloadSummary,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Where the snapshot is read from; kept for /api/reload
#[derive(Debug, Clone)]
struct DataPaths {
    letters: PathBuf,
    addendums: Option<PathBuf>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    index: Arc<RwLock<TimelineIndex>>,
    cache: Arc<Mutex<LayoutCache>>,
    config: Arc<TimelineConfig>,
    paths: Arc<DataPaths>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    if status.is_server_error() {
        tracing::error!(%message, "request failed");
    } else {
        tracing::debug!(%message, "bad request");
    }

    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct TimelineQuery {
    mode: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkloadQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
    entities: usize,
    assignments: usize,
    skipped: usize,
}

/// Entity listing (without bars)
#[derive(Serialize)]
struct EntityResponse {
    key: String,
    display_name: String,
    members: Vec<String>,
    assignment_count: usize,
    addendum_count: usize,
}

#[derive(Serialize)]
struct ReloadResponse {
    records: usize,
    entities: usize,
    assignments: usize,
    skipped: usize,
}

impl From<&TimelineIndex> for ReloadResponse {
    fn from(index: &TimelineIndex) -> Self {
        Self {
            records: index.record_count(),
            entities: index.resolver().len(),
            assignments: index.assignments().len(),
            skipped: index.skipped().len(),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check plus snapshot size
async fn health_check(State(state): State<AppState>) -> Response {
    let Ok(index) = state.index.read() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "index lock poisoned");
    };

    ApiResponse::ok(HealthResponse {
        status: "OK",
        version: auditor_timeline::VERSION,
        records: index.record_count(),
        entities: index.resolver().len(),
        assignments: index.assignments().len(),
        skipped: index.skipped().len(),
    })
}

/// GET /api/timeline?mode=&year=&month=&start=&end= - Packed layout for one view
async fn get_timeline(State(state): State<AppState>, Query(query): Query<TimelineQuery>) -> Response {
    let today = Local::now().date_naive();

    let mode = match ViewMode::from_params(
        query.mode.as_deref().unwrap_or("month"),
        query.year,
        query.month,
        query.start.as_deref(),
        query.end.as_deref(),
        today,
    ) {
        Ok(mode) => mode,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let Ok(index) = state.index.read() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "index lock poisoned");
    };
    let Ok(mut cache) = state.cache.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "cache lock poisoned");
    };

    let layout: TimelineLayout = cache
        .get_or_compute(&index, mode, &state.config, today)
        .clone();

    ApiResponse::ok(layout)
}

/// GET /api/entities - Every resolved auditor, sorted by name
async fn get_entities(State(state): State<AppState>) -> Response {
    let Ok(index) = state.index.read() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "index lock poisoned");
    };

    let entities: Vec<EntityResponse> = index
        .entities_by_name()
        .into_iter()
        .filter_map(|id| {
            let entity = index.resolver().entity(id)?;
            let assignments = index.assignments_for(id);
            Some(EntityResponse {
                key: entity.key.clone(),
                display_name: entity.display_name.clone(),
                members: entity.members.clone(),
                assignment_count: assignments.len(),
                addendum_count: assignments.iter().filter(|a| a.is_addendum).count(),
            })
        })
        .collect();

    ApiResponse::ok(entities)
}

/// GET /api/workload?start=&end= - Busy days per auditor (defaults to this month)
async fn get_workload(State(state): State<AppState>, Query(query): Query<WorkloadQuery>) -> Response {
    let today = Local::now().date_naive();

    let start = match query.start.as_deref() {
        Some(raw) => match parse_date(raw) {
            Some(date) => date,
            None => return error_response(StatusCode::BAD_REQUEST, format!("invalid start date '{}'", raw)),
        },
        None => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
    };
    let end = match query.end.as_deref() {
        Some(raw) => match parse_date(raw) {
            Some(date) => date,
            None => return error_response(StatusCode::BAD_REQUEST, format!("invalid end date '{}'", raw)),
        },
        None => today,
    };

    let Ok(index) = state.index.read() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "index lock poisoned");
    };

    ApiResponse::ok(WorkloadSummary::for_window(&index, start, end))
}

/// POST /api/reload - Re-read the source files and drop cached layouts
async fn reload(State(state): State<AppState>) -> Response {
    let paths = state.paths.as_ref().clone();

    let rebuilt = tokio::task::spawn_blocking(move || build_index(&paths)).await;
    let index = match rebuilt {
        Ok(Ok(index)) => index,
        Ok(Err(e)) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let summary = ReloadResponse::from(&index);

    // Index first, then cache, same order as the readers
    let Ok(mut current) = state.index.write() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "index lock poisoned");
    };
    let Ok(mut cache) = state.cache.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "cache lock poisoned");
    };
    *current = index;
    cache.clear();

    tracing::info!(records = summary.records, entities = summary.entities, "timeline reloaded");
    ApiResponse::ok(summary)
}

// ============================================================================
// Main Server
// ============================================================================

fn build_index(paths: &DataPaths) -> Result<TimelineIndex> {
    let letters = load_letters(&paths.letters)
        .with_context(|| format!("Failed to load letters from {}", paths.letters.display()))?;

    let addendums = match &paths.addendums {
        Some(path) => load_addendums(path)
            .with_context(|| format!("Failed to load addendums from {}", path.display()))?,
        None => Vec::new(),
    };

    Ok(TimelineIndex::build(&letters, &addendums))
}

/// `--letters F [--addendums F] [--config F] [--addr HOST:PORT]`,
/// falling back to AUDITOR_TIMELINE_* environment variables
fn parse_args() -> Result<(DataPaths, Option<PathBuf>, String)> {
    let mut letters = std::env::var("AUDITOR_TIMELINE_LETTERS").ok().map(PathBuf::from);
    let mut addendums = std::env::var("AUDITOR_TIMELINE_ADDENDUMS").ok().map(PathBuf::from);
    let mut config = std::env::var("AUDITOR_TIMELINE_CONFIG").ok().map(PathBuf::from);
    let mut addr = std::env::var("AUDITOR_TIMELINE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("{} expects a value", flag))?;
        match flag.as_str() {
            "--letters" => letters = Some(PathBuf::from(value)),
            "--addendums" => addendums = Some(PathBuf::from(value)),
            "--config" => config = Some(PathBuf::from(value)),
            "--addr" => addr = value,
            other => bail!("Unknown argument '{}'", other),
        }
    }

    let letters = letters.context("--letters FILE (or AUDITOR_TIMELINE_LETTERS) is required")?;
    Ok((DataPaths { letters, addendums }, config, addr))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let (paths, config_path, addr) = parse_args()?;

    let config = match config_path {
        Some(path) => TimelineConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TimelineConfig::default(),
    };

    let index = build_index(&paths)?;
    tracing::info!(
        letters = %paths.letters.display(),
        entities = index.resolver().len(),
        "snapshot loaded"
    );

    // Create shared state
    let state = AppState {
        index: Arc::new(RwLock::new(index)),
        cache: Arc::new(Mutex::new(LayoutCache::new())),
        config: Arc::new(config),
        paths: Arc::new(paths),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/timeline", get(get_timeline))
        .route("/entities", get(get_entities))
        .route("/workload", get(get_workload))
        .route("/reload", post(reload))
        .with_state(state);

    let app = Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server running (GET /api/timeline, /api/entities, /api/workload)");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

//! HTTP server for the bulk transfer API.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                            |
//! |--------|------------------------|----------------------------------------|
//! | GET    | `/health`              | Health check                           |
//! | POST   | `/api/v1/bulk/import`  | Upload a CSV (`file`, `entity` fields) |
//! | GET    | `/api/v1/bulk/import`  | Download an import template            |
//! | GET    | `/api/v1/bulk/export`  | Export with query-string options       |
//! | POST   | `/api/v1/bulk/export`  | Export with a JSON body                |
//! | GET    | `/api/logs`            | SSE stream of import/export activity   |
//!
//! Structural problems (missing or unknown entity, bad upload) are 400s.
//! A processed import is always a 200, even when every row failed: the body
//! carries the per-row errors.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{LogBroadcaster, LogEntry};
use super::types::{
    error_response, json_export_response, EntityQuery, ExportBody, ExportFormat, ExportQuery,
    ExportRequest, ImportResponse,
};
use crate::config::Settings;
use crate::error::{BulkError, ServerResult, StoreError};
use crate::models::EntityKind;
use crate::parser::{decode_content, parse_numbered_records, DEFAULT_DELIMITER};
use crate::pipeline::{export_batch, export_file_name, import_numbered_rows, project_records};
use crate::store::RecordStore;
use crate::template::{import_template, template_file_name};
use crate::validation::RowValidator;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

/// Allowance for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handler state. Cloned per request; all members are shared handles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub logs: Arc<LogBroadcaster>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn RecordStore>) -> Self {
        Self {
            logs: Arc::new(LogBroadcaster::new(settings.log_capacity)),
            settings: Arc::new(settings),
            store,
        }
    }
}

fn bad_request(message: impl AsRef<str>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message.as_ref())))
}

fn store_failure(err: StoreError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_response(&err.to_string())),
    )
}

fn bulk_failure(err: BulkError) -> ApiError {
    match err {
        BulkError::Write(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&err.to_string())),
        ),
        other => bad_request(other.to_string()),
    }
}

/// `10MB` for whole mebibytes, otherwise the byte count.
fn format_limit(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Resolve the `entity` parameter or explain what is wrong with it.
pub fn resolve_entity(raw: Option<&str>) -> Result<EntityKind, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Err(bad_request(format!(
            "Entity type is required ({})",
            EntityKind::valid_names()
        ))),
        Some(name) => name.parse().map_err(|_| {
            bad_request(format!(
                "Invalid entity. Valid options: {}",
                EntityKind::valid_names()
            ))
        }),
    }
}

/// Build the router around `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = state.settings.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/v1/bulk/import", get(download_template).post(upload_import))
        .route("/api/v1/bulk/export", get(export_get).post(export_post))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(settings: Settings, store: Arc<dyn RecordStore>) -> ServerResult<()> {
    let port = settings.port;
    let app = router(AppState::new(settings, store));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "PharmPlus bulk transfer server listening");
    tracing::info!("   POST /api/v1/bulk/import - Upload CSV for import");
    tracing::info!("   GET  /api/v1/bulk/import - Import template");
    tracing::info!("   GET  /api/v1/bulk/export - Export CSV/JSON");
    tracing::info!("   GET  /api/logs           - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pharmplus-bulk",
        "version": env!("CARGO_PKG_VERSION"),
        "entities": EntityKind::ALL,
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.logs.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Template download endpoint
async fn download_template(Query(query): Query<EntityQuery>) -> Result<Response, ApiError> {
    let kind = resolve_entity(query.entity.as_deref())?;
    Ok(csv_attachment(
        "text/csv",
        &template_file_name(kind),
        import_template(kind),
    ))
}

/// Upload CSV endpoint
async fn upload_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut entity: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            "entity" => {
                entity = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| bad_request(format!("Read error: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;
    let response = run_import(&state, file_name.as_deref(), &bytes, entity.as_deref())?;
    Ok(Json(response))
}

/// Validate an upload, import it and persist the accepted rows.
pub fn run_import(
    state: &AppState,
    file_name: Option<&str>,
    bytes: &[u8],
    entity: Option<&str>,
) -> Result<ImportResponse, ApiError> {
    let kind = resolve_entity(entity)?;
    let name = file_name.unwrap_or("upload.csv");

    if !name.to_lowercase().ends_with(".csv") {
        return Err(bad_request("Only CSV files are supported"));
    }

    let limit = state.settings.max_upload_bytes;
    if bytes.len() > limit {
        return Err(bad_request(format!(
            "File size exceeds {} limit",
            format_limit(limit)
        )));
    }

    state.logs.log(
        LogEntry::info(format!("Importing {} ({} bytes)", name, bytes.len())).with_entity(kind),
    );

    let text = decode_content(bytes).map_err(|e| {
        state.logs.log(LogEntry::error(e.to_string()).with_entity(kind));
        bulk_failure(e)
    })?;

    let rows = parse_numbered_records(&text, DEFAULT_DELIMITER);
    if rows.len() > state.settings.max_import_rows {
        return Err(bad_request(format!(
            "File has {} rows; the limit is {}",
            rows.len(),
            state.settings.max_import_rows
        )));
    }

    let mut result = import_numbered_rows(&rows, &RowValidator::new(kind));
    let accepted = std::mem::take(&mut result.records);
    let persisted = if accepted.is_empty() {
        0
    } else {
        state.store.persist(kind, accepted).map_err(store_failure)?
    };

    let summary = if result.success {
        LogEntry::success(result.summary())
    } else {
        LogEntry::warning(result.summary())
    };
    state.logs.log(summary.with_entity(kind));

    Ok(ImportResponse::new(result, persisted))
}

async fn export_get(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let kind = resolve_entity(query.entity.as_deref())?;
    let format = resolve_format(query.format.as_deref())?;
    run_export(&state, query.into_request(kind, format))
}

async fn export_post(
    State(state): State<AppState>,
    Json(body): Json<ExportBody>,
) -> Result<Response, ApiError> {
    let kind = resolve_entity(body.entity.as_deref())?;
    let format = resolve_format(body.format.as_deref())?;
    run_export(&state, body.into_request(kind, format))
}

fn resolve_format(raw: Option<&str>) -> Result<ExportFormat, ApiError> {
    ExportFormat::parse(raw).ok_or_else(|| bad_request("Invalid format. Valid options: csv, json, xlsx"))
}

/// Fetch, project and render an export.
pub fn run_export(state: &AppState, request: ExportRequest) -> Result<Response, ApiError> {
    let ExportRequest { spec, format } = request;

    if format == ExportFormat::Xlsx {
        return Err(bad_request("XLSX export not yet implemented"));
    }

    let records = state.store.fetch(&spec).map_err(store_failure)?;
    state.logs.log(
        LogEntry::info(format!("Exporting {} records", records.len())).with_entity(spec.entity),
    );

    match format {
        ExportFormat::Json => {
            let data = project_records(&records, &spec.resolved_columns());
            Ok(Json(json_export_response(&spec, data)).into_response())
        }
        _ => {
            let body = export_batch(&records, &spec).map_err(bulk_failure)?;
            let today = chrono::Utc::now().date_naive();
            Ok(csv_attachment(
                "text/csv; charset=utf-8",
                &export_file_name(&spec, today),
                body,
            ))
        }
    }
}

fn csv_attachment(content_type: &str, file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

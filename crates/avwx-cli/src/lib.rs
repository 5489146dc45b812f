use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use avwx_config::{AppConfig, DEFAULT_MEMORY_CAPACITY};
use avwx_core::{DecodedRecord, RecordKind, RecordQuery, RecordStore, Sink, StationBriefing};
use avwx_decode::{DecodeContext, ScrapePayload};
use avwx_sinks::{FsSink, MemoryStore};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use tokio::sync::Mutex;

const DEFAULT_QUERY_LIMIT: usize = 100;

/// Runtime options taken from configuration
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub short_code_prefix: Option<String>,
    pub fs_dir: Option<PathBuf>,
    pub memory_capacity: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            short_code_prefix: None,
            fs_dir: None,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&AppConfig> for AppOptions {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            short_code_prefix: cfg.short_code_prefix(),
            fs_dir: cfg.fs_dir(),
            memory_capacity: cfg.memory_capacity(),
        }
    }
}

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    bulletins_decoded: Counter<u64>,
    short_code_prefix: Option<String>,
    store: MemoryStore,
    fs_sink: Mutex<Option<FsSink>>,
}

impl AppState {
    /// Decoder context on the wall clock, carrying configured options
    fn decode_context(&self) -> DecodeContext {
        let ctx = DecodeContext::current();
        match &self.short_code_prefix {
            Some(prefix) => ctx.with_short_code_prefix(prefix.as_str()),
            None => ctx,
        }
    }

    fn count(&self, kind: RecordKind, n: usize) {
        self.bulletins_decoded
            .add(n as u64, &[KeyValue::new("kind", kind.as_str())]);
    }
}

/// App with default options
pub fn build_app() -> (Router, Arc<AppState>) {
    try_build_app(AppOptions::default()).expect("default app")
}

pub fn try_build_app(options: AppOptions) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("prometheus exporter")?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("avwx-cli");

    let requests_total = meter
        .u64_counter("avwx_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let bulletins_decoded = meter
        .u64_counter("avwx_bulletins_decoded")
        .with_description("Records decoded, by bulletin kind")
        .init();

    let fs_sink = match options.fs_dir {
        Some(dir) => match FsSink::new(&dir) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error=?e, dir=%dir.display(), "fs sink disabled");
                None
            }
        },
        None => None,
    };

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        bulletins_decoded,
        short_code_prefix: options.short_code_prefix,
        store: MemoryStore::new(options.memory_capacity.max(1))?,
        fs_sink: Mutex::new(fs_sink),
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/decode/metar", post(decode_metar))
        .route("/api/v1/decode/taf", post(decode_taf))
        .route("/api/v1/decode/sigmet", post(decode_sigmet))
        .route("/api/v1/decode/upper-wind", post(decode_upper_wind))
        .route("/api/v1/briefing", post(briefing))
        .route("/api/v1/scrape", post(scrape))
        .route("/api/v1/records", get(records))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

/// Store records and append them to the file sink, if any
pub async fn ingest_records(state: &Arc<AppState>, records: Vec<DecodedRecord>) {
    let mut fs_sink = state.fs_sink.lock().await;
    for record in records {
        if let Some(sink) = fs_sink.as_mut() {
            if let Err(e) = sink.emit(&record).await {
                tracing::warn!(error=?e, "fs sink write failed");
            }
        }
        if let Err(e) = state.store.store(record).await {
            tracing::warn!(error=?e, "record store failed");
        }
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.requests_total.add(1, &[]);
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

#[derive(Deserialize)]
struct BulletinRequest {
    bulletin: String,
    station_id: Option<String>,
    extraction_time: Option<String>,
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

async fn decode_metar(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulletinRequest>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let record = avwx_decode::decode_metar_with(
        &state.decode_context(),
        &req.bulletin,
        req.station_id.as_deref(),
        req.extraction_time.as_deref(),
    );
    state.count(RecordKind::Metar, 1);
    (StatusCode::OK, Json(record)).into_response()
}

async fn decode_taf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulletinRequest>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let record = avwx_decode::decode_taf_with(
        &state.decode_context(),
        &req.bulletin,
        req.station_id.as_deref(),
        req.extraction_time.as_deref(),
    );
    state.count(RecordKind::Taf, 1);
    (StatusCode::OK, Json(record)).into_response()
}

async fn decode_sigmet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let records = avwx_decode::decode_sigmet_block(&req.text);
    state.count(RecordKind::Sigmet, records.len());
    (StatusCode::OK, Json(records)).into_response()
}

async fn decode_upper_wind(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let records = avwx_decode::decode_upper_wind_bulletin_with(&state.decode_context(), &req.text);
    state.count(RecordKind::UpperWind, records.len());
    (StatusCode::OK, Json(records)).into_response()
}

#[derive(Deserialize)]
struct BriefingRequest {
    station_id: Option<String>,
    metar: Option<String>,
    taf: Option<String>,
    upper_wind: Option<String>,
    extraction_time: Option<String>,
}

async fn briefing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BriefingRequest>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let ctx = state.decode_context();
    let station = req.station_id.as_deref();
    let metar = req
        .metar
        .as_deref()
        .map(|b| avwx_decode::decode_metar_with(&ctx, b, station, req.extraction_time.as_deref()));
    let taf = req
        .taf
        .as_deref()
        .map(|b| avwx_decode::decode_taf_with(&ctx, b, station, req.extraction_time.as_deref()));
    let station_id = station
        .map(str::to_string)
        .or_else(|| metar.as_ref().map(|m| m.station_id.clone()))
        .or_else(|| taf.as_ref().map(|t| t.station_id.clone()))
        .unwrap_or_default();
    let winds = req
        .upper_wind
        .as_deref()
        .map(|text| avwx_decode::decode_upper_wind_bulletin_with(&ctx, text))
        .unwrap_or_default();
    let briefing = StationBriefing::new(
        &station_id,
        metar.as_ref(),
        taf.as_ref(),
        avwx_core::upper_wind_for(&winds, &station_id),
    );
    if briefing.is_empty() {
        let body = serde_json::json!({ "error": "no bulletin produced a briefing" });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    (StatusCode::OK, Json(briefing)).into_response()
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScrapePayload>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let batch = avwx_decode::decode_scrape(&state.decode_context(), &payload);
    let records = batch.records();
    for kind in [RecordKind::Metar, RecordKind::Taf, RecordKind::Sigmet, RecordKind::UpperWind] {
        state.count(kind, records.iter().filter(|r| r.kind() == kind).count());
    }
    tracing::info!(records = records.len(), "scrape batch decoded");
    ingest_records(&state, records).await;
    (StatusCode::OK, Json(batch)).into_response()
}

#[derive(Deserialize)]
struct RecordsQuery {
    kind: Option<String>,
    station: Option<String>,
    limit: Option<usize>,
}

async fn records(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecordsQuery>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let kind = match q.kind.as_deref().map(str::parse::<RecordKind>).transpose() {
        Ok(kind) => kind,
        Err(e) => {
            let body = serde_json::json!({ "error": e.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };
    let query = RecordQuery {
        kind,
        station: q.station.filter(|s| !s.is_empty()),
        limit: Some(q.limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(state.store.capacity())),
    };
    match state.store.query(&query).await {
        Ok(hits) => (StatusCode::OK, Json(hits)).into_response(),
        Err(e) => {
            tracing::warn!(error=?e, "record query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

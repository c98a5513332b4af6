use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use watchstats::config::{parse_config, Config};
use watchstats::{Snapshot, Store, WatchStatsError};

/// Shared application state.
pub struct AppState {
    pub store: Arc<Store>,
    pub tx: broadcast::Sender<SseEvent>,
}

/// A server-sent event payload: a freshly published snapshot's generation
/// and its rendered report.
#[derive(Clone, Debug, Serialize)]
pub struct SseEvent {
    pub generation: u64,
    pub report: serde_json::Value,
}

/// Export shown until a watchlist is configured or loads successfully.
const BUNDLED_SAMPLE: &str = "assets/sample.csv";
const BUNDLED_GENRES: &str = "assets/genre.json";

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_config() -> Result<Config, WatchStatsError> {
    let mut config = match std::env::var("WATCHSTATS_CONFIG") {
        Ok(path) => parse_config(&PathBuf::from(path))?,
        Err(_) => Config::default(),
    };
    if let Ok(csv) = std::env::var("WATCHSTATS_CSV") {
        config.watchlist = Some(PathBuf::from(csv));
    }
    if let Ok(genres) = std::env::var("WATCHSTATS_GENRES") {
        config.genres = Some(PathBuf::from(genres));
    }
    if let Ok(sample) = std::env::var("WATCHSTATS_SAMPLE") {
        config.sample = Some(PathBuf::from(sample));
    }
    for (slot, bundled) in [
        (&mut config.sample, BUNDLED_SAMPLE),
        (&mut config.genres, BUNDLED_GENRES),
    ] {
        let bundled = PathBuf::from(bundled);
        if slot.is_none() && bundled.exists() {
            *slot = Some(bundled);
        }
    }
    Ok(config)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    log::info!("Starting watchstats dashboard");

    let host = std::env::var("WATCHSTATS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("WATCHSTATS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = load_config().map_err(std::io::Error::other)?;
    log::info!("Opening watchlist: {:?} (sample: {:?})", config.watchlist, config.sample);

    // A broken export at startup is not fatal: the sample (if any) is shown
    // and the watcher publishes once the file is fixed.
    let store = Store::new(config).map_err(std::io::Error::other)?;
    if let Err(e) = store.load_or_sample() {
        log::error!("Initial load failed: {e}");
    }
    let store = Arc::new(store);

    match store.watch() {
        Ok(()) => log::info!("File watcher started"),
        Err(e) => log::warn!("File watcher not started: {e}"),
    }

    // Broadcast channel for SSE events (capacity 64)
    let (tx, _rx) = broadcast::channel::<SseEvent>(64);

    // Every published snapshot is rendered once and pushed to all listeners.
    {
        let tx = tx.clone();
        let weak = Arc::downgrade(&store);
        store.on_reload(Box::new(move |snapshot| {
            let Some(store) = weak.upgrade() else { return };
            let _ = tx.send(render_event(&store, snapshot));
        }));
    }

    let state = web::Data::new(AppState {
        store: Arc::clone(&store),
        tx: tx.clone(),
    });

    // Poll watcher events; on_reload pushes SSE events when a load succeeds.
    let poll_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(200));
        loop {
            interval.tick().await;
            if let Err(e) = poll_store.process_watcher_events() {
                log::error!("Watcher event processing error: {e}");
            }
        }
    });

    log::info!("Listening on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/api/report", web::get().to(get_report))
            .route("/api/views/{name}", web::get().to(get_view))
            .route("/api/status", web::get().to(get_status))
            .route("/api/events", web::get().to(sse_handler))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn render_event(store: &Store, snapshot: &Snapshot) -> SseEvent {
    let report = store.report_of(snapshot, today());
    SseEvent {
        generation: report.generation,
        report: serde_json::to_value(report).unwrap_or_default(),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

fn error_response(e: &WatchStatsError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        WatchStatsError::NotFound { .. } => HttpResponse::NotFound().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn get_report(state: web::Data<AppState>) -> HttpResponse {
    match state.store.report(today()) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

async fn get_view(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let view_name = path.into_inner();
    match state.store.view_dynamic(&view_name, today()) {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => error_response(&e),
    }
}

async fn get_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.status())
}

/// SSE endpoint: the current report, then one event per published snapshot.
async fn sse_handler(_req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let mut rx = state.tx.subscribe();

    let stream = async_stream::stream! {
        if let Some(snapshot) = state.store.snapshot() {
            let event = render_event(&state.store, &snapshot);
            let json = serde_json::to_string(&event).unwrap_or_default();
            yield Ok::<_, actix_web::Error>(web::Bytes::from(format!("data: {json}\n\n")));
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok::<_, actix_web::Error>(web::Bytes::from(format!("data: {json}\n\n")));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("SSE client lagged by {n} messages");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream)
}

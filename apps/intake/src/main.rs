use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intake::backend::{
    HttpBackend, HttpCandidateStore, HttpLocationResolver, HttpModuleDirectory,
    HttpTimesheetSource,
};
use intake::config::{Config, DraftBackend};
use intake::drafts::{DraftStore, FileDraftStore, MemoryDraftStore, RedisDraftStore};
use intake::routes::build_router;
use intake::state::AppState;
use intake::wizard::SessionRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting intake v{}", env!("CARGO_PKG_VERSION"));

    let backend = HttpBackend::new(config.api_base_url.clone(), config.http_timeout)?;
    info!("Backend client initialized ({})", config.api_base_url);

    let drafts = build_draft_store(&config.draft_backend).await?;

    let sessions = Arc::new(SessionRegistry::default());
    sessions.clone().spawn_sweeper(config.session_ttl);
    info!("Idle wizard sessions expire after {}s", config.session_ttl.as_secs());

    let state = AppState {
        locations: Arc::new(HttpLocationResolver::new(backend.clone())),
        candidates: Arc::new(HttpCandidateStore::new(backend.clone())),
        timesheet: Arc::new(HttpTimesheetSource::new(backend.clone())),
        modules: Arc::new(HttpModuleDirectory::new(backend)),
        drafts,
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the SPA host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_draft_store(backend: &DraftBackend) -> Result<Arc<dyn DraftStore>> {
    Ok(match backend {
        DraftBackend::File(dir) => {
            let store = FileDraftStore::open(dir).await?;
            info!("Draft store: files under {}", dir.display());
            Arc::new(store)
        }
        DraftBackend::Redis(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Draft store: redis");
            Arc::new(RedisDraftStore::new(client))
        }
        DraftBackend::Memory => {
            info!("Draft store: in-memory (drafts are lost on restart)");
            Arc::new(MemoryDraftStore::default())
        }
    })
}

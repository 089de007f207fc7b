//! Tide engine HTTP server.
//!
//! Configuration comes from `TIDE__*` environment variables; see
//! [`tide_engine::config::AppConfig`].

use std::error::Error;
use std::sync::Arc;

use tide_engine::adapters::http::api_router;
use tide_engine::adapters::{
    BuiltinCatalogLoader, FsProfileStore, InMemoryAuditRecorder, InMemorySafetyPlanStore,
    InMemoryUserContextStore, JsonlAuditRecorder, YamlCatalogLoader,
};
use tide_engine::application::{Engine, EnginePorts, SessionRegistry};
use tide_engine::config::{
    AppConfig, AuditSink, ConfigError, LogFormat, ProfileBackend, ServerConfig,
};
use tide_engine::domain::foundation::TreeVersion;
use tide_engine::ports::{AuditRecorder, SafetyPlanStore, TreeCatalogLoader, UserContextStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;
    init_tracing(&config.server);

    let engine = Engine::new(build_ports(&config).await?, config.engine.settings());
    let active = TreeVersion::new(config.catalog.active_version.clone())?;
    engine.catalog.load_and_activate(&active).await?;
    let _sweeper = SessionRegistry::spawn_sweeper(
        Arc::clone(&engine.registry),
        config.engine.session_retention(),
        config.engine.session_sweep_interval(),
    );

    let addr = config.server.socket_addr()?;
    let app = api_router(engine, config.server.request_timeout());

    tracing::info!(%addr, tree_version = %active, "tide engine listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn build_ports(config: &AppConfig) -> Result<EnginePorts, Box<dyn Error>> {
    let catalog_loader: Arc<dyn TreeCatalogLoader> = match &config.catalog.directory {
        Some(dir) => Arc::new(YamlCatalogLoader::new(dir)),
        None => Arc::new(BuiltinCatalogLoader::new()),
    };

    let recorder: Arc<dyn AuditRecorder> = match (config.audit.sink, &config.audit.jsonl_path) {
        (AuditSink::Jsonl, Some(path)) => Arc::new(JsonlAuditRecorder::open(path).await?),
        _ => Arc::new(InMemoryAuditRecorder::new()),
    };

    let contexts: Arc<dyn UserContextStore>;
    let safety_plans: Arc<dyn SafetyPlanStore>;
    match (config.profiles.backend, &config.profiles.directory) {
        (ProfileBackend::Filesystem, Some(dir)) => {
            let store = Arc::new(FsProfileStore::new(dir));
            contexts = store.clone();
            safety_plans = store;
        }
        _ => {
            contexts = Arc::new(InMemoryUserContextStore::new());
            safety_plans = Arc::new(InMemorySafetyPlanStore::new());
        }
    }

    if config.audit.sink == AuditSink::Memory {
        tracing::warn!("audit records are kept in memory only");
    }

    Ok(EnginePorts {
        catalog_loader,
        recorder,
        contexts,
        safety_plans,
    })
}

//! Quiz Bank Back binary entrypoint wiring the REST API and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::bank_store::memory::MemoryBankStore;
use state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let admin_token = env::var("ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; mutating endpoints will reject every request");
    }

    let app_state = AppState::new(config, admin_token);

    match env::var("STORE_BACKEND").as_deref() {
        Ok("memory") => {
            let store = Arc::new(MemoryBankStore::new());
            app_state.install_stores(store.clone(), store).await;
            info!("using in-memory storage backend");
        }
        _ => spawn_store_supervisor(&app_state),
    }

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Spawn the supervisor that installs the MongoDB-backed stores once the
/// database is reachable, keeping the application degraded until then.
#[cfg(feature = "mongo-store")]
fn spawn_store_supervisor(state: &SharedState) {
    use dao::bank_store::{
        PlayHistoryStore, QuestionStore,
        mongodb::{MongoBankStore, MongoConfig},
    };
    use dao::storage::StorageError;
    use services::storage_supervisor;

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    let state = state.clone();
    tokio::spawn(async move {
        storage_supervisor::run(state, move || {
            let uri = uri.clone();
            let db_name = db_name.clone();
            async move {
                let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                    .await
                    .map_err(StorageError::from)?;
                let store = Arc::new(
                    MongoBankStore::connect(config)
                        .await
                        .map_err(StorageError::from)?,
                );
                Ok((
                    store.clone() as Arc<dyn QuestionStore>,
                    store as Arc<dyn PlayHistoryStore>,
                ))
            }
        })
        .await;
    });
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_store_supervisor(state: &SharedState) {
    let _ = state;
    warn!("built without the mongo-store feature; set STORE_BACKEND=memory to serve from memory");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{any, get, patch, post},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::{
    configuration::{DatabaseSettings, Settings},
    middleware::request_timeout,
    routes::{
        health::health_check,
        user::{create_user, delete_user, list_users, update_user},
    },
    services::{
        hooks::{LogObserver, UserObserver},
        user::UserService,
    },
    store::{UserRepository, UserStore},
    version::BuildInfo,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub build_info: Arc<BuildInfo>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        observer: Arc<dyn UserObserver>,
        build_info: BuildInfo,
    ) -> Self {
        Self {
            user_service: UserService::new(store, observer),
            build_info: Arc::new(build_info),
        }
    }
}

pub fn app(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .route("/", any(health_check))
        .route("/user", post(create_user))
        .route("/users", get(list_users))
        .route("/user/{id}", patch(update_user).delete(delete_user))
        .layer(from_fn_with_state(timeout, request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connects eagerly so an unreachable database stops the process before it serves.
pub async fn get_connection_pool(database: &DatabaseSettings) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .idle_timeout(database.idle_timeout())
        .connect_with(database.with_db())
        .await
        .context("Unable to create connection pool")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the grace period.
    Drained,
    /// The grace period ran out and the server task was aborted.
    Forced,
}

/// Serves `app` until `signal` resolves, then stops accepting connections and
/// gives in-flight requests up to `grace` to finish before aborting them.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> anyhow::Result<ShutdownOutcome>
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")?.context("server error")?;
            return Ok(ShutdownOutcome::Drained);
        }
        _ = signal => {}
    }

    tracing::info!(grace_secs = grace.as_secs(), "shutting down");
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.context("server task panicked")?.context("server error")?;
            Ok(ShutdownOutcome::Drained)
        }
        Err(_) => {
            tracing::warn!("graceful shutdown period elapsed, dropping in-flight requests");
            server.abort();
            Ok(ShutdownOutcome::Forced)
        }
    }
}

pub async fn run(settings: Settings, build_info: BuildInfo) -> anyhow::Result<()> {
    let application = &settings.application;
    let grace = application.shutdown_grace();

    let pg_pool = get_connection_pool(&settings.database).await?;
    let store: Arc<dyn UserStore> = Arc::new(UserRepository::new(pg_pool.clone()));

    log_banner(&build_info, application.port, grace);

    let app_state = AppState::new(store, Arc::new(LogObserver), build_info);
    let app = app(app_state, application.request_timeout());

    let address = application.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;

    match serve_until(listener, app, shutdown_signal(), grace).await? {
        ShutdownOutcome::Drained => pg_pool.close().await,
        // Connections still checked out by aborted requests would hold
        // `close` open; they are dropped with the runtime instead.
        ShutdownOutcome::Forced => {}
    }
    Ok(())
}

fn log_banner(build_info: &BuildInfo, port: u16, grace: Duration) {
    tracing::info!("################################################");
    tracing::info!("User API server starting on port {}", port);
    tracing::info!("Version: {}", build_info.version);
    tracing::info!("Revision: {}", build_info.revision);
    tracing::info!("Branch: {}", build_info.branch);
    tracing::info!("Built By: {}", build_info.build_user);
    tracing::info!("Build Date: {}", build_info.build_date);
    tracing::info!("Rust Version: {}", build_info.rust_version);
    tracing::info!("Graceful shutdown period: {}s", grace.as_secs());
    tracing::info!("################################################");
}

/// Resolves on SIGINT, SIGTERM or SIGQUIT. SIGKILL is never caught.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = quit.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

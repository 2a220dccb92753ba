//! HTTP surface: routes, per-request sessions, and rendered pages.

use crate::storage::SessionStorage;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

mod error;
pub mod handlers;
pub mod session;
pub mod views;

pub use error::AppError;
pub use views::Views;

const PRUNE_EVERY: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn SessionStorage>,
    pub views: Arc<Views>,
    pub cookie_name: Arc<str>,
    /// How long a session lives after its last write.
    pub max_age: Duration,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        cookie_name: impl Into<String>,
        max_age: Duration,
    ) -> Result<Self, liquid::Error> {
        Ok(Self {
            storage,
            views: Arc::new(Views::new()?),
            cookie_name: Arc::from(cookie_name.into()),
            max_age,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/lists", get(handlers::get_lists))
        .route(
            "/lists/new",
            get(handlers::new_list_form).post(handlers::create_list),
        )
        .route(
            "/lists/:list_id",
            get(handlers::get_list).post(handlers::update_list),
        )
        .route("/lists/:list_id/edit", get(handlers::edit_list_form))
        .route("/lists/:list_id/delete", post(handlers::delete_list))
        .route("/lists/:list_id/todos", post(handlers::create_todo))
        .route(
            "/lists/:list_id/todos/complete-all",
            post(handlers::complete_all_todos),
        )
        .route(
            "/lists/:list_id/todos/:todo_id/status",
            post(handlers::update_todo_status),
        )
        .route(
            "/lists/:list_id/todos/:todo_id/delete",
            post(handlers::delete_todo),
        )
        .route(
            "/static/javascripts/application.js",
            get(handlers::application_js),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl-C, pruning expired sessions in the background.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    let pruner = session::spawn_pruner(state.clone(), PRUNE_EVERY);
    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    pruner.abort();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

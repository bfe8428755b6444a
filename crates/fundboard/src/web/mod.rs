//! HTTP surface for fundboard.
//!
//! An axum router over [`AppState`]. Every `/admin` route except login and
//! logout goes through the admin guard first.

pub mod error;
pub mod handlers;
pub mod session;
pub mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::Result;

pub use error::{login_url, LOGIN_PATH};
pub use session::{SessionContext, COOKIE_NAME};
pub use state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/dashboard", get(handlers::dashboard))
        .route(
            handlers::CONTACT_PATH,
            get(handlers::contact_page).post(handlers::submit_contact),
        )
        .route(LOGIN_PATH, get(handlers::login_page).post(handlers::login))
        .route("/admin/logout", get(handlers::logout))
        .route("/admin", get(handlers::admin_home))
        .route(
            "/admin/projects/{slug}/edit",
            get(handlers::edit_page).post(handlers::edit_project),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `address` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Unable to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Unable to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

//! HTTP depiction service

pub mod error;

pub use error::ApiError;

use axum::{
    extract::{rejection::QueryRejection, Query},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::signal;

use crate::config::{DrawSettings, ServerSettings};
use crate::render::{ensure_xml_declaration, smiles_to_svg};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SvgQuery {
    pub smiles: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Draw `?smiles=` at the default 400x300 size.
pub async fn render_svg(
    query: Result<Query<SvgQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(SvgQuery { smiles }) =
        query.map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))?;
    log::debug!("Rendering {:?}", smiles);

    let svg = tokio::task::spawn_blocking(move || smiles_to_svg(&smiles, &DrawSettings::default()))
        .await
        .map_err(|e| ApiError::BadRequest(format!("Rendering failed: {}", e)))?
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        ensure_xml_declaration(svg),
    )
        .into_response())
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/svg", get(render_svg))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(settings: &ServerSettings) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

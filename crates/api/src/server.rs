//! Axum HTTP-Server fuer den Auth-Dienst

use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tuersteher_db::{SessionRepository, UserRepository};

use crate::{routes::router, ApiState};

/// HTTP-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct ApiServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for ApiServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".parse().unwrap(),
            cors_origins: vec![],
        }
    }
}

/// Axum HTTP-Server: Router plus CORS/Trace-Layer plus Serve-Loop
pub struct ApiServer {
    konfig: ApiServerKonfig,
}

impl ApiServer {
    pub fn neu(konfig: ApiServerKonfig) -> Self {
        Self { konfig }
    }

    /// Startet den HTTP-Server; laeuft bis zum Shutdown-Signal (Ctrl-C)
    pub async fn starten<U, S>(self, state: ApiState<U, S>) -> Result<()>
    where
        U: UserRepository + 'static,
        S: SessionRepository + 'static,
    {
        // CORS konfigurieren: entweder spezifische Origins oder Any
        let cors = if self.konfig.cors_origins.is_empty() {
            CorsLayer::permissive()
        } else {
            let origins: Vec<HeaderValue> = self
                .konfig
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any)
        };

        let app = router(state).layer(TraceLayer::new_for_http()).layer(cors);

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(addr = %self.konfig.bind_addr, "Auth-HTTP-Server gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP-Server beendet");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(fehler = %e, "Shutdown-Signal nicht verfuegbar");
    } else {
        tracing::info!("Shutdown-Signal empfangen");
    }
}

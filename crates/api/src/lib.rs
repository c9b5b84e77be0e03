//! tuersteher-api – HTTP-Schnittstelle
//!
//! Stellt die Axum-Routen des Auth-Dienstes bereit sowie das
//! Request-Gate, das nicht ausgenommene Pfade per Basic-Auth oder
//! Session-Cookie absichert.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod redaktion;
pub mod routes;
pub mod server;

use std::sync::Arc;

use tuersteher_auth::AuthService;
use tuersteher_db::{SessionRepository, UserRepository};

pub use error::ApiError;
pub use gate::{AngemeldeterBenutzer, AuthModus, GateKonfig};
pub use routes::router;
pub use server::{ApiServer, ApiServerKonfig};

/// Axum-State: Auth-Service plus Gate-Konfiguration
pub struct ApiState<U: UserRepository, S: SessionRepository> {
    pub auth: Arc<AuthService<U, S>>,
    pub gate: Arc<GateKonfig>,
}

// Manuelles Clone: das abgeleitete wuerde U/S faelschlich Clone abverlangen
impl<U: UserRepository, S: SessionRepository> Clone for ApiState<U, S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            gate: Arc::clone(&self.gate),
        }
    }
}

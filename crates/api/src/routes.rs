//! Route-Definitionen fuer den Auth-Dienst

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use tuersteher_db::{SessionRepository, UserRepository};

use crate::{gate, handlers, ApiState};

/// Erstellt den vollstaendigen Router inklusive Request-Gate
///
/// Das Gate liegt als Layer ueber allen Routen; die Vertrags-Endpunkte
/// sind per Konfiguration ausgenommen und machen ihre Session-Pruefung
/// selbst (403 statt der Gate-Unterscheidung 401/403).
pub fn router<U, S>(state: ApiState<U, S>) -> Router
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    Router::new()
        .route("/", get(handlers::willkommen))
        .route("/status", get(handlers::status))
        .route("/users", post(handlers::registrieren::<U, S>))
        .route("/users/me", get(handlers::eigener_benutzer))
        .route(
            "/sessions",
            post(handlers::anmelden::<U, S>).delete(handlers::abmelden::<U, S>),
        )
        .route("/profile", get(handlers::profil::<U, S>))
        .route(
            "/reset_password",
            post(handlers::reset_anfordern::<U, S>).put(handlers::reset_abschliessen::<U, S>),
        )
        .fallback(handlers::nicht_gefunden)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::pruefen::<U, S>,
        ))
        .with_state(state)
}

//! HTTP-Handler fuer die Vertrags-Endpunkte
//!
//! Die Statuscodes und Antwortkoerper sind der Kompatibilitaetsvertrag:
//! 400 fuer fehlende Felder und doppelte E-Mails, 401 fuer falsche
//! Anmeldedaten, 403 fuer fehlende/ungueltige Sessions und Tokens.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use tuersteher_db::{SessionRepository, UserRepository};

use crate::{
    error::ApiError,
    gate::{session_cookie, AngemeldeterBenutzer},
    redaktion::felder_redigieren,
    ApiState,
};

/// Felder die nie im Klartext geloggt werden
const REDIGIERTE_FELDER: &[&str] = &["password", "new_password", "reset_token"];

#[derive(Debug, Deserialize)]
pub struct AnmeldeFormular {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetAnfrageFormular {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetAbschlussFormular {
    pub email: Option<String>,
    pub reset_token: Option<String>,
    pub new_password: Option<String>,
}

/// GET / – Begruessung
pub async fn willkommen() -> Json<serde_json::Value> {
    Json(json!({ "message": "Bienvenue" }))
}

/// GET /status – Health-Check
pub async fn status() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

/// Fallback fuer unbekannte Pfade
pub async fn nicht_gefunden() -> ApiError {
    ApiError::NichtGefunden
}

/// POST /users – Registrierung
pub async fn registrieren<U, S>(
    State(state): State<ApiState<U, S>>,
    Form(formular): Form<AnmeldeFormular>,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let email = pflichtfeld(formular.email, "email")?;
    let passwort = pflichtfeld(formular.password, "password")?;
    formular_loggen("Registrierung", &format!("email={email};password={passwort};"));

    let benutzer = state.auth.registrieren(&email, &passwort).await?;

    Ok(Json(json!({ "email": benutzer.email, "message": "user created" })).into_response())
}

/// POST /sessions – Login, setzt den Session-Cookie
pub async fn anmelden<U, S>(
    State(state): State<ApiState<U, S>>,
    Form(formular): Form<AnmeldeFormular>,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let email = pflichtfeld(formular.email, "email")?;
    let passwort = pflichtfeld(formular.password, "password")?;
    formular_loggen("Login", &format!("email={email};password={passwort};"));

    let (benutzer, session) = state.auth.anmelden(&email, &passwort).await?;

    let mut antwort =
        Json(json!({ "email": benutzer.email, "message": "logged in" })).into_response();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        state.gate.cookie_name, session.session_id
    );
    antwort.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| ApiError::Intern(e.to_string()))?,
    );
    Ok(antwort)
}

/// DELETE /sessions – Logout, danach Redirect auf /
pub async fn abmelden<U, S>(
    State(state): State<ApiState<U, S>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let cookie =
        session_cookie(&headers, &state.gate.cookie_name).ok_or(ApiError::Verboten)?;

    // Erst aufloesen: ein abgelaufener oder fremder Cookie ist "Forbidden",
    // nicht "nichts zu tun"
    state.auth.session_aufloesen(&cookie).await?;
    state.auth.abmelden(&cookie).await?;

    Ok(Redirect::to("/").into_response())
}

/// GET /profile – Profil des eingeloggten Benutzers
pub async fn profil<U, S>(
    State(state): State<ApiState<U, S>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let cookie =
        session_cookie(&headers, &state.gate.cookie_name).ok_or(ApiError::Verboten)?;
    let benutzer = state.auth.session_aufloesen(&cookie).await?;

    Ok(Json(json!({ "email": benutzer.email })).into_response())
}

/// GET /users/me – wie /profile, aber hinter dem Request-Gate
pub async fn eigener_benutzer(
    AngemeldeterBenutzer(benutzer): AngemeldeterBenutzer,
) -> Json<serde_json::Value> {
    Json(json!({ "id": benutzer.id, "email": benutzer.email }))
}

/// POST /reset_password – Reset-Token anfordern
pub async fn reset_anfordern<U, S>(
    State(state): State<ApiState<U, S>>,
    Form(formular): Form<ResetAnfrageFormular>,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let email = pflichtfeld(formular.email, "email")?;

    let token = state.auth.reset_token_anfordern(&email).await?;

    Ok(Json(json!({ "email": email, "reset_token": token })).into_response())
}

/// PUT /reset_password – Reset mit Token abschliessen
pub async fn reset_abschliessen<U, S>(
    State(state): State<ApiState<U, S>>,
    Form(formular): Form<ResetAbschlussFormular>,
) -> Result<Response, ApiError>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    let email = pflichtfeld(formular.email, "email")?;
    let token = pflichtfeld(formular.reset_token, "reset_token")?;
    let neues_passwort = pflichtfeld(formular.new_password, "new_password")?;
    formular_loggen(
        "Passwort-Reset",
        &format!("email={email};reset_token={token};new_password={neues_passwort};"),
    );

    state.auth.passwort_zuruecksetzen(&token, &neues_passwort).await?;

    Ok(Json(json!({ "email": email, "message": "password updated" })).into_response())
}

/// Pflichtfeld aus dem Formular holen; leere Strings zaehlen als fehlend
fn pflichtfeld(wert: Option<String>, name: &'static str) -> Result<String, ApiError> {
    match wert {
        Some(w) if !w.is_empty() => Ok(w),
        _ => Err(ApiError::FehlendesFeld(name)),
    }
}

fn formular_loggen(vorgang: &str, formular: &str) {
    tracing::debug!(
        formular = %felder_redigieren(REDIGIERTE_FELDER, "***", formular, ';'),
        "{vorgang} angefragt"
    );
}

//! Request-Gate: Autorisierungsentscheidung pro Request
//!
//! Prueft fuer jeden eingehenden Request ob der Pfad ausgenommen ist,
//! ob ein Berechtigungsnachweis (Basic-Auth-Header oder Session-Cookie)
//! vorliegt und ob er zu einem bekannten Benutzer aufloest. Fehlender
//! Nachweis ergibt 401, vorhandener aber unbrauchbarer 403 – diese
//! Unterscheidung ist Teil des Vertrags.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use tuersteher_auth::AuthError;
use tuersteher_db::{BenutzerRecord, SessionRepository, UserRepository};

use crate::{error::ApiError, ApiState};

/// Authentifizierungsmodus, gewaehlt per Konfiguration
///
/// Der Modus entscheidet auch welche Speicher-Strategie und welcher
/// Ablauf beim Serverstart konfiguriert werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthModus {
    /// Kein Gate: alle Pfade frei
    Keine,
    /// HTTP Basic Auth gegen den Benutzerspeicher
    Basic,
    /// Session-Cookie, In-Memory, ohne Ablauf
    Session,
    /// Session-Cookie, In-Memory, mit Ablauf
    SessionAblauf,
    /// Session-Cookie, persistiert in der Datenbank, mit Ablauf
    SessionDatenbank,
}

impl AuthModus {
    /// Parst den Modus aus einem Konfigurations- oder Umgebungswert
    ///
    /// Unbekannte Werte fallen mit einer Warnung auf `Keine` zurueck.
    pub fn parsen(wert: &str) -> Self {
        match wert.trim().to_ascii_lowercase().as_str() {
            "keine" | "none" => Self::Keine,
            "basic" => Self::Basic,
            "session" => Self::Session,
            "session_ablauf" => Self::SessionAblauf,
            "session_datenbank" => Self::SessionDatenbank,
            sonst => {
                tracing::warn!(modus = sonst, "Unbekannter Auth-Modus, Gate deaktiviert");
                Self::Keine
            }
        }
    }

    /// Gibt true zurueck wenn der Modus Session-Cookies verwendet
    pub fn ist_session_modus(&self) -> bool {
        matches!(
            self,
            Self::Session | Self::SessionAblauf | Self::SessionDatenbank
        )
    }
}

/// Konfiguration des Request-Gates
#[derive(Debug, Clone)]
pub struct GateKonfig {
    pub modus: AuthModus,
    /// Name des Session-Cookies
    pub cookie_name: String,
    /// Vom Gate ausgenommene Pfade; Eintraege enden mit `/` fuer exakte
    /// Treffer oder mit `*` fuer Praefix-Treffer
    pub ausnahmen: Vec<String>,
}

/// Prueft ob ein Pfad vom Gate ausgenommen ist
///
/// Der Pfad wird auf einen abschliessenden `/` normalisiert. Ein
/// Eintrag trifft exakt, oder als Praefix wenn er mit `*` endet.
/// Eine leere Ausnahmenliste nimmt nichts aus.
pub fn ist_ausgenommen(pfad: &str, ausnahmen: &[String]) -> bool {
    if ausnahmen.is_empty() {
        return false;
    }

    let mut pfad = pfad.to_string();
    if !pfad.ends_with('/') {
        pfad.push('/');
    }

    ausnahmen.iter().any(|eintrag| {
        if let Some(praefix) = eintrag.strip_suffix('*') {
            pfad.starts_with(praefix)
        } else {
            pfad == *eintrag
        }
    })
}

/// Dekodiert Anmeldedaten aus einem Basic-Auth-Header
///
/// Erwartet `Basic <base64(email:passwort)>` mit Standard-Base64.
/// Das Passwort darf selbst Doppelpunkte enthalten; getrennt wird am
/// ersten.
pub fn basic_anmeldedaten(header: &str) -> Option<(String, String)> {
    let kodiert = header.strip_prefix("Basic ")?;
    let bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, kodiert).ok()?;
    let klartext = String::from_utf8(bytes).ok()?;
    let (email, passwort) = klartext.split_once(':')?;
    Some((email.to_string(), passwort.to_string()))
}

/// Liest den Session-Cookie mit dem konfigurierten Namen
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|teil| {
        let (k, v) = teil.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// Axum-Middleware: die eigentliche Gate-Entscheidung
///
/// Bei Erfolg wird der aufgeloeste [`BenutzerRecord`] als Request-
/// Extension hinterlegt; Handler holen ihn ueber den
/// [`AngemeldeterBenutzer`]-Extractor.
pub async fn pruefen<U, S>(
    State(state): State<ApiState<U, S>>,
    mut req: Request,
    next: Next,
) -> Response
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    if state.gate.modus == AuthModus::Keine
        || ist_ausgenommen(req.uri().path(), &state.gate.ausnahmen)
    {
        return next.run(req).await;
    }

    let ergebnis = match state.gate.modus {
        AuthModus::Basic => {
            let Some(header) = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
            else {
                return ApiError::NichtAuthentifiziert.into_response();
            };
            let Some((email, passwort)) = basic_anmeldedaten(header) else {
                return ApiError::Verboten.into_response();
            };
            state.auth.anmeldedaten_pruefen(&email, &passwort).await
        }
        _ => {
            let Some(cookie) = session_cookie(req.headers(), &state.gate.cookie_name) else {
                return ApiError::NichtAuthentifiziert.into_response();
            };
            state.auth.session_aufloesen(&cookie).await
        }
    };

    match ergebnis {
        Ok(benutzer) => {
            req.extensions_mut().insert(benutzer);
            next.run(req).await
        }
        Err(e @ (AuthError::Datenbank(_) | AuthError::PasswortHashing(_) | AuthError::Intern(_))) => {
            ApiError::Auth(e).into_response()
        }
        // Nachweis vorhanden, aber keine Identitaet: Forbidden
        Err(_) => ApiError::Verboten.into_response(),
    }
}

/// Extractor fuer den vom Gate aufgeloesten Benutzer
#[derive(Debug, Clone)]
pub struct AngemeldeterBenutzer(pub BenutzerRecord);

#[async_trait]
impl<S> FromRequestParts<S> for AngemeldeterBenutzer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BenutzerRecord>()
            .cloned()
            .map(AngemeldeterBenutzer)
            .ok_or(ApiError::Verboten)
    }
}

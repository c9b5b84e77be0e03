//! Fehlertypen und Status-Abbildung fuer die HTTP-Schnittstelle
//!
//! Die Antwortkoerper sind Teil des Kompatibilitaetsvertrags: generische
//! Texte, die nicht verraten ob eine E-Mail existiert, ob eine Session
//! abgelaufen oder nie ausgestellt war, oder ob ein Token schon
//! verbraucht wurde.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use tuersteher_auth::AuthError;

/// Alle moeglichen Fehler an der HTTP-Grenze
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pflichtfeld fehlt oder ist leer (Formulardaten)
    #[error("Feld '{0}' fehlt")]
    FehlendesFeld(&'static str),

    /// Kein verwertbarer Berechtigungsnachweis vorhanden
    #[error("Nicht authentifiziert")]
    NichtAuthentifiziert,

    /// Nachweis vorhanden, loest aber zu keiner Identitaet auf
    #[error("Zugriff verweigert")]
    Verboten,

    #[error("Nicht gefunden")]
    NichtGefunden,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl ApiError {
    /// HTTP-Statuscode fuer diesen Fehler
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::FehlendesFeld(_) => StatusCode::BAD_REQUEST,
            Self::NichtAuthentifiziert => StatusCode::UNAUTHORIZED,
            Self::Verboten => StatusCode::FORBIDDEN,
            Self::NichtGefunden => StatusCode::NOT_FOUND,
            Self::Auth(e) => match e {
                AuthError::EmailVergeben => StatusCode::BAD_REQUEST,
                AuthError::UngueltigeAnmeldedaten => StatusCode::UNAUTHORIZED,
                AuthError::BenutzerNichtGefunden
                | AuthError::TokenUngueltig
                | AuthError::SessionUngueltig => StatusCode::FORBIDDEN,
                AuthError::PasswortHashing(_)
                | AuthError::Datenbank(_)
                | AuthError::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn koerper(&self) -> serde_json::Value {
        match self {
            Self::FehlendesFeld(feld) => json!({ "error": format!("{feld} missing") }),
            Self::Auth(AuthError::EmailVergeben) => {
                json!({ "message": "email already registered" })
            }
            _ => match self.http_status() {
                StatusCode::UNAUTHORIZED => json!({ "error": "Unauthorized" }),
                StatusCode::FORBIDDEN => json!({ "error": "Forbidden" }),
                StatusCode::NOT_FOUND => json!({ "error": "Not found" }),
                _ => json!({ "error": "Internal server error" }),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Speicherfehler sind fatal fuer den Request, werden aber nie
            // still verschluckt
            tracing::error!(fehler = %self, "Interner Fehler im Request");
        }
        (status, Json(self.koerper())).into_response()
    }
}

//! Fehlertypen fuer den Auth-Service

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
///
/// Nach aussen duerfen `UngueltigeAnmeldedaten`, `SessionUngueltig` und
/// `TokenUngueltig` nicht verraten *warum* sie aufgetreten sind
/// (unbekannte E-Mail vs. falsches Passwort, abgelaufen vs. nie
/// existiert). Die Fehlertexte bleiben deshalb bewusst generisch.
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    #[error("E-Mail oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    // --- Registrierung ---
    #[error("E-Mail bereits registriert")]
    EmailVergeben,

    #[error("Benutzer nicht gefunden")]
    BenutzerNichtGefunden,

    // --- Session ---
    #[error("Session nicht gefunden oder abgelaufen")]
    SessionUngueltig,

    // --- Passwort-Reset ---
    #[error("Reset-Token ungueltig")]
    TokenUngueltig,

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] tuersteher_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;

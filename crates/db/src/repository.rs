//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die Traits sind mit `async_trait` definiert,
//! damit generischer Code (AuthService, Axum-Handler) `Send`-Futures
//! garantiert bekommt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SessionRecord};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://tuersteher.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tuersteher.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    ///
    /// Gibt `DbError::Eindeutigkeit` zurueck wenn die E-Mail bereits
    /// registriert ist.
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand seiner E-Mail-Adresse laden
    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Den Benutzer laden der den angegebenen Reset-Token haelt
    async fn get_by_reset_token(&self, token: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Partielles Update; nur gesetzte Felder werden geaendert
    async fn update(&self, id: Uuid, data: BenutzerUpdate) -> DbResult<BenutzerRecord>;

    /// Zeitstempel des letzten Logins setzen
    async fn update_last_login(&self, id: Uuid) -> DbResult<()>;
}

/// Repository fuer Session-Datenzugriffe
///
/// Bewusst dumm gehalten: die Ablauf-Logik lebt in der SessionRegistry
/// (tuersteher-auth), damit Memory- und SQLite-Speicher identische
/// Semantik haben.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Eine neue Session speichern
    ///
    /// Gibt `DbError::Eindeutigkeit` zurueck wenn die Session-ID bereits
    /// existiert. Ein stilles Ueberschreiben waere eine Verletzung der
    /// Token-Eindeutigkeit.
    async fn insert(&self, session: &SessionRecord) -> DbResult<()>;

    /// Eine Session anhand ihrer ID laden
    async fn get(&self, session_id: &str) -> DbResult<Option<SessionRecord>>;

    /// Eine Session loeschen; gibt den entfernten Datensatz zurueck
    /// (`None` wenn nichts entfernt wurde). Idempotent.
    async fn remove(&self, session_id: &str) -> DbResult<Option<SessionRecord>>;

    /// Alle Sessions eines Benutzers loeschen (z.B. nach Passwort-Reset)
    async fn remove_for_user(&self, user_id: Uuid) -> DbResult<u64>;

    /// Alle Sessions loeschen die vor dem Stichtag erstellt wurden
    async fn remove_created_before(&self, grenze: DateTime<Utc>) -> DbResult<u64>;
}

//! Datenmodelle fuer Benutzer und Sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ein Benutzer-Datensatz wie er in der Datenbank liegt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    /// Eindeutige Benutzer-ID (UUID v4, bei Erstellung vergeben)
    pub id: Uuid,
    /// E-Mail-Adresse, eindeutig, wird gespeichert wie eingegeben
    pub email: String,
    /// Argon2-PHC-String; wird nie per Gleichheit verglichen
    pub password_hash: String,
    /// Aktive Session des Benutzers (maximal eine; Login ueberschreibt)
    pub session_id: Option<String>,
    /// Offener Passwort-Reset-Token (einmal verwendbar)
    pub reset_token: Option<String>,
    /// Zeitpunkt der Registrierung
    pub created_at: DateTime<Utc>,
    /// Zeitpunkt des letzten erfolgreichen Logins
    pub last_login: Option<DateTime<Utc>>,
}

/// Eingabedaten fuer einen neuen Benutzer
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Partielles Update eines Benutzers
///
/// Aeusseres `None` bedeutet "Feld unveraendert lassen". Fuer die
/// nullbaren Spalten bedeutet `Some(None)` "Feld auf NULL setzen"
/// (Session beenden bzw. Reset-Token verbrauchen).
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub password_hash: Option<String>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

/// Ein Session-Datensatz: Zuordnung Session-Token -> Benutzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Der Session-Token (URL-sicheres Base64, 32 Zufallsbytes)
    pub session_id: String,
    /// ID des Benutzers dem diese Session gehoert
    pub user_id: Uuid,
    /// Zeitpunkt der Session-Erstellung; Ablauf wird daraus berechnet
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benutzer_update_standard_ist_leer() {
        let update = BenutzerUpdate::default();
        assert!(update.password_hash.is_none());
        assert!(update.session_id.is_none());
        assert!(update.reset_token.is_none());
    }
}

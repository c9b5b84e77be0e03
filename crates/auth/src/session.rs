//! Session-Registry fuer Tuersteher
//!
//! Die Registry komponiert eine Speicher-Strategie ([`SessionRepository`]:
//! In-Memory oder SQLite) mit einer Ablauf-Politik (`ablauf_sekunden`,
//! kleiner/gleich 0 = Sessions laufen nie ab). Damit entsteht aus einer
//! Struktur das was sonst eine Vererbungskette waere: Session,
//! Session-mit-Ablauf, Session-in-Datenbank.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use tokio::sync::RwLock;
use uuid::Uuid;

use tuersteher_db::{DbError, DbResult, SessionRecord, SessionRepository};

use crate::error::AuthResult;

/// Intervall fuer den automatischen Cleanup-Task: 15 Minuten
const CLEANUP_INTERVALL: Duration = Duration::from_secs(15 * 60);

/// Generiert einen kryptografisch sicheren Token (URL-sicheres Base64)
///
/// 32 Zufallsbytes aus dem OS-CSPRNG; Kollisionen sind praktisch
/// ausgeschlossen. Wird fuer Session-IDs und Reset-Tokens verwendet.
pub fn token_generieren() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// In-Memory Session-Speicher
///
/// Keine Persistenz: bei einem Neustart sind alle Sessions weg.
/// Schreibzugriffe serialisiert ein async RwLock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    /// session_id -> SessionRecord
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Erstellt einen neuen leeren Session-Speicher
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn insert(&self, session: &SessionRecord) -> DbResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            // Stilles Ueberschreiben wuerde eine fremde Session kapern
            return Err(DbError::Eindeutigkeit("Session-ID bereits vergeben".into()));
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> DbResult<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> DbResult<Option<SessionRecord>> {
        Ok(self.sessions.write().await.remove(session_id))
    }

    async fn remove_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let mut sessions = self.sessions.write().await;
        let vorher = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((vorher - sessions.len()) as u64)
    }

    async fn remove_created_before(&self, grenze: DateTime<Utc>) -> DbResult<u64> {
        let mut sessions = self.sessions.write().await;
        let vorher = sessions.len();
        sessions.retain(|_, s| s.created_at > grenze);
        Ok((vorher - sessions.len()) as u64)
    }
}

/// Session-Registry: Speicher-Strategie plus Ablauf-Politik
pub struct SessionRegistry<S: SessionRepository> {
    store: Arc<S>,
    /// Lebensdauer einer Session in Sekunden; <= 0 = laeuft nie ab
    ablauf_sekunden: i64,
}

impl<S: SessionRepository> SessionRegistry<S> {
    /// Erstellt eine neue Registry ueber dem gegebenen Speicher
    pub fn neu(store: Arc<S>, ablauf_sekunden: i64) -> Self {
        Self {
            store,
            ablauf_sekunden,
        }
    }

    /// Erstellt eine neue Session fuer den angegebenen Benutzer
    ///
    /// Eine Token-Kollision meldet der Speicher als
    /// Eindeutigkeitsfehler; sie wird nicht still ueberschrieben.
    pub async fn erstellen(&self, user_id: Uuid) -> AuthResult<SessionRecord> {
        let session = SessionRecord {
            session_id: token_generieren(),
            user_id,
            created_at: Utc::now(),
        };
        self.store.insert(&session).await?;
        tracing::debug!(user_id = %user_id, "Neue Session erstellt");
        Ok(session)
    }

    /// Loest eine Session-ID zum Benutzer auf
    ///
    /// Gibt `None` zurueck wenn die Session nicht existiert ODER
    /// abgelaufen ist. Die beiden Faelle sind fuer den Aufrufer bewusst
    /// nicht unterscheidbar.
    pub async fn aufloesen(&self, session_id: &str) -> AuthResult<Option<Uuid>> {
        let Some(session) = self.store.get(session_id).await? else {
            return Ok(None);
        };
        if self.ist_abgelaufen(session.created_at) {
            return Ok(None);
        }
        Ok(Some(session.user_id))
    }

    /// Entfernt eine Session; gibt den entfernten Datensatz zurueck
    ///
    /// Idempotent: zweites Entfernen liefert `None`.
    pub async fn entfernen(&self, session_id: &str) -> AuthResult<Option<SessionRecord>> {
        let entfernt = self.store.remove(session_id).await?;
        if entfernt.is_some() {
            tracing::debug!("Session entfernt");
        }
        Ok(entfernt)
    }

    /// Entfernt alle Sessions eines Benutzers (z.B. nach Passwort-Reset)
    pub async fn alle_fuer_benutzer_entfernen(&self, user_id: Uuid) -> AuthResult<u64> {
        let entfernt = self.store.remove_for_user(user_id).await?;
        if entfernt > 0 {
            tracing::debug!(user_id = %user_id, anzahl = entfernt, "Alle Benutzer-Sessions entfernt");
        }
        Ok(entfernt)
    }

    /// Entfernt alle abgelaufenen Sessions aus dem Speicher
    ///
    /// No-op wenn Sessions nie ablaufen. Das Aufraeumen ist reine
    /// Speicherhygiene; `aufloesen` behandelt abgelaufene Sessions auch
    /// ohne Cleanup korrekt als nicht vorhanden.
    pub async fn abgelaufene_entfernen(&self) -> AuthResult<u64> {
        if self.ablauf_sekunden <= 0 {
            return Ok(0);
        }
        let grenze = Utc::now() - chrono::Duration::seconds(self.ablauf_sekunden);
        Ok(self.store.remove_created_before(grenze).await?)
    }

    /// Startet den periodischen Cleanup-Task fuer diese Registry
    pub fn cleanup_starten(registry: Arc<Self>)
    where
        S: 'static,
    {
        if registry.ablauf_sekunden <= 0 {
            return;
        }
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVALL).await;
                match registry.abgelaufene_entfernen().await {
                    Ok(entfernt) if entfernt > 0 => {
                        tracing::debug!(anzahl = entfernt, "Abgelaufene Sessions bereinigt");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(fehler = %e, "Session-Cleanup fehlgeschlagen"),
                }
            }
        });
    }

    fn ist_abgelaufen(&self, created_at: DateTime<Utc>) -> bool {
        self.ablauf_sekunden > 0
            && Utc::now() >= created_at + chrono::Duration::seconds(self.ablauf_sekunden)
    }
}

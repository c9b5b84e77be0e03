//! Auth-Service fuer Tuersteher
//!
//! Zentraler Service fuer Registrierung, Login, Session-Aufloesung,
//! Logout und den Passwort-Reset. Nutzt das UserRepository und die
//! SessionRegistry; Argon2-Hashing laeuft ueber `spawn_blocking`, damit
//! es die async-Worker nicht blockiert.

use std::sync::Arc;

use tuersteher_db::{
    BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SessionRecord, SessionRepository,
    UserRepository,
};

use crate::{
    error::{AuthError, AuthResult},
    password::{passwort_hashen, passwort_verifizieren},
    session::{token_generieren, SessionRegistry},
};

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    user_repo: Arc<U>,
    registry: Arc<SessionRegistry<S>>,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    /// Erstellt einen neuen AuthService
    pub fn neu(user_repo: Arc<U>, registry: Arc<SessionRegistry<S>>) -> Self {
        Self {
            user_repo,
            registry,
        }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Gibt `AuthError::EmailVergeben` zurueck wenn die E-Mail bereits
    /// registriert ist.
    pub async fn registrieren(&self, email: &str, passwort: &str) -> AuthResult<BenutzerRecord> {
        if self.user_repo.get_by_email(email).await?.is_some() {
            return Err(AuthError::EmailVergeben);
        }

        let passwort_hash = hashen_blocking(passwort.to_string()).await?;

        let benutzer = self
            .user_repo
            .create(NeuerBenutzer {
                email,
                password_hash: &passwort_hash,
            })
            .await
            .map_err(|e| {
                // Paralleler Registrierungsversuch kann das UNIQUE-Constraint
                // noch nach der Vorpruefung ausloesen
                if e.ist_eindeutigkeit() {
                    AuthError::EmailVergeben
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(user_id = %benutzer.id, email = %benutzer.email, "Neuer Benutzer registriert");

        Ok(benutzer)
    }

    /// Meldet einen Benutzer an und erstellt eine neue Session
    ///
    /// Unbekannte E-Mail und falsches Passwort liefern denselben Fehler,
    /// damit kein Orakel fuer existierende Konten entsteht.
    pub async fn anmelden(
        &self,
        email: &str,
        passwort: &str,
    ) -> AuthResult<(BenutzerRecord, SessionRecord)> {
        let benutzer = self.anmeldedaten_pruefen(email, passwort).await?;

        let session = self.registry.erstellen(benutzer.id).await?;

        // Aktive Session am Benutzer vermerken (ein spaeterer Login
        // ueberschreibt sie) und letzten Login aktualisieren
        let benutzer = self
            .user_repo
            .update(
                benutzer.id,
                BenutzerUpdate {
                    session_id: Some(Some(session.session_id.clone())),
                    ..Default::default()
                },
            )
            .await?;
        self.user_repo.update_last_login(benutzer.id).await?;

        tracing::info!(user_id = %benutzer.id, email = %benutzer.email, "Benutzer angemeldet");

        Ok((benutzer, session))
    }

    /// Prueft E-Mail und Passwort ohne eine Session auszustellen
    ///
    /// Wird vom Basic-Auth-Gate verwendet.
    pub async fn anmeldedaten_pruefen(
        &self,
        email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        let korrekt =
            verifizieren_blocking(passwort.to_string(), benutzer.password_hash.clone()).await?;
        if !korrekt {
            tracing::warn!(email = %email, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        Ok(benutzer)
    }

    /// Loest eine Session-ID zum zugehoerigen Benutzer auf
    ///
    /// Gibt `AuthError::SessionUngueltig` zurueck wenn die Session nicht
    /// (mehr) existiert, abgelaufen ist oder der Benutzer inzwischen
    /// verschwunden ist.
    pub async fn session_aufloesen(&self, session_id: &str) -> AuthResult<BenutzerRecord> {
        let user_id = self
            .registry
            .aufloesen(session_id)
            .await?
            .ok_or(AuthError::SessionUngueltig)?;

        // Defensiv: Session ohne Benutzer verhaelt sich wie keine Session
        self.user_repo
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::SessionUngueltig)
    }

    /// Meldet einen Benutzer ab
    ///
    /// Gibt `Ok(true)` zurueck wenn eine Session entfernt wurde,
    /// `Ok(false)` wenn es nichts zu entfernen gab (idempotent).
    pub async fn abmelden(&self, session_id: &str) -> AuthResult<bool> {
        let Some(entfernt) = self.registry.entfernen(session_id).await? else {
            return Ok(false);
        };

        // Redundant getrackte session_id am Benutzer leeren
        if let Some(benutzer) = self.user_repo.get_by_id(entfernt.user_id).await? {
            if benutzer.session_id.as_deref() == Some(session_id) {
                self.user_repo
                    .update(
                        benutzer.id,
                        BenutzerUpdate {
                            session_id: Some(None),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }

        tracing::debug!("Benutzer abgemeldet");
        Ok(true)
    }

    /// Fordert einen Passwort-Reset-Token an
    ///
    /// Ein neuer Token ueberschreibt einen eventuell noch offenen; der
    /// alte Token ist danach ungueltig.
    pub async fn reset_token_anfordern(&self, email: &str) -> AuthResult<String> {
        let benutzer = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or(AuthError::BenutzerNichtGefunden)?;

        let token = token_generieren();
        self.user_repo
            .update(
                benutzer.id,
                BenutzerUpdate {
                    reset_token: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %benutzer.id, "Passwort-Reset-Token ausgestellt");
        Ok(token)
    }

    /// Schliesst einen Passwort-Reset ab
    ///
    /// Der Token ist einmal verwendbar und wird beim Erfolg geleert.
    /// Alle bestehenden Sessions des Benutzers werden entfernt.
    pub async fn passwort_zuruecksetzen(
        &self,
        reset_token: &str,
        neues_passwort: &str,
    ) -> AuthResult<()> {
        let benutzer = self
            .user_repo
            .get_by_reset_token(reset_token)
            .await?
            .ok_or(AuthError::TokenUngueltig)?;

        let neuer_hash = hashen_blocking(neues_passwort.to_string()).await?;

        self.user_repo
            .update(
                benutzer.id,
                BenutzerUpdate {
                    password_hash: Some(neuer_hash),
                    reset_token: Some(None),
                    session_id: Some(None),
                },
            )
            .await?;

        let anzahl = self.registry.alle_fuer_benutzer_entfernen(benutzer.id).await?;
        tracing::info!(
            user_id = %benutzer.id,
            entfernte_sessions = anzahl,
            "Passwort zurueckgesetzt, Sessions entfernt"
        );

        Ok(())
    }
}

/// Argon2-Hashing auf dem Blocking-Pool ausfuehren
async fn hashen_blocking(passwort: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || passwort_hashen(&passwort))
        .await
        .map_err(|e| AuthError::intern(format!("Hashing-Task abgebrochen: {e}")))?
}

/// Argon2-Verifikation auf dem Blocking-Pool ausfuehren
async fn verifizieren_blocking(passwort: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || passwort_verifizieren(&passwort, &hash))
        .await
        .map_err(|e| AuthError::intern(format!("Verifikations-Task abgebrochen: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    use tuersteher_db::{DbError, DbResult};

    use crate::session::MemorySessionStore;

    // Minimales In-Memory UserRepository fuer Tests
    #[derive(Default)]
    struct TestBenutzerRepo {
        benutzer: Mutex<Vec<BenutzerRecord>>,
    }

    #[async_trait]
    impl UserRepository for TestBenutzerRepo {
        async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            if benutzer.iter().any(|u| u.email == data.email) {
                return Err(DbError::Eindeutigkeit(data.email.to_string()));
            }
            let record = BenutzerRecord {
                id: Uuid::new_v4(),
                email: data.email.to_string(),
                password_hash: data.password_hash.to_string(),
                session_id: None,
                reset_token: None,
                created_at: Utc::now(),
                last_login: None,
            };
            benutzer.push(record.clone());
            Ok(record)
        }

        async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>> {
            Ok(self.benutzer.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn get_by_reset_token(&self, token: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.reset_token.as_deref() == Some(token))
                .cloned())
        }

        async fn update(&self, id: Uuid, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            let user = benutzer
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
            if let Some(hash) = data.password_hash {
                user.password_hash = hash;
            }
            if let Some(session_id) = data.session_id {
                user.session_id = session_id;
            }
            if let Some(reset_token) = data.reset_token {
                user.reset_token = reset_token;
            }
            Ok(user.clone())
        }

        async fn update_last_login(&self, id: Uuid) -> DbResult<()> {
            let mut benutzer = self.benutzer.lock().unwrap();
            if let Some(user) = benutzer.iter_mut().find(|u| u.id == id) {
                user.last_login = Some(Utc::now());
            }
            Ok(())
        }
    }

    fn test_service() -> AuthService<TestBenutzerRepo, MemorySessionStore> {
        let repo = Arc::new(TestBenutzerRepo::default());
        let registry = Arc::new(SessionRegistry::neu(Arc::new(MemorySessionStore::neu()), 0));
        AuthService::neu(repo, registry)
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let service = test_service();

        let benutzer = service
            .registrieren("a@x.com", "pw1")
            .await
            .expect("Registrierung fehlgeschlagen");
        assert_eq!(benutzer.email, "a@x.com");
        assert!(benutzer.last_login.is_none());

        let (angemeldeter, session) = service
            .anmelden("a@x.com", "pw1")
            .await
            .expect("Anmeldung fehlgeschlagen");

        assert_eq!(angemeldeter.id, benutzer.id);
        assert!(!session.session_id.is_empty());
        assert_eq!(
            angemeldeter.session_id.as_deref(),
            Some(session.session_id.as_str())
        );
    }

    #[tokio::test]
    async fn doppelte_registrierung_schlaegt_fehl() {
        let service = test_service();
        service.registrieren("duplikat@x.com", "pw").await.unwrap();
        let ergebnis = service.registrieren("duplikat@x.com", "anderes").await;
        assert!(matches!(ergebnis, Err(AuthError::EmailVergeben)));
    }

    #[tokio::test]
    async fn falsches_passwort_und_unbekannte_email_sehen_gleich_aus() {
        let service = test_service();
        service.registrieren("user@x.com", "richtig").await.unwrap();

        let falsches_passwort = service.anmelden("user@x.com", "falsch").await;
        assert!(matches!(
            falsches_passwort,
            Err(AuthError::UngueltigeAnmeldedaten)
        ));

        let unbekannte_email = service.anmelden("niemand@x.com", "egal").await;
        assert!(matches!(
            unbekannte_email,
            Err(AuthError::UngueltigeAnmeldedaten)
        ));
    }

    #[tokio::test]
    async fn session_lebenszyklus_komplett() {
        let service = test_service();
        let benutzer = service.registrieren("a@x.com", "pw1").await.unwrap();

        let (_, session) = service.anmelden("a@x.com", "pw1").await.unwrap();

        let aufgeloester = service.session_aufloesen(&session.session_id).await.unwrap();
        assert_eq!(aufgeloester.id, benutzer.id);

        // Logout entfernt die Session und leert den Vermerk am Benutzer
        assert!(service.abmelden(&session.session_id).await.unwrap());
        let ergebnis = service.session_aufloesen(&session.session_id).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));

        let nach_logout = service
            .anmeldedaten_pruefen("a@x.com", "pw1")
            .await
            .unwrap();
        assert!(nach_logout.session_id.is_none());

        // Zweiter Logout meldet: nichts entfernt
        assert!(!service.abmelden(&session.session_id).await.unwrap());
    }

    #[tokio::test]
    async fn ungueltige_session_wird_abgelehnt() {
        let service = test_service();
        let ergebnis = service.session_aufloesen("kein_gueltiger_token").await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn reset_token_fuer_unbekannte_email_abgelehnt() {
        let service = test_service();
        let ergebnis = service.reset_token_anfordern("niemand@x.com").await;
        assert!(matches!(ergebnis, Err(AuthError::BenutzerNichtGefunden)));
    }

    #[tokio::test]
    async fn neuer_reset_token_invalidiert_den_alten() {
        let service = test_service();
        service.registrieren("a@x.com", "pw1").await.unwrap();

        let t1 = service.reset_token_anfordern("a@x.com").await.unwrap();
        let t2 = service.reset_token_anfordern("a@x.com").await.unwrap();
        assert_ne!(t1, t2);

        // Der ueberschriebene Token ist nicht mehr verwendbar
        let mit_altem = service.passwort_zuruecksetzen(&t1, "neu").await;
        assert!(matches!(mit_altem, Err(AuthError::TokenUngueltig)));

        // Der aktuelle Token funktioniert genau einmal
        service.passwort_zuruecksetzen(&t2, "neues_pw").await.unwrap();
        let nochmal = service.passwort_zuruecksetzen(&t2, "drittes_pw").await;
        assert!(matches!(nochmal, Err(AuthError::TokenUngueltig)));
    }

    #[tokio::test]
    async fn reset_setzt_passwort_und_beendet_sessions() {
        let service = test_service();
        service.registrieren("a@x.com", "altes_pw").await.unwrap();
        let (_, session) = service.anmelden("a@x.com", "altes_pw").await.unwrap();

        let token = service.reset_token_anfordern("a@x.com").await.unwrap();
        service.passwort_zuruecksetzen(&token, "neues_pw").await.unwrap();

        // Bestehende Session ist weg
        let ergebnis = service.session_aufloesen(&session.session_id).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));

        // Altes Passwort funktioniert nicht mehr, neues schon
        let mit_altem = service.anmelden("a@x.com", "altes_pw").await;
        assert!(matches!(mit_altem, Err(AuthError::UngueltigeAnmeldedaten)));
        service.anmelden("a@x.com", "neues_pw").await.unwrap();
    }
}

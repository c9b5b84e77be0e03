//! tuersteher-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Auth-Service und HTTP-Schnittstelle und stellt
//! den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::Result;

use config::ServerConfig;
use tuersteher_api::{ApiServer, ApiServerKonfig, ApiState, AuthModus, GateKonfig};
use tuersteher_auth::{AuthService, MemorySessionStore, SessionRegistry};
use tuersteher_db::{DatabaseConfig, SessionRepository, SqliteDb};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen, Migrationen ausfuehren
    /// 2. Session-Speicher passend zum Auth-Modus waehlen
    /// 3. HTTP-Schnittstelle starten und auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            modus = ?self.config.auth.modus,
            http = %self.config.http_bind_adresse(),
            "Server startet"
        );

        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = Arc::new(SqliteDb::oeffnen(&db_config).await?);
        tracing::info!(url = %self.config.datenbank.url, "Datenbank bereit");

        // Die Lebensdauer greift nur in den Ablauf-Modi
        let ablauf = match self.config.auth.modus {
            AuthModus::SessionAblauf | AuthModus::SessionDatenbank => {
                self.config.auth.session_dauer_sekunden
            }
            _ => 0,
        };

        match self.config.auth.modus {
            // Sessions ueberleben einen Neustart in der Datenbank
            AuthModus::SessionDatenbank => {
                self.laufen(Arc::clone(&db), Arc::clone(&db), ablauf).await
            }
            // Alle anderen Modi halten Sessions im Speicher
            _ => {
                self.laufen(db, Arc::new(MemorySessionStore::neu()), ablauf)
                    .await
            }
        }
    }

    async fn laufen<S>(self, db: Arc<SqliteDb>, store: Arc<S>, ablauf: i64) -> Result<()>
    where
        S: SessionRepository + 'static,
    {
        let registry = Arc::new(SessionRegistry::neu(store, ablauf));
        SessionRegistry::cleanup_starten(Arc::clone(&registry));

        let auth = Arc::new(AuthService::neu(db, registry));

        let gate = Arc::new(GateKonfig {
            modus: self.config.auth.modus,
            cookie_name: self.config.auth.cookie_name.clone(),
            ausnahmen: self.config.auth.ausnahmen.clone(),
        });

        let state = ApiState { auth, gate };

        let api_konfig = ApiServerKonfig {
            bind_addr: self.config.http_bind_adresse().parse()?,
            cors_origins: self.config.server.cors_origins.clone(),
        };

        ApiServer::neu(api_konfig).starten(state).await
    }
}

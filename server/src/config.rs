//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einzelne Werte lassen sich per Umgebungsvariable
//! ueberschreiben (TS_AUTH_MODUS, TS_SESSION_NAME, TS_SESSION_DAUER,
//! TS_DATENBANK_URL).

use serde::{Deserialize, Serialize};

use tuersteher_api::AuthModus;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Authentifizierungs-Einstellungen
    pub auth: AuthEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Bind-Adresse fuer die HTTP-Schnittstelle
    pub bind_adresse: String,
    /// Port fuer die HTTP-Schnittstelle
    pub port: u16,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 5000,
            cors_origins: vec![],
        }
    }
}

/// Authentifizierungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// Auth-Modus: keine | basic | session | session_ablauf | session_datenbank
    pub modus: AuthModus,
    /// Name des Session-Cookies
    pub cookie_name: String,
    /// Session-Lebensdauer in Sekunden; <= 0 = Sessions laufen nie ab
    pub session_dauer_sekunden: i64,
    /// Vom Request-Gate ausgenommene Pfade
    pub ausnahmen: Vec<String>,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            modus: AuthModus::Session,
            cookie_name: "_my_session_id".into(),
            session_dauer_sekunden: 0,
            // Die Vertrags-Endpunkte machen ihre Session-Pruefung selbst
            ausnahmen: [
                "/",
                "/status/",
                "/users/",
                "/sessions/",
                "/profile/",
                "/reset_password/",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus fuer SQLite
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://tuersteher.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Umgebungsvariablen ueberschreiben die Datei.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.umgebung_anwenden();
        Ok(config)
    }

    /// Wendet die Umgebungs-Overrides an
    fn umgebung_anwenden(&mut self) {
        if let Ok(modus) = std::env::var("TS_AUTH_MODUS") {
            self.auth.modus = AuthModus::parsen(&modus);
        }
        if let Ok(name) = std::env::var("TS_SESSION_NAME") {
            self.auth.cookie_name = name;
        }
        if let Ok(dauer) = std::env::var("TS_SESSION_DAUER") {
            // Unparsbare Dauer bedeutet: kein Ablauf
            self.auth.session_dauer_sekunden = dauer.parse().unwrap_or(0);
        }
        if let Ok(url) = std::env::var("TS_DATENBANK_URL") {
            self.datenbank.url = url;
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer HTTP zurueck
    pub fn http_bind_adresse(&self) -> String {
        format!("{}:{}", self.server.bind_adresse, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.auth.modus, AuthModus::Session);
        assert_eq!(cfg.auth.cookie_name, "_my_session_id");
        assert_eq!(cfg.auth.session_dauer_sekunden, 0);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.auth.ausnahmen.contains(&"/profile/".to_string()));
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_bind_adresse(), "0.0.0.0:5000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            port = 8080

            [auth]
            modus = "session_ablauf"
            session_dauer_sekunden = 3600
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.modus, AuthModus::SessionAblauf);
        assert_eq!(cfg.auth.session_dauer_sekunden, 3600);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.auth.cookie_name, "_my_session_id");
        assert_eq!(cfg.datenbank.max_verbindungen, 5);
    }
}

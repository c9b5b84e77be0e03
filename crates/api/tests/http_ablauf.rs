//! Black-Box-Tests fuer die HTTP-Schnittstelle
//!
//! Startet den echten Router (In-Memory-SQLite fuer Benutzer, In-Memory-
//! Session-Speicher) auf einem ephemeren Port und spricht ihn wie ein
//! Client ueber reqwest an.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;

use tuersteher_api::{ApiState, AuthModus, GateKonfig};
use tuersteher_auth::{AuthService, MemorySessionStore, SessionRegistry};
use tuersteher_db::SqliteDb;

const COOKIE_NAME: &str = "_my_session_id";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Startet den Router mit Session-Modus auf einem ephemeren Port
    async fn spawn() -> Self {
        let db = Arc::new(
            SqliteDb::in_memory()
                .await
                .expect("In-Memory-Datenbank konnte nicht erstellt werden"),
        );
        let registry = Arc::new(SessionRegistry::neu(Arc::new(MemorySessionStore::neu()), 0));
        let auth = Arc::new(AuthService::neu(db, registry));
        let gate = Arc::new(GateKonfig {
            modus: AuthModus::Session,
            cookie_name: COOKIE_NAME.into(),
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
        });

        let app = tuersteher_api::router(ApiState { auth, gate });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Ephemerer Port konnte nicht gebunden werden");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Client ohne automatische Redirects (der 303 nach Logout soll sichtbar bleiben)
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Liest den Session-Token aus dem Set-Cookie-Header einer Antwort
fn session_token(res: &reqwest::Response) -> String {
    let cookie = res
        .headers()
        .get("set-cookie")
        .expect("Set-Cookie-Header fehlt")
        .to_str()
        .unwrap();
    let (name_wert, _) = cookie.split_once(';').unwrap_or((cookie, ""));
    let (name, wert) = name_wert.split_once('=').unwrap();
    assert_eq!(name, COOKIE_NAME);
    wert.to_string()
}

async fn registrieren(client: &reqwest::Client, base: &str, email: &str, passwort: &str) {
    let res = client
        .post(format!("{base}/users"))
        .form(&[("email", email), ("password", passwort)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn willkommen_status_und_fallback() {
    let server = TestServer::spawn().await;
    let client = client();

    let res = client.get(&server.base_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["message"], "Bienvenue");

    let res = client
        .get(format!("{}/status", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["status"], "OK");

    let res = client
        .get(format!("{}/gibt_es_nicht", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["error"], "Not found");
}

#[tokio::test]
async fn registrierung_und_duplikat() {
    let server = TestServer::spawn().await;
    let client = client();
    let base = &server.base_url;

    let res = client
        .post(format!("{base}/users"))
        .form(&[("email", "a@x.com"), ("password", "pw1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["email"], "a@x.com");
    assert_eq!(koerper["message"], "user created");

    // Zweite Registrierung derselben E-Mail: 400
    let res = client
        .post(format!("{base}/users"))
        .form(&[("email", "a@x.com"), ("password", "anderes")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["message"], "email already registered");
}

#[tokio::test]
async fn fehlende_formularfelder() {
    let server = TestServer::spawn().await;
    let client = client();
    let base = &server.base_url;

    let res = client
        .post(format!("{base}/users"))
        .form(&[("password", "pw1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["error"], "email missing");

    let res = client
        .post(format!("{base}/users"))
        .form(&[("email", "a@x.com"), ("password", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["error"], "password missing");
}

#[tokio::test]
async fn login_profil_logout_kompletter_ablauf() {
    let server = TestServer::spawn().await;
    let client = client();
    let base = &server.base_url;

    registrieren(&client, base, "a@x.com", "pw1").await;

    // Falsches Passwort: 401, gleicher Koerper wie unbekannte E-Mail
    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "a@x.com"), ("password", "falsch")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let falsches_passwort: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "niemand@x.com"), ("password", "egal")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let unbekannte_email: Value = res.json().await.unwrap();
    assert_eq!(falsches_passwort, unbekannte_email);

    // Erfolgreicher Login setzt den Session-Cookie
    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "a@x.com"), ("password", "pw1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let token = session_token(&res);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["message"], "logged in");

    // Profil mit Cookie
    let res = client
        .get(format!("{base}/profile"))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["email"], "a@x.com");

    // Profil ohne Cookie: 403
    let res = client.get(format!("{base}/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Logout: 303 auf /
    let res = client
        .delete(format!("{base}/sessions"))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get("location").unwrap(), "/");

    // Session ist weg: Profil und zweiter Logout geben 403
    let res = client
        .get(format!("{base}/profile"))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{base}/sessions"))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gate_unterscheidet_401_und_403() {
    let server = TestServer::spawn().await;
    let client = client();
    let base = &server.base_url;

    registrieren(&client, base, "a@x.com", "pw1").await;

    // Kein Nachweis: 401
    let res = client.get(format!("{base}/users/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["error"], "Unauthorized");

    // Nachweis vorhanden, aber unbrauchbar: 403
    let res = client
        .get(format!("{base}/users/me"))
        .header("Cookie", format!("{COOKIE_NAME}=erfundener_token"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["error"], "Forbidden");

    // Gueltige Session: 200 mit Identitaet
    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "a@x.com"), ("password", "pw1")])
        .send()
        .await
        .unwrap();
    let token = session_token(&res);

    let res = client
        .get(format!("{base}/users/me"))
        .header("Cookie", format!("{COOKIE_NAME}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["email"], "a@x.com");
    assert!(koerper["id"].is_string());
}

#[tokio::test]
async fn passwort_reset_ablauf() {
    let server = TestServer::spawn().await;
    let client = client();
    let base = &server.base_url;

    registrieren(&client, base, "a@x.com", "altes_pw").await;

    // Unbekannte E-Mail: 403
    let res = client
        .post(format!("{base}/reset_password"))
        .form(&[("email", "niemand@x.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Token anfordern; ein zweiter Token invalidiert den ersten
    let res = client
        .post(format!("{base}/reset_password"))
        .form(&[("email", "a@x.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    let t1 = koerper["reset_token"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{base}/reset_password"))
        .form(&[("email", "a@x.com")])
        .send()
        .await
        .unwrap();
    let koerper: Value = res.json().await.unwrap();
    let t2 = koerper["reset_token"].as_str().unwrap().to_string();
    assert_ne!(t1, t2);

    // Alter Token: 403
    let res = client
        .put(format!("{base}/reset_password"))
        .form(&[
            ("email", "a@x.com"),
            ("reset_token", t1.as_str()),
            ("new_password", "neues_pw"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Aktueller Token: 200
    let res = client
        .put(format!("{base}/reset_password"))
        .form(&[
            ("email", "a@x.com"),
            ("reset_token", t2.as_str()),
            ("new_password", "neues_pw"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let koerper: Value = res.json().await.unwrap();
    assert_eq!(koerper["message"], "password updated");

    // Login verlangt jetzt das neue Passwort
    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "a@x.com"), ("password", "altes_pw")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{base}/sessions"))
        .form(&[("email", "a@x.com"), ("password", "neues_pw")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

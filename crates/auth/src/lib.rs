//! tuersteher-auth – Authentifizierungs-Kern
//!
//! Enthaelt das Passwort-Hashing (Argon2id), die SessionRegistry
//! (Speicher-Strategie mal Ablauf-Politik) und den AuthService, der
//! Registrierung, Login, Session-Aufloesung, Logout und den
//! Passwort-Reset orchestriert.

pub mod error;
pub mod password;
pub mod service;
pub mod session;

pub use error::{AuthError, AuthResult};
pub use service::AuthService;
pub use session::{MemorySessionStore, SessionRegistry};

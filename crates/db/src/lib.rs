//! tuersteher-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit: die Geschaeftslogik
//! in tuersteher-auth spricht ausschliesslich mit den Traits
//! [`UserRepository`] und [`SessionRepository`], die konkrete
//! SQLite-Implementierung haengt an [`SqliteDb`].

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SessionRecord};
pub use repository::{DatabaseConfig, SessionRepository, UserRepository};
pub use sqlite::pool::SqliteDb;

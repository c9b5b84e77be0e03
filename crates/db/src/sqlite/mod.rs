//! SQLite-Implementierungen der Repositories

pub mod pool;
mod sessions;
mod users;

//! plausch-db – Datenbank-Schicht fuer Plausch
//!
//! Persistenz fuer Benutzer, Unterhaltungen, Nachrichten und Anrufe.
//! Die Live-Schicht greift ausschliesslich ueber die Repository-Traits
//! in [`repository`] zu; `SqliteDb` ist die produktive Implementierung.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

// Bequeme Re-Exporte
pub use error::DbError;
pub use repository::{
    AnrufRepository, BenutzerRepository, DatabaseConfig, DbResult, NachrichtenRepository,
    TeilnehmerRepository,
};
pub use sqlite::SqliteDb;

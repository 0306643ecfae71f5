//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod calls;
pub mod conversations;
pub mod messages;
pub mod pool;
pub mod users;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::repository::DbResult;

/// Parst einen RFC-3339-Zeitstempel aus einer TEXT-Spalte
pub(crate) fn zeit_parsen(spalte: &str, wert: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(wert)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige {spalte} '{wert}': {e}")))
}

/// Parst einen optionalen RFC-3339-Zeitstempel
pub(crate) fn zeit_parsen_opt(
    spalte: &str,
    wert: Option<&str>,
) -> DbResult<Option<DateTime<Utc>>> {
    wert.map(|s| zeit_parsen(spalte, s)).transpose()
}

/// Parst eine UUID aus einer TEXT-Spalte
pub(crate) fn uuid_parsen(spalte: &str, wert: &str) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(wert)
        .map_err(|e| DbError::intern(format!("Ungueltige {spalte} '{wert}': {e}")))
}

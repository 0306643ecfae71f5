//! SQLite-Implementierung des BenutzerRepository

use chrono::{DateTime, Utc};
use uuid::Uuid;

use plausch_core::types::UserId;

use crate::error::DbError;
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::{BenutzerRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_parsen, zeit_parsen, zeit_parsen_opt};

impl BenutzerRepository for SqliteDb {
    async fn benutzer_erstellen(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = UserId(Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, email, display_name, is_online, last_seen, created_at)
             VALUES (?, ?, ?, 0, NULL, ?)",
        )
        .bind(id.inner().to_string())
        .bind(data.email)
        .bind(data.display_name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("E-Mail '{}' bereits vergeben", data.email))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(BenutzerRecord {
            id,
            email: data.email.to_string(),
            display_name: data.display_name.map(str::to_string),
            is_online: false,
            last_seen: None,
            created_at: now,
        })
    }

    async fn benutzer_laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, is_online, last_seen, created_at
             FROM users WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn praesenz_setzen(&self, id: UserId, online: bool) -> DbResult<Option<DateTime<Utc>>> {
        if online {
            let affected = sqlx::query("UPDATE users SET is_online = 1 WHERE id = ?")
                .bind(id.inner().to_string())
                .execute(&self.pool)
                .await?
                .rows_affected();
            if affected == 0 {
                return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
            }
            Ok(None)
        } else {
            let last_seen = Utc::now();
            let affected =
                sqlx::query("UPDATE users SET is_online = 0, last_seen = ? WHERE id = ?")
                    .bind(last_seen.to_rfc3339())
                    .bind(id.inner().to_string())
                    .execute(&self.pool)
                    .await?
                    .rows_affected();
            if affected == 0 {
                return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
            }
            Ok(Some(last_seen))
        }
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let created_at_str: String = row.try_get("created_at")?;
    let last_seen: Option<String> = row.try_get("last_seen")?;
    let is_online: i64 = row.try_get("is_online")?;

    Ok(BenutzerRecord {
        id: UserId(uuid_parsen("id", &id_str)?),
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        is_online: is_online != 0,
        last_seen: zeit_parsen_opt("last_seen", last_seen.as_deref())?,
        created_at: zeit_parsen("created_at", &created_at_str)?,
    })
}

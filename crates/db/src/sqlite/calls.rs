//! SQLite-Implementierung des AnrufRepository

use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use plausch_core::types::{AnrufStatus, AnrufTyp, CallId, UserId};

use crate::error::DbError;
use crate::models::{AnrufRecord, AnrufUpdate, NeuerAnruf};
use crate::repository::{AnrufRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_parsen, zeit_parsen, zeit_parsen_opt};

impl AnrufRepository for SqliteDb {
    async fn anruf_erstellen(&self, data: NeuerAnruf) -> DbResult<AnrufRecord> {
        let id = CallId(Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO calls (id, initiator_id, receiver_id, call_type, status, started_at, ended_at, duration_sek, created_at)
             VALUES (?, ?, ?, ?, ?, NULL, NULL, NULL, ?)",
        )
        .bind(id.inner().to_string())
        .bind(data.initiator_id.inner().to_string())
        .bind(data.receiver_id.inner().to_string())
        .bind(data.call_type.als_str())
        .bind(AnrufStatus::Ringing.als_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AnrufRecord {
            id,
            initiator_id: data.initiator_id,
            receiver_id: data.receiver_id,
            call_type: data.call_type,
            status: AnrufStatus::Ringing,
            started_at: None,
            ended_at: None,
            duration_sek: None,
            created_at: now,
        })
    }

    async fn anruf_laden(&self, id: CallId) -> DbResult<Option<AnrufRecord>> {
        let row = sqlx::query(
            "SELECT id, initiator_id, receiver_id, call_type, status, started_at, ended_at, duration_sek, created_at
             FROM calls WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_anruf(&r)).transpose()
    }

    async fn anruf_aktualisieren(&self, id: CallId, data: AnrufUpdate) -> DbResult<()> {
        // Dynamisches UPDATE, nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.status.is_some() {
            sets.push("status = ?");
        }
        if data.started_at.is_some() {
            sets.push("started_at = ?");
        }
        if data.ended_at.is_some() {
            sets.push("ended_at = ?");
        }
        if data.duration_sek.is_some() {
            sets.push("duration_sek = ?");
        }
        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!("UPDATE calls SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.status {
            q = q.bind(v.als_str());
        }
        if let Some(ref v) = data.started_at {
            q = q.bind(v.to_rfc3339());
        }
        if let Some(ref v) = data.ended_at {
            q = q.bind(v.to_rfc3339());
        }
        if let Some(v) = data.duration_sek {
            q = q.bind(v);
        }
        q = q.bind(id.inner().to_string());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Anruf {id}")));
        }
        Ok(())
    }

    async fn offene_beenden(&self, jetzt: DateTime<Utc>) -> DbResult<u64> {
        // Dauer wie beim regulaeren Ende: Sekunden seit started_at, 0 ohne Annahme
        let affected = sqlx::query(
            "UPDATE calls SET status = 'ENDED', ended_at = ?,
                 duration_sek = CASE
                     WHEN started_at IS NOT NULL
                     THEN MAX(0, CAST(strftime('%s', ?) - strftime('%s', started_at) AS INTEGER))
                     ELSE 0
                 END
             WHERE status IN ('RINGING', 'ONGOING')",
        )
        .bind(jetzt.to_rfc3339())
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected > 0 {
            warn!(anzahl = affected, "Verwaiste Anrufe beim Start bereinigt");
        }
        Ok(affected)
    }
}

fn row_to_anruf(row: &sqlx::sqlite::SqliteRow) -> DbResult<AnrufRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let initiator_str: String = row.try_get("initiator_id")?;
    let receiver_str: String = row.try_get("receiver_id")?;
    let typ_str: String = row.try_get("call_type")?;
    let status_str: String = row.try_get("status")?;
    let started_at: Option<String> = row.try_get("started_at")?;
    let ended_at: Option<String> = row.try_get("ended_at")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(AnrufRecord {
        id: CallId(uuid_parsen("id", &id_str)?),
        initiator_id: UserId(uuid_parsen("initiator_id", &initiator_str)?),
        receiver_id: UserId(uuid_parsen("receiver_id", &receiver_str)?),
        call_type: AnrufTyp::from_str(&typ_str).map_err(DbError::intern)?,
        status: AnrufStatus::from_str(&status_str).map_err(DbError::intern)?,
        started_at: zeit_parsen_opt("started_at", started_at.as_deref())?,
        ended_at: zeit_parsen_opt("ended_at", ended_at.as_deref())?,
        duration_sek: row.try_get("duration_sek")?,
        created_at: zeit_parsen("created_at", &created_at_str)?,
    })
}

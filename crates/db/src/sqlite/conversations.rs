//! SQLite-Implementierung des TeilnehmerRepository

use chrono::{DateTime, Utc};
use uuid::Uuid;

use plausch_core::types::{ConversationId, UserId};

use crate::error::DbError;
use crate::models::{TeilnehmerPraesenz, TeilnehmerRecord, UnterhaltungRecord};
use crate::repository::{DbResult, TeilnehmerRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_parsen, zeit_parsen, zeit_parsen_opt};

impl TeilnehmerRepository for SqliteDb {
    async fn unterhaltung_erstellen(
        &self,
        name: Option<&str>,
        is_group: bool,
    ) -> DbResult<UnterhaltungRecord> {
        let id = ConversationId(Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO conversations (id, name, is_group, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.inner().to_string())
        .bind(name)
        .bind(is_group as i64)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(UnterhaltungRecord {
            id,
            name: name.map(str::to_string),
            is_group,
            created_at: now,
            updated_at: now,
        })
    }

    async fn teilnehmer_hinzufuegen(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        is_admin: bool,
    ) -> DbResult<TeilnehmerRecord> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO participants (conversation_id, user_id, is_admin, last_read_at, joined_at)
             VALUES (?, ?, ?, NULL, ?)",
        )
        .bind(conversation_id.inner().to_string())
        .bind(user_id.inner().to_string())
        .bind(is_admin as i64)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!(
                    "Benutzer {user_id} ist bereits Teilnehmer von {conversation_id}"
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(TeilnehmerRecord {
            conversation_id,
            user_id,
            is_admin,
            last_read_at: None,
            joined_at: now,
        })
    }

    async fn teilnehmer_finden(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> DbResult<Option<TeilnehmerRecord>> {
        let row = sqlx::query(
            "SELECT conversation_id, user_id, is_admin, last_read_at, joined_at
             FROM participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id.inner().to_string())
        .bind(user_id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_teilnehmer(&r)).transpose()
    }

    async fn andere_teilnehmer(
        &self,
        conversation_id: ConversationId,
        ausser: UserId,
    ) -> DbResult<Vec<TeilnehmerPraesenz>> {
        let rows = sqlx::query(
            "SELECT p.user_id, u.is_online
             FROM participants p
             JOIN users u ON u.id = p.user_id
             WHERE p.conversation_id = ? AND p.user_id != ?",
        )
        .bind(conversation_id.inner().to_string())
        .bind(ausser.inner().to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                use sqlx::Row as _;
                let user_str: String = row.try_get("user_id")?;
                let is_online: i64 = row.try_get("is_online")?;
                Ok(TeilnehmerPraesenz {
                    user_id: UserId(uuid_parsen("user_id", &user_str)?),
                    is_online: is_online != 0,
                })
            })
            .collect()
    }

    async fn letzte_lesung_setzen(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        zeitpunkt: DateTime<Utc>,
    ) -> DbResult<()> {
        let affected = sqlx::query(
            "UPDATE participants SET last_read_at = ?
             WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(zeitpunkt.to_rfc3339())
        .bind(conversation_id.inner().to_string())
        .bind(user_id.inner().to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!(
                "Teilnahme {user_id} in {conversation_id}"
            )));
        }
        Ok(())
    }

    async fn unterhaltung_beruehren(
        &self,
        conversation_id: ConversationId,
        zeitpunkt: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(zeitpunkt.to_rfc3339())
            .bind(conversation_id.inner().to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_teilnehmer(row: &sqlx::sqlite::SqliteRow) -> DbResult<TeilnehmerRecord> {
    use sqlx::Row as _;

    let conversation_str: String = row.try_get("conversation_id")?;
    let user_str: String = row.try_get("user_id")?;
    let is_admin: i64 = row.try_get("is_admin")?;
    let last_read_at: Option<String> = row.try_get("last_read_at")?;
    let joined_at_str: String = row.try_get("joined_at")?;

    Ok(TeilnehmerRecord {
        conversation_id: ConversationId(uuid_parsen("conversation_id", &conversation_str)?),
        user_id: UserId(uuid_parsen("user_id", &user_str)?),
        is_admin: is_admin != 0,
        last_read_at: zeit_parsen_opt("last_read_at", last_read_at.as_deref())?,
        joined_at: zeit_parsen("joined_at", &joined_at_str)?,
    })
}

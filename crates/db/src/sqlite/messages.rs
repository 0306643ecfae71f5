//! SQLite-Implementierung des NachrichtenRepository
//!
//! DELIVERED greift nur auf SENT; die Bedingung steckt direkt im
//! UPDATE, damit eine verspaetete Zustell-Quittung READ nicht
//! zuruecksetzt. READ dagegen kollabiert jeden vorherigen Status und
//! bleibt bei weiteren Lesungen einfach READ.

use chrono::Utc;
use std::str::FromStr;
use uuid::Uuid;

use plausch_core::types::{
    ConversationId, MessageId, NachrichtenStatus, NachrichtenTyp, UserId,
};

use crate::error::DbError;
use crate::models::{NachrichtRecord, NeueNachricht};
use crate::repository::{DbResult, NachrichtenRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_parsen, zeit_parsen};

impl NachrichtenRepository for SqliteDb {
    async fn nachricht_erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let id = MessageId(Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, sender_id, content, message_type, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.inner().to_string())
        .bind(data.conversation_id.inner().to_string())
        .bind(data.sender_id.inner().to_string())
        .bind(data.content)
        .bind(data.message_type.als_str())
        .bind(NachrichtenStatus::Sent.als_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(NachrichtRecord {
            id,
            conversation_id: data.conversation_id,
            sender_id: data.sender_id,
            content: data.content.to_string(),
            message_type: data.message_type,
            status: NachrichtenStatus::Sent,
            created_at: now,
        })
    }

    async fn nachricht_laden(&self, id: MessageId) -> DbResult<Option<NachrichtRecord>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, sender_id, content, message_type, status, created_at
             FROM messages WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_nachricht(&r)).transpose()
    }

    async fn als_zugestellt_markieren(&self, id: MessageId) -> DbResult<bool> {
        let affected = sqlx::query("UPDATE messages SET status = 'DELIVERED' WHERE id = ? AND status = 'SENT'")
            .bind(id.inner().to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn als_gelesen_markieren(&self, id: MessageId) -> DbResult<bool> {
        // READ kollabiert jeden vorherigen Status und wird auch bei
        // wiederholten Lesungen erneut gemeldet (true solange die
        // Nachricht existiert)
        let affected = sqlx::query("UPDATE messages SET status = 'READ' WHERE id = ?")
            .bind(id.inner().to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let conversation_str: String = row.try_get("conversation_id")?;
    let sender_str: String = row.try_get("sender_id")?;
    let typ_str: String = row.try_get("message_type")?;
    let status_str: String = row.try_get("status")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(NachrichtRecord {
        id: MessageId(uuid_parsen("id", &id_str)?),
        conversation_id: ConversationId(uuid_parsen("conversation_id", &conversation_str)?),
        sender_id: UserId(uuid_parsen("sender_id", &sender_str)?),
        content: row.try_get("content")?,
        message_type: NachrichtenTyp::from_str(&typ_str).map_err(DbError::intern)?,
        status: NachrichtenStatus::from_str(&status_str).map_err(DbError::intern)?,
        created_at: zeit_parsen("created_at", &created_at_str)?,
    })
}

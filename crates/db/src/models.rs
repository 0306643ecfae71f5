//! Datenbankmodelle fuer Plausch
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Wire-Events getrennt und dienen als reine
//! Datenuebertragungsobjekte zwischen Repository und Live-Schicht.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plausch_core::types::{
    AnrufStatus, AnrufTyp, CallId, ConversationId, MessageId, NachrichtenStatus, NachrichtenTyp,
    UserId,
};

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub email: &'a str,
    pub display_name: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Unterhaltungen und Teilnehmer
// ---------------------------------------------------------------------------

/// Unterhaltungs-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnterhaltungRecord {
    pub id: ConversationId,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Teilnahme-Datensatz (Benutzer in Unterhaltung)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeilnehmerRecord {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub is_admin: bool,
    pub last_read_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

/// Teilnehmer einer Unterhaltung mit Praesenz-Flag
///
/// Ergebnis des Joins ueber `users.is_online`; die Zustell-Logik braucht
/// nur ID und Online-Status der Gegenseiten.
#[derive(Debug, Clone)]
pub struct TeilnehmerPraesenz {
    pub user_id: UserId,
    pub is_online: bool,
}

// ---------------------------------------------------------------------------
// Nachrichten
// ---------------------------------------------------------------------------

/// Nachrichten-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtRecord {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: NachrichtenTyp,
    pub status: NachrichtenStatus,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen einer neuen Nachricht
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: &'a str,
    pub message_type: NachrichtenTyp,
}

// ---------------------------------------------------------------------------
// Anrufe
// ---------------------------------------------------------------------------

/// Anruf-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnrufRecord {
    pub id: CallId,
    pub initiator_id: UserId,
    pub receiver_id: UserId,
    pub call_type: AnrufTyp,
    pub status: AnrufStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_sek: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Anrufs (Status RINGING)
#[derive(Debug, Clone)]
pub struct NeuerAnruf {
    pub initiator_id: UserId,
    pub receiver_id: UserId,
    pub call_type: AnrufTyp,
}

/// Daten zum Aktualisieren eines Anrufs
///
/// Nur gesetzte Felder werden geschrieben.
#[derive(Debug, Clone, Default)]
pub struct AnrufUpdate {
    pub status: Option<AnrufStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_sek: Option<i64>,
}

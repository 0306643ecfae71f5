//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Live-Schicht von der konkreten
//! Datenbank-Implementierung. Die Handler sind generisch ueber diese
//! Traits; produktiv implementiert sie `SqliteDb`, in Tests laesst sich
//! eine In-Memory-Datenbank einsetzen.

use chrono::{DateTime, Utc};

use plausch_core::types::{CallId, ConversationId, MessageId, NachrichtenStatus, UserId};

use crate::error::DbError;
use crate::models::{
    AnrufRecord, AnrufUpdate, BenutzerRecord, NachrichtRecord, NeueNachricht, NeuerAnruf,
    NeuerBenutzer, TeilnehmerPraesenz, TeilnehmerRecord, UnterhaltungRecord,
};

/// Ergebnis-Alias fuer Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://plausch.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://plausch.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait BenutzerRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    async fn benutzer_erstellen(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden
    async fn benutzer_laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Online-Status eines Benutzers setzen
    ///
    /// Beim Offline-Gehen wird `last_seen` auf den aktuellen Zeitpunkt
    /// gesetzt und zurueckgegeben; beim Online-Gehen bleibt `last_seen`
    /// unveraendert und das Ergebnis ist `None`.
    async fn praesenz_setzen(&self, id: UserId, online: bool) -> DbResult<Option<DateTime<Utc>>>;
}

/// Repository fuer Unterhaltungen und Teilnahmen
#[allow(async_fn_in_trait)]
pub trait TeilnehmerRepository: Send + Sync {
    /// Eine neue Unterhaltung anlegen
    async fn unterhaltung_erstellen(
        &self,
        name: Option<&str>,
        is_group: bool,
    ) -> DbResult<UnterhaltungRecord>;

    /// Einen Benutzer einer Unterhaltung hinzufuegen
    async fn teilnehmer_hinzufuegen(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        is_admin: bool,
    ) -> DbResult<TeilnehmerRecord>;

    /// Teilnahme-Datensatz laden (Teilnehmer-Pruefung)
    async fn teilnehmer_finden(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> DbResult<Option<TeilnehmerRecord>>;

    /// Alle anderen Teilnehmer einer Unterhaltung mit Online-Status
    async fn andere_teilnehmer(
        &self,
        conversation_id: ConversationId,
        ausser: UserId,
    ) -> DbResult<Vec<TeilnehmerPraesenz>>;

    /// `last_read_at` eines Teilnehmers setzen
    async fn letzte_lesung_setzen(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        zeitpunkt: DateTime<Utc>,
    ) -> DbResult<()>;

    /// `updated_at` einer Unterhaltung auf den gegebenen Zeitpunkt setzen
    async fn unterhaltung_beruehren(
        &self,
        conversation_id: ConversationId,
        zeitpunkt: DateTime<Utc>,
    ) -> DbResult<()>;
}

/// Repository fuer Nachrichten
#[allow(async_fn_in_trait)]
pub trait NachrichtenRepository: Send + Sync {
    /// Eine neue Nachricht mit Status SENT anlegen
    async fn nachricht_erstellen(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Eine Nachricht anhand ihrer ID laden
    async fn nachricht_laden(&self, id: MessageId) -> DbResult<Option<NachrichtRecord>>;

    /// Status auf DELIVERED schalten, aber nur aus SENT heraus
    ///
    /// Gibt `true` zurueck wenn der Uebergang stattgefunden hat.
    async fn als_zugestellt_markieren(&self, id: MessageId) -> DbResult<bool>;

    /// Status auf READ schalten, aus jedem vorherigen Status heraus
    ///
    /// Gibt `true` zurueck solange die Nachricht existiert; auch eine
    /// wiederholte Lesung wird gemeldet, damit jede Lese-Quittung einen
    /// Broadcast ausloesen kann.
    async fn als_gelesen_markieren(&self, id: MessageId) -> DbResult<bool>;
}

/// Repository fuer Anrufe
#[allow(async_fn_in_trait)]
pub trait AnrufRepository: Send + Sync {
    /// Einen neuen Anruf mit Status RINGING anlegen
    async fn anruf_erstellen(&self, data: NeuerAnruf) -> DbResult<AnrufRecord>;

    /// Einen Anruf anhand seiner ID laden
    async fn anruf_laden(&self, id: CallId) -> DbResult<Option<AnrufRecord>>;

    /// Status/Zeitfelder eines Anrufs aktualisieren
    async fn anruf_aktualisieren(&self, id: CallId, data: AnrufUpdate) -> DbResult<()>;

    /// Alle nicht-terminalen Anrufe (RINGING, ONGOING) auf ENDED setzen
    ///
    /// Aufraeum-Durchlauf beim Serverstart; Anrufe ueberleben keinen
    /// Prozess-Neustart. Gibt die Anzahl bereinigter Anrufe zurueck.
    async fn offene_beenden(&self, jetzt: DateTime<Utc>) -> DbResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.url, "sqlite://plausch.db");
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
    }
}

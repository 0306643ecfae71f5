//! Raum-Register – Sessions, Kanal-Mitgliedschaft und Event-Zustellung
//!
//! Das `RaumRegister` verwaltet die Send-Queues aller verbundenen
//! Sessions und die Mitgliedschaft in logischen Kanaelen. Jede Session
//! ist automatisch Mitglied ihres persoenlichen Benutzer-Kanals und des
//! globalen Kanals; Unterhaltungs-Kanaele werden per `room:join`
//! betreten und koennen sich beliebig ueberlappen.
//!
//! ## Zustellung
//! - An einen Kanal: `senden`
//! - An einen Kanal ausser einer Session: `senden_ausser`
//! - An alle Sessions eines Benutzers: `an_benutzer_senden`
//! - An eine einzelne Session: `an_session_senden`

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use plausch_core::types::{ConversationId, SessionId, UserId};
use plausch_protocol::events::ServerEvent;

use crate::session::Sitzung;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Session
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Kanal
// ---------------------------------------------------------------------------

/// Logischer Zustell-Kanal
///
/// Kanaele sind reine Adressen; sie existieren solange mindestens eine
/// Session Mitglied ist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kanal {
    /// Persoenlicher Kanal eines Benutzers (alle seine Sessions)
    Benutzer(UserId),
    /// Kanal einer Unterhaltung
    Unterhaltung(ConversationId),
    /// Alle verbundenen Sessions (Praesenz-Broadcasts)
    Alle,
}

impl std::fmt::Display for Kanal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Benutzer(uid) => write!(f, "{uid}"),
            Self::Unterhaltung(cid) => write!(f, "{cid}"),
            Self::Alle => write!(f, "alle"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer verbundenen Session
#[derive(Clone, Debug)]
pub struct SessionSender {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl SessionSender {
    /// Reiht ein Event nicht-blockierend in die Send-Queue ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    /// Eine langsame Session bremst damit keine anderen Empfaenger.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.session_id, "Send-Queue voll, Event verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session_id = %self.session_id, "Send-Queue geschlossen (Session getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RaumRegister
// ---------------------------------------------------------------------------

/// Zentrales Register fuer Sessions und Kanal-Mitgliedschaften
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct RaumRegister {
    inner: Arc<RaumRegisterInner>,
}

struct RaumRegisterInner {
    /// Send-Queues, indiziert nach SessionId
    sessions: DashMap<SessionId, SessionSender>,
    /// Kanal-Mitgliedschaft: Kanal -> Session-IDs
    mitglieder: DashMap<Kanal, Vec<SessionId>>,
}

impl RaumRegister {
    /// Erstellt ein neues RaumRegister
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RaumRegisterInner {
                sessions: DashMap::new(),
                mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert eine Session und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die Session wird automatisch Mitglied ihres persoenlichen
    /// Benutzer-Kanals und des globalen Kanals. Die `ClientConnection`
    /// liest aus der Queue und sendet via TCP.
    pub fn session_registrieren(&self, sitzung: &Sitzung) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = SessionSender {
            session_id: sitzung.id,
            user_id: sitzung.user_id,
            tx,
        };
        self.inner.sessions.insert(sitzung.id, sender);
        self.beitreten(sitzung.id, Kanal::Benutzer(sitzung.user_id));
        self.beitreten(sitzung.id, Kanal::Alle);
        tracing::debug!(session_id = %sitzung.id, user_id = %sitzung.user_id, "Session registriert");
        rx
    }

    /// Entfernt eine Session aus dem Register und allen Kanaelen
    pub fn session_entfernen(&self, session_id: &SessionId) {
        self.inner.sessions.remove(session_id);
        self.inner.mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|sid| sid != session_id);
        });
        // Leere Kanal-Eintraege aufraeumen
        self.inner.mitglieder.retain(|_, sessions| !sessions.is_empty());
        tracing::debug!(session_id = %session_id, "Session entfernt");
    }

    /// Fuegt eine Session einem Kanal hinzu
    ///
    /// Mitgliedschaften ueberlappen; ein Beitritt entfernt keine anderen.
    pub fn beitreten(&self, session_id: SessionId, kanal: Kanal) {
        let mut sessions = self.inner.mitglieder.entry(kanal).or_default();
        if !sessions.contains(&session_id) {
            sessions.push(session_id);
        }
    }

    /// Entfernt eine Session aus einem Kanal
    pub fn verlassen(&self, session_id: &SessionId, kanal: &Kanal) {
        if let Some(mut sessions) = self.inner.mitglieder.get_mut(kanal) {
            sessions.retain(|sid| sid != session_id);
            let ist_leer = sessions.is_empty();
            drop(sessions);
            if ist_leer {
                self.inner.mitglieder.remove(kanal);
            }
        }
    }

    /// Prueft ob eine Session Mitglied eines Kanals ist
    pub fn ist_mitglied(&self, session_id: &SessionId, kanal: &Kanal) -> bool {
        self.inner
            .mitglieder
            .get(kanal)
            .map(|sessions| sessions.contains(session_id))
            .unwrap_or(false)
    }

    /// Sendet ein Event an alle Sessions eines Kanals
    ///
    /// Gibt die Anzahl der erfolgreichen Zustellungen zurueck.
    pub fn senden(&self, kanal: &Kanal, event: ServerEvent) -> usize {
        let session_ids = match self.inner.mitglieder.get(kanal) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for session_id in &session_ids {
            if let Some(sender) = self.inner.sessions.get(session_id) {
                if sender.senden(event.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet ein Event an alle Sessions eines Kanals ausser einer
    ///
    /// Damit bekommt der Ausloeser eines Events seine eigene
    /// Benachrichtigung nicht doppelt.
    pub fn senden_ausser(
        &self,
        kanal: &Kanal,
        ausgeschlossen: &SessionId,
        event: ServerEvent,
    ) -> usize {
        let session_ids = match self.inner.mitglieder.get(kanal) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for session_id in &session_ids {
            if session_id == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.sessions.get(session_id) {
                if sender.senden(event.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet ein Event an alle Sessions eines Benutzers
    pub fn an_benutzer_senden(&self, user_id: &UserId, event: ServerEvent) -> usize {
        self.senden(&Kanal::Benutzer(*user_id), event)
    }

    /// Sendet ein Event an eine einzelne Session
    pub fn an_session_senden(&self, session_id: &SessionId, event: ServerEvent) -> bool {
        match self.inner.sessions.get(session_id) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(session_id = %session_id, "Senden an unbekannte Session");
                false
            }
        }
    }

    /// Gibt alle Session-IDs eines Benutzers zurueck
    pub fn sessions_von(&self, user_id: &UserId) -> Vec<SessionId> {
        self.inner
            .mitglieder
            .get(&Kanal::Benutzer(*user_id))
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Gibt die Anzahl der registrierten Sessions zurueck
    pub fn session_anzahl(&self) -> usize {
        self.inner.sessions.len()
    }
}

impl Default for RaumRegister {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use plausch_core::types::{MessageId, NachrichtenStatus};

    fn test_sitzung() -> Sitzung {
        Sitzung::neu(UserId::new(), "test@example.org")
    }

    fn test_event() -> ServerEvent {
        ServerEvent::MessageStatus {
            message_id: MessageId::new(),
            status: NachrichtenStatus::Delivered,
        }
    }

    #[tokio::test]
    async fn session_registrieren_und_senden() {
        let register = RaumRegister::neu();
        let sitzung = test_sitzung();

        let mut rx = register.session_registrieren(&sitzung);
        assert_eq!(register.session_anzahl(), 1);

        assert!(register.an_session_senden(&sitzung.id, test_event()));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn automatische_kanaele() {
        let register = RaumRegister::neu();
        let sitzung = test_sitzung();
        let _rx = register.session_registrieren(&sitzung);

        assert!(register.ist_mitglied(&sitzung.id, &Kanal::Benutzer(sitzung.user_id)));
        assert!(register.ist_mitglied(&sitzung.id, &Kanal::Alle));
    }

    #[tokio::test]
    async fn senden_an_unterhaltung() {
        let register = RaumRegister::neu();
        let kanal = Kanal::Unterhaltung(ConversationId::new());

        let s1 = test_sitzung();
        let s2 = test_sitzung();
        let s3 = test_sitzung();

        let mut rx1 = register.session_registrieren(&s1);
        let mut rx2 = register.session_registrieren(&s2);
        let mut rx3 = register.session_registrieren(&s3);

        register.beitreten(s1.id, kanal.clone());
        register.beitreten(s2.id, kanal.clone());
        // s3 tritt nicht bei

        let gesendet = register.senden(&kanal, test_event());
        assert_eq!(gesendet, 2);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(rx3.try_recv().is_err(), "s3 darf nichts empfangen");
    }

    #[tokio::test]
    async fn senden_ausser_ausloeser() {
        let register = RaumRegister::neu();
        let kanal = Kanal::Unterhaltung(ConversationId::new());

        let s1 = test_sitzung();
        let s2 = test_sitzung();

        let mut rx1 = register.session_registrieren(&s1);
        let mut rx2 = register.session_registrieren(&s2);

        register.beitreten(s1.id, kanal.clone());
        register.beitreten(s2.id, kanal.clone());

        register.senden_ausser(&kanal, &s1.id, test_event());

        assert!(rx1.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn mehrere_sessions_pro_benutzer() {
        let register = RaumRegister::neu();
        let uid = UserId::new();

        let handy = Sitzung::neu(uid, "multi@example.org");
        let desktop = Sitzung::neu(uid, "multi@example.org");

        let mut rx_handy = register.session_registrieren(&handy);
        let mut rx_desktop = register.session_registrieren(&desktop);

        assert_eq!(register.sessions_von(&uid).len(), 2);

        let gesendet = register.an_benutzer_senden(&uid, test_event());
        assert_eq!(gesendet, 2);
        assert!(rx_handy.try_recv().is_ok());
        assert!(rx_desktop.try_recv().is_ok());
    }

    #[tokio::test]
    async fn session_entfernen_raeumt_kanaele_auf() {
        let register = RaumRegister::neu();
        let kanal = Kanal::Unterhaltung(ConversationId::new());
        let sitzung = test_sitzung();

        let _rx = register.session_registrieren(&sitzung);
        register.beitreten(sitzung.id, kanal.clone());

        register.session_entfernen(&sitzung.id);

        assert_eq!(register.session_anzahl(), 0);
        assert!(!register.ist_mitglied(&sitzung.id, &kanal));
        assert!(register.sessions_von(&sitzung.user_id).is_empty());
    }

    #[tokio::test]
    async fn verlassen_nur_einen_kanal() {
        let register = RaumRegister::neu();
        let kanal_a = Kanal::Unterhaltung(ConversationId::new());
        let kanal_b = Kanal::Unterhaltung(ConversationId::new());
        let sitzung = test_sitzung();

        let _rx = register.session_registrieren(&sitzung);
        register.beitreten(sitzung.id, kanal_a.clone());
        register.beitreten(sitzung.id, kanal_b.clone());

        register.verlassen(&sitzung.id, &kanal_a);

        assert!(!register.ist_mitglied(&sitzung.id, &kanal_a));
        assert!(register.ist_mitglied(&sitzung.id, &kanal_b));
        // Automatische Kanaele bleiben bestehen
        assert!(register.ist_mitglied(&sitzung.id, &Kanal::Alle));
    }

    #[tokio::test]
    async fn doppelter_beitritt_ist_idempotent() {
        let register = RaumRegister::neu();
        let kanal = Kanal::Unterhaltung(ConversationId::new());
        let sitzung = test_sitzung();

        let mut rx = register.session_registrieren(&sitzung);
        register.beitreten(sitzung.id, kanal.clone());
        register.beitreten(sitzung.id, kanal.clone());

        let gesendet = register.senden(&kanal, test_event());
        assert_eq!(gesendet, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "Event darf nicht doppelt ankommen");
    }
}

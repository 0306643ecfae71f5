//! Anruf-Register – In-Memory-Zustand aktiver Anrufe
//!
//! Das Signalisierungs-Routing (wer ist Gegenstelle von wem) laeuft
//! ueber dieses Register; die Datenbank haelt nur die Historie. Anrufe
//! ueberleben keinen Prozess-Neustart, verwaiste Datensaetze werden
//! beim Start bereinigt.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use plausch_core::types::{AnrufTyp, CallId, UserId};

/// Zustand eines aktiven Anrufs (RINGING oder ONGOING)
#[derive(Debug, Clone)]
pub struct AktiverAnruf {
    pub initiator_id: UserId,
    pub receiver_id: UserId,
    pub call_type: AnrufTyp,
    /// Gesetzt sobald der Empfaenger angenommen hat
    pub gestartet_am: Option<DateTime<Utc>>,
}

impl AktiverAnruf {
    /// Gibt die Gegenstelle aus Sicht von `user_id` zurueck
    ///
    /// `None` wenn der Benutzer gar nicht beteiligt ist.
    pub fn gegenstelle(&self, user_id: &UserId) -> Option<UserId> {
        if *user_id == self.initiator_id {
            Some(self.receiver_id)
        } else if *user_id == self.receiver_id {
            Some(self.initiator_id)
        } else {
            None
        }
    }

    /// Gespraechsdauer in ganzen Sekunden, 0 wenn nie angenommen
    pub fn dauer_sek(&self, jetzt: DateTime<Utc>) -> i64 {
        self.gestartet_am
            .map(|start| (jetzt - start).num_seconds().max(0))
            .unwrap_or(0)
    }
}

/// Register aller aktiven Anrufe
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct AnrufRegister {
    inner: Arc<DashMap<CallId, AktiverAnruf>>,
}

impl AnrufRegister {
    /// Erstellt ein neues AnrufRegister
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Registriert einen neuen Anruf im Zustand RINGING
    pub fn einfuegen(&self, call_id: CallId, anruf: AktiverAnruf) {
        self.inner.insert(call_id, anruf);
    }

    /// Gibt den Zustand eines aktiven Anrufs zurueck
    pub fn holen(&self, call_id: &CallId) -> Option<AktiverAnruf> {
        self.inner.get(call_id).map(|e| e.clone())
    }

    /// Markiert einen Anruf als angenommen
    ///
    /// Gibt `false` zurueck wenn der Anruf nicht (mehr) aktiv ist.
    pub fn annehmen(&self, call_id: &CallId, gestartet_am: DateTime<Utc>) -> bool {
        match self.inner.get_mut(call_id) {
            Some(mut anruf) => {
                anruf.gestartet_am = Some(gestartet_am);
                true
            }
            None => false,
        }
    }

    /// Entfernt einen Anruf und gibt seinen letzten Zustand zurueck
    pub fn entfernen(&self, call_id: &CallId) -> Option<AktiverAnruf> {
        self.inner.remove(call_id).map(|(_, anruf)| anruf)
    }

    /// Alle aktiven Anrufe an denen ein Benutzer beteiligt ist
    ///
    /// Fuer das Aufraeumen beim Verbindungsende.
    pub fn anrufe_von(&self, user_id: &UserId) -> Vec<(CallId, AktiverAnruf)> {
        self.inner
            .iter()
            .filter(|e| e.gegenstelle(user_id).is_some())
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    /// Anzahl der aktiven Anrufe
    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }
}

impl Default for AnrufRegister {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

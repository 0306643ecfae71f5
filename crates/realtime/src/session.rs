//! Authentifizierte Verbindungs-Session
//!
//! Jede TCP-Verbindung bekommt nach erfolgreichem Handshake genau eine
//! `Sitzung`. Ein Benutzer kann mehrere Sitzungen gleichzeitig halten
//! (mehrere Geraete); Praesenz wird erst beim Ende der letzten Sitzung
//! auf offline gesetzt.

use plausch_core::types::{SessionId, UserId};

/// Identitaet einer authentifizierten Verbindung
#[derive(Debug, Clone)]
pub struct Sitzung {
    /// Eindeutige ID dieser Verbindung
    pub id: SessionId,
    /// Authentifizierter Benutzer
    pub user_id: UserId,
    /// E-Mail aus dem Token (fuer Logging und Anrufer-Info)
    pub email: String,
}

impl Sitzung {
    /// Erstellt eine neue Sitzung mit frischer Session-ID
    pub fn neu(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            email: email.into(),
        }
    }
}

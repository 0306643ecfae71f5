//! Fehlertypen fuer die Live-Schicht

use plausch_auth::AuthError;
use plausch_db::DbError;
use thiserror::Error;

/// Fehlertyp fuer die Live-Schicht
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Authentifizierungsfehler beim Handshake
    #[error("Authentifizierungsfehler: {0}")]
    Auth(#[from] AuthError),

    /// Datenbank-Fehler
    #[error("Datenbank-Fehler: {0}")]
    Db(#[from] DbError),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,

    /// Protokollfehler (ungueltiges Frame, falscher Zustand)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl RealtimeError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }
}

/// Result-Typ fuer die Live-Schicht
pub type RealtimeResult<T> = Result<T, RealtimeError>;

//! Gemeinsamer Server-Zustand fuer die Live-Schicht
//!
//! Haelt Konfiguration, Token-Verifizierer, Register und Repository als
//! geteilte Referenzen, die sicher zwischen tokio-Tasks geteilt werden.

use std::sync::Arc;
use std::time::Instant;

use plausch_auth::TokenVerifizierer;
use plausch_db::{
    AnrufRepository, BenutzerRepository, NachrichtenRepository, TeilnehmerRepository,
};

use crate::broadcast::RaumRegister;
use crate::calls::AnrufRegister;

/// Konfiguration fuer die Live-Schicht
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Anzeigename des Servers (nur fuer Logs)
    pub server_name: String,
    /// Maximale gleichzeitige Sessions
    pub max_clients: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            server_name: "Plausch Server".to_string(),
            max_clients: 1024,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct RealtimeState<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    /// Server-Konfiguration
    pub config: Arc<RealtimeConfig>,
    /// Token-Verifizierer fuer den Handshake
    pub verifizierer: TokenVerifizierer,
    /// Sessions und Kanal-Mitgliedschaften
    pub raeume: RaumRegister,
    /// Aktive Anrufe (in-memory)
    pub anrufe: AnrufRegister,
    /// Datenbank-Zugriff
    pub repo: Arc<R>,
    /// Startzeitpunkt des Servers
    pub start_time: Instant,
}

impl<R> RealtimeState<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    /// Erstellt einen neuen RealtimeState
    pub fn neu(config: RealtimeConfig, verifizierer: TokenVerifizierer, repo: Arc<R>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            verifizierer,
            raeume: RaumRegister::neu(),
            anrufe: AnrufRegister::neu(),
            repo,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

//! plausch-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Datenbank und Live-Schicht zum lauffaehigen
//! Server und stellt den Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use config::ServerConfig;
use plausch_auth::TokenVerifizierer;
use plausch_db::{AnrufRepository, DatabaseConfig, SqliteDb};
use plausch_realtime::{RealtimeConfig, RealtimeServer, RealtimeState};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen (Migrationen laufen beim Oeffnen)
    /// 2. Verwaiste Anrufe aus frueheren Laeufen schliessen
    /// 3. TCP-Listener der Live-Schicht starten
    /// 4. Ctrl-C signalisiert den Shutdown ueber den Watch-Kanal
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        let db = SqliteDb::oeffnen(&DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        })
        .await
        .context("Datenbankverbindung fehlgeschlagen")?;

        // Ein Absturz laesst Anrufe in RINGING/ONGOING zurueck
        let bereinigt = db.offene_beenden(Utc::now()).await?;
        if bereinigt > 0 {
            tracing::info!(anzahl = bereinigt, "Verwaiste Anrufe geschlossen");
        }

        let state = RealtimeState::neu(
            RealtimeConfig {
                server_name: self.config.server.name.clone(),
                max_clients: self.config.server.max_clients,
            },
            TokenVerifizierer::neu(&self.config.auth.token_geheimnis),
            Arc::new(db),
        );

        let bind_addr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .context("Ungueltige Bind-Adresse")?;
        let realtime = RealtimeServer::neu(state, bind_addr);

        // Die Accept-Loop laeuft auf dem Haupt-Task (LocalSet, nicht Send).
        // Ctrl-C kippt den Watch-Kanal und die Loop beendet sich geordnet.
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                let _ = shutdown_tx.send(true);
            }
        });

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        realtime
            .starten(shutdown_rx)
            .await
            .context("Live-Schicht beendete mit Fehler")?;

        Ok(())
    }
}

//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task.
//!
//! ## Handshake
//! Das erste Frame MUSS ein `auth`-Event mit gueltigem Token sein.
//! Jedes andere erste Event wird mit `AUTHENTICATION_REQUIRED`
//! beantwortet, ein ungueltiges oder abgelaufenes Token mit
//! `INVALID_TOKEN`; in beiden Faellen schliesst die Verbindung.
//!
//! Keepalive und Idle-Timeouts uebernimmt die Transportebene davor;
//! diese Schicht wartet unbegrenzt auf Frames.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use plausch_auth::AuthError;
use plausch_db::{
    AnrufRepository, BenutzerRepository, NachrichtenRepository, TeilnehmerRepository,
};
use plausch_protocol::{
    events::{ClientEvent, FehlerCode, ServerEvent},
    wire::FrameCodec,
};

use crate::dispatcher::EventDispatcher;
use crate::presence;
use crate::server_state::RealtimeState;
use crate::session::Sitzung;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, dispatcht an den `EventDispatcher`
/// und sendet Antworten und Broadcasts zurueck.
pub struct ClientConnection<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    state: Arc<RealtimeState<R>>,
    peer_addr: SocketAddr,
}

impl<R> ClientConnection<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RealtimeState<R>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(stream, FrameCodec::<ClientEvent>::neu());

        // Handshake: erstes Frame muss `auth` sein
        let sitzung = match self.handshake(&mut framed).await {
            Some(s) => s,
            None => {
                tracing::info!(peer = %peer_addr, "Handshake fehlgeschlagen, Verbindung geschlossen");
                return;
            }
        };

        // Session registrieren (betritt Benutzer- und globalen Kanal)
        let mut empfangs_queue = self.state.raeume.session_registrieren(&sitzung);
        presence::online_melden(self.state.repo.as_ref(), &self.state.raeume, &sitzung).await;

        if let Err(e) = framed
            .send(ServerEvent::AuthOk {
                user_id: sitzung.user_id,
            })
            .await
        {
            tracing::warn!(peer = %peer_addr, fehler = %e, "auth:ok senden fehlgeschlagen");
        }

        tracing::info!(
            peer = %peer_addr,
            session_id = %sitzung.id,
            user_id = %sitzung.user_id,
            "Verbindung authentifiziert"
        );

        let dispatcher = EventDispatcher::neu(Arc::clone(&self.state));

        loop {
            tokio::select! {
                // Eingehendes Event vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(event)) => {
                            if let Some(antwort) = dispatcher.verteilen(event, &sitzung).await {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus dem RaumRegister
                ausgehend = empfangs_queue.recv() => {
                    match ausgehend {
                        Some(event) => {
                            if let Err(e) = framed.send(event).await {
                                tracing::warn!(peer = %peer_addr, fehler = %e, "Broadcast-Senden fehlgeschlagen");
                                break;
                            }
                        }
                        None => break,
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal, Verbindung wird getrennt");
                        let abschied = ServerEvent::fehler(
                            FehlerCode::InternalError,
                            "Server wird heruntergefahren",
                        );
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        dispatcher.session_aufraeumen(&sitzung).await;
        tracing::info!(peer = %peer_addr, session_id = %sitzung.id, "Verbindungs-Task beendet");
    }

    /// Fuehrt den Handshake durch
    ///
    /// Gibt `None` zurueck wenn die Verbindung geschlossen werden soll;
    /// das Refusal-Event ist dann bereits gesendet.
    async fn handshake(
        &self,
        framed: &mut Framed<TcpStream, FrameCodec<ClientEvent>>,
    ) -> Option<Sitzung> {
        let erstes = match framed.next().await {
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                tracing::warn!(peer = %self.peer_addr, fehler = %e, "Frame-Fehler im Handshake");
                return None;
            }
            None => return None,
        };

        let token = match erstes {
            ClientEvent::Auth { token } => token,
            _ => {
                let _ = framed
                    .send(ServerEvent::fehler(
                        FehlerCode::AuthenticationRequired,
                        "Erstes Event muss auth sein",
                    ))
                    .await;
                return None;
            }
        };

        match self.state.verifizierer.pruefen(Some(&token)) {
            Ok(anspruch) => Some(Sitzung::neu(anspruch.user_id, anspruch.email)),
            Err(e) => {
                let (code, meldung) = match e {
                    AuthError::TokenFehlt => {
                        (FehlerCode::AuthenticationRequired, "Token fehlt")
                    }
                    AuthError::TokenAbgelaufen => (FehlerCode::InvalidToken, "Token abgelaufen"),
                    AuthError::TokenUngueltig => (FehlerCode::InvalidToken, "Token ungueltig"),
                };
                tracing::info!(peer = %self.peer_addr, fehler = %e, "Handshake abgelehnt");
                let _ = framed.send(ServerEvent::fehler(code, meldung)).await;
                None
            }
        }
    }
}

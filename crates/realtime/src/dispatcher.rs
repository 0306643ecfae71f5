//! Event-Dispatcher – Routet Client-Events an die richtigen Handler
//!
//! Der Dispatcher bekommt ausschliesslich Events von bereits
//! authentifizierten Sessions; der Handshake selbst laeuft in der
//! `ClientConnection`. Ein erneutes `auth` auf einer stehenden
//! Verbindung ist ein Protokollfehler.

use std::sync::Arc;

use plausch_db::{
    AnrufRepository, BenutzerRepository, NachrichtenRepository, TeilnehmerRepository,
};
use plausch_protocol::events::{ClientEvent, FehlerCode, ServerEvent};

use crate::handlers::{call_handler, message_handler, room_handler};
use crate::server_state::RealtimeState;
use crate::session::Sitzung;

/// Zentraler Event-Dispatcher
pub struct EventDispatcher<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    state: Arc<RealtimeState<R>>,
}

impl<R> EventDispatcher<R>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RealtimeState<R>>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein Client-Event und gibt die direkte Antwort zurueck
    ///
    /// `None` bedeutet: keine direkte Antwort an die ausloesende Session
    /// (Broadcasts an andere Sessions koennen trotzdem stattgefunden
    /// haben).
    pub async fn verteilen(
        &self,
        event: ClientEvent,
        sitzung: &Sitzung,
    ) -> Option<ServerEvent> {
        match event {
            ClientEvent::Auth { .. } => Some(ServerEvent::fehler(
                FehlerCode::InternalError,
                "Verbindung ist bereits authentifiziert",
            )),

            ClientEvent::RoomJoin { conversation_id } => {
                room_handler::handle_join(conversation_id, sitzung, &self.state)
            }
            ClientEvent::RoomLeave { conversation_id } => {
                room_handler::handle_leave(conversation_id, sitzung, &self.state)
            }

            ClientEvent::MessageSend {
                conversation_id,
                content,
            } => {
                message_handler::handle_send(conversation_id, content, sitzung, &self.state).await
            }
            ClientEvent::MessageDelivered { message_id } => {
                message_handler::handle_delivered(message_id, sitzung, &self.state).await
            }
            ClientEvent::MessageRead {
                conversation_id,
                message_id,
            } => {
                message_handler::handle_read(conversation_id, message_id, sitzung, &self.state)
                    .await
            }

            ClientEvent::TypingStart { conversation_id } => {
                room_handler::handle_typing(conversation_id, true, sitzung, &self.state)
            }
            ClientEvent::TypingStop { conversation_id } => {
                room_handler::handle_typing(conversation_id, false, sitzung, &self.state)
            }

            ClientEvent::CallInitiate {
                receiver_id,
                call_type,
            } => {
                call_handler::handle_initiate(receiver_id, call_type, sitzung, &self.state).await
            }
            ClientEvent::CallAccept { call_id } => {
                call_handler::handle_accept(call_id, sitzung, &self.state).await
            }
            ClientEvent::CallReject { call_id } => {
                call_handler::handle_reject(call_id, sitzung, &self.state).await
            }
            ClientEvent::CallEnd { call_id } => {
                call_handler::handle_end(call_id, sitzung, &self.state).await
            }

            ClientEvent::RtcOffer { call_id, payload } => call_handler::handle_rtc_relay(
                call_id,
                payload,
                |call_id, payload| ServerEvent::RtcOffer { call_id, payload },
                sitzung,
                &self.state,
            ),
            ClientEvent::RtcAnswer { call_id, payload } => call_handler::handle_rtc_relay(
                call_id,
                payload,
                |call_id, payload| ServerEvent::RtcAnswer { call_id, payload },
                sitzung,
                &self.state,
            ),
            ClientEvent::RtcIceCandidate { call_id, payload } => call_handler::handle_rtc_relay(
                call_id,
                payload,
                |call_id, payload| ServerEvent::RtcIceCandidate { call_id, payload },
                sitzung,
                &self.state,
            ),
        }
    }

    /// Raeumt beim Verbindungsende hinter einer Session auf
    ///
    /// Reihenfolge: Session entfernen, dann Anrufe beenden, dann
    /// Praesenz melden. Beide letzteren greifen nur wenn keine weitere
    /// Session des Benutzers besteht.
    pub async fn session_aufraeumen(&self, sitzung: &Sitzung) {
        self.state.raeume.session_entfernen(&sitzung.id);
        call_handler::verbindung_aufraeumen(sitzung, &self.state).await;
        crate::presence::offline_melden(self.state.repo.as_ref(), &self.state.raeume, sitzung)
            .await;
    }
}

//! Raum-Handler – Unterhaltungs-Kanaele betreten/verlassen, Tipp-Indikator

use std::sync::Arc;

use plausch_core::types::ConversationId;
use plausch_db::{
    AnrufRepository, BenutzerRepository, NachrichtenRepository, TeilnehmerRepository,
};
use plausch_protocol::events::ServerEvent;

use crate::broadcast::Kanal;
use crate::server_state::RealtimeState;
use crate::session::Sitzung;

/// Verarbeitet `room:join`
///
/// Der Beitritt ist bedingungslos und idempotent; die Teilnehmer-
/// Pruefung passiert erst beim Senden. Wer einen fremden Kanal betritt,
/// kann dort selbst keine Nachricht absetzen.
pub fn handle_join<R>(
    conversation_id: ConversationId,
    sitzung: &Sitzung,
    state: &Arc<RealtimeState<R>>,
) -> Option<ServerEvent>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    state
        .raeume
        .beitreten(sitzung.id, Kanal::Unterhaltung(conversation_id));
    tracing::debug!(
        session_id = %sitzung.id,
        conversation_id = %conversation_id,
        "Unterhaltungs-Kanal betreten"
    );
    None
}

/// Verarbeitet `room:leave`
///
/// Verlassen ist immer erlaubt und fuer Nicht-Mitglieder ein No-Op.
pub fn handle_leave<R>(
    conversation_id: ConversationId,
    sitzung: &Sitzung,
    state: &Arc<RealtimeState<R>>,
) -> Option<ServerEvent>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    state
        .raeume
        .verlassen(&sitzung.id, &Kanal::Unterhaltung(conversation_id));
    tracing::debug!(
        session_id = %sitzung.id,
        conversation_id = %conversation_id,
        "Unterhaltungs-Kanal verlassen"
    );
    None
}

/// Verarbeitet `typing:start` / `typing:stop`
///
/// Reiner Relay ohne Persistierung: der Indikator geht an alle anderen
/// Sessions im Unterhaltungs-Kanal. Wer den Kanal nicht betreten hat,
/// erreicht niemanden; eine Teilnehmer-Pruefung findet nicht statt.
pub fn handle_typing<R>(
    conversation_id: ConversationId,
    is_typing: bool,
    sitzung: &Sitzung,
    state: &Arc<RealtimeState<R>>,
) -> Option<ServerEvent>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    state.raeume.senden_ausser(
        &Kanal::Unterhaltung(conversation_id),
        &sitzung.id,
        ServerEvent::TypingUpdate {
            conversation_id,
            user_id: sitzung.user_id,
            is_typing,
        },
    );
    None
}

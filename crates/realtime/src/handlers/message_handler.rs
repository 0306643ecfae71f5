//! Nachrichten-Handler – Zustell-Pipeline und Quittungen
//!
//! ## Zustell-Pipeline (`message:send`)
//! 1. Teilnehmer-Pruefung gegen die Datenbank
//! 2. Nachricht mit Status SENT persistieren
//! 3. `updated_at` der Unterhaltung anfassen
//! 4. `message:new` an den Unterhaltungs-Kanal verteilen
//! 5. Ist mindestens eine Gegenseite online, sofort auf DELIVERED
//!    schalten und den Statuswechsel verteilen
//!
//! Zustell-Quittungen greifen nur aus SENT heraus; die Bedingung liegt
//! im Repository, verspaetete Quittungen laufen hier schlicht ins
//! Leere. Lese-Quittungen kollabieren jeden vorherigen Status und
//! werden bei jedem weiteren Leser erneut verteilt.

use std::sync::Arc;

use plausch_core::types::{ConversationId, MessageId, NachrichtenStatus, NachrichtenTyp};
use plausch_db::{
    models::NeueNachricht, AnrufRepository, BenutzerRepository, NachrichtenRepository,
    TeilnehmerRepository,
};
use plausch_protocol::events::{FehlerCode, NachrichtEvent, ServerEvent};

use crate::broadcast::Kanal;
use crate::server_state::RealtimeState;
use crate::session::Sitzung;

/// Verarbeitet `message:send`
///
/// Die direkte Antwort an den Absender ist dasselbe `message:new` das
/// auch der Kanal bekommt; darin stehen die vom Server vergebene ID und
/// der Zeitstempel.
pub async fn handle_send<R>(
    conversation_id: ConversationId,
    content: String,
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
    // 1. Teilnehmer-Pruefung
    match state
        .repo
        .teilnehmer_finden(conversation_id, sitzung.user_id)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Some(ServerEvent::fehler(
                FehlerCode::NotParticipant,
                "Kein Teilnehmer dieser Unterhaltung",
            ));
        }
        Err(e) => {
            tracing::warn!(fehler = %e, "Teilnehmer-Pruefung fehlgeschlagen");
            return Some(ServerEvent::fehler(
                FehlerCode::MessageFailed,
                "Nachricht konnte nicht gesendet werden",
            ));
        }
    }

    // 2. Persistieren (SENT)
    let nachricht = match state
        .repo
        .nachricht_erstellen(NeueNachricht {
            conversation_id,
            sender_id: sitzung.user_id,
            content: &content,
            message_type: NachrichtenTyp::Text,
        })
        .await
    {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(fehler = %e, "Nachricht persistieren fehlgeschlagen");
            return Some(ServerEvent::fehler(
                FehlerCode::MessageFailed,
                "Nachricht konnte nicht gesendet werden",
            ));
        }
    };

    // 3. Unterhaltung als aktualisiert markieren
    if let Err(e) = state
        .repo
        .unterhaltung_beruehren(conversation_id, nachricht.created_at)
        .await
    {
        tracing::warn!(fehler = %e, "updated_at konnte nicht gesetzt werden");
    }

    // 4. An den Unterhaltungs-Kanal verteilen
    let event = ServerEvent::MessageNew {
        message: NachrichtEvent {
            id: nachricht.id,
            conversation_id: nachricht.conversation_id,
            sender_id: nachricht.sender_id,
            content: nachricht.content.clone(),
            message_type: nachricht.message_type,
            status: nachricht.status,
            created_at: nachricht.created_at,
        },
    };
    state.raeume.senden_ausser(
        &Kanal::Unterhaltung(conversation_id),
        &sitzung.id,
        event.clone(),
    );

    tracing::debug!(
        message_id = %nachricht.id,
        conversation_id = %conversation_id,
        sender_id = %sitzung.user_id,
        "Nachricht gesendet"
    );

    // 5. Sofortige Zustellung wenn eine Gegenseite online ist
    match state
        .repo
        .andere_teilnehmer(conversation_id, sitzung.user_id)
        .await
    {
        Ok(andere) => {
            if andere.iter().any(|t| t.is_online) {
                status_weiterschalten(nachricht.id, conversation_id, NachrichtenStatus::Delivered, state)
                    .await;
            }
        }
        Err(e) => {
            tracing::warn!(fehler = %e, "Teilnehmer-Abfrage fuer Zustellung fehlgeschlagen");
        }
    }

    Some(event)
}

/// Verarbeitet `message:delivered`
///
/// Zustell-Quittung eines Empfaengers. Unbekannte Nachrichten werden
/// still ignoriert; ob die Quittung greift entscheidet allein der
/// Status (nur SENT wird weitergeschaltet).
pub async fn handle_delivered<R>(
    message_id: MessageId,
    _sitzung: &Sitzung,
    state: &Arc<RealtimeState<R>>,
) -> Option<ServerEvent>
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    let nachricht = match state.repo.nachricht_laden(message_id).await {
        Ok(Some(n)) => n,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(fehler = %e, "Nachricht laden fehlgeschlagen");
            return None;
        }
    };

    status_weiterschalten(
        message_id,
        nachricht.conversation_id,
        NachrichtenStatus::Delivered,
        state,
    )
    .await;
    None
}

/// Verarbeitet `message:read`
///
/// Setzt immer `last_read_at` des Lesers; der Statuswechsel auf READ
/// findet nur statt wenn der Leser nicht der Absender ist.
pub async fn handle_read<R>(
    conversation_id: ConversationId,
    message_id: MessageId,
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
    if let Err(e) = state
        .repo
        .letzte_lesung_setzen(conversation_id, sitzung.user_id, chrono::Utc::now())
        .await
    {
        tracing::warn!(fehler = %e, "last_read_at konnte nicht gesetzt werden");
    }

    let nachricht = match state.repo.nachricht_laden(message_id).await {
        Ok(Some(n)) => n,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(fehler = %e, "Nachricht laden fehlgeschlagen");
            return None;
        }
    };

    if nachricht.sender_id == sitzung.user_id {
        return None;
    }

    status_weiterschalten(message_id, conversation_id, NachrichtenStatus::Read, state).await;
    None
}

/// Schaltet den Status einer Nachricht weiter und verteilt den Wechsel
///
/// Greift der Uebergang im Repository nicht (Zustell-Quittung kam zu
/// spaet), passiert nichts.
async fn status_weiterschalten<R>(
    message_id: MessageId,
    conversation_id: ConversationId,
    status: NachrichtenStatus,
    state: &Arc<RealtimeState<R>>,
)
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    let gewechselt = match status {
        NachrichtenStatus::Delivered => state.repo.als_zugestellt_markieren(message_id).await,
        NachrichtenStatus::Read => state.repo.als_gelesen_markieren(message_id).await,
        NachrichtenStatus::Sent => Ok(false),
    };

    match gewechselt {
        Ok(true) => {
            state.raeume.senden(
                &Kanal::Unterhaltung(conversation_id),
                ServerEvent::MessageStatus { message_id, status },
            );
            tracing::debug!(message_id = %message_id, status = ?status, "Nachrichten-Status gewechselt");
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(fehler = %e, "Statuswechsel fehlgeschlagen");
        }
    }
}

//! Anruf-Handler – 1:1-Signalisierung und WebRTC-Relay
//!
//! Der Server vermittelt nur: Klingeln, Annahme, Ablehnung, Ende und
//! das opake Durchreichen der WebRTC-Payloads. Medien fliessen nie
//! ueber diesen Prozess.
//!
//! Signalisierung zu einem unbekannten oder bereits beendeten Anruf
//! ist ein stilles No-Op; bei konkurrierenden Enden gewinnt schlicht
//! der erste, alle weiteren laufen ins Leere.

use chrono::Utc;
use std::sync::Arc;

use plausch_core::types::{AnrufStatus, AnrufTyp, CallId, UserId};
use plausch_db::{
    models::{AnrufUpdate, NeuerAnruf},
    AnrufRepository, BenutzerRepository, NachrichtenRepository, TeilnehmerRepository,
};
use plausch_protocol::events::{AnruferInfo, FehlerCode, ServerEvent};

use crate::calls::AktiverAnruf;
use crate::server_state::RealtimeState;
use crate::session::Sitzung;

/// Verarbeitet `call:initiate`
///
/// Der Empfaenger muss existieren und online sein; das Klingeln geht an
/// alle seine Sessions. Der Anrufer bekommt `call:initiated` mit der
/// vergebenen Anruf-ID als direkte Antwort.
pub async fn handle_initiate<R>(
    receiver_id: UserId,
    call_type: AnrufTyp,
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
    let empfaenger = match state.repo.benutzer_laden(receiver_id).await {
        Ok(Some(b)) => b,
        Ok(None) => {
            return Some(ServerEvent::fehler(
                FehlerCode::UserNotFound,
                "Empfaenger existiert nicht",
            ));
        }
        Err(e) => {
            tracing::warn!(fehler = %e, "Empfaenger laden fehlgeschlagen");
            return Some(ServerEvent::fehler(
                FehlerCode::CallFailed,
                "Anruf konnte nicht gestartet werden",
            ));
        }
    };

    if !empfaenger.is_online {
        return Some(ServerEvent::fehler(
            FehlerCode::UserOffline,
            "Empfaenger ist offline",
        ));
    }

    // Anrufer-Info fuer das Klingel-Event; display_name aus der DB,
    // E-Mail notfalls aus dem Token
    let initiator = match state.repo.benutzer_laden(sitzung.user_id).await {
        Ok(Some(b)) => AnruferInfo {
            user_id: b.id,
            email: b.email,
            display_name: b.display_name,
        },
        _ => AnruferInfo {
            user_id: sitzung.user_id,
            email: sitzung.email.clone(),
            display_name: None,
        },
    };

    let anruf = match state
        .repo
        .anruf_erstellen(NeuerAnruf {
            initiator_id: sitzung.user_id,
            receiver_id,
            call_type,
        })
        .await
    {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(fehler = %e, "Anruf persistieren fehlgeschlagen");
            return Some(ServerEvent::fehler(
                FehlerCode::CallFailed,
                "Anruf konnte nicht gestartet werden",
            ));
        }
    };

    state.anrufe.einfuegen(
        anruf.id,
        AktiverAnruf {
            initiator_id: sitzung.user_id,
            receiver_id,
            call_type,
            gestartet_am: None,
        },
    );

    state.raeume.an_benutzer_senden(
        &receiver_id,
        ServerEvent::CallIncoming {
            call_id: anruf.id,
            initiator,
            call_type,
        },
    );

    tracing::info!(
        call_id = %anruf.id,
        initiator_id = %sitzung.user_id,
        receiver_id = %receiver_id,
        typ = ?call_type,
        "Anruf gestartet"
    );

    Some(ServerEvent::CallInitiated { call_id: anruf.id })
}

/// Verarbeitet `call:accept`
///
/// Nur der gerufene Empfaenger kann annehmen; die Annahme setzt die
/// Startzeit fuer die spaetere Dauer-Berechnung.
pub async fn handle_accept<R>(
    call_id: CallId,
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
    let anruf = state.anrufe.holen(&call_id)?;
    if anruf.receiver_id != sitzung.user_id {
        return None;
    }

    let start = Utc::now();
    if !state.anrufe.annehmen(&call_id, start) {
        return None;
    }

    if let Err(e) = state
        .repo
        .anruf_aktualisieren(
            call_id,
            AnrufUpdate {
                status: Some(AnrufStatus::Ongoing),
                started_at: Some(start),
                ..Default::default()
            },
        )
        .await
    {
        tracing::warn!(call_id = %call_id, fehler = %e, "Anruf-Annahme konnte nicht gespeichert werden");
    }

    state
        .raeume
        .an_benutzer_senden(&anruf.initiator_id, ServerEvent::CallAccepted { call_id });

    tracing::info!(call_id = %call_id, "Anruf angenommen");
    None
}

/// Verarbeitet `call:reject`
pub async fn handle_reject<R>(
    call_id: CallId,
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
    let anruf = state.anrufe.holen(&call_id)?;
    if anruf.receiver_id != sitzung.user_id {
        return None;
    }

    state.anrufe.entfernen(&call_id);

    if let Err(e) = state
        .repo
        .anruf_aktualisieren(
            call_id,
            AnrufUpdate {
                status: Some(AnrufStatus::Rejected),
                ended_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
    {
        tracing::warn!(call_id = %call_id, fehler = %e, "Anruf-Ablehnung konnte nicht gespeichert werden");
    }

    state
        .raeume
        .an_benutzer_senden(&anruf.initiator_id, ServerEvent::CallRejected { call_id });

    tracing::info!(call_id = %call_id, "Anruf abgelehnt");
    None
}

/// Verarbeitet `call:end`
///
/// Beide Seiten duerfen beenden, egal ob der Anruf noch klingelt oder
/// laeuft. Die Gegenstelle bekommt `call:ended`.
pub async fn handle_end<R>(
    call_id: CallId,
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
    let anruf = state.anrufe.holen(&call_id)?;
    let gegenstelle = anruf.gegenstelle(&sitzung.user_id)?;

    let anruf = state.anrufe.entfernen(&call_id)?;
    anruf_beenden(call_id, &anruf, state).await;

    state
        .raeume
        .an_benutzer_senden(&gegenstelle, ServerEvent::CallEnded { call_id });

    tracing::info!(call_id = %call_id, beendet_von = %sitzung.user_id, "Anruf beendet");
    None
}

/// Leitet eine WebRTC-Payload an die Gegenstelle eines Anrufs weiter
///
/// Die Payload bleibt opak; der Server validiert SDP oder Kandidaten
/// nicht. Unbekannte Anrufe und Unbeteiligte werden still ignoriert.
pub fn handle_rtc_relay<R>(
    call_id: CallId,
    payload: serde_json::Value,
    bauen: fn(CallId, serde_json::Value) -> ServerEvent,
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
    let anruf = state.anrufe.holen(&call_id)?;
    let gegenstelle = anruf.gegenstelle(&sitzung.user_id)?;

    state
        .raeume
        .an_benutzer_senden(&gegenstelle, bauen(call_id, payload));
    tracing::trace!(call_id = %call_id, "WebRTC-Payload weitergeleitet");
    None
}

/// Beendet beim Verbindungsende alle Anrufe des Benutzers
///
/// Laeuft nur wenn die letzte Session des Benutzers schliesst. Die
/// jeweilige Gegenstelle bekommt ein `call:ended`.
pub async fn verbindung_aufraeumen<R>(sitzung: &Sitzung, state: &Arc<RealtimeState<R>>)
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    if !state.raeume.sessions_von(&sitzung.user_id).is_empty() {
        // Benutzer ist noch ueber andere Sessions erreichbar
        return;
    }

    for (call_id, anruf) in state.anrufe.anrufe_von(&sitzung.user_id) {
        if state.anrufe.entfernen(&call_id).is_none() {
            continue;
        }
        anruf_beenden(call_id, &anruf, state).await;

        if let Some(gegenstelle) = anruf.gegenstelle(&sitzung.user_id) {
            state
                .raeume
                .an_benutzer_senden(&gegenstelle, ServerEvent::CallEnded { call_id });
        }
        tracing::info!(call_id = %call_id, user_id = %sitzung.user_id, "Anruf durch Verbindungsende beendet");
    }
}

/// Persistiert das Ende eines Anrufs mit berechneter Dauer
async fn anruf_beenden<R>(call_id: CallId, anruf: &AktiverAnruf, state: &Arc<RealtimeState<R>>)
where
    R: BenutzerRepository
        + TeilnehmerRepository
        + NachrichtenRepository
        + AnrufRepository
        + 'static,
{
    let jetzt = Utc::now();
    if let Err(e) = state
        .repo
        .anruf_aktualisieren(
            call_id,
            AnrufUpdate {
                status: Some(AnrufStatus::Ended),
                ended_at: Some(jetzt),
                duration_sek: Some(anruf.dauer_sek(jetzt)),
                ..Default::default()
            },
        )
        .await
    {
        tracing::warn!(call_id = %call_id, fehler = %e, "Anruf-Ende konnte nicht gespeichert werden");
    }
}

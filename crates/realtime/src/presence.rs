//! Praesenz – Online/Offline-Wechsel persistieren und verteilen
//!
//! Ein Benutzer ist online solange mindestens eine Session besteht.
//! Erst die erste Session loest den Online-Broadcast aus, erst das Ende
//! der letzten den Offline-Broadcast. Repository-Fehler werden geloggt
//! aber nicht propagiert; eine kaputte Praesenz-Schreibung darf keine
//! Verbindung abbrechen.

use plausch_db::BenutzerRepository;
use plausch_protocol::events::ServerEvent;

use crate::broadcast::{Kanal, RaumRegister};
use crate::session::Sitzung;

/// Meldet eine frisch registrierte Session als online
///
/// Muss NACH `session_registrieren` laufen; nur die erste Session des
/// Benutzers loest Persistierung und Broadcast aus. Der Broadcast geht
/// an alle anderen Sessions, die eigene bekommt ihn nicht.
pub async fn online_melden<R: BenutzerRepository>(
    repo: &R,
    raeume: &RaumRegister,
    sitzung: &Sitzung,
) {
    if raeume.sessions_von(&sitzung.user_id).len() != 1 {
        // Weitere Session desselben Benutzers, Status unveraendert
        return;
    }

    if let Err(e) = repo.praesenz_setzen(sitzung.user_id, true).await {
        tracing::warn!(user_id = %sitzung.user_id, fehler = %e, "Online-Status konnte nicht gespeichert werden");
    }

    raeume.senden_ausser(
        &Kanal::Alle,
        &sitzung.id,
        ServerEvent::PresenceUpdate {
            user_id: sitzung.user_id,
            is_online: true,
            last_seen: None,
        },
    );
    tracing::info!(user_id = %sitzung.user_id, "Benutzer online");
}

/// Meldet eine beendete Session als offline
///
/// Muss NACH `session_entfernen` laufen; nur das Ende der letzten
/// Session des Benutzers loest Persistierung und Broadcast aus.
pub async fn offline_melden<R: BenutzerRepository>(
    repo: &R,
    raeume: &RaumRegister,
    sitzung: &Sitzung,
) {
    if !raeume.sessions_von(&sitzung.user_id).is_empty() {
        return;
    }

    let last_seen = match repo.praesenz_setzen(sitzung.user_id, false).await {
        Ok(zeit) => zeit,
        Err(e) => {
            tracing::warn!(user_id = %sitzung.user_id, fehler = %e, "Offline-Status konnte nicht gespeichert werden");
            None
        }
    };

    raeume.senden(
        &Kanal::Alle,
        ServerEvent::PresenceUpdate {
            user_id: sitzung.user_id,
            is_online: false,
            last_seen,
        },
    );
    tracing::info!(user_id = %sitzung.user_id, "Benutzer offline");
}

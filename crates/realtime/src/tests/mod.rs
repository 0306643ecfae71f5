//! Integrationsnahe Tests der Live-Schicht gegen In-Memory SQLite

mod message_tests;

use std::sync::Arc;

use tokio::sync::mpsc;

use plausch_auth::TokenVerifizierer;
use plausch_core::types::ConversationId;
use plausch_db::{
    models::NeuerBenutzer, BenutzerRepository, SqliteDb, TeilnehmerRepository,
};
use plausch_protocol::events::ServerEvent;

use crate::presence;
use crate::server_state::{RealtimeConfig, RealtimeState};
use crate::session::Sitzung;

/// Baut einen RealtimeState mit frischer In-Memory-Datenbank
pub(crate) async fn test_state() -> Arc<RealtimeState<SqliteDb>> {
    let db = Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory DB konnte nicht erstellt werden"),
    );
    RealtimeState::neu(
        RealtimeConfig::default(),
        TokenVerifizierer::neu("test-geheimnis"),
        db,
    )
}

/// Legt einen Benutzer an und verbindet ihn mit einer Session
///
/// Entspricht einem erfolgreichen Handshake: Session registriert,
/// Praesenz gemeldet. Die Empfangs-Queue wird geleert zurueckgegeben,
/// damit Setup-Broadcasts die Assertions nicht stoeren.
pub(crate) async fn verbundener_benutzer(
    state: &Arc<RealtimeState<SqliteDb>>,
    email: &str,
) -> (Sitzung, mpsc::Receiver<ServerEvent>) {
    let benutzer = state
        .repo
        .benutzer_erstellen(NeuerBenutzer {
            email,
            display_name: None,
        })
        .await
        .expect("Benutzer erstellen fehlgeschlagen");

    let sitzung = Sitzung::neu(benutzer.id, email);
    let rx = state.raeume.session_registrieren(&sitzung);
    presence::online_melden(state.repo.as_ref(), &state.raeume, &sitzung).await;
    (sitzung, rx)
}

/// Verbindet eine weitere Session eines bereits angelegten Benutzers
pub(crate) async fn weitere_session(
    state: &Arc<RealtimeState<SqliteDb>>,
    sitzung: &Sitzung,
) -> (Sitzung, mpsc::Receiver<ServerEvent>) {
    let neue = Sitzung::neu(sitzung.user_id, sitzung.email.clone());
    let rx = state.raeume.session_registrieren(&neue);
    presence::online_melden(state.repo.as_ref(), &state.raeume, &neue).await;
    (neue, rx)
}

/// Legt eine Unterhaltung mit den gegebenen Teilnehmern an
pub(crate) async fn unterhaltung_mit(
    state: &Arc<RealtimeState<SqliteDb>>,
    teilnehmer: &[&Sitzung],
) -> ConversationId {
    let unterhaltung = state
        .repo
        .unterhaltung_erstellen(None, teilnehmer.len() > 2)
        .await
        .expect("Unterhaltung erstellen fehlgeschlagen");
    for s in teilnehmer {
        state
            .repo
            .teilnehmer_hinzufuegen(unterhaltung.id, s.user_id, false)
            .await
            .expect("Teilnehmer hinzufuegen fehlgeschlagen");
    }
    unterhaltung.id
}

/// Leert eine Empfangs-Queue (z.B. Setup-Broadcasts)
pub(crate) fn queue_leeren(rx: &mut mpsc::Receiver<ServerEvent>) {
    while rx.try_recv().is_ok() {}
}

//! Tests fuer Zustell-Pipeline, Quittungen und Tipp-Indikator

use plausch_core::types::NachrichtenStatus;
use plausch_db::NachrichtenRepository;
use plausch_protocol::events::{ClientEvent, FehlerCode, ServerEvent};

use crate::dispatcher::EventDispatcher;
use crate::tests::{queue_leeren, test_state, unterhaltung_mit, verbundener_benutzer};

#[tokio::test]
async fn nachricht_wird_verteilt_und_sofort_zugestellt() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    for s in [&alice, &bob] {
        assert!(dispatcher
            .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, s)
            .await
            .is_none());
    }
    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);

    let antwort = dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "Hallo Bob".into(),
            },
            &alice,
        )
        .await
        .expect("Absender bekommt message:new als Antwort");

    let message_id = match antwort {
        ServerEvent::MessageNew { ref message } => {
            assert_eq!(message.content, "Hallo Bob");
            assert_eq!(message.sender_id, alice.user_id);
            assert_eq!(message.status, NachrichtenStatus::Sent);
            message.id
        }
        other => panic!("Unerwartete Antwort: {other:?}"),
    };

    // Bob bekommt die Nachricht und den sofortigen Statuswechsel
    match bob_rx.try_recv().expect("message:new fuer Bob") {
        ServerEvent::MessageNew { message } => assert_eq!(message.id, message_id),
        other => panic!("Unerwartetes Event: {other:?}"),
    }
    match bob_rx.try_recv().expect("message:status fuer Bob") {
        ServerEvent::MessageStatus { status, .. } => {
            assert_eq!(status, NachrichtenStatus::Delivered)
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }

    // Alice bekommt nur den Statuswechsel, nicht ihre eigene Nachricht
    match alice_rx.try_recv().expect("message:status fuer Alice") {
        ServerEvent::MessageStatus { message_id: mid, status } => {
            assert_eq!(mid, message_id);
            assert_eq!(status, NachrichtenStatus::Delivered);
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }
    assert!(alice_rx.try_recv().is_err());

    let geladen = state.repo.nachricht_laden(message_id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Delivered);
}

#[tokio::test]
async fn nicht_teilnehmer_wird_abgelehnt() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, _alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let (carol, _carol_rx) = verbundener_benutzer(&state, "carol@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    dispatcher
        .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, &bob)
        .await;
    queue_leeren(&mut bob_rx);

    // Der Kanal-Beitritt selbst ist bedingungslos
    assert!(dispatcher
        .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, &carol)
        .await
        .is_none());

    // message:send wird fuer Nicht-Teilnehmer abgelehnt, ohne dass
    // etwas verteilt wird
    match dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "eingeschlichen".into(),
            },
            &carol,
        )
        .await
    {
        Some(ServerEvent::Error { code, .. }) => assert_eq!(code, FehlerCode::NotParticipant),
        other => panic!("Fehler erwartet, bekam {other:?}"),
    }
    assert!(bob_rx.try_recv().is_err(), "Bob darf nichts empfangen");
}

#[tokio::test]
async fn keine_zustellung_wenn_gegenseite_offline() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    // Bob trennt alle Sessions, Praesenz geht auf offline
    drop(bob_rx);
    state.raeume.session_entfernen(&bob.id);
    crate::presence::offline_melden(state.repo.as_ref(), &state.raeume, &bob).await;

    dispatcher
        .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, &alice)
        .await;
    queue_leeren(&mut alice_rx);

    let antwort = dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "jemand da?".into(),
            },
            &alice,
        )
        .await
        .unwrap();

    let message_id = match antwort {
        ServerEvent::MessageNew { message } => message.id,
        other => panic!("Unerwartete Antwort: {other:?}"),
    };

    // Kein Statuswechsel: niemand online
    assert!(alice_rx.try_recv().is_err());
    let geladen = state.repo.nachricht_laden(message_id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Sent);
}

#[tokio::test]
async fn zustell_quittung_greift_nur_aus_sent() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    // Bob offline, damit die Nachricht in SENT bleibt
    drop(bob_rx);
    state.raeume.session_entfernen(&bob.id);
    crate::presence::offline_melden(state.repo.as_ref(), &state.raeume, &bob).await;

    dispatcher
        .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, &alice)
        .await;
    queue_leeren(&mut alice_rx);

    let message_id = match dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "kommt an?".into(),
            },
            &alice,
        )
        .await
        .unwrap()
    {
        ServerEvent::MessageNew { message } => message.id,
        other => panic!("Unerwartete Antwort: {other:?}"),
    };

    // Quittung greift unabhaengig davon, wer sie schickt; entscheidend
    // ist allein der Status SENT
    assert!(dispatcher
        .verteilen(ClientEvent::MessageDelivered { message_id }, &alice)
        .await
        .is_none());
    match alice_rx.try_recv().expect("message:status DELIVERED") {
        ServerEvent::MessageStatus { status, .. } => {
            assert_eq!(status, NachrichtenStatus::Delivered)
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }

    // Zweite Quittung laeuft ins Leere, der Status ist nicht mehr SENT
    dispatcher
        .verteilen(ClientEvent::MessageDelivered { message_id }, &alice)
        .await;
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn lese_quittung_setzt_read() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    for s in [&alice, &bob] {
        dispatcher
            .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, s)
            .await;
    }
    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);

    let message_id = match dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "lies mich".into(),
            },
            &alice,
        )
        .await
        .unwrap()
    {
        ServerEvent::MessageNew { message } => message.id,
        other => panic!("Unerwartete Antwort: {other:?}"),
    };
    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);

    assert!(dispatcher
        .verteilen(
            ClientEvent::MessageRead {
                conversation_id: unterhaltung,
                message_id,
            },
            &bob,
        )
        .await
        .is_none());

    match alice_rx.try_recv().expect("message:status READ fuer Alice") {
        ServerEvent::MessageStatus { status, .. } => assert_eq!(status, NachrichtenStatus::Read),
        other => panic!("Unerwartetes Event: {other:?}"),
    }

    let geladen = state.repo.nachricht_laden(message_id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Read);
}

#[tokio::test]
async fn lese_quittung_wird_bei_jedem_leser_erneut_verteilt() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let (carol, mut carol_rx) = verbundener_benutzer(&state, "carol@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob, &carol]).await;

    for s in [&alice, &bob, &carol] {
        dispatcher
            .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, s)
            .await;
    }
    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);
    queue_leeren(&mut carol_rx);

    let message_id = match dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "an die Gruppe".into(),
            },
            &alice,
        )
        .await
        .unwrap()
    {
        ServerEvent::MessageNew { message } => message.id,
        other => panic!("Unerwartete Antwort: {other:?}"),
    };

    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);
    queue_leeren(&mut carol_rx);

    // Jede Lesung erreicht den Absender, auch die zweite auf einer
    // bereits gelesenen Nachricht
    for leser in [&bob, &carol] {
        dispatcher
            .verteilen(
                ClientEvent::MessageRead {
                    conversation_id: unterhaltung,
                    message_id,
                },
                leser,
            )
            .await;

        match alice_rx.try_recv().expect("message:status READ fuer Alice") {
            ServerEvent::MessageStatus { message_id: mid, status } => {
                assert_eq!(mid, message_id);
                assert_eq!(status, NachrichtenStatus::Read);
            }
            other => panic!("Unerwartetes Event: {other:?}"),
        }
        queue_leeren(&mut alice_rx);
    }
}

#[tokio::test]
async fn eigene_lese_quittung_aendert_status_nicht() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;
    drop(bob_rx);
    state.raeume.session_entfernen(&bob.id);
    crate::presence::offline_melden(state.repo.as_ref(), &state.raeume, &bob).await;

    dispatcher
        .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, &alice)
        .await;
    queue_leeren(&mut alice_rx);

    let message_id = match dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "an mich selbst".into(),
            },
            &alice,
        )
        .await
        .unwrap()
    {
        ServerEvent::MessageNew { message } => message.id,
        other => panic!("Unerwartete Antwort: {other:?}"),
    };
    queue_leeren(&mut alice_rx);

    // Absender liest die eigene Nachricht: last_read_at ja, Status nein
    dispatcher
        .verteilen(
            ClientEvent::MessageRead {
                conversation_id: unterhaltung,
                message_id,
            },
            &alice,
        )
        .await;

    assert!(alice_rx.try_recv().is_err());
    let geladen = state.repo.nachricht_laden(message_id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Sent);
}

#[tokio::test]
async fn tipp_indikator_wird_weitergeleitet() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, mut alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    for s in [&alice, &bob] {
        dispatcher
            .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, s)
            .await;
    }
    queue_leeren(&mut alice_rx);
    queue_leeren(&mut bob_rx);

    assert!(dispatcher
        .verteilen(ClientEvent::TypingStart { conversation_id: unterhaltung }, &alice)
        .await
        .is_none());

    match bob_rx.try_recv().expect("typing:update fuer Bob") {
        ServerEvent::TypingUpdate { user_id, is_typing, .. } => {
            assert_eq!(user_id, alice.user_id);
            assert!(is_typing);
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }
    assert!(alice_rx.try_recv().is_err(), "Ausloeser bekommt kein Echo");

    dispatcher
        .verteilen(ClientEvent::TypingStop { conversation_id: unterhaltung }, &alice)
        .await;
    match bob_rx.try_recv().expect("typing:update (stop) fuer Bob") {
        ServerEvent::TypingUpdate { is_typing, .. } => assert!(!is_typing),
        other => panic!("Unerwartetes Event: {other:?}"),
    }
}

#[tokio::test]
async fn room_leave_stoppt_zustellung() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(state.clone());

    let (alice, _alice_rx) = verbundener_benutzer(&state, "alice@example.org").await;
    let (bob, mut bob_rx) = verbundener_benutzer(&state, "bob@example.org").await;
    let unterhaltung = unterhaltung_mit(&state, &[&alice, &bob]).await;

    for s in [&alice, &bob] {
        dispatcher
            .verteilen(ClientEvent::RoomJoin { conversation_id: unterhaltung }, s)
            .await;
    }
    dispatcher
        .verteilen(ClientEvent::RoomLeave { conversation_id: unterhaltung }, &bob)
        .await;
    queue_leeren(&mut bob_rx);

    dispatcher
        .verteilen(
            ClientEvent::MessageSend {
                conversation_id: unterhaltung,
                content: "Bob hoert nicht mehr zu".into(),
            },
            &alice,
        )
        .await;

    // Bob hat den Kanal verlassen: kein message:new mehr.
    // Der Statuswechsel findet trotzdem statt (Bob ist weiter online),
    // erreicht ihn aber ebenfalls nicht.
    assert!(bob_rx.try_recv().is_err());
}

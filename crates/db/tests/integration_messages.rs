//! Integration-Tests fuer Nachrichten und Teilnahmen (In-Memory SQLite)

use chrono::Utc;

use plausch_core::types::{NachrichtenStatus, NachrichtenTyp};
use plausch_db::{
    models::{NeueNachricht, NeuerBenutzer},
    BenutzerRepository, NachrichtenRepository, SqliteDb, TeilnehmerRepository,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

async fn benutzer(db: &SqliteDb, email: &str) -> plausch_db::models::BenutzerRecord {
    db.benutzer_erstellen(NeuerBenutzer {
        email,
        display_name: None,
    })
    .await
    .expect("Benutzer erstellen fehlgeschlagen")
}

#[tokio::test]
async fn nachricht_erstellen_und_laden() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;
    let unterhaltung = db.unterhaltung_erstellen(None, false).await.unwrap();
    db.teilnehmer_hinzufuegen(unterhaltung.id, alice.id, true)
        .await
        .unwrap();

    let nachricht = db
        .nachricht_erstellen(NeueNachricht {
            conversation_id: unterhaltung.id,
            sender_id: alice.id,
            content: "Hallo Welt",
            message_type: NachrichtenTyp::Text,
        })
        .await
        .unwrap();

    assert_eq!(nachricht.status, NachrichtenStatus::Sent);

    let geladen = db
        .nachricht_laden(nachricht.id)
        .await
        .unwrap()
        .expect("Nachricht sollte gefunden werden");
    assert_eq!(geladen.content, "Hallo Welt");
    assert_eq!(geladen.sender_id, alice.id);
    assert_eq!(geladen.message_type, NachrichtenTyp::Text);
}

#[tokio::test]
async fn status_uebergaenge_monoton() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;
    let unterhaltung = db.unterhaltung_erstellen(None, false).await.unwrap();
    db.teilnehmer_hinzufuegen(unterhaltung.id, alice.id, false)
        .await
        .unwrap();

    let nachricht = db
        .nachricht_erstellen(NeueNachricht {
            conversation_id: unterhaltung.id,
            sender_id: alice.id,
            content: "hi",
            message_type: NachrichtenTyp::Text,
        })
        .await
        .unwrap();

    assert!(db.als_zugestellt_markieren(nachricht.id).await.unwrap());
    // Zweite Zustell-Quittung greift nicht mehr
    assert!(!db.als_zugestellt_markieren(nachricht.id).await.unwrap());

    assert!(db.als_gelesen_markieren(nachricht.id).await.unwrap());
    // READ ist terminal fuer Zustell-Quittungen, bleibt aber selbst
    // wiederholbar (jede weitere Lesung wird erneut gemeldet)
    assert!(!db.als_zugestellt_markieren(nachricht.id).await.unwrap());
    assert!(db.als_gelesen_markieren(nachricht.id).await.unwrap());

    let geladen = db.nachricht_laden(nachricht.id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Read);
}

#[tokio::test]
async fn gelesen_ueberspringt_zugestellt() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;
    let unterhaltung = db.unterhaltung_erstellen(None, false).await.unwrap();
    db.teilnehmer_hinzufuegen(unterhaltung.id, alice.id, false)
        .await
        .unwrap();

    let nachricht = db
        .nachricht_erstellen(NeueNachricht {
            conversation_id: unterhaltung.id,
            sender_id: alice.id,
            content: "hi",
            message_type: NachrichtenTyp::Text,
        })
        .await
        .unwrap();

    // Lese-Quittung direkt aus SENT heraus ist erlaubt
    assert!(db.als_gelesen_markieren(nachricht.id).await.unwrap());
    let geladen = db.nachricht_laden(nachricht.id).await.unwrap().unwrap();
    assert_eq!(geladen.status, NachrichtenStatus::Read);
}

#[tokio::test]
async fn andere_teilnehmer_mit_praesenz() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;
    let bob = benutzer(&db, "bob@example.org").await;
    let carol = benutzer(&db, "carol@example.org").await;

    let unterhaltung = db.unterhaltung_erstellen(Some("Gruppe"), true).await.unwrap();
    for uid in [alice.id, bob.id, carol.id] {
        db.teilnehmer_hinzufuegen(unterhaltung.id, uid, false)
            .await
            .unwrap();
    }

    db.praesenz_setzen(bob.id, true).await.unwrap();

    let andere = db.andere_teilnehmer(unterhaltung.id, alice.id).await.unwrap();
    assert_eq!(andere.len(), 2);
    assert!(!andere.iter().any(|t| t.user_id == alice.id));

    let bob_eintrag = andere.iter().find(|t| t.user_id == bob.id).unwrap();
    assert!(bob_eintrag.is_online);
    let carol_eintrag = andere.iter().find(|t| t.user_id == carol.id).unwrap();
    assert!(!carol_eintrag.is_online);
}

#[tokio::test]
async fn letzte_lesung_und_beruehren() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;
    let unterhaltung = db.unterhaltung_erstellen(None, false).await.unwrap();
    db.teilnehmer_hinzufuegen(unterhaltung.id, alice.id, false)
        .await
        .unwrap();

    let jetzt = Utc::now();
    db.letzte_lesung_setzen(unterhaltung.id, alice.id, jetzt)
        .await
        .unwrap();

    let teilnahme = db
        .teilnehmer_finden(unterhaltung.id, alice.id)
        .await
        .unwrap()
        .unwrap();
    let gelesen_am = teilnahme.last_read_at.expect("last_read_at sollte gesetzt sein");
    assert!((gelesen_am - jetzt).num_seconds().abs() < 2);

    db.unterhaltung_beruehren(unterhaltung.id, jetzt).await.unwrap();
}

#[tokio::test]
async fn praesenz_setzen_liefert_last_seen() {
    let db = db().await;
    let alice = benutzer(&db, "alice@example.org").await;

    assert!(db.praesenz_setzen(alice.id, true).await.unwrap().is_none());
    let geladen = db.benutzer_laden(alice.id).await.unwrap().unwrap();
    assert!(geladen.is_online);

    let last_seen = db
        .praesenz_setzen(alice.id, false)
        .await
        .unwrap()
        .expect("Offline-Gehen sollte last_seen liefern");
    let geladen = db.benutzer_laden(alice.id).await.unwrap().unwrap();
    assert!(!geladen.is_online);
    assert_eq!(geladen.last_seen.map(|t| t.timestamp()), Some(last_seen.timestamp()));
}

#[tokio::test]
async fn email_eindeutig() {
    let db = db().await;
    benutzer(&db, "doppelt@example.org").await;

    let err = db
        .benutzer_erstellen(NeuerBenutzer {
            email: "doppelt@example.org",
            display_name: Some("Zweiter"),
        })
        .await
        .expect_err("Doppelte E-Mail muss fehlschlagen");
    assert!(matches!(err, plausch_db::DbError::Eindeutigkeit(_)));
}

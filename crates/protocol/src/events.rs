//! Event-Protokoll der Live-Schicht
//!
//! Definiert alle Ereignisse die ueber die persistente Verbindung
//! zwischen Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Event-basiert, bidirektional: `ClientEvent` (eingehend) und
//!   `ServerEvent` (ausgehend) sind getrennte Enums.
//! - JSON-Serialisierung via serde mit `{"event": "...", "data": {...}}`
//!   als Umschlag; die Event-Namen (`message:send`, `call:incoming`, ...)
//!   sind Teil des Protokolls.
//! - RTC-Payloads (SDP, ICE-Kandidaten) sind fuer den Server opak und
//!   werden als rohes `serde_json::Value` transportiert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plausch_core::types::{
    AnrufTyp, CallId, ConversationId, MessageId, NachrichtenStatus, NachrichtenTyp, UserId,
};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer `error`-Events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FehlerCode {
    // Auth (Handshake)
    AuthenticationRequired,
    InvalidToken,
    // Autorisierung
    NotParticipant,
    // Nachrichten
    MessageFailed,
    // Anrufe
    UserNotFound,
    UserOffline,
    CallFailed,
    // Allgemein
    InternalError,
}

// ---------------------------------------------------------------------------
// Eingehende Events (Client -> Server)
// ---------------------------------------------------------------------------

/// Alle Events die ein Client an den Server senden kann
///
/// Das erste Event jeder Verbindung muss `auth` sein; alle weiteren
/// Events werden erst nach erfolgreicher Authentifizierung verarbeitet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Handshake: Bearer-Token zur Authentifizierung der Verbindung
    #[serde(rename = "auth")]
    Auth { token: String },

    /// Unterhaltungs-Kanal betreten (fuer Gruppen-Broadcasts)
    #[serde(rename = "room:join")]
    RoomJoin { conversation_id: ConversationId },

    /// Unterhaltungs-Kanal verlassen
    #[serde(rename = "room:leave")]
    RoomLeave { conversation_id: ConversationId },

    /// Neue Nachricht senden
    #[serde(rename = "message:send")]
    MessageSend {
        conversation_id: ConversationId,
        content: String,
    },

    /// Nachricht als zugestellt bestaetigen
    #[serde(rename = "message:delivered")]
    MessageDelivered { message_id: MessageId },

    /// Nachricht als gelesen markieren
    #[serde(rename = "message:read")]
    MessageRead {
        conversation_id: ConversationId,
        message_id: MessageId,
    },

    /// Tipp-Indikator starten
    #[serde(rename = "typing:start")]
    TypingStart { conversation_id: ConversationId },

    /// Tipp-Indikator stoppen
    #[serde(rename = "typing:stop")]
    TypingStop { conversation_id: ConversationId },

    /// Anruf starten
    #[serde(rename = "call:initiate")]
    CallInitiate {
        receiver_id: UserId,
        call_type: AnrufTyp,
    },

    /// Anruf annehmen
    #[serde(rename = "call:accept")]
    CallAccept { call_id: CallId },

    /// Anruf ablehnen
    #[serde(rename = "call:reject")]
    CallReject { call_id: CallId },

    /// Anruf beenden
    #[serde(rename = "call:end")]
    CallEnd { call_id: CallId },

    /// WebRTC-Offer an die Gegenstelle weiterleiten (opak)
    #[serde(rename = "rtc:offer")]
    RtcOffer {
        call_id: CallId,
        payload: serde_json::Value,
    },

    /// WebRTC-Answer an die Gegenstelle weiterleiten (opak)
    #[serde(rename = "rtc:answer")]
    RtcAnswer {
        call_id: CallId,
        payload: serde_json::Value,
    },

    /// ICE-Kandidat an die Gegenstelle weiterleiten (opak)
    #[serde(rename = "rtc:ice-candidate")]
    RtcIceCandidate {
        call_id: CallId,
        payload: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Ausgehende Events (Server -> Client)
// ---------------------------------------------------------------------------

/// Vollstaendige Nachricht wie sie an Clients verteilt wird
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NachrichtEvent {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: NachrichtenTyp,
    pub status: NachrichtenStatus,
    pub created_at: DateTime<Utc>,
}

/// Informationen ueber den Anrufer in `call:incoming`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnruferInfo {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Alle Events die der Server an Clients sendet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Handshake erfolgreich, Verbindung ist authentifiziert
    #[serde(rename = "auth:ok")]
    AuthOk { user_id: UserId },

    /// Neue Nachricht im Unterhaltungs-Kanal
    #[serde(rename = "message:new")]
    MessageNew { message: NachrichtEvent },

    /// Statuswechsel einer Nachricht
    #[serde(rename = "message:status")]
    MessageStatus {
        message_id: MessageId,
        status: NachrichtenStatus,
    },

    /// Tipp-Indikator eines anderen Teilnehmers
    #[serde(rename = "typing:update")]
    TypingUpdate {
        conversation_id: ConversationId,
        user_id: UserId,
        is_typing: bool,
    },

    /// Online/Offline-Wechsel eines Benutzers
    #[serde(rename = "presence:update")]
    PresenceUpdate {
        user_id: UserId,
        is_online: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_seen: Option<DateTime<Utc>>,
    },

    /// Eingehender Anruf (an die persoenliche Queue des Empfaengers)
    #[serde(rename = "call:incoming")]
    CallIncoming {
        call_id: CallId,
        initiator: AnruferInfo,
        call_type: AnrufTyp,
    },

    /// Bestaetigung an den Anrufer: Anruf wurde angelegt
    #[serde(rename = "call:initiated")]
    CallInitiated { call_id: CallId },

    /// Gegenstelle hat angenommen
    #[serde(rename = "call:accepted")]
    CallAccepted { call_id: CallId },

    /// Gegenstelle hat abgelehnt
    #[serde(rename = "call:rejected")]
    CallRejected { call_id: CallId },

    /// Anruf beendet (explizit oder durch Verbindungsabbruch)
    #[serde(rename = "call:ended")]
    CallEnded { call_id: CallId },

    /// Weitergeleiteter WebRTC-Offer
    #[serde(rename = "rtc:offer")]
    RtcOffer {
        call_id: CallId,
        payload: serde_json::Value,
    },

    /// Weitergeleitete WebRTC-Answer
    #[serde(rename = "rtc:answer")]
    RtcAnswer {
        call_id: CallId,
        payload: serde_json::Value,
    },

    /// Weitergeleiteter ICE-Kandidat
    #[serde(rename = "rtc:ice-candidate")]
    RtcIceCandidate {
        call_id: CallId,
        payload: serde_json::Value,
    },

    /// Nicht-fatale Fehlermeldung zu einem einzelnen Event
    #[serde(rename = "error")]
    Error { code: FehlerCode, message: String },
}

impl ServerEvent {
    /// Erstellt ein Fehler-Event
    pub fn fehler(code: FehlerCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_namen_im_umschlag() {
        let event = ClientEvent::MessageSend {
            conversation_id: ConversationId::new(),
            content: "hallo".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"message:send\""));
        assert!(json.contains("\"content\":\"hallo\""));
    }

    #[test]
    fn server_event_namen_im_umschlag() {
        let event = ServerEvent::CallEnded {
            call_id: CallId::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"call:ended\""));
    }

    #[test]
    fn rtc_payload_bleibt_opak() {
        let payload = serde_json::json!({"type": "offer", "sdp": "v=0..."});
        let event = ClientEvent::RtcOffer {
            call_id: CallId::new(),
            payload: payload.clone(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let zurueck: ClientEvent = serde_json::from_str(&json).unwrap();
        match zurueck {
            ClientEvent::RtcOffer { payload: p, .. } => assert_eq!(p, payload),
            _ => panic!("Falsches Event deserialisiert"),
        }
    }

    #[test]
    fn fehler_code_screaming_snake() {
        let json = serde_json::to_string(&FehlerCode::NotParticipant).unwrap();
        assert_eq!(json, "\"NOT_PARTICIPANT\"");
        let json = serde_json::to_string(&FehlerCode::UserOffline).unwrap();
        assert_eq!(json, "\"USER_OFFLINE\"");
    }

    #[test]
    fn presence_ohne_last_seen_kompakt() {
        let event = ServerEvent::PresenceUpdate {
            user_id: UserId::new(),
            is_online: true,
            last_seen: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("last_seen"));
    }

    #[test]
    fn ice_candidate_bindestrich_name() {
        let event = ClientEvent::RtcIceCandidate {
            call_id: CallId::new(),
            payload: serde_json::Value::Null,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"rtc:ice-candidate\""));
    }
}

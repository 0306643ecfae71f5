//! Gemeinsame Identifikations- und Statustypen fuer Plausch
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Die Display-
//! Implementierungen liefern die Kanalnamen des Protokolls
//! (`user:<uuid>`, `conversation:<uuid>`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Erstellt eine neue zufaellige UserId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Eindeutige Unterhaltungs-ID (Einzel- oder Gruppenchat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    /// Erstellt eine neue zufaellige ConversationId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conversation:{}", self.0)
    }
}

/// Eindeutige Nachrichten-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Erstellt eine neue zufaellige MessageId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "message:{}", self.0)
    }
}

/// Eindeutige Anruf-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    /// Erstellt eine neue zufaellige CallId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call:{}", self.0)
    }
}

/// Eindeutige Session-ID (eine pro offener Verbindung)
///
/// Ein Benutzer kann mehrere gleichzeitige Verbindungen halten, daher
/// werden Sessions getrennt von der UserId identifiziert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Erstellt eine neue zufaellige SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status- und Typ-Enums
// ---------------------------------------------------------------------------

/// Zustellstatus einer Nachricht
///
/// Der Status ist monoton: `Sent -> Delivered -> Read`. Ein Ruecksprung
/// findet nie statt; `Read` darf `Delivered` ueberspringen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NachrichtenStatus {
    Sent,
    Delivered,
    Read,
}

impl NachrichtenStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        }
    }
}

impl std::str::FromStr for NachrichtenStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENT" => Ok(Self::Sent),
            "DELIVERED" => Ok(Self::Delivered),
            "READ" => Ok(Self::Read),
            other => Err(format!("Unbekannter Nachrichten-Status: {other}")),
        }
    }
}

/// Inhaltstyp einer Nachricht
///
/// Die Live-Schicht erzeugt nur `Text`; Datei- und Bildnachrichten
/// entstehen ueber den (externen) Upload-Pfad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NachrichtenTyp {
    Text,
    Image,
    File,
}

impl NachrichtenTyp {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::File => "FILE",
        }
    }
}

impl std::str::FromStr for NachrichtenTyp {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            "FILE" => Ok(Self::File),
            other => Err(format!("Unbekannter Nachrichten-Typ: {other}")),
        }
    }
}

/// Art eines Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnrufTyp {
    Voice,
    Video,
}

impl AnrufTyp {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Voice => "VOICE",
            Self::Video => "VIDEO",
        }
    }
}

impl std::str::FromStr for AnrufTyp {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VOICE" => Ok(Self::Voice),
            "VIDEO" => Ok(Self::Video),
            other => Err(format!("Unbekannter Anruf-Typ: {other}")),
        }
    }
}

/// Lebenszyklus-Status eines Anrufs
///
/// ```text
/// (neu) --initiate--> Ringing --accept--> Ongoing --end--> Ended
///                        |                   |
///                      reject          end/disconnect
///                        v                   v
///                     Rejected             Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnrufStatus {
    Ringing,
    Ongoing,
    Rejected,
    Ended,
}

impl AnrufStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Ringing => "RINGING",
            Self::Ongoing => "ONGOING",
            Self::Rejected => "REJECTED",
            Self::Ended => "ENDED",
        }
    }

    /// Gibt `true` zurueck wenn der Anruf einen Endzustand erreicht hat
    pub fn ist_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Ended)
    }
}

impl std::str::FromStr for AnrufStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RINGING" => Ok(Self::Ringing),
            "ONGOING" => Ok(Self::Ongoing),
            "REJECTED" => Ok(Self::Rejected),
            "ENDED" => Ok(Self::Ended),
            other => Err(format!("Unbekannter Anruf-Status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn user_id_eindeutig() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b, "Zwei neue UserIds muessen verschieden sein");
    }

    #[test]
    fn session_id_eindeutig() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn kanal_namen_im_display() {
        let uid = UserId(Uuid::nil());
        let cid = ConversationId(Uuid::nil());
        assert!(uid.to_string().starts_with("user:"));
        assert!(cid.to_string().starts_with("conversation:"));
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let mid = MessageId::new();
        let json = serde_json::to_string(&mid).unwrap();
        let mid2: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(mid, mid2);
    }

    #[test]
    fn status_serde_screaming_snake() {
        let json = serde_json::to_string(&NachrichtenStatus::Delivered).unwrap();
        assert_eq!(json, "\"DELIVERED\"");
        let s: NachrichtenStatus = serde_json::from_str("\"READ\"").unwrap();
        assert_eq!(s, NachrichtenStatus::Read);
    }

    #[test]
    fn status_roundtrip_als_str() {
        for status in [
            NachrichtenStatus::Sent,
            NachrichtenStatus::Delivered,
            NachrichtenStatus::Read,
        ] {
            assert_eq!(
                NachrichtenStatus::from_str(status.als_str()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn anruf_status_terminal() {
        assert!(AnrufStatus::Rejected.ist_terminal());
        assert!(AnrufStatus::Ended.ist_terminal());
        assert!(!AnrufStatus::Ringing.ist_terminal());
        assert!(!AnrufStatus::Ongoing.ist_terminal());
    }
}

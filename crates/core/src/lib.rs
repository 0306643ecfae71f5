//! plausch-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Plausch-Crates gemeinsam genutzt werden: Newtype-IDs sowie die
//! Status-Enums der Nachrichten- und Anruf-Zustandsmaschinen.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{
    AnrufStatus, AnrufTyp, CallId, ConversationId, MessageId, NachrichtenStatus, NachrichtenTyp,
    SessionId, UserId,
};

//! plausch-realtime – TCP Live-Schicht
//!
//! Dieses Crate implementiert die Live-Schicht von Plausch: Session-
//! Handshake, Kanal-Verwaltung, Nachrichten-Zustellung, Praesenz und
//! 1:1-Anruf-Signalisierung inklusive WebRTC-Relay.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RealtimeServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Handshake: erstes Frame muss `auth` sein
//!     |
//!     v
//! EventDispatcher
//!     |
//!     +-- room_handler     (room:join, room:leave, typing:*)
//!     +-- message_handler  (message:send, message:delivered, message:read)
//!     +-- call_handler     (call:*, rtc:*, Verbindungs-Cleanup)
//!
//! RaumRegister  – Sessions, Kanal-Mitgliedschaft, Event-Zustellung
//! AnrufRegister – Aktive Anrufe (in-memory)
//! presence      – Online/Offline persistieren und verteilen
//! ```

pub mod broadcast;
pub mod calls;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod server_state;
pub mod session;
pub mod tcp;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use broadcast::{Kanal, RaumRegister};
pub use calls::{AktiverAnruf, AnrufRegister};
pub use connection::ClientConnection;
pub use dispatcher::EventDispatcher;
pub use error::{RealtimeError, RealtimeResult};
pub use server_state::{RealtimeConfig, RealtimeState};
pub use session::Sitzung;
pub use tcp::RealtimeServer;

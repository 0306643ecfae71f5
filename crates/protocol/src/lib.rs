//! plausch-protocol – Event-Protokoll und Wire-Format
//!
//! Dieses Crate definiert das Protokoll der Live-Schicht: die Event-Enums
//! fuer beide Richtungen (`events`) und das laengen-praefixierte
//! JSON-Frame-Format fuer TCP (`wire`).

pub mod events;
pub mod wire;

// Bequeme Re-Exporte
pub use events::{AnruferInfo, ClientEvent, FehlerCode, NachrichtEvent, ServerEvent};
pub use wire::FrameCodec;

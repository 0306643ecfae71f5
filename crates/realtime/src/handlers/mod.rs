//! Event-Handler der Live-Schicht
//!
//! Jeder Handler verarbeitet eine Gruppe verwandter Client-Events.
//! Handler geben optional eine direkte Antwort an die ausloesende
//! Session zurueck; Broadcasts an andere Sessions laufen ueber das
//! RaumRegister.

pub mod call_handler;
pub mod message_handler;
pub mod room_handler;

//! plausch-auth – Bearer-Token-Verifizierung
//!
//! Dieses Crate implementiert den Session-Authenticator der Live-Schicht:
//! HMAC-SHA256-signierte Tokens werden beim Verbindungs-Handshake gegen
//! das geteilte Geheimnis geprueft. Ausstellung von Tokens uebernimmt
//! produktiv der externe Login-Dienst.

pub mod error;
pub mod token;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use token::{TokenAnspruch, TokenVerifizierer};

//! Fehlertypen fuer die Token-Verifizierung

use thiserror::Error;

/// Fehler bei der Verifizierung eines Bearer-Tokens
///
/// `TokenFehlt` und `TokenUngueltig` sind bewusst getrennte Varianten:
/// fuer die Diagnose ist sichtbar ob ein Client gar kein Token mitschickt
/// oder ein kaputtes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Kein Token im Handshake mitgeliefert
    #[error("Authentifizierung erforderlich: kein Token")]
    TokenFehlt,

    /// Token nicht dekodierbar oder Signatur falsch
    #[error("Ungueltiges Token")]
    TokenUngueltig,

    /// Signatur korrekt, aber Ablaufzeit ueberschritten
    #[error("Token abgelaufen")]
    TokenAbgelaufen,
}

/// Result-Typ fuer die Token-Verifizierung
pub type AuthResult<T> = Result<T, AuthError>;

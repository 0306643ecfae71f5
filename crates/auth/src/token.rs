//! HMAC-signierte Bearer-Tokens
//!
//! Die Live-Schicht verifiziert Tokens die der (externe) Login-Dienst
//! ausgestellt hat. Beide Seiten teilen ein Geheimnis; der eigentliche
//! Signaturschluessel wird per SHA-256 mit Domaenen-Praefix abgeleitet,
//! damit dasselbe Geheimnis nicht roh in mehreren Kontexten signiert.
//!
//! ## Token-Format
//!
//! ```text
//! base64url_nopad( "<user_uuid>|<email>|<expires_unix>|<hmac_hex>" )
//! ```
//!
//! Die HMAC-SHA256-Signatur deckt `<user_uuid>|<email>|<expires_unix>` ab
//! und bindet damit Identitaet und Ablaufzeit aneinander.

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use plausch_core::types::UserId;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Domaenen-Praefix fuer die Schluesselableitung
const SCHLUESSEL_PRAEFIX: &[u8] = b"plausch-token-v1:";

/// Verifizierter Inhalt eines Bearer-Tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAnspruch {
    /// Authentifizierte Benutzer-ID
    pub user_id: UserId,
    /// E-Mail-Adresse des Benutzers
    pub email: String,
    /// Ablaufzeitpunkt des Tokens
    pub laeuft_ab_am: DateTime<Utc>,
}

/// Verifiziert (und stellt fuer Tests/Tooling aus) HMAC-signierte Tokens
///
/// Thread-safe; Clone teilt nur das abgeleitete Geheimnis.
#[derive(Clone)]
pub struct TokenVerifizierer {
    secret: [u8; 32],
}

impl TokenVerifizierer {
    /// Erstellt einen Verifizierer aus dem geteilten Geheimnis
    pub fn neu(geheimnis: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(SCHLUESSEL_PRAEFIX);
        hasher.update(geheimnis.as_bytes());
        let digest = hasher.finalize();

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&digest);
        Self { secret }
    }

    /// Verifiziert ein Bearer-Token
    ///
    /// `None` (kein Token mitgeliefert) ergibt `AuthError::TokenFehlt`,
    /// ein nicht dekodierbares oder falsch signiertes Token
    /// `AuthError::TokenUngueltig`, ein abgelaufenes
    /// `AuthError::TokenAbgelaufen`.
    pub fn pruefen(&self, token: Option<&str>) -> AuthResult<TokenAnspruch> {
        let token = token.ok_or(AuthError::TokenFehlt)?;

        let dekodiert = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| AuthError::TokenUngueltig)?;
        let token_str = String::from_utf8(dekodiert).map_err(|_| AuthError::TokenUngueltig)?;

        // Aufbau: user_uuid|email|expires|sig_hex
        let teile: Vec<&str> = token_str.splitn(4, '|').collect();
        if teile.len() != 4 {
            return Err(AuthError::TokenUngueltig);
        }
        let (user_str, email, ablauf_str, sig_hex) = (teile[0], teile[1], teile[2], teile[3]);

        // Signatur pruefen (konstantzeitiger Vergleich via Mac::verify_slice)
        let payload = format!("{user_str}|{email}|{ablauf_str}");
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::TokenUngueltig)?;
        mac.update(payload.as_bytes());
        let signatur = hex::decode(sig_hex).map_err(|_| AuthError::TokenUngueltig)?;
        mac.verify_slice(&signatur)
            .map_err(|_| AuthError::TokenUngueltig)?;

        // Inhalt erst nach bestandener Signaturpruefung interpretieren
        let user_id = Uuid::parse_str(user_str)
            .map(UserId)
            .map_err(|_| AuthError::TokenUngueltig)?;
        let ablauf_unix: i64 = ablauf_str.parse().map_err(|_| AuthError::TokenUngueltig)?;
        let laeuft_ab_am = Utc
            .timestamp_opt(ablauf_unix, 0)
            .single()
            .ok_or(AuthError::TokenUngueltig)?;

        if Utc::now() >= laeuft_ab_am {
            return Err(AuthError::TokenAbgelaufen);
        }

        Ok(TokenAnspruch {
            user_id,
            email: email.to_string(),
            laeuft_ab_am,
        })
    }

    /// Stellt ein Token aus
    ///
    /// Der produktive Aussteller ist der externe Login-Dienst; diese
    /// Methode existiert fuer Tests und Ops-Tooling.
    pub fn ausstellen(
        &self,
        user_id: UserId,
        email: &str,
        gueltig_fuer: chrono::Duration,
    ) -> String {
        let ablauf = (Utc::now() + gueltig_fuer).timestamp();
        let payload = format!("{}|{}|{}", user_id.inner(), email, ablauf);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC akzeptiert jede Schluessellaenge");
        mac.update(payload.as_bytes());
        let signatur = mac.finalize().into_bytes();

        let token_str = format!("{}|{}", payload, hex::encode(signatur));
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_str.as_bytes())
    }
}

impl std::fmt::Debug for TokenVerifizierer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Geheimnis nie ausgeben
        f.debug_struct("TokenVerifizierer").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

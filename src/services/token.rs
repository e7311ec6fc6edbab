//! Signed session cookie encoding
//!
//! The cookie carries `<session-id>.<hmac-sha256 hex>` so that a forged or
//! truncated cookie is dropped before the store is ever consulted. The
//! signing secret is per-process unless `SESSION_SECRET` is configured,
//! which is what ties session survival to the secret's lifetime.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session cookie values.
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
}

impl CookieSigner {
    /// Create a signer from the configured secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Encode a session id into a cookie value
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, self.mac_hex(session_id))
    }

    /// Decode a cookie value back into a session id.
    ///
    /// Returns `None` for malformed values and bad signatures alike; the
    /// caller treats both as "no session".
    pub fn verify(&self, value: &str) -> Option<String> {
        let (session_id, sig) = value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }

        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(session_id.as_bytes());
        let sig_bytes = decode_hex(sig)?;
        mac.verify_slice(&sig_bytes).ok()?;
        Some(session_id.to_string())
    }

    fn mac_hex(&self, session_id: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(session_id.as_bytes());
        let bytes = mac.finalize().into_bytes();
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

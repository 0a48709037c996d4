//! Signed, self-expiring handoff token.
//!
//! Carries an invitation token from the invite-link click to sign-in
//! completion. The value encodes its own expiry and a MAC, so validity does
//! not depend on the transport honoring the cookie max-age.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct HandoffCodec {
    secret: Vec<u8>,
    ttl: Duration,
}

impl HandoffCodec {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Mint a handoff value: `b64(token).expiry_unix.b64(mac)`.
    pub fn issue(&self, token: &str, now: DateTime<Utc>) -> String {
        let expiry = (now + self.ttl).timestamp();
        let mac = self.mac_for(token, expiry);
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(token),
            expiry,
            URL_SAFE_NO_PAD.encode(mac)
        )
    }

    /// Recover the invitation token from a handoff value. Malformed, forged,
    /// or expired values all come back as `None` and are treated as an absent
    /// handoff.
    pub fn verify(&self, value: &str, now: DateTime<Utc>) -> Option<String> {
        let mut parts = value.splitn(3, '.');
        let token_b64 = parts.next()?;
        let expiry_str = parts.next()?;
        let mac_b64 = parts.next()?;

        let token = String::from_utf8(URL_SAFE_NO_PAD.decode(token_b64).ok()?).ok()?;
        let expiry: i64 = expiry_str.parse().ok()?;
        let presented = URL_SAFE_NO_PAD.decode(mac_b64).ok()?;

        let expected = self.mac_for(&token, expiry);
        if presented.ct_eq(&expected).unwrap_u8() != 1 {
            return None;
        }
        if expiry < now.timestamp() {
            return None;
        }
        Some(token)
    }

    fn mac_for(&self, token: &str, expiry: i64) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        mac.update(b".");
        mac.update(expiry.to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{ConnectorError, Result};

/// Header carrying `base64(HMAC-SHA1(raw_body, secret))`.
pub const SIGNATURE_HEADER: &str = "x-helpscout-signature";

pub const SECRET_LEN: usize = 32;
const SECRET_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// Largest multiple of the alphabet length that fits in a byte; higher bytes are resampled.
const SAMPLE_CEILING: u8 = (256 / SECRET_ALPHABET.len() * SECRET_ALPHABET.len()) as u8;

pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    BASE64.encode(hmac::sign(&key, body).as_ref())
}

/// Constant-time check of a delivery signature against the raw body bytes.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    hmac::verify(&key, body, &expected).is_ok()
}

/// 32 alphanumeric characters from the system CSPRNG.
pub fn generate_secret() -> Result<String> {
    let rng = SystemRandom::new();
    let mut secret = String::with_capacity(SECRET_LEN);
    let mut buf = [0u8; 64];

    while secret.len() < SECRET_LEN {
        rng.fill(&mut buf)
            .map_err(|_| ConnectorError::Webhook("system random source unavailable".to_string()))?;
        for byte in buf {
            if byte >= SAMPLE_CEILING {
                continue;
            }
            secret.push(char::from(SECRET_ALPHABET[usize::from(byte) % SECRET_ALPHABET.len()]));
            if secret.len() == SECRET_LEN {
                break;
            }
        }
    }

    Ok(secret)
}

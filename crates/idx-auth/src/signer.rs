//! HMAC-SHA512 request signing.
//!
//! The signature covers the exact body bytes that go on the wire. Any
//! difference in field order or encoding between what is signed and what
//! is sent makes the exchange reject the request.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// Deterministic request signer.
///
/// Never log the secret or the signatures it produces.
#[derive(Clone)]
pub struct Signer {
    secret: Zeroizing<Vec<u8>>,
}

impl Signer {
    /// Creates a signer.
    ///
    /// # Panics
    /// Panics if `secret` is empty. An empty secret is a wiring bug, not a
    /// recoverable condition.
    pub fn new(secret: &str) -> Self {
        assert!(!secret.is_empty(), "signing secret must not be empty");
        Self {
            secret: Zeroizing::new(secret.as_bytes().to_vec()),
        }
    }

    /// Signs `body` and returns the lowercase hex digest.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac =
            HmacSha512::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// One-shot form of [`Signer::sign`].
///
/// # Panics
/// Panics if `secret` is empty.
pub fn sign(secret: &str, body: &[u8]) -> String {
    Signer::new(secret).sign(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4231_case_2() {
        let signature = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            signature,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_deterministic() {
        let signer = Signer::new("secret");
        let body = b"method=getInfo&nonce=1700000000001";
        assert_eq!(signer.sign(body), signer.sign(body));
        assert_eq!(signer.sign(body), sign("secret", body));
    }

    #[test]
    fn test_one_byte_changes_signature() {
        let signer = Signer::new("secret");
        let a = signer.sign(b"method=getInfo&nonce=1700000000001");
        let b = signer.sign(b"method=getInfo&nonce=1700000000002");
        assert_ne!(a, b);
    }

    #[test]
    fn test_lowercase_hex_512_bits() {
        let signature = sign("secret", b"body");
        assert_eq!(signature.len(), 128);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    #[should_panic(expected = "signing secret must not be empty")]
    fn test_empty_secret_panics() {
        Signer::new("");
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", Signer::new("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}

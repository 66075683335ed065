//! API credential.

use std::fmt;

use zeroize::Zeroizing;

use crate::signer::Signer;

/// API key and secret for one account.
///
/// Supplied once at start-up by whatever loads configuration; never
/// persisted here. The secret is wiped from memory on drop.
#[derive(Clone)]
pub struct Credential {
    key: String,
    secret: Zeroizing<String>,
}

impl Credential {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// API key, sent in the `Key` header.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Builds a signer for this credential's secret.
    ///
    /// # Panics
    /// Panics if the secret is empty.
    pub fn signer(&self) -> Signer {
        Signer::new(&self.secret)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.key.chars().take(4).collect();
        f.debug_struct("Credential")
            .field("key", &format_args!("{visible}..."))
            .field("secret", &"<redacted>")
            .finish()
    }
}

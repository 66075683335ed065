//! Request authentication for the Indodax private API.
//!
//! - [`NonceSequencer`]: strictly increasing nonces, one sequencer per credential
//! - [`Signer`]: HMAC-SHA512 over the exact body bytes, lowercase hex
//! - [`Credential`]: API key and secret, held for the process lifetime

pub mod credential;
pub mod nonce;
pub mod signer;

pub use credential::Credential;
pub use nonce::{Clock, NonceSequencer, SystemClock};
pub use signer::{sign, Signer};

//! Request builder: validation, canonical serialization and signing.

use idx_auth::Signer;
use idx_core::{validate, Endpoint, SignedRequest, ValidatedRequest, ValidationResult};
use serde_json::{Map, Value};

/// Turns caller arguments into signed requests.
///
/// Pure apart from signing: the same inputs always give the same bytes
/// and signature.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    signer: Signer,
}

impl RequestBuilder {
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Validate `args` for `operation` and sign the result with `nonce`.
    pub fn build(
        &self,
        operation: &str,
        nonce: u64,
        args: &Map<String, Value>,
    ) -> ValidationResult<SignedRequest> {
        let request = validate(operation, args)?;
        Ok(self.sign(&request, nonce))
    }

    /// Sign an already validated request with `nonce`.
    ///
    /// Public requests carry no signature.
    pub fn sign(&self, request: &ValidatedRequest, nonce: u64) -> SignedRequest {
        let canonical = request.canonical(nonce);
        let signature = match request.operation().endpoint() {
            Endpoint::Private => self.signer.sign(canonical.body.as_bytes()),
            Endpoint::Public => String::new(),
        };
        canonical.sign_with(signature)
    }
}

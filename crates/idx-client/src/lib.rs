//! Signed dispatch for the Indodax API.
//!
//! Validates caller arguments against the operation catalog, draws a
//! nonce, signs the canonical body, sends it through a [`Transport`] and
//! normalizes the reply into a payload or a typed error.

pub mod builder;
pub mod error;
pub mod gateway;
pub mod normalizer;
pub mod result;
pub mod transport;

pub use builder::RequestBuilder;
pub use error::{ErrorKind, ExchangeError, GatewayError, GatewayResult, Rejection, TransportError};
pub use gateway::{CallOptions, Gateway, RetryPolicy};
pub use normalizer::{classify, normalize};
pub use result::CallResult;
pub use transport::{
    BoxFuture, DynTransport, HttpConfig, HttpTransport, MockTransport, RawResponse, Transport,
    TransportResult, DEFAULT_PRIVATE_URL, DEFAULT_PUBLIC_URL, DEFAULT_TIMEOUT,
};

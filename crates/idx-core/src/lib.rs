//! Core domain types for the Indodax gateway.
//!
//! This crate provides the pieces every request path shares:
//! - `Pair`, `OrderSide`: trading identifiers as the exchange spells them
//! - `Operation`, `OperationSpec`: the closed operation catalog and its schemas
//! - `ValidatedRequest`, `CanonicalRequest`: argument validation and the
//!   canonical form-encoded body that gets signed and sent

pub mod catalog;
pub mod error;
pub mod request;
pub mod types;

pub use catalog::{
    Bound, CrossRule, Endpoint, FieldKind, FieldSpec, Operation, OperationSpec, Wire, CATALOG,
};
pub use error::{ValidationError, ValidationResult};
pub use request::{validate, CanonicalRequest, ParamValue, SignedRequest, ValidatedRequest};
pub use types::{OrderSide, Pair};

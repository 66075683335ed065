//! JSON export of the operation catalog.
//!
//! Front-ends register one tool per operation from this output.

use idx_core::{Operation, CATALOG};
use serde_json::{json, Value};

use crate::error::AppResult;

/// One summary line per operation, in catalog order.
pub fn list() -> Value {
    Value::Array(
        CATALOG
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "endpoint": spec.endpoint,
                    "idempotent": spec.idempotent,
                    "description": spec.description,
                })
            })
            .collect(),
    )
}

/// Full parameter schema for one operation.
pub fn describe(name: &str) -> AppResult<Value> {
    let operation: Operation = name.parse()?;
    Ok(serde_json::to_value(operation.spec())?)
}

/// Full schemas for every operation.
pub fn describe_all() -> AppResult<Value> {
    Ok(serde_json::to_value(CATALOG.iter().collect::<Vec<_>>())?)
}

//! Request building.
//!
//! [`validate`] turns a caller's argument map into a [`ValidatedRequest`]
//! following the operation's schema. [`ValidatedRequest::canonical`] then
//! fixes a nonce and produces the exact body bytes that are both signed
//! and transmitted.
//!
//! # Validation order (first failure wins)
//!
//! 1. Unknown operation name      → `UnknownOperation`
//! 2. Missing required field      → `MissingParameter`
//! 3. Unparseable value           → `InvalidType`
//! 4. Cross-field rule violated   → `InvalidCombination`
//! 5. Value outside domain bounds → `OutOfRange`
//! 6. Argument not in the schema  → `UnknownParameter`

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{Bound, CrossRule, Endpoint, FieldKind, FieldSpec, Operation, Wire};
use crate::error::{ValidationError, ValidationResult};
use crate::types::{OrderSide, Pair};

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Pair(Pair),
    Side(OrderSide),
    Decimal(Decimal),
    Integer(i64),
    Date(NaiveDate),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Pair(p) => write!(f, "{p}"),
            Self::Side(s) => write!(f, "{s}"),
            Self::Decimal(d) => write!(f, "{}", d.normalize()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

fn number_text(field: &str, value: &Value) -> ValidationResult<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(ValidationError::invalid_type(
            field,
            format!("expected a number, got {other}"),
        )),
    }
}

fn text(field: &str, value: &Value) -> ValidationResult<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::String(_) => Err(ValidationError::invalid_type(field, "must not be empty")),
        other => Err(ValidationError::invalid_type(
            field,
            format!("expected a string, got {other}"),
        )),
    }
}

fn parse_value(spec: &FieldSpec, value: &Value) -> ValidationResult<ParamValue> {
    let field = spec.name;
    match spec.kind {
        FieldKind::Text => text(field, value).map(ParamValue::Text),
        FieldKind::Currency => {
            let code = text(field, value)?;
            if code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                Ok(ParamValue::Text(code))
            } else {
                Err(ValidationError::invalid_type(
                    field,
                    format!("expected a lowercase currency code, got {code:?}"),
                ))
            }
        }
        FieldKind::Pair => text(field, value)?
            .parse()
            .map(ParamValue::Pair)
            .map_err(|e| ValidationError::invalid_type(field, e)),
        FieldKind::Side => text(field, value)?
            .parse()
            .map(ParamValue::Side)
            .map_err(|e| ValidationError::invalid_type(field, e)),
        FieldKind::Decimal => {
            let raw = number_text(field, value)?;
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map(ParamValue::Decimal)
                .map_err(|_| {
                    ValidationError::invalid_type(field, format!("not a decimal number: {raw:?}"))
                })
        }
        FieldKind::Integer => {
            let raw = number_text(field, value)?;
            raw.parse::<i64>().map(ParamValue::Integer).map_err(|_| {
                ValidationError::invalid_type(field, format!("not an integer: {raw:?}"))
            })
        }
        FieldKind::Date => {
            let raw = text(field, value)?;
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map(ParamValue::Date)
                .map_err(|_| {
                    ValidationError::invalid_type(field, format!("expected YYYY-MM-DD, got {raw:?}"))
                })
        }
        FieldKind::Choice(options) => {
            let raw = text(field, value)?;
            if options.contains(&raw.as_str()) {
                Ok(ParamValue::Text(raw))
            } else {
                Err(ValidationError::invalid_type(
                    field,
                    format!("expected one of {options:?}, got {raw:?}"),
                ))
            }
        }
    }
}

fn check_bound(spec: &FieldSpec, value: &ParamValue) -> ValidationResult<()> {
    let field = spec.name;
    match (value, spec.bound) {
        (ParamValue::Decimal(d), Bound::Positive) if *d <= Decimal::ZERO => Err(
            ValidationError::out_of_range(field, format!("must be greater than zero, got {d}")),
        ),
        (ParamValue::Integer(n), Bound::Positive) if *n <= 0 => Err(
            ValidationError::out_of_range(field, format!("must be greater than zero, got {n}")),
        ),
        (ParamValue::Integer(n), Bound::Between { min, max })
            if *n < 0 || (*n as u64) < min || (*n as u64) > max =>
        {
            Err(ValidationError::out_of_range(
                field,
                format!("must be between {min} and {max}, got {n}"),
            ))
        }
        (ParamValue::Integer(n), Bound::Any) if *n < 0 => Err(ValidationError::out_of_range(
            field,
            format!("must not be negative, got {n}"),
        )),
        _ => Ok(()),
    }
}

/// Arguments that passed validation, in catalog order.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    operation: Operation,
    values: Vec<(&'static FieldSpec, ParamValue)>,
}

impl ValidatedRequest {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Parsed value of a field, by caller-facing name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, v)| v)
    }

    fn pair(&self) -> Option<&Pair> {
        match self.get("pair") {
            Some(ParamValue::Pair(pair)) => Some(pair),
            _ => None,
        }
    }

    /// Operation fields as `(wire name, value)` pairs, excluding path fields.
    pub fn wire_fields(&self) -> Vec<(String, String)> {
        let pair = self.pair();
        self.values
            .iter()
            .filter_map(|(spec, value)| {
                let name = match spec.wire {
                    Wire::Same => spec.name.to_string(),
                    Wire::Named(name) => name.to_string(),
                    Wire::QuoteCurrency => pair?.quote().to_string(),
                    Wire::BaseCurrency => pair?.base().to_string(),
                    Wire::Path => return None,
                };
                Some((name, value.to_string()))
            })
            .collect()
    }

    /// Public API path (`ticker/btcidr`); `None` for private operations.
    pub fn public_path(&self) -> Option<String> {
        let spec = self.operation.spec();
        if spec.endpoint != Endpoint::Public {
            return None;
        }
        let mut path = spec.wire_method.to_string();
        for (field, value) in &self.values {
            if field.wire == Wire::Path {
                if let ParamValue::Pair(pair) = value {
                    path.push('/');
                    path.push_str(&pair.path_id());
                }
            }
        }
        Some(path)
    }

    /// Fixes the nonce and serializes the canonical body.
    ///
    /// Private bodies are form-encoded `method`, `nonce`, then operation
    /// fields in catalog order. Public requests carry no body.
    pub fn canonical(&self, nonce: u64) -> CanonicalRequest {
        let spec = self.operation.spec();
        let (params, body) = match spec.endpoint {
            Endpoint::Private => {
                let mut params = Vec::with_capacity(self.values.len() + 2);
                params.push(("method".to_string(), spec.wire_method.to_string()));
                params.push(("nonce".to_string(), nonce.to_string()));
                params.extend(self.wire_fields());
                let body = encode_form(&params);
                (params, body)
            }
            Endpoint::Public => (self.wire_fields(), String::new()),
        };
        CanonicalRequest {
            operation: self.operation,
            nonce,
            params,
            body,
            path: self.public_path(),
        }
    }
}

/// Form-encodes `k=v` pairs joined by `&`, preserving order.
pub fn encode_form(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Validates `args` against the schema of the operation called `name`.
///
/// `null` arguments are treated as absent.
pub fn validate(name: &str, args: &Map<String, Value>) -> ValidationResult<ValidatedRequest> {
    let operation: Operation = name.parse()?;
    let spec = operation.spec();

    let present = |field: &FieldSpec| args.get(field.name).filter(|v| !v.is_null());

    if let Some(missing) = spec.required.iter().find(|f| present(*f).is_none()) {
        return Err(ValidationError::MissingParameter(missing.name.to_string()));
    }

    let mut values = Vec::new();
    for field in spec.required.iter().chain(spec.optional) {
        if let Some(raw) = present(field) {
            values.push((field, parse_value(field, raw)?));
        }
    }

    let request = ValidatedRequest { operation, values };
    for rule in spec.rules {
        check_rule(*rule, &request)?;
    }

    for (field, value) in &request.values {
        check_bound(field, value)?;
    }

    if let Some(unknown) = args.keys().find(|k| spec.field(k).is_none()) {
        return Err(ValidationError::UnknownParameter {
            operation: spec.name.to_string(),
            field: unknown.clone(),
        });
    }

    let mut request = request;
    for field in spec.optional {
        if let Some(default) = field.default {
            if request.get(field.name).is_none() {
                let value = parse_value(field, &Value::String(default.to_string()))?;
                request.values.push((field, value));
            }
        }
    }
    request
        .values
        .sort_by_key(|(field, _)| field_position(operation, field.name));

    Ok(request)
}

fn field_position(operation: Operation, name: &str) -> usize {
    let spec = operation.spec();
    spec.required
        .iter()
        .chain(spec.optional)
        .position(|f| f.name == name)
        .unwrap_or(usize::MAX)
}

fn check_rule(rule: CrossRule, request: &ValidatedRequest) -> ValidationResult<()> {
    match rule {
        CrossRule::TradeAmount => {
            let notional = request.get("notional").is_some();
            let amount = request.get("amount").is_some();
            let side = match request.get("side") {
                Some(ParamValue::Side(side)) => *side,
                _ => return Ok(()),
            };
            match (side, notional, amount) {
                (_, true, true) => Err(ValidationError::InvalidCombination(
                    "specify exactly one of notional or amount, not both".into(),
                )),
                (_, false, false) => Err(ValidationError::InvalidCombination(
                    "specify exactly one of notional or amount".into(),
                )),
                (OrderSide::Buy, false, true) => Err(ValidationError::InvalidCombination(
                    "buy orders are sized by quote-currency notional, not amount".into(),
                )),
                (OrderSide::Sell, true, false) => Err(ValidationError::InvalidCombination(
                    "sell orders are sized by base-currency amount, not notional".into(),
                )),
                _ => Ok(()),
            }
        }
        CrossRule::DateOrder { start, end } => match (request.get(start), request.get(end)) {
            (Some(ParamValue::Date(s)), Some(ParamValue::Date(e))) if s > e => {
                Err(ValidationError::InvalidCombination(format!(
                    "{start} ({s}) is after {end} ({e})"
                )))
            }
            _ => Ok(()),
        },
    }
}

/// A request with its nonce fixed and body serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub operation: Operation,
    pub nonce: u64,
    /// Body parameters in transmission order.
    pub params: Vec<(String, String)>,
    /// Exact bytes that are signed and sent. Empty for public requests.
    pub body: String,
    /// Public API path, `None` for private requests.
    pub path: Option<String>,
}

impl CanonicalRequest {
    pub fn sign_with(self, signature: String) -> SignedRequest {
        SignedRequest {
            request: self,
            signature,
        }
    }
}

/// A canonical request plus its signature. Used for exactly one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub request: CanonicalRequest,
    /// Lowercase hex HMAC-SHA512 of `request.body`; empty for public requests.
    pub signature: String,
}

impl SignedRequest {
    pub fn operation(&self) -> Operation {
        self.request.operation
    }

    pub fn nonce(&self) -> u64 {
        self.request.nonce
    }

    pub fn body(&self) -> &str {
        &self.request.body
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.request.params
    }
}

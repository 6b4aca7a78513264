use std::fmt;

use serde_json::Value;

use remcalc_protocol::{ArithArgs, CalcRequest, Operation};

/// Correlation id used when a failing request carries no usable `id`.
pub const UNKNOWN_ID: &str = "unknown";

/// Classified validation failure, reported verbatim in the response's
/// `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateError {
    /// Unparseable payload or schema violation.
    Format,
    /// Well-formed request naming an operation the service does not have.
    UnknownOperation,
}

impl ValidateError {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidateError::Format => "format error",
            ValidateError::UnknownOperation => "operation not found",
        }
    }
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses raw message bytes and accepts only a JSON object with string
/// `id`, string `operation` naming a supported operation, and object
/// `args` holding numeric `op1` and `op2`. Anything that passes comes out
/// as the shared `CalcRequest` wire type.
///
/// Pure: the same input always yields the same classification.
pub fn validate_request(raw: &[u8]) -> Result<CalcRequest, ValidateError> {
    let data: Value = serde_json::from_slice(raw).map_err(|_| ValidateError::Format)?;
    let obj = data.as_object().ok_or(ValidateError::Format)?;

    if !obj.contains_key("id") || !obj.contains_key("operation") || !obj.contains_key("args") {
        return Err(ValidateError::Format);
    }

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ValidateError::Format)?;

    let op_name = obj
        .get("operation")
        .and_then(Value::as_str)
        .ok_or(ValidateError::Format)?;
    let operation = Operation::parse(op_name).ok_or(ValidateError::UnknownOperation)?;

    let args = obj
        .get("args")
        .and_then(Value::as_object)
        .ok_or(ValidateError::Format)?;
    let op1 = number_field(args.get("op1"))?;
    let op2 = number_field(args.get("op2"))?;

    Ok(CalcRequest {
        id: id.to_owned(),
        operation,
        args: ArithArgs { op1, op2 },
    })
}

fn number_field(value: Option<&Value>) -> Result<f64, ValidateError> {
    match value {
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidateError::Format),
        _ => Err(ValidateError::Format),
    }
}

/// Best-effort `id` extraction for error responses: the string `id` of a
/// parseable JSON object, otherwise the literal `"unknown"`.
pub fn extract_id(raw: &[u8]) -> String {
    let data: Option<Value> = serde_json::from_slice(raw).ok();
    data.as_ref()
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| UNKNOWN_ID.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_request() {
        let raw = br#"{"id":"r1","operation":"sum","args":{"op1":2,"op2":3.5}}"#;
        let req = validate_request(raw).unwrap();
        assert_eq!("r1", req.id);
        assert_eq!(Operation::Sum, req.operation);
        assert_eq!(2.0, req.args.op1);
        assert_eq!(3.5, req.args.op2);
    }

    #[test]
    fn producer_side_requests_validate_cleanly() {
        // Publishers build requests from the same shared wire type the
        // validator produces, so a serialized CalcRequest must always pass.
        let req = CalcRequest {
            id: "r7".to_owned(),
            operation: Operation::Div,
            args: ArithArgs { op1: 9.0, op2: 3.0 },
        };
        let raw = serde_json::to_vec(&req).unwrap();
        assert_eq!(Ok(req), validate_request(&raw));
    }

    #[test]
    fn rejects_non_json() {
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(b"this is not json")
        );
    }

    #[test]
    fn rejects_non_object_root() {
        assert_eq!(Err(ValidateError::Format), validate_request(b"[1,2,3]"));
        assert_eq!(Err(ValidateError::Format), validate_request(b"42"));
    }

    #[test]
    fn rejects_missing_keys() {
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":"sum"}"#)
        );
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"operation":"sum","args":{"op1":1,"op2":2}}"#)
        );
    }

    #[test]
    fn rejects_wrong_types() {
        // id must be a string
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":7,"operation":"sum","args":{"op1":1,"op2":2}}"#)
        );
        // operation must be a string
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":3,"args":{"op1":1,"op2":2}}"#)
        );
        // args must be an object
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":"sum","args":[1,2]}"#)
        );
        // operands must be numbers
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":"sum","args":{"op1":"1","op2":2}}"#)
        );
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":"sum","args":{"op1":true,"op2":2}}"#)
        );
    }

    #[test]
    fn unsupported_operation_is_classified_separately() {
        assert_eq!(
            Err(ValidateError::UnknownOperation),
            validate_request(br#"{"id":"r1","operation":"pow","args":{"op1":1,"op2":2}}"#)
        );
        // A missing args key outranks the bad operation name.
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(br#"{"id":"r1","operation":"pow"}"#)
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let raw = br#"{"id":"r1","operation":"pow","args":{"op1":1,"op2":2}}"#;
        assert_eq!(validate_request(raw), validate_request(raw));
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(b"not json at all")
        );
        assert_eq!(
            Err(ValidateError::Format),
            validate_request(b"not json at all")
        );
    }

    #[test]
    fn id_extraction_is_best_effort() {
        assert_eq!("r9", extract_id(br#"{"id":"r9","operation":42}"#));
        assert_eq!(UNKNOWN_ID, extract_id(br#"{"operation":"sum"}"#));
        assert_eq!(UNKNOWN_ID, extract_id(br#"{"id":42}"#));
        assert_eq!(UNKNOWN_ID, extract_id(b"not json"));
    }
}

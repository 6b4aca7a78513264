use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use remcalc_derive::WireParam;

use crate::call::WireParam;
use crate::error::{Error, ErrorKind, Result};
use crate::message::SerializeType;

/// Service path the arithmetic handlers are registered under.
pub const SERVICE_PATH: &str = "Arith";

/// Default TCP endpoint of the calculator service.
pub const DEFAULT_CALCULATOR_ADDR: &str = "127.0.0.1:10000";

/// The four operations the calculator supports. The string forms are the
/// `operation` values accepted on the request topic.
#[derive(
    Debug, Default, Display, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    #[strum(serialize = "sum")]
    Sum,
    #[strum(serialize = "sub")]
    Sub,
    #[strum(serialize = "mult")]
    Mult,
    #[strum(serialize = "div")]
    Div,
}

impl Operation {
    /// RPC method name for this operation.
    pub fn method(self) -> &'static str {
        match self {
            Operation::Sum => "Sum",
            Operation::Sub => "Sub",
            Operation::Mult => "Mult",
            Operation::Div => "Div",
        }
    }

    pub fn parse(name: &str) -> Option<Operation> {
        Operation::from_str(name).ok()
    }
}

/// Operand pair for every arithmetic call.
#[derive(WireParam, Default, Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithArgs {
    pub op1: f64,
    pub op2: f64,
}

#[derive(WireParam, Default, Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithReply {
    pub result: f64,
}

/// An inbound queue request, as published on the request topic.
#[derive(WireParam, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRequest {
    pub id: String,
    pub operation: Operation,
    pub args: ArithArgs,
}

/// An outbound queue response. Exactly one of `result` / `error` is set,
/// and the unset field is omitted from the serialized JSON.
#[derive(WireParam, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResponse {
    pub id: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalcResponse {
    pub fn ok(id: String, result: f64) -> CalcResponse {
        CalcResponse {
            id,
            status: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn fail<T: ToString>(id: String, error: T) -> CalcResponse {
        CalcResponse {
            id,
            status: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names() {
        assert_eq!(Some(Operation::Sum), Operation::parse("sum"));
        assert_eq!(Some(Operation::Div), Operation::parse("div"));
        assert_eq!(None, Operation::parse("pow"));
        assert_eq!(None, Operation::parse("SUM"));
        assert_eq!("mult", Operation::Mult.to_string());
        assert_eq!("Mult", Operation::Mult.method());
    }

    #[test]
    fn args_round_trip_json() {
        let args = ArithArgs { op1: 2.0, op2: 3.0 };
        let data = args.into_bytes(SerializeType::JSON).unwrap();
        let mut parsed = ArithArgs::default();
        parsed.from_slice(SerializeType::JSON, &data).unwrap();
        assert_eq!(args, parsed);
    }

    #[test]
    fn args_round_trip_msgpack() {
        let args = ArithArgs { op1: 4.0, op2: 5.0 };
        let data = args.into_bytes(SerializeType::MsgPack).unwrap();
        let mut parsed = ArithArgs::default();
        parsed.from_slice(SerializeType::MsgPack, &data).unwrap();
        assert_eq!(args, parsed);
    }

    #[test]
    fn response_json_omits_unset_fields() {
        let ok = CalcResponse::ok("req-1".to_owned(), 5.0);
        let text = serde_json::to_string(&ok).unwrap();
        assert_eq!(r#"{"id":"req-1","status":true,"result":5.0}"#, text);

        let fail = CalcResponse::fail("req-2".to_owned(), "format error");
        let text = serde_json::to_string(&fail).unwrap();
        assert_eq!(
            r#"{"id":"req-2","status":false,"error":"format error"}"#,
            text
        );
    }

    #[test]
    fn serialize_none_is_rejected() {
        let args = ArithArgs::default();
        let err = args.into_bytes(SerializeType::SerializeNone).unwrap_err();
        assert_eq!(ErrorKind::Serialization, err.kind());
    }
}

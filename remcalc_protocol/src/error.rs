use std::fmt;
use std::io;

/// Classification for failures crossing crate and wire boundaries.
///
/// `DivisionByZero` and `MethodNotFound` have wire-level error codes so a
/// client can tell them apart from generic service failures without parsing
/// the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Protocol,
    Serialization,
    Network,
    MethodNotFound,
    DivisionByZero,
    Service,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new<T: ToString>(kind: ErrorKind, message: T) -> Self {
        Error {
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    // Only the message: this text is forwarded verbatim into response
    // payloads.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(ErrorKind::Io, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Serialization, err)
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Error::new(ErrorKind::Serialization, err)
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Error::new(ErrorKind::Serialization, err)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error {
            kind: ErrorKind::Service,
            message,
        }
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::from(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_message_only() {
        let err = Error::new(ErrorKind::DivisionByZero, "division by zero");
        assert_eq!("division by zero", err.to_string());
        assert_eq!(ErrorKind::DivisionByZero, err.kind());
    }
}

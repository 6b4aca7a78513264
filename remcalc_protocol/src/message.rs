use enum_primitive_derive::Primitive;
use num_traits::{FromPrimitive, ToPrimitive};
use strum_macros::{Display, EnumIter, EnumString};

use byteorder::{BigEndian, ByteOrder};
use bytes::BytesMut;
use std::io::Read;

use crate::error::{Error, ErrorKind, Result};

const MAGIC_NUMBER: u8 = 0x0C;

pub const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Display, PartialEq, EnumIter, EnumString, Primitive)]
pub enum MessageType {
    Request = 0,
    Response = 1,
}

#[derive(Debug, Clone, Copy, Display, PartialEq, EnumIter, EnumString, Primitive)]
pub enum MessageStatusType {
    Normal = 0,
    Error = 1,
}

#[derive(Debug, Clone, Copy, Display, PartialEq, EnumIter, EnumString, Primitive)]
pub enum SerializeType {
    SerializeNone = 0,
    JSON = 1,
    MsgPack = 2,
}

/// Wire code carried alongside an error-status response so callers can
/// classify the failure without parsing the error text.
#[derive(Debug, Clone, Copy, Display, PartialEq, EnumIter, EnumString, Primitive)]
pub enum ErrorCode {
    NoError = 0,
    Service = 1,
    DivisionByZero = 2,
    MethodNotFound = 3,
}

impl ErrorCode {
    pub fn from_kind(kind: ErrorKind) -> ErrorCode {
        match kind {
            ErrorKind::DivisionByZero => ErrorCode::DivisionByZero,
            ErrorKind::MethodNotFound => ErrorCode::MethodNotFound,
            _ => ErrorCode::Service,
        }
    }

    pub fn to_kind(self) -> ErrorKind {
        match self {
            ErrorCode::DivisionByZero => ErrorKind::DivisionByZero,
            ErrorCode::MethodNotFound => ErrorKind::MethodNotFound,
            _ => ErrorKind::Service,
        }
    }
}

/// A common frame for requests and responses.
///
/// Layout: a 12-byte header (magic, version, type/status flags, serialize
/// type and error code nibbles, big-endian sequence number), then a
/// `u32` body length followed by four length-prefixed sections: service
/// path, service method, error text, payload.
#[derive(Debug)]
pub struct Message {
    header: [u8; HEADER_LEN],
    pub service_path: String,
    pub service_method: String,
    pub error: String,
    pub payload: BytesMut,
}

impl Default for Message {
    fn default() -> Self {
        let mut header = [0u8; HEADER_LEN];
        header[0] = MAGIC_NUMBER;
        Message {
            header,
            service_path: String::new(),
            service_method: String::new(),
            error: String::new(),
            payload: BytesMut::new(),
        }
    }
}

impl Message {
    /// Creates a new `Message` with a valid magic byte and zeroed fields.
    pub fn new() -> Message {
        Default::default()
    }

    pub fn check_magic_number(&self) -> bool {
        self.header[0] == MAGIC_NUMBER
    }

    pub fn get_version(&self) -> u8 {
        self.header[1]
    }
    pub fn set_version(&mut self, v: u8) {
        self.header[1] = v;
    }

    pub fn get_message_type(&self) -> Option<MessageType> {
        MessageType::from_u8((self.header[2] & 0x80) >> 7)
    }
    pub fn set_message_type(&mut self, mt: MessageType) {
        self.header[2] = (self.header[2] & !0x80) | (mt.to_u8().unwrap() << 7);
    }

    pub fn get_message_status_type(&self) -> Option<MessageStatusType> {
        MessageStatusType::from_u8(self.header[2] & 0x03)
    }
    pub fn set_message_status_type(&mut self, mst: MessageStatusType) {
        self.header[2] = (self.header[2] & !0x03) | (mst.to_u8().unwrap() & 0x03);
    }

    pub fn get_serialize_type(&self) -> Option<SerializeType> {
        SerializeType::from_u8((self.header[3] & 0xF0) >> 4)
    }
    pub fn set_serialize_type(&mut self, st: SerializeType) {
        self.header[3] = (self.header[3] & !0xF0) | (st.to_u8().unwrap() << 4);
    }

    pub fn get_error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u8(self.header[3] & 0x0F)
    }
    pub fn set_error_code(&mut self, code: ErrorCode) {
        self.header[3] = (self.header[3] & !0x0F) | (code.to_u8().unwrap() & 0x0F);
    }

    pub fn get_seq(&self) -> u64 {
        BigEndian::read_u64(&self.header[4..])
    }
    pub fn set_seq(&mut self, seq: u64) {
        BigEndian::write_u64(&mut self.header[4..], seq);
    }

    /// Serializes the whole frame into a buffer ready for the wire.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = 4 + self.service_path.len()
            + 4 + self.service_method.len()
            + 4 + self.error.len()
            + 4 + self.payload.len();

        let mut data = Vec::with_capacity(HEADER_LEN + 4 + body_len);
        data.extend_from_slice(&self.header);

        let mut len_buf = [0u8; 4];
        BigEndian::write_u32(&mut len_buf, body_len as u32);
        data.extend_from_slice(&len_buf);

        for section in [
            self.service_path.as_bytes(),
            self.service_method.as_bytes(),
            self.error.as_bytes(),
            &self.payload[..],
        ] {
            BigEndian::write_u32(&mut len_buf, section.len() as u32);
            data.extend_from_slice(&len_buf);
            data.extend_from_slice(section);
        }
        data
    }

    /// Reads one complete frame from `r`, replacing this message's fields.
    pub fn decode<R: Read>(&mut self, r: &mut R) -> Result<()> {
        r.read_exact(&mut self.header)?;
        if !self.check_magic_number() {
            return Err(Error::new(ErrorKind::Protocol, "bad magic number"));
        }

        let mut len_buf = [0u8; 4];
        r.read_exact(&mut len_buf)?;
        let body_len = BigEndian::read_u32(&len_buf) as usize;
        let mut buf = vec![0u8; body_len];
        r.read_exact(&mut buf)?;

        let mut start = 0;
        self.service_path = read_section(&buf, &mut start)?;
        self.service_method = read_section(&buf, &mut start)?;
        self.error = read_section(&buf, &mut start)?;

        let payload = read_section_bytes(&buf, &mut start)?;
        let mut payload_bytes = BytesMut::with_capacity(payload.len());
        payload_bytes.extend_from_slice(payload);
        self.payload = payload_bytes;

        Ok(())
    }
}

fn read_section_bytes<'a>(buf: &'a [u8], start: &mut usize) -> Result<&'a [u8]> {
    if *start + 4 > buf.len() {
        return Err(Error::new(ErrorKind::Protocol, "truncated frame"));
    }
    let len = BigEndian::read_u32(&buf[*start..*start + 4]) as usize;
    *start += 4;
    if *start + len > buf.len() {
        return Err(Error::new(ErrorKind::Protocol, "truncated frame"));
    }
    let section = &buf[*start..*start + len];
    *start += len;
    Ok(section)
}

fn read_section(buf: &[u8], start: &mut usize) -> Result<String> {
    let bytes = read_section_bytes(buf, start)?;
    let s = std::str::from_utf8(bytes)
        .map_err(|err| Error::new(ErrorKind::Protocol, err))?;
    Ok(s.to_owned())
}

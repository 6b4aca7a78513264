use std::fmt::Debug;

use bytes::BytesMut;

use crate::error::Result;
use crate::message::SerializeType;

/// The serialization seam for anything carried in a frame payload.
///
/// Implemented for model types via `#[derive(WireParam)]` from
/// `remcalc_derive`, which supports JSON and MessagePack bodies.
pub trait WireParam: Debug {
    fn into_bytes(&self, st: SerializeType) -> Result<Vec<u8>>;
    fn from_slice(&mut self, st: SerializeType, data: &[u8]) -> Result<()>;
}

/// Raw passthrough, useful when a payload should not be interpreted.
impl WireParam for BytesMut {
    fn into_bytes(&self, _: SerializeType) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
    fn from_slice(&mut self, _: SerializeType, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }
}

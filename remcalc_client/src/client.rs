use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;

use remcalc_protocol::*;

/// Connection options. Zero timeouts mean no timeout, matching the
/// blocking behaviour of the std socket API.
#[derive(Debug, Copy, Clone)]
pub struct Opt {
    pub serialize_type: SerializeType,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub nodelay: Option<bool>,
}

impl Default for Opt {
    fn default() -> Self {
        Opt {
            serialize_type: SerializeType::JSON,
            connect_timeout: Duration::default(),
            read_timeout: Duration::default(),
            write_timeout: Duration::default(),
            nodelay: None,
        }
    }
}

/// A blocking client holding one connection to the calculator service.
/// Calls are strictly sequential: each request is written and its response
/// read before the next call starts.
#[derive(Debug)]
pub struct Client {
    pub opt: Opt,
    addr: String,
    stream: Option<TcpStream>,
    seq: AtomicU64,
}

impl Client {
    pub fn new(addr: &str) -> Client {
        Client {
            opt: Default::default(),
            addr: String::from(addr),
            stream: None,
            seq: AtomicU64::new(0),
        }
    }

    /// Establishes the connection. Must be called before `call`.
    pub fn start(&mut self) -> Result<()> {
        let stream = if self.opt.connect_timeout.as_millis() == 0 {
            TcpStream::connect(self.addr.as_str())?
        } else {
            let socket_addr: SocketAddr = self
                .addr
                .parse()
                .map_err(|err| Error::new(ErrorKind::Network, err))?;
            TcpStream::connect_timeout(&socket_addr, self.opt.connect_timeout)?
        };

        if self.opt.read_timeout.as_millis() > 0 {
            stream.set_read_timeout(Some(self.opt.read_timeout))?;
        }
        if self.opt.write_timeout.as_millis() > 0 {
            stream.set_write_timeout(Some(self.opt.write_timeout))?;
        }
        if let Some(nodelay) = self.opt.nodelay {
            stream.set_nodelay(nodelay)?;
        }

        debug!("connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    /// Performs one synchronous call: encode, write, read one response
    /// frame, match the sequence number, decode the reply.
    pub fn call<T>(
        &mut self,
        service_path: &str,
        service_method: &str,
        args: &dyn WireParam,
    ) -> Result<T>
    where
        T: WireParam + Default,
    {
        let st = self.opt.serialize_type;
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);

        let mut req = Message::new();
        req.set_version(0);
        req.set_message_type(MessageType::Request);
        req.set_message_status_type(MessageStatusType::Normal);
        req.set_serialize_type(st);
        req.set_seq(seq);
        req.service_path = service_path.to_owned();
        req.service_method = service_method.to_owned();
        req.payload.extend_from_slice(&args.into_bytes(st)?);

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::Network, "client not connected"))?;

        stream.write_all(&req.encode())?;
        stream.flush()?;

        let mut resp = Message::new();
        resp.decode(stream)?;

        if resp.get_seq() != seq {
            return Err(Error::new(
                ErrorKind::Protocol,
                format!("sequence mismatch: sent {}, got {}", seq, resp.get_seq()),
            ));
        }

        if let Some(MessageStatusType::Error) = resp.get_message_status_type() {
            let kind = resp
                .get_error_code()
                .map(ErrorCode::to_kind)
                .unwrap_or(ErrorKind::Service);
            return Err(Error::new(kind, resp.error));
        }

        let mut reply: T = Default::default();
        reply.from_slice(st, &resp.payload)?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_before_start_is_an_error() {
        let mut client = Client::new("127.0.0.1:10000");
        let err = client
            .call::<ArithReply>(SERVICE_PATH, "Sum", &ArithArgs::default())
            .unwrap_err();
        assert_eq!(ErrorKind::Network, err.kind());
    }
}

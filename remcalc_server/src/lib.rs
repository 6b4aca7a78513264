use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, RwLock};
use std::thread;

use log::{debug, info, warn};

use remcalc_protocol::*;

mod arith;
pub use arith::{register_arith, Arith};

/// A registered handler: raw payload in, raw payload out, serialized per
/// the frame's serialize type.
pub type ServiceFn = fn(&[u8], SerializeType) -> Result<Vec<u8>>;

type ServiceMap = Arc<RwLock<HashMap<String, ServiceFn>>>;

/// A blocking RPC server dispatching framed requests to registered
/// handlers, one thread per accepted connection.
pub struct Server {
    pub addr: String,
    services: ServiceMap,
}

impl Server {
    pub fn new(addr: String) -> Self {
        Server {
            addr,
            services: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_fn(&mut self, service_path: &str, service_method: &str, f: ServiceFn) {
        let key = format!("{}.{}", service_path, service_method);
        self.services.write().unwrap().insert(key, f);
    }

    pub fn get_fn(&self, service_path: &str, service_method: &str) -> Option<ServiceFn> {
        let key = format!("{}.{}", service_path, service_method);
        self.services.read().unwrap().get(&key).copied()
    }

    /// Binds the listener and serves until the process is terminated.
    pub fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr.as_str())?;
        info!("listening on {}", self.addr);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let services = self.services.clone();
                    thread::spawn(move || Self::process(services, stream));
                }
                Err(err) => {
                    warn!("failed to accept connection: {}", err);
                }
            }
        }

        Ok(())
    }

    fn process(services: ServiceMap, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| String::from("<unknown>"));
        debug!("connection from {}", peer);

        let read_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(err) => {
                warn!("failed to clone stream for {}: {}", peer, err);
                return;
            }
        };
        let mut reader = BufReader::new(read_stream);
        let mut writer = BufWriter::new(stream);

        loop {
            let mut req = Message::new();
            if let Err(err) = req.decode(&mut reader) {
                debug!("connection {} closed: {}", peer, err);
                return;
            }

            let resp = Self::dispatch(&services, &req);
            if let Err(err) = writer
                .write_all(&resp.encode())
                .and_then(|()| writer.flush())
            {
                warn!("failed to write response to {}: {}", peer, err);
                return;
            }
        }
    }

    fn dispatch(services: &ServiceMap, req: &Message) -> Message {
        let mut resp = Message::new();
        resp.set_message_type(MessageType::Response);
        resp.set_seq(req.get_seq());
        resp.service_path = req.service_path.clone();
        resp.service_method = req.service_method.clone();

        let st = match req.get_serialize_type() {
            Some(st) => st,
            None => {
                return fail_message(resp, ErrorCode::Service, "unknown serialize type");
            }
        };
        resp.set_serialize_type(st);

        let key = format!("{}.{}", req.service_path, req.service_method);
        let f = services.read().unwrap().get(&key).copied();
        match f {
            None => {
                debug!("no handler for {}", key);
                fail_message(
                    resp,
                    ErrorCode::MethodNotFound,
                    &format!("method not found: {}", key),
                )
            }
            Some(f) => match f(&req.payload, st) {
                Ok(payload) => {
                    resp.set_message_status_type(MessageStatusType::Normal);
                    resp.payload.extend_from_slice(&payload);
                    resp
                }
                Err(err) => {
                    debug!("handler {} failed: {}", key, err);
                    let code = ErrorCode::from_kind(err.kind());
                    fail_message(resp, code, &err.to_string())
                }
            },
        }
    }
}

fn fail_message(mut resp: Message, code: ErrorCode, error: &str) -> Message {
    resp.set_message_status_type(MessageStatusType::Error);
    resp.set_error_code(code);
    resp.error = error.to_owned();
    resp
}

/// Wraps a typed `fn(Args) -> Result<Reply>` into a `ServiceFn` and
/// registers it under the given path and method.
#[macro_export]
macro_rules! register_func {
    ($server:expr, $path:expr, $method:expr, $handler:expr, $args_ty:ty, $reply_ty:ty) => {{
        let f: $crate::ServiceFn = |raw, st| {
            let mut args: $args_ty = Default::default();
            remcalc_protocol::WireParam::from_slice(&mut args, st, raw)?;
            let reply: $reply_ty = $handler(args)?;
            remcalc_protocol::WireParam::into_bytes(&reply, st)
        };
        $server.register_fn($path, $method, f);
    }};
}

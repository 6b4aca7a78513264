use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, info, warn};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};

use remcalc_protocol::{CalcResponse, Calculator, Error, ErrorKind, Operation, Result};

use crate::config::Config;
use crate::validate::{self, validate_request};

/// Bounded wait for one poll of the inbound topic.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Builds the single response for one inbound payload: validate, dispatch
/// to the calculator, classify failures. All queue I/O stays in the worker
/// loop, so this is a pure function of the payload and the calculator.
pub fn process_message(raw: &[u8], calc: &mut dyn Calculator) -> CalcResponse {
    let req = match validate_request(raw) {
        Ok(req) => req,
        Err(err) => {
            debug!("rejected request: {}", err);
            return CalcResponse::fail(validate::extract_id(raw), err);
        }
    };

    let (op1, op2) = (req.args.op1, req.args.op2);
    let result = match req.operation {
        Operation::Sum => calc.sum(op1, op2),
        Operation::Sub => calc.sub(op1, op2),
        Operation::Mult => calc.mult(op1, op2),
        Operation::Div => calc.div(op1, op2),
    };

    match result {
        Ok(value) => CalcResponse::ok(req.id, value),
        Err(err) if err.kind() == ErrorKind::DivisionByZero => {
            CalcResponse::fail(req.id, "division by zero")
        }
        Err(err) => CalcResponse::fail(req.id, err),
    }
}

/// True for events that start a fresh broker session, after which the
/// request-topic subscription must be issued again.
fn session_established(event: &Event) -> bool {
    matches!(event, Event::Incoming(Packet::ConnAck(_)))
}

/// The bridge worker: one in-flight message at a time, one response per
/// request, strictly sequential.
pub struct Bridge<C: Calculator> {
    cfg: Config,
    calc: C,
    client: Client,
    connection: Connection,
}

impl<C: Calculator> Bridge<C> {
    /// Connects to the broker and subscribes to the request topic. The
    /// calculator connection is the caller's concern; its failure is fatal
    /// before a `Bridge` ever exists.
    pub fn new(cfg: Config, calc: C) -> Result<Bridge<C>> {
        let mut options = MqttOptions::new(
            cfg.client_id.clone(),
            cfg.broker_host.clone(),
            cfg.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(5));

        let (client, connection) = Client::new(options, 10);
        let bridge = Bridge {
            cfg,
            calc,
            client,
            connection,
        };
        bridge.subscribe()?;
        Ok(bridge)
    }

    /// (Re)issues the request-topic subscription. The session is clean, so
    /// the broker forgets it on every reconnect and it must be renewed
    /// whenever a CONNACK arrives.
    fn subscribe(&self) -> Result<()> {
        self.client
            .subscribe(self.cfg.request_topic.as_str(), QoS::AtLeastOnce)
            .map_err(|err| Error::new(ErrorKind::Network, err))
    }

    /// Polls the request topic until the shutdown flag is set. Broker-level
    /// errors are logged and looped past; only losing the event loop itself
    /// ends the run with an error.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        info!(
            "bridge started, consuming {} and producing {}",
            self.cfg.request_topic, self.cfg.response_topic
        );

        while !shutdown.load(Ordering::Relaxed) {
            match self.connection.recv_timeout(POLL_INTERVAL) {
                // Idle poll, check the shutdown flag again.
                Err(_) => continue,
                Ok(Err(err)) => {
                    error!("broker error: {}", err);
                    // The event loop reconnects on the next poll.
                    continue;
                }
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    let response = process_message(&publish.payload, &mut self.calc);
                    self.publish_response(&response);
                }
                Ok(Ok(event)) => {
                    if session_established(&event) {
                        debug!("broker session established, renewing subscription");
                        if let Err(err) = self.subscribe() {
                            error!("failed to renew subscription: {}", err);
                        }
                    } else {
                        debug!("broker event: {:?}", event);
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn publish_response(&mut self, response: &CalcResponse) {
        let payload = match serde_json::to_vec(response) {
            Ok(payload) => payload,
            Err(err) => {
                error!("failed to serialize response for {}: {}", response.id, err);
                return;
            }
        };
        if let Err(err) = self.client.publish(
            self.cfg.response_topic.as_str(),
            QoS::AtLeastOnce,
            false,
            payload,
        ) {
            error!("failed to publish response for {}: {}", response.id, err);
        }
    }

    /// Graceful teardown: disconnect, then drain the event loop so queued
    /// publishes reach the broker before the connection drops.
    fn shutdown(&mut self) {
        info!("bridge shutting down");
        if let Err(err) = self.client.disconnect() {
            warn!("failed to disconnect from broker: {}", err);
            return;
        }
        while let Ok(Ok(event)) = self.connection.recv_timeout(POLL_INTERVAL) {
            debug!("drained event: {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcalc_server::Arith;

    #[test]
    fn valid_request_gets_one_correlated_response() {
        let raw = br#"{"id":"r1","operation":"sum","args":{"op1":2,"op2":3}}"#;
        let resp = process_message(raw, &mut Arith);
        assert_eq!(CalcResponse::ok("r1".to_owned(), 5.0), resp);
    }

    #[test]
    fn all_four_operations_compute() {
        let cases: [(&[u8], f64); 4] = [
            (br#"{"id":"a","operation":"sum","args":{"op1":2,"op2":3}}"#, 5.0),
            (br#"{"id":"b","operation":"sub","args":{"op1":5,"op2":2}}"#, 3.0),
            (br#"{"id":"c","operation":"mult","args":{"op1":4,"op2":5}}"#, 20.0),
            (br#"{"id":"d","operation":"div","args":{"op1":9,"op2":2}}"#, 4.5),
        ];
        for (raw, expected) in cases {
            let resp = process_message(raw, &mut Arith);
            assert!(resp.status);
            assert_eq!(Some(expected), resp.result);
        }
    }

    #[test]
    fn division_by_zero_is_reported_not_propagated() {
        let raw = br#"{"id":"r2","operation":"div","args":{"op1":7,"op2":0}}"#;
        let resp = process_message(raw, &mut Arith);
        assert_eq!(
            CalcResponse::fail("r2".to_owned(), "division by zero"),
            resp
        );
    }

    #[test]
    fn missing_args_yields_format_error() {
        let raw = br#"{"id":"r3","operation":"sum"}"#;
        let resp = process_message(raw, &mut Arith);
        assert_eq!(CalcResponse::fail("r3".to_owned(), "format error"), resp);
    }

    #[test]
    fn unsupported_operation_yields_operation_not_found() {
        let raw = br#"{"id":"r4","operation":"pow","args":{"op1":2,"op2":8}}"#;
        let resp = process_message(raw, &mut Arith);
        assert_eq!(
            CalcResponse::fail("r4".to_owned(), "operation not found"),
            resp
        );
    }

    #[test]
    fn non_json_payload_yields_unknown_id() {
        let resp = process_message(b"garbage", &mut Arith);
        assert_eq!(
            CalcResponse::fail("unknown".to_owned(), "format error"),
            resp
        );
    }

    struct FailingCalculator;

    impl Calculator for FailingCalculator {
        fn sum(&mut self, _: f64, _: f64) -> Result<f64> {
            Err(Error::new(ErrorKind::Service, "backend unavailable"))
        }
        fn sub(&mut self, _: f64, _: f64) -> Result<f64> {
            Err(Error::new(ErrorKind::Service, "backend unavailable"))
        }
        fn mult(&mut self, _: f64, _: f64) -> Result<f64> {
            Err(Error::new(ErrorKind::Service, "backend unavailable"))
        }
        fn div(&mut self, _: f64, _: f64) -> Result<f64> {
            Err(Error::new(ErrorKind::Service, "backend unavailable"))
        }
    }

    #[test]
    fn a_new_broker_session_triggers_resubscription() {
        // A clean session means the broker drops the subscription on every
        // reconnect; the CONNACK of the new session must renew it or the
        // worker polls forever without receiving another request.
        let connack = Event::Incoming(Packet::ConnAck(rumqttc::ConnAck {
            session_present: false,
            code: rumqttc::ConnectReturnCode::Success,
        }));
        assert!(session_established(&connack));

        let ping = Event::Incoming(Packet::PingResp);
        assert!(!session_established(&ping));
        let outgoing = Event::Outgoing(rumqttc::Outgoing::PingReq);
        assert!(!session_established(&outgoing));
    }

    #[test]
    fn service_failure_text_is_forwarded() {
        let raw = br#"{"id":"r5","operation":"mult","args":{"op1":1,"op2":2}}"#;
        let resp = process_message(raw, &mut FailingCalculator);
        assert_eq!(
            CalcResponse::fail("r5".to_owned(), "backend unavailable"),
            resp
        );
    }
}

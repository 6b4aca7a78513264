use remcalc_protocol::*;

use crate::client::Client;

/// Client-side implementation of the `Calculator` trait: every method is a
/// synchronous remote call to the calculator service.
#[derive(Debug)]
pub struct RemoteCalculator {
    client: Client,
}

impl RemoteCalculator {
    /// Connects to the calculator endpoint. A connection failure here is
    /// what the bridge treats as fatal at startup.
    pub fn connect(addr: &str) -> Result<RemoteCalculator> {
        let mut client = Client::new(addr);
        client.start()?;
        Ok(RemoteCalculator { client })
    }

    /// Wraps an already configured client, e.g. one with timeouts set.
    pub fn with_client(client: Client) -> RemoteCalculator {
        RemoteCalculator { client }
    }

    fn invoke(&mut self, op: Operation, a: f64, b: f64) -> Result<f64> {
        let args = ArithArgs { op1: a, op2: b };
        let reply: ArithReply = self.client.call(SERVICE_PATH, op.method(), &args)?;
        Ok(reply.result)
    }
}

impl Calculator for RemoteCalculator {
    fn sum(&mut self, a: f64, b: f64) -> Result<f64> {
        self.invoke(Operation::Sum, a, b)
    }

    fn sub(&mut self, a: f64, b: f64) -> Result<f64> {
        self.invoke(Operation::Sub, a, b)
    }

    fn mult(&mut self, a: f64, b: f64) -> Result<f64> {
        self.invoke(Operation::Mult, a, b)
    }

    fn div(&mut self, a: f64, b: f64) -> Result<f64> {
        self.invoke(Operation::Div, a, b)
    }
}

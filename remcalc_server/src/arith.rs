use remcalc_protocol::*;

use crate::Server;

/// The concrete calculator. Stateless, so it is safe to invoke from any
/// number of connection threads.
pub struct Arith;

impl Calculator for Arith {
    fn sum(&mut self, a: f64, b: f64) -> Result<f64> {
        Ok(a + b)
    }

    fn sub(&mut self, a: f64, b: f64) -> Result<f64> {
        Ok(a - b)
    }

    fn mult(&mut self, a: f64, b: f64) -> Result<f64> {
        Ok(a * b)
    }

    fn div(&mut self, a: f64, b: f64) -> Result<f64> {
        if b == 0.0 {
            return Err(Error::new(ErrorKind::DivisionByZero, "division by zero"));
        }
        Ok(a / b)
    }
}

fn sum(args: ArithArgs) -> Result<ArithReply> {
    Arith.sum(args.op1, args.op2).map(reply)
}

fn sub(args: ArithArgs) -> Result<ArithReply> {
    Arith.sub(args.op1, args.op2).map(reply)
}

fn mult(args: ArithArgs) -> Result<ArithReply> {
    Arith.mult(args.op1, args.op2).map(reply)
}

fn div(args: ArithArgs) -> Result<ArithReply> {
    Arith.div(args.op1, args.op2).map(reply)
}

fn reply(result: f64) -> ArithReply {
    ArithReply { result }
}

/// Registers the four arithmetic methods under the `Arith` service path.
pub fn register_arith(server: &mut Server) {
    crate::register_func!(server, SERVICE_PATH, "Sum", sum, ArithArgs, ArithReply);
    crate::register_func!(server, SERVICE_PATH, "Sub", sub, ArithArgs, ArithReply);
    crate::register_func!(server, SERVICE_PATH, "Mult", mult, ArithArgs, ArithReply);
    crate::register_func!(server, SERVICE_PATH, "Div", div, ArithArgs, ArithReply);
}

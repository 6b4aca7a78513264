use crate::error::Result;

/// The remote-object contract for the calculator.
///
/// One local implementation lives in `remcalc_server` and one proxy
/// implementation in `remcalc_client`; callers program against this trait
/// and do not care which side of the wire they are on.
///
/// `div` returns an error of kind `DivisionByZero` when `b` is zero rather
/// than producing an infinite value.
pub trait Calculator {
    fn sum(&mut self, a: f64, b: f64) -> Result<f64>;
    fn sub(&mut self, a: f64, b: f64) -> Result<f64>;
    fn mult(&mut self, a: f64, b: f64) -> Result<f64>;
    fn div(&mut self, a: f64, b: f64) -> Result<f64>;
}

use std::env;
use std::process;

use log::error;

use remcalc_protocol::DEFAULT_CALCULATOR_ADDR;
use remcalc_server::{register_arith, Server};

fn main() {
    env_logger::init();

    let addr =
        env::var("REMCALC_ADDR").unwrap_or_else(|_| DEFAULT_CALCULATOR_ADDR.to_owned());

    let mut server = Server::new(addr);
    register_arith(&mut server);

    if let Err(err) = server.start() {
        error!("calculator server failed: {}", err);
        process::exit(1);
    }
}

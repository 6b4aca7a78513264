use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{error, info};

use remcalc_bridge::{Bridge, Config};
use remcalc_client::RemoteCalculator;
use remcalc_protocol::{Error, ErrorKind, Result};

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        error!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cfg = Config::from_env();

    let calc = RemoteCalculator::connect(&cfg.calculator_addr).map_err(|err| {
        Error::new(
            ErrorKind::Network,
            format!(
                "could not connect to remote calculator service at {}: {}",
                cfg.calculator_addr, err
            ),
        )
    })?;
    info!("connected to calculator at {}", cfg.calculator_addr);

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;

    let mut bridge = Bridge::new(cfg, calc)?;
    bridge.run(&shutdown)
}

use std::env;

use remcalc_protocol::DEFAULT_CALCULATOR_ADDR;

/// Bridge endpoints. Every value can be overridden from the environment;
/// malformed values silently fall back to the defaults, so loading never
/// fails.
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_host: String,
    pub broker_port: u16,
    pub request_topic: String,
    pub response_topic: String,
    pub calculator_addr: String,
    pub client_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broker_host: "localhost".to_owned(),
            broker_port: 1883,
            request_topic: "calculator-requests".to_owned(),
            response_topic: "calculator-responses".to_owned(),
            calculator_addr: DEFAULT_CALCULATOR_ADDR.to_owned(),
            client_id: "remcalc-bridge".to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        let defaults = Config::default();
        Config {
            broker_host: env_or("REMCALC_BROKER_HOST", defaults.broker_host),
            broker_port: env::var("REMCALC_BROKER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.broker_port),
            request_topic: env_or("REMCALC_REQUEST_TOPIC", defaults.request_topic),
            response_topic: env_or("REMCALC_RESPONSE_TOPIC", defaults.response_topic),
            calculator_addr: env_or("REMCALC_ADDR", defaults.calculator_addr),
            client_id: defaults.client_id,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}

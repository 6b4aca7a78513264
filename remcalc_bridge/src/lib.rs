pub mod config;
pub mod validate;
pub mod worker;

pub use config::Config;
pub use validate::{validate_request, ValidateError};
pub use worker::{process_message, Bridge};

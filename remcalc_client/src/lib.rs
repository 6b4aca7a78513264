pub mod client;
pub mod proxy;

pub use client::*;
pub use proxy::*;

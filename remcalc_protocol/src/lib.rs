pub mod call;
pub mod error;
pub mod message;
pub mod model;
pub mod service;

pub use call::*;
pub use error::*;
pub use message::*;
pub use model::*;
pub use service::*;

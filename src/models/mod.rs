pub mod alb;
pub mod error;

pub use alb::*;
pub use error::AdapterError;

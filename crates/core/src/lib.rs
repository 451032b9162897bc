#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progressive;
pub mod shapes;
pub mod time;
pub mod validation;

pub use error::Error;
pub use time::Clock;

//! External command execution with timeouts and cancellation

pub mod command;
pub mod error;

pub use command::*;
pub use error::*;

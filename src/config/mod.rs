pub mod error;
pub mod foundation;
pub mod migration;

pub use error::*;
pub use foundation::*;
pub use migration::*;

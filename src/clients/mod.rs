//! Clients for the three external systems of each foundation

pub mod bosh;
pub mod cf;
pub mod error;
pub mod holder;
pub mod http;
pub mod opsman;

pub use bosh::{BoshClient, BoshClientBuilder, HttpBoshClientBuilder, Vm};
pub use cf::{CfClient, CfClientLoader, HttpCfClientLoader};
pub use error::*;
pub use holder::{ClientHolder, Foundations};
pub use opsman::{CcdbProperties, CcdbPropertiesBuilder, HttpOpsManClientBuilder, OpsManClient, OpsManClientBuilder};

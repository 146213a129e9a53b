//! BOSH director client contract

pub mod http;

pub use http::{HttpBoshClient, HttpBoshClientBuilder};

use crate::clients::Result;
use crate::config::BoshAccess;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vm {
    pub job: String,
    pub index: Option<u32>,
    pub id: String,
    pub ips: Vec<String>,
}

impl Vm {
    /// `job/id`, the instance address understood by `bosh ssh`
    pub fn instance(&self) -> String {
        format!("{}/{}", self.job, self.id)
    }
}

#[async_trait]
pub trait BoshClient: Send + Sync {
    /// VMs of `job` in `deployment`, ordered by index
    async fn find_vms(&self, deployment: &str, job: &str) -> Result<Vec<Vm>>;

    /// Director address, as `BOSH_ENVIRONMENT`
    fn environment(&self) -> &str;

    /// Proxy used to reach the director and its VMs
    fn all_proxy(&self) -> Option<&str>;

    /// Environment for the bosh CLI when a strategy shells out to it
    fn cli_env(&self) -> Vec<(String, String)>;
}

#[async_trait]
pub trait BoshClientBuilder: Send + Sync {
    async fn build(
        &self,
        access: &BoshAccess,
        skip_ssl_validation: bool,
    ) -> Result<Arc<dyn BoshClient>>;
}

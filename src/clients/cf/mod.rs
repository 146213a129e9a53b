//! Cloud Controller client contract

pub mod http;
pub mod types;

pub use http::{HttpCfClient, HttpCfClientLoader};
pub use types::*;

use crate::clients::Result;
use crate::config::CloudControllerAccess;
use async_trait::async_trait;
use std::sync::Arc;

/// Cloud Controller operations used by the walker and the strategies
#[async_trait]
pub trait CfClient: Send + Sync {
    async fn list_orgs(&self) -> Result<Vec<Org>>;

    /// Fails with [`crate::clients::ClientError::OrgNotFound`] when absent
    async fn get_org(&self, name: &str) -> Result<Org>;

    /// Get-or-create
    async fn ensure_org(&self, name: &str) -> Result<Org>;

    async fn list_spaces(&self, org: &Org) -> Result<Vec<Space>>;

    /// Fails with [`crate::clients::ClientError::SpaceNotFound`] when absent
    async fn get_space(&self, org: &Org, name: &str) -> Result<Space>;

    /// Get-or-create
    async fn ensure_space(&self, org: &Org, name: &str) -> Result<Space>;

    async fn list_service_instances(&self, space: &Space) -> Result<Vec<ServiceInstance>>;

    async fn service_instance_parameters(&self, instance_guid: &str) -> Result<JsonMap>;

    async fn user_provided_credentials(&self, instance_guid: &str) -> Result<JsonMap>;

    async fn list_bindings(&self, instance_guid: &str) -> Result<Vec<ServiceBinding>>;

    async fn list_service_keys(&self, instance_guid: &str) -> Result<Vec<ServiceKey>>;

    async fn service_key_details(&self, key_guid: &str) -> Result<JsonMap>;

    async fn list_route_bindings(&self, instance_guid: &str) -> Result<Vec<RouteRef>>;

    async fn find_app(&self, space: &Space, name: &str) -> Result<Option<App>>;

    /// Create and wait until the instance is usable
    async fn create_service_instance(
        &self,
        space: &Space,
        instance: &NewServiceInstance,
    ) -> Result<ServiceInstance>;

    async fn create_binding(
        &self,
        instance_guid: &str,
        app_guid: &str,
        name: &str,
        parameters: &JsonMap,
    ) -> Result<()>;

    async fn create_service_key(
        &self,
        instance_guid: &str,
        name: &str,
        parameters: &JsonMap,
    ) -> Result<ServiceKey>;

    async fn delete_service_key(&self, key_guid: &str) -> Result<()>;

    /// Bind a route, creating it first when the space does not have it yet
    async fn create_route_binding(
        &self,
        space: &Space,
        instance_guid: &str,
        route: &RouteRef,
    ) -> Result<()>;
}

/// Builds the Cloud Controller client for one foundation
#[async_trait]
pub trait CfClientLoader: Send + Sync {
    async fn load(
        &self,
        access: &CloudControllerAccess,
        skip_ssl_validation: bool,
    ) -> Result<Arc<dyn CfClient>>;
}

use serde::{Deserialize, Serialize};

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    pub org_guid: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceType {
    #[default]
    #[serde(rename = "managed_service_instance")]
    Managed,
    #[serde(rename = "user_provided_service_instance")]
    UserProvided,
}

impl InstanceType {
    /// Value used by the v3 API `type` field
    pub fn api_name(self) -> &'static str {
        match self {
            InstanceType::Managed => "managed",
            InstanceType::UserProvided => "user-provided",
        }
    }
}

/// Offering name recorded for user-provided instances, which have no catalog entry
pub const USER_PROVIDED_OFFERING: &str = "user-provided";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
    pub instance_type: InstanceType,
    /// Service-offering name, the strategy lookup key
    pub service_offering: String,
    pub plan: String,
    pub tags: Vec<String>,
    pub route_service_url: String,
    pub syslog_drain_url: String,
    pub space_guid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub guid: String,
    pub name: String,
    pub app_guid: String,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceKey {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
}

/// A route bound to a route-service instance
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRef {
    pub host: String,
    pub domain: String,
    pub path: String,
}

impl RouteRef {
    pub fn url(&self) -> String {
        let mut url = if self.host.is_empty() {
            self.domain.clone()
        } else {
            format!("{}.{}", self.host, self.domain)
        };
        url.push_str(&self.path);
        url
    }
}

/// Everything needed to create a service instance on a foundation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewServiceInstance {
    pub name: String,
    pub instance_type: InstanceType,
    pub service_offering: String,
    pub plan: String,
    pub tags: Vec<String>,
    pub parameters: JsonMap,
    pub credentials: JsonMap,
    pub route_service_url: String,
    pub syslog_drain_url: String,
}

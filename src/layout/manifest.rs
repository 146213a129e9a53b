use crate::clients::cf::{InstanceType, JsonMap, NewServiceInstance, RouteRef, ServiceInstance};
use crate::layout::FileDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const MANIFEST_EXTENSION: &str = "yml";

/// CF-level description of one exported service instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceManifest {
    pub name: String,
    pub guid: String,
    #[serde(rename = "type")]
    pub instance_type: InstanceType,
    /// Offering name
    pub service: String,
    pub plan: String,
    pub tags: Vec<String>,
    pub parameters: JsonMap,
    pub credentials: JsonMap,
    pub route_service_url: String,
    pub syslog_drain_url: String,
    /// Bound applications, guid to name
    pub apps: BTreeMap<String, String>,
    pub service_keys: Vec<ServiceKeyManifest>,
    pub routes: Vec<RouteRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceKeyManifest {
    pub name: String,
    pub parameters: JsonMap,
}

impl ServiceManifest {
    pub fn from_instance(instance: &ServiceInstance) -> Self {
        Self {
            name: instance.name.clone(),
            guid: instance.guid.clone(),
            instance_type: instance.instance_type,
            service: instance.service_offering.clone(),
            plan: instance.plan.clone(),
            tags: instance.tags.clone(),
            route_service_url: instance.route_service_url.clone(),
            syslog_drain_url: instance.syslog_drain_url.clone(),
            ..Default::default()
        }
    }

    pub fn descriptor(&self, base_dir: &Path, org: &str, space: &str) -> FileDescriptor {
        FileDescriptor::new(base_dir, org, space, &self.name, MANIFEST_EXTENSION)
    }

    /// Swap every route domain found in `replacements` for its mapped value.
    pub fn with_replaced_domains(mut self, replacements: &BTreeMap<String, String>) -> Self {
        for route in &mut self.routes {
            if let Some(replacement) = replacements.get(&route.domain) {
                route.domain = replacement.clone();
            }
        }
        self
    }

    pub fn to_new_instance(&self) -> NewServiceInstance {
        NewServiceInstance {
            name: self.name.clone(),
            instance_type: self.instance_type,
            service_offering: self.service.clone(),
            plan: self.plan.clone(),
            tags: self.tags.clone(),
            parameters: self.parameters.clone(),
            credentials: self.credentials.clone(),
            route_service_url: self.route_service_url.clone(),
            syslog_drain_url: self.syslog_drain_url.clone(),
        }
    }
}

//! Cloud Controller v3 API client

use crate::clients::cf::{
    App, CfClient, CfClientLoader, InstanceType, JsonMap, NewServiceInstance, Org, RouteRef,
    ServiceBinding, ServiceInstance, ServiceKey, Space, USER_PROVIDED_OFFERING,
};
use crate::clients::http::{build_http_client, ApiClient, Authorizer};
use crate::clients::{ClientError, Result};
use crate::config::{CloudControllerAccess, ConfigError};
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const JOB_POLL_INTERVAL: Duration = Duration::from_secs(2);
const JOB_MAX_POLLS: u32 = 900;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    pagination: Pagination,
    #[serde(default)]
    resources: Vec<Value>,
    #[serde(default)]
    included: Value,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct Job {
    state: String,
    #[serde(default)]
    errors: Vec<JobError>,
}

#[derive(Debug, Deserialize)]
struct JobError {
    #[serde(default)]
    detail: String,
}

fn enc(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

fn to_org(value: &Value) -> Org {
    Org {
        guid: str_at(value, "/guid").to_string(),
        name: str_at(value, "/name").to_string(),
    }
}

fn to_space(value: &Value) -> Space {
    Space {
        guid: str_at(value, "/guid").to_string(),
        name: str_at(value, "/name").to_string(),
        org_guid: str_at(value, "/relationships/organization/data/guid").to_string(),
    }
}

/// Index an `included` collection by guid
fn included_by_guid<'a>(pages: &'a [Page], kind: &str) -> HashMap<&'a str, &'a Value> {
    pages
        .iter()
        .filter_map(|p| p.included.get(kind).and_then(Value::as_array))
        .flatten()
        .map(|v| (str_at(v, "/guid"), v))
        .collect()
}

pub struct HttpCfClient {
    api: ApiClient,
}

impl HttpCfClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn list_pages(&self, path: &str) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut next = Some(path.to_string());
        while let Some(path) = next {
            let page: Page = self.api.get(&path).await?;
            next = page.pagination.next.as_ref().map(|l| l.href.clone());
            pages.push(page);
        }
        Ok(pages)
    }

    async fn list_resources(&self, path: &str) -> Result<Vec<Value>> {
        Ok(self
            .list_pages(path)
            .await?
            .into_iter()
            .flat_map(|p| p.resources)
            .collect())
    }

    async fn first_resource(&self, path: &str) -> Result<Option<Value>> {
        let page: Page = self.api.get(path).await?;
        Ok(page.resources.into_iter().next())
    }

    /// Wait for an asynchronous operation when the API answered 202 with a job location.
    async fn finish(&self, response: Response) -> Result<Option<Value>> {
        if response.status() != StatusCode::ACCEPTED {
            if response.status() == StatusCode::NO_CONTENT {
                return Ok(None);
            }
            return Ok(Some(response.json().await?));
        }

        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
        else {
            return Ok(None);
        };

        for _ in 0..JOB_MAX_POLLS {
            let job: Job = self.api.get(&location).await?;
            match job.state.as_str() {
                "COMPLETE" => return Ok(None),
                "FAILED" => {
                    let reason = job
                        .errors
                        .iter()
                        .map(|e| e.detail.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(ClientError::JobFailed {
                        url: location,
                        reason,
                    });
                }
                state => debug!("Job {} is {}", location, state),
            }
            tokio::time::sleep(JOB_POLL_INTERVAL).await;
        }

        Err(ClientError::JobFailed {
            url: location,
            reason: "timed out waiting for completion".to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Option<Value>> {
        let response = self.api.send_raw(Method::POST, path, Some(&body)).await?;
        self.finish(response).await
    }

    async fn find_service_instance(&self, space: &Space, name: &str) -> Result<Option<Value>> {
        self.first_resource(&format!(
            "/v3/service_instances?names={}&space_guids={}",
            enc(name),
            space.guid
        ))
        .await
    }

    async fn service_plan_guid(&self, space: &Space, offering: &str, plan: &str) -> Result<String> {
        let plan_resource = self
            .first_resource(&format!(
                "/v3/service_plans?names={}&service_offering_names={}&space_guids={}",
                enc(plan),
                enc(offering),
                space.guid
            ))
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: "service plan",
                name: format!("{offering}/{plan}"),
            })?;
        Ok(str_at(&plan_resource, "/guid").to_string())
    }

    async fn domain_guid(&self, name: &str) -> Result<String> {
        let domain = self
            .first_resource(&format!("/v3/domains?names={}", enc(name)))
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: "domain",
                name: name.to_string(),
            })?;
        Ok(str_at(&domain, "/guid").to_string())
    }
}

#[async_trait]
impl CfClient for HttpCfClient {
    async fn list_orgs(&self) -> Result<Vec<Org>> {
        let resources = self.list_resources("/v3/organizations?per_page=100").await?;
        Ok(resources.iter().map(to_org).collect())
    }

    async fn get_org(&self, name: &str) -> Result<Org> {
        self.first_resource(&format!("/v3/organizations?names={}", enc(name)))
            .await?
            .map(|v| to_org(&v))
            .ok_or_else(|| ClientError::OrgNotFound {
                name: name.to_string(),
            })
    }

    async fn ensure_org(&self, name: &str) -> Result<Org> {
        match self.get_org(name).await {
            Err(ClientError::OrgNotFound { .. }) => {
                info!("Creating organization {}", name);
                let created = self
                    .post("/v3/organizations", json!({ "name": name }))
                    .await?
                    .unwrap_or_default();
                Ok(to_org(&created))
            }
            other => other,
        }
    }

    async fn list_spaces(&self, org: &Org) -> Result<Vec<Space>> {
        let resources = self
            .list_resources(&format!(
                "/v3/spaces?organization_guids={}&per_page=100",
                org.guid
            ))
            .await?;
        Ok(resources.iter().map(to_space).collect())
    }

    async fn get_space(&self, org: &Org, name: &str) -> Result<Space> {
        self.first_resource(&format!(
            "/v3/spaces?names={}&organization_guids={}",
            enc(name),
            org.guid
        ))
        .await?
        .map(|v| to_space(&v))
        .ok_or_else(|| ClientError::SpaceNotFound {
            org: org.name.clone(),
            name: name.to_string(),
        })
    }

    async fn ensure_space(&self, org: &Org, name: &str) -> Result<Space> {
        match self.get_space(org, name).await {
            Err(ClientError::SpaceNotFound { .. }) => {
                info!("Creating space {}/{}", org.name, name);
                let body = json!({
                    "name": name,
                    "relationships": { "organization": { "data": { "guid": org.guid } } }
                });
                let created = self.post("/v3/spaces", body).await?.unwrap_or_default();
                Ok(to_space(&created))
            }
            other => other,
        }
    }

    async fn list_service_instances(&self, space: &Space) -> Result<Vec<ServiceInstance>> {
        let pages = self
            .list_pages(&format!(
                "/v3/service_instances?space_guids={}&per_page=100\
                 &fields[service_plan]=guid,name,relationships.service_offering\
                 &fields[service_plan.service_offering]=guid,name",
                space.guid
            ))
            .await?;

        let plans = included_by_guid(&pages, "service_plans");
        let offerings = included_by_guid(&pages, "service_offerings");

        let mut instances = Vec::new();
        for resource in pages.iter().flat_map(|p| p.resources.iter()) {
            let instance_type = if str_at(resource, "/type") == "user-provided" {
                InstanceType::UserProvided
            } else {
                InstanceType::Managed
            };

            let (offering, plan) = match instance_type {
                InstanceType::UserProvided => (USER_PROVIDED_OFFERING.to_string(), String::new()),
                InstanceType::Managed => {
                    let plan_guid = str_at(resource, "/relationships/service_plan/data/guid");
                    let plan = plans.get(plan_guid).copied();
                    let offering_guid = plan
                        .map(|p| str_at(p, "/relationships/service_offering/data/guid"))
                        .unwrap_or("");
                    (
                        offerings
                            .get(offering_guid)
                            .map(|o| str_at(o, "/name").to_string())
                            .unwrap_or_default(),
                        plan.map(|p| str_at(p, "/name").to_string())
                            .unwrap_or_default(),
                    )
                }
            };

            instances.push(ServiceInstance {
                guid: str_at(resource, "/guid").to_string(),
                name: str_at(resource, "/name").to_string(),
                instance_type,
                service_offering: offering,
                plan,
                tags: resource
                    .get("tags")
                    .and_then(Value::as_array)
                    .map(|tags| {
                        tags.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                route_service_url: str_at(resource, "/route_service_url").to_string(),
                syslog_drain_url: str_at(resource, "/syslog_drain_url").to_string(),
                space_guid: space.guid.clone(),
            });
        }
        Ok(instances)
    }

    async fn service_instance_parameters(&self, instance_guid: &str) -> Result<JsonMap> {
        let value: Value = self
            .api
            .get(&format!("/v3/service_instances/{instance_guid}/parameters"))
            .await?;
        Ok(object(value))
    }

    async fn user_provided_credentials(&self, instance_guid: &str) -> Result<JsonMap> {
        let value: Value = self
            .api
            .get(&format!("/v3/service_instances/{instance_guid}/credentials"))
            .await?;
        Ok(object(value))
    }

    async fn list_bindings(&self, instance_guid: &str) -> Result<Vec<ServiceBinding>> {
        let pages = self
            .list_pages(&format!(
                "/v3/service_credential_bindings?service_instance_guids={instance_guid}&type=app&include=app&per_page=100"
            ))
            .await?;
        let apps = included_by_guid(&pages, "apps");

        Ok(pages
            .iter()
            .flat_map(|p| p.resources.iter())
            .map(|b| {
                let app_guid = str_at(b, "/relationships/app/data/guid");
                ServiceBinding {
                    guid: str_at(b, "/guid").to_string(),
                    name: str_at(b, "/name").to_string(),
                    app_guid: app_guid.to_string(),
                    app_name: apps
                        .get(app_guid)
                        .map(|a| str_at(a, "/name").to_string())
                        .unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn list_service_keys(&self, instance_guid: &str) -> Result<Vec<ServiceKey>> {
        let resources = self
            .list_resources(&format!(
                "/v3/service_credential_bindings?service_instance_guids={instance_guid}&type=key&per_page=100"
            ))
            .await?;
        Ok(resources
            .iter()
            .map(|k| ServiceKey {
                guid: str_at(k, "/guid").to_string(),
                name: str_at(k, "/name").to_string(),
            })
            .collect())
    }

    async fn service_key_details(&self, key_guid: &str) -> Result<JsonMap> {
        let details: Value = self
            .api
            .get(&format!("/v3/service_credential_bindings/{key_guid}/details"))
            .await?;
        Ok(object(details.get("credentials").cloned().unwrap_or_default()))
    }

    async fn list_route_bindings(&self, instance_guid: &str) -> Result<Vec<RouteRef>> {
        let pages = self
            .list_pages(&format!(
                "/v3/service_route_bindings?service_instance_guids={instance_guid}&include=route&per_page=100"
            ))
            .await?;

        let mut domain_names: HashMap<String, String> = HashMap::new();
        let mut routes = Vec::new();
        for route in included_by_guid(&pages, "routes").values() {
            let domain_guid = str_at(route, "/relationships/domain/data/guid").to_string();
            if !domain_names.contains_key(&domain_guid) {
                let domain: Value = self.api.get(&format!("/v3/domains/{domain_guid}")).await?;
                domain_names.insert(domain_guid.clone(), str_at(&domain, "/name").to_string());
            }
            routes.push(RouteRef {
                host: str_at(route, "/host").to_string(),
                domain: domain_names[&domain_guid].clone(),
                path: str_at(route, "/path").to_string(),
            });
        }
        routes.sort();
        Ok(routes)
    }

    async fn find_app(&self, space: &Space, name: &str) -> Result<Option<App>> {
        Ok(self
            .first_resource(&format!(
                "/v3/apps?names={}&space_guids={}",
                enc(name),
                space.guid
            ))
            .await?
            .map(|a| App {
                guid: str_at(&a, "/guid").to_string(),
                name: str_at(&a, "/name").to_string(),
            }))
    }

    async fn create_service_instance(
        &self,
        space: &Space,
        instance: &NewServiceInstance,
    ) -> Result<ServiceInstance> {
        let mut body = json!({
            "type": instance.instance_type.api_name(),
            "name": instance.name,
            "tags": instance.tags,
            "relationships": { "space": { "data": { "guid": space.guid } } }
        });

        match instance.instance_type {
            InstanceType::Managed => {
                let plan_guid = self
                    .service_plan_guid(space, &instance.service_offering, &instance.plan)
                    .await?;
                body["relationships"]["service_plan"] = json!({ "data": { "guid": plan_guid } });
                if !instance.parameters.is_empty() {
                    body["parameters"] = Value::Object(instance.parameters.clone());
                }
            }
            InstanceType::UserProvided => {
                body["credentials"] = Value::Object(instance.credentials.clone());
                if !instance.syslog_drain_url.is_empty() {
                    body["syslog_drain_url"] = json!(instance.syslog_drain_url);
                }
            }
        }
        if !instance.route_service_url.is_empty() {
            body["route_service_url"] = json!(instance.route_service_url);
        }

        self.post("/v3/service_instances", body).await?;

        let created = self
            .find_service_instance(space, &instance.name)
            .await?
            .ok_or_else(|| ClientError::InvalidResponse {
                url: self.api.url("/v3/service_instances"),
                reason: format!("service instance {:?} missing after creation", instance.name),
            })?;

        Ok(ServiceInstance {
            guid: str_at(&created, "/guid").to_string(),
            name: instance.name.clone(),
            instance_type: instance.instance_type,
            service_offering: instance.service_offering.clone(),
            plan: instance.plan.clone(),
            tags: instance.tags.clone(),
            route_service_url: instance.route_service_url.clone(),
            syslog_drain_url: instance.syslog_drain_url.clone(),
            space_guid: space.guid.clone(),
        })
    }

    async fn create_binding(
        &self,
        instance_guid: &str,
        app_guid: &str,
        name: &str,
        parameters: &JsonMap,
    ) -> Result<()> {
        let mut body = json!({
            "type": "app",
            "relationships": {
                "service_instance": { "data": { "guid": instance_guid } },
                "app": { "data": { "guid": app_guid } }
            }
        });
        if !name.is_empty() {
            body["name"] = json!(name);
        }
        if !parameters.is_empty() {
            body["parameters"] = Value::Object(parameters.clone());
        }
        self.post("/v3/service_credential_bindings", body).await?;
        Ok(())
    }

    async fn create_service_key(
        &self,
        instance_guid: &str,
        name: &str,
        parameters: &JsonMap,
    ) -> Result<ServiceKey> {
        let mut body = json!({
            "type": "key",
            "name": name,
            "relationships": { "service_instance": { "data": { "guid": instance_guid } } }
        });
        if !parameters.is_empty() {
            body["parameters"] = Value::Object(parameters.clone());
        }
        self.post("/v3/service_credential_bindings", body).await?;

        let key = self
            .first_resource(&format!(
                "/v3/service_credential_bindings?service_instance_guids={instance_guid}&names={}&type=key",
                enc(name)
            ))
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: "service key",
                name: name.to_string(),
            })?;
        Ok(ServiceKey {
            guid: str_at(&key, "/guid").to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_service_key(&self, key_guid: &str) -> Result<()> {
        let response = self
            .api
            .send_raw(
                Method::DELETE,
                &format!("/v3/service_credential_bindings/{key_guid}"),
                None,
            )
            .await?;
        self.finish(response).await?;
        Ok(())
    }

    async fn create_route_binding(
        &self,
        space: &Space,
        instance_guid: &str,
        route: &RouteRef,
    ) -> Result<()> {
        let domain_guid = self.domain_guid(&route.domain).await?;

        let existing = self
            .first_resource(&format!(
                "/v3/routes?space_guids={}&domain_guids={}&hosts={}&paths={}",
                space.guid,
                domain_guid,
                enc(&route.host),
                enc(&route.path)
            ))
            .await?;

        let route_guid = match existing {
            Some(r) => str_at(&r, "/guid").to_string(),
            None => {
                info!("Creating route {}", route.url());
                let created = self
                    .post(
                        "/v3/routes",
                        json!({
                            "host": route.host,
                            "path": route.path,
                            "relationships": {
                                "space": { "data": { "guid": space.guid } },
                                "domain": { "data": { "guid": domain_guid } }
                            }
                        }),
                    )
                    .await?
                    .unwrap_or_default();
                str_at(&created, "/guid").to_string()
            }
        };

        self.post(
            "/v3/service_route_bindings",
            json!({
                "relationships": {
                    "route": { "data": { "guid": route_guid } },
                    "service_instance": { "data": { "guid": instance_guid } }
                }
            }),
        )
        .await?;
        Ok(())
    }
}

pub struct HttpCfClientLoader;

#[async_trait]
impl CfClientLoader for HttpCfClientLoader {
    async fn load(
        &self,
        access: &CloudControllerAccess,
        skip_ssl_validation: bool,
    ) -> Result<Arc<dyn CfClient>> {
        let method = access.authentication.resolve().map_err(|reason| {
            ConfigError::InvalidAuthentication {
                foundation: access.url.clone(),
                reason,
            }
        })?;

        let http = build_http_client(skip_ssl_validation, None)?;
        let auth = Authorizer::new(&http, method, "cf");
        Ok(Arc::new(HttpCfClient::new(ApiClient::new(
            http,
            &access.url,
            auth,
        ))))
    }
}

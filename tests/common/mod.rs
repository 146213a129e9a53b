//! In-memory fakes of the foundation clients and the command executor

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use service_migrator::clients::cf::{
    App, CfClient, CfClientLoader, InstanceType, JsonMap, NewServiceInstance, Org, RouteRef,
    ServiceBinding, ServiceInstance, ServiceKey, Space,
};
use service_migrator::clients::opsman::{Credential, DeployedProduct, DirectorCredentials};
use service_migrator::clients::{
    BoshClient, BoshClientBuilder, ClientError, ClientHolder, Foundations, OpsManClient,
    OpsManClientBuilder, Vm,
};
use service_migrator::config::{
    Authentication, BoshAccess, CloudControllerAccess, Foundation, MigrationDefinition,
};
use service_migrator::executor::{CommandExecutor, CommandOutput, CommandSpec, ExecutorError};
use service_migrator::strategy::{
    RecreateOptions, ServiceRecreator, StrategyDeps, StrategyRegistry,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, ClientError>;

pub fn foundation(side: &str) -> Foundation {
    Foundation {
        url: format!("https://opsman.{side}"),
        authentication: Authentication::basic("admin", "secret"),
        hostname: format!("opsman.{side}"),
        ssh_user: "ubuntu".to_string(),
        private_key: format!("/keys/{side}.pem"),
        skip_ssl_validation: true,
        bosh: Some(BoshAccess {
            url: format!("https://bosh.{side}:25555"),
            authentication: Authentication::basic("director", "secret"),
            all_proxy: None,
        }),
        cloud_controller: Some(CloudControllerAccess {
            url: format!("https://api.{side}"),
            authentication: Authentication::uaa_client(&format!("https://uaa.{side}"), "admin", "secret"),
        }),
    }
}

#[derive(Default)]
pub struct CfState {
    pub orgs: Vec<Org>,
    pub spaces: Vec<Space>,
    pub instances: Vec<ServiceInstance>,
    pub apps: Vec<(String, App)>,
    pub parameters: HashMap<String, JsonMap>,
    pub credentials: HashMap<String, JsonMap>,
    pub bindings: HashMap<String, Vec<ServiceBinding>>,
    pub keys: HashMap<String, Vec<ServiceKey>>,
    pub key_details: HashMap<String, JsonMap>,
    pub routes: HashMap<String, Vec<RouteRef>>,
    pub failing_instances: HashSet<String>,
    pub failing_spaces: HashSet<String>,
    pub created_instances: Vec<(String, NewServiceInstance)>,
    pub created_bindings: Vec<(String, String)>,
    pub created_keys: Vec<(String, String)>,
    pub deleted_keys: Vec<String>,
    pub created_routes: Vec<(String, RouteRef)>,
    pub hang_creates: bool,
    pub create_attempts: usize,
    next_id: usize,
}

impl CfState {
    fn next_guid(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Default)]
pub struct FakeCfClient {
    state: Mutex<CfState>,
}

impl FakeCfClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, CfState> {
        self.state.lock()
    }

    pub fn add_org(&self, name: &str) -> Org {
        let org = Org {
            guid: format!("org-{name}"),
            name: name.to_string(),
        };
        self.state.lock().orgs.push(org.clone());
        org
    }

    pub fn add_space(&self, org: &Org, name: &str) -> Space {
        let space = Space {
            guid: format!("space-{}-{name}", org.name),
            name: name.to_string(),
            org_guid: org.guid.clone(),
        };
        self.state.lock().spaces.push(space.clone());
        space
    }

    pub fn add_instance(&self, space: &Space, name: &str, offering: &str) -> ServiceInstance {
        let instance = ServiceInstance {
            guid: format!("guid-{name}"),
            name: name.to_string(),
            instance_type: InstanceType::Managed,
            service_offering: offering.to_string(),
            plan: "small".to_string(),
            tags: vec![offering.to_string()],
            space_guid: space.guid.clone(),
            ..Default::default()
        };
        self.state.lock().instances.push(instance.clone());
        instance
    }

    pub fn add_app(&self, space: &Space, name: &str) -> App {
        let app = App {
            guid: format!("app-{}-{name}", space.name),
            name: name.to_string(),
        };
        self.state.lock().apps.push((space.guid.clone(), app.clone()));
        app
    }

    pub fn bind(&self, instance: &ServiceInstance, app: &App) {
        self.state
            .lock()
            .bindings
            .entry(instance.guid.clone())
            .or_default()
            .push(ServiceBinding {
                guid: format!("binding-{}", app.guid),
                name: String::new(),
                app_guid: app.guid.clone(),
                app_name: app.name.clone(),
            });
    }

    pub fn add_key(&self, instance: &ServiceInstance, name: &str) {
        self.state
            .lock()
            .keys
            .entry(instance.guid.clone())
            .or_default()
            .push(ServiceKey {
                guid: format!("key-{name}"),
                name: name.to_string(),
            });
    }

    pub fn add_route(&self, instance: &ServiceInstance, host: &str, domain: &str) {
        self.state
            .lock()
            .routes
            .entry(instance.guid.clone())
            .or_default()
            .push(RouteRef {
                host: host.to_string(),
                domain: domain.to_string(),
                path: String::new(),
            });
    }

    /// Any credentials read through a key created for `instance_guid`
    pub fn set_key_credentials(&self, instance_guid: &str, credentials: JsonMap) {
        self.state
            .lock()
            .key_details
            .insert(instance_guid.to_string(), credentials);
    }

    pub fn fail_instance(&self, instance: &ServiceInstance) {
        self.state.lock().failing_instances.insert(instance.guid.clone());
    }

    pub fn hang_creates(&self) {
        self.state.lock().hang_creates = true;
    }

    pub fn fail_space(&self, space: &Space) {
        self.state.lock().failing_spaces.insert(space.guid.clone());
    }

    pub fn created_names(&self) -> Vec<String> {
        self.state
            .lock()
            .created_instances
            .iter()
            .map(|(_, i)| i.name.clone())
            .collect()
    }
}

fn unexpected(url: &str) -> ClientError {
    ClientError::UnexpectedStatus {
        method: "GET".to_string(),
        url: url.to_string(),
        status: 500,
        body: "boom".to_string(),
    }
}

#[async_trait]
impl CfClient for FakeCfClient {
    async fn list_orgs(&self) -> Result<Vec<Org>> {
        Ok(self.state.lock().orgs.clone())
    }

    async fn get_org(&self, name: &str) -> Result<Org> {
        self.state
            .lock()
            .orgs
            .iter()
            .find(|o| o.name == name)
            .cloned()
            .ok_or_else(|| ClientError::OrgNotFound {
                name: name.to_string(),
            })
    }

    async fn ensure_org(&self, name: &str) -> Result<Org> {
        match self.get_org(name).await {
            Ok(org) => Ok(org),
            Err(_) => Ok(self.add_org(name)),
        }
    }

    async fn list_spaces(&self, org: &Org) -> Result<Vec<Space>> {
        Ok(self
            .state
            .lock()
            .spaces
            .iter()
            .filter(|s| s.org_guid == org.guid)
            .cloned()
            .collect())
    }

    async fn get_space(&self, org: &Org, name: &str) -> Result<Space> {
        self.list_spaces(org)
            .await?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ClientError::SpaceNotFound {
                org: org.name.clone(),
                name: name.to_string(),
            })
    }

    async fn ensure_space(&self, org: &Org, name: &str) -> Result<Space> {
        match self.get_space(org, name).await {
            Ok(space) => Ok(space),
            Err(_) => Ok(self.add_space(org, name)),
        }
    }

    async fn list_service_instances(&self, space: &Space) -> Result<Vec<ServiceInstance>> {
        let state = self.state.lock();
        if state.failing_spaces.contains(&space.guid) {
            return Err(unexpected(&format!("/v3/service_instances?space_guids={}", space.guid)));
        }
        Ok(state
            .instances
            .iter()
            .filter(|i| i.space_guid == space.guid)
            .cloned()
            .collect())
    }

    async fn service_instance_parameters(&self, instance_guid: &str) -> Result<JsonMap> {
        Ok(self
            .state
            .lock()
            .parameters
            .get(instance_guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_provided_credentials(&self, instance_guid: &str) -> Result<JsonMap> {
        Ok(self
            .state
            .lock()
            .credentials
            .get(instance_guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_bindings(&self, instance_guid: &str) -> Result<Vec<ServiceBinding>> {
        let state = self.state.lock();
        if state.failing_instances.contains(instance_guid) {
            return Err(unexpected(&format!("/v3/service_credential_bindings?service_instance_guids={instance_guid}")));
        }
        Ok(state.bindings.get(instance_guid).cloned().unwrap_or_default())
    }

    async fn list_service_keys(&self, instance_guid: &str) -> Result<Vec<ServiceKey>> {
        Ok(self
            .state
            .lock()
            .keys
            .get(instance_guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn service_key_details(&self, key_guid: &str) -> Result<JsonMap> {
        let state = self.state.lock();
        let instance_guid = state
            .created_keys
            .iter()
            .find(|(_, guid)| guid == key_guid)
            .map(|(instance, _)| instance.clone())
            .unwrap_or_default();
        Ok(state
            .key_details
            .get(&instance_guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_route_bindings(&self, instance_guid: &str) -> Result<Vec<RouteRef>> {
        Ok(self
            .state
            .lock()
            .routes
            .get(instance_guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_app(&self, space: &Space, name: &str) -> Result<Option<App>> {
        Ok(self
            .state
            .lock()
            .apps
            .iter()
            .find(|(space_guid, app)| space_guid == &space.guid && app.name == name)
            .map(|(_, app)| app.clone()))
    }

    async fn create_service_instance(
        &self,
        space: &Space,
        instance: &NewServiceInstance,
    ) -> Result<ServiceInstance> {
        let hang = {
            let mut state = self.state.lock();
            state.create_attempts += 1;
            state.hang_creates
        };
        if hang {
            // an async job that never finishes
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock();
        let created = ServiceInstance {
            guid: state.next_guid("created"),
            name: instance.name.clone(),
            instance_type: instance.instance_type,
            service_offering: instance.service_offering.clone(),
            plan: instance.plan.clone(),
            tags: instance.tags.clone(),
            route_service_url: instance.route_service_url.clone(),
            syslog_drain_url: instance.syslog_drain_url.clone(),
            space_guid: space.guid.clone(),
        };
        state.instances.push(created.clone());
        state
            .created_instances
            .push((space.guid.clone(), instance.clone()));
        Ok(created)
    }

    async fn create_binding(
        &self,
        instance_guid: &str,
        app_guid: &str,
        _name: &str,
        _parameters: &JsonMap,
    ) -> Result<()> {
        self.state
            .lock()
            .created_bindings
            .push((instance_guid.to_string(), app_guid.to_string()));
        Ok(())
    }

    async fn create_service_key(
        &self,
        instance_guid: &str,
        name: &str,
        _parameters: &JsonMap,
    ) -> Result<ServiceKey> {
        let mut state = self.state.lock();
        let guid = state.next_guid("created-key");
        state
            .created_keys
            .push((instance_guid.to_string(), guid.clone()));
        Ok(ServiceKey {
            guid,
            name: name.to_string(),
        })
    }

    async fn delete_service_key(&self, key_guid: &str) -> Result<()> {
        self.state.lock().deleted_keys.push(key_guid.to_string());
        Ok(())
    }

    async fn create_route_binding(
        &self,
        _space: &Space,
        instance_guid: &str,
        route: &RouteRef,
    ) -> Result<()> {
        self.state
            .lock()
            .created_routes
            .push((instance_guid.to_string(), route.clone()));
        Ok(())
    }
}

/// Hands out the source or target fake depending on the API URL
pub struct FakeCfLoader {
    pub source: Arc<FakeCfClient>,
    pub target: Arc<FakeCfClient>,
    pub loads: AtomicUsize,
}

impl FakeCfLoader {
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CfClientLoader for FakeCfLoader {
    async fn load(
        &self,
        access: &CloudControllerAccess,
        _skip_ssl_validation: bool,
    ) -> Result<Arc<dyn CfClient>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let client: Arc<dyn CfClient> = if access.url.contains("source") {
            self.source.clone()
        } else {
            self.target.clone()
        };
        Ok(client)
    }
}

#[derive(Default)]
pub struct FakeBosh {
    pub environment: String,
    pub all_proxy: Option<String>,
    pub vms: Mutex<HashMap<String, Vec<Vm>>>,
}

impl FakeBosh {
    pub fn add_vm(&self, deployment: &str, job: &str, ip: &str) {
        self.vms
            .lock()
            .entry(deployment.to_string())
            .or_default()
            .push(Vm {
                job: job.to_string(),
                index: Some(0),
                id: format!("{job}-0"),
                ips: vec![ip.to_string()],
            });
    }
}

#[async_trait]
impl BoshClient for FakeBosh {
    async fn find_vms(&self, deployment: &str, job: &str) -> Result<Vec<Vm>> {
        Ok(self
            .vms
            .lock()
            .get(deployment)
            .map(|vms| vms.iter().filter(|vm| vm.job == job).cloned().collect())
            .unwrap_or_default())
    }

    fn environment(&self) -> &str {
        &self.environment
    }

    fn all_proxy(&self) -> Option<&str> {
        self.all_proxy.as_deref()
    }

    fn cli_env(&self) -> Vec<(String, String)> {
        vec![("BOSH_ENVIRONMENT".to_string(), self.environment.clone())]
    }
}

/// Builds a fake director per side and remembers the access it was given
#[derive(Default)]
pub struct FakeBoshBuilder {
    pub source: Arc<FakeBosh>,
    pub target: Arc<FakeBosh>,
    pub builds: AtomicUsize,
    pub proxies: Mutex<Vec<Option<String>>>,
}

impl FakeBoshBuilder {
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoshClientBuilder for FakeBoshBuilder {
    async fn build(&self, access: &BoshAccess, _skip_ssl_validation: bool) -> Result<Arc<dyn BoshClient>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.proxies.lock().push(access.all_proxy.clone());
        let client: Arc<dyn BoshClient> = if access.url.contains("source") {
            self.source.clone()
        } else {
            self.target.clone()
        };
        Ok(client)
    }
}

#[derive(Default)]
pub struct FakeOpsMan {
    pub properties: HashMap<String, Value>,
    pub credentials: HashMap<String, Credential>,
}

impl FakeOpsMan {
    /// A cf product on an internal CCDB
    pub fn with_cf() -> Self {
        let mut properties = HashMap::new();
        properties.insert(".properties.system_database".to_string(), Value::from("internal"));
        properties.insert(
            ".cloud_controller.system_domain".to_string(),
            Value::from("sys.example.com"),
        );
        let mut credentials = HashMap::new();
        credentials.insert(
            ".cloud_controller.db_credentials".to_string(),
            Credential {
                identity: "ccdb-user".to_string(),
                password: "ccdb-pass".to_string(),
            },
        );
        credentials.insert(
            ".cloud_controller.encrypt_key".to_string(),
            Credential {
                identity: String::new(),
                password: "encrypt-me".to_string(),
            },
        );
        credentials.insert(
            ".uaa.admin_client_credentials".to_string(),
            Credential {
                identity: "admin".to_string(),
                password: "admin-secret".to_string(),
            },
        );
        Self {
            properties,
            credentials,
        }
    }
}

#[async_trait]
impl OpsManClient for FakeOpsMan {
    async fn deployed_products(&self) -> Result<Vec<DeployedProduct>> {
        Ok(vec![DeployedProduct {
            installation_name: "cf-0123".to_string(),
            product_type: "cf".to_string(),
        }])
    }

    async fn product_credential(&self, _product_guid: &str, reference: &str) -> Result<Credential> {
        self.credentials
            .get(reference)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                kind: "credential",
                name: reference.to_string(),
            })
    }

    async fn product_properties(&self, _product_guid: &str) -> Result<HashMap<String, Value>> {
        Ok(self.properties.clone())
    }

    async fn director_credentials(&self) -> Result<DirectorCredentials> {
        Ok(DirectorCredentials {
            client: "ops_manager".to_string(),
            client_secret: "director-secret".to_string(),
            environment: "10.0.0.5".to_string(),
        })
    }
}

pub struct FakeOpsManBuilder {
    pub client: Arc<FakeOpsMan>,
    pub builds: AtomicUsize,
}

impl Default for FakeOpsManBuilder {
    fn default() -> Self {
        Self {
            client: Arc::new(FakeOpsMan::with_cf()),
            builds: AtomicUsize::new(0),
        }
    }
}

impl FakeOpsManBuilder {
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OpsManClientBuilder for FakeOpsManBuilder {
    async fn build(&self, _foundation: &Foundation) -> Result<Arc<dyn OpsManClient>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let client: Arc<dyn OpsManClient> = self.client.clone();
        Ok(client)
    }
}

/// Records every command; fills stdout files with `output`
#[derive(Default)]
pub struct RecordingExecutor {
    pub commands: Mutex<Vec<CommandSpec>>,
    pub output: Mutex<String>,
    pub fail_with: Mutex<Option<i32>>,
}

impl RecordingExecutor {
    pub fn with_output(output: &str) -> Arc<Self> {
        let executor = Self::default();
        *executor.output.lock() = output.to_string();
        Arc::new(executor)
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> std::result::Result<CommandOutput, ExecutorError> {
        self.commands.lock().push(spec.clone());
        if cancel.is_cancelled() {
            return Err(ExecutorError::Cancelled {
                program: spec.program.clone(),
            });
        }
        if let Some(exit_code) = *self.fail_with.lock() {
            return Err(ExecutorError::Failed {
                program: spec.program.clone(),
                exit_code,
                stderr: "access denied".to_string(),
            });
        }

        let output = self.output.lock().clone();
        if let Some(path) = &spec.stdout_file {
            std::fs::write(path, &output)?;
            return Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        Ok(CommandOutput {
            exit_code: 0,
            stdout: output,
            stderr: String::new(),
        })
    }
}

/// A fully wired set of fakes
pub struct Harness {
    pub source: Arc<FakeCfClient>,
    pub target: Arc<FakeCfClient>,
    pub loader: Arc<FakeCfLoader>,
    pub bosh: Arc<FakeBoshBuilder>,
    pub opsman: Arc<FakeOpsManBuilder>,
    pub executor: Arc<RecordingExecutor>,
    pub clients: Arc<ClientHolder>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_foundations(Foundations {
            source: foundation("source"),
            target: foundation("target"),
        })
    }

    pub fn with_foundations(foundations: Foundations) -> Self {
        let source = FakeCfClient::new();
        let target = FakeCfClient::new();
        let loader = Arc::new(FakeCfLoader {
            source: source.clone(),
            target: target.clone(),
            loads: AtomicUsize::new(0),
        });
        let bosh = Arc::new(FakeBoshBuilder::default());
        let opsman = Arc::new(FakeOpsManBuilder::default());
        let clients = Arc::new(ClientHolder::new(
            loader.clone(),
            bosh.clone(),
            opsman.clone(),
            foundations,
        ));
        Self {
            source,
            target,
            loader,
            bosh,
            opsman,
            executor: Arc::new(RecordingExecutor::default()),
            clients,
        }
    }

    pub fn registry(&self, definition: &MigrationDefinition, options: RecreateOptions) -> Arc<StrategyRegistry> {
        let recreator = Arc::new(ServiceRecreator::new(self.clients.clone(), options));
        let registry = StrategyRegistry::new(
            definition,
            StrategyDeps {
                clients: self.clients.clone(),
                executor: self.executor.clone(),
                recreator,
            },
        )
        .expect("valid migration definition");
        Arc::new(registry)
    }

    pub fn default_registry(&self) -> Arc<StrategyRegistry> {
        self.registry(&MigrationDefinition::default(), RecreateOptions::default())
    }
}

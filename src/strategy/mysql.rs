//! MySQL instances: logical dump on the source VM, restore on the target VM

use crate::clients::cf::{ServiceInstance, Space};
use crate::clients::{BoshClient, ClientHolder, Vm};
use crate::config::ConfigError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::layout::{FileDescriptor, LayoutError, ServiceManifest};
use crate::strategy::{
    CommandTemplates, InstanceScope, MySqlSettings, Result, ServiceRecreator, Strategy,
    StrategyError,
};
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const DUMP_EXTENSION: &str = "sql";
const CHECKSUM_EXTENSION: &str = "sha256";

#[derive(Serialize)]
struct VmContext<'a> {
    deployment: &'a str,
    /// `job/id`, as the bosh CLI expects it
    instance: String,
    vm_id: &'a str,
    address: &'a str,
    instance_guid: &'a str,
    instance_name: &'a str,
    artifact: String,
}

pub struct MySqlStrategy {
    settings: MySqlSettings,
    templates: CommandTemplates,
    clients: Arc<ClientHolder>,
    executor: Arc<dyn CommandExecutor>,
    recreator: Arc<ServiceRecreator>,
}

impl MySqlStrategy {
    pub fn new(
        offering: &str,
        settings: MySqlSettings,
        clients: Arc<ClientHolder>,
        executor: Arc<dyn CommandExecutor>,
        recreator: Arc<ServiceRecreator>,
    ) -> std::result::Result<Self, ConfigError> {
        let templates = CommandTemplates::new(
            offering,
            &[
                ("backup", settings.backup_command.as_str()),
                ("restore", settings.restore_command.as_str()),
            ],
        )?;
        Ok(Self {
            settings,
            templates,
            clients,
            executor,
            recreator,
        })
    }

    pub fn settings(&self) -> &MySqlSettings {
        &self.settings
    }

    async fn locate_vm(&self, bosh: &dyn BoshClient, instance_guid: &str) -> Result<(String, Vm)> {
        let deployment = format!("{}{}", self.settings.deployment_prefix, instance_guid);
        let vm = bosh
            .find_vms(&deployment, &self.settings.instance_group)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StrategyError::NoVms {
                deployment: deployment.clone(),
                job: self.settings.instance_group.clone(),
            })?;
        Ok((deployment, vm))
    }

    async fn run(
        &self,
        template: &str,
        bosh: &dyn BoshClient,
        vm_context: &VmContext<'_>,
        scope: &InstanceScope,
        stdin: Option<&Path>,
        stdout: Option<&Path>,
    ) -> Result<()> {
        let line = self.templates.render(template, vm_context)?;
        let mut spec = CommandSpec::parse(&line)?.envs(bosh.cli_env());
        if let Some(path) = stdin {
            spec = spec.stdin_from(path);
        }
        if let Some(path) = stdout {
            spec = spec.stdout_to(path);
        }
        self.executor.execute(&spec, &scope.cancel).await?;
        Ok(())
    }
}

#[async_trait]
impl Strategy for MySqlStrategy {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn export(&self, scope: &InstanceScope, instance: &ServiceInstance) -> Result<()> {
        let manifest = self.recreator.build_manifest(instance).await?;

        let bosh = self.clients.source_bosh_client().await?;
        let (deployment, vm) = self.locate_vm(bosh.as_ref(), &instance.guid).await?;

        let dump = scope.descriptor(&instance.name, DUMP_EXTENSION);
        let dump_path = dump.path();
        std::fs::create_dir_all(dump.dir()).map_err(|e| LayoutError::io(&dump.dir(), e))?;

        info!("Dumping {} from {}", instance.name, vm.instance());
        let context = VmContext {
            deployment: &deployment,
            instance: vm.instance(),
            vm_id: &vm.id,
            address: vm.ips.first().map(String::as_str).unwrap_or_default(),
            instance_guid: &instance.guid,
            instance_name: &instance.name,
            artifact: dump_path.display().to_string(),
        };
        self.run("backup", bosh.as_ref(), &context, scope, None, Some(&dump_path))
            .await?;

        let checksum = file_checksum(&dump_path)?;
        dump.with_extension(CHECKSUM_EXTENSION)
            .write_string(&checksum)?;
        debug!("Dump of {} has checksum {}", instance.name, checksum);

        self.recreator.write_manifest(scope, &manifest)?;
        Ok(())
    }

    async fn import(
        &self,
        scope: &InstanceScope,
        space: &Space,
        manifest: &ServiceManifest,
    ) -> Result<()> {
        let dump = scope.descriptor(&manifest.name, DUMP_EXTENSION);
        verify_dump(&dump)?;

        let instance = self.recreator.recreate(space, manifest).await?;

        let bosh = self.clients.target_bosh_client().await?;
        let (deployment, vm) = self.locate_vm(bosh.as_ref(), &instance.guid).await?;

        info!("Restoring {} into {}", manifest.name, vm.instance());
        let dump_path = dump.path();
        let context = VmContext {
            deployment: &deployment,
            instance: vm.instance(),
            vm_id: &vm.id,
            address: vm.ips.first().map(String::as_str).unwrap_or_default(),
            instance_guid: &instance.guid,
            instance_name: &instance.name,
            artifact: dump_path.display().to_string(),
        };
        self.run("restore", bosh.as_ref(), &context, scope, Some(&dump_path), None)
            .await
    }
}

fn file_checksum(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| LayoutError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| LayoutError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// The dump must exist, and match its checksum when one was written
fn verify_dump(dump: &FileDescriptor) -> Result<()> {
    let path = dump.path();
    if !dump.exists() {
        return Err(StrategyError::MissingArtifact {
            path: path.display().to_string(),
        });
    }

    let sidecar = dump.with_extension(CHECKSUM_EXTENSION);
    if !sidecar.exists() {
        return Ok(());
    }
    let expected = sidecar.read_to_string()?.trim().to_string();
    let actual = file_checksum(&path)?;
    if expected != actual {
        return Err(StrategyError::ChecksumMismatch {
            path: path.display().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

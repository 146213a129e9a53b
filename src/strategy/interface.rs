use crate::clients::cf::{ServiceInstance, Space};
use crate::layout::{FileDescriptor, ServiceManifest};
use crate::strategy::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Where one instance lives, both in the foundation and on disk
#[derive(Debug, Clone)]
pub struct InstanceScope {
    pub org: String,
    pub space: String,
    pub base_dir: PathBuf,
    pub cancel: CancellationToken,
}

impl InstanceScope {
    pub fn new(org: &str, space: &str, base_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            org: org.to_string(),
            space: space.to_string(),
            base_dir,
            cancel,
        }
    }

    pub fn descriptor(&self, name: &str, extension: &str) -> FileDescriptor {
        FileDescriptor::new(&self.base_dir, &self.org, &self.space, name, extension)
    }
}

/// Moves one kind of service instance between foundations.
///
/// Implementations hold no per-instance state and are shared across
/// concurrent migrations.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Export from the source foundation into `scope.base_dir/org/space`.
    /// Always writes the instance manifest.
    async fn export(&self, scope: &InstanceScope, instance: &ServiceInstance) -> Result<()>;

    /// Recreate on the target foundation inside `space`.
    async fn import(
        &self,
        scope: &InstanceScope,
        space: &Space,
        manifest: &ServiceManifest,
    ) -> Result<()>;
}

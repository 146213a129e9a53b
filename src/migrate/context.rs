use crate::migrate::{MigrateError, OrgFilter, Result, Summary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub filter: OrgFilter,
    /// Offerings allowed through, all when empty
    pub services: Vec<String>,
    /// Instance names allowed through, all when empty
    pub instances: Vec<String>,
    pub dry_run: bool,
    pub debug: bool,
    pub parallelism: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            filter: OrgFilter::default(),
            services: Vec::new(),
            instances: Vec::new(),
            dry_run: false,
            debug: false,
            parallelism: 1,
        }
    }
}

/// Run-scoped state passed by reference through the walkers and the mover
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub options: MigrationOptions,
    pub summary: Arc<Summary>,
    pub cancel: CancellationToken,
}

impl MigrationContext {
    pub fn new(options: MigrationOptions) -> Self {
        Self {
            options,
            summary: Arc::new(Summary::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        Ok(())
    }
}

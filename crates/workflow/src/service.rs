use std::sync::Arc;

use monalisa_storage::{BlobStore, CaseStore, Notifier};

use crate::clock::{Clock, SystemClock};
use crate::config::WorkflowConfig;

/// The case workflow service.
///
/// Holds the collaborators and nothing else: every call reads the case
/// fresh from the store and ends with at most one guarded update, so one
/// instance can serve any number of concurrent callers.
#[derive(Clone)]
pub struct LitmasWorkflow {
    pub(crate) store: Arc<dyn CaseStore>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: WorkflowConfig,
}

impl LitmasWorkflow {
    pub fn new(
        store: Arc<dyn CaseStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        LitmasWorkflow {
            store,
            blobs,
            notifier,
            clock: Arc::new(SystemClock::default()),
            config: WorkflowConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn CaseStore> {
        &self.store
    }

    pub fn config(&self) -> WorkflowConfig {
        self.config
    }
}

use serde::{Deserialize, Serialize};

/// Product switches for the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Notify the verifier again when a revised report is resubmitted.
    /// First submissions always notify.
    #[serde(default)]
    pub notify_on_resubmission: bool,
}

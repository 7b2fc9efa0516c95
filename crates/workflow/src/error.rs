use monalisa_core::{ActorId, TransitionError};
use monalisa_storage::{BlobError, StorageError};

/// Everything a workflow call can fail with.
///
/// `Validation` and `Transition` are raised before any write. `Upload`
/// means nothing was written. `Persistence` means the blob (if any) landed
/// but the case row did not change.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Missing or malformed input, reported before any remote call.
    #[error("{message}")]
    Validation { message: String },

    /// The action is not legal from the case's current state, or the actor
    /// may not take it.
    #[error(transparent)]
    Transition(TransitionError),

    /// The operation is reserved for other roles.
    #[error("{actor} may not {operation}")]
    NotAuthorized {
        actor: ActorId,
        operation: &'static str,
    },

    #[error("document upload failed: {source}")]
    Upload { source: BlobError },

    /// The guarded update was rejected or failed.
    #[error("case update failed: {source}{}", orphan_note(.orphaned_blob))]
    Persistence {
        source: StorageError,
        /// Path uploaded before the failed update; nothing references it.
        orphaned_blob: Option<String>,
    },

    /// A lookup failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn orphan_note(orphaned_blob: &Option<String>) -> String {
    match orphaned_blob {
        Some(path) => format!(" (uploaded document left at {})", path),
        None => String::new(),
    }
}

impl WorkflowError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation { .. })
    }

    /// The uploaded path nothing points at, when the update failed after
    /// the upload.
    pub fn orphaned_blob(&self) -> Option<&str> {
        match self {
            WorkflowError::Persistence { orphaned_blob, .. } => orphaned_blob.as_deref(),
            _ => None,
        }
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(err: TransitionError) -> Self {
        if err.is_validation() {
            WorkflowError::validation(err.to_string())
        } else {
            WorkflowError::Transition(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monalisa_core::{Action, LitmasStatus};

    #[test]
    fn missing_inputs_become_validation_errors() {
        let err: WorkflowError = TransitionError::MissingVerifier { case_id: 3 }.into();
        assert!(err.is_validation());

        let err: WorkflowError = TransitionError::InvalidState {
            case_id: 3,
            action: Action::Approve,
            current: LitmasStatus::Approved,
        }
        .into();
        assert!(matches!(err, WorkflowError::Transition(_)));
    }

    #[test]
    fn persistence_error_names_orphaned_blob() {
        let err = WorkflowError::Persistence {
            source: StorageError::Backend("connection reset".into()),
            orphaned_blob: Some("hasil-litmas/3_1000.pdf".into()),
        };
        assert_eq!(err.orphaned_blob(), Some("hasil-litmas/3_1000.pdf"));
        assert!(err.to_string().contains("hasil-litmas/3_1000.pdf"));
    }
}

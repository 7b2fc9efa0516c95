use monalisa_core::model::{KlienId, LitmasId, PenjaminId, TppScheduleId};
use monalisa_core::{ActorId, LitmasStatus};

/// All errors that can be returned by a CaseStore implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The row no longer satisfies the update guard: another actor moved
    /// the case or assigned a verifier first.
    #[error(
        "concurrent conflict on litmas {litmas_id}: expected {expected}, found '{actual}' (verifier assigned: {anev_already_assigned})"
    )]
    ConcurrentConflict {
        litmas_id: LitmasId,
        expected: String,
        actual: LitmasStatus,
        anev_already_assigned: bool,
    },

    #[error("litmas not found: {0}")]
    CaseNotFound(LitmasId),

    #[error("klien not found: {0}")]
    KlienNotFound(KlienId),

    #[error("penjamin not found: {0}")]
    PenjaminNotFound(PenjaminId),

    #[error("user not found: {0}")]
    UserNotFound(ActorId),

    #[error("TPP schedule not found: {0}")]
    ScheduleNotFound(TppScheduleId),

    /// A referential or uniqueness constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A backend-specific storage error (connection, serialization, IO, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from a BlobStore.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    #[error("object already exists: {bucket}/{path}")]
    AlreadyExists { bucket: String, path: String },

    #[error("object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    #[error("upload rejected for {path}: {message}")]
    Rejected { path: String, message: String },

    #[error("blob backend error: {0}")]
    Backend(String),
}

/// Errors from a Notifier. Never fatal to a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier not configured")]
    NotConfigured,

    #[error("verifier {0} has no phone number on record")]
    NoRecipient(ActorId),

    #[error("notification failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("no signed-in user")]
    Anonymous,

    #[error("unknown user: {0}")]
    UnknownUser(ActorId),

    #[error("identity lookup failed: {0}")]
    Backend(String),
}

//! monalisa-workflow -- runs litmas lifecycle actions against the
//! collaborators.
//!
//! The lifecycle rules live in `monalisa-core`; this crate adds the IO:
//! reading the case, uploading documents, the guarded update, and the
//! verifier notification. It also carries case registration, caseworker
//! reassignment and the read-side views.

pub mod clock;
pub mod config;
pub mod error;
pub mod query;
pub mod registration;
pub mod service;
pub mod transition;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WorkflowConfig;
pub use error::WorkflowError;
pub use query::{CaseDetail, StatusCount, StatusSummary};
pub use registration::{CaseRegistration, KlienInput, RegisteredCase, MIN_NAME_QUERY};
pub use service::LitmasWorkflow;
pub use transition::{DocumentUpload, NotificationOutcome, TransitionReport};

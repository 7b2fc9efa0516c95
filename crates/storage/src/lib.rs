//! Collaborator contracts for the MONALISA workflow.
//!
//! The workflow never talks to a database, bucket or messaging gateway
//! directly. It goes through four traits:
//!
//! - [`CaseStore`] -- table-oriented data store with guarded updates
//! - [`BlobStore`] -- path-addressed document storage
//! - [`Notifier`] -- best-effort outbound message to a verifier
//! - [`IdentityProvider`] -- resolves the calling actor
//!
//! [`memory`] holds reference implementations, and [`conformance`] a
//! backend-agnostic suite any `CaseStore` can run.

pub mod conformance;
mod error;
mod identity;
pub mod memory;
mod record;
mod traits;

pub use error::{BlobError, IdentityError, NotifyError, StorageError};
pub use identity::{StaticIdentity, StoreIdentity};
pub use memory::{MemoryBlobStore, MemoryNotifier, MemoryStore, StoreState};
pub use record::{CaseFilter, KlienQuery, VerifierNotification};
pub use traits::{BlobStore, CaseStore, IdentityProvider, Notifier};

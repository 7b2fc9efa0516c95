use async_trait::async_trait;
use time::Date;

use monalisa_core::model::{KlienId, LitmasId, PenjaminId, TppScheduleId};
use monalisa_core::{
    Actor, ActorId, CasePatch, Klien, Litmas, NewKlien, NewLitmas, NewPenjamin, NewPerkara,
    NewTppSchedule, Penjamin, Perkara, Role, TppSchedule, UpdateGuard, UserProfile,
};

use crate::error::{BlobError, IdentityError, NotifyError, StorageError};
use crate::record::{CaseFilter, KlienQuery, VerifierNotification};

/// The data store behind the MONALISA workflow.
///
/// Each method is one statement against the backend. Statements are
/// independently durable once acknowledged; no method spans a transaction
/// and the workflow does not rely on multi-statement atomicity.
///
/// ## Guarded updates
///
/// `update_case` is the only way a case row changes after insert. The
/// [`UpdateGuard`] is checked against the row at write time
/// (`UPDATE ... WHERE id = $1 AND status IS NOT DISTINCT FROM $2
/// [AND assigned_anev_id IS NULL]`). If the guard does not hold the method
/// returns `Err(StorageError::ConcurrentConflict)` and writes nothing.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so one store can be
/// shared across async tasks.
#[async_trait]
pub trait CaseStore: Send + Sync + 'static {
    // ── Cases ────────────────────────────────────────────────────────────────

    /// Point lookup by case id.
    ///
    /// Returns `Err(StorageError::CaseNotFound)` if there is no such case.
    async fn get_case(&self, id: LitmasId) -> Result<Litmas, StorageError>;

    /// Cases matching every set field of `filter`, newest first.
    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Litmas>, StorageError>;

    /// Insert a case row. The store assigns the id; status starts at
    /// `New Task`.
    ///
    /// Fails with `Constraint` if the client, guarantor or caseworker do
    /// not exist, or the guarantor belongs to another client.
    async fn insert_case(&self, case: NewLitmas) -> Result<Litmas, StorageError>;

    /// Apply `patch` to case `id` if `guard` holds. Returns the updated row.
    async fn update_case(
        &self,
        id: LitmasId,
        guard: &UpdateGuard,
        patch: &CasePatch,
    ) -> Result<Litmas, StorageError>;

    // ── Charges ──────────────────────────────────────────────────────────────

    /// Insert charges for a case. Fails with `CaseNotFound` for an unknown case.
    async fn insert_perkara(
        &self,
        litmas_id: LitmasId,
        perkara: Vec<NewPerkara>,
    ) -> Result<Vec<Perkara>, StorageError>;

    async fn list_perkara(&self, litmas_id: LitmasId) -> Result<Vec<Perkara>, StorageError>;

    // ── Clients and guarantors ───────────────────────────────────────────────

    /// Fails with `Constraint` when another client already has the same NIK.
    async fn insert_klien(&self, klien: NewKlien) -> Result<Klien, StorageError>;

    async fn get_klien(&self, id: KlienId) -> Result<Klien, StorageError>;

    /// Clients whose name contains `query.nama` (case-insensitive) or whose
    /// NIK equals `query.nik`, ordered by name.
    async fn search_klien(&self, query: &KlienQuery) -> Result<Vec<Klien>, StorageError>;

    async fn insert_penjamin(
        &self,
        klien_id: KlienId,
        penjamin: NewPenjamin,
    ) -> Result<Penjamin, StorageError>;

    async fn get_penjamin(&self, id: PenjaminId) -> Result<Penjamin, StorageError>;

    // ── Users ────────────────────────────────────────────────────────────────

    /// Insert or replace a user row (profile and role set).
    async fn upsert_user(&self, user: UserProfile) -> Result<(), StorageError>;

    async fn get_user(&self, id: &ActorId) -> Result<UserProfile, StorageError>;

    async fn list_users_with_role(&self, role: &Role) -> Result<Vec<UserProfile>, StorageError>;

    // ── TPP sitting slots ────────────────────────────────────────────────────

    async fn insert_tpp_schedule(
        &self,
        schedule: NewTppSchedule,
    ) -> Result<TppSchedule, StorageError>;

    async fn get_tpp_schedule(&self, id: TppScheduleId) -> Result<TppSchedule, StorageError>;

    /// Open slots dated on or after `from`, earliest first.
    async fn list_open_tpp_schedules(&self, from: Date) -> Result<Vec<TppSchedule>, StorageError>;
}

/// Path-addressed document storage.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `bytes` at `bucket/path`. Returns the stored path.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, BlobError>;

    /// A URL the caller can retrieve the object from.
    async fn resolve_url(&self, bucket: &str, path: &str) -> Result<String, BlobError>;
}

/// Outbound message to a verifier. Fire and forget: callers log failures
/// and carry on.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, notification: &VerifierNotification) -> Result<(), NotifyError>;
}

/// Resolves who is calling.
///
/// Only used to pick the action set and "my cases" filters. Authorization
/// proper is the data store's access policy.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn current_actor(&self) -> Result<Actor, IdentityError>;
}

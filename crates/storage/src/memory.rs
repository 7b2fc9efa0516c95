//! In-memory reference backends.
//!
//! [`MemoryStore`] keeps every table in one [`StoreState`] behind an async
//! lock, so each trait method is a single atomic statement. The state is
//! serializable, which lets a caller persist it as a JSON document between
//! runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;
use tokio::sync::RwLock;

use monalisa_core::model::{KlienId, LitmasId, PenjaminId, TppScheduleId};
use monalisa_core::{
    ActorId, CasePatch, Klien, Litmas, NewKlien, NewLitmas, NewPenjamin, NewPerkara,
    NewTppSchedule, Penjamin, Perkara, Role, TppSchedule, UpdateGuard, UserProfile,
};

use crate::error::{BlobError, NotifyError, StorageError};
use crate::record::{CaseFilter, KlienQuery, VerifierNotification};
use crate::traits::{BlobStore, CaseStore, Notifier};

// ──────────────────────────────────────────────
// MemoryStore
// ──────────────────────────────────────────────

/// Every table plus its id sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub sequences: Sequences,
    #[serde(default)]
    pub litmas: BTreeMap<LitmasId, Litmas>,
    #[serde(default)]
    pub perkara: Vec<Perkara>,
    #[serde(default)]
    pub klien: BTreeMap<KlienId, Klien>,
    #[serde(default)]
    pub penjamin: BTreeMap<PenjaminId, Penjamin>,
    #[serde(default)]
    pub users: BTreeMap<ActorId, UserProfile>,
    #[serde(default)]
    pub tpp_schedules: BTreeMap<TppScheduleId, TppSchedule>,
}

/// Last id handed out per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub litmas: i64,
    pub perkara: i64,
    pub klien: i64,
    pub penjamin: i64,
    pub tpp_schedules: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        MemoryStore {
            state: RwLock::new(state),
        }
    }

    /// A copy of every table.
    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn get_case(&self, id: LitmasId) -> Result<Litmas, StorageError> {
        let state = self.state.read().await;
        state
            .litmas
            .get(&id)
            .cloned()
            .ok_or(StorageError::CaseNotFound(id))
    }

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Litmas>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .litmas
            .values()
            .rev()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn insert_case(&self, case: NewLitmas) -> Result<Litmas, StorageError> {
        let mut state = self.state.write().await;
        if !state.klien.contains_key(&case.klien_id) {
            return Err(StorageError::Constraint(format!(
                "litmas.klien_id references unknown klien {}",
                case.klien_id
            )));
        }
        if let Some(penjamin_id) = case.penjamin_id {
            match state.penjamin.get(&penjamin_id) {
                Some(p) if p.klien_id == case.klien_id => {}
                Some(p) => {
                    return Err(StorageError::Constraint(format!(
                        "penjamin {} belongs to klien {}, not {}",
                        penjamin_id, p.klien_id, case.klien_id
                    )))
                }
                None => {
                    return Err(StorageError::Constraint(format!(
                        "litmas.penjamin_id references unknown penjamin {}",
                        penjamin_id
                    )))
                }
            }
        }
        if !state.users.contains_key(&case.assigned_pk_id) {
            return Err(StorageError::Constraint(format!(
                "litmas.assigned_pk_id references unknown user {}",
                case.assigned_pk_id
            )));
        }
        let id = next(&mut state.sequences.litmas);
        let row = case.with_id(id);
        state.litmas.insert(id, row.clone());
        Ok(row)
    }

    async fn update_case(
        &self,
        id: LitmasId,
        guard: &UpdateGuard,
        patch: &CasePatch,
    ) -> Result<Litmas, StorageError> {
        let mut state = self.state.write().await;
        if let Some(pk) = &patch.assigned_pk_id {
            if !state.users.contains_key(pk) {
                return Err(StorageError::Constraint(format!(
                    "litmas.assigned_pk_id references unknown user {}",
                    pk
                )));
            }
        }
        if let Some(slot) = patch.tpp_schedule_id {
            if !state.tpp_schedules.contains_key(&slot) {
                return Err(StorageError::Constraint(format!(
                    "litmas.tpp_schedule_id references unknown schedule {}",
                    slot
                )));
            }
        }
        let row = state
            .litmas
            .get_mut(&id)
            .ok_or(StorageError::CaseNotFound(id))?;
        if !guard.admits(row) {
            return Err(StorageError::ConcurrentConflict {
                litmas_id: id,
                expected: describe_guard(guard),
                actual: row.status,
                anev_already_assigned: row.assigned_anev_id.is_some(),
            });
        }
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn insert_perkara(
        &self,
        litmas_id: LitmasId,
        perkara: Vec<NewPerkara>,
    ) -> Result<Vec<Perkara>, StorageError> {
        let mut state = self.state.write().await;
        if !state.litmas.contains_key(&litmas_id) {
            return Err(StorageError::CaseNotFound(litmas_id));
        }
        let mut inserted = Vec::with_capacity(perkara.len());
        for p in perkara {
            let id = next(&mut state.sequences.perkara);
            let row = p.with_ids(id, litmas_id);
            state.perkara.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn list_perkara(&self, litmas_id: LitmasId) -> Result<Vec<Perkara>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .perkara
            .iter()
            .filter(|p| p.litmas_id == litmas_id)
            .cloned()
            .collect())
    }

    async fn insert_klien(&self, klien: NewKlien) -> Result<Klien, StorageError> {
        let mut state = self.state.write().await;
        if let Some(nik) = klien.nik.as_deref().filter(|n| !n.is_empty()) {
            if state.klien.values().any(|k| k.nik.as_deref() == Some(nik)) {
                return Err(StorageError::Constraint(format!(
                    "klien with NIK {} already exists",
                    nik
                )));
            }
        }
        let id = next(&mut state.sequences.klien);
        let row = klien.with_id(id);
        state.klien.insert(id, row.clone());
        Ok(row)
    }

    async fn get_klien(&self, id: KlienId) -> Result<Klien, StorageError> {
        let state = self.state.read().await;
        state
            .klien
            .get(&id)
            .cloned()
            .ok_or(StorageError::KlienNotFound(id))
    }

    async fn search_klien(&self, query: &KlienQuery) -> Result<Vec<Klien>, StorageError> {
        let state = self.state.read().await;
        let needle = query
            .nama
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());
        let nik = query.nik.as_deref().map(str::trim).filter(|n| !n.is_empty());

        let mut found: Vec<Klien> = state
            .klien
            .values()
            .filter(|k| {
                let by_name = needle
                    .as_deref()
                    .is_some_and(|n| k.nama.to_lowercase().contains(n));
                let by_nik = nik.is_some_and(|n| k.nik.as_deref() == Some(n));
                by_name || by_nik
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.nama.cmp(&b.nama).then(a.id.cmp(&b.id)));
        if query.limit > 0 {
            found.truncate(query.limit);
        }
        Ok(found)
    }

    async fn insert_penjamin(
        &self,
        klien_id: KlienId,
        penjamin: NewPenjamin,
    ) -> Result<Penjamin, StorageError> {
        let mut state = self.state.write().await;
        if !state.klien.contains_key(&klien_id) {
            return Err(StorageError::KlienNotFound(klien_id));
        }
        let id = next(&mut state.sequences.penjamin);
        let row = penjamin.with_ids(id, klien_id);
        state.penjamin.insert(id, row.clone());
        Ok(row)
    }

    async fn get_penjamin(&self, id: PenjaminId) -> Result<Penjamin, StorageError> {
        let state = self.state.read().await;
        state
            .penjamin
            .get(&id)
            .cloned()
            .ok_or(StorageError::PenjaminNotFound(id))
    }

    async fn upsert_user(&self, user: UserProfile) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &ActorId) -> Result<UserProfile, StorageError> {
        let state = self.state.read().await;
        state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::UserNotFound(id.clone()))
    }

    async fn list_users_with_role(&self, role: &Role) -> Result<Vec<UserProfile>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.roles.contains(role))
            .cloned()
            .collect())
    }

    async fn insert_tpp_schedule(
        &self,
        schedule: NewTppSchedule,
    ) -> Result<TppSchedule, StorageError> {
        let mut state = self.state.write().await;
        let id = next(&mut state.sequences.tpp_schedules);
        let row = schedule.with_id(id);
        state.tpp_schedules.insert(id, row.clone());
        Ok(row)
    }

    async fn get_tpp_schedule(&self, id: TppScheduleId) -> Result<TppSchedule, StorageError> {
        let state = self.state.read().await;
        state
            .tpp_schedules
            .get(&id)
            .cloned()
            .ok_or(StorageError::ScheduleNotFound(id))
    }

    async fn list_open_tpp_schedules(&self, from: Date) -> Result<Vec<TppSchedule>, StorageError> {
        let state = self.state.read().await;
        let mut slots: Vec<TppSchedule> = state
            .tpp_schedules
            .values()
            .filter(|s| s.is_bookable(from))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.tanggal_sidang, s.id));
        Ok(slots)
    }
}

fn describe_guard(guard: &UpdateGuard) -> String {
    let status = match guard.expected_status {
        Some(s) => format!("status '{}'", s),
        None => "any status".to_string(),
    };
    if guard.require_anev_unset {
        format!("{} with no verifier", status)
    } else {
        status
    }
}

// ──────────────────────────────────────────────
// MemoryBlobStore
// ──────────────────────────────────────────────

/// Keeps uploaded objects in a map. Paths are write-once.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        MemoryBlobStore::default()
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        let mut objects = self.objects.write().await;
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(BlobError::AlreadyExists {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }
        objects.insert(key, bytes);
        Ok(path.to_string())
    }

    async fn resolve_url(&self, bucket: &str, path: &str) -> Result<String, BlobError> {
        let objects = self.objects.read().await;
        if objects.contains_key(&(bucket.to_string(), path.to_string())) {
            Ok(format!("memory://{}/{}", bucket, path))
        } else {
            Err(BlobError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
        }
    }
}

// ──────────────────────────────────────────────
// MemoryNotifier
// ──────────────────────────────────────────────

/// Records every notification. Can be told to fail every send.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<VerifierNotification>>,
    fail_with: Option<String>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        MemoryNotifier::default()
    }

    /// Every send is recorded as attempted and then fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        MemoryNotifier {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Notifications attempted so far, in order.
    pub fn sent(&self) -> Vec<VerifierNotification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, notification: &VerifierNotification) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        match &self.fail_with {
            Some(message) => Err(NotifyError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}

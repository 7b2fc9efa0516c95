//! Shared fixtures for the workflow integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::macros::{date, datetime};
use time::{Date, Duration};

use monalisa_core::model::{KlienId, LitmasId, PenjaminId, TppScheduleId};
use monalisa_core::{
    Actor, ActorId, CasePatch, KategoriUsia, Klien, Litmas, NewKlien, NewLitmas, NewPenjamin,
    NewPerkara, NewTppSchedule, Penjamin, Perkara, Role, TppSchedule, TppSlotStatus, UpdateGuard,
    UserProfile,
};
use monalisa_storage::{
    BlobError, BlobStore, CaseFilter, CaseStore, KlienQuery, MemoryBlobStore, MemoryNotifier,
    MemoryStore, StorageError,
};
use monalisa_workflow::{CaseRegistration, DocumentUpload, KlienInput, LitmasWorkflow, Clock, ManualClock};

// ──────────────────────────────────────────────
// Actors
// ──────────────────────────────────────────────

pub const ADMIN: &str = "admin-1";
pub const OP_DEWASA: &str = "op-dewasa";
pub const OP_ANAK: &str = "op-anak";
pub const PK: &str = "pk-1";
pub const PK_2: &str = "pk-2";
pub const ANEV: &str = "anev-1";
pub const ANEV_2: &str = "anev-2";
pub const KASIE: &str = "kasie-1";

pub fn actor(id: &str, role: Role) -> Actor {
    Actor::new(id, [role])
}

pub fn pk() -> Actor {
    actor(PK, Role::Pk)
}

pub fn anev() -> Actor {
    actor(ANEV, Role::Anev)
}

pub fn operator() -> Actor {
    actor(OP_DEWASA, Role::OpRegDewasa)
}

fn profile(id: &str, nama: &str, role: Role) -> UserProfile {
    UserProfile {
        id: ActorId::from(id),
        nama: nama.to_string(),
        nip: None,
        no_hp: Some("6281234567890".to_string()),
        roles: [role].into_iter().collect(),
    }
}

// ──────────────────────────────────────────────
// Harness
// ──────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub notifier: Arc<MemoryNotifier>,
    pub clock: Arc<ManualClock>,
    pub workflow: LitmasWorkflow,
    pub open_slot: TppScheduleId,
    pub past_slot: TppScheduleId,
    pub closed_slot: TppScheduleId,
}

pub const START: time::OffsetDateTime = datetime!(2026-01-05 08:00 UTC);
/// Morning of the open slot's sitting.
pub const SITTING_DAY: time::OffsetDateTime = datetime!(2026-02-20 08:00 UTC);

impl Harness {
    pub async fn new() -> Self {
        Self::with_notifier(MemoryNotifier::new()).await
    }

    pub async fn with_notifier(notifier: MemoryNotifier) -> Self {
        let store = Arc::new(FlakyStore::default());
        let blobs = Arc::new(MemoryBlobStore::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(START));

        for (id, nama, role) in [
            (ADMIN, "Admin Bapas", Role::Admin),
            (OP_DEWASA, "Operator Dewasa", Role::OpRegDewasa),
            (OP_ANAK, "Operator Anak", Role::OpRegAnak),
            (PK, "Sari Wulandari", Role::Pk),
            (PK_2, "Agus Pratama", Role::Pk),
            (ANEV, "Dewi Anggraini", Role::Anev),
            (ANEV_2, "Rina Marlina", Role::Anev),
            (KASIE, "Hendra Kasie", Role::Kasie),
        ] {
            store.upsert_user(profile(id, nama, role)).await.unwrap();
        }

        let open_slot = slot(&store, date!(2026 - 02 - 20), TppSlotStatus::Open).await;
        let past_slot = slot(&store, date!(2026 - 01 - 02), TppSlotStatus::Open).await;
        let closed_slot = slot(&store, date!(2026 - 02 - 25), TppSlotStatus::Closed).await;

        let workflow = LitmasWorkflow::new(store.clone(), blobs.clone(), notifier.clone())
            .with_clock(clock.clone());

        Harness {
            store,
            blobs,
            notifier,
            clock,
            workflow,
            open_slot,
            past_slot,
            closed_slot,
        }
    }

    /// Register a Dewasa case for `PK` and return its id.
    pub async fn register(&self) -> LitmasId {
        self.workflow
            .register_case(&operator(), registration("Budi Santoso"))
            .await
            .unwrap()
            .litmas
            .id
    }

    pub fn tick(&self) {
        self.clock.advance(Duration::hours(1));
    }

    /// Move the clock to the open slot's sitting day, unless already past it.
    pub fn reach_sitting_day(&self) {
        if self.clock.now() < SITTING_DAY {
            self.clock.set(SITTING_DAY);
        }
    }

    pub async fn case(&self, id: LitmasId) -> Litmas {
        self.store.get_case(id).await.unwrap()
    }

    /// Drive a case to `status` along the happy path.
    pub async fn advance_to(&self, id: LitmasId, status: monalisa_core::LitmasStatus) {
        use monalisa_core::LitmasStatus::*;
        let steps = [OnProgress, Review, Approved, TppScheduled, Selesai];
        for step in steps {
            if self.case(id).await.status == status {
                return;
            }
            self.tick();
            match step {
                OnProgress => {
                    self.workflow
                        .upload_surat_tugas(&pk(), id, pdf("surat-tugas.pdf"))
                        .await
                        .unwrap();
                }
                Review => {
                    self.workflow
                        .submit_laporan(&pk(), id, pdf("laporan.pdf"), Some(ActorId::from(ANEV)))
                        .await
                        .unwrap();
                }
                Approved => {
                    self.workflow.approve(&anev(), id).await.unwrap();
                }
                TppScheduled => {
                    self.workflow
                        .register_tpp(&pk(), id, self.open_slot)
                        .await
                        .unwrap();
                }
                Selesai => {
                    self.reach_sitting_day();
                    self.workflow.mark_complete(&pk(), id).await.unwrap();
                }
                _ => unreachable!(),
            }
        }
    }
}

async fn slot(store: &FlakyStore, tanggal_sidang: Date, status: TppSlotStatus) -> TppScheduleId {
    store
        .insert_tpp_schedule(NewTppSchedule {
            tanggal_sidang,
            status,
            keterangan: None,
        })
        .await
        .unwrap()
        .id
}

pub fn pdf(name: &str) -> DocumentUpload {
    DocumentUpload::new(name, b"%PDF-1.7 test".to_vec())
}

pub fn new_klien(nama: &str, kategori_usia: KategoriUsia) -> NewKlien {
    NewKlien {
        nama: nama.to_string(),
        nik: None,
        jenis_kelamin: Some("L".to_string()),
        tempat_lahir: Some("Bandung".to_string()),
        tanggal_lahir: Some(date!(1990 - 04 - 12)),
        alamat: Some("Jl. Merdeka 10".to_string()),
        kategori_usia,
    }
}

pub fn charge() -> NewPerkara {
    NewPerkara {
        pasal: "362 KUHP".to_string(),
        tindak_pidana: "Pencurian".to_string(),
        vonis_bulan: Some(18),
        denda: None,
        subsider_bulan: None,
        tanggal_penahanan: Some(date!(2025 - 03 - 01)),
        tanggal_ekspirasi: None,
    }
}

pub fn registration(nama: &str) -> CaseRegistration {
    CaseRegistration {
        klien: KlienInput::New(new_klien(nama, KategoriUsia::Dewasa)),
        penjamin: Some(NewPenjamin {
            nama: "Siti Aminah".to_string(),
            hubungan: Some("Ibu".to_string()),
            no_hp: Some("6281298765432".to_string()),
            alamat: None,
        }),
        perkara: vec![charge()],
        jenis_litmas: "PB".to_string(),
        assigned_pk_id: ActorId::from(PK),
    }
}

// ──────────────────────────────────────────────
// Failing collaborators
// ──────────────────────────────────────────────

/// A memory store whose case updates can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_updates: AtomicBool,
}

impl FlakyStore {
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaseStore for FlakyStore {
    async fn get_case(&self, id: LitmasId) -> Result<Litmas, StorageError> {
        self.inner.get_case(id).await
    }

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Litmas>, StorageError> {
        self.inner.list_cases(filter).await
    }

    async fn insert_case(&self, case: NewLitmas) -> Result<Litmas, StorageError> {
        self.inner.insert_case(case).await
    }

    async fn update_case(
        &self,
        id: LitmasId,
        guard: &UpdateGuard,
        patch: &CasePatch,
    ) -> Result<Litmas, StorageError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("connection reset".to_string()));
        }
        self.inner.update_case(id, guard, patch).await
    }

    async fn insert_perkara(
        &self,
        litmas_id: LitmasId,
        perkara: Vec<NewPerkara>,
    ) -> Result<Vec<Perkara>, StorageError> {
        self.inner.insert_perkara(litmas_id, perkara).await
    }

    async fn list_perkara(&self, litmas_id: LitmasId) -> Result<Vec<Perkara>, StorageError> {
        self.inner.list_perkara(litmas_id).await
    }

    async fn insert_klien(&self, klien: NewKlien) -> Result<Klien, StorageError> {
        self.inner.insert_klien(klien).await
    }

    async fn get_klien(&self, id: KlienId) -> Result<Klien, StorageError> {
        self.inner.get_klien(id).await
    }

    async fn search_klien(&self, query: &KlienQuery) -> Result<Vec<Klien>, StorageError> {
        self.inner.search_klien(query).await
    }

    async fn insert_penjamin(
        &self,
        klien_id: KlienId,
        penjamin: NewPenjamin,
    ) -> Result<Penjamin, StorageError> {
        self.inner.insert_penjamin(klien_id, penjamin).await
    }

    async fn get_penjamin(&self, id: PenjaminId) -> Result<Penjamin, StorageError> {
        self.inner.get_penjamin(id).await
    }

    async fn upsert_user(&self, user: UserProfile) -> Result<(), StorageError> {
        self.inner.upsert_user(user).await
    }

    async fn get_user(&self, id: &ActorId) -> Result<UserProfile, StorageError> {
        self.inner.get_user(id).await
    }

    async fn list_users_with_role(&self, role: &Role) -> Result<Vec<UserProfile>, StorageError> {
        self.inner.list_users_with_role(role).await
    }

    async fn insert_tpp_schedule(
        &self,
        schedule: NewTppSchedule,
    ) -> Result<TppSchedule, StorageError> {
        self.inner.insert_tpp_schedule(schedule).await
    }

    async fn get_tpp_schedule(&self, id: TppScheduleId) -> Result<TppSchedule, StorageError> {
        self.inner.get_tpp_schedule(id).await
    }

    async fn list_open_tpp_schedules(&self, from: Date) -> Result<Vec<TppSchedule>, StorageError> {
        self.inner.list_open_tpp_schedules(from).await
    }
}

/// Rejects every upload.
pub struct RejectingBlobStore;

#[async_trait]
impl BlobStore for RejectingBlobStore {
    async fn upload(
        &self,
        _bucket: &str,
        path: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, BlobError> {
        Err(BlobError::Rejected {
            path: path.to_string(),
            message: "quota exceeded".to_string(),
        })
    }

    async fn resolve_url(&self, bucket: &str, path: &str) -> Result<String, BlobError> {
        Err(BlobError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }
}


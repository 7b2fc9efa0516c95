//! Typed records for the entities the lifecycle engine reads and writes.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::status::{self, LitmasStatus};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub type LitmasId = i64;
pub type KlienId = i64;
pub type PenjaminId = i64;
pub type PerkaraId = i64;
pub type TppScheduleId = i64;

// ──────────────────────────────────────────────
// Actors
// ──────────────────────────────────────────────

/// Identity of a user as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        ActorId(s.to_string())
    }
}

/// Role label attached to a user.
///
/// Labels the core does not interpret are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Pk,
    Anev,
    Kasie,
    Kasubsie,
    OpRegAnak,
    OpRegDewasa,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Pk => "pk",
            Role::Anev => "anev",
            Role::Kasie => "kasie",
            Role::Kasubsie => "kasubsie",
            Role::OpRegAnak => "op_reg_anak",
            Role::OpRegDewasa => "op_reg_dewasa",
            Role::Other(label) => label,
        }
    }

    /// Roles with oversight of every case.
    pub fn is_supervisor(&self) -> bool {
        matches!(self, Role::Admin | Role::Kasie | Role::Kasubsie)
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "pk" => Role::Pk,
            "anev" => Role::Anev,
            "kasie" => Role::Kasie,
            "kasubsie" => Role::Kasubsie,
            "op_reg_anak" => Role::OpRegAnak,
            "op_reg_dewasa" => Role::OpRegDewasa,
            _ => Role::Other(label),
        }
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Role::from(label.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The calling actor: an identity plus its role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Actor {
            id: ActorId::new(id),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    pub fn is_supervisor(&self) -> bool {
        self.roles.iter().any(Role::is_supervisor)
    }

    pub fn is_registration_operator(&self) -> bool {
        self.has_role(&Role::OpRegAnak) || self.has_role(&Role::OpRegDewasa)
    }
}

/// A user row: the identity plus what the workflow shows about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ActorId,
    pub nama: String,
    #[serde(default)]
    pub nip: Option<String>,
    /// WhatsApp number used by the notifier.
    #[serde(default)]
    pub no_hp: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
}

impl UserProfile {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id.clone(),
            roles: self.roles.clone(),
        }
    }
}

// ──────────────────────────────────────────────
// Client, guarantor, charges
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KategoriUsia {
    Anak,
    Dewasa,
}

impl KategoriUsia {
    /// The registration operator role responsible for this age category.
    pub fn operator_role(self) -> Role {
        match self {
            KategoriUsia::Anak => Role::OpRegAnak,
            KategoriUsia::Dewasa => Role::OpRegDewasa,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Klien {
    pub id: KlienId,
    pub nama: String,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub jenis_kelamin: Option<String>,
    #[serde(default)]
    pub tempat_lahir: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_lahir: Option<Date>,
    #[serde(default)]
    pub alamat: Option<String>,
    pub kategori_usia: KategoriUsia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKlien {
    pub nama: String,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub jenis_kelamin: Option<String>,
    #[serde(default)]
    pub tempat_lahir: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_lahir: Option<Date>,
    #[serde(default)]
    pub alamat: Option<String>,
    pub kategori_usia: KategoriUsia,
}

impl NewKlien {
    pub fn with_id(self, id: KlienId) -> Klien {
        Klien {
            id,
            nama: self.nama,
            nik: self.nik,
            jenis_kelamin: self.jenis_kelamin,
            tempat_lahir: self.tempat_lahir,
            tanggal_lahir: self.tanggal_lahir,
            alamat: self.alamat,
            kategori_usia: self.kategori_usia,
        }
    }
}

/// Guarantor: a family member or other responsible party of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penjamin {
    pub id: PenjaminId,
    pub klien_id: KlienId,
    pub nama: String,
    #[serde(default)]
    pub hubungan: Option<String>,
    #[serde(default)]
    pub no_hp: Option<String>,
    #[serde(default)]
    pub alamat: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPenjamin {
    pub nama: String,
    #[serde(default)]
    pub hubungan: Option<String>,
    #[serde(default)]
    pub no_hp: Option<String>,
    #[serde(default)]
    pub alamat: Option<String>,
}

impl NewPenjamin {
    pub fn with_ids(self, id: PenjaminId, klien_id: KlienId) -> Penjamin {
        Penjamin {
            id,
            klien_id,
            nama: self.nama,
            hubungan: self.hubungan,
            no_hp: self.no_hp,
            alamat: self.alamat,
        }
    }
}

/// A charge attached to a case. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perkara {
    pub id: PerkaraId,
    pub litmas_id: LitmasId,
    pub pasal: String,
    pub tindak_pidana: String,
    #[serde(default)]
    pub vonis_bulan: Option<u32>,
    #[serde(default)]
    pub denda: Option<Decimal>,
    #[serde(default)]
    pub subsider_bulan: Option<u32>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_penahanan: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_ekspirasi: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerkara {
    pub pasal: String,
    pub tindak_pidana: String,
    #[serde(default)]
    pub vonis_bulan: Option<u32>,
    #[serde(default)]
    pub denda: Option<Decimal>,
    #[serde(default)]
    pub subsider_bulan: Option<u32>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_penahanan: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub tanggal_ekspirasi: Option<Date>,
}

impl NewPerkara {
    pub fn with_ids(self, id: PerkaraId, litmas_id: LitmasId) -> Perkara {
        Perkara {
            id,
            litmas_id,
            pasal: self.pasal,
            tindak_pidana: self.tindak_pidana,
            vonis_bulan: self.vonis_bulan,
            denda: self.denda,
            subsider_bulan: self.subsider_bulan,
            tanggal_penahanan: self.tanggal_penahanan,
            tanggal_ekspirasi: self.tanggal_ekspirasi,
        }
    }
}

// ──────────────────────────────────────────────
// TPP sitting slots
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TppSlotStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TppSchedule {
    pub id: TppScheduleId,
    #[serde(with = "iso_date")]
    pub tanggal_sidang: Date,
    pub status: TppSlotStatus,
    #[serde(default)]
    pub keterangan: Option<String>,
}

impl TppSchedule {
    /// Open and dated `today` or later.
    pub fn is_bookable(&self, today: Date) -> bool {
        self.status == TppSlotStatus::Open && self.tanggal_sidang >= today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTppSchedule {
    #[serde(with = "iso_date")]
    pub tanggal_sidang: Date,
    #[serde(default = "open_slot")]
    pub status: TppSlotStatus,
    #[serde(default)]
    pub keterangan: Option<String>,
}

fn open_slot() -> TppSlotStatus {
    TppSlotStatus::Open
}

impl NewTppSchedule {
    pub fn with_id(self, id: TppScheduleId) -> TppSchedule {
        TppSchedule {
            id,
            tanggal_sidang: self.tanggal_sidang,
            status: self.status,
            keterangan: self.keterangan,
        }
    }
}

// ──────────────────────────────────────────────
// Litmas
// ──────────────────────────────────────────────

/// A litmas case row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Litmas {
    pub id: LitmasId,
    #[serde(default, with = "status::nullable")]
    pub status: LitmasStatus,
    pub jenis_litmas: String,
    pub klien_id: KlienId,
    #[serde(default)]
    pub penjamin_id: Option<PenjaminId>,
    pub assigned_pk_id: ActorId,
    /// Set by the first report submission and never replaced.
    #[serde(default)]
    pub assigned_anev_id: Option<ActorId>,
    #[serde(default)]
    pub tpp_schedule_id: Option<TppScheduleId>,
    #[serde(with = "time::serde::rfc3339")]
    pub waktu_registrasi: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub waktu_upload_surat_tugas: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub waktu_upload_laporan: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub waktu_verifikasi_anev: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub waktu_sidang_tpp: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub waktu_selesai: Option<OffsetDateTime>,
    #[serde(default)]
    pub surat_tugas_signed_url: Option<String>,
    #[serde(default)]
    pub hasil_litmas_url: Option<String>,
    #[serde(default)]
    pub anev_notes: Option<String>,
}

impl Litmas {
    /// The sitting slot to display: only once the case is scheduled.
    pub fn visible_schedule_id(&self) -> Option<TppScheduleId> {
        if self.status.shows_schedule() {
            self.tpp_schedule_id
        } else {
            None
        }
    }

    /// The six workflow timestamps in lifecycle order.
    pub fn workflow_timestamps(&self) -> [Option<OffsetDateTime>; 6] {
        [
            Some(self.waktu_registrasi),
            self.waktu_upload_surat_tugas,
            self.waktu_upload_laporan,
            self.waktu_verifikasi_anev,
            self.waktu_sidang_tpp,
            self.waktu_selesai,
        ]
    }

    /// The newest workflow timestamp recorded so far.
    pub fn latest_timestamp(&self) -> OffsetDateTime {
        self.workflow_timestamps()
            .into_iter()
            .flatten()
            .fold(self.waktu_registrasi, OffsetDateTime::max)
    }

    /// No later-stage timestamp is set while an earlier one is missing, and
    /// set timestamps never decrease.
    pub fn timestamps_consistent(&self) -> bool {
        let mut seen_gap = false;
        let mut last: Option<OffsetDateTime> = None;
        for ts in self.workflow_timestamps() {
            match ts {
                None => seen_gap = true,
                Some(_) if seen_gap => return false,
                Some(t) => {
                    if last.is_some_and(|prev| t < prev) {
                        return false;
                    }
                    last = Some(t);
                }
            }
        }
        true
    }

    pub fn is_caseworker(&self, actor: &Actor) -> bool {
        self.assigned_pk_id == actor.id
    }

    pub fn is_verifier(&self, actor: &Actor) -> bool {
        self.assigned_anev_id.as_ref() == Some(&actor.id)
    }
}

/// Fields supplied when a case row is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLitmas {
    pub jenis_litmas: String,
    pub klien_id: KlienId,
    #[serde(default)]
    pub penjamin_id: Option<PenjaminId>,
    pub assigned_pk_id: ActorId,
    #[serde(with = "time::serde::rfc3339")]
    pub waktu_registrasi: OffsetDateTime,
}

impl NewLitmas {
    pub fn with_id(self, id: LitmasId) -> Litmas {
        Litmas {
            id,
            status: LitmasStatus::NewTask,
            jenis_litmas: self.jenis_litmas,
            klien_id: self.klien_id,
            penjamin_id: self.penjamin_id,
            assigned_pk_id: self.assigned_pk_id,
            assigned_anev_id: None,
            tpp_schedule_id: None,
            waktu_registrasi: self.waktu_registrasi,
            waktu_upload_surat_tugas: None,
            waktu_upload_laporan: None,
            waktu_verifikasi_anev: None,
            waktu_sidang_tpp: None,
            waktu_selesai: None,
            surat_tugas_signed_url: None,
            hasil_litmas_url: None,
            anev_notes: None,
        }
    }
}

//! Partial case updates and the condition a store must check before
//! applying one.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::{ActorId, Litmas, TppScheduleId};
use crate::status::LitmasStatus;

/// A partial update to a case row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LitmasStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_pk_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_anev_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tpp_schedule_id: Option<TppScheduleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surat_tugas_signed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hasil_litmas_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anev_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub waktu_upload_surat_tugas: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub waktu_upload_laporan: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub waktu_verifikasi_anev: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub waktu_sidang_tpp: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub waktu_selesai: Option<OffsetDateTime>,
}

impl CasePatch {
    pub fn is_empty(&self) -> bool {
        *self == CasePatch::default()
    }

    /// Apply to a row in place. An already assigned Anev is never replaced.
    pub fn apply_to(&self, case: &mut Litmas) {
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(pk) = &self.assigned_pk_id {
            case.assigned_pk_id = pk.clone();
        }
        if case.assigned_anev_id.is_none() {
            case.assigned_anev_id = self.assigned_anev_id.clone();
        }
        set_if_some(&mut case.tpp_schedule_id, self.tpp_schedule_id);
        set_if_some(
            &mut case.surat_tugas_signed_url,
            self.surat_tugas_signed_url.clone(),
        );
        set_if_some(&mut case.hasil_litmas_url, self.hasil_litmas_url.clone());
        set_if_some(&mut case.anev_notes, self.anev_notes.clone());
        set_if_some(
            &mut case.waktu_upload_surat_tugas,
            self.waktu_upload_surat_tugas,
        );
        set_if_some(&mut case.waktu_upload_laporan, self.waktu_upload_laporan);
        set_if_some(&mut case.waktu_verifikasi_anev, self.waktu_verifikasi_anev);
        set_if_some(&mut case.waktu_sidang_tpp, self.waktu_sidang_tpp);
        set_if_some(&mut case.waktu_selesai, self.waktu_selesai);
    }
}

fn set_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Condition checked atomically with an update.
///
/// Stores apply the patch only when every condition holds against the row
/// as it is at write time, and report a conflict otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGuard {
    /// The row's status must still be this one.
    pub expected_status: Option<LitmasStatus>,
    /// `assigned_anev_id` must still be null.
    pub require_anev_unset: bool,
}

impl UpdateGuard {
    pub fn status(expected: LitmasStatus) -> Self {
        UpdateGuard {
            expected_status: Some(expected),
            require_anev_unset: false,
        }
    }

    pub fn admits(&self, case: &Litmas) -> bool {
        if let Some(expected) = self.expected_status {
            if case.status != expected {
                return false;
            }
        }
        !(self.require_anev_unset && case.assigned_anev_id.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewLitmas;
    use time::macros::datetime;

    fn case() -> Litmas {
        NewLitmas {
            jenis_litmas: "Asimilasi".to_string(),
            klien_id: 1,
            penjamin_id: None,
            assigned_pk_id: ActorId::from("pk-1"),
            waktu_registrasi: datetime!(2026-03-01 09:00 UTC),
        }
        .with_id(10)
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut c = case();
        let before = c.clone();
        let patch = CasePatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut c);
        assert_eq!(c, before);
    }

    #[test]
    fn assigned_verifier_is_never_replaced() {
        let mut c = case();
        CasePatch {
            assigned_anev_id: Some(ActorId::from("anev-1")),
            ..CasePatch::default()
        }
        .apply_to(&mut c);
        CasePatch {
            assigned_anev_id: Some(ActorId::from("anev-2")),
            ..CasePatch::default()
        }
        .apply_to(&mut c);
        assert_eq!(c.assigned_anev_id, Some(ActorId::from("anev-1")));
    }

    #[test]
    fn guard_checks_status_and_verifier() {
        let mut c = case();
        assert!(UpdateGuard::default().admits(&c));
        assert!(UpdateGuard::status(LitmasStatus::NewTask).admits(&c));
        assert!(!UpdateGuard::status(LitmasStatus::Review).admits(&c));

        let first_submission = UpdateGuard {
            expected_status: Some(LitmasStatus::NewTask),
            require_anev_unset: true,
        };
        assert!(first_submission.admits(&c));
        c.assigned_anev_id = Some(ActorId::from("anev-1"));
        assert!(!first_submission.admits(&c));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = CasePatch {
            status: Some(LitmasStatus::Review),
            waktu_upload_laporan: Some(datetime!(2026-03-05 10:30 UTC)),
            ..CasePatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "Review",
                "waktu_upload_laporan": "2026-03-05T10:30:00Z"
            })
        );
    }
}

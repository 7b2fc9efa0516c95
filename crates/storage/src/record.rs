use serde::{Deserialize, Serialize};

use monalisa_core::model::LitmasId;
use monalisa_core::{ActorId, Litmas, LitmasStatus};

/// Equality filters for listing cases. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFilter {
    pub status: Option<LitmasStatus>,
    pub assigned_pk_id: Option<ActorId>,
    pub assigned_anev_id: Option<ActorId>,
}

impl CaseFilter {
    pub fn status(status: LitmasStatus) -> Self {
        CaseFilter {
            status: Some(status),
            ..CaseFilter::default()
        }
    }

    pub fn caseworker(pk: ActorId) -> Self {
        CaseFilter {
            assigned_pk_id: Some(pk),
            ..CaseFilter::default()
        }
    }

    pub fn matches(&self, case: &Litmas) -> bool {
        self.status.map_or(true, |s| case.status == s)
            && self
                .assigned_pk_id
                .as_ref()
                .map_or(true, |pk| &case.assigned_pk_id == pk)
            && self
                .assigned_anev_id
                .as_ref()
                .map_or(true, |anev| case.assigned_anev_id.as_ref() == Some(anev))
    }
}

/// Client lookup used for duplicate detection while typing.
///
/// A client matches when its name contains `nama` (case-insensitive) or its
/// NIK equals `nik` exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlienQuery {
    pub nama: Option<String>,
    pub nik: Option<String>,
    /// 0 = no limit.
    pub limit: usize,
}

/// Message sent to a verifier when a report is assigned to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierNotification {
    pub litmas_id: LitmasId,
    pub anev_id: ActorId,
    pub anev_nama: String,
    /// WhatsApp number of the verifier.
    pub anev_no_hp: Option<String>,
    pub pk_nama: String,
    pub klien_nama: String,
    pub jenis_litmas: String,
}

impl VerifierNotification {
    /// Text body delivered to the verifier.
    pub fn message(&self) -> String {
        format!(
            "Halo {}, laporan litmas {} untuk klien {} dari PK {} menunggu verifikasi Anda.",
            self.anev_nama, self.jenis_litmas, self.klien_nama, self.pk_nama
        )
    }
}

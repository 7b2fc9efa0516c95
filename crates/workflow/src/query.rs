//! Read-side views: worklists, dashboard counts, case detail.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use monalisa_core::model::LitmasId;
use monalisa_core::{
    compute_action_space, ActionSpace, Actor, Klien, Litmas, LitmasStatus, Penjamin, Perkara,
    Role, TppSchedule, DOCUMENTS_BUCKET,
};
use monalisa_storage::CaseFilter;

use crate::error::WorkflowError;
use crate::service::LitmasWorkflow;

/// Number of cases per status, in workflow order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub counts: Vec<StatusCount>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: LitmasStatus,
    pub count: usize,
}

impl StatusSummary {
    pub fn count(&self, status: LitmasStatus) -> usize {
        self.counts
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}

/// A case with everything the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseDetail {
    pub litmas: Litmas,
    pub klien: Klien,
    pub penjamin: Option<Penjamin>,
    pub perkara: Vec<Perkara>,
    /// Only resolved once the case is scheduled.
    pub schedule: Option<TppSchedule>,
    pub surat_tugas_url: Option<String>,
    pub hasil_litmas_url: Option<String>,
}

impl LitmasWorkflow {
    /// The actor's worklist, newest first.
    ///
    /// Supervisors see every case. A caseworker sees the cases assigned to
    /// them; a verifier sees the cases waiting for their review.
    pub async fn my_cases(&self, actor: &Actor) -> Result<Vec<Litmas>, WorkflowError> {
        if actor.is_supervisor() {
            return Ok(self.store.list_cases(&CaseFilter::default()).await?);
        }

        let mut cases: BTreeMap<LitmasId, Litmas> = BTreeMap::new();
        if actor.has_role(&Role::Pk) {
            for c in self
                .store
                .list_cases(&CaseFilter::caseworker(actor.id.clone()))
                .await?
            {
                cases.insert(c.id, c);
            }
        }
        if actor.has_role(&Role::Anev) {
            let filter = CaseFilter {
                status: Some(LitmasStatus::Review),
                assigned_anev_id: Some(actor.id.clone()),
                ..CaseFilter::default()
            };
            for c in self.store.list_cases(&filter).await? {
                cases.insert(c.id, c);
            }
        }
        Ok(cases.into_values().rev().collect())
    }

    /// Open sitting slots from today on, earliest first.
    pub async fn open_schedules(&self) -> Result<Vec<TppSchedule>, WorkflowError> {
        let today = self.clock.now().date();
        Ok(self.store.list_open_tpp_schedules(today).await?)
    }

    pub async fn status_summary(&self) -> Result<StatusSummary, WorkflowError> {
        let cases = self.store.list_cases(&CaseFilter::default()).await?;
        let counts = LitmasStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: cases.iter().filter(|c| c.status == status).count(),
            })
            .collect();
        Ok(StatusSummary {
            counts,
            total: cases.len(),
        })
    }

    pub async fn case_detail(&self, case_id: LitmasId) -> Result<CaseDetail, WorkflowError> {
        let litmas = self.store.get_case(case_id).await?;
        let klien = self.store.get_klien(litmas.klien_id).await?;
        let penjamin = match litmas.penjamin_id {
            Some(id) => Some(self.store.get_penjamin(id).await?),
            None => None,
        };
        let perkara = self.store.list_perkara(case_id).await?;
        let schedule = match litmas.visible_schedule_id() {
            Some(id) => Some(self.store.get_tpp_schedule(id).await?),
            None => None,
        };
        let surat_tugas_url = self
            .document_url(case_id, litmas.surat_tugas_signed_url.as_deref())
            .await;
        let hasil_litmas_url = self
            .document_url(case_id, litmas.hasil_litmas_url.as_deref())
            .await;

        Ok(CaseDetail {
            litmas,
            klien,
            penjamin,
            perkara,
            schedule,
            surat_tugas_url,
            hasil_litmas_url,
        })
    }

    /// What `actor` can do with the case now, and why the rest is blocked.
    pub async fn quick_actions(
        &self,
        actor: &Actor,
        case_id: LitmasId,
    ) -> Result<ActionSpace, WorkflowError> {
        let case = self.store.get_case(case_id).await?;
        Ok(compute_action_space(&case, actor))
    }

    async fn document_url(&self, case_id: LitmasId, path: Option<&str>) -> Option<String> {
        let path = path?;
        match self.blobs.resolve_url(DOCUMENTS_BUCKET, path).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(litmas_id = case_id, path, error = %e, "could not resolve document URL");
                None
            }
        }
    }
}

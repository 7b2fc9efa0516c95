//! The six lifecycle actions.
//!
//! Each action runs the same pipeline:
//!
//! 1. read the case and plan the transition (legality, actor, inputs)
//! 2. upload the document, if the action needs one
//! 3. issue one guarded update
//! 4. notify the verifier, best effort
//!
//! Step 3 never runs unless step 2 succeeded. A failure in step 3 after a
//! successful upload is reported with the orphaned path.

use serde::Serialize;
use tracing::{debug, info, warn};

use monalisa_core::model::{LitmasId, TppScheduleId};
use monalisa_core::{
    alternate_document_path, plan_transition, Action, Actor, ActorId, DocumentMeta, Litmas,
    LitmasStatus, Role, TransitionRequest, VerifierAssignment, DOCUMENTS_BUCKET,
};
use monalisa_storage::{BlobError, StorageError, VerifierNotification};

use crate::error::WorkflowError;
use crate::service::LitmasWorkflow;

/// Alternate paths tried when a document path is already taken.
const MAX_PATH_RETRIES: u32 = 3;

/// A file supplied with an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        DocumentUpload {
            file_name: file_name.into(),
            bytes,
        }
    }

    fn meta(&self) -> DocumentMeta {
        DocumentMeta::new(self.file_name.clone(), self.bytes.len() as u64)
    }
}

/// What happened to the verifier notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum NotificationOutcome {
    NotAttempted,
    Sent { anev_id: ActorId },
    Failed { anev_id: ActorId, reason: String },
}

/// Result of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub action: Action,
    pub from: LitmasStatus,
    pub litmas: Litmas,
    pub notification: NotificationOutcome,
}

impl TransitionReport {
    /// One-line message for the caller.
    pub fn confirmation(&self) -> String {
        let base = format!(
            "Litmas {}: {} -> {}",
            self.litmas.id, self.from, self.litmas.status
        );
        match &self.notification {
            NotificationOutcome::NotAttempted => base,
            NotificationOutcome::Sent { anev_id } => {
                format!("{}; verifier {} notified", base, anev_id)
            }
            NotificationOutcome::Failed { anev_id, reason } => format!(
                "{}; saved, but notifying verifier {} failed: {}",
                base, anev_id, reason
            ),
        }
    }
}

impl LitmasWorkflow {
    /// `New Task -> On Progress` with the signed assignment letter.
    pub async fn upload_surat_tugas(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        document: DocumentUpload,
    ) -> Result<TransitionReport, WorkflowError> {
        let request =
            TransitionRequest::new(Action::UploadSuratTugas).with_document(document.meta());
        self.execute(actor, case_id, request, Some(document.bytes))
            .await
    }

    /// `On Progress | Revision -> Review` with the report.
    ///
    /// `verifier` is required when the case has none yet and ignored
    /// otherwise.
    pub async fn submit_laporan(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        document: DocumentUpload,
        verifier: Option<ActorId>,
    ) -> Result<TransitionReport, WorkflowError> {
        let mut request =
            TransitionRequest::new(Action::SubmitLaporan).with_document(document.meta());
        request.verifier = verifier;
        self.execute(actor, case_id, request, Some(document.bytes))
            .await
    }

    /// `Review -> Approved`.
    pub async fn approve(
        &self,
        actor: &Actor,
        case_id: LitmasId,
    ) -> Result<TransitionReport, WorkflowError> {
        self.execute(actor, case_id, TransitionRequest::new(Action::Approve), None)
            .await
    }

    /// `Review -> Revision`. A blank note keeps any earlier note.
    pub async fn return_for_revision(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        notes: Option<String>,
    ) -> Result<TransitionReport, WorkflowError> {
        let mut request = TransitionRequest::new(Action::ReturnForRevision);
        request.notes = notes;
        self.execute(actor, case_id, request, None).await
    }

    /// `Approved -> TPP Scheduled` on an open, not-yet-past slot.
    pub async fn register_tpp(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        slot_id: TppScheduleId,
    ) -> Result<TransitionReport, WorkflowError> {
        let slot = match self.store.get_tpp_schedule(slot_id).await {
            Ok(slot) => slot,
            Err(StorageError::ScheduleNotFound(id)) => {
                return Err(WorkflowError::validation(format!(
                    "TPP schedule {} does not exist",
                    id
                )))
            }
            Err(e) => return Err(e.into()),
        };
        let request = TransitionRequest::new(Action::RegisterTpp).with_slot(slot);
        self.execute(actor, case_id, request, None).await
    }

    /// `TPP Scheduled -> Selesai`, from the day of the booked sitting on.
    pub async fn mark_complete(
        &self,
        actor: &Actor,
        case_id: LitmasId,
    ) -> Result<TransitionReport, WorkflowError> {
        let mut request = TransitionRequest::new(Action::MarkComplete);
        if let Some(slot_id) = self.store.get_case(case_id).await?.tpp_schedule_id {
            request.slot = Some(self.store.get_tpp_schedule(slot_id).await?);
        }
        self.execute(actor, case_id, request, None).await
    }

    async fn execute(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        request: TransitionRequest,
        file: Option<Vec<u8>>,
    ) -> Result<TransitionReport, WorkflowError> {
        let case = self.store.get_case(case_id).await?;
        let plan = plan_transition(&case, actor, &request, self.clock.now())?;
        debug!(
            litmas_id = case_id,
            action = plan.action().id(),
            from = %plan.from,
            to = %plan.to(),
            "transition planned"
        );

        if let VerifierAssignment::First(anev_id) = &plan.verifier {
            self.require_role(anev_id, &Role::Anev).await?;
        }

        let uploaded = match (&plan.upload_path, file) {
            (Some(path), Some(bytes)) => {
                let stored = self.upload_document(case_id, path, bytes).await?;
                debug!(litmas_id = case_id, path = %stored, "document uploaded");
                Some(stored)
            }
            (Some(_), None) => {
                return Err(WorkflowError::validation(format!(
                    "{} needs a document",
                    plan.action()
                )))
            }
            (None, _) => None,
        };

        let action = plan.action();
        let from = plan.from;
        let guard = plan.guard();
        let notify = plan
            .notification_target(self.config.notify_on_resubmission)
            .cloned();
        let patch = plan.into_patch(uploaded.clone())?;

        let litmas = match self.store.update_case(case_id, &guard, &patch).await {
            Ok(litmas) => litmas,
            Err(source) => {
                if let Some(path) = &uploaded {
                    warn!(
                        litmas_id = case_id,
                        path = %path,
                        error = %source,
                        "case update failed after upload; document is orphaned"
                    );
                }
                return Err(WorkflowError::Persistence {
                    source,
                    orphaned_blob: uploaded,
                });
            }
        };
        info!(
            litmas_id = case_id,
            action = action.id(),
            from = %from,
            to = %litmas.status,
            actor = %actor.id,
            "transition applied"
        );

        let notification = match notify {
            Some(anev_id) => self.notify_verifier(&litmas, anev_id).await,
            None => NotificationOutcome::NotAttempted,
        };

        Ok(TransitionReport {
            action,
            from,
            litmas,
            notification,
        })
    }

    /// Upload under `path`, or an alternate path when it is already taken.
    async fn upload_document(
        &self,
        case_id: LitmasId,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, WorkflowError> {
        let mut candidate = path.to_string();
        let mut attempt = 0;
        loop {
            match self
                .blobs
                .upload(DOCUMENTS_BUCKET, &candidate, bytes.clone())
                .await
            {
                Ok(stored) => return Ok(stored),
                Err(BlobError::AlreadyExists { .. }) if attempt < MAX_PATH_RETRIES => {
                    attempt += 1;
                    debug!(litmas_id = case_id, path = %candidate, "document path taken");
                    candidate = alternate_document_path(path, attempt);
                }
                Err(source) => return Err(WorkflowError::Upload { source }),
            }
        }
    }

    async fn notify_verifier(&self, litmas: &Litmas, anev_id: ActorId) -> NotificationOutcome {
        let notification = match self.build_notification(litmas, &anev_id).await {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    litmas_id = litmas.id,
                    anev = %anev_id,
                    error = %e,
                    "could not prepare verifier notification"
                );
                return NotificationOutcome::Failed {
                    anev_id,
                    reason: e.to_string(),
                };
            }
        };
        match self.notifier.send(&notification).await {
            Ok(()) => {
                info!(litmas_id = litmas.id, anev = %anev_id, "verifier notified");
                NotificationOutcome::Sent { anev_id }
            }
            Err(e) => {
                warn!(
                    litmas_id = litmas.id,
                    anev = %anev_id,
                    error = %e,
                    "verifier notification failed"
                );
                NotificationOutcome::Failed {
                    anev_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn build_notification(
        &self,
        litmas: &Litmas,
        anev_id: &ActorId,
    ) -> Result<VerifierNotification, StorageError> {
        let anev = self.store.get_user(anev_id).await?;
        let pk = self.store.get_user(&litmas.assigned_pk_id).await?;
        let klien = self.store.get_klien(litmas.klien_id).await?;
        Ok(VerifierNotification {
            litmas_id: litmas.id,
            anev_id: anev.id,
            anev_nama: anev.nama,
            anev_no_hp: anev.no_hp,
            pk_nama: pk.nama,
            klien_nama: klien.nama,
            jenis_litmas: litmas.jenis_litmas.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monalisa_core::NewLitmas;
    use time::macros::datetime;

    fn report(notification: NotificationOutcome) -> TransitionReport {
        let mut litmas = NewLitmas {
            jenis_litmas: "Asimilasi".to_string(),
            klien_id: 1,
            penjamin_id: None,
            assigned_pk_id: ActorId::from("pk-1"),
            waktu_registrasi: datetime!(2026-01-05 08:00 UTC),
        }
        .with_id(12);
        litmas.status = LitmasStatus::Review;
        TransitionReport {
            action: Action::SubmitLaporan,
            from: LitmasStatus::OnProgress,
            litmas,
            notification,
        }
    }

    #[test]
    fn confirmation_mentions_notification_outcome() {
        assert_eq!(
            report(NotificationOutcome::NotAttempted).confirmation(),
            "Litmas 12: On Progress -> Review"
        );
        assert_eq!(
            report(NotificationOutcome::Sent {
                anev_id: ActorId::from("anev-1")
            })
            .confirmation(),
            "Litmas 12: On Progress -> Review; verifier anev-1 notified"
        );
        let failed = report(NotificationOutcome::Failed {
            anev_id: ActorId::from("anev-1"),
            reason: "timeout".to_string(),
        })
        .confirmation();
        assert!(failed.ends_with("notifying verifier anev-1 failed: timeout"));
    }

    #[test]
    fn document_meta_carries_size() {
        let doc = DocumentUpload::new("laporan.pdf", vec![1, 2, 3]);
        assert_eq!(doc.meta(), DocumentMeta::new("laporan.pdf", 3));
    }
}

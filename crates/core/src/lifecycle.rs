//! Litmas lifecycle state machine.
//!
//! Every legal move is one row of [`TRANSITIONS`]: the action, the states it
//! may start from, the state it lands in, the document it needs, who may
//! trigger it, and the side effects it produces. Nothing outside this table
//! changes a case's status.
//!
//! Planning a transition follows a fixed order:
//! 1. Legality (is there a rule for this status × action?)
//! 2. Actor check (is the caller the right caseworker / verifier?)
//! 3. Input validation (document, verifier selection, sitting slot)
//!
//! The resulting [`TransitionPlan`] tells the caller where to upload the
//! document and which guarded update to issue afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::document::{document_path, DocumentKind, DocumentMeta};
use crate::error::TransitionError;
use crate::model::{Actor, ActorId, Litmas, LitmasId, TppSchedule, TppScheduleId};
use crate::patch::{CasePatch, UpdateGuard};
use crate::status::LitmasStatus;

// ──────────────────────────────────────────────
// Actions and effects
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UploadSuratTugas,
    SubmitLaporan,
    Approve,
    ReturnForRevision,
    RegisterTpp,
    MarkComplete,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::UploadSuratTugas,
        Action::SubmitLaporan,
        Action::Approve,
        Action::ReturnForRevision,
        Action::RegisterTpp,
        Action::MarkComplete,
    ];

    /// Stable identifier, as used on the wire and in the CLI.
    pub fn id(self) -> &'static str {
        match self {
            Action::UploadSuratTugas => "upload_surat_tugas",
            Action::SubmitLaporan => "submit_laporan",
            Action::Approve => "approve",
            Action::ReturnForRevision => "return_for_revision",
            Action::RegisterTpp => "register_tpp",
            Action::MarkComplete => "mark_complete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Action::UploadSuratTugas => "upload the task document for",
            Action::SubmitLaporan => "submit the field report for",
            Action::Approve => "approve",
            Action::ReturnForRevision => "return for revision",
            Action::RegisterTpp => "register a TPP sitting for",
            Action::MarkComplete => "mark complete",
        };
        f.write_str(phrase)
    }
}

/// Who may trigger a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorGuard {
    /// The assigned PK, or an admin.
    Caseworker,
    /// The assigned Anev only.
    Verifier,
    /// The assigned PK, or an admin / kasie / kasubsie.
    CaseworkerOrSupervisor,
}

impl ActorGuard {
    pub fn admits(self, case: &Litmas, actor: &Actor) -> bool {
        match self {
            ActorGuard::Caseworker => case.is_caseworker(actor) || actor.is_admin(),
            ActorGuard::Verifier => case.is_verifier(actor),
            ActorGuard::CaseworkerOrSupervisor => {
                case.is_caseworker(actor) || actor.is_supervisor()
            }
        }
    }
}

/// A field change or follow-up produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    SetSuratTugasUrl,
    StampUploadSuratTugas,
    SetHasilLitmasUrl,
    StampUploadLaporan,
    /// Only on first submission; conditional on the column still being null.
    AssignAnevIfUnset,
    /// Post-commit, best effort.
    NotifyAnev,
    StampVerifikasiAnev,
    SetAnevNotes,
    SetTppSchedule,
    StampSidangTpp,
    StampSelesai,
}

// ──────────────────────────────────────────────
// Transition table
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: Action,
    pub from: &'static [LitmasStatus],
    pub to: LitmasStatus,
    pub document: Option<DocumentKind>,
    pub guard: ActorGuard,
    pub effects: &'static [SideEffect],
    /// Only once the case's booked sitting date has arrived.
    pub after_sitting: bool,
}

impl TransitionRule {
    pub fn applies_to(&self, status: LitmasStatus) -> bool {
        self.from.contains(&status)
    }

    pub fn has_effect(&self, effect: SideEffect) -> bool {
        self.effects.contains(&effect)
    }
}

pub static TRANSITIONS: [TransitionRule; 6] = [
    TransitionRule {
        action: Action::UploadSuratTugas,
        from: &[LitmasStatus::NewTask],
        to: LitmasStatus::OnProgress,
        document: Some(DocumentKind::SuratTugas),
        guard: ActorGuard::Caseworker,
        effects: &[SideEffect::SetSuratTugasUrl, SideEffect::StampUploadSuratTugas],
        after_sitting: false,
    },
    TransitionRule {
        action: Action::SubmitLaporan,
        from: &[LitmasStatus::OnProgress, LitmasStatus::Revision],
        to: LitmasStatus::Review,
        document: Some(DocumentKind::HasilLitmas),
        guard: ActorGuard::Caseworker,
        effects: &[
            SideEffect::SetHasilLitmasUrl,
            SideEffect::StampUploadLaporan,
            SideEffect::AssignAnevIfUnset,
            SideEffect::NotifyAnev,
        ],
        after_sitting: false,
    },
    TransitionRule {
        action: Action::Approve,
        from: &[LitmasStatus::Review],
        to: LitmasStatus::Approved,
        document: None,
        guard: ActorGuard::Verifier,
        effects: &[SideEffect::StampVerifikasiAnev],
        after_sitting: false,
    },
    TransitionRule {
        action: Action::ReturnForRevision,
        from: &[LitmasStatus::Review],
        to: LitmasStatus::Revision,
        document: None,
        guard: ActorGuard::Verifier,
        effects: &[SideEffect::SetAnevNotes],
        after_sitting: false,
    },
    TransitionRule {
        action: Action::RegisterTpp,
        from: &[LitmasStatus::Approved],
        to: LitmasStatus::TppScheduled,
        document: None,
        guard: ActorGuard::Caseworker,
        effects: &[SideEffect::SetTppSchedule, SideEffect::StampSidangTpp],
        after_sitting: false,
    },
    TransitionRule {
        action: Action::MarkComplete,
        from: &[LitmasStatus::TppScheduled],
        to: LitmasStatus::Selesai,
        document: None,
        guard: ActorGuard::CaseworkerOrSupervisor,
        effects: &[SideEffect::StampSelesai],
        after_sitting: true,
    },
];

/// The rule for `action` from `status`, if the move is legal.
pub fn rule_for(status: LitmasStatus, action: Action) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|r| r.action == action && r.applies_to(status))
}

/// Actions legal from `status`, in table order. Depends on nothing else.
pub fn available_actions(status: LitmasStatus) -> Vec<Action> {
    TRANSITIONS
        .iter()
        .filter(|r| r.applies_to(status))
        .map(|r| r.action)
        .collect()
}

// ──────────────────────────────────────────────
// Planning
// ──────────────────────────────────────────────

/// Caller input for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub action: Action,
    pub document: Option<DocumentMeta>,
    /// Verifier chosen by the caseworker. Ignored once a case has one.
    pub verifier: Option<ActorId>,
    /// The slot being booked, or the case's booked slot when completing.
    pub slot: Option<TppSchedule>,
    pub notes: Option<String>,
}

impl TransitionRequest {
    pub fn new(action: Action) -> Self {
        TransitionRequest {
            action,
            document: None,
            verifier: None,
            slot: None,
            notes: None,
        }
    }

    pub fn with_document(mut self, document: DocumentMeta) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_verifier(mut self, verifier: ActorId) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_slot(mut self, slot: TppSchedule) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// How a transition relates to the case's verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierAssignment {
    /// The action does not involve the verifier.
    NotApplicable,
    /// The case already had this verifier (revision resubmission).
    Existing(ActorId),
    /// This transition assigns the verifier.
    First(ActorId),
}

impl VerifierAssignment {
    pub fn verifier(&self) -> Option<&ActorId> {
        match self {
            VerifierAssignment::NotApplicable => None,
            VerifierAssignment::Existing(id) | VerifierAssignment::First(id) => Some(id),
        }
    }
}

/// A validated transition, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub case_id: LitmasId,
    pub rule: &'static TransitionRule,
    pub from: LitmasStatus,
    /// Where the document must be uploaded before the update is issued.
    pub upload_path: Option<String>,
    pub verifier: VerifierAssignment,
    pub slot_id: Option<TppScheduleId>,
    pub notes: Option<String>,
    pub at: OffsetDateTime,
}

impl TransitionPlan {
    pub fn action(&self) -> Action {
        self.rule.action
    }

    pub fn to(&self) -> LitmasStatus {
        self.rule.to
    }

    pub fn requires_upload(&self) -> bool {
        self.rule.document.is_some()
    }

    /// The condition the store must check when writing the patch.
    pub fn guard(&self) -> UpdateGuard {
        UpdateGuard {
            expected_status: Some(self.from),
            require_anev_unset: matches!(self.verifier, VerifierAssignment::First(_)),
        }
    }

    /// Whom to notify once the update is committed.
    ///
    /// First assignment always notifies; a resubmission to an existing
    /// verifier notifies only when `notify_on_resubmission` is set.
    pub fn notification_target(&self, notify_on_resubmission: bool) -> Option<&ActorId> {
        if !self.rule.has_effect(SideEffect::NotifyAnev) {
            return None;
        }
        match &self.verifier {
            VerifierAssignment::First(id) => Some(id),
            VerifierAssignment::Existing(id) if notify_on_resubmission => Some(id),
            _ => None,
        }
    }

    /// Build the update. `uploaded_path` is the path the blob store returned;
    /// it is required whenever the rule needs a document.
    pub fn into_patch(self, uploaded_path: Option<String>) -> Result<CasePatch, TransitionError> {
        if self.requires_upload() && uploaded_path.is_none() {
            return Err(TransitionError::MissingDocument {
                action: self.rule.action,
            });
        }

        let mut patch = CasePatch {
            status: Some(self.rule.to),
            ..CasePatch::default()
        };
        for effect in self.rule.effects {
            match effect {
                SideEffect::SetSuratTugasUrl => {
                    patch.surat_tugas_signed_url = uploaded_path.clone();
                }
                SideEffect::StampUploadSuratTugas => patch.waktu_upload_surat_tugas = Some(self.at),
                SideEffect::SetHasilLitmasUrl => patch.hasil_litmas_url = uploaded_path.clone(),
                SideEffect::StampUploadLaporan => patch.waktu_upload_laporan = Some(self.at),
                SideEffect::AssignAnevIfUnset => {
                    if let VerifierAssignment::First(id) = &self.verifier {
                        patch.assigned_anev_id = Some(id.clone());
                    }
                }
                SideEffect::NotifyAnev => {}
                SideEffect::StampVerifikasiAnev => patch.waktu_verifikasi_anev = Some(self.at),
                SideEffect::SetAnevNotes => patch.anev_notes = self.notes.clone(),
                SideEffect::SetTppSchedule => patch.tpp_schedule_id = self.slot_id,
                SideEffect::StampSidangTpp => patch.waktu_sidang_tpp = Some(self.at),
                SideEffect::StampSelesai => patch.waktu_selesai = Some(self.at),
            }
        }
        Ok(patch)
    }
}

/// Check legality, the actor and the inputs, and produce a plan.
///
/// Pure function: no IO, `now` is supplied by the caller. Date checks use
/// `now`; the stamp is never earlier than the case's latest timestamp.
pub fn plan_transition(
    case: &Litmas,
    actor: &Actor,
    request: &TransitionRequest,
    now: OffsetDateTime,
) -> Result<TransitionPlan, TransitionError> {
    let action = request.action;

    // Step 1: Legality
    let rule = rule_for(case.status, action).ok_or(TransitionError::InvalidState {
        case_id: case.id,
        action,
        current: case.status,
    })?;

    // Step 2: Actor
    if !rule.guard.admits(case, actor) {
        return Err(TransitionError::NotAuthorized {
            case_id: case.id,
            action,
            actor: actor.id.clone(),
        });
    }

    let at = now.max(case.latest_timestamp());

    // Step 3: Inputs
    let upload_path = match rule.document {
        Some(kind) => {
            let doc = request
                .document
                .as_ref()
                .filter(|d| d.size > 0)
                .ok_or(TransitionError::MissingDocument { action })?;
            Some(document_path(kind, case.id, &doc.file_name, at))
        }
        None => None,
    };

    let verifier = if rule.has_effect(SideEffect::AssignAnevIfUnset) {
        match (&case.assigned_anev_id, &request.verifier) {
            (Some(existing), _) => VerifierAssignment::Existing(existing.clone()),
            (None, Some(chosen)) => VerifierAssignment::First(chosen.clone()),
            (None, None) => return Err(TransitionError::MissingVerifier { case_id: case.id }),
        }
    } else {
        VerifierAssignment::NotApplicable
    };

    let slot_id = if rule.has_effect(SideEffect::SetTppSchedule) {
        let slot = request
            .slot
            .as_ref()
            .ok_or(TransitionError::MissingSlot { case_id: case.id })?;
        if slot.status != crate::model::TppSlotStatus::Open {
            return Err(TransitionError::SlotNotOpen { slot_id: slot.id });
        }
        if !slot.is_bookable(now.date()) {
            return Err(TransitionError::SlotInPast {
                slot_id: slot.id,
                tanggal_sidang: slot.tanggal_sidang,
            });
        }
        Some(slot.id)
    } else {
        None
    };

    if rule.after_sitting {
        let slot = request
            .slot
            .as_ref()
            .filter(|s| Some(s.id) == case.tpp_schedule_id)
            .ok_or(TransitionError::MissingSlot { case_id: case.id })?;
        if slot.tanggal_sidang > now.date() {
            return Err(TransitionError::SittingNotHeld {
                case_id: case.id,
                tanggal_sidang: slot.tanggal_sidang,
            });
        }
    }

    let notes = if rule.has_effect(SideEffect::SetAnevNotes) {
        request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    Ok(TransitionPlan {
        case_id: case.id,
        rule,
        from: case.status,
        upload_path,
        verifier,
        slot_id,
        notes,
        at,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewLitmas, Role, TppSlotStatus};
    use time::macros::{date, datetime};
    use time::Duration;

    const T0: OffsetDateTime = datetime!(2026-03-02 08:00 UTC);

    fn new_case() -> Litmas {
        NewLitmas {
            jenis_litmas: "Pembebasan Bersyarat".to_string(),
            klien_id: 1,
            penjamin_id: None,
            assigned_pk_id: ActorId::from("pk-1"),
            waktu_registrasi: T0,
        }
        .with_id(100)
    }

    fn pk() -> Actor {
        Actor::new("pk-1", [Role::Pk])
    }

    fn anev(id: &str) -> Actor {
        Actor::new(id, [Role::Anev])
    }

    fn doc() -> DocumentMeta {
        DocumentMeta::new("dokumen.pdf", 2048)
    }

    fn open_slot(id: i64) -> TppSchedule {
        TppSchedule {
            id,
            tanggal_sidang: date!(2026 - 04 - 15),
            status: TppSlotStatus::Open,
            keterangan: None,
        }
    }

    /// Plan and apply one action the way a store would.
    fn step(
        case: &mut Litmas,
        actor: &Actor,
        request: TransitionRequest,
        at: OffsetDateTime,
    ) -> Result<TransitionPlan, TransitionError> {
        let plan = plan_transition(case, actor, &request, at)?;
        assert!(plan.guard().admits(case));
        let patch = plan.clone().into_patch(plan.upload_path.clone())?;
        patch.apply_to(case);
        Ok(plan)
    }

    // ──────────────────────────────────────
    // Table shape
    // ──────────────────────────────────────

    #[test]
    fn each_action_has_exactly_one_rule() {
        for action in Action::ALL {
            let count = TRANSITIONS.iter().filter(|r| r.action == action).count();
            assert_eq!(count, 1, "{:?}", action);
        }
    }

    #[test]
    fn available_actions_follow_status() {
        assert_eq!(
            available_actions(LitmasStatus::NewTask),
            vec![Action::UploadSuratTugas]
        );
        assert_eq!(
            available_actions(LitmasStatus::OnProgress),
            vec![Action::SubmitLaporan]
        );
        assert_eq!(
            available_actions(LitmasStatus::Review),
            vec![Action::Approve, Action::ReturnForRevision]
        );
        assert_eq!(
            available_actions(LitmasStatus::Revision),
            vec![Action::SubmitLaporan]
        );
        assert_eq!(
            available_actions(LitmasStatus::Approved),
            vec![Action::RegisterTpp]
        );
        assert_eq!(
            available_actions(LitmasStatus::TppScheduled),
            vec![Action::MarkComplete]
        );
        assert!(available_actions(LitmasStatus::Selesai).is_empty());
    }

    #[test]
    fn illegal_move_is_invalid_state() {
        let case = new_case();
        let err = plan_transition(&case, &anev("anev-1"), &TransitionRequest::new(Action::Approve), T0)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidState {
                case_id: 100,
                action: Action::Approve,
                current: LitmasStatus::NewTask,
            }
        );
        assert!(!err.is_validation());
    }

    // ──────────────────────────────────────
    // Actor guards
    // ──────────────────────────────────────

    #[test]
    fn only_assigned_caseworker_or_admin_uploads_task_document() {
        let case = new_case();
        let request = TransitionRequest::new(Action::UploadSuratTugas).with_document(doc());

        let other_pk = Actor::new("pk-2", [Role::Pk]);
        assert!(matches!(
            plan_transition(&case, &other_pk, &request, T0),
            Err(TransitionError::NotAuthorized { .. })
        ));
        assert!(plan_transition(&case, &pk(), &request, T0).is_ok());
        let admin = Actor::new("root", [Role::Admin]);
        assert!(plan_transition(&case, &admin, &request, T0).is_ok());
    }

    #[test]
    fn only_assigned_verifier_approves() {
        let mut case = new_case();
        case.status = LitmasStatus::Review;
        case.assigned_anev_id = Some(ActorId::from("anev-1"));
        let request = TransitionRequest::new(Action::Approve);

        for outsider in [
            anev("anev-2"),
            Actor::new("root", [Role::Admin]),
            pk(),
        ] {
            assert!(matches!(
                plan_transition(&case, &outsider, &request, T0),
                Err(TransitionError::NotAuthorized { .. })
            ));
        }
        assert!(plan_transition(&case, &anev("anev-1"), &request, T0).is_ok());
    }

    #[test]
    fn supervisors_may_mark_complete() {
        let mut case = new_case();
        case.status = LitmasStatus::TppScheduled;
        case.tpp_schedule_id = Some(1);
        let request = TransitionRequest::new(Action::MarkComplete).with_slot(open_slot(1));
        let after = datetime!(2026-04-15 14:00 UTC);
        let kasie = Actor::new("kasie-1", [Role::Kasie]);
        assert!(plan_transition(&case, &kasie, &request, after).is_ok());
        assert!(matches!(
            plan_transition(&case, &anev("anev-1"), &request, after),
            Err(TransitionError::NotAuthorized { .. })
        ));
    }

    // ──────────────────────────────────────
    // Inputs
    // ──────────────────────────────────────

    #[test]
    fn missing_or_empty_document_is_validation_error() {
        let case = new_case();
        let err = plan_transition(&case, &pk(), &TransitionRequest::new(Action::UploadSuratTugas), T0)
            .unwrap_err();
        assert!(err.is_validation());

        let empty = TransitionRequest::new(Action::UploadSuratTugas)
            .with_document(DocumentMeta::new("kosong.pdf", 0));
        assert_eq!(
            plan_transition(&case, &pk(), &empty, T0).unwrap_err(),
            TransitionError::MissingDocument {
                action: Action::UploadSuratTugas
            }
        );
    }

    #[test]
    fn first_submission_requires_verifier_choice() {
        let mut case = new_case();
        case.status = LitmasStatus::OnProgress;
        let request = TransitionRequest::new(Action::SubmitLaporan).with_document(doc());
        assert_eq!(
            plan_transition(&case, &pk(), &request, T0).unwrap_err(),
            TransitionError::MissingVerifier { case_id: 100 }
        );

        let plan = plan_transition(
            &case,
            &pk(),
            &request.with_verifier(ActorId::from("anev-1")),
            T0,
        )
        .unwrap();
        assert_eq!(plan.verifier, VerifierAssignment::First(ActorId::from("anev-1")));
        assert!(plan.guard().require_anev_unset);
        assert_eq!(plan.notification_target(false), Some(&ActorId::from("anev-1")));
    }

    #[test]
    fn resubmission_keeps_verifier_and_ignores_new_choice() {
        let mut case = new_case();
        case.status = LitmasStatus::Revision;
        case.assigned_anev_id = Some(ActorId::from("anev-1"));
        let request = TransitionRequest::new(Action::SubmitLaporan)
            .with_document(doc())
            .with_verifier(ActorId::from("anev-9"));

        let plan = plan_transition(&case, &pk(), &request, T0).unwrap();
        assert_eq!(plan.verifier, VerifierAssignment::Existing(ActorId::from("anev-1")));
        assert!(!plan.guard().require_anev_unset);
        assert_eq!(plan.notification_target(false), None);
        assert_eq!(plan.notification_target(true), Some(&ActorId::from("anev-1")));

        let patch = plan.into_patch(Some("hasil-litmas/100_1.pdf".to_string())).unwrap();
        assert_eq!(patch.assigned_anev_id, None);
    }

    #[test]
    fn scheduling_rejects_closed_or_past_slots() {
        let mut case = new_case();
        case.status = LitmasStatus::Approved;
        let now = datetime!(2026-04-10 09:00 UTC);

        let err = plan_transition(&case, &pk(), &TransitionRequest::new(Action::RegisterTpp), now)
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingSlot { case_id: 100 });

        let closed = TppSchedule {
            status: TppSlotStatus::Closed,
            ..open_slot(1)
        };
        let err = plan_transition(
            &case,
            &pk(),
            &TransitionRequest::new(Action::RegisterTpp).with_slot(closed),
            now,
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::SlotNotOpen { slot_id: 1 });

        let past = TppSchedule {
            tanggal_sidang: date!(2026 - 04 - 09),
            ..open_slot(2)
        };
        let err = plan_transition(
            &case,
            &pk(),
            &TransitionRequest::new(Action::RegisterTpp).with_slot(past),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::SlotInPast { slot_id: 2, .. }));
        assert!(err.is_validation());

        let plan = plan_transition(
            &case,
            &pk(),
            &TransitionRequest::new(Action::RegisterTpp).with_slot(open_slot(3)),
            now,
        )
        .unwrap();
        assert_eq!(plan.slot_id, Some(3));
    }

    #[test]
    fn completion_waits_for_the_sitting_date() {
        let mut case = new_case();
        case.status = LitmasStatus::TppScheduled;
        case.tpp_schedule_id = Some(1);
        let request = TransitionRequest::new(Action::MarkComplete).with_slot(open_slot(1));

        let err = plan_transition(&case, &pk(), &request, datetime!(2026-04-14 23:00 UTC))
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::SittingNotHeld {
                case_id: 100,
                tanggal_sidang: date!(2026 - 04 - 15),
            }
        );
        assert!(err.is_validation());

        assert!(plan_transition(&case, &pk(), &request, datetime!(2026-04-15 08:00 UTC)).is_ok());
        assert!(plan_transition(&case, &pk(), &request, datetime!(2026-05-01 08:00 UTC)).is_ok());

        // Only the case's own booking counts.
        let other = TransitionRequest::new(Action::MarkComplete).with_slot(open_slot(2));
        assert_eq!(
            plan_transition(&case, &pk(), &other, datetime!(2026-05-01 08:00 UTC)).unwrap_err(),
            TransitionError::MissingSlot { case_id: 100 }
        );
    }

    #[test]
    fn clock_stepping_back_never_reorders_timestamps() {
        let mut case = new_case();
        let uploaded = T0 + Duration::hours(5);
        step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::UploadSuratTugas).with_document(doc()),
            uploaded,
        )
        .unwrap();

        let plan = step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::SubmitLaporan)
                .with_document(doc())
                .with_verifier(ActorId::from("anev-1")),
            T0,
        )
        .unwrap();
        assert_eq!(plan.at, uploaded);
        assert_eq!(case.waktu_upload_laporan, Some(uploaded));
        assert!(case.timestamps_consistent());
    }

    #[test]
    fn patch_without_upload_is_refused_for_document_actions() {
        let case = new_case();
        let plan = plan_transition(
            &case,
            &pk(),
            &TransitionRequest::new(Action::UploadSuratTugas).with_document(doc()),
            T0,
        )
        .unwrap();
        assert!(plan.requires_upload());
        assert!(matches!(
            plan.into_patch(None),
            Err(TransitionError::MissingDocument { .. })
        ));
    }

    #[test]
    fn blank_revision_note_leaves_previous_note() {
        let mut case = new_case();
        case.status = LitmasStatus::Review;
        case.assigned_anev_id = Some(ActorId::from("anev-1"));
        case.anev_notes = Some("catatan lama".to_string());
        step(
            &mut case,
            &anev("anev-1"),
            TransitionRequest::new(Action::ReturnForRevision).with_notes("   "),
            T0,
        )
        .unwrap();
        assert_eq!(case.status, LitmasStatus::Revision);
        assert_eq!(case.anev_notes.as_deref(), Some("catatan lama"));
    }

    // ──────────────────────────────────────
    // Properties
    // ──────────────────────────────────────

    #[test]
    fn re_approval_is_rejected_and_keeps_timestamp() {
        let mut case = new_case();
        case.status = LitmasStatus::Review;
        case.assigned_anev_id = Some(ActorId::from("anev-1"));
        step(&mut case, &anev("anev-1"), TransitionRequest::new(Action::Approve), T0).unwrap();
        let stamped = case.waktu_verifikasi_anev;
        assert_eq!(stamped, Some(T0));

        let err = step(
            &mut case,
            &anev("anev-1"),
            TransitionRequest::new(Action::Approve),
            T0 + Duration::hours(1),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { .. }));
        assert_eq!(case.waktu_verifikasi_anev, stamped);
    }

    #[test]
    fn full_lifecycle_scenario() {
        let mut case = new_case();
        let v1 = ActorId::from("anev-1");
        let mut notifications = Vec::new();
        let mut at = T0;
        let mut tick = || {
            at += Duration::hours(3);
            at
        };

        step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::UploadSuratTugas).with_document(doc()),
            tick(),
        )
        .unwrap();
        assert_eq!(case.status, LitmasStatus::OnProgress);
        assert!(case.surat_tugas_signed_url.as_deref().unwrap().starts_with("surat-tugas/100_"));
        assert!(case.assigned_anev_id.is_none());

        let plan = step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::SubmitLaporan)
                .with_document(doc())
                .with_verifier(v1.clone()),
            tick(),
        )
        .unwrap();
        notifications.extend(plan.notification_target(false).cloned());
        assert_eq!(case.status, LitmasStatus::Review);
        assert_eq!(case.assigned_anev_id, Some(v1.clone()));

        step(
            &mut case,
            &anev("anev-1"),
            TransitionRequest::new(Action::ReturnForRevision).with_notes("Tambahkan data keluarga"),
            tick(),
        )
        .unwrap();
        assert_eq!(case.status, LitmasStatus::Revision);
        assert_eq!(case.anev_notes.as_deref(), Some("Tambahkan data keluarga"));

        let plan = step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::SubmitLaporan).with_document(doc()),
            tick(),
        )
        .unwrap();
        notifications.extend(plan.notification_target(false).cloned());
        assert_eq!(case.status, LitmasStatus::Review);
        assert_eq!(case.assigned_anev_id, Some(v1.clone()));

        step(&mut case, &anev("anev-1"), TransitionRequest::new(Action::Approve), tick()).unwrap();
        assert_eq!(case.status, LitmasStatus::Approved);

        step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::RegisterTpp).with_slot(open_slot(1)),
            tick(),
        )
        .unwrap();
        assert_eq!(case.status, LitmasStatus::TppScheduled);
        assert_eq!(case.visible_schedule_id(), Some(1));

        step(
            &mut case,
            &pk(),
            TransitionRequest::new(Action::MarkComplete).with_slot(open_slot(1)),
            datetime!(2026-04-15 13:00 UTC),
        )
        .unwrap();
        assert_eq!(case.status, LitmasStatus::Selesai);

        assert_eq!(case.assigned_anev_id, Some(v1.clone()));
        assert_eq!(notifications, vec![v1]);
        assert!(case.workflow_timestamps().iter().all(Option::is_some));
        assert!(case.timestamps_consistent());
    }
}

use std::fmt;

use time::Date;

use crate::lifecycle::Action;
use crate::model::{ActorId, LitmasId, TppScheduleId};
use crate::status::LitmasStatus;

/// Why the lifecycle engine refused an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The action is not legal from the case's current status.
    InvalidState {
        case_id: LitmasId,
        action: Action,
        current: LitmasStatus,
    },
    /// The actor may not perform this action on this case.
    NotAuthorized {
        case_id: LitmasId,
        action: Action,
        actor: ActorId,
    },
    /// The action requires a file and none (or an empty one) was supplied.
    MissingDocument { action: Action },
    /// First report submission without a verifier selection.
    MissingVerifier { case_id: LitmasId },
    /// Scheduling without a slot.
    MissingSlot { case_id: LitmasId },
    SlotNotOpen { slot_id: TppScheduleId },
    SlotInPast {
        slot_id: TppScheduleId,
        tanggal_sidang: Date,
    },
    /// Completion requested before the booked sitting date.
    SittingNotHeld {
        case_id: LitmasId,
        tanggal_sidang: Date,
    },
}

impl TransitionError {
    /// Missing or unusable input, reported before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TransitionError::MissingDocument { .. }
                | TransitionError::MissingVerifier { .. }
                | TransitionError::MissingSlot { .. }
                | TransitionError::SlotNotOpen { .. }
                | TransitionError::SlotInPast { .. }
                | TransitionError::SittingNotHeld { .. }
        )
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::InvalidState {
                case_id,
                action,
                current,
            } => write!(
                f,
                "cannot {} litmas {}: status is '{}'",
                action, case_id, current
            ),
            TransitionError::NotAuthorized {
                case_id,
                action,
                actor,
            } => write!(
                f,
                "user '{}' is not allowed to {} litmas {}",
                actor, action, case_id
            ),
            TransitionError::MissingDocument { action } => {
                write!(f, "a document file is required to {}", action)
            }
            TransitionError::MissingVerifier { case_id } => write!(
                f,
                "litmas {} has no verifier yet: choose an Anev before submitting",
                case_id
            ),
            TransitionError::MissingSlot { case_id } => {
                write!(f, "choose a TPP sitting slot for litmas {}", case_id)
            }
            TransitionError::SlotNotOpen { slot_id } => {
                write!(f, "TPP slot {} is not open", slot_id)
            }
            TransitionError::SlotInPast {
                slot_id,
                tanggal_sidang,
            } => write!(
                f,
                "TPP slot {} sits on {} which has already passed",
                slot_id, tanggal_sidang
            ),
            TransitionError::SittingNotHeld {
                case_id,
                tanggal_sidang,
            } => write!(
                f,
                "the TPP sitting for litmas {} is on {} and has not taken place yet",
                case_id, tanggal_sidang
            ),
        }
    }
}

impl std::error::Error for TransitionError {}

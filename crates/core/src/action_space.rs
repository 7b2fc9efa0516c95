//! Action space extraction -- which quick actions an actor is offered for a case.

use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;
use crate::lifecycle::{Action, SideEffect, TRANSITIONS};
use crate::model::{Actor, Litmas, LitmasId};
use crate::status::LitmasStatus;

/// An action the actor can take right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub action: Action,
    pub requires_document: Option<DocumentKind>,
    /// The case has no verifier yet, so the form must ask for one.
    pub needs_verifier_choice: bool,
    pub needs_slot_choice: bool,
}

/// An action that exists but is not available to this actor now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedAction {
    pub action: Action,
    pub reason: BlockedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockedReason {
    ActorNotAuthorized,
    NotInSourceState {
        current: LitmasStatus,
        required: Vec<LitmasStatus>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub case_id: LitmasId,
    pub status: LitmasStatus,
    pub offers: Vec<Offer>,
    pub blocked: Vec<BlockedAction>,
}

impl ActionSpace {
    pub fn offers_action(&self, action: Action) -> bool {
        self.offers.iter().any(|o| o.action == action)
    }
}

/// Pure function of the case status and the actor's relation to the case.
///
/// Whether a verifier is already assigned only changes what the offer asks
/// for, never whether the action is offered.
pub fn compute_action_space(case: &Litmas, actor: &Actor) -> ActionSpace {
    let mut offers = Vec::new();
    let mut blocked = Vec::new();

    for rule in TRANSITIONS.iter() {
        if !rule.applies_to(case.status) {
            blocked.push(BlockedAction {
                action: rule.action,
                reason: BlockedReason::NotInSourceState {
                    current: case.status,
                    required: rule.from.to_vec(),
                },
            });
            continue;
        }
        if !rule.guard.admits(case, actor) {
            blocked.push(BlockedAction {
                action: rule.action,
                reason: BlockedReason::ActorNotAuthorized,
            });
            continue;
        }
        offers.push(Offer {
            action: rule.action,
            requires_document: rule.document,
            needs_verifier_choice: rule.has_effect(SideEffect::AssignAnevIfUnset)
                && case.assigned_anev_id.is_none(),
            needs_slot_choice: rule.has_effect(SideEffect::SetTppSchedule),
        });
    }

    ActionSpace {
        case_id: case.id,
        status: case.status,
        offers,
        blocked,
    }
}

//! monalisa-core: MONALISA domain model and litmas lifecycle engine.
//!
//! Everything in this crate is pure: no IO, no clock, no ambient actor.
//! Callers pass the acting [`Actor`] and the current time explicitly, which
//! keeps every guard deterministic under test.
//!
//! # Public API
//!
//! - [`model`] -- typed records for cases, clients, guarantors, charges,
//!   sitting slots and users
//! - [`status::LitmasStatus`] -- the case status enum (`null` = `New Task`)
//! - [`lifecycle`] -- transition table, guards and [`TransitionPlan`]
//! - [`patch`] -- partial updates and the conditional [`UpdateGuard`]
//! - [`action_space`] -- which quick actions an actor is offered for a case
//! - [`reference`] -- the closed catalog of case types

pub mod action_space;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod patch;
pub mod reference;
pub mod status;

pub use action_space::{compute_action_space, ActionSpace, BlockedAction, BlockedReason, Offer};
pub use document::{
    alternate_document_path, document_path, DocumentKind, DocumentMeta, DOCUMENTS_BUCKET,
};
pub use error::TransitionError;
pub use lifecycle::{
    available_actions, plan_transition, rule_for, Action, SideEffect, TransitionPlan,
    TransitionRequest, TransitionRule, VerifierAssignment, TRANSITIONS,
};
pub use model::{
    Actor, ActorId, KategoriUsia, Klien, Litmas, NewKlien, NewLitmas, NewPenjamin, NewPerkara,
    NewTppSchedule, Penjamin, Perkara, Role, TppSchedule, TppSlotStatus, UserProfile,
};
pub use patch::{CasePatch, UpdateGuard};
pub use status::LitmasStatus;

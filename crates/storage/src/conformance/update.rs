use std::future::Future;

use time::macros::datetime;

use monalisa_core::{ActorId, CasePatch, LitmasStatus, UpdateGuard};

use super::{seed_case, CheckResult};
use crate::{CaseStore, StorageError};

pub(super) async fn run_update_tests<S, F, Fut>(factory: &F) -> Vec<CheckResult>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(CheckResult::new(
        "update",
        "update_applies_patch_when_guard_holds",
        update_applies_patch_when_guard_holds(factory).await,
    ));
    results.push(CheckResult::new(
        "update",
        "update_with_stale_status_conflicts",
        update_with_stale_status_conflicts(factory).await,
    ));
    results.push(CheckResult::new(
        "update",
        "conflict_writes_nothing",
        conflict_writes_nothing(factory).await,
    ));
    results.push(CheckResult::new(
        "update",
        "second_verifier_assignment_conflicts",
        second_verifier_assignment_conflicts(factory).await,
    ));
    results.push(CheckResult::new(
        "update",
        "unguarded_patch_never_replaces_verifier",
        unguarded_patch_never_replaces_verifier(factory).await,
    ));
    results.push(CheckResult::new(
        "update",
        "update_unknown_case_is_not_found",
        update_unknown_case_is_not_found(factory).await,
    ));

    results
}

fn to_on_progress() -> CasePatch {
    CasePatch {
        status: Some(LitmasStatus::OnProgress),
        surat_tugas_signed_url: Some("surat-tugas/1_1.pdf".to_string()),
        waktu_upload_surat_tugas: Some(datetime!(2026-01-06 09:00 UTC)),
        ..CasePatch::default()
    }
}

fn to_review(anev: &str) -> CasePatch {
    CasePatch {
        status: Some(LitmasStatus::Review),
        assigned_anev_id: Some(ActorId::from(anev)),
        hasil_litmas_url: Some("hasil-litmas/1_2.pdf".to_string()),
        waktu_upload_laporan: Some(datetime!(2026-01-07 09:00 UTC)),
        ..CasePatch::default()
    }
}

fn first_submission_guard() -> UpdateGuard {
    UpdateGuard {
        expected_status: Some(LitmasStatus::OnProgress),
        require_anev_unset: true,
    }
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn update_applies_patch_when_guard_holds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let updated = s
        .update_case(
            case.id,
            &UpdateGuard::status(LitmasStatus::NewTask),
            &to_on_progress(),
        )
        .await
        .map_err(|e| e.to_string())?;
    if updated.status != LitmasStatus::OnProgress {
        return Err(format!("expected On Progress, got '{}'", updated.status));
    }
    let read = s.get_case(case.id).await.map_err(|e| e.to_string())?;
    if read != updated {
        return Err("returned row differs from stored row".to_string());
    }
    if read.surat_tugas_signed_url.as_deref() != Some("surat-tugas/1_1.pdf") {
        return Err(format!("document path not stored: {:?}", read.surat_tugas_signed_url));
    }
    Ok(())
}

async fn update_with_stale_status_conflicts<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let result = s
        .update_case(
            case.id,
            &UpdateGuard::status(LitmasStatus::Approved),
            &to_on_progress(),
        )
        .await;
    match result {
        Err(StorageError::ConcurrentConflict {
            litmas_id,
            actual: LitmasStatus::NewTask,
            ..
        }) if litmas_id == case.id => Ok(()),
        other => Err(format!("expected ConcurrentConflict, got {:?}", other)),
    }
}

async fn conflict_writes_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let _ = s
        .update_case(
            case.id,
            &UpdateGuard::status(LitmasStatus::Review),
            &to_on_progress(),
        )
        .await;
    let read = s.get_case(case.id).await.map_err(|e| e.to_string())?;
    if read != case {
        return Err(format!("rejected update modified the row: {:?}", read));
    }
    Ok(())
}

/// Once a verifier is assigned, a guard requiring an empty verifier column
/// must fail even when the status matches.
async fn second_verifier_assignment_conflicts<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    s.update_case(
        case.id,
        &UpdateGuard::status(LitmasStatus::NewTask),
        &to_on_progress(),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.update_case(case.id, &first_submission_guard(), &to_review("anev-1"))
        .await
        .map_err(|e| e.to_string())?;

    // Put the row back in On Progress without touching the verifier.
    s.update_case(
        case.id,
        &UpdateGuard::status(LitmasStatus::Review),
        &CasePatch {
            status: Some(LitmasStatus::OnProgress),
            ..CasePatch::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    match s
        .update_case(case.id, &first_submission_guard(), &to_review("anev-2"))
        .await
    {
        Err(StorageError::ConcurrentConflict {
            anev_already_assigned: true,
            ..
        }) => {}
        other => return Err(format!("expected ConcurrentConflict, got {:?}", other)),
    }
    let read = s.get_case(case.id).await.map_err(|e| e.to_string())?;
    if read.assigned_anev_id != Some(ActorId::from("anev-1")) {
        return Err(format!("verifier changed to {:?}", read.assigned_anev_id));
    }
    Ok(())
}

/// Even without a guard, the verifier column is write-once.
async fn unguarded_patch_never_replaces_verifier<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    for anev in ["anev-1", "anev-2"] {
        s.update_case(
            case.id,
            &UpdateGuard::default(),
            &CasePatch {
                assigned_anev_id: Some(ActorId::from(anev)),
                ..CasePatch::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    }
    let read = s.get_case(case.id).await.map_err(|e| e.to_string())?;
    if read.assigned_anev_id != Some(ActorId::from("anev-1")) {
        return Err(format!("expected anev-1, got {:?}", read.assigned_anev_id));
    }
    Ok(())
}

async fn update_unknown_case_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s
        .update_case(7, &UpdateGuard::default(), &to_on_progress())
        .await
    {
        Err(StorageError::CaseNotFound(7)) => Ok(()),
        other => Err(format!("expected CaseNotFound(7), got {:?}", other)),
    }
}

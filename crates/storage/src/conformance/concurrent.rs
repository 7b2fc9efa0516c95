use std::future::Future;
use std::sync::Arc;

use time::macros::datetime;

use monalisa_core::{ActorId, CasePatch, LitmasStatus, UpdateGuard};

use super::{seed_case, CheckResult};
use crate::{CaseStore, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<CheckResult>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(CheckResult::new(
        "concurrent",
        "racing_first_submissions_assign_one_verifier",
        racing_first_submissions_assign_one_verifier(factory).await,
    ));
    results.push(CheckResult::new(
        "concurrent",
        "concurrent_updates_different_cases_all_succeed",
        concurrent_updates_different_cases_all_succeed(factory).await,
    ));

    results
}

fn first_submission(anev: String) -> CasePatch {
    CasePatch {
        status: Some(LitmasStatus::Review),
        assigned_anev_id: Some(ActorId::new(anev)),
        waktu_upload_laporan: Some(datetime!(2026-01-07 09:00 UTC)),
        ..CasePatch::default()
    }
}

// ── Racing first submissions: exactly one verifier ───────────────────────────

/// N tasks submit the same case for the first time, each naming a different
/// verifier. Exactly one update lands; the rest see ConcurrentConflict and
/// the stored verifier is the winner's.
async fn racing_first_submissions_assign_one_verifier<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let case = seed_case(storage.as_ref()).await?;
    storage
        .update_case(
            case.id,
            &UpdateGuard::status(LitmasStatus::NewTask),
            &CasePatch {
                status: Some(LitmasStatus::OnProgress),
                ..CasePatch::default()
            },
        )
        .await
        .map_err(|e| format!("move to On Progress: {e}"))?;

    let case_id = case.id;
    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let anev = format!("anev-{i}");
            let guard = UpdateGuard {
                expected_status: Some(LitmasStatus::OnProgress),
                require_anev_unset: true,
            };
            match s
                .update_case(case_id, &guard, &first_submission(anev.clone()))
                .await
            {
                Ok(_) => Ok(Some(anev)),
                Err(StorageError::ConcurrentConflict { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = Vec::new();
    let mut losers = 0usize;
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        match outcome {
            Some(anev) => winners.push(anev),
            None => losers += 1,
        }
    }

    if winners.len() != 1 {
        return Err(format!("expected exactly 1 winner, got {:?}", winners));
    }
    if losers != N - 1 {
        return Err(format!("expected {} losers, got {losers}", N - 1));
    }

    let read = storage
        .get_case(case.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if read.status != LitmasStatus::Review {
        return Err(format!("expected Review, got '{}'", read.status));
    }
    if read.assigned_anev_id.as_ref().map(ActorId::as_str) != Some(winners[0].as_str()) {
        return Err(format!(
            "stored verifier {:?} is not the winner {}",
            read.assigned_anev_id, winners[0]
        ));
    }
    Ok(())
}

// ── Concurrent updates to different cases: all succeed ───────────────────────

/// No false conflicts when there is no contention.
async fn concurrent_updates_different_cases_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let mut ids = Vec::with_capacity(N);
    for _ in 0..N {
        ids.push(seed_case(storage.as_ref()).await?.id);
    }

    let mut handles = Vec::new();
    for id in ids.iter().copied() {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.update_case(
                id,
                &UpdateGuard::status(LitmasStatus::NewTask),
                &CasePatch {
                    status: Some(LitmasStatus::OnProgress),
                    ..CasePatch::default()
                },
            )
            .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        handle
            .await
            .map_err(|e| format!("task {i} panic: {e}"))?
            .map_err(|e| format!("task {i} failed: {e}"))?;
    }

    for id in ids {
        let read = storage
            .get_case(id)
            .await
            .map_err(|e| format!("get {id}: {e}"))?;
        if read.status != LitmasStatus::OnProgress {
            return Err(format!(
                "litmas {id}: expected On Progress, got '{}'",
                read.status
            ));
        }
    }
    Ok(())
}

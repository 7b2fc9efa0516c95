use std::future::Future;

use time::macros::datetime;

use monalisa_core::{ActorId, LitmasStatus, NewLitmas, NewPenjamin, NewPerkara};

use super::{klien, seed_case, user, CheckResult, PK};
use crate::{CaseStore, StorageError};

pub(super) async fn run_insert_tests<S, F, Fut>(factory: &F) -> Vec<CheckResult>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(CheckResult::new(
        "insert",
        "insert_case_starts_as_new_task",
        insert_case_starts_as_new_task(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "insert_case_assigns_distinct_ids",
        insert_case_assigns_distinct_ids(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "insert_case_rejects_unknown_klien",
        insert_case_rejects_unknown_klien(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "insert_case_rejects_foreign_penjamin",
        insert_case_rejects_foreign_penjamin(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "insert_klien_rejects_duplicate_nik",
        insert_klien_rejects_duplicate_nik(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "insert_perkara_attaches_to_case",
        insert_perkara_attaches_to_case(factory).await,
    ));
    results.push(CheckResult::new(
        "insert",
        "get_unknown_case_is_not_found",
        get_unknown_case_is_not_found(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A fresh case is `New Task` with no verifier, slot or documents.
async fn insert_case_starts_as_new_task<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let read = s.get_case(case.id).await.map_err(|e| e.to_string())?;
    if read.status != LitmasStatus::NewTask {
        return Err(format!("expected New Task, got '{}'", read.status));
    }
    if read.assigned_anev_id.is_some()
        || read.tpp_schedule_id.is_some()
        || read.surat_tugas_signed_url.is_some()
        || read.hasil_litmas_url.is_some()
    {
        return Err(format!("fresh case has workflow fields set: {:?}", read));
    }
    if read.assigned_pk_id != ActorId::from(PK) {
        return Err(format!("caseworker not stored: {}", read.assigned_pk_id));
    }
    Ok(())
}

async fn insert_case_assigns_distinct_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = seed_case(&s).await?;
    let b = s
        .insert_case(NewLitmas {
            jenis_litmas: "Asimilasi".to_string(),
            klien_id: a.klien_id,
            penjamin_id: None,
            assigned_pk_id: ActorId::from(PK),
            waktu_registrasi: datetime!(2026-01-06 08:00 UTC),
        })
        .await
        .map_err(|e| e.to_string())?;
    if a.id == b.id {
        return Err(format!("both cases got id {}", a.id));
    }
    Ok(())
}

async fn insert_case_rejects_unknown_klien<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.upsert_user(user(PK, "Sari", monalisa_core::Role::Pk))
        .await
        .map_err(|e| e.to_string())?;
    let result = s
        .insert_case(NewLitmas {
            jenis_litmas: "Asimilasi".to_string(),
            klien_id: 9_999,
            penjamin_id: None,
            assigned_pk_id: ActorId::from(PK),
            waktu_registrasi: datetime!(2026-01-06 08:00 UTC),
        })
        .await;
    match result {
        Err(StorageError::Constraint(_)) => Ok(()),
        other => Err(format!("expected Constraint, got {:?}", other)),
    }
}

async fn insert_case_rejects_foreign_penjamin<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let other = s
        .insert_klien(klien("Andi", None))
        .await
        .map_err(|e| e.to_string())?;
    let penjamin = s
        .insert_penjamin(
            other.id,
            NewPenjamin {
                nama: "Siti".to_string(),
                hubungan: Some("Ibu".to_string()),
                no_hp: None,
                alamat: None,
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    let result = s
        .insert_case(NewLitmas {
            jenis_litmas: "Asimilasi".to_string(),
            klien_id: case.klien_id,
            penjamin_id: Some(penjamin.id),
            assigned_pk_id: ActorId::from(PK),
            waktu_registrasi: datetime!(2026-01-06 08:00 UTC),
        })
        .await;
    match result {
        Err(StorageError::Constraint(_)) => Ok(()),
        other => Err(format!("expected Constraint, got {:?}", other)),
    }
}

async fn insert_klien_rejects_duplicate_nik<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert_klien(klien("Budi", Some("3201010101010001")))
        .await
        .map_err(|e| e.to_string())?;
    match s.insert_klien(klien("Budi S.", Some("3201010101010001"))).await {
        Err(StorageError::Constraint(_)) => Ok(()),
        other => Err(format!("expected Constraint, got {:?}", other)),
    }
}

async fn insert_perkara_attaches_to_case<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let case = seed_case(&s).await?;
    let charge = |pasal: &str| NewPerkara {
        pasal: pasal.to_string(),
        tindak_pidana: "Pencurian".to_string(),
        vonis_bulan: Some(18),
        denda: None,
        subsider_bulan: None,
        tanggal_penahanan: None,
        tanggal_ekspirasi: None,
    };
    let inserted = s
        .insert_perkara(case.id, vec![charge("362 KUHP"), charge("363 KUHP")])
        .await
        .map_err(|e| e.to_string())?;
    if inserted.len() != 2 || inserted.iter().any(|p| p.litmas_id != case.id) {
        return Err(format!("unexpected insert result: {:?}", inserted));
    }
    let listed = s.list_perkara(case.id).await.map_err(|e| e.to_string())?;
    if listed != inserted {
        return Err(format!("list_perkara returned {:?}", listed));
    }
    match s.insert_perkara(case.id + 1_000, vec![charge("362 KUHP")]).await {
        Err(StorageError::CaseNotFound(_)) => Ok(()),
        other => Err(format!("expected CaseNotFound, got {:?}", other)),
    }
}

async fn get_unknown_case_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_case(42).await {
        Err(StorageError::CaseNotFound(42)) => Ok(()),
        other => Err(format!("expected CaseNotFound(42), got {:?}", other)),
    }
}

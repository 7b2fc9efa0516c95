use std::future::Future;

use time::macros::date;

use monalisa_core::{
    ActorId, CasePatch, LitmasStatus, NewTppSchedule, Role, TppSlotStatus, UpdateGuard,
};

use super::{klien, seed_case, user, CheckResult, PK};
use crate::{CaseFilter, CaseStore, KlienQuery};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<CheckResult>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(CheckResult::new(
        "query",
        "list_cases_filters_by_status_and_actor",
        list_cases_filters_by_status_and_actor(factory).await,
    ));
    results.push(CheckResult::new(
        "query",
        "search_klien_by_name_or_nik",
        search_klien_by_name_or_nik(factory).await,
    ));
    results.push(CheckResult::new(
        "query",
        "open_schedules_exclude_closed_and_past",
        open_schedules_exclude_closed_and_past(factory).await,
    ));
    results.push(CheckResult::new(
        "query",
        "users_listed_by_role",
        users_listed_by_role(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn list_cases_filters_by_status_and_actor<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = seed_case(&s).await?;
    let b = seed_case(&s).await?;
    s.update_case(
        b.id,
        &UpdateGuard::status(LitmasStatus::NewTask),
        &CasePatch {
            status: Some(LitmasStatus::OnProgress),
            ..CasePatch::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    let all = s
        .list_cases(&CaseFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    if all.len() != 2 {
        return Err(format!("expected 2 cases, got {}", all.len()));
    }

    let new_tasks = s
        .list_cases(&CaseFilter::status(LitmasStatus::NewTask))
        .await
        .map_err(|e| e.to_string())?;
    if new_tasks.iter().map(|c| c.id).collect::<Vec<_>>() != vec![a.id] {
        return Err(format!("status filter returned {:?}", new_tasks));
    }

    let mine = s
        .list_cases(&CaseFilter::caseworker(ActorId::from(PK)))
        .await
        .map_err(|e| e.to_string())?;
    if mine.len() != 2 {
        return Err(format!("caseworker filter returned {} cases", mine.len()));
    }

    let nobody = s
        .list_cases(&CaseFilter {
            assigned_anev_id: Some(ActorId::from("anev-1")),
            ..CaseFilter::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    if !nobody.is_empty() {
        return Err(format!("verifier filter matched unassigned cases: {:?}", nobody));
    }
    Ok(())
}

async fn search_klien_by_name_or_nik<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (nama, nik) in [
        ("Budi Santoso", Some("3201010101010001")),
        ("Ahmad Budiman", None),
        ("Citra Lestari", Some("3201010101010003")),
    ] {
        s.insert_klien(klien(nama, nik))
            .await
            .map_err(|e| e.to_string())?;
    }

    let by_name = s
        .search_klien(&KlienQuery {
            nama: Some("BUDI".to_string()),
            ..KlienQuery::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    let names: Vec<_> = by_name.iter().map(|k| k.nama.as_str()).collect();
    if names != vec!["Ahmad Budiman", "Budi Santoso"] {
        return Err(format!("name search returned {:?}", names));
    }

    let by_nik = s
        .search_klien(&KlienQuery {
            nik: Some("3201010101010003".to_string()),
            ..KlienQuery::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    if by_nik.len() != 1 || by_nik[0].nama != "Citra Lestari" {
        return Err(format!("NIK search returned {:?}", by_nik));
    }

    let limited = s
        .search_klien(&KlienQuery {
            nama: Some("a".to_string()),
            limit: 1,
            ..KlienQuery::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    if limited.len() != 1 {
        return Err(format!("limit ignored: {} results", limited.len()));
    }

    let empty = s
        .search_klien(&KlienQuery::default())
        .await
        .map_err(|e| e.to_string())?;
    if !empty.is_empty() {
        return Err(format!("empty query matched {} clients", empty.len()));
    }
    Ok(())
}

async fn open_schedules_exclude_closed_and_past<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let slot = |tanggal_sidang, status| NewTppSchedule {
        tanggal_sidang,
        status,
        keterangan: None,
    };
    s.insert_tpp_schedule(slot(date!(2026 - 02 - 20), TppSlotStatus::Open))
        .await
        .map_err(|e| e.to_string())?;
    let past = s
        .insert_tpp_schedule(slot(date!(2026 - 01 - 10), TppSlotStatus::Open))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_tpp_schedule(slot(date!(2026 - 02 - 01), TppSlotStatus::Closed))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_tpp_schedule(slot(date!(2026 - 01 - 15), TppSlotStatus::Open))
        .await
        .map_err(|e| e.to_string())?;

    let open = s
        .list_open_tpp_schedules(date!(2026 - 01 - 15))
        .await
        .map_err(|e| e.to_string())?;
    let dates: Vec<_> = open.iter().map(|s| s.tanggal_sidang).collect();
    if dates != vec![date!(2026 - 01 - 15), date!(2026 - 02 - 20)] {
        return Err(format!("open slots: {:?}", dates));
    }

    let fetched = s
        .get_tpp_schedule(past.id)
        .await
        .map_err(|e| e.to_string())?;
    if fetched != past {
        return Err("get_tpp_schedule returned a different row".to_string());
    }
    Ok(())
}

async fn users_listed_by_role<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for u in [
        user("anev-1", "Dewi", Role::Anev),
        user("anev-2", "Rina", Role::Anev),
        user(PK, "Sari", Role::Pk),
    ] {
        s.upsert_user(u).await.map_err(|e| e.to_string())?;
    }
    let anev = s
        .list_users_with_role(&Role::Anev)
        .await
        .map_err(|e| e.to_string())?;
    if anev.len() != 2 || anev.iter().any(|u| !u.roles.contains(&Role::Anev)) {
        return Err(format!("role listing returned {:?}", anev));
    }
    let read = s
        .get_user(&ActorId::from(PK))
        .await
        .map_err(|e| e.to_string())?;
    if read.nama != "Sari" {
        return Err(format!("get_user returned {:?}", read));
    }
    Ok(())
}

//! Conformance test suite for `CaseStore` implementations.
//!
//! Checks any `CaseStore` against the behavior the workflow relies on:
//!
//! - **Insert**: id assignment, initial status, referential constraints
//! - **Update guards**: status checks, the write-once verifier column
//! - **Queries**: case filters, client search, open sitting slots
//! - **Concurrency**: racing first submissions assign exactly one verifier
//!
//! # Usage
//!
//! A backend passes a factory for empty stores and asserts on the report:
//!
//! ```ignore
//! use monalisa_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_store().await
//!     }).await;
//!     assert_eq!(report.failed(), 0, "{report}");
//! }
//! ```

mod concurrent;
mod insert;
mod query;
mod update;

use std::fmt;
use std::future::Future;

use time::macros::datetime;

use monalisa_core::{ActorId, KategoriUsia, Litmas, NewKlien, NewLitmas, Role, UserProfile};

use crate::CaseStore;

/// Outcome of one conformance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub category: &'static str,
    pub name: &'static str,
    /// Why the check failed; `None` when it passed.
    pub failure: Option<String>,
}

impl CheckResult {
    fn new(category: &'static str, name: &'static str, outcome: Result<(), String>) -> Self {
        CheckResult {
            category,
            name,
            failure: outcome.err(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Every check from one suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub results: Vec<CheckResult>,
}

impl ConformanceReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failed();
        writeln!(
            f,
            "CaseStore conformance: {} of {} checks failed",
            failed,
            self.total()
        )?;
        for r in self.failures() {
            let why = r.failure.as_deref().unwrap_or_default();
            writeln!(f, "  {}::{} -- {}", r.category, r.name, why)?;
        }
        Ok(())
    }
}

/// Run every check against stores built by `factory`.
///
/// `factory` must return a fresh, empty store on each call; checks never
/// share state.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: CaseStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut report = ConformanceReport::default();
    report.results.extend(insert::run_insert_tests(&factory).await);
    report.results.extend(update::run_update_tests(&factory).await);
    report.results.extend(query::run_query_tests(&factory).await);
    report
        .results
        .extend(concurrent::run_concurrent_tests(&factory).await);
    report
}

// ── Helpers: seed rows with sensible defaults ────────────────────────────────

const PK: &str = "pk-1";

fn user(id: &str, nama: &str, role: Role) -> UserProfile {
    UserProfile {
        id: ActorId::from(id),
        nama: nama.to_string(),
        nip: None,
        no_hp: Some("6281200000000".to_string()),
        roles: [role].into_iter().collect(),
    }
}

fn klien(nama: &str, nik: Option<&str>) -> NewKlien {
    NewKlien {
        nama: nama.to_string(),
        nik: nik.map(str::to_string),
        jenis_kelamin: Some("L".to_string()),
        tempat_lahir: None,
        tanggal_lahir: None,
        alamat: None,
        kategori_usia: KategoriUsia::Dewasa,
    }
}

/// Insert a caseworker, a client and one case for them.
async fn seed_case<S: CaseStore>(s: &S) -> Result<Litmas, String> {
    s.upsert_user(user(PK, "Sari Wulandari", Role::Pk))
        .await
        .map_err(|e| e.to_string())?;
    let k = s
        .insert_klien(klien("Budi Santoso", None))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_case(NewLitmas {
        jenis_litmas: "Pembebasan Bersyarat".to_string(),
        klien_id: k.id,
        penjamin_id: None,
        assigned_pk_id: ActorId::from(PK),
        waktu_registrasi: datetime!(2026-01-05 08:00 UTC),
    })
    .await
    .map_err(|e| e.to_string())
}

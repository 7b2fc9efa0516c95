//! Case intake and caseworker reassignment.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use monalisa_core::model::{KlienId, LitmasId};
use monalisa_core::reference::lookup_jenis_litmas;
use monalisa_core::{
    Actor, ActorId, CasePatch, Klien, Litmas, LitmasStatus, NewKlien, NewLitmas, NewPenjamin,
    NewPerkara, Penjamin, Perkara, Role, UpdateGuard,
};
use monalisa_storage::{KlienQuery, StorageError};

use crate::error::WorkflowError;
use crate::service::LitmasWorkflow;

/// Shortest name fragment worth searching for.
pub const MIN_NAME_QUERY: usize = 3;

/// Most candidates returned by the duplicate check.
const DUPLICATE_LIMIT: usize = 10;

/// The client of a new case: one already on file, or a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KlienInput {
    Existing(KlienId),
    New(NewKlien),
}

/// Everything the registration form collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRegistration {
    pub klien: KlienInput,
    #[serde(default)]
    pub penjamin: Option<NewPenjamin>,
    pub perkara: Vec<NewPerkara>,
    /// Catalog code or label.
    pub jenis_litmas: String,
    pub assigned_pk_id: ActorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredCase {
    pub litmas: Litmas,
    pub klien: Klien,
    pub penjamin: Option<Penjamin>,
    pub perkara: Vec<Perkara>,
}

impl LitmasWorkflow {
    /// Register a case in `New Task` with its client, guarantor and charges.
    ///
    /// Registration operators may only register clients of their own age
    /// category; admins may register any.
    pub async fn register_case(
        &self,
        actor: &Actor,
        registration: CaseRegistration,
    ) -> Result<RegisteredCase, WorkflowError> {
        if !(actor.is_admin() || actor.is_registration_operator()) {
            return Err(WorkflowError::NotAuthorized {
                actor: actor.id.clone(),
                operation: "register cases",
            });
        }

        let CaseRegistration {
            klien,
            penjamin,
            perkara,
            jenis_litmas,
            assigned_pk_id,
        } = registration;

        if perkara.is_empty() {
            return Err(WorkflowError::validation("at least one perkara is required"));
        }
        if let Some(p) = perkara
            .iter()
            .find(|p| p.pasal.trim().is_empty() || p.tindak_pidana.trim().is_empty())
        {
            return Err(WorkflowError::validation(format!(
                "perkara needs both pasal and tindak pidana (got pasal '{}')",
                p.pasal
            )));
        }
        if penjamin.as_ref().is_some_and(|p| p.nama.trim().is_empty()) {
            return Err(WorkflowError::validation("penjamin name is empty"));
        }
        let jenis = lookup_jenis_litmas(&jenis_litmas).ok_or_else(|| {
            WorkflowError::validation(format!("unknown jenis litmas '{}'", jenis_litmas))
        })?;

        let kategori = match &klien {
            KlienInput::New(new) => {
                if new.nama.trim().is_empty() {
                    return Err(WorkflowError::validation("klien name is empty"));
                }
                new.kategori_usia
            }
            KlienInput::Existing(id) => match self.store.get_klien(*id).await {
                Ok(k) => k.kategori_usia,
                Err(StorageError::KlienNotFound(id)) => {
                    return Err(WorkflowError::validation(format!(
                        "klien {} does not exist",
                        id
                    )))
                }
                Err(e) => return Err(e.into()),
            },
        };
        if !actor.is_admin() && !actor.has_role(&kategori.operator_role()) {
            return Err(WorkflowError::NotAuthorized {
                actor: actor.id.clone(),
                operation: "register clients of this age category",
            });
        }
        if !jenis.applies_to(kategori) {
            return Err(WorkflowError::validation(format!(
                "{} does not apply to {:?} clients",
                jenis.label, kategori
            )));
        }
        self.require_role(&assigned_pk_id, &Role::Pk).await?;

        // From here on every statement is a separate write.
        let klien = match klien {
            KlienInput::Existing(id) => self.store.get_klien(id).await?,
            KlienInput::New(new) => self.store.insert_klien(new).await?,
        };
        let penjamin = match penjamin {
            Some(p) => Some(self.store.insert_penjamin(klien.id, p).await?),
            None => None,
        };
        let litmas = self
            .store
            .insert_case(NewLitmas {
                jenis_litmas: jenis.label.to_string(),
                klien_id: klien.id,
                penjamin_id: penjamin.as_ref().map(|p| p.id),
                assigned_pk_id,
                waktu_registrasi: self.clock.now(),
            })
            .await?;
        let perkara = match self.store.insert_perkara(litmas.id, perkara).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(litmas_id = litmas.id, error = %e, "case registered without its perkara");
                return Err(e.into());
            }
        };

        info!(
            litmas_id = litmas.id,
            klien_id = klien.id,
            pk = %litmas.assigned_pk_id,
            jenis = %litmas.jenis_litmas,
            "case registered"
        );
        Ok(RegisteredCase {
            litmas,
            klien,
            penjamin,
            perkara,
        })
    }

    /// Clients that may be the one being typed in.
    ///
    /// Name fragments shorter than three characters are ignored; with
    /// nothing left to search for the result is empty.
    pub async fn find_duplicate_klien(
        &self,
        nama: Option<&str>,
        nik: Option<&str>,
    ) -> Result<Vec<Klien>, WorkflowError> {
        let nama = nama
            .map(str::trim)
            .filter(|n| n.chars().count() >= MIN_NAME_QUERY);
        let nik = nik.map(str::trim).filter(|n| !n.is_empty());
        if nama.is_none() && nik.is_none() {
            return Ok(Vec::new());
        }
        let found = self
            .store
            .search_klien(&KlienQuery {
                nama: nama.map(str::to_string),
                nik: nik.map(str::to_string),
                limit: DUPLICATE_LIMIT,
            })
            .await?;
        Ok(found)
    }

    /// Hand a case to another caseworker. The status does not change.
    pub async fn reassign_pk(
        &self,
        actor: &Actor,
        case_id: LitmasId,
        new_pk: ActorId,
    ) -> Result<Litmas, WorkflowError> {
        if !actor.is_supervisor() {
            return Err(WorkflowError::NotAuthorized {
                actor: actor.id.clone(),
                operation: "reassign caseworkers",
            });
        }
        let case = self.store.get_case(case_id).await?;
        if case.status == LitmasStatus::Selesai {
            return Err(WorkflowError::validation(format!(
                "litmas {} is already {}",
                case_id, case.status
            )));
        }
        self.require_role(&new_pk, &Role::Pk).await?;

        let previous = case.assigned_pk_id.clone();
        let patch = CasePatch {
            assigned_pk_id: Some(new_pk),
            ..CasePatch::default()
        };
        let litmas = self
            .store
            .update_case(case_id, &UpdateGuard::status(case.status), &patch)
            .await
            .map_err(|source| WorkflowError::Persistence {
                source,
                orphaned_blob: None,
            })?;
        info!(
            litmas_id = case_id,
            from = %previous,
            to = %litmas.assigned_pk_id,
            actor = %actor.id,
            "caseworker reassigned"
        );
        Ok(litmas)
    }

    pub(crate) async fn require_role(
        &self,
        user_id: &ActorId,
        role: &Role,
    ) -> Result<(), WorkflowError> {
        match self.store.get_user(user_id).await {
            Ok(user) if user.roles.contains(role) => Ok(()),
            Ok(_) => Err(WorkflowError::validation(format!(
                "{} does not hold the {} role",
                user_id, role
            ))),
            Err(StorageError::UserNotFound(id)) => {
                Err(WorkflowError::validation(format!("unknown user {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

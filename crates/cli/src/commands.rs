//! Command dispatch: open the configured collaborators, run one workflow
//! operation, persist the store if it changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::UtcOffset;
use tracing::debug;

use monalisa_core::model::LitmasId;
use monalisa_core::{Actor, ActorId, NewTppSchedule, Role, TppSlotStatus, UserProfile};
use monalisa_storage::{CaseStore, IdentityError, IdentityProvider, MemoryStore, StoreIdentity};
use monalisa_workflow::{CaseRegistration, DocumentUpload, LitmasWorkflow, SystemClock};

use crate::blob::FsBlobStore;
use crate::config::{self, MonalisaConfig};
use crate::notifier::WebhookNotifier;
use crate::render::{self, Rendered};
use crate::store;
use crate::{Commands, KlienCommands, ScheduleCommands, UserCommands};

/// Global flags every command needs.
pub struct Options {
    pub config: PathBuf,
    pub actor: Option<String>,
}

struct Context {
    store: Arc<MemoryStore>,
    store_path: PathBuf,
    workflow: LitmasWorkflow,
    actor_id: Option<ActorId>,
}

impl Context {
    async fn open(options: &Options) -> Result<Self, String> {
        let config = config::read_config(&options.config)?;
        Context::from_config(&config, options.actor.as_deref()).await
    }

    async fn from_config(config: &MonalisaConfig, actor: Option<&str>) -> Result<Self, String> {
        let store = Arc::new(store::load(&config.store.path).await?);
        debug!(path = %config.store.path.display(), "store loaded");

        let offset = UtcOffset::from_hms(config.workflow.utc_offset_hours, 0, 0)
            .map_err(|e| format!("invalid utc_offset_hours: {}", e))?;
        let blobs = Arc::new(FsBlobStore::new(
            config.blob.root.clone(),
            config.blob.public_base_url.clone(),
        ));
        let notifier = Arc::new(WebhookNotifier::new(&config.notifier));
        let workflow = LitmasWorkflow::new(store.clone(), blobs, notifier)
            .with_clock(Arc::new(SystemClock::new(offset)))
            .with_config(config.workflow.workflow_config());

        Ok(Context {
            store,
            store_path: config.store.path.clone(),
            workflow,
            actor_id: actor.map(ActorId::from),
        })
    }

    async fn actor(&self) -> Result<Actor, String> {
        let identity = StoreIdentity::new(self.store.clone(), self.actor_id.clone());
        identity.current_actor().await.map_err(|e| match e {
            IdentityError::Anonymous => "no acting user; pass --actor <user-id>".to_string(),
            other => other.to_string(),
        })
    }

    async fn require_admin(&self, operation: &str) -> Result<Actor, String> {
        let actor = self.actor().await?;
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(format!("{} may not {}; admin role required", actor.id, operation))
        }
    }

    async fn save(&self) -> Result<(), String> {
        store::save(&self.store_path, &self.store).await?;
        debug!(path = %self.store_path.display(), "store saved");
        Ok(())
    }
}

fn failed(e: impl std::fmt::Display) -> String {
    e.to_string()
}

async fn read_document(path: &Path) -> Result<DocumentUpload, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(DocumentUpload::new(file_name, bytes))
}

async fn read_registration(path: &Path) -> Result<CaseRegistration, String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("invalid registration in '{}': {}", path.display(), e))
}

pub async fn run(options: Options, command: Commands) -> Result<Rendered, String> {
    if let Commands::Init { force } = command {
        return init(&options.config, force).await;
    }

    let ctx = Context::open(&options).await?;
    let workflow = &ctx.workflow;

    let (rendered, mutated) = match command {
        Commands::Init { force } => (init(&options.config, force).await?, false),
        Commands::User { command } => user(&ctx, command).await?,
        Commands::Schedule { command } => schedule(&ctx, command).await?,
        Commands::Klien {
            command: KlienCommands::Search { nama, nik },
        } => {
            let found = workflow
                .find_duplicate_klien(nama.as_deref(), nik.as_deref())
                .await
                .map_err(failed)?;
            (render::klien_list(&found)?, false)
        }
        Commands::Register { file } => {
            let actor = ctx.actor().await?;
            let registration = read_registration(&file).await?;
            let registered = workflow
                .register_case(&actor, registration)
                .await
                .map_err(failed)?;
            (render::registered(&registered)?, true)
        }
        Commands::UploadTask { case_id, file } => {
            let actor = ctx.actor().await?;
            let document = read_document(&file).await?;
            let report = workflow
                .upload_surat_tugas(&actor, case_id, document)
                .await
                .map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::SubmitReport {
            case_id,
            file,
            verifier,
        } => {
            let actor = ctx.actor().await?;
            let document = read_document(&file).await?;
            let verifier = verifier.as_deref().map(ActorId::from);
            let report = workflow
                .submit_laporan(&actor, case_id, document, verifier)
                .await
                .map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::Approve { case_id } => {
            let actor = ctx.actor().await?;
            let report = workflow.approve(&actor, case_id).await.map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::Revise { case_id, note } => {
            let actor = ctx.actor().await?;
            let report = workflow
                .return_for_revision(&actor, case_id, note)
                .await
                .map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::RegisterTpp { case_id, slot_id } => {
            let actor = ctx.actor().await?;
            let report = workflow
                .register_tpp(&actor, case_id, slot_id)
                .await
                .map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::Complete { case_id } => {
            let actor = ctx.actor().await?;
            let report = workflow.mark_complete(&actor, case_id).await.map_err(failed)?;
            (render::transition(&report)?, true)
        }
        Commands::Reassign { case_id, pk } => {
            let actor = ctx.actor().await?;
            let case = workflow
                .reassign_pk(&actor, case_id, ActorId::from(pk.as_str()))
                .await
                .map_err(failed)?;
            let text = format!("Litmas {} reassigned to {}", case.id, case.assigned_pk_id);
            (Rendered::new(text, &case)?, true)
        }
        Commands::Show { case_id } => (show(&ctx, case_id).await?, false),
        Commands::List => {
            let actor = ctx.actor().await?;
            let cases = workflow.my_cases(&actor).await.map_err(failed)?;
            (render::case_list(&cases)?, false)
        }
        Commands::Actions { case_id } => {
            let actor = ctx.actor().await?;
            let space = workflow
                .quick_actions(&actor, case_id)
                .await
                .map_err(failed)?;
            (render::actions(&space)?, false)
        }
        Commands::Summary => {
            let summary = workflow.status_summary().await.map_err(failed)?;
            (render::summary(&summary)?, false)
        }
    };

    if mutated {
        ctx.save().await?;
    }
    Ok(rendered)
}

async fn init(config_path: &Path, force: bool) -> Result<Rendered, String> {
    if config_path.exists() && !force {
        return Err(format!(
            "'{}' already exists; pass --force to overwrite",
            config_path.display()
        ));
    }
    let content = config::render_default_config()?;
    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("could not create '{}': {}", dir.display(), e))?;
    }
    tokio::fs::write(config_path, content)
        .await
        .map_err(|e| format!("could not write '{}': {}", config_path.display(), e))?;

    let config = config::read_config(config_path)?;
    if !config.store.path.exists() {
        store::save(&config.store.path, &MemoryStore::new()).await?;
    }

    let text = format!(
        "Wrote {} (store: {})",
        config_path.display(),
        config.store.path.display()
    );
    Rendered::new(
        text,
        &serde_json::json!({
            "config": config_path.display().to_string(),
            "store": config.store.path.display().to_string(),
        }),
    )
}

async fn user(ctx: &Context, command: UserCommands) -> Result<(Rendered, bool), String> {
    match command {
        UserCommands::Add {
            id,
            nama,
            roles,
            nip,
            no_hp,
        } => {
            let profile = UserProfile {
                id: ActorId::from(id.as_str()),
                nama,
                nip,
                no_hp,
                roles: roles.into_iter().map(Role::from).collect(),
            };
            let admins = ctx
                .store
                .list_users_with_role(&Role::Admin)
                .await
                .map_err(failed)?;
            if !admins.is_empty() {
                ctx.require_admin("add users").await?;
            } else if !profile.roles.contains(&Role::Admin) {
                // Bootstrap: with no admin yet, only an admin may be created.
                return Err("no admin exists yet; the first user must have the admin role".into());
            }
            ctx.store
                .upsert_user(profile.clone())
                .await
                .map_err(failed)?;
            let rendered = render::users(std::slice::from_ref(&profile))?;
            Ok((rendered, true))
        }
        UserCommands::List { role } => {
            let users = ctx
                .store
                .list_users_with_role(&Role::from(role))
                .await
                .map_err(failed)?;
            Ok((render::users(&users)?, false))
        }
    }
}

async fn schedule(ctx: &Context, command: ScheduleCommands) -> Result<(Rendered, bool), String> {
    match command {
        ScheduleCommands::Add {
            date,
            closed,
            keterangan,
        } => {
            ctx.require_admin("add TPP schedules").await?;
            let status = if closed {
                TppSlotStatus::Closed
            } else {
                TppSlotStatus::Open
            };
            let slot = ctx
                .store
                .insert_tpp_schedule(NewTppSchedule {
                    tanggal_sidang: date,
                    status,
                    keterangan,
                })
                .await
                .map_err(failed)?;
            let text = format!("Added slot {} on {}", slot.id, slot.tanggal_sidang);
            Ok((Rendered::new(text, &slot)?, true))
        }
        ScheduleCommands::List => {
            let slots = ctx.workflow.open_schedules().await.map_err(failed)?;
            Ok((render::schedules(&slots)?, false))
        }
    }
}

async fn show(ctx: &Context, case_id: LitmasId) -> Result<Rendered, String> {
    let detail = ctx.workflow.case_detail(case_id).await.map_err(failed)?;
    render::detail(&detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlobSettings, StoreSettings};

    fn config_in(dir: &Path) -> MonalisaConfig {
        MonalisaConfig {
            store: StoreSettings {
                path: dir.join("state.json"),
            },
            blob: BlobSettings {
                root: dir.join("documents"),
                public_base_url: None,
            },
            ..MonalisaConfig::default()
        }
    }

    #[tokio::test]
    async fn actor_is_resolved_from_users_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let anonymous = Context::from_config(&config, None).await.unwrap();
        assert!(anonymous.actor().await.unwrap_err().contains("--actor"));

        anonymous
            .store
            .upsert_user(UserProfile {
                id: ActorId::from("kasie-1"),
                nama: "Hendra".to_string(),
                nip: None,
                no_hp: None,
                roles: [Role::Kasie].into_iter().collect(),
            })
            .await
            .unwrap();
        anonymous.save().await.unwrap();

        let ctx = Context::from_config(&config, Some("kasie-1")).await.unwrap();
        let actor = ctx.actor().await.unwrap();
        assert!(actor.is_supervisor());

        let unknown = Context::from_config(&config, Some("ghost")).await.unwrap();
        assert!(unknown.actor().await.unwrap_err().contains("ghost"));
    }

    #[tokio::test]
    async fn first_user_must_be_admin_then_admins_gate_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let add = |id: &str, role: &str| UserCommands::Add {
            id: id.to_string(),
            nama: id.to_string(),
            roles: vec![role.to_string()],
            nip: None,
            no_hp: None,
        };

        let anonymous = Context::from_config(&config, None).await.unwrap();
        let err = user(&anonymous, add("pk-1", "pk")).await.unwrap_err();
        assert!(err.contains("admin"));
        user(&anonymous, add("admin-1", "admin")).await.unwrap();
        assert!(user(&anonymous, add("pk-1", "pk")).await.unwrap_err().contains("--actor"));

        let admin = Context {
            actor_id: Some(ActorId::from("admin-1")),
            ..anonymous
        };
        user(&admin, add("pk-1", "pk")).await.unwrap();

        let pk = Context {
            actor_id: Some(ActorId::from("pk-1")),
            ..admin
        };
        let err = user(&pk, add("pk-2", "admin")).await.unwrap_err();
        assert!(err.contains("pk-1 may not add users"));
        let err = schedule(
            &pk,
            ScheduleCommands::Add {
                date: time::macros::date!(2026 - 03 - 02),
                closed: false,
                keterangan: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.contains("admin role required"));
    }

    #[tokio::test]
    async fn out_of_range_offset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.workflow.utc_offset_hours = 30;
        let err = Context::from_config(&config, None).await.err().unwrap();
        assert!(err.contains("utc_offset_hours"));
    }
}

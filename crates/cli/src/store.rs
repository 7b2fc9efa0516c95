//! The CLI's data store: a [`MemoryStore`] loaded from and saved back to a
//! single JSON document.

use std::path::Path;

use monalisa_storage::{MemoryStore, StoreState};

/// Load the tables at `path`. A missing file is an empty store.
pub async fn load(path: &Path) -> Result<MemoryStore, String> {
    let state = match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str::<StoreState>(&content)
            .map_err(|e| format!("invalid store file '{}': {}", path.display(), e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
        Err(e) => return Err(format!("could not read '{}': {}", path.display(), e)),
    };
    Ok(MemoryStore::from_state(state))
}

/// Write every table to `path`, replacing the previous document in one
/// rename.
pub async fn save(path: &Path, store: &MemoryStore) -> Result<(), String> {
    let state = store.snapshot().await;
    let json = serde_json::to_string_pretty(&state)
        .map_err(|e| format!("could not serialize store: {}", e))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("could not create '{}': {}", dir.display(), e))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| format!("could not write '{}': {}", tmp.display(), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| format!("could not replace '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use monalisa_core::{ActorId, Role, UserProfile};
    use monalisa_storage::CaseStore;

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = load(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(store.snapshot().await, StoreState::default());
    }

    #[tokio::test]
    async fn saved_tables_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");

        let store = MemoryStore::new();
        store
            .upsert_user(UserProfile {
                id: ActorId::from("pk-1"),
                nama: "Sari Wulandari".to_string(),
                nip: None,
                no_hp: None,
                roles: [Role::Pk].into_iter().collect(),
            })
            .await
            .unwrap();
        save(&path, &store).await.unwrap();

        let reloaded = load(&path).await.unwrap();
        let user = reloaded.get_user(&ActorId::from("pk-1")).await.unwrap();
        assert_eq!(user.nama, "Sari Wulandari");
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).await.unwrap_err();
        assert!(err.starts_with("invalid store file"));
    }
}

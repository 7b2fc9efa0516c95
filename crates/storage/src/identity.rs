use std::sync::Arc;

use async_trait::async_trait;

use monalisa_core::{Actor, ActorId};

use crate::error::{IdentityError, StorageError};
use crate::traits::{CaseStore, IdentityProvider};

/// Always returns the same actor.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Actor);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> Result<Actor, IdentityError> {
        Ok(self.0.clone())
    }
}

/// Resolves a signed-in user id against the users table.
pub struct StoreIdentity {
    store: Arc<dyn CaseStore>,
    user_id: Option<ActorId>,
}

impl StoreIdentity {
    pub fn new(store: Arc<dyn CaseStore>, user_id: Option<ActorId>) -> Self {
        StoreIdentity { store, user_id }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentity {
    async fn current_actor(&self) -> Result<Actor, IdentityError> {
        let id = self.user_id.as_ref().ok_or(IdentityError::Anonymous)?;
        match self.store.get_user(id).await {
            Ok(user) => Ok(user.actor()),
            Err(StorageError::UserNotFound(id)) => Err(IdentityError::UnknownUser(id)),
            Err(e) => Err(IdentityError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use monalisa_core::{Role, UserProfile};

    #[tokio::test]
    async fn resolves_roles_from_user_table() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_user(UserProfile {
                id: ActorId::from("u-1"),
                nama: "Sari".to_string(),
                nip: None,
                no_hp: None,
                roles: [Role::Pk, Role::Anev].into_iter().collect(),
            })
            .await
            .unwrap();

        let identity = StoreIdentity::new(store.clone(), Some(ActorId::from("u-1")));
        let actor = identity.current_actor().await.unwrap();
        assert!(actor.has_role(&Role::Pk));
        assert!(actor.has_role(&Role::Anev));

        let unknown = StoreIdentity::new(store.clone(), Some(ActorId::from("u-2")));
        assert_eq!(
            unknown.current_actor().await.unwrap_err(),
            IdentityError::UnknownUser(ActorId::from("u-2"))
        );

        let anonymous = StoreIdentity::new(store, None);
        assert_eq!(
            anonymous.current_actor().await.unwrap_err(),
            IdentityError::Anonymous
        );
    }
}

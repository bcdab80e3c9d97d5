use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::Category;
use crate::store::CategoryStore;

/// Owner-scoped category CRUD.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, owner: &str, name: &str) -> Result<Category, AppError> {
        let name = clean_name(name)?;
        self.store
            .insert_category(owner, name, self.clock.now())
            .await
            .map_err(name_taken)
    }

    pub async fn find_all(&self, owner: &str) -> Result<Vec<Category>, AppError> {
        self.store.list_categories(owner).await
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Category, AppError> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with ID {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, name: &str, requester: &str) -> Result<Category, AppError> {
        let category = self.find_one(id).await?;
        if category.username != requester {
            return Err(AppError::Forbidden(
                "You can only update your own categories".into(),
            ));
        }
        let name = clean_name(name)?;
        self.store
            .rename_category(id, name)
            .await
            .map_err(name_taken)
    }

    pub async fn remove(&self, id: Uuid, requester: &str) -> Result<Category, AppError> {
        let category = self.find_one(id).await?;
        if category.username != requester {
            return Err(AppError::Forbidden(
                "You can only delete your own categories".into(),
            ));
        }
        self.store.delete_category(id).await
    }
}

fn clean_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name must not be empty".into()));
    }
    Ok(name)
}

fn name_taken(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => AppError::Conflict("Category with this name already exists".into()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::models::NewUser;
    use crate::store::{CredentialStore, MemoryStore};
    use chrono::Utc;

    async fn service() -> CategoryService {
        let store = Arc::new(MemoryStore::new());
        for username in ["alice", "bob"] {
            store
                .create_user(
                    NewUser {
                        username: username.into(),
                        email: format!("{}@example.com", username),
                        password_hash: "hash".into(),
                    },
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        CategoryService::new(store, Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_names_are_unique_per_owner() {
        let categories = service().await;
        categories.create("alice", "Work").await.unwrap();
        categories.create("bob", "Work").await.unwrap();

        assert!(matches!(
            categories.create("alice", "Work").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_own_and_alphabetical() {
        let categories = service().await;
        categories.create("alice", "Work").await.unwrap();
        categories.create("alice", "Home").await.unwrap();
        categories.create("bob", "Errands").await.unwrap();

        let names: Vec<String> = categories
            .find_all("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Home", "Work"]);
    }

    #[tokio::test]
    async fn test_only_owner_can_mutate() {
        let categories = service().await;
        let work = categories.create("alice", "Work").await.unwrap();

        assert!(matches!(
            categories.update(work.id, "Mine", "bob").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            categories.remove(work.id, "bob").await,
            Err(AppError::Forbidden(_))
        ));

        let renamed = categories.update(work.id, "Office", "alice").await.unwrap();
        assert_eq!(renamed.name, "Office");
        categories.remove(work.id, "alice").await.unwrap();
        assert!(matches!(
            categories.find_one(work.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_collision_reads_like_create() {
        let categories = service().await;
        categories.create("alice", "Work").await.unwrap();
        let home = categories.create("alice", "Home").await.unwrap();

        match categories.update(home.id, " Work ", "alice").await {
            Err(AppError::Conflict(msg)) => {
                assert_eq!(msg, "Category with this name already exists")
            }
            other => panic!("expected a conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let categories = service().await;
        assert!(matches!(
            categories.create("alice", "   ").await,
            Err(AppError::BadRequest(_))
        ));

        let work = categories.create("alice", "  Work ").await.unwrap();
        assert_eq!(work.name, "Work");
        assert!(matches!(
            categories.update(work.id, "\t", "alice").await,
            Err(AppError::BadRequest(_))
        ));
    }
}

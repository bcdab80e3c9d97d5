use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CategoryStore, CredentialStore, DueTask, PageRequest, TaskFilter, TaskPage, TaskStore};
use crate::error::AppError;
use crate::models::{Category, NewTask, NewUser, PublicUser, Task, TaskChanges, User};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    tasks: HashMap<Uuid, Task>,
    categories: HashMap<Uuid, Category>,
}

/// In-process implementation of every store trait.
///
/// All tables sit behind a single lock, so a page and its total are always read
/// from the same state and constraint checks see a consistent view.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// A copy of `task` with its category attached, as the API returns it.
    fn view(&self, task: &Task) -> Task {
        let mut view = task.clone();
        view.category = task
            .category_id
            .and_then(|id| self.categories.get(&id))
            .cloned();
        view
    }
}

fn newest_first(a: &Task, b: &Task) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn username_or_email_taken(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn create_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "A record with this data already exists".into(),
            ));
        }

        let record = User {
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
        };
        tables.users.insert(record.username.clone(), record.clone());
        Ok(record)
    }

    async fn set_refresh_token_hash(
        &self,
        username: &str,
        hash: Option<String>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(username) {
            Some(user) => {
                user.refresh_token_hash = hash;
                Ok(())
            }
            None => Err(AppError::NotFound("Record not found".into())),
        }
    }

    async fn search_users(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PublicUser>, AppError> {
        let tables = self.tables.read().await;
        let needle = search.map(str::to_lowercase);
        let mut users: Vec<PublicUser> = tables
            .users
            .values()
            .filter(|u| {
                needle
                    .as_ref()
                    .map_or(true, |n| u.username.to_lowercase().contains(n))
            })
            .map(PublicUser::from)
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users.truncate(limit as usize);
        Ok(users)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&task.author_username) {
            return Err(AppError::BadRequest("Foreign key constraint failed".into()));
        }
        if let Some(category_id) = task.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(AppError::BadRequest("Foreign key constraint failed".into()));
            }
        }

        let record = Task {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            due_date: task.due_date,
            is_completed: false,
            is_public: task.is_public,
            file_url: task.file_url,
            category_id: task.category_id,
            author_username: task.author_username,
            created_at: task.created_at,
            updated_at: task.created_at,
            category: None,
        };
        let view = tables.view(&record);
        tables.tasks.insert(record.id, record);
        Ok(view)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).map(|task| tables.view(task)))
    }

    async fn find_task_page(
        &self,
        owner: &str,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<TaskPage, AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Task> = tables
            .tasks
            .values()
            .filter(|t| t.author_username == owner && filter.matches(t))
            .collect();
        matching.sort_by(|a, b| newest_first(a, b));

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|task| tables.view(task))
            .collect();
        Ok(TaskPage { data, total })
    }

    async fn find_public_tasks(&self, author: &str) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.author_username == author && t.is_public)
            .map(|task| tables.view(task))
            .collect();
        tasks.sort_by(newest_first);
        Ok(tasks)
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(category_id)) = changes.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(AppError::BadRequest("Foreign key constraint failed".into()));
            }
        }
        let task = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        changes.apply_to(task, now);
        let updated = task.clone();
        Ok(tables.view(&updated))
    }

    async fn delete_task(&self, id: Uuid) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .tasks
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        Ok(tables.view(&removed))
    }

    async fn find_incomplete_due(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueTask>, AppError> {
        let tables = self.tables.read().await;
        let mut due: Vec<DueTask> = tables
            .tasks
            .values()
            .filter(|t| !t.is_completed && t.due_date >= from && t.due_date <= to)
            .filter_map(|t| {
                tables.users.get(&t.author_username).map(|owner| DueTask {
                    task: t.clone(),
                    owner_email: owner.email.clone(),
                })
            })
            .collect();
        due.sort_by(|a, b| newest_first(&a.task, &b.task));
        Ok(due)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(
        &self,
        owner: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(owner) {
            return Err(AppError::BadRequest("Foreign key constraint failed".into()));
        }
        let duplicate = tables
            .categories
            .values()
            .any(|c| c.username == owner && c.name == name);
        if duplicate {
            return Err(AppError::Conflict(
                "A record with this data already exists".into(),
            ));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            username: owner.to_string(),
            created_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self, owner: &str) -> Result<Vec<Category>, AppError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.username == owner)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> Result<Category, AppError> {
        let mut tables = self.tables.write().await;
        let owner = match tables.categories.get(&id) {
            Some(category) => category.username.clone(),
            None => return Err(AppError::NotFound("Record not found".into())),
        };
        let duplicate = tables
            .categories
            .values()
            .any(|c| c.id != id && c.username == owner && c.name == name);
        if duplicate {
            return Err(AppError::Conflict(
                "A record with this data already exists".into(),
            ));
        }

        let category = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        category.name = name.to_string();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<Category, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .categories
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        for task in tables.tasks.values_mut() {
            if task.category_id == Some(id) {
                task.category_id = None;
            }
        }
        Ok(removed)
    }
}

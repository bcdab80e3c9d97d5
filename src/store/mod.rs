//! Persistence interfaces.
//!
//! Services only ever see these traits. [`postgres::PgStore`] backs them with sqlx in
//! production and [`memory::MemoryStore`] keeps everything in process for tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Category, NewTask, NewUser, PublicUser, Task, TaskChanges, TaskPriority, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Optional, AND-combined criteria for listing a user's tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Case-insensitive literal substring of the title.
    pub search: Option<String>,
    pub priority: Option<TaskPriority>,
    pub is_completed: Option<bool>,
    pub category_id: Option<Uuid>,
    /// Inclusive lower bound on the due date.
    pub due_from: Option<NaiveDate>,
    /// Inclusive upper bound on the due date; covers the whole calendar day.
    pub due_to: Option<NaiveDate>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(search) = &self.search {
            if !task.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.is_completed.is_some_and(|c| c != task.is_completed) {
            return false;
        }
        if self.category_id.is_some() && self.category_id != task.category_id {
            return false;
        }
        if self.due_from.is_some_and(|from| task.due_date < from) {
            return false;
        }
        if self.due_to.is_some_and(|to| task.due_date > to) {
            return false;
        }
        true
    }
}

/// 1-indexed page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of tasks plus the number of tasks matching the filter overall.
/// Both come from the same snapshot.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub data: Vec<Task>,
    pub total: u64,
}

/// A task due soon together with its owner's contact address.
#[derive(Debug, Clone)]
pub struct DueTask {
    pub task: Task,
    pub owner_email: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn username_or_email_taken(&self, username: &str, email: &str)
        -> Result<bool, AppError>;

    /// Fails with `Conflict` if the username or email is already registered.
    async fn create_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, AppError>;

    /// Overwrites (or clears, with `None`) the stored refresh-token digest.
    async fn set_refresh_token_hash(
        &self,
        username: &str,
        hash: Option<String>,
    ) -> Result<(), AppError>;

    /// Users whose username contains `search`, alphabetical, at most `limit`.
    async fn search_users(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PublicUser>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// The owner's tasks matching `filter`, newest first, windowed by `page`.
    async fn find_task_page(
        &self,
        owner: &str,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<TaskPage, AppError>;

    async fn find_public_tasks(&self, author: &str) -> Result<Vec<Task>, AppError>;

    /// Fails with `NotFound` if the task no longer exists.
    async fn update_task(
        &self,
        id: Uuid,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError>;

    /// Returns the removed task; `NotFound` if it no longer exists.
    async fn delete_task(&self, id: Uuid) -> Result<Task, AppError>;

    /// Incomplete tasks due within `[from, to]`, with the owner's email.
    async fn find_incomplete_due(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueTask>, AppError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with `Conflict` if the owner already has a category with this name.
    async fn insert_category(
        &self,
        owner: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, AppError>;

    /// The owner's categories ordered by name.
    async fn list_categories(&self, owner: &str) -> Result<Vec<Category>, AppError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError>;

    async fn rename_category(&self, id: Uuid, name: &str) -> Result<Category, AppError>;

    /// Tasks pointing at the removed category keep existing without one.
    async fn delete_category(&self, id: Uuid) -> Result<Category, AppError>;
}

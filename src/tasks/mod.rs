//! Task query engine and ownership-checked task mutations.
//!
//! Listing is always scoped to the caller's own tasks; other users' tasks are
//! only reachable through [`TaskService::find_public_by_user`] or, for public
//! tasks, [`TaskService::find_one`].

pub mod query;

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{CreateTaskInput, NewTask, Task, TaskChanges, UpdateTaskInput};
use crate::store::{PageRequest, TaskFilter, TaskStore};

pub use query::{PageMeta, Paginated, TaskListQuery};

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, owner: &str, input: CreateTaskInput) -> Result<Task, AppError> {
        let task = NewTask::from_input(input, owner, self.clock.now())?;
        self.store.insert_task(task).await
    }

    /// One page of the owner's tasks matching `filter`, newest first.
    pub async fn find_all(
        &self,
        owner: &str,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<Paginated<Task>, AppError> {
        let result = self.store.find_task_page(owner, filter, page).await?;
        Ok(Paginated {
            meta: PageMeta::new(result.total, page),
            data: result.data,
        })
    }

    /// Fetches a task. With a requester, private tasks of other users are `Forbidden`.
    pub async fn find_one(&self, id: Uuid, requester: Option<&str>) -> Result<Task, AppError> {
        let task = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task with ID {} not found", id)))?;

        if let Some(requester) = requester {
            if task.author_username != requester && !task.is_public {
                return Err(AppError::Forbidden(
                    "You do not have access to this task".into(),
                ));
            }
        }
        Ok(task)
    }

    pub async fn find_public_by_user(&self, target: &str) -> Result<Vec<Task>, AppError> {
        self.store.find_public_tasks(target).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTaskInput,
        requester: &str,
    ) -> Result<Task, AppError> {
        let task = self.find_one(id, None).await?;
        if task.author_username != requester {
            return Err(AppError::Forbidden(
                "You can only update your own tasks".into(),
            ));
        }

        let changes = TaskChanges::from_input(input)?;
        self.store.update_task(id, &changes, self.clock.now()).await
    }

    pub async fn remove(&self, id: Uuid, requester: &str) -> Result<Task, AppError> {
        let task = self.find_one(id, None).await?;
        if task.author_username != requester {
            return Err(AppError::Forbidden(
                "You can only delete your own tasks".into(),
            ));
        }

        self.store.delete_task(id).await
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Category;
use crate::error::AppError;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        };
        f.write_str(label)
    }
}

/// Completion filter accepted by the task listing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Incomplete,
}

impl TaskStatus {
    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub is_completed: bool,
    pub is_public: bool,
    /// Opaque reference returned by the upload endpoint.
    pub file_url: Option<String>,
    pub category_id: Option<Uuid>,
    /// Owner of the task. Never changes after creation.
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The category `category_id` points at, filled in by the store on read.
    #[sqlx(skip)]
    pub category: Option<Category>,
}

/// Request body for `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub priority: TaskPriority,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub due_date: String,

    pub category_id: Option<Uuid>,

    pub is_public: Option<bool>,

    #[validate(length(max = 500))]
    pub file_url: Option<String>,
}

/// Request body for `PATCH /tasks/{id}`. Absent fields are left unchanged.
///
/// The nullable columns use `Option<Option<_>>`: `None` when the key is absent,
/// `Some(None)` when it is sent as `null`, which clears the column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,

    pub is_public: Option<bool>,

    pub is_completed: Option<bool>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500))]
    pub file_url: Option<Option<String>>,
}

/// Marks a key that was present in the body, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A validated task ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub is_public: bool,
    pub file_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied by an update, with the due date already parsed.
///
/// `None` leaves a column alone; for the nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub is_public: Option<bool>,
    pub is_completed: Option<bool>,
    pub file_url: Option<Option<String>>,
}

impl NewTask {
    pub fn from_input(
        input: CreateTaskInput,
        author_username: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id: Uuid::new_v4(),
            due_date: parse_due_date(&input.due_date)?,
            title: input.title,
            description: input.description,
            priority: input.priority,
            is_public: input.is_public.unwrap_or(false),
            file_url: input.file_url,
            category_id: input.category_id,
            author_username: author_username.to_string(),
            created_at: now,
        })
    }
}

impl TaskChanges {
    pub fn from_input(input: UpdateTaskInput) -> Result<Self, AppError> {
        let due_date = input.due_date.as_deref().map(parse_due_date).transpose()?;
        Ok(Self {
            title: input.title,
            description: input.description,
            priority: input.priority,
            due_date,
            category_id: input.category_id,
            is_public: input.is_public,
            is_completed: input.is_completed,
            file_url: input.file_url,
        })
    }

    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(category_id) = self.category_id {
            task.category_id = category_id;
        }
        if let Some(is_public) = self.is_public {
            task.is_public = is_public;
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
        if let Some(file_url) = &self.file_url {
            task.file_url = file_url.clone();
        }
        task.updated_at = now;
    }
}

/// Parses a due date into a calendar date.
///
/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, in which case the
/// UTC calendar date of that instant is used.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc).date_naive())
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", raw)))
}

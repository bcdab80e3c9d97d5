use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::task::parse_due_date;
use crate::models::{TaskPriority, TaskStatus};
use crate::security::normalize_search;
use crate::store::{PageRequest, TaskFilter};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query string accepted by `GET /tasks`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub search: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category_id: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TaskListQuery {
    /// Splits the query into a filter and a page window, parsing the date bounds.
    pub fn into_parts(self) -> Result<(TaskFilter, PageRequest), AppError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(AppError::BadRequest("page must be at least 1".into()));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let filter = TaskFilter {
            search: normalize_search(self.search.as_deref()),
            priority: self.priority,
            is_completed: self.status.map(TaskStatus::is_completed),
            category_id: self.category_id,
            due_from: self.start_date.as_deref().map(parse_due_date).transpose()?,
            due_to: self.end_date.as_deref().map(parse_due_date).transpose()?,
        };
        Ok((filter, PageRequest { page, limit }))
    }
}

/// Pagination details returned next to every page of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub last_page: u64,
    pub limit: u32,
}

impl PageMeta {
    pub fn new(total: u64, page: PageRequest) -> Self {
        Self {
            total,
            page: page.page,
            last_page: total.div_ceil(u64::from(page.limit)),
            limit: page.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

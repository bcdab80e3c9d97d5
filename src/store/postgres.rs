use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{CategoryStore, CredentialStore, DueTask, PageRequest, TaskFilter, TaskPage, TaskStore};
use crate::error::AppError;
use crate::models::{Category, NewTask, NewUser, PublicUser, Task, TaskChanges, User};
use crate::security::like_pattern;

/// Task columns plus the joined category, read through `TaskRow`.
const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.priority, t.due_date, t.is_completed, \
     t.is_public, t.file_url, t.category_id, t.author_username, t.created_at, t.updated_at, \
     c.name AS category_name, c.username AS category_owner, c.created_at AS category_created_at";

const CATEGORY_JOIN: &str = "LEFT JOIN categories c ON c.id = t.category_id";

const USER_COLUMNS: &str = "username, email, password_hash, refresh_token_hash, created_at";

/// Postgres implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Applies the SQL files under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Wraps a statement that returns task rows so the category can be joined on.
fn with_category(statement: &str) -> String {
    format!(
        "WITH t AS ({} RETURNING *) SELECT {} FROM t {}",
        statement, TASK_COLUMNS, CATEGORY_JOIN
    )
}

/// Appends the owner predicate and every present filter to `qb`.
/// The tasks table must be aliased `t`.
fn push_task_filters(qb: &mut QueryBuilder<'_, Postgres>, owner: &str, filter: &TaskFilter) {
    qb.push(" WHERE t.author_username = ")
        .push_bind(owner.to_string());

    if let Some(search) = &filter.search {
        qb.push(" AND t.title ILIKE ").push_bind(like_pattern(search));
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(is_completed) = filter.is_completed {
        qb.push(" AND t.is_completed = ").push_bind(is_completed);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND t.category_id = ").push_bind(category_id);
    }
    if let Some(from) = filter.due_from {
        qb.push(" AND t.due_date >= ").push_bind(from);
    }
    if let Some(to) = filter.due_to {
        // due_date is a DATE, so <= covers the whole day.
        qb.push(" AND t.due_date <= ").push_bind(to);
    }
}

#[derive(FromRow)]
struct TaskRow {
    #[sqlx(flatten)]
    task: Task,
    category_name: Option<String>,
    category_owner: Option<String>,
    category_created_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let mut task = row.task;
        task.category = match (
            task.category_id,
            row.category_name,
            row.category_owner,
            row.category_created_at,
        ) {
            (Some(id), Some(name), Some(username), Some(created_at)) => Some(Category {
                id,
                name,
                username,
                created_at,
            }),
            _ => None,
        };
        task
    }
}

#[derive(FromRow)]
struct DueTaskRow {
    #[sqlx(flatten)]
    task: Task,
    owner_email: String,
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn username_or_email_taken(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn set_refresh_token_hash(
        &self,
        username: &str,
        hash: Option<String>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $1 WHERE username = $2")
            .bind(hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Record not found".into()));
        }
        Ok(())
    }

    async fn search_users(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PublicUser>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT username, email FROM users");
        if let Some(search) = search {
            qb.push(" WHERE username ILIKE ").push_bind(like_pattern(search));
        }
        qb.push(" ORDER BY username ASC LIMIT ")
            .push_bind(i64::from(limit));

        let users = qb
            .build_query_as::<PublicUser>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = with_category(
            "INSERT INTO tasks (id, title, description, priority, due_date, is_public, file_url, \
             category_id, author_username, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)",
        );
        let created = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.is_public)
            .bind(task.file_url)
            .bind(task.category_id)
            .bind(task.author_username)
            .bind(task.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created.into())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t {} WHERE t.id = $1",
            TASK_COLUMNS, CATEGORY_JOIN
        );
        let task = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task.map(Task::from))
    }

    async fn find_task_page(
        &self,
        owner: &str,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<TaskPage, AppError> {
        // Page and count must agree, so both run in one snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM tasks t {}",
            TASK_COLUMNS, CATEGORY_JOIN
        ));
        push_task_filters(&mut data_query, owner, filter);
        data_query
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let data = data_query
            .build_query_as::<TaskRow>()
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_task_filters(&mut count_query, owner, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TaskPage {
            data,
            total: total.max(0) as u64,
        })
    }

    async fn find_public_tasks(&self, author: &str) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t {} WHERE t.author_username = $1 AND t.is_public = TRUE \
             ORDER BY t.created_at DESC, t.id DESC",
            TASK_COLUMNS, CATEGORY_JOIN
        );
        let tasks = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(author)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks.into_iter().map(Task::from).collect())
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        // Only the fields that were sent are written, so an explicit null clears a column.
        let mut update = QueryBuilder::<Postgres>::new("WITH t AS (UPDATE tasks SET ");
        let mut set = update.separated(", ");
        if let Some(title) = &changes.title {
            set.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(description) = &changes.description {
            set.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(priority) = changes.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(due_date) = changes.due_date {
            set.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(category_id) = changes.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Some(is_public) = changes.is_public {
            set.push("is_public = ").push_bind_unseparated(is_public);
        }
        if let Some(is_completed) = changes.is_completed {
            set.push("is_completed = ").push_bind_unseparated(is_completed);
        }
        if let Some(file_url) = &changes.file_url {
            set.push("file_url = ").push_bind_unseparated(file_url.clone());
        }
        set.push("updated_at = ").push_bind_unseparated(now);
        update
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(
                " RETURNING *) SELECT {} FROM t {}",
                TASK_COLUMNS, CATEGORY_JOIN
            ));
        let updated = update
            .build_query_as::<TaskRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(Task::from);

        updated.ok_or_else(|| AppError::NotFound("Record not found".into()))
    }

    async fn delete_task(&self, id: Uuid) -> Result<Task, AppError> {
        let sql = with_category("DELETE FROM tasks WHERE id = $1");
        let deleted = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Task::from);

        deleted.ok_or_else(|| AppError::NotFound("Record not found".into()))
    }

    async fn find_incomplete_due(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueTask>, AppError> {
        let rows = sqlx::query_as::<_, DueTaskRow>(
            "SELECT t.id, t.title, t.description, t.priority, t.due_date, t.is_completed, \
                    t.is_public, t.file_url, t.category_id, t.author_username, t.created_at, \
                    t.updated_at, u.email AS owner_email \
             FROM tasks t JOIN users u ON u.username = t.author_username \
             WHERE t.is_completed = FALSE AND t.due_date BETWEEN $1 AND $2 \
             ORDER BY t.created_at DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DueTask {
                task: row.task,
                owner_email: row.owner_email,
            })
            .collect())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert_category(
        &self,
        owner: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, username, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, username, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_categories(&self, owner: &str) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, username, created_at FROM categories \
             WHERE username = $1 ORDER BY name ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, username, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1 WHERE id = $2 \
             RETURNING id, name, username, created_at",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        category.ok_or_else(|| AppError::NotFound("Record not found".into()))
    }

    async fn delete_category(&self, id: Uuid) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "DELETE FROM categories WHERE id = $1 RETURNING id, name, username, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        category.ok_or_else(|| AppError::NotFound("Record not found".into()))
    }
}

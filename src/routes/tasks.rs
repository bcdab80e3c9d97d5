use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskInput, UpdateTaskInput},
    state::AppState,
    tasks::TaskListQuery,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves one page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `search` (optional): case-insensitive substring of the title.
/// - `priority` (optional): `Low`, `Medium` or `High`.
/// - `status` (optional): `completed` or `incomplete`.
/// - `categoryId` (optional): only tasks in this category.
/// - `startDate` / `endDate` (optional): inclusive due-date window, `YYYY-MM-DD`.
/// - `page` (default 1) and `limit` (default 10, at most 100).
///
/// ## Responses:
/// - `200 OK`: `{ data: Task[], meta: { total, page, lastPage, limit } }`.
/// - `400 Bad Request`: malformed filter or pagination values.
/// - `401 Unauthorized`: missing or invalid access token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskListQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let (filter, page) = query.into_inner().into_parts()?;
    let result = state.tasks.find_all(user.username(), &filter, page).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Creates a task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the stored task.
/// - `400 Bad Request`: validation failure, bad `dueDate`, or unknown `categoryId`.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<CreateTaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .create(user.username(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(task))
}

/// Lists another user's public tasks, newest first.
#[get("/public/{username}")]
pub async fn get_public_tasks(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.find_public_by_user(&username).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves a task by ID.
///
/// Owners see their own tasks; anyone else only sees it when it is public.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `403 Forbidden`: the task is private and belongs to someone else.
/// - `404 Not Found`: no task with this ID.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_one(task_id.into_inner(), Some(user.username()))
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Applies a partial update to a task the caller owns.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `403 Forbidden`: the caller does not own the task, public or not.
/// - `404 Not Found`: no task with this ID.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .update(task_id.into_inner(), task_data.into_inner(), user.username())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task the caller owns and returns the removed record.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .remove(task_id.into_inner(), user.username())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

use crate::{
    auth::AuthenticatedUser, error::AppError, models::CategoryInput, state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// The caller's categories, by name.
#[get("")]
pub async fn get_categories(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let categories = state.categories.find_all(user.username()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[post("")]
pub async fn create_category(
    state: web::Data<AppState>,
    input: web::Json<CategoryInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let input = input.into_inner().trimmed();
    input.validate()?;

    let category = state
        .categories
        .create(user.username(), &input.name)
        .await?;
    Ok(HttpResponse::Created().json(category))
}

#[get("/{id}")]
pub async fn get_category(
    state: web::Data<AppState>,
    category_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let category = state.categories.find_one(category_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[patch("/{id}")]
pub async fn update_category(
    state: web::Data<AppState>,
    category_id: web::Path<Uuid>,
    input: web::Json<CategoryInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let input = input.into_inner().trimmed();
    input.validate()?;

    let category = state
        .categories
        .update(category_id.into_inner(), &input.name, user.username())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

/// Deletes a category. Its tasks stay, with `categoryId` cleared.
#[delete("/{id}")]
pub async fn delete_category(
    state: web::Data<AppState>,
    category_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let category = state
        .categories
        .remove(category_id.into_inner(), user.username())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

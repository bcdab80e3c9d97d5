use crate::{error::AppError, security::normalize_search, state::AppState};
use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;

/// Upper bound on a single user-directory lookup.
pub const USER_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
}

/// Lists users whose username contains `search`, alphabetically.
#[get("")]
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<impl Responder, AppError> {
    let search = normalize_search(query.search.as_deref());
    let users = state
        .users
        .search_users(search.as_deref(), USER_SEARCH_LIMIT)
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

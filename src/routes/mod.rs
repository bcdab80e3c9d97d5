pub mod auth;
pub mod categories;
pub mod health;
pub mod tasks;
pub mod upload;
pub mod users;

use actix_web::web;

use crate::auth::AccessGuard;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Registers every route. Expects `web::Data<AppState>` and `web::Data<TokenService>`
/// to already be in app data.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::refresh)
                .service(auth::logout),
        )
        .service(
            web::scope("/tasks")
                .wrap(AccessGuard)
                // Must precede "/{id}" so "public" is never parsed as an ID.
                .service(tasks::get_public_tasks)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/categories")
                .wrap(AccessGuard)
                .service(categories::get_categories)
                .service(categories::create_category)
                .service(categories::get_category)
                .service(categories::update_category)
                .service(categories::delete_category),
        )
        .service(web::scope("/users").wrap(AccessGuard).service(users::list_users))
        .service(web::scope("/upload").wrap(AccessGuard).service(upload::upload_file));
}

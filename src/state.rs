use actix_web::web;
use std::sync::Arc;

use crate::auth::{AuthService, Hasher, TokenService};
use crate::categories::CategoryService;
use crate::clock::Clock;
use crate::store::{CategoryStore, CredentialStore, TaskStore};
use crate::tasks::TaskService;
use crate::upload::BlobStore;

/// Collaborators the service layer is built from.
pub struct Dependencies {
    pub credentials: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub tokens: Arc<TokenService>,
    pub password_hasher: Arc<dyn Hasher>,
    pub refresh_hasher: Arc<dyn Hasher>,
    pub blobs: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
    pub max_upload_bytes: usize,
}

/// Everything the HTTP handlers need, shared across workers via `web::Data`.
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
    pub categories: CategoryService,
    pub users: Arc<dyn CredentialStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub max_upload_bytes: usize,
    tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(deps: Dependencies) -> Self {
        Self {
            auth: AuthService::new(
                deps.credentials.clone(),
                deps.tokens.clone(),
                deps.password_hasher,
                deps.refresh_hasher,
                deps.clock.clone(),
            ),
            tasks: TaskService::new(deps.tasks, deps.clock.clone()),
            categories: CategoryService::new(deps.categories, deps.clock),
            users: deps.credentials,
            blobs: deps.blobs,
            max_upload_bytes: deps.max_upload_bytes,
            tokens: deps.tokens,
        }
    }

    /// The token service as app data, for `AccessGuard`.
    pub fn token_data(&self) -> web::Data<TokenService> {
        web::Data::from(self.tokens.clone())
    }
}

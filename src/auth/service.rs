use std::sync::Arc;

use crate::auth::password::Hasher;
use crate::auth::token::{TokenPair, TokenService};
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{NewUser, PublicUser};
use crate::store::CredentialStore;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const DUMMY_PASSWORD: &str = "taskboard-unknown-user";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

/// Register, login, refresh and logout.
///
/// At most one refresh token is valid per user at any time: only its digest is
/// stored, and every login or refresh overwrites that digest.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    password_hasher: Arc<dyn Hasher>,
    refresh_hasher: Arc<dyn Hasher>,
    clock: Arc<dyn Clock>,
    /// Checked when the username is unknown, so that path costs one real verify.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        password_hasher: Arc<dyn Hasher>,
        refresh_hasher: Arc<dyn Hasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dummy_hash = password_hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|err| {
            log::warn!("Could not precompute the login dummy hash: {}", err);
            String::new()
        });
        Self {
            credentials,
            tokens,
            password_hasher,
            refresh_hasher,
            clock,
            dummy_hash,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        if self
            .credentials
            .username_or_email_taken(username, email)
            .await?
        {
            return Err(AppError::Conflict(
                "Username or Email already exists".into(),
            ));
        }

        let password_hash = self.password_hasher.hash(password)?;
        let user = self
            .credentials
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash,
                },
                self.clock.now(),
            )
            .await?;

        log::info!("Registered user {}", user.username);
        Ok(PublicUser::from(&user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = match self.credentials.find_by_username(username).await? {
            Some(user) => user,
            None => {
                // Same hashing work as a wrong password; the outcome is irrelevant.
                let _ = self.password_hasher.verify(password, &self.dummy_hash);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        if !self.password_hasher.verify(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let tokens = self.issue_and_store(&user.username).await?;
        Ok(LoginOutcome {
            tokens,
            user: PublicUser::from(&user),
        })
    }

    /// Exchanges a refresh token for a new pair and invalidates the old one.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .tokens
            .verify_refresh(refresh_token)
            .map_err(|e| {
                log::debug!("Refresh token rejected: {}", e);
                AppError::Unauthorized(INVALID_REFRESH_TOKEN.into())
            })?;

        let user = self
            .credentials
            .find_by_username(&claims.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()))?;

        let stored = user
            .refresh_token_hash
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()))?;

        if !self.refresh_hasher.verify(refresh_token, stored)? {
            log::warn!(
                "Stale refresh token presented for {} (jti {})",
                user.username,
                claims.jti
            );
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        self.issue_and_store(&user.username).await
    }

    /// Clears the stored refresh-token digest. Succeeds if already cleared.
    pub async fn logout(&self, username: &str) -> Result<(), AppError> {
        self.credentials
            .set_refresh_token_hash(username, None)
            .await
    }

    async fn issue_and_store(&self, username: &str) -> Result<TokenPair, AppError> {
        let tokens = self.tokens.issue_pair(username)?;
        let digest = self.refresh_hasher.hash(&tokens.refresh_token)?;
        self.credentials
            .set_refresh_token_hash(username, Some(digest))
            .await?;
        Ok(tokens)
    }
}

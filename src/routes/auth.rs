use crate::{
    auth::{
        AccessGuard, AuthenticatedUser, LoginRequest, LoginResponse, MessageResponse,
        RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse,
    },
    error::AppError,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns its public profile. Tokens are only issued by login.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let body = register_data.into_inner();

    let user = state
        .auth
        .register(&body.username, &body.email, &body.password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".into(),
        user,
    }))
}

/// Login user
///
/// Verifies the credentials and returns a fresh access/refresh token pair.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome = state
        .auth
        .login(&login_data.username, &login_data.password)
        .await?;

    Ok(HttpResponse::Created().json(LoginResponse::from(outcome)))
}

/// Exchange a refresh token for a new pair. The presented token stops working.
#[post("/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let pair = state.auth.refresh(&refresh_data.refresh_token).await?;
    Ok(HttpResponse::Created().json(TokenResponse::from(pair)))
}

#[post("/logout", wrap = "AccessGuard")]
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.auth.logout(user.username()).await?;
    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Logged out successfully".into(),
    }))
}

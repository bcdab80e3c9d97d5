use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::Identity;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Rejects requests without a valid bearer access token and attaches the
/// caller's [`Identity`] to the ones it lets through.
///
/// Applied explicitly with `.wrap(AccessGuard)` on each protected scope or
/// resource. Verification is signature and expiry only; the credential store
/// is never consulted. The [`TokenService`] is read from app data.
pub struct AccessGuard;

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AccessGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGuardService { service }))
    }
}

pub struct AccessGuardService<S> {
    service: S,
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(tokens) = req.app_data::<web::Data<TokenService>>().cloned() else {
            let app_err = AppError::InternalServerError("TokenService not registered".into());
            return Box::pin(async move { Err(app_err.into()) });
        };

        let verified = match bearer_token(&req) {
            Some(token) => tokens.verify_access(token).map_err(AppError::from),
            None => Err(AppError::Unauthorized("Missing token".into())),
        };

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(Identity {
                    username: claims.username,
                });
                Box::pin(self.service.call(req))
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}

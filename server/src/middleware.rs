use crate::auth::{validate_token_of_type, TokenType};
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use shared_types::UserInfo;

/// Resolves the optional `Bearer` access token into a `UserInfo` request extension.
///
/// The identity is read from the users table on every request, so role changes
/// and deleted accounts take effect before the token expires.
///
/// Requests without an `Authorization` header pass through as anonymous. A header
/// that is present but malformed, expired or signed with another secret is
/// rejected with 401 instead of silently downgrading the caller.
pub struct AuthenticationMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService { service }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
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
        let auth_header = match req.headers().get(header::AUTHORIZATION) {
            None => {
                tracing::debug!("Anonymous request: {} {}", req.method(), req.path());
                return Box::pin(self.service.call(req));
            }
            Some(value) => value.to_str().ok().map(str::to_string),
        };

        let token = match auth_header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.trim().to_string(),
            None => {
                tracing::warn!("Auth failed: invalid Authorization header format");
                return reject(AppError::Unauthorized(
                    "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
                ));
            }
        };

        let (jwt_secret, database) = match req.app_data::<web::Data<AppState>>() {
            Some(state) => (
                state.config.auth.secret().to_string(),
                state.database.clone(),
            ),
            None => {
                return reject(AppError::Internal(
                    "Application state not available".to_string(),
                ));
            }
        };

        // Role and existence come from the users table, not from the token
        let user_info = match validate_token_of_type(&token, &jwt_secret, TokenType::Access)
            .and_then(|claims| claims.user_id())
            .and_then(|user_id| current_user(&database, user_id))
        {
            Ok(user_info) => user_info,
            Err(e) => {
                tracing::warn!("Auth failed for {} {}: {}", req.method(), req.path(), e);
                return reject(e);
            }
        };

        tracing::debug!(
            "Authenticated {} for {} {}",
            user_info.username,
            req.method(),
            req.path()
        );
        req.extensions_mut().insert(user_info);

        Box::pin(self.service.call(req))
    }
}

/// Restricts a scope to administrators; must sit inside `AuthenticationMiddleware`
pub struct AdminGate;

impl<S, B> Transform<S, ServiceRequest> for AdminGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGateService { service }))
    }
}

pub struct AdminGateService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AdminGateService<S>
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
        let user = req.extensions().get::<UserInfo>().cloned();

        match user {
            None => reject(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
            Some(user) if !user.is_admin => {
                tracing::warn!(
                    "User {} denied access to {} {}",
                    user.username,
                    req.method(),
                    req.path()
                );
                reject(AppError::AccessDenied(
                    "Administrator privileges required".to_string(),
                ))
            }
            Some(_) => Box::pin(self.service.call(req)),
        }
    }
}

fn current_user(database: &Database, user_id: i64) -> AppResult<UserInfo> {
    match database.get_user_by_id(user_id) {
        Ok(user) => Ok(user.info()),
        Err(AppError::NotFound(_)) => Err(AppError::Unauthorized(format!(
            "User {} no longer exists",
            user_id
        ))),
        Err(e) => Err(e),
    }
}

fn reject<R: 'static>(error: AppError) -> LocalBoxFuture<'static, Result<R, Error>> {
    Box::pin(async move { Err(error.into()) })
}

/// Identity attached by `AuthenticationMiddleware`, None for anonymous callers
pub fn optional_identity(req: &HttpRequest) -> Option<UserInfo> {
    req.extensions().get::<UserInfo>().cloned()
}

pub fn require_identity(req: &HttpRequest) -> AppResult<UserInfo> {
    optional_identity(req)
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

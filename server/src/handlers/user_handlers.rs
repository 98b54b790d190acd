use super::main_handlers::AppState;
use crate::auth::{self, Claims, TokenType};
use crate::error::AppError;
use crate::middleware::require_identity;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared_types::{
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse,
    UpdateUserRequest, User, UserListResponse, UserResponse,
};

const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if !email.contains('@') {
        return Err(AppError::InvalidRequest(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(email.to_string())
}

pub async fn register(
    data: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let register_req = request.into_inner();

    let username = register_req.username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidRequest(
            "Username cannot be empty".to_string(),
        ));
    }

    let email = normalize_email(&register_req.email)?;

    if register_req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = auth::hash_password(&register_req.password)?;
    let user = data.database.register_user(&User::new(
        username.to_string(),
        email,
        password_hash,
    ))?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(HttpResponse::Created().json(UserResponse { user }))
}

/// Exchanges credentials for an access/refresh token pair
pub async fn token(
    data: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let login_req = request.into_inner();

    if login_req.username.is_empty() || login_req.password.is_empty() {
        return Err(AppError::InvalidRequest(
            "Missing username or password".to_string(),
        ));
    }

    let user = match data.database.get_user_by_username(&login_req.username)? {
        Some(user) if auth::verify_password(&login_req.password, &user.password_hash)? => user,
        _ => {
            tracing::warn!("Login failed for {}", login_req.username);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let auth_config = &data.config.auth;
    let info = user.info();
    let access_token = auth::generate_token(
        &Claims::new(&info, TokenType::Access, auth_config.access_token_ttl_secs),
        auth_config.secret(),
    )?;
    let refresh_token = auth::generate_token(
        &Claims::new(&info, TokenType::Refresh, auth_config.refresh_token_ttl_secs),
        auth_config.secret(),
    )?;

    tracing::info!("Issued tokens for {}", user.username);
    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token,
        user_id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    }))
}

pub async fn refresh(
    data: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let auth_config = &data.config.auth;
    let claims = auth::validate_token_of_type(
        &request.refresh_token,
        auth_config.secret(),
        TokenType::Refresh,
    )
    .inspect_err(|e| tracing::warn!("Refresh rejected: {}", e))?;

    // Re-read the user so a deleted account or changed role takes effect
    let user = data.database.get_user_by_id(claims.user_id()?)?;
    let access_token = auth::generate_token(
        &Claims::new(&user.info(), TokenType::Access, auth_config.access_token_ttl_secs),
        auth_config.secret(),
    )?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

pub async fn me(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = require_identity(&req)?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn list_users(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = data.database.get_all_users()?;
    Ok(HttpResponse::Ok().json(UserListResponse { users }))
}

pub async fn get_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = data.database.get_user_by_id(path.into_inner())?;
    Ok(HttpResponse::Ok().json(UserResponse { user }))
}

pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let mut update_req = request.into_inner();

    if let Some(username) = update_req.username.take() {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::InvalidRequest(
                "Username cannot be empty".to_string(),
            ));
        }
        update_req.username = Some(username);
    }

    if let Some(email) = update_req.email.take() {
        update_req.email = Some(normalize_email(&email)?);
    }

    let user = data.database.update_user(path.into_inner(), &update_req)?;
    Ok(HttpResponse::Ok().json(UserResponse { user }))
}

pub async fn delete_user(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let actor = require_identity(&req)?;
    if actor.id == user_id {
        return Err(AppError::InvalidRequest(
            "Administrators cannot delete their own account".to_string(),
        ));
    }

    data.database.delete_user(user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

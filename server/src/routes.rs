//! Centralized route configuration for the survey API.
//!
//! Both the server binary and the integration tests build their application
//! from this function, so they always share the same routing and middleware.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers::{answer_handlers, main_handlers, survey_handlers, user_handlers};
use crate::middleware::{AdminGate, AuthenticationMiddleware};
use actix_web::web;

/// JSON extractor settings: room for base64 uploads, errors in the API's error format
pub fn json_config(config: &AppConfig) -> web::JsonConfig {
    // Base64 grows content by a third; leave headroom for the rest of the body
    let limit = config.uploads.max_file_bytes / 3 * 4 + 1024 * 1024;

    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let api_scope = web::scope("/api")
        .wrap(AuthenticationMiddleware)
        .route("/health", web::get().to(main_handlers::health_check))
        // Accounts
        .route("/auth/register", web::post().to(user_handlers::register))
        .route("/auth/token", web::post().to(user_handlers::token))
        .route("/auth/refresh", web::post().to(user_handlers::refresh))
        .route("/auth/me", web::get().to(user_handlers::me))
        // User management, administrators only
        .service(
            web::scope("/users")
                .wrap(AdminGate)
                .route("", web::get().to(user_handlers::list_users))
                .route("/{id}", web::get().to(user_handlers::get_user))
                .route("/{id}", web::put().to(user_handlers::update_user))
                .route("/{id}", web::delete().to(user_handlers::delete_user)),
        )
        // Surveys
        .route("/surveys", web::get().to(survey_handlers::list_surveys))
        .route("/surveys", web::post().to(survey_handlers::create_survey))
        .route("/surveys/{id}", web::get().to(survey_handlers::get_survey))
        .route("/surveys/{id}", web::put().to(survey_handlers::update_survey))
        .route("/surveys/{id}", web::delete().to(survey_handlers::delete_survey))
        .route(
            "/surveys/{id}/stats",
            web::get().to(survey_handlers::survey_stats),
        )
        .route(
            "/surveys/{id}/responses",
            web::post().to(survey_handlers::submit_response),
        )
        .route(
            "/uploads/{filename}",
            web::get().to(survey_handlers::download_upload),
        )
        // Answers
        .route("/answers", web::get().to(answer_handlers::list_answers))
        .route("/answers/{id}", web::get().to(answer_handlers::get_answer))
        .route("/answers/{id}", web::put().to(answer_handlers::update_answer))
        .route("/answers/{id}", web::delete().to(answer_handlers::delete_answer));

    cfg.service(api_scope);
}

use super::main_handlers::AppState;
use crate::authoring;
use crate::error::AppError;
use crate::middleware::{optional_identity, require_identity};
use crate::permissions::{authorize, ensure, Action, Decision, Resource};
use crate::request_context::RequestContext;
use crate::stats;
use crate::submission::{self, SubmissionContext, SubmissionOutcome};
use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use shared_types::{
    CreateSurveyRequest, SubmissionRequest, SurveyListQuery, SurveyListResponse, SurveyResponse,
    UpdateSurveyRequest,
};

pub async fn create_survey(
    data: web::Data<AppState>,
    request: web::Json<CreateSurveyRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let author = require_identity(&req)?;
    ensure(Some(&author), Action::Create, Resource::NewSurvey)?;

    let create_req = authoring::normalize_create(request.into_inner())?;
    let survey = data.database.create_survey(author.id, &create_req)?;

    tracing::info!(
        "User {} created survey {} with {} questions",
        author.username,
        survey.survey.id,
        survey.questions.len()
    );
    Ok(HttpResponse::Created().json(SurveyResponse { survey }))
}

pub async fn list_surveys(
    data: web::Data<AppState>,
    query: web::Query<SurveyListQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let author_id = if query.mine.unwrap_or(false) {
        Some(require_identity(&req)?.id)
    } else {
        None
    };

    let surveys = data.database.list_surveys(author_id)?;
    Ok(HttpResponse::Ok().json(SurveyListResponse { surveys }))
}

pub async fn get_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey = data.database.get_survey_detail(path.into_inner())?;
    ensure(
        optional_identity(&req).as_ref(),
        Action::Read,
        Resource::survey(&survey.survey),
    )?;
    Ok(HttpResponse::Ok().json(SurveyResponse { survey }))
}

pub async fn update_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateSurveyRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let existing = data.database.get_survey(survey_id)?;
    ensure(
        optional_identity(&req).as_ref(),
        Action::Update,
        Resource::survey(&existing),
    )?;

    let update_req = authoring::normalize_update(request.into_inner())?;
    let survey = data.database.update_survey(survey_id, &update_req)?;
    Ok(HttpResponse::Ok().json(SurveyResponse { survey }))
}

pub async fn delete_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let existing = data.database.get_survey(survey_id)?;
    ensure(
        optional_identity(&req).as_ref(),
        Action::Delete,
        Resource::survey(&existing),
    )?;

    data.database.delete_survey(survey_id)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn survey_stats(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let detail = data.database.get_survey_detail(survey_id)?;
    ensure(
        optional_identity(&req).as_ref(),
        Action::ViewStats,
        Resource::survey(&detail.survey),
    )?;

    let answers = data.database.list_survey_answers(survey_id)?;
    Ok(HttpResponse::Ok().json(stats::aggregate(&detail, &answers)))
}

pub async fn submit_response(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<SubmissionRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let trust_forwarded = data.config.server.trust_forwarded_headers;
    let ctx = SubmissionContext {
        identity: optional_identity(&req),
        request: RequestContext::from_request(&req, trust_forwarded),
    };

    let outcome = submission::submit_response(
        &data.database,
        &data.uploads,
        data.config.submissions.duplicate_policy,
        path.into_inner(),
        request.into_inner(),
        ctx,
    )?;

    match outcome {
        SubmissionOutcome::Accepted(receipt) => Ok(HttpResponse::Created().json(receipt)),
        SubmissionOutcome::AlreadyResponded => Ok(HttpResponse::Conflict().json(
            serde_json::json!({
                "status": "already_responded",
                "message": "You have already responded to this survey"
            }),
        )),
    }
}

/// Serves a stored upload to anyone allowed to read an answer that references it
pub async fn download_upload(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let filename = path.into_inner();
    let scopes = data.database.find_answers_by_file(&filename)?;
    if scopes.is_empty() {
        return Err(AppError::NotFound(format!("Upload {}", filename)));
    }

    let actor = optional_identity(&req);
    let readable = scopes.iter().any(|scope| {
        authorize(
            actor.as_ref(),
            Action::Read,
            Resource::Answer {
                owner_id: scope.answer.user_id,
                survey_author_id: scope.survey_author_id,
            },
        ) == Decision::Allow
    });
    if !readable {
        tracing::debug!(
            "Download of {} denied for {}",
            filename,
            actor.as_ref().map(|a| a.username.as_str()).unwrap_or("anonymous")
        );
        return Err(AppError::AccessDenied(format!(
            "Upload {} is not readable",
            filename
        )));
    }

    let content = data.uploads.read(&filename)?;
    Ok(HttpResponse::Ok()
        .content_type(content_type(&filename))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(content))
}

fn content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

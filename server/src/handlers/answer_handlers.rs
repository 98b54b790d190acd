use super::main_handlers::AppState;
use crate::database::AnswerScope;
use crate::error::AppError;
use crate::middleware::require_identity;
use crate::permissions::{ensure, Action, Resource};
use crate::submission::validate_selection_update;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use shared_types::{
    AnswerListResponse, AnswerResponse, QuestionKind, UpdateAnswerRequest, UserInfo,
};

fn ensure_answer_access(actor: &UserInfo, action: Action, scope: &AnswerScope) -> Result<(), AppError> {
    ensure(
        Some(actor),
        action,
        Resource::Answer {
            owner_id: scope.answer.user_id,
            survey_author_id: scope.survey_author_id,
        },
    )
}

pub async fn list_answers(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = require_identity(&req)?;
    let answers = data.database.list_visible_answers(&actor)?;
    Ok(HttpResponse::Ok().json(AnswerListResponse { answers }))
}

pub async fn get_answer(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = require_identity(&req)?;
    let scope = data.database.get_answer_scope(path.into_inner())?;
    ensure_answer_access(&actor, Action::Read, &scope)?;

    Ok(HttpResponse::Ok().json(AnswerResponse {
        answer: scope.answer,
    }))
}

pub async fn update_answer(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateAnswerRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let answer_id = path.into_inner();
    let actor = require_identity(&req)?;
    let scope = data.database.get_answer_scope(answer_id)?;
    ensure_answer_access(&actor, Action::Update, &scope)?;

    let update_req = request.into_inner();
    let question = data.database.get_question(scope.answer.question_id)?;

    let option_ids = match &update_req.selected_options {
        Some(ids) => Some(validate_selection_update(&question, ids)?),
        None => None,
    };

    if update_req.text_response.is_some() && !question.kind.is_text() {
        return Err(AppError::InvalidRequest(format!(
            "Text can only be changed on text questions, question {} is {}",
            question.id,
            question.kind.as_str()
        )));
    }

    // Single choice keeps the option text alongside the selection
    let text_response = match (&option_ids, question.kind) {
        (Some(ids), QuestionKind::SingleChoice) => Some(
            ids.first()
                .and_then(|id| question.option(*id))
                .map(|o| o.text.clone())
                .unwrap_or_default(),
        ),
        _ => update_req.text_response,
    };

    let updated = data.database.update_answer(
        answer_id,
        text_response.as_deref(),
        option_ids.as_deref(),
    )?;

    tracing::info!("User {} updated answer {}", actor.username, answer_id);
    Ok(HttpResponse::Ok().json(AnswerResponse {
        answer: updated.answer,
    }))
}

pub async fn delete_answer(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let answer_id = path.into_inner();
    let actor = require_identity(&req)?;
    let scope = data.database.get_answer_scope(answer_id)?;
    ensure_answer_access(&actor, Action::Delete, &scope)?;

    data.database.delete_answer(answer_id)?;
    if let Some(file) = &scope.answer.file_path {
        // Keep the file while another answer still points at the same content
        if data.database.find_answers_by_file(file)?.is_empty() {
            data.uploads.remove(file);
        }
    }

    tracing::info!("User {} deleted answer {}", actor.username, answer_id);
    Ok(HttpResponse::NoContent().finish())
}

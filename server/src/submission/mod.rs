//! Response ingestion: validates a submission against the survey definition and
//! stores it as one response with exactly one answer per question.
//!
//! Everything is checked before anything is written. Uploaded files are the only
//! side effect outside the database; they are written just before the
//! transaction and removed again if it does not commit.

pub mod guard;
pub mod uploads;

use crate::config::DuplicatePolicy;
use crate::database::{AnswerContext, Database, NewAnswer, NewResponse, ResponseInsert};
use crate::error::{AppError, AppResult};
use crate::permissions::{self, Action, Resource};
use crate::request_context::RequestContext;
use base64::Engine;
use guard::RespondentKey;
use shared_types::{
    Question, QuestionKind, QuestionOption, SubmissionReceipt, SubmissionRequest, SubmittedValue,
    SurveyDetail, UploadedFile, UserInfo, ValidationCode, ValidationIssue,
};
use std::collections::{BTreeMap, HashSet};
use uploads::UploadStore;

/// Who is submitting, and from where
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub identity: Option<UserInfo>,
    pub request: RequestContext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Accepted(SubmissionReceipt),
    /// The respondent already answered this survey; nothing was stored
    AlreadyResponded,
}

/// A file that passed validation but has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub sanitized_name: String,
    pub content: Vec<u8>,
}

/// Validated value for one question
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedValue {
    Empty,
    Text(String),
    Choice {
        option_ids: Vec<i64>,
        /// Option text, kept for single choice only
        text: Option<String>,
    },
    File(PendingFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAnswer {
    pub question_id: i64,
    pub value: PlannedValue,
}

/// Runs the full submission path: access check, duplicate guard, validation, atomic persist
pub fn submit_response(
    db: &Database,
    uploads: &UploadStore,
    policy: DuplicatePolicy,
    survey_id: i64,
    request: SubmissionRequest,
    ctx: SubmissionContext,
) -> AppResult<SubmissionOutcome> {
    let detail = db.get_survey_detail(survey_id)?;
    let identity = ctx.identity.as_ref();

    permissions::ensure(identity, Action::Respond, Resource::survey(&detail.survey))?;

    if !detail.survey.is_active {
        return Err(AppError::InvalidRequest(format!(
            "Survey {} is not accepting responses",
            survey_id
        )));
    }

    let respondent = RespondentKey::for_request(policy, identity, &ctx.request.source_address);
    if respondent.is_deduplicated() && db.has_response(survey_id, &respondent.as_db_key())? {
        tracing::info!(
            "Duplicate submission to survey {} rejected ({} respondent)",
            survey_id,
            respondent.kind()
        );
        return Ok(SubmissionOutcome::AlreadyResponded);
    }

    let planned = validate_submission(&detail, &request.answers, uploads).map_err(|issues| {
        tracing::info!(
            "Submission to survey {} rejected with {} issue(s)",
            survey_id,
            issues.len()
        );
        AppError::Validation(issues)
    })?;

    let written = write_files(uploads, &planned)?;

    let response = NewResponse {
        survey_id,
        respondent_key: respondent.as_db_key(),
        user_id: identity.map(|u| u.id),
        context: AnswerContext {
            ip_address: ctx.request.source_address.clone(),
            user_agent: ctx.request.user_agent.clone(),
            browser: ctx.request.client.browser.clone(),
            device_type: ctx.request.client.device.clone(),
            os: ctx.request.client.os.clone(),
            language: ctx.request.language.clone(),
            timezone: client_timezone(request.timezone.as_deref()),
        },
        answers: planned
            .into_iter()
            .map(|answer| into_new_answer(answer, &written))
            .collect(),
    };

    match db.insert_response(&response) {
        Ok(ResponseInsert::Inserted {
            response_id,
            answer_ids,
        }) => {
            tracing::info!(
                "Accepted response {} to survey {} ({} answers, {} respondent)",
                response_id,
                survey_id,
                answer_ids.len(),
                respondent.kind()
            );
            Ok(SubmissionOutcome::Accepted(SubmissionReceipt {
                status: "accepted".to_string(),
                response_id,
                answer_ids,
            }))
        }
        Ok(ResponseInsert::Duplicate) => {
            remove_files(uploads, &written);
            tracing::info!(
                "Concurrent duplicate submission to survey {} rejected ({} respondent)",
                survey_id,
                respondent.kind()
            );
            Ok(SubmissionOutcome::AlreadyResponded)
        }
        Err(e) => {
            tracing::error!(
                "Storing response to survey {} failed, rolled back: {}",
                survey_id,
                e
            );
            remove_files(uploads, &written);
            Err(e)
        }
    }
}

/// Checks every submitted value against its question.
///
/// All problems are collected so the caller sees the complete list at once.
/// On success the result holds one planned answer per question, in survey order.
pub fn validate_submission(
    detail: &SurveyDetail,
    answers: &BTreeMap<i64, SubmittedValue>,
    uploads: &UploadStore,
) -> Result<Vec<PlannedAnswer>, Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = answers
        .keys()
        .filter(|id| detail.question(**id).is_none())
        .map(|id| {
            ValidationIssue::new(
                *id,
                ValidationCode::UnknownQuestion,
                format!("Question {} is not part of this survey", id),
            )
        })
        .collect();

    let mut planned = Vec::with_capacity(detail.questions.len());
    for question in &detail.questions {
        match validate_answer(question, answers.get(&question.id), uploads) {
            Ok(value) => planned.push(PlannedAnswer {
                question_id: question.id,
                value,
            }),
            Err(issue) => issues.push(issue),
        }
    }

    if issues.is_empty() {
        Ok(planned)
    } else {
        Err(issues)
    }
}

/// Validates a replacement selection for an existing choice answer
pub fn validate_selection_update(question: &Question, option_ids: &[i64]) -> AppResult<Vec<i64>> {
    if !question.kind.is_choice() {
        return Err(AppError::InvalidRequest(format!(
            "Question {} is not a choice question",
            question.id
        )));
    }

    let selected = check_selection(question, option_ids)
        .map_err(|issue| AppError::Validation(vec![issue]))?;
    if question.is_required && selected.is_empty() {
        return Err(AppError::Validation(vec![required_missing(question)]));
    }

    Ok(selected)
}

fn validate_answer(
    question: &Question,
    value: Option<&SubmittedValue>,
    uploads: &UploadStore,
) -> Result<PlannedValue, ValidationIssue> {
    let planned = match question.kind {
        QuestionKind::Text | QuestionKind::Word | QuestionKind::String => match value {
            None => PlannedValue::Empty,
            Some(SubmittedValue::Text(text)) if text.trim().is_empty() => PlannedValue::Empty,
            Some(SubmittedValue::Text(text)) => PlannedValue::Text(text.clone()),
            Some(other) => return Err(unexpected_value(question, other)),
        },
        QuestionKind::SingleChoice => {
            let selected = check_selection(question, &selection_ids(question, value)?)?;
            match selected.first().and_then(|id| question.option(*id)) {
                None => PlannedValue::Empty,
                Some(option) => PlannedValue::Choice {
                    option_ids: vec![option.id],
                    text: Some(option.text.clone()),
                },
            }
        }
        QuestionKind::MultipleChoice | QuestionKind::LimitedChoice => {
            let selected = check_selection(question, &selection_ids(question, value)?)?;
            if selected.is_empty() {
                PlannedValue::Empty
            } else {
                PlannedValue::Choice {
                    option_ids: selected,
                    text: None,
                }
            }
        }
        QuestionKind::File => match value {
            None => PlannedValue::Empty,
            Some(SubmittedValue::File(file)) => {
                PlannedValue::File(validate_file(question, file, uploads)?)
            }
            Some(other) => return Err(unexpected_value(question, other)),
        },
    };

    if question.is_required && planned == PlannedValue::Empty {
        return Err(required_missing(question));
    }

    Ok(planned)
}

fn selection_ids(
    question: &Question,
    value: Option<&SubmittedValue>,
) -> Result<Vec<i64>, ValidationIssue> {
    match value {
        None => Ok(Vec::new()),
        Some(SubmittedValue::Selection(id)) => Ok(vec![*id]),
        Some(SubmittedValue::Selections(ids)) => Ok(ids.clone()),
        Some(other) => Err(unexpected_value(question, other)),
    }
}

/// Deduplicates the ids, then checks option membership and the kind's selection limit
fn check_selection(question: &Question, option_ids: &[i64]) -> Result<Vec<i64>, ValidationIssue> {
    let mut seen = HashSet::new();
    let selected: Vec<i64> = option_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    for option_id in &selected {
        resolve_option(question, *option_id)?;
    }

    match question.kind {
        QuestionKind::SingleChoice if selected.len() > 1 => Err(ValidationIssue::new(
            question.id,
            ValidationCode::UnexpectedValue,
            format!("Only one option may be chosen, got {}", selected.len()),
        )),
        QuestionKind::LimitedChoice => {
            let limit = question.choice_limit.unwrap_or(1).max(1) as usize;
            if selected.len() > limit {
                Err(ValidationIssue::new(
                    question.id,
                    ValidationCode::SelectionLimitExceeded,
                    format!(
                        "Selection limit exceeded: at most {} option(s), got {}",
                        limit,
                        selected.len()
                    ),
                ))
            } else {
                Ok(selected)
            }
        }
        _ => Ok(selected),
    }
}

fn resolve_option(question: &Question, option_id: i64) -> Result<&QuestionOption, ValidationIssue> {
    question.option(option_id).ok_or_else(|| {
        ValidationIssue::new(
            question.id,
            ValidationCode::InvalidOption,
            format!(
                "Option {} does not belong to question {}",
                option_id, question.id
            ),
        )
    })
}

fn validate_file(
    question: &Question,
    file: &UploadedFile,
    uploads: &UploadStore,
) -> Result<PendingFile, ValidationIssue> {
    let issue = |code, message: String| ValidationIssue::new(question.id, code, message);
    let disallowed = || {
        issue(
            ValidationCode::DisallowedFileType,
            format!("File type of \"{}\" is not allowed", file.filename),
        )
    };

    if !uploads.is_allowed(&file.filename) {
        return Err(disallowed());
    }

    let sanitized_name = uploads.sanitize_filename(&file.filename).ok_or_else(|| {
        issue(
            ValidationCode::InvalidFile,
            format!("\"{}\" is not a usable file name", file.filename),
        )
    })?;

    // Sanitizing may strip characters from the extension
    if !uploads.is_allowed(&sanitized_name) {
        return Err(disallowed());
    }

    let content = base64::engine::general_purpose::STANDARD
        .decode(file.content_base64.trim())
        .map_err(|e| issue(ValidationCode::InvalidFile, format!("Invalid base64 content: {e}")))?;

    if content.len() > uploads.max_file_bytes() {
        return Err(issue(
            ValidationCode::FileTooLarge,
            format!(
                "File is {} bytes, the limit is {}",
                content.len(),
                uploads.max_file_bytes()
            ),
        ));
    }

    Ok(PendingFile {
        sanitized_name,
        content,
    })
}

fn unexpected_value(question: &Question, value: &SubmittedValue) -> ValidationIssue {
    ValidationIssue::new(
        question.id,
        ValidationCode::UnexpectedValue,
        format!(
            "A {} question does not accept a {}",
            question.kind.as_str(),
            value.shape()
        ),
    )
}

fn required_missing(question: &Question) -> ValidationIssue {
    ValidationIssue::new(
        question.id,
        ValidationCode::RequiredMissing,
        format!("Required field missing: \"{}\"", question.text),
    )
}

/// Writes pending files, returning stored names keyed by question id
const MAX_TIMEZONE_LEN: usize = 64;

/// Client-declared timezone, trimmed and capped; `UTC` when absent
fn client_timezone(timezone: Option<&str>) -> String {
    match timezone.map(str::trim) {
        Some(tz) if !tz.is_empty() => tz.chars().take(MAX_TIMEZONE_LEN).collect(),
        _ => "UTC".to_string(),
    }
}

fn write_files(
    uploads: &UploadStore,
    planned: &[PlannedAnswer],
) -> AppResult<BTreeMap<i64, String>> {
    let mut written = BTreeMap::new();

    for answer in planned {
        if let PlannedValue::File(file) = &answer.value {
            match uploads.store(&file.sanitized_name, &file.content) {
                Ok(stored) => {
                    written.insert(answer.question_id, stored);
                }
                Err(e) => {
                    tracing::error!("Failed to store upload {}: {}", file.sanitized_name, e);
                    remove_files(uploads, &written);
                    return Err(AppError::StorageFailure(format!(
                        "Could not store uploaded file: {e}"
                    )));
                }
            }
        }
    }

    Ok(written)
}

fn remove_files(uploads: &UploadStore, written: &BTreeMap<i64, String>) {
    for stored in written.values() {
        uploads.remove(stored);
    }
}

fn into_new_answer(answer: PlannedAnswer, written: &BTreeMap<i64, String>) -> NewAnswer {
    let mut new_answer = NewAnswer {
        question_id: answer.question_id,
        ..NewAnswer::default()
    };

    match answer.value {
        PlannedValue::Empty => {}
        PlannedValue::Text(text) => new_answer.text_response = Some(text),
        PlannedValue::Choice { option_ids, text } => {
            new_answer.option_ids = option_ids;
            new_answer.text_response = text;
        }
        PlannedValue::File(_) => {
            new_answer.file_path = written.get(&answer.question_id).cloned();
        }
    }

    new_answer
}

use std::fs;
use std::path::Path;

/// Every type exported to the web client, in output order
pub const API_TYPES: &[&str] = &[
    "LoginRequest",
    "TokenResponse",
    "RefreshRequest",
    "AccessTokenResponse",
    "RegisterRequest",
    "UpdateUserRequest",
    "UserInfo",
    "QuestionKind",
    "Survey",
    "QuestionOption",
    "Question",
    "SurveyDetail",
    "NewQuestion",
    "CreateSurveyRequest",
    "UpdateSurveyRequest",
    "UploadedFile",
    "SubmittedValue",
    "SubmissionRequest",
    "SubmissionReceipt",
    "ValidationCode",
    "ValidationIssue",
    "SelectedOption",
    "Answer",
    "UpdateAnswerRequest",
    "SurveyStats",
    "QuestionStats",
    "OptionStat",
    "TextStats",
    "FileStats",
    "ErrorResponse",
];

pub fn generate_typescript_definitions(
    type_names: &[&str],
) -> Result<String, Box<dyn std::error::Error>> {
    if type_names.is_empty() {
        return Err("No type names provided".into());
    }

    let mut definitions = Vec::new();

    for name in type_names {
        let type_def = export_type(name)?;
        let cleaned = clean_type(type_def);

        if !cleaned.trim().is_empty() {
            definitions.push(cleaned);
        }
    }

    Ok(definitions.join("\n\n"))
}

/// Writes all API types into a single `.ts` file, creating parent directories
pub fn write_typescript_definitions(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut output = generate_typescript_definitions(API_TYPES)?;
    output.push('\n');
    fs::write(path, output)?;
    Ok(())
}

fn export_type(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    use crate::*;
    use ts_rs::TS;

    let result = match name {
        "LoginRequest" => LoginRequest::export_to_string()?,
        "TokenResponse" => TokenResponse::export_to_string()?,
        "RefreshRequest" => RefreshRequest::export_to_string()?,
        "AccessTokenResponse" => AccessTokenResponse::export_to_string()?,
        "RegisterRequest" => RegisterRequest::export_to_string()?,
        "UpdateUserRequest" => UpdateUserRequest::export_to_string()?,
        "UserInfo" => UserInfo::export_to_string()?,

        "QuestionKind" => QuestionKind::export_to_string()?,
        "Survey" => Survey::export_to_string()?,
        "QuestionOption" => QuestionOption::export_to_string()?,
        "Question" => Question::export_to_string()?,
        "SurveyDetail" => SurveyDetail::export_to_string()?,
        "NewQuestion" => NewQuestion::export_to_string()?,
        "CreateSurveyRequest" => CreateSurveyRequest::export_to_string()?,
        "UpdateSurveyRequest" => UpdateSurveyRequest::export_to_string()?,

        "UploadedFile" => UploadedFile::export_to_string()?,
        "SubmittedValue" => SubmittedValue::export_to_string()?,
        "SubmissionRequest" => SubmissionRequest::export_to_string()?,
        "SubmissionReceipt" => SubmissionReceipt::export_to_string()?,
        "ValidationCode" => ValidationCode::export_to_string()?,
        "ValidationIssue" => ValidationIssue::export_to_string()?,
        "SelectedOption" => SelectedOption::export_to_string()?,
        "Answer" => Answer::export_to_string()?,
        "UpdateAnswerRequest" => UpdateAnswerRequest::export_to_string()?,

        "SurveyStats" => SurveyStats::export_to_string()?,
        "QuestionStats" => QuestionStats::export_to_string()?,
        "OptionStat" => OptionStat::export_to_string()?,
        "TextStats" => TextStats::export_to_string()?,
        "FileStats" => FileStats::export_to_string()?,

        "ErrorResponse" => ErrorResponse::export_to_string()?,

        _ => {
            return Err(format!(
                "Unknown type: '{}'. Available types can be found in shared-types/src/",
                name
            )
            .into());
        }
    };

    Ok(result)
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
        })
        .collect();

    filtered.join("\n").trim().to_string()
}

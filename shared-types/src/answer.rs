use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

// ============ Submission payloads ============

/// File uploaded inline with a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadedFile {
    pub filename: String,
    pub content_base64: String,
}

/// Value submitted for one question.
///
/// The variant is decided by the JSON shape: a list of option ids, a single
/// option id, a string, or an inline file object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum SubmittedValue {
    Selections(Vec<i64>),
    Selection(i64),
    Text(String),
    File(UploadedFile),
}

impl SubmittedValue {
    pub fn shape(&self) -> &'static str {
        match self {
            SubmittedValue::Selections(_) => "list of option ids",
            SubmittedValue::Selection(_) => "option id",
            SubmittedValue::Text(_) => "text",
            SubmittedValue::File(_) => "file",
        }
    }
}

/// Body of `POST /api/surveys/{id}/responses`
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmissionRequest {
    /// Submitted values keyed by question id
    #[serde(default)]
    pub answers: BTreeMap<i64, SubmittedValue>,
    /// Client-declared timezone, `UTC` when absent
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmissionReceipt {
    pub status: String,
    pub response_id: i64,
    pub answer_ids: Vec<i64>,
}

// ============ Validation ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    RequiredMissing,
    InvalidOption,
    DisallowedFileType,
    SelectionLimitExceeded,
    UnexpectedValue,
    UnknownQuestion,
    InvalidFile,
    FileTooLarge,
}

/// One problem found with a submitted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationIssue {
    pub question_id: i64,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(question_id: i64, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            question_id,
            code,
            message: message.into(),
        }
    }
}

// ============ Stored answers ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectedOption {
    pub id: i64,
    pub text: String,
}

/// A persisted answer to one question, with the request context it was submitted under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Answer {
    pub id: i64,
    pub response_id: i64,
    /// None for anonymous respondents
    pub user_id: Option<i64>,
    pub question_id: i64,
    pub text_response: Option<String>,
    /// Stored (sanitized) upload name
    pub file_path: Option<String>,
    pub created_at: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub browser: String,
    pub device_type: String,
    pub os: String,
    pub language: Option<String>,
    pub timezone: String,
    pub selected_options: Vec<SelectedOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateAnswerRequest {
    pub text_response: Option<String>,
    /// Replaces all selected options when present
    pub selected_options: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerListResponse {
    pub answers: Vec<Answer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submitted_value_shapes() {
        let req: SubmissionRequest = serde_json::from_str(
            r#"{
                "answers": {
                    "1": "hello",
                    "2": 7,
                    "3": [7, 8],
                    "4": {"filename": "a.png", "content_base64": "AAAA"}
                },
                "timezone": "Europe/Berlin"
            }"#,
        )
        .unwrap();

        assert_eq!(req.answers[&1], SubmittedValue::Text("hello".to_string()));
        assert_eq!(req.answers[&2], SubmittedValue::Selection(7));
        assert_eq!(req.answers[&3], SubmittedValue::Selections(vec![7, 8]));
        assert!(matches!(req.answers[&4], SubmittedValue::File(_)));
        assert_eq!(req.timezone.as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_empty_submission_defaults() {
        let req: SubmissionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.answers.is_empty());
        assert!(req.timezone.is_none());
    }

    #[test]
    fn test_validation_code_wire_format() {
        let issue = ValidationIssue::new(3, ValidationCode::SelectionLimitExceeded, "too many");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "selection_limit_exceeded");
        assert_eq!(json["question_id"], 3);
    }
}

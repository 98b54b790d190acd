use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod answer;
pub mod auth;
pub mod stats;
pub mod survey;
pub mod typescript_gen;

pub use typescript_gen::{generate_typescript_definitions, write_typescript_definitions};

pub use answer::{
    Answer, AnswerListResponse, AnswerResponse, SelectedOption, SubmissionReceipt,
    SubmissionRequest, SubmittedValue, UpdateAnswerRequest, UploadedFile, ValidationCode,
    ValidationIssue,
};
pub use auth::{
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse,
    UpdateUserRequest, User, UserInfo, UserListResponse, UserResponse,
};
pub use stats::{FileStats, OptionStat, QuestionStats, SurveyStats, TextStats};
pub use survey::{
    CreateSurveyRequest, NewQuestion, Question, QuestionKind, QuestionOption, Survey,
    SurveyDetail, SurveyListQuery, SurveyListResponse, SurveyResponse, UpdateSurveyRequest,
};

// Shared models for the survey server and its web client

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

/// Body of every non-2xx JSON response
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Per-question problems, only present for rejected submissions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

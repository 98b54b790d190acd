use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Type of a question; drives how submitted values are validated and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-form text
    Text,
    /// A single word
    Word,
    /// A short string
    String,
    SingleChoice,
    MultipleChoice,
    /// Multiple choice capped at `choice_limit` selections
    LimitedChoice,
    File,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Word => "word",
            QuestionKind::String => "string",
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::LimitedChoice => "limited_choice",
            QuestionKind::File => "file",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(QuestionKind::Text),
            "word" => Some(QuestionKind::Word),
            "string" => Some(QuestionKind::String),
            "single_choice" => Some(QuestionKind::SingleChoice),
            "multiple_choice" => Some(QuestionKind::MultipleChoice),
            "limited_choice" => Some(QuestionKind::LimitedChoice),
            "file" => Some(QuestionKind::File),
            _ => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice | QuestionKind::LimitedChoice
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            QuestionKind::Text | QuestionKind::Word | QuestionKind::String
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author_id: i64,
    pub created_at: i64,
    pub is_active: bool,
    pub require_login: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: i64,
    pub survey_id: i64,
    /// Zero-based display order within the survey
    pub position: i64,
    pub kind: QuestionKind,
    pub text: String,
    pub is_required: bool,
    /// Only set for limited-choice questions
    pub choice_limit: Option<i64>,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option(&self, option_id: i64) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A survey together with its ordered questions and their options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurveyDetail {
    pub survey: Survey,
    pub questions: Vec<Question>,
}

impl SurveyDetail {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Question definition supplied when creating or replacing a survey's questions
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    pub choice_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSurveyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub require_login: bool,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<NewQuestion>,
}

fn default_is_active() -> bool {
    true
}

/// Partial survey update; `questions`, when present, replaces all existing questions
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateSurveyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub require_login: Option<bool>,
    pub questions: Option<Vec<NewQuestion>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyListQuery {
    /// Restrict the listing to the caller's own surveys
    pub mine: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub survey: SurveyDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyListResponse {
    pub surveys: Vec<Survey>,
}

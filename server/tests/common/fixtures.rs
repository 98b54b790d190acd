use base64::Engine;
use serde_json::{json, Value};
use shared_types::{Question, SurveyDetail};

pub const FIREFOX_WINDOWS: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0";

/// Builders for request payloads used across the integration tests
pub struct TestDataGenerator;

#[allow(dead_code)]
impl TestDataGenerator {
    pub fn survey(title: &str, questions: Vec<Value>) -> Value {
        json!({
            "title": title,
            "description": format!("{} description", title),
            "questions": questions,
        })
    }

    pub fn login_required_survey(title: &str, questions: Vec<Value>) -> Value {
        let mut survey = Self::survey(title, questions);
        survey["require_login"] = json!(true);
        survey
    }

    pub fn text_question(text: &str, required: bool) -> Value {
        json!({ "text": text, "kind": "text", "required": required })
    }

    pub fn choice_question(text: &str, kind: &str, required: bool, options: &[&str]) -> Value {
        json!({ "text": text, "kind": kind, "required": required, "options": options })
    }

    pub fn limited_question(text: &str, limit: i64, options: &[&str]) -> Value {
        json!({
            "text": text,
            "kind": "limited_choice",
            "required": false,
            "options": options,
            "choice_limit": limit,
        })
    }

    pub fn file_question(text: &str, required: bool) -> Value {
        json!({ "text": text, "kind": "file", "required": required })
    }

    pub fn file_value(filename: &str, content: &[u8]) -> Value {
        json!({
            "filename": filename,
            "content_base64": base64::engine::general_purpose::STANDARD.encode(content),
        })
    }

    /// Submission body from `(question id, value)` pairs
    pub fn answers(values: Vec<(i64, Value)>) -> Value {
        let answers: serde_json::Map<String, Value> = values
            .into_iter()
            .map(|(question_id, value)| (question_id.to_string(), value))
            .collect();
        json!({ "answers": answers, "timezone": "Europe/Berlin" })
    }
}

/// Id of the option with the given text
#[allow(dead_code)]
pub fn option_id(question: &Question, text: &str) -> i64 {
    question
        .options
        .iter()
        .find(|o| o.text == text)
        .map(|o| o.id)
        .unwrap_or_else(|| panic!("Question {} has no option {}", question.id, text))
}

#[allow(dead_code)]
pub fn first_question(survey: &SurveyDetail) -> &Question {
    survey.questions.first().expect("Survey has no questions")
}

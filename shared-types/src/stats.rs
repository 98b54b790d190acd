use crate::survey::QuestionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Aggregated statistics for one survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SurveyStats {
    pub survey_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    /// Distinct source addresses among the survey's answers
    pub total_respondents: u64,
    pub browsers: BTreeMap<String, u64>,
    pub operating_systems: BTreeMap<String, u64>,
    pub devices: BTreeMap<String, u64>,
    pub questions: Vec<QuestionStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionStats {
    pub question_id: i64,
    pub text: String,
    pub kind: QuestionKind,
    pub answers_count: u64,
    /// Percentage of respondents that answered, one decimal
    pub response_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_stats: Option<Vec<OptionStat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_stats: Option<TextStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_stats: Option<FileStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OptionStat {
    pub option_id: i64,
    pub option: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TextStats {
    pub avg_length: f64,
    pub responses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FileStats {
    /// Keyed by lowercased extension including the dot, e.g. `.png`
    pub file_types: BTreeMap<String, u64>,
    pub file_paths: Vec<String>,
}

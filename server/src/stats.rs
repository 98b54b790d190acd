use shared_types::{
    Answer, FileStats, OptionStat, Question, QuestionKind, QuestionStats, SurveyDetail,
    SurveyStats, TextStats,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

/// Whether an answer row carries an actual response
fn is_answered(answer: &Answer) -> bool {
    !answer.selected_options.is_empty()
        || answer.file_path.is_some()
        || answer
            .text_response
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
}

/// Lowercased extension including the dot, empty when there is none
fn extension(file_path: &str) -> String {
    match file_path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => String::new(),
    }
}

/// Computes statistics for a survey from all of its stored answers
pub fn aggregate(detail: &SurveyDetail, answers: &[Answer]) -> SurveyStats {
    let total_respondents = answers
        .iter()
        .map(|a| a.ip_address.as_str())
        .collect::<BTreeSet<_>>()
        .len() as u64;

    // One entry per response: the first answer stands for the whole submission
    let mut first_per_response: BTreeMap<i64, &Answer> = BTreeMap::new();
    for answer in answers {
        first_per_response.entry(answer.response_id).or_insert(answer);
    }

    let mut browsers = BTreeMap::new();
    let mut operating_systems = BTreeMap::new();
    let mut devices = BTreeMap::new();
    for answer in first_per_response.values() {
        *browsers.entry(answer.browser.clone()).or_insert(0) += 1;
        *operating_systems.entry(answer.os.clone()).or_insert(0) += 1;
        *devices.entry(answer.device_type.clone()).or_insert(0) += 1;
    }

    let mut by_question: HashMap<i64, Vec<&Answer>> = HashMap::new();
    for answer in answers.iter().filter(|a| is_answered(a)) {
        by_question.entry(answer.question_id).or_default().push(answer);
    }

    let questions = detail
        .questions
        .iter()
        .map(|question| {
            let answered = by_question
                .get(&question.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            question_stats(question, answered, total_respondents)
        })
        .collect();

    SurveyStats {
        survey_id: detail.survey.id,
        title: detail.survey.title.clone(),
        description: detail.survey.description.clone(),
        created_at: detail.survey.created_at,
        total_respondents,
        browsers,
        operating_systems,
        devices,
        questions,
    }
}

fn question_stats(question: &Question, answered: &[&Answer], total_respondents: u64) -> QuestionStats {
    let answers_count = answered.len() as u64;

    let mut stats = QuestionStats {
        question_id: question.id,
        text: question.text.clone(),
        kind: question.kind,
        answers_count,
        response_rate: percentage(answers_count, total_respondents),
        option_stats: None,
        text_stats: None,
        file_stats: None,
    };

    match question.kind {
        QuestionKind::SingleChoice | QuestionKind::MultipleChoice | QuestionKind::LimitedChoice => {
            let mut counts: HashMap<i64, u64> = HashMap::new();
            for answer in answered {
                for selected in &answer.selected_options {
                    *counts.entry(selected.id).or_insert(0) += 1;
                }
            }

            stats.option_stats = Some(
                question
                    .options
                    .iter()
                    .map(|option| {
                        let count = counts.get(&option.id).copied().unwrap_or(0);
                        OptionStat {
                            option_id: option.id,
                            option: option.text.clone(),
                            count,
                            percentage: percentage(count, answers_count),
                        }
                    })
                    .collect(),
            );
        }
        QuestionKind::Text | QuestionKind::Word | QuestionKind::String => {
            let responses: Vec<String> = answered
                .iter()
                .filter_map(|a| a.text_response.clone())
                .collect();
            let total_len: usize = responses.iter().map(|r| r.chars().count()).sum();
            let avg_length = if responses.is_empty() {
                0.0
            } else {
                round1(total_len as f64 / responses.len() as f64)
            };

            stats.text_stats = Some(TextStats {
                avg_length,
                responses,
            });
        }
        QuestionKind::File => {
            let file_paths: Vec<String> =
                answered.iter().filter_map(|a| a.file_path.clone()).collect();
            let mut file_types = BTreeMap::new();
            for path in &file_paths {
                *file_types.entry(extension(path)).or_insert(0) += 1;
            }

            stats.file_stats = Some(FileStats {
                file_types,
                file_paths,
            });
        }
    }

    stats
}

use crate::error::{AppError, AppResult};
use shared_types::{CreateSurveyRequest, NewQuestion, UpdateSurveyRequest};

pub fn normalize_create(mut request: CreateSurveyRequest) -> AppResult<CreateSurveyRequest> {
    request.title = normalize_title(&request.title)?;
    request.description = request.description.trim().to_string();
    request.questions = normalize_questions(request.questions)?;
    Ok(request)
}

pub fn normalize_update(mut request: UpdateSurveyRequest) -> AppResult<UpdateSurveyRequest> {
    if let Some(title) = &request.title {
        request.title = Some(normalize_title(title)?);
    }
    if let Some(description) = &request.description {
        request.description = Some(description.trim().to_string());
    }
    if let Some(questions) = request.questions.take() {
        request.questions = Some(normalize_questions(questions)?);
    }
    Ok(request)
}

fn normalize_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidRequest(
            "Survey title cannot be empty".to_string(),
        ));
    }
    Ok(title.to_string())
}

/// Trims texts, drops blank options and enforces per-kind shape.
///
/// Choice questions need at least one option; limited choice defaults to a
/// limit of one. Other kinds never carry options or a limit.
fn normalize_questions(questions: Vec<NewQuestion>) -> AppResult<Vec<NewQuestion>> {
    questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| normalize_question(index + 1, question))
        .collect()
}

fn normalize_question(number: usize, mut question: NewQuestion) -> AppResult<NewQuestion> {
    question.text = question.text.trim().to_string();
    if question.text.is_empty() {
        return Err(AppError::InvalidRequest(format!(
            "Question {number}: text cannot be empty"
        )));
    }

    if !question.kind.is_choice() {
        question.options.clear();
        question.choice_limit = None;
        return Ok(question);
    }

    question.options = question
        .options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if question.options.is_empty() {
        return Err(AppError::InvalidRequest(format!(
            "Question {number}: {} needs at least one option",
            question.kind.as_str()
        )));
    }

    question.choice_limit = match question.kind {
        shared_types::QuestionKind::LimitedChoice => {
            let limit = question.choice_limit.unwrap_or(1);
            if limit < 1 {
                return Err(AppError::InvalidRequest(format!(
                    "Question {number}: choice_limit must be at least 1"
                )));
            }
            Some(limit)
        }
        _ => None,
    };

    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::QuestionKind;

    fn question(kind: QuestionKind, options: &[&str], limit: Option<i64>) -> NewQuestion {
        NewQuestion {
            text: " Pick ".to_string(),
            kind,
            required: false,
            options: options.iter().map(|s| s.to_string()).collect(),
            choice_limit: limit,
        }
    }

    fn create(questions: Vec<NewQuestion>) -> CreateSurveyRequest {
        CreateSurveyRequest {
            title: "  Lunch  ".to_string(),
            description: String::new(),
            require_login: false,
            is_active: true,
            questions,
        }
    }

    #[test]
    fn test_blank_options_are_dropped() {
        let request = normalize_create(create(vec![question(
            QuestionKind::SingleChoice,
            &["Soup", "  ", "Salad "],
            Some(3),
        )]))
        .unwrap();

        assert_eq!(request.title, "Lunch");
        let q = &request.questions[0];
        assert_eq!(q.text, "Pick");
        assert_eq!(q.options, vec!["Soup", "Salad"]);
        assert_eq!(q.choice_limit, None); // Only limited choice keeps a limit
    }

    #[test]
    fn test_limited_choice_defaults_to_one() {
        let request = normalize_create(create(vec![question(
            QuestionKind::LimitedChoice,
            &["A", "B"],
            None,
        )]))
        .unwrap();
        assert_eq!(request.questions[0].choice_limit, Some(1));

        let result = normalize_create(create(vec![question(
            QuestionKind::LimitedChoice,
            &["A", "B"],
            Some(0),
        )]));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_choice_question_needs_options() {
        let result = normalize_create(create(vec![question(
            QuestionKind::MultipleChoice,
            &["", " "],
            None,
        )]));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_non_choice_questions_lose_options() {
        let request =
            normalize_create(create(vec![question(QuestionKind::File, &["x"], Some(2))])).unwrap();
        assert!(request.questions[0].options.is_empty());
        assert_eq!(request.questions[0].choice_limit, None);
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut request = create(vec![]);
        request.title = "   ".to_string();
        assert!(normalize_create(request).is_err());

        let update = UpdateSurveyRequest {
            title: Some(String::new()),
            ..UpdateSurveyRequest::default()
        };
        assert!(normalize_update(update).is_err());
    }
}

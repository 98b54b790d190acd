mod common;

use actix_web::http::StatusCode;
use serde_json::json;
use shared_types::{QuestionKind, Survey, SurveyDetail, SurveyStats};

use common::fixtures::{first_question, option_id, TestDataGenerator as Data};
use common::spawn_app;

#[actix_rt::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app.get("/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}

#[actix_rt::test]
async fn test_create_and_fetch_survey() {
    let app = spawn_app().await;
    let author = app.create_user("author");

    let created = app
        .create_survey(
            &author,
            Data::survey(
                "  Team offsite  ",
                vec![
                    Data::text_question("Anything else?", false),
                    Data::choice_question("Where?", "multiple_choice", true, &["Lake", " ", "Forest"]),
                    Data::limited_question("Activities", 2, &["Hike", "Swim", "Cook"]),
                ],
            ),
        )
        .await;

    assert_eq!(created.survey.title, "Team offsite");
    assert_eq!(created.survey.author_id, author.id());
    assert!(created.survey.is_active);
    assert!(!created.survey.require_login);
    assert_eq!(created.questions.len(), 3);
    assert_eq!(created.questions[0].kind, QuestionKind::Text);
    // Blank options are dropped
    assert_eq!(created.questions[1].options.len(), 2);
    assert_eq!(created.questions[2].choice_limit, Some(2));

    let fetched = app
        .get(&format!("/api/surveys/{}", created.survey.id), None)
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    let detail: SurveyDetail = fetched.json("survey");
    assert_eq!(detail, created);
}

#[actix_rt::test]
async fn test_invalid_survey_definitions_are_rejected() {
    let app = spawn_app().await;
    let author = app.create_user("author");

    let cases = [
        Data::survey("   ", vec![Data::text_question("Q", false)]),
        Data::survey("No options", vec![Data::choice_question("Pick", "single_choice", true, &[])]),
        Data::survey("Bad limit", vec![Data::limited_question("Pick", 0, &["A", "B"])]),
        Data::survey("Blank question", vec![Data::text_question("  ", false)]),
    ];

    for payload in cases {
        let response = app.post("/api/surveys", Some(&author), payload.clone()).await;
        assert_eq!(
            response.status,
            StatusCode::BAD_REQUEST,
            "{} should be rejected: {}",
            payload,
            response.body
        );
        assert_eq!(response.error_type(), "invalid_request");
    }

    let unknown_kind = app
        .post(
            "/api/surveys",
            Some(&author),
            json!({ "title": "Rating", "questions": [{ "text": "Stars", "kind": "rating" }] }),
        )
        .await;
    assert_eq!(unknown_kind.status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_list_surveys_and_mine_filter() {
    let app = spawn_app().await;
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");

    app.create_survey(&alice, Data::survey("Alice one", vec![])).await;
    app.create_survey(&alice, Data::survey("Alice two", vec![])).await;
    app.create_survey(&bob, Data::survey("Bob one", vec![])).await;

    let all = app.get("/api/surveys", None).await;
    assert_eq!(all.status, StatusCode::OK);
    let surveys: Vec<Survey> = all.json("surveys");
    assert_eq!(surveys.len(), 3);

    let mine = app.get("/api/surveys?mine=true", Some(&bob)).await;
    let surveys: Vec<Survey> = mine.json("surveys");
    assert_eq!(surveys.len(), 1);
    assert_eq!(surveys[0].title, "Bob one");

    let anonymous_mine = app.get("/api/surveys?mine=true", None).await;
    assert_eq!(anonymous_mine.status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_replacing_questions_discards_responses() {
    let app = spawn_app().await;
    let author = app.create_user("author");
    let survey = app
        .create_survey(
            &author,
            Data::survey("Evolving", vec![Data::text_question("Old question", false)]),
        )
        .await;

    let submitted = app
        .submit(
            survey.survey.id,
            None,
            "10.0.0.1:4000",
            Data::answers(vec![(first_question(&survey).id, json!("old answer"))]),
        )
        .await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(app.answer_count(survey.survey.id), 1);

    let updated = app
        .put(
            &format!("/api/surveys/{}", survey.survey.id),
            Some(&author),
            json!({ "questions": [{ "text": "New question", "kind": "word" }] }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    let detail: SurveyDetail = updated.json("survey");
    assert_eq!(detail.survey.title, "Evolving");
    assert_eq!(detail.questions.len(), 1);
    assert_eq!(detail.questions[0].text, "New question");
    assert_eq!(app.answer_count(survey.survey.id), 0);

    // The same address may answer the new version
    let again = app
        .submit(
            survey.survey.id,
            None,
            "10.0.0.1:4000",
            Data::answers(vec![(detail.questions[0].id, json!("fresh"))]),
        )
        .await;
    assert_eq!(again.status, StatusCode::CREATED, "{}", again.body);
}

#[actix_rt::test]
async fn test_deleting_a_survey_removes_its_answers() {
    let app = spawn_app().await;
    let author = app.create_user("author");
    let survey = app
        .create_survey(
            &author,
            Data::survey("Short lived", vec![Data::text_question("Q", false)]),
        )
        .await;
    app.submit(
        survey.survey.id,
        None,
        "10.0.0.1:4000",
        Data::answers(vec![(first_question(&survey).id, json!("A"))]),
    )
    .await;

    let deleted = app
        .delete(&format!("/api/surveys/{}", survey.survey.id), Some(&author))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.answer_count(survey.survey.id), 0);

    let again = app
        .delete(&format!("/api/surveys/{}", survey.survey.id), Some(&author))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_survey_statistics() {
    let app = spawn_app().await;
    let author = app.create_user("author");
    let survey = app
        .create_survey(
            &author,
            Data::survey(
                "Colors",
                vec![
                    Data::choice_question("Favourite?", "single_choice", true, &["Red", "Green", "Blue"]),
                    Data::text_question("Why?", false),
                    Data::file_question("Picture", false),
                ],
            ),
        )
        .await;
    let choice = &survey.questions[0];
    let text = survey.questions[1].id;
    let file = survey.questions[2].id;
    let red = option_id(choice, "Red");
    let green = option_id(choice, "Green");

    let submissions = [
        ("10.0.0.1:4000", Data::answers(vec![(choice.id, json!(red)), (text, json!("ab"))])),
        (
            "10.0.0.2:4000",
            Data::answers(vec![
                (choice.id, json!(green)),
                (text, json!("abcd")),
                (file, Data::file_value("sky.png", b"\x89PNG")),
            ]),
        ),
        ("10.0.0.3:4000", Data::answers(vec![(choice.id, json!(green))])),
    ];
    for (address, body) in submissions {
        let response = app.submit(survey.survey.id, None, address, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    }

    let response = app
        .get(&format!("/api/surveys/{}/stats", survey.survey.id), Some(&author))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stats: SurveyStats = serde_json::from_value(response.body.clone()).unwrap();

    assert_eq!(stats.survey_id, survey.survey.id);
    assert_eq!(stats.total_respondents, 3);
    assert_eq!(stats.browsers.get("Firefox"), Some(&3));
    assert_eq!(stats.operating_systems.get("Windows"), Some(&3));

    let choice_stats = &stats.questions[0];
    assert_eq!(choice_stats.answers_count, 3);
    assert_eq!(choice_stats.response_rate, 100.0);
    let options = choice_stats.option_stats.as_ref().unwrap();
    assert_eq!(options.len(), 3);
    assert_eq!(options[1].option, "Green");
    assert_eq!(options[1].count, 2);
    assert_eq!(options[2].count, 0);
    assert_eq!(options[2].percentage, 0.0);

    let text_stats = stats.questions[1].text_stats.as_ref().unwrap();
    assert_eq!(stats.questions[1].answers_count, 2);
    assert_eq!(text_stats.avg_length, 3.0);
    assert_eq!(text_stats.responses, vec!["ab".to_string(), "abcd".to_string()]);

    let file_stats = stats.questions[2].file_stats.as_ref().unwrap();
    assert_eq!(file_stats.file_paths.len(), 1);
    assert_eq!(file_stats.file_types.get(".png"), Some(&1));
}

#[actix_rt::test]
async fn test_statistics_of_unanswered_survey() {
    let app = spawn_app().await;
    let author = app.create_user("author");
    let survey = app
        .create_survey(
            &author,
            Data::survey(
                "Quiet",
                vec![Data::choice_question("Pick", "multiple_choice", false, &["A", "B"])],
            ),
        )
        .await;

    let response = app
        .get(&format!("/api/surveys/{}/stats", survey.survey.id), Some(&author))
        .await;
    let stats: SurveyStats = serde_json::from_value(response.body.clone()).unwrap();

    assert_eq!(stats.total_respondents, 0);
    assert_eq!(stats.questions[0].response_rate, 0.0);
    let options = stats.questions[0].option_stats.as_ref().unwrap();
    assert!(options.iter().all(|o| o.count == 0 && o.percentage == 0.0));
}

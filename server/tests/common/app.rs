use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use shared_types::{SurveyDetail, User, UserInfo};
use survey_server::auth::{self, Claims, TokenType};
use survey_server::config::AppConfig;
use survey_server::database::Database;
use survey_server::handlers::AppState;
use survey_server::routes::{configure_routes, json_config};
use survey_server::submission::uploads::UploadStore;

use super::config::TestConfig;

/// An isolated application instance plus the initialized service to call
pub struct TestApp<S> {
    pub config: TestConfig,
    pub app_state: web::Data<AppState>,
    pub service: S,
}

/// A registered user together with a valid access token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user: User,
    pub token: String,
}

#[allow(dead_code)]
impl TestUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn info(&self) -> UserInfo {
        self.user.info()
    }

    /// Adds the `Authorization: Bearer` header for this user
    pub fn authorize(&self, req: test::TestRequest) -> test::TestRequest {
        req.insert_header((header::AUTHORIZATION, format!("Bearer {}", self.token)))
    }
}

/// Status and decoded JSON body of a response, or of a middleware error
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[allow(dead_code)]
impl TestResponse {
    fn new(status: StatusCode, bytes: &[u8]) -> Self {
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
        };
        Self { status, body }
    }

    pub fn json<T: DeserializeOwned>(&self, field: &str) -> T {
        serde_json::from_value(self.body[field].clone())
            .unwrap_or_else(|e| panic!("Failed to decode `{}` from {}: {}", field, self.body, e))
    }

    pub fn error_type(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Creates an isolated test application with default settings
pub async fn spawn_app() -> TestApp<impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>>
{
    spawn_app_with(|_| {}).await
}

/// Creates an isolated test application after adjusting its configuration
pub async fn spawn_app_with(
    customize: impl FnOnce(&mut AppConfig),
) -> TestApp<impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>> {
    let mut config = TestConfig::new();
    customize(&mut config.config);

    let database = Arc::new(
        Database::new(&config.config.database.path).expect("Failed to open test database"),
    );
    let uploads =
        Arc::new(UploadStore::new(&config.config.uploads).expect("Failed to create upload store"));
    let app_config = Arc::new(config.config.clone());

    let app_state = web::Data::new(AppState::new(database, uploads, app_config.clone()));

    let service = test::init_service(
        App::new()
            .app_data(app_state.clone())
            .app_data(json_config(&app_config))
            .configure(configure_routes),
    )
    .await;

    TestApp {
        config,
        app_state,
        service,
    }
}

#[allow(dead_code)]
impl<S> TestApp<S>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    pub fn db(&self) -> &Arc<Database> {
        &self.app_state.database
    }

    /// Sends a request, turning middleware errors into their HTTP rendering
    pub async fn send(&self, req: Request) -> TestResponse {
        match self.service.call(req).await {
            Ok(response) => {
                let status = response.status();
                let bytes = test::read_body(response).await;
                TestResponse::new(status, &bytes)
            }
            Err(err) => {
                let response = err.error_response();
                let status = response.status();
                let bytes = actix_web::body::to_bytes(response.into_body())
                    .await
                    .expect("Failed to read error body");
                TestResponse::new(status, &bytes)
            }
        }
    }

    /// Registers a user directly in the database and issues an access token.
    ///
    /// The first user created in an app becomes the administrator.
    pub fn create_user(&self, username: &str) -> TestUser {
        let password_hash = auth::hash_password("password123").expect("Failed to hash password");
        let user = self
            .db()
            .register_user(&User::new(
                username.to_string(),
                format!("{}@example.com", username),
                password_hash,
            ))
            .expect("Failed to register test user");

        let token = self.token_for(&user.info(), TokenType::Access);
        TestUser { user, token }
    }

    pub fn token_for(&self, user: &UserInfo, token_type: TokenType) -> String {
        let auth_config = &self.app_state.config.auth;
        auth::generate_token(
            &Claims::new(user, token_type, auth_config.access_token_ttl_secs),
            auth_config.secret(),
        )
        .expect("Failed to generate token")
    }

    /// Creates a survey over HTTP and returns its full definition
    pub async fn create_survey(&self, author: &TestUser, payload: Value) -> SurveyDetail {
        let req = author
            .authorize(test::TestRequest::post().uri("/api/surveys"))
            .set_json(payload)
            .to_request();

        let response = self.send(req).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "create survey failed: {}",
            response.body
        );
        response.json("survey")
    }

    /// Submits answers to a survey from the given source address
    pub async fn submit(
        &self,
        survey_id: i64,
        respondent: Option<&TestUser>,
        address: &str,
        body: Value,
    ) -> TestResponse {
        self.submit_with_headers(survey_id, respondent, address, &[], body)
            .await
    }

    /// Like `submit`, with extra request headers
    pub async fn submit_with_headers(
        &self,
        survey_id: i64,
        respondent: Option<&TestUser>,
        address: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> TestResponse {
        let mut req = test::TestRequest::post()
            .uri(&format!("/api/surveys/{}/responses", survey_id))
            .peer_addr(address.parse().expect("Invalid socket address"))
            .insert_header((header::USER_AGENT, super::fixtures::FIREFOX_WINDOWS))
            .insert_header((header::ACCEPT_LANGUAGE, "de-DE,de;q=0.9,en;q=0.8"))
            .set_json(body);
        for (name, value) in headers {
            req = req.insert_header((*name, *value));
        }
        if let Some(user) = respondent {
            req = user.authorize(req);
        }

        self.send(req.to_request()).await
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> TestResponse {
        let mut req = test::TestRequest::get().uri(uri);
        if let Some(user) = user {
            req = user.authorize(req);
        }
        self.send(req.to_request()).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&TestUser>) -> TestResponse {
        let mut req = test::TestRequest::delete().uri(uri);
        if let Some(user) = user {
            req = user.authorize(req);
        }
        self.send(req.to_request()).await
    }

    pub async fn put(&self, uri: &str, user: Option<&TestUser>, body: Value) -> TestResponse {
        let mut req = test::TestRequest::put().uri(uri).set_json(body);
        if let Some(user) = user {
            req = user.authorize(req);
        }
        self.send(req.to_request()).await
    }

    pub async fn post(&self, uri: &str, user: Option<&TestUser>, body: Value) -> TestResponse {
        let mut req = test::TestRequest::post().uri(uri).set_json(body);
        if let Some(user) = user {
            req = user.authorize(req);
        }
        self.send(req.to_request()).await
    }

    /// Number of answer rows stored for a survey
    pub fn answer_count(&self, survey_id: i64) -> usize {
        self.db()
            .list_survey_answers(survey_id)
            .expect("Failed to list answers")
            .len()
    }
}

use crate::error::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use shared_types::{
    Answer, CreateSurveyRequest, NewQuestion, Question, QuestionKind, QuestionOption,
    SelectedOption, Survey, SurveyDetail, UpdateSurveyRequest, UpdateUserRequest, User, UserInfo,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbConnection = Arc<Mutex<Connection>>;

pub struct Database {
    connection: DbConnection,
}

/// Request metadata shared by all answers of one submission
#[derive(Debug, Clone, Default)]
pub struct AnswerContext {
    pub ip_address: String,
    pub user_agent: String,
    pub browser: String,
    pub device_type: String,
    pub os: String,
    pub language: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewAnswer {
    pub question_id: i64,
    pub text_response: Option<String>,
    pub file_path: Option<String>,
    pub option_ids: Vec<i64>,
}

/// A validated submission ready to be written in one transaction
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub survey_id: i64,
    pub respondent_key: String,
    pub user_id: Option<i64>,
    pub context: AnswerContext,
    pub answers: Vec<NewAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseInsert {
    Inserted { response_id: i64, answer_ids: Vec<i64> },
    /// The respondent key was already used for this survey
    Duplicate,
}

/// An answer together with the survey it belongs to
#[derive(Debug, Clone)]
pub struct AnswerScope {
    pub answer: Answer,
    pub survey_id: i64,
    pub survey_author_id: i64,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, created_at";
const SURVEY_COLUMNS: &str =
    "id, title, description, author_id, created_at, is_active, require_login";
const QUESTION_COLUMNS: &str = "id, survey_id, position, kind, text, is_required, choice_limit";
const ANSWER_COLUMNS: &str = "a.id, a.response_id, a.user_id, a.question_id, a.text_response, \
     a.file_path, a.created_at, a.ip_address, a.user_agent, a.browser, a.device_type, a.os, \
     a.language, a.timezone";

impl Database {
    pub fn new(db_path: &Path) -> AppResult<Self> {
        // Ensure the database directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        // Enable foreign key constraints (SQLite3 has them disabled by default)
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let database = Database {
            connection: Arc::new(Mutex::new(conn)),
        };

        database.run_migrations()?;

        Ok(database)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))
    }

    fn run_migrations(&self) -> AppResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS surveys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                require_login INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                survey_id INTEGER NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                kind TEXT NOT NULL,
                text TEXT NOT NULL,
                is_required INTEGER NOT NULL DEFAULT 0,
                choice_limit INTEGER
            );

            CREATE TABLE IF NOT EXISTS options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                survey_id INTEGER NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
                respondent_key TEXT NOT NULL,
                user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                ip_address TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (survey_id, respondent_key)
            );

            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                response_id INTEGER NOT NULL REFERENCES responses(id) ON DELETE CASCADE,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                text_response TEXT,
                file_path TEXT,
                created_at INTEGER NOT NULL,
                ip_address TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                browser TEXT NOT NULL,
                device_type TEXT NOT NULL,
                os TEXT NOT NULL,
                language TEXT,
                timezone TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS answer_options (
                answer_id INTEGER NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
                option_id INTEGER NOT NULL REFERENCES options(id) ON DELETE CASCADE,
                PRIMARY KEY (answer_id, option_id)
            );

            CREATE INDEX IF NOT EXISTS idx_questions_survey ON questions(survey_id);
            CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id);
            CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id);
            CREATE INDEX IF NOT EXISTS idx_answers_response ON answers(response_id);
            CREATE INDEX IF NOT EXISTS idx_answers_user ON answers(user_id);
            CREATE INDEX IF NOT EXISTS idx_answers_file ON answers(file_path);",
        )?;

        tracing::debug!("Database migrations applied");
        Ok(())
    }

    // ============ Users ============

    /// Inserts a new user; the very first account becomes an administrator
    pub fn register_user(&self, user: &User) -> AppResult<User> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let is_admin = user.is_admin || existing == 0;

        tx.execute(
            "INSERT INTO users (username, email, password_hash, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.username,
                user.email,
                user.password_hash,
                is_admin,
                user.created_at
            ],
        )
        .map_err(|e| unique_conflict(e, "Username or email is already registered"))?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        if is_admin && existing == 0 {
            tracing::info!("Bootstrapped first user {} as administrator", user.username);
        }

        Ok(User {
            id,
            is_admin,
            ..user.clone()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> AppResult<User> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            row_to_user,
        )
        .map_err(|e| not_found(e, format!("User {id}")))
    }

    pub fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_all_users(&self) -> AppResult<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn update_user(&self, id: i64, update: &UpdateUserRequest) -> AppResult<User> {
        let mut user = self.get_user_by_id(id)?;
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }

        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET username = ?1, email = ?2, is_admin = ?3 WHERE id = ?4",
            params![user.username, user.email, user.is_admin, id],
        )
        .map_err(|e| unique_conflict(e, "Username or email is already registered"))?;

        tracing::info!("Updated user {} ({})", user.username, id);
        Ok(user)
    }

    pub fn delete_user(&self, id: i64) -> AppResult<()> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {id}")));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    // ============ Surveys ============

    pub fn create_survey(
        &self,
        author_id: i64,
        request: &CreateSurveyRequest,
    ) -> AppResult<SurveyDetail> {
        let survey_id = {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO surveys (title, description, author_id, created_at, is_active, require_login)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    request.title,
                    request.description,
                    author_id,
                    Utc::now().timestamp(),
                    request.is_active,
                    request.require_login
                ],
            )?;
            let survey_id = tx.last_insert_rowid();
            insert_questions(&tx, survey_id, &request.questions)?;
            tx.commit()?;
            survey_id
        };

        tracing::info!(
            "Created survey {} with {} question(s)",
            survey_id,
            request.questions.len()
        );
        self.get_survey_detail(survey_id)
    }

    pub fn get_survey(&self, id: i64) -> AppResult<Survey> {
        let conn = self.lock()?;
        load_survey(&conn, id)
    }

    pub fn get_survey_detail(&self, id: i64) -> AppResult<SurveyDetail> {
        let conn = self.lock()?;
        let survey = load_survey(&conn, id)?;
        let questions = load_questions(&conn, id)?;
        Ok(SurveyDetail { survey, questions })
    }

    /// Newest first; restricted to one author when given
    pub fn list_surveys(&self, author_id: Option<i64>) -> AppResult<Vec<Survey>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys
             WHERE ?1 IS NULL OR author_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let surveys = stmt
            .query_map([author_id], row_to_survey)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(surveys)
    }

    /// Applies a partial update; replacing questions also discards all collected responses
    pub fn update_survey(&self, id: i64, update: &UpdateSurveyRequest) -> AppResult<SurveyDetail> {
        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;

            let mut survey = load_survey(&tx, id)?;
            if let Some(title) = &update.title {
                survey.title = title.clone();
            }
            if let Some(description) = &update.description {
                survey.description = description.clone();
            }
            if let Some(is_active) = update.is_active {
                survey.is_active = is_active;
            }
            if let Some(require_login) = update.require_login {
                survey.require_login = require_login;
            }

            tx.execute(
                "UPDATE surveys SET title = ?1, description = ?2, is_active = ?3, require_login = ?4
                 WHERE id = ?5",
                params![
                    survey.title,
                    survey.description,
                    survey.is_active,
                    survey.require_login,
                    id
                ],
            )?;

            if let Some(questions) = &update.questions {
                tx.execute("DELETE FROM responses WHERE survey_id = ?1", [id])?;
                tx.execute("DELETE FROM questions WHERE survey_id = ?1", [id])?;
                insert_questions(&tx, id, questions)?;
                tracing::info!(
                    "Replaced questions of survey {} ({} new)",
                    id,
                    questions.len()
                );
            }

            tx.commit()?;
        }

        self.get_survey_detail(id)
    }

    pub fn delete_survey(&self, id: i64) -> AppResult<()> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM surveys WHERE id = ?1", [id])?;
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Survey {id}")));
        }
        tracing::info!("Deleted survey {}", id);
        Ok(())
    }

    pub fn get_question(&self, id: i64) -> AppResult<Question> {
        let conn = self.lock()?;
        let mut question = conn
            .query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
                [id],
                row_to_question,
            )
            .map_err(|e| not_found(e, format!("Question {id}")))?;
        question.options = load_options(&conn, id)?;
        Ok(question)
    }

    // ============ Responses ============

    pub fn has_response(&self, survey_id: i64, respondent_key: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM responses WHERE survey_id = ?1 AND respondent_key = ?2",
                params![survey_id, respondent_key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    /// Writes a response and all its answers atomically.
    ///
    /// A respondent key already used for the survey yields `Duplicate` and
    /// writes nothing. Any other failure rolls the transaction back and is
    /// reported as `StorageFailure`.
    pub fn insert_response(&self, response: &NewResponse) -> AppResult<ResponseInsert> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage_failure)?;
        let now = Utc::now().timestamp();

        match tx.execute(
            "INSERT INTO responses (survey_id, respondent_key, user_id, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                response.survey_id,
                response.respondent_key,
                response.user_id,
                response.context.ip_address,
                now
            ],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(ResponseInsert::Duplicate),
            Err(e) => return Err(storage_failure(e)),
        }
        let response_id = tx.last_insert_rowid();

        let ctx = &response.context;
        let mut answer_ids = Vec::with_capacity(response.answers.len());
        for answer in &response.answers {
            tx.execute(
                "INSERT INTO answers (response_id, question_id, user_id, text_response, file_path,
                    created_at, ip_address, user_agent, browser, device_type, os, language, timezone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    response_id,
                    answer.question_id,
                    response.user_id,
                    answer.text_response,
                    answer.file_path,
                    now,
                    ctx.ip_address,
                    ctx.user_agent,
                    ctx.browser,
                    ctx.device_type,
                    ctx.os,
                    ctx.language,
                    ctx.timezone
                ],
            )
            .map_err(storage_failure)?;
            let answer_id = tx.last_insert_rowid();

            insert_answer_options(&tx, answer_id, &answer.option_ids).map_err(storage_failure)?;
            answer_ids.push(answer_id);
        }

        tx.commit().map_err(storage_failure)?;

        Ok(ResponseInsert::Inserted {
            response_id,
            answer_ids,
        })
    }

    pub fn count_responses(&self, survey_id: i64) -> AppResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE survey_id = ?1",
            [survey_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ============ Answers ============

    pub fn get_answer_scope(&self, answer_id: i64) -> AppResult<AnswerScope> {
        let conn = self.lock()?;
        let mut scope = conn
            .query_row(
                &format!(
                    "SELECT {ANSWER_COLUMNS}, q.survey_id, s.author_id
                     FROM answers a
                     JOIN questions q ON q.id = a.question_id
                     JOIN surveys s ON s.id = q.survey_id
                     WHERE a.id = ?1"
                ),
                [answer_id],
                row_to_answer_scope,
            )
            .map_err(|e| not_found(e, format!("Answer {answer_id}")))?;
        scope.answer.selected_options = load_selected_options(&conn, answer_id)?;
        Ok(scope)
    }

    /// Every answer referencing a stored upload, oldest first
    pub fn find_answers_by_file(&self, stored_name: &str) -> AppResult<Vec<AnswerScope>> {
        let answer_ids: Vec<i64> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare("SELECT id FROM answers WHERE file_path = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map([stored_name], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        answer_ids
            .into_iter()
            .map(|id| self.get_answer_scope(id))
            .collect()
    }

    /// All answers to a survey's questions, grouped by response in question order
    pub fn list_survey_answers(&self, survey_id: i64) -> AppResult<Vec<Answer>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANSWER_COLUMNS}
             FROM answers a
             JOIN questions q ON q.id = a.question_id
             WHERE q.survey_id = ?1
             ORDER BY a.response_id, q.position, a.id"
        ))?;
        let mut answers = stmt
            .query_map([survey_id], row_to_answer)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_selected_options(&conn, &mut answers)?;
        Ok(answers)
    }

    /// Administrators see every answer; others see their own plus answers to surveys they authored
    pub fn list_visible_answers(&self, actor: &UserInfo) -> AppResult<Vec<Answer>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANSWER_COLUMNS}
             FROM answers a
             JOIN questions q ON q.id = a.question_id
             JOIN surveys s ON s.id = q.survey_id
             WHERE ?1 OR a.user_id = ?2 OR s.author_id = ?2
             ORDER BY a.id"
        ))?;
        let mut answers = stmt
            .query_map(params![actor.is_admin, actor.id], row_to_answer)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_selected_options(&conn, &mut answers)?;
        Ok(answers)
    }

    /// Replaces the text and/or the selected options of an answer
    pub fn update_answer(
        &self,
        answer_id: i64,
        text_response: Option<&str>,
        option_ids: Option<&[i64]>,
    ) -> AppResult<AnswerScope> {
        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;

            if let Some(text) = text_response {
                let rows = tx.execute(
                    "UPDATE answers SET text_response = ?1 WHERE id = ?2",
                    params![text, answer_id],
                )?;
                if rows == 0 {
                    return Err(AppError::NotFound(format!("Answer {answer_id}")));
                }
            }

            if let Some(option_ids) = option_ids {
                tx.execute("DELETE FROM answer_options WHERE answer_id = ?1", [answer_id])?;
                insert_answer_options(&tx, answer_id, option_ids)?;
            }

            tx.commit()?;
        }

        tracing::info!("Updated answer {}", answer_id);
        self.get_answer_scope(answer_id)
    }

    /// Deletes an answer; the response row goes with its last answer
    pub fn delete_answer(&self, answer_id: i64) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let response_id: i64 = tx
            .query_row(
                "SELECT response_id FROM answers WHERE id = ?1",
                [answer_id],
                |row| row.get(0),
            )
            .map_err(|e| not_found(e, format!("Answer {answer_id}")))?;

        tx.execute("DELETE FROM answers WHERE id = ?1", [answer_id])?;

        let remaining: i64 = tx.query_row(
            "SELECT COUNT(*) FROM answers WHERE response_id = ?1",
            [response_id],
            |row| row.get(0),
        )?;
        if remaining == 0 {
            tx.execute("DELETE FROM responses WHERE id = ?1", [response_id])?;
        }

        tx.commit()?;
        tracing::info!("Deleted answer {}", answer_id);
        Ok(())
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn unique_conflict(e: rusqlite::Error, message: &str) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(e)
    }
}

fn not_found(e: rusqlite::Error, what: String) -> AppError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(what),
        _ => AppError::Database(e),
    }
}

fn storage_failure(e: rusqlite::Error) -> AppError {
    tracing::error!("Submission rolled back: {}", e);
    AppError::StorageFailure(e.to_string())
}

fn insert_questions(tx: &Transaction, survey_id: i64, questions: &[NewQuestion]) -> AppResult<()> {
    for (position, question) in questions.iter().enumerate() {
        let choice_limit = match question.kind {
            QuestionKind::LimitedChoice => question.choice_limit,
            _ => None,
        };

        tx.execute(
            "INSERT INTO questions (survey_id, position, kind, text, is_required, choice_limit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                survey_id,
                position as i64,
                question.kind.as_str(),
                question.text,
                question.required,
                choice_limit
            ],
        )?;
        let question_id = tx.last_insert_rowid();

        for (option_position, text) in question.options.iter().enumerate() {
            tx.execute(
                "INSERT INTO options (question_id, position, text) VALUES (?1, ?2, ?3)",
                params![question_id, option_position as i64, text],
            )?;
        }
    }
    Ok(())
}

fn insert_answer_options(
    tx: &Transaction,
    answer_id: i64,
    option_ids: &[i64],
) -> rusqlite::Result<()> {
    for option_id in option_ids {
        tx.execute(
            "INSERT OR IGNORE INTO answer_options (answer_id, option_id) VALUES (?1, ?2)",
            params![answer_id, option_id],
        )?;
    }
    Ok(())
}

fn load_survey(conn: &Connection, id: i64) -> AppResult<Survey> {
    conn.query_row(
        &format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ?1"),
        [id],
        row_to_survey,
    )
    .map_err(|e| not_found(e, format!("Survey {id}")))
}

fn load_questions(conn: &Connection, survey_id: i64) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE survey_id = ?1 ORDER BY position, id"
    ))?;
    let mut questions = stmt
        .query_map([survey_id], row_to_question)?
        .collect::<Result<Vec<_>, _>>()?;

    for question in questions.iter_mut() {
        question.options = load_options(conn, question.id)?;
    }
    Ok(questions)
}

fn load_options(conn: &Connection, question_id: i64) -> AppResult<Vec<QuestionOption>> {
    let mut stmt = conn.prepare(
        "SELECT id, question_id, text FROM options WHERE question_id = ?1 ORDER BY position, id",
    )?;
    let options = stmt
        .query_map([question_id], |row| {
            Ok(QuestionOption {
                id: row.get(0)?,
                question_id: row.get(1)?,
                text: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(options)
}

fn load_selected_options(conn: &Connection, answer_id: i64) -> AppResult<Vec<SelectedOption>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.text FROM answer_options ao
         JOIN options o ON o.id = ao.option_id
         WHERE ao.answer_id = ?1
         ORDER BY o.position, o.id",
    )?;
    let options = stmt
        .query_map([answer_id], |row| {
            Ok(SelectedOption {
                id: row.get(0)?,
                text: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(options)
}

fn attach_selected_options(conn: &Connection, answers: &mut [Answer]) -> AppResult<()> {
    for answer in answers.iter_mut() {
        answer.selected_options = load_selected_options(conn, answer.id)?;
    }
    Ok(())
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_survey(row: &Row) -> rusqlite::Result<Survey> {
    Ok(Survey {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        created_at: row.get(4)?,
        is_active: row.get(5)?,
        require_login: row.get(6)?,
    })
}

fn row_to_question(row: &Row) -> rusqlite::Result<Question> {
    let kind: String = row.get(3)?;
    let kind = QuestionKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Unknown question kind: {kind}").into(),
        )
    })?;

    Ok(Question {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        position: row.get(2)?,
        kind,
        text: row.get(4)?,
        is_required: row.get(5)?,
        choice_limit: row.get(6)?,
        options: Vec::new(),
    })
}

fn row_to_answer(row: &Row) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: row.get(0)?,
        response_id: row.get(1)?,
        user_id: row.get(2)?,
        question_id: row.get(3)?,
        text_response: row.get(4)?,
        file_path: row.get(5)?,
        created_at: row.get(6)?,
        ip_address: row.get(7)?,
        user_agent: row.get(8)?,
        browser: row.get(9)?,
        device_type: row.get(10)?,
        os: row.get(11)?,
        language: row.get(12)?,
        timezone: row.get(13)?,
        selected_options: Vec::new(),
    })
}

fn row_to_answer_scope(row: &Row) -> rusqlite::Result<AnswerScope> {
    Ok(AnswerScope {
        answer: row_to_answer(row)?,
        survey_id: row.get(14)?,
        survey_author_id: row.get(15)?,
    })
}

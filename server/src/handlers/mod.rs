// Main handlers (system/health handlers)
pub mod main_handlers;
pub use main_handlers::AppState;

// Account and user management handlers
pub mod user_handlers;

// Survey authoring, submission and statistics handlers
pub mod survey_handlers;

// Stored answer handlers
pub mod answer_handlers;

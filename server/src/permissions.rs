//! Access control for surveys, answers and user management
//!
//! Decisions are made from the caller's identity and a small description of the
//! resource, so they can be evaluated without touching the database:
//! - Anyone may read a survey definition; creating one needs an identity
//! - The author of a survey, or an administrator, may edit, delete or view its statistics
//! - An answer is visible to its owner, the survey's author and administrators;
//!   only the owner or an administrator may change or delete it
//! - User management is reserved for administrators

use crate::error::{AppError, AppResult};
use shared_types::{Survey, UserInfo};

/// Operations that can be attempted on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    /// Submit a response to a survey
    Respond,
    Update,
    Delete,
    ViewStats,
    Manage,
}

/// What is being accessed, reduced to the facts the decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Survey {
        author_id: i64,
        require_login: bool,
    },
    /// A new survey that does not exist yet
    NewSurvey,
    Answer {
        owner_id: Option<i64>,
        survey_author_id: i64,
    },
    Users,
}

impl Resource {
    pub fn survey(survey: &Survey) -> Self {
        Resource::Survey {
            author_id: survey.author_id,
            require_login: survey.require_login,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Resource::Survey { .. } | Resource::NewSurvey => "survey",
            Resource::Answer { .. } => "answer",
            Resource::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Decide whether `actor` (None for anonymous callers) may perform `action` on `resource`
pub fn authorize(actor: Option<&UserInfo>, action: Action, resource: Resource) -> Decision {
    let is_admin = actor.is_some_and(|a| a.is_admin);
    let is = |user_id: i64| actor.is_some_and(|a| a.id == user_id);

    let allowed = match (resource, action) {
        (Resource::NewSurvey, Action::Create) => actor.is_some(),
        (Resource::NewSurvey, _) => false,

        (Resource::Survey { .. }, Action::Read) => true,
        (Resource::Survey { require_login, .. }, Action::Respond) => {
            !require_login || actor.is_some()
        }
        (
            Resource::Survey { author_id, .. },
            Action::Update | Action::Delete | Action::ViewStats,
        ) => is_admin || is(author_id),
        (Resource::Survey { .. }, Action::Create | Action::Manage) => is_admin,

        (
            Resource::Answer {
                owner_id,
                survey_author_id,
            },
            Action::Read,
        ) => is_admin || owner_id.is_some_and(is) || is(survey_author_id),
        (Resource::Answer { owner_id, .. }, Action::Update | Action::Delete) => {
            is_admin || owner_id.is_some_and(is)
        }
        (Resource::Answer { .. }, _) => is_admin,

        (Resource::Users, _) => is_admin,
    };

    Decision::from_bool(allowed)
}

/// Like [`authorize`], turning a denial into `AppError::AccessDenied`
pub fn ensure(actor: Option<&UserInfo>, action: Action, resource: Resource) -> AppResult<()> {
    match authorize(actor, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::debug!(
                "Denied {:?} on {} for {}",
                action,
                resource.name(),
                actor.map(|a| a.username.as_str()).unwrap_or("anonymous")
            );
            Err(AppError::AccessDenied(format!(
                "{:?} on {} is not permitted",
                action,
                resource.name()
            )))
        }
    }
}

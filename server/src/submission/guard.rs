use crate::config::DuplicatePolicy;
use shared_types::UserInfo;

/// Key identifying a respondent within one survey.
///
/// Stored with a uniqueness constraint per survey, so two submissions that
/// produce the same key can never both be accepted. Keys that must never
/// collide get a random suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespondentKey {
    User(i64),
    Address(String),
    Unique(String),
}

impl RespondentKey {
    pub fn for_request(
        policy: DuplicatePolicy,
        identity: Option<&UserInfo>,
        source_address: &str,
    ) -> Self {
        match (policy, identity) {
            (DuplicatePolicy::Disabled, _) => Self::unique(),
            (DuplicatePolicy::IdentityOrAddress | DuplicatePolicy::IdentityOnly, Some(user)) => {
                RespondentKey::User(user.id)
            }
            (DuplicatePolicy::IdentityOrAddress, None) => {
                RespondentKey::Address(source_address.to_string())
            }
            (DuplicatePolicy::IdentityOnly, None) => Self::unique(),
        }
    }

    fn unique() -> Self {
        RespondentKey::Unique(uuid::Uuid::new_v4().to_string())
    }

    /// Whether a previous response can block this one
    pub fn is_deduplicated(&self) -> bool {
        !matches!(self, RespondentKey::Unique(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RespondentKey::User(_) => "user",
            RespondentKey::Address(_) => "address",
            RespondentKey::Unique(_) => "anonymous",
        }
    }

    pub fn as_db_key(&self) -> String {
        match self {
            RespondentKey::User(id) => format!("user:{}", id),
            RespondentKey::Address(addr) => format!("addr:{}", addr),
            RespondentKey::Unique(id) => format!("anon:{}", id),
        }
    }
}

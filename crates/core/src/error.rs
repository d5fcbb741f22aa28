use crate::types::DbId;

/// Why a listing creation was rejected by the quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaRejection {
    /// No subscription, or the most recent one is not `active`.
    SubscriptionInactive,
    /// The dealer already holds `limit` non-archived listings.
    LimitReached { limit: i32 },
}

/// A failed call to the store, the billing gateway, or the NLP service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{backend} failure: {message}")]
pub struct UpstreamError {
    /// Which collaborator failed (e.g. `"store"`, `"billing"`, `"cache"`).
    pub backend: &'static str,
    pub message: String,
}

impl UpstreamError {
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new("store", message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new("cache", message)
    }

    pub fn billing(message: impl Into<String>) -> Self {
        Self::new("billing", message)
    }

    pub fn nlp(message: impl Into<String>) -> Self {
        Self::new("nlp", message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{}", quota_message(.0))]
    QuotaExceeded(QuotaRejection),

    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

fn quota_message(rejection: &QuotaRejection) -> String {
    match rejection {
        QuotaRejection::SubscriptionInactive => "Active subscription required".to_string(),
        QuotaRejection::LimitReached { limit } => {
            format!("Listing limit of {limit} reached for current plan")
        }
    }
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::QuotaExceeded(QuotaRejection::SubscriptionInactive) => "SUBSCRIPTION_INACTIVE",
            Self::QuotaExceeded(QuotaRejection::LimitReached { .. }) => "LISTING_LIMIT_REACHED",
            Self::Conflict { code, .. } => *code,
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_codes_are_distinct() {
        let inactive = CoreError::QuotaExceeded(QuotaRejection::SubscriptionInactive);
        let full = CoreError::QuotaExceeded(QuotaRejection::LimitReached { limit: 5 });
        assert_eq!(inactive.code(), "SUBSCRIPTION_INACTIVE");
        assert_eq!(full.code(), "LISTING_LIMIT_REACHED");
        assert_eq!(full.to_string(), "Listing limit of 5 reached for current plan");
    }

    #[test]
    fn upstream_keeps_backend_and_message() {
        let err: CoreError = UpstreamError::store("connection reset").into();
        assert_eq!(err.code(), "UPSTREAM_FAILURE");
        assert_eq!(err.to_string(), "store failure: connection reset");
    }

    #[test]
    fn conflict_exposes_its_own_code() {
        let err = CoreError::Conflict {
            code: "SUBSCRIPTION_EXISTS",
            message: "User already has an active subscription".into(),
        };
        assert_eq!(err.code(), "SUBSCRIPTION_EXISTS");
    }
}

//! Role-based access control (RBAC) extractors.
//!
//! Wraps [`AuthUser`] and rejects requests whose role does not meet the
//! requirement, so authorization is enforced at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use estate_core::error::CoreError;
use estate_core::roles::UserRole;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `dealer` role. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn dealer_only(RequireDealer(dealer): RequireDealer) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireDealer(pub AuthUser);

impl FromRequestParts<AppState> for RequireDealer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Dealer {
            return Err(AppError::Core(CoreError::AccessDenied(
                "Dealer role required".into(),
            )));
        }
        Ok(RequireDealer(user))
    }
}

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::db;
use crate::models::User;

use super::error::ApiError;
use super::AppState;

/// The acting user, taken from the `x-user-id` header and resolved against
/// the users table. Authentication itself lives outside this service; the
/// header carries the already-established identity, and the row supplies
/// the tenant scope for every owner-filtered query.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
}

impl Actor {
    /// Row-isolation key: owner-scoped entities are filtered by the id of
    /// the user who created them.
    pub fn owner_id(&self) -> Uuid {
        self.user.id
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.user.company_id
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or(ApiError::MissingActor)?;
        let raw = header
            .to_str()
            .map_err(|_| ApiError::Validation("x-user-id is not valid text".to_string()))?;
        let id: Uuid = raw
            .parse()
            .map_err(|_| ApiError::Validation("x-user-id is not a UUID".to_string()))?;

        let user = db::people::get_user(&state.pool, id)
            .await?
            .ok_or(ApiError::UnknownActor)?;
        Ok(Actor { user })
    }
}

//! Read-side user listing for administrators

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DomainError, DomainResult, User, UserRepository, UserRole};
use crate::shared::{PageRequest, PaginatedResult};

/// User as shown to administrators; never carries the password hash
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub roles: Vec<UserRole>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles,
        }
    }
}

pub struct UserDirectoryService {
    users: Arc<dyn UserRepository>,
}

impl UserDirectoryService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// All users by id, or the single user matching `email` exactly.
    ///
    /// An email that matches nobody is `NotFound`, not an empty page.
    pub async fn list_users(
        &self,
        email: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<UserView>> {
        if let Some(email) = email {
            if !self.users.exists_by_email(email).await? {
                return Err(DomainError::user_not_found());
            }
        }

        let users = self.users.list(email, page).await?;
        Ok(users.map(UserView::from))
    }
}

use async_trait::async_trait;

use super::model::{NewUser, User};
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> DomainResult<User>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> DomainResult<bool>;

    /// Users ordered by id; `email` restricts to an exact match.
    async fn list(
        &self,
        email: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<User>>;

    async fn count(&self) -> DomainResult<u64>;
}

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::domain::{DomainError, DomainResult, NewUser, User, UserRepository, UserRole};
use crate::infrastructure::database::entities::user;
use crate::shared::{PageRequest, PaginatedResult};

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn encode_roles(roles: &[UserRole]) -> DomainResult<String> {
    serde_json::to_string(roles).map_err(|e| DomainError::Storage(format!("roles: {}", e)))
}

pub(super) fn decode_roles(raw: &str) -> DomainResult<Vec<UserRole>> {
    serde_json::from_str(raw).map_err(|e| DomainError::Storage(format!("roles: {}", e)))
}

fn user_model_to_domain(model: user::Model) -> DomainResult<User> {
    Ok(User {
        id: model.id,
        roles: decode_roles(&model.roles)?,
        email: model.email,
        password_hash: model.password_hash,
    })
}

pub(super) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn insert(&self, new_user: NewUser) -> DomainResult<User> {
        let email = new_user.email.clone();
        let model = user::ActiveModel {
            id: NotSet,
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            roles: Set(encode_roles(&new_user.roles)?),
        };

        let saved = model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                DomainError::Conflict(format!("email {} is already taken", email))
            } else {
                db_err(e)
            }
        })?;

        user_model_to_domain(saved)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(user_model_to_domain)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(user_model_to_domain)
            .transpose()
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn list(
        &self,
        email: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<User>> {
        let mut query = user::Entity::find().order_by_asc(user::Column::Id);
        if let Some(email) = email {
            query = query.filter(user::Column::Email.eq(email));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let models = query
            .offset(page.offset())
            .limit(page.page_size as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models
            .into_iter()
            .map(user_model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, page.page, page.page_size))
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}

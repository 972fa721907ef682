//! SeaORM implementation of CardRepository

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use super::user_repository::db_err;
use crate::domain::{
    from_minor_units, to_minor_units, Card, CardFilter, CardOwner, CardRepository, CardStatus,
    DomainError, DomainResult, NewCard, TransferUnit,
};
use crate::infrastructure::database::entities::{card, user};
use crate::shared::{PageRequest, PaginatedResult};

pub struct SeaOrmCardRepository {
    db: DatabaseConnection,
}

impl SeaOrmCardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(status: card::CardStatus) -> CardStatus {
    match status {
        card::CardStatus::Active => CardStatus::Active,
        card::CardStatus::Blocked => CardStatus::Blocked,
    }
}

fn status_to_entity(status: CardStatus) -> card::CardStatus {
    match status {
        CardStatus::Active => card::CardStatus::Active,
        CardStatus::Blocked => card::CardStatus::Blocked,
    }
}

fn balance_to_cents(balance: Decimal) -> DomainResult<i64> {
    to_minor_units(balance).ok_or_else(|| {
        DomainError::Validation(format!("balance {} cannot be stored exactly", balance))
    })
}

fn card_model_to_domain(model: card::Model, owner: Option<user::Model>) -> DomainResult<Card> {
    let owner = owner.ok_or_else(|| {
        DomainError::Storage(format!("card {} references missing user {}", model.id, model.user_id))
    })?;

    Ok(Card {
        id: model.id,
        card_number_ciphertext: model.card_number,
        owner: CardOwner {
            id: owner.id,
            email: owner.email,
        },
        expiration_date: model.expiration_date,
        status: status_to_domain(model.status),
        balance: from_minor_units(model.balance_cents),
    })
}

fn filter_condition(filter: &CardFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(owner_id) = filter.owner_id {
        cond = cond.add(card::Column::UserId.eq(owner_id));
    }
    if let Some(status) = filter.status {
        cond = cond.add(card::Column::Status.eq(status_to_entity(status)));
    }
    cond
}

/// `SELECT ... FOR UPDATE` on the card row, then load its owner.
///
/// The owner is fetched separately: Postgres refuses row locks on the
/// nullable side of an outer join.
async fn lock_card(
    txn: &DatabaseTransaction,
    id: i64,
    entity: &'static str,
) -> DomainResult<Card> {
    let row = card::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(DomainError::NotFound { entity })?;

    let owner = user::Entity::find_by_id(row.user_id)
        .one(txn)
        .await
        .map_err(db_err)?;

    card_model_to_domain(row, owner)
}

async fn write_balance(txn: &DatabaseTransaction, id: i64, balance: Decimal) -> DomainResult<()> {
    let cents = balance_to_cents(balance)?;
    let result = card::Entity::update_many()
        .col_expr(card::Column::BalanceCents, Expr::value(cents))
        .filter(card::Column::Id.eq(id))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected != 1 {
        return Err(DomainError::Storage(format!("card {} vanished during transfer", id)));
    }
    Ok(())
}

// ── Transfer unit ───────────────────────────────────────────────

struct SeaOrmTransferUnit {
    txn: DatabaseTransaction,
    source: Card,
    target: Card,
}

#[async_trait]
impl TransferUnit for SeaOrmTransferUnit {
    fn source(&self) -> &Card {
        &self.source
    }

    fn target(&self) -> &Card {
        &self.target
    }

    async fn commit(
        self: Box<Self>,
        source_balance: Decimal,
        target_balance: Decimal,
    ) -> DomainResult<()> {
        write_balance(&self.txn, self.source.id, source_balance).await?;
        write_balance(&self.txn, self.target.id, target_balance).await?;
        self.txn.commit().await.map_err(db_err)
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl CardRepository for SeaOrmCardRepository {
    async fn insert(&self, new_card: NewCard) -> DomainResult<Card> {
        let balance_cents = balance_to_cents(new_card.balance)?;
        let owner = user::Entity::find_by_id(new_card.owner_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(DomainError::user_not_found)?;

        let model = card::ActiveModel {
            id: NotSet,
            card_number: Set(new_card.card_number_ciphertext),
            user_id: Set(owner.id),
            expiration_date: Set(new_card.expiration_date),
            status: Set(status_to_entity(new_card.status)),
            balance_cents: Set(balance_cents),
        };

        let saved = model.insert(&self.db).await.map_err(db_err)?;
        card_model_to_domain(saved, Some(owner))
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Card>> {
        card::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(|(card, owner)| card_model_to_domain(card, owner))
            .transpose()
    }

    async fn list(
        &self,
        filter: CardFilter,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Card>> {
        let cond = filter_condition(&filter);

        let total = card::Entity::find()
            .filter(cond.clone())
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let rows = card::Entity::find()
            .filter(cond)
            .order_by_asc(card::Column::Id)
            .find_also_related(user::Entity)
            .offset(page.offset())
            .limit(page.page_size as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = rows
            .into_iter()
            .map(|(card, owner)| card_model_to_domain(card, owner))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, page.page, page.page_size))
    }

    async fn update_status(&self, id: i64, status: CardStatus) -> DomainResult<bool> {
        let result = card::Entity::update_many()
            .col_expr(card::Column::Status, Expr::value(status_to_entity(status)))
            .filter(card::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let result = card::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn begin_transfer(
        &self,
        source_id: i64,
        target_id: i64,
    ) -> DomainResult<Box<dyn TransferUnit>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Lower id first so two opposite transfers cannot deadlock.
        let (source, target) = if source_id <= target_id {
            let source = lock_card(&txn, source_id, "source card").await?;
            let target = if target_id == source_id {
                source.clone()
            } else {
                lock_card(&txn, target_id, "target card").await?
            };
            (source, target)
        } else {
            let target = lock_card(&txn, target_id, "target card").await?;
            let source = lock_card(&txn, source_id, "source card").await?;
            (source, target)
        };

        Ok(Box::new(SeaOrmTransferUnit {
            txn,
            source,
            target,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::domain::{NewUser, UserRepository, UserRole};
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::SeaOrmUserRepository;

    async fn setup() -> (SeaOrmUserRepository, SeaOrmCardRepository) {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        (
            SeaOrmUserRepository::new(db.clone()),
            SeaOrmCardRepository::new(db),
        )
    }

    async fn owner(users: &SeaOrmUserRepository, email: &str) -> i64 {
        users
            .insert(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
                roles: vec![UserRole::User],
            })
            .await
            .unwrap()
            .id
    }

    fn new_card(owner_id: i64, balance: i64) -> NewCard {
        NewCard {
            card_number_ciphertext: "ciphertext".into(),
            owner_id,
            expiration_date: NaiveDate::from_ymd_opt(2031, 6, 30).unwrap(),
            status: CardStatus::Active,
            balance: Decimal::from(balance),
        }
    }

    #[tokio::test]
    async fn insert_and_find_joins_owner() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;

        let card = cards.insert(new_card(owner_id, 150)).await.unwrap();
        let found = cards.find_by_id(card.id).await.unwrap().unwrap();

        assert_eq!(found.owner.email, "anna@example.com");
        assert_eq!(found.balance, Decimal::from(150));
        assert_eq!(found.status, CardStatus::Active);
        assert_eq!(found.card_number_ciphertext, "ciphertext");
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let (users, _) = setup().await;
        owner(&users, "dup@example.com").await;
        let err = users
            .insert(NewUser {
                email: "dup@example.com".into(),
                password_hash: "hash".into(),
                roles: vec![UserRole::User],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn transfer_unit_commits_both_rows() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;
        let a = cards.insert(new_card(owner_id, 150)).await.unwrap();
        let b = cards.insert(new_card(owner_id, 50)).await.unwrap();

        let unit = cards.begin_transfer(b.id, a.id).await.unwrap();
        assert_eq!(unit.source().id, b.id);
        assert_eq!(unit.target().id, a.id);
        unit.commit(Decimal::from(0), Decimal::from(200)).await.unwrap();

        assert_eq!(cards.find_by_id(a.id).await.unwrap().unwrap().balance, Decimal::from(200));
        assert_eq!(cards.find_by_id(b.id).await.unwrap().unwrap().balance, Decimal::from(0));
    }

    #[tokio::test]
    async fn dropped_transfer_unit_rolls_back() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;
        let a = cards.insert(new_card(owner_id, 10)).await.unwrap();

        let err = cards.begin_transfer(a.id, a.id + 100).await.err().unwrap();
        assert!(matches!(err, DomainError::NotFound { entity: "target card" }));

        // The failed unit released its connection; the pool is usable again.
        assert!(cards.find_by_id(a.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn status_update_and_delete() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;
        let a = cards.insert(new_card(owner_id, 10)).await.unwrap();

        assert!(cards.update_status(a.id, CardStatus::Blocked).await.unwrap());
        let blocked = cards
            .list(
                CardFilter {
                    owner_id: Some(owner_id),
                    status: Some(CardStatus::Blocked),
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        assert_eq!(blocked.total, 1);
        assert_eq!(blocked.items[0].balance, Decimal::from(10));

        assert!(cards.delete(a.id).await.unwrap());
        assert!(!cards.delete(a.id).await.unwrap());
        assert!(!cards.update_status(a.id, CardStatus::Active).await.unwrap());
    }

    #[tokio::test]
    async fn migrations_apply_and_revert_on_sqlite() {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        Migrator::down(&db, None).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let rows = db
            .query_all(Statement::from_string(
                db.get_database_backend(),
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'cards')"
                    .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn large_balance_round_trips_exactly() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;
        let big = Decimal::from_str("12345678901234567.89").unwrap();

        let mut input = new_card(owner_id, 0);
        input.balance = big;
        let card = cards.insert(input).await.unwrap();
        assert_eq!(card.balance, big);

        let found = cards.find_by_id(card.id).await.unwrap().unwrap();
        assert_eq!(found.balance, big);
        assert_eq!(found.balance.to_string(), "12345678901234567.89");
    }

    #[tokio::test]
    async fn sub_cent_balances_are_refused() {
        let (users, cards) = setup().await;
        let owner_id = owner(&users, "anna@example.com").await;

        let mut input = new_card(owner_id, 0);
        input.balance = Decimal::new(1005, 3);
        let err = cards.insert(input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let a = cards.insert(new_card(owner_id, 10)).await.unwrap();
        let b = cards.insert(new_card(owner_id, 0)).await.unwrap();
        let unit = cards.begin_transfer(a.id, b.id).await.unwrap();
        let err = unit
            .commit(Decimal::new(9995, 3), Decimal::new(5, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert_eq!(cards.find_by_id(a.id).await.unwrap().unwrap().balance, Decimal::from(10));
        assert_eq!(cards.find_by_id(b.id).await.unwrap().unwrap().balance, Decimal::ZERO);
    }

    /// Row locks need a real server; set `CARDBANK_TEST_POSTGRES_URL` to run.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn postgres_row_locks_serialize_transfers() {
        let Ok(url) = std::env::var("CARDBANK_TEST_POSTGRES_URL") else {
            return;
        };
        let db = Database::connect(url).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let users = SeaOrmUserRepository::new(db.clone());
        let cards = Arc::new(SeaOrmCardRepository::new(db));

        let email = format!("locks-{}@example.com", uuid::Uuid::new_v4());
        let owner_id = owner(&users, &email).await;
        let a = cards.insert(new_card(owner_id, 100)).await.unwrap();
        let b = cards.insert(new_card(owner_id, 0)).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let cards = cards.clone();
            let (from, to) = if i % 4 == 3 { (b.id, a.id) } else { (a.id, b.id) };
            tasks.push(tokio::spawn(async move {
                let unit = cards.begin_transfer(from, to).await?;
                let (source, target) = (unit.source().balance, unit.target().balance);
                if source < Decimal::from(10) {
                    return Ok(());
                }
                unit.commit(source - Decimal::from(10), target + Decimal::from(10))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let ba = cards.find_by_id(a.id).await.unwrap().unwrap().balance;
        let bb = cards.find_by_id(b.id).await.unwrap().unwrap().balance;
        assert!(ba >= Decimal::ZERO && bb >= Decimal::ZERO);
        assert_eq!(ba + bb, Decimal::from(100));
    }
}

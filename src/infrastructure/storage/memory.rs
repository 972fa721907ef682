//! In-memory repositories for development and testing

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    Card, CardFilter, CardOwner, CardRepository, CardStatus, DomainError, DomainResult, NewCard,
    NewUser, TransferUnit, User, UserRepository,
};
use crate::shared::{PageRequest, PaginatedResult};

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> PaginatedResult<T> {
    let total = items.len() as u64;
    let start = (page.offset() as usize).min(items.len());
    let end = start.saturating_add(page.page_size as usize).min(items.len());
    let items: Vec<T> = items.drain(start..end).collect();
    PaginatedResult::new(items, total, page.page, page.page_size)
}

// ── Users ───────────────────────────────────────────────────────

/// In-memory user store
pub struct InMemoryUserRepository {
    users: DashMap<i64, User>,
    /// email -> id, the unique index
    emails: DashMap<String, i64>,
    id_counter: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            id_counter: AtomicI64::new(1),
        }
    }

    fn get(&self, id: i64) -> Option<User> {
        self.users.get(&id).map(|u| u.value().clone())
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, new_user: NewUser) -> DomainResult<User> {
        let id = match self.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!(
                    "email {} is already taken",
                    new_user.email
                )))
            }
            Entry::Vacant(slot) => {
                let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
                slot.insert(id);
                id
            }
        };

        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            roles: new_user.roles,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let id = self.emails.get(email).map(|e| *e.value());
        Ok(id.and_then(|id| self.get(id)))
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        Ok(self.emails.contains_key(email))
    }

    async fn list(
        &self,
        email: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| email.map_or(true, |e| u.email == e))
            .map(|u| u.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(paginate(users, page))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }
}

// ── Cards ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CardRecord {
    card_number_ciphertext: String,
    owner_id: i64,
    expiration_date: NaiveDate,
    status: CardStatus,
    balance: Decimal,
}

/// In-memory card store.
///
/// Each card has an async mutex standing in for a row lock. Transfers and
/// deletes take it; status updates and reads do not.
pub struct InMemoryCardRepository {
    users: Arc<InMemoryUserRepository>,
    cards: Arc<DashMap<i64, CardRecord>>,
    row_locks: DashMap<i64, Arc<Mutex<()>>>,
    id_counter: AtomicI64,
}

impl InMemoryCardRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            cards: Arc::new(DashMap::new()),
            row_locks: DashMap::new(),
            id_counter: AtomicI64::new(1),
        }
    }

    fn row_lock(&self, id: i64) -> Arc<Mutex<()>> {
        self.row_locks.entry(id).or_default().value().clone()
    }

    fn hydrate(&self, id: i64, record: &CardRecord) -> DomainResult<Card> {
        let owner = self.users.get(record.owner_id).ok_or_else(|| {
            DomainError::Storage(format!("card {} references missing user {}", id, record.owner_id))
        })?;

        Ok(Card {
            id,
            card_number_ciphertext: record.card_number_ciphertext.clone(),
            owner: CardOwner {
                id: owner.id,
                email: owner.email,
            },
            expiration_date: record.expiration_date,
            status: record.status,
            balance: record.balance,
        })
    }

    fn snapshot(&self, id: i64) -> Option<CardRecord> {
        self.cards.get(&id).map(|r| r.value().clone())
    }

    fn locked_card(&self, id: i64, entity: &'static str) -> DomainResult<Card> {
        let record = self.snapshot(id).ok_or(DomainError::NotFound { entity })?;
        self.hydrate(id, &record)
    }
}

struct InMemoryTransferUnit {
    cards: Arc<DashMap<i64, CardRecord>>,
    source: Card,
    target: Card,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl InMemoryTransferUnit {
    fn write_balance(&self, id: i64, balance: Decimal) -> DomainResult<()> {
        let mut record = self
            .cards
            .get_mut(&id)
            .ok_or_else(|| DomainError::Storage(format!("card {} vanished during transfer", id)))?;
        record.balance = balance;
        Ok(())
    }
}

#[async_trait]
impl TransferUnit for InMemoryTransferUnit {
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
        // Both rows are locked and deletes wait on the same locks, so both exist.
        self.write_balance(self.source.id, source_balance)?;
        self.write_balance(self.target.id, target_balance)?;
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn insert(&self, new_card: NewCard) -> DomainResult<Card> {
        if self.users.get(new_card.owner_id).is_none() {
            return Err(DomainError::user_not_found());
        }

        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let record = CardRecord {
            card_number_ciphertext: new_card.card_number_ciphertext,
            owner_id: new_card.owner_id,
            expiration_date: new_card.expiration_date,
            status: new_card.status,
            balance: new_card.balance,
        };
        let card = self.hydrate(id, &record)?;
        self.cards.insert(id, record);
        Ok(card)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Card>> {
        self.snapshot(id)
            .map(|record| self.hydrate(id, &record))
            .transpose()
    }

    async fn list(
        &self,
        filter: CardFilter,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Card>> {
        let mut matching: Vec<(i64, CardRecord)> = self
            .cards
            .iter()
            .filter(|r| filter.owner_id.map_or(true, |owner| r.owner_id == owner))
            .filter(|r| filter.status.map_or(true, |status| r.status == status))
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        matching.sort_by_key(|(id, _)| *id);

        paginate(matching, page).try_map(|(id, record)| self.hydrate(id, &record))
    }

    async fn update_status(&self, id: i64, status: CardStatus) -> DomainResult<bool> {
        match self.cards.get_mut(&id) {
            Some(mut record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let lock = self.row_lock(id);
        let _guard = lock.lock().await;
        let removed = self.cards.remove(&id).is_some();
        self.row_locks.remove(&id);
        Ok(removed)
    }

    async fn begin_transfer(
        &self,
        source_id: i64,
        target_id: i64,
    ) -> DomainResult<Box<dyn TransferUnit>> {
        let mut ids = vec![source_id, target_id];
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.row_lock(id).lock_owned().await);
        }

        let source = self.locked_card(source_id, "source card")?;
        let target = self.locked_card(target_id, "target card")?;

        Ok(Box::new(InMemoryTransferUnit {
            cards: self.cards.clone(),
            source,
            target,
            _guards: guards,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    async fn seed() -> (Arc<InMemoryUserRepository>, InMemoryCardRepository, User) {
        let users = Arc::new(InMemoryUserRepository::new());
        let owner = users
            .insert(NewUser {
                email: "owner@example.com".into(),
                password_hash: "x".into(),
                roles: vec![UserRole::User],
            })
            .await
            .unwrap();
        let cards = InMemoryCardRepository::new(users.clone());
        (users, cards, owner)
    }

    fn new_card(owner_id: i64, status: CardStatus, balance: i64) -> NewCard {
        NewCard {
            card_number_ciphertext: "cipher".into(),
            owner_id,
            expiration_date: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            status,
            balance: Decimal::from(balance),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (users, _, _) = seed().await;
        let err = users
            .insert(NewUser {
                email: "owner@example.com".into(),
                password_hash: "y".into(),
                roles: vec![UserRole::User],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_id() {
        let (users, cards, owner) = seed().await;
        let other = users
            .insert(NewUser {
                email: "other@example.com".into(),
                password_hash: "x".into(),
                roles: vec![UserRole::User],
            })
            .await
            .unwrap();

        for status in [CardStatus::Active, CardStatus::Blocked, CardStatus::Active] {
            cards.insert(new_card(owner.id, status, 10)).await.unwrap();
        }
        cards.insert(new_card(other.id, CardStatus::Active, 10)).await.unwrap();

        let page = cards
            .list(
                CardFilter {
                    owner_id: Some(owner.id),
                    status: Some(CardStatus::Active),
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        let ids: Vec<i64> = page.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|c| c.owner.email == "owner@example.com"));

        let second = cards
            .list(CardFilter::default(), PageRequest::new(2, 3))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.total, 4);
        assert_eq!(second.total_pages, 2);
    }

    #[tokio::test]
    async fn dropped_transfer_unit_changes_nothing() {
        let (_, cards, owner) = seed().await;
        let a = cards.insert(new_card(owner.id, CardStatus::Active, 100)).await.unwrap();
        let b = cards.insert(new_card(owner.id, CardStatus::Active, 0)).await.unwrap();

        {
            let unit = cards.begin_transfer(a.id, b.id).await.unwrap();
            assert_eq!(unit.source().balance, Decimal::from(100));
        }

        assert_eq!(cards.find_by_id(a.id).await.unwrap().unwrap().balance, Decimal::from(100));

        let unit = cards.begin_transfer(a.id, b.id).await.unwrap();
        unit.commit(Decimal::from(60), Decimal::from(40)).await.unwrap();
        assert_eq!(cards.find_by_id(b.id).await.unwrap().unwrap().balance, Decimal::from(40));
    }

    #[tokio::test]
    async fn missing_cards_are_named() {
        let (_, cards, owner) = seed().await;
        let a = cards.insert(new_card(owner.id, CardStatus::Active, 1)).await.unwrap();

        let err = cards.begin_transfer(a.id, 99).await.err().unwrap();
        assert!(matches!(err, DomainError::NotFound { entity: "target card" }));
        let err = cards.begin_transfer(98, a.id).await.err().unwrap();
        assert!(matches!(err, DomainError::NotFound { entity: "source card" }));
    }

    #[tokio::test]
    async fn status_update_keeps_balance() {
        let (_, cards, owner) = seed().await;
        let a = cards.insert(new_card(owner.id, CardStatus::Active, 100)).await.unwrap();
        let b = cards.insert(new_card(owner.id, CardStatus::Active, 0)).await.unwrap();

        let unit = cards.begin_transfer(a.id, b.id).await.unwrap();
        assert!(cards.update_status(a.id, CardStatus::Blocked).await.unwrap());
        unit.commit(Decimal::from(30), Decimal::from(70)).await.unwrap();

        let a = cards.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a.status, CardStatus::Blocked);
        assert_eq!(a.balance, Decimal::from(30));
    }

    #[tokio::test]
    async fn delete_reports_missing_card() {
        let (_, cards, owner) = seed().await;
        let a = cards.insert(new_card(owner.id, CardStatus::Active, 1)).await.unwrap();
        assert!(cards.delete(a.id).await.unwrap());
        assert!(!cards.delete(a.id).await.unwrap());
        assert!(cards.find_by_id(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_requires_existing_owner() {
        let (_, cards, _) = seed().await;
        let err = cards.insert(new_card(42, CardStatus::Active, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "user" }));
    }
}

//! Card account service: the core of the bank
//!
//! Every read path projects cards through [`CardView::project`], so card
//! numbers leave this module masked. Transfers run inside a repository
//! transfer unit that holds both rows locked until commit.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::views::{BalanceView, CardView};
use crate::domain::{
    to_minor_units, Card, CardFilter, CardRepository, CardStatus, DomainError, DomainResult,
    NewCard, User, UserRepository, MONEY_SCALE,
};
use crate::infrastructure::crypto::CardNumberCodec;
use crate::shared::{is_valid_card_number, PageRequest, PaginatedResult};

/// Input for [`CardAccountService::create_card`]
#[derive(Debug, Clone)]
pub struct CreateCard {
    pub owner_email: String,
    /// Plaintext; encrypted before it reaches the repository
    pub card_number: String,
    pub expiration_date: NaiveDate,
    pub status: CardStatus,
    pub balance: Decimal,
}

fn check_money(value: Decimal, what: &str) -> DomainResult<()> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(DomainError::Validation(format!(
            "{} must have at most {} decimal places",
            what, MONEY_SCALE
        )));
    }
    if to_minor_units(value).is_none() {
        return Err(DomainError::Validation(format!("{} is out of range", what)));
    }
    Ok(())
}

fn record_transfer(outcome: &'static str) {
    metrics::counter!("card_transfers_total", "outcome" => outcome).increment(1);
}

pub struct CardAccountService {
    cards: Arc<dyn CardRepository>,
    users: Arc<dyn UserRepository>,
    codec: CardNumberCodec,
}

impl CardAccountService {
    pub fn new(
        cards: Arc<dyn CardRepository>,
        users: Arc<dyn UserRepository>,
        codec: CardNumberCodec,
    ) -> Self {
        Self {
            cards,
            users,
            codec,
        }
    }

    async fn resolve_user(&self, email: &str) -> DomainResult<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(DomainError::user_not_found)
    }

    async fn load_card(&self, id: i64) -> DomainResult<Card> {
        self.cards
            .find_by_id(id)
            .await?
            .ok_or_else(DomainError::card_not_found)
    }

    /// Load a card the user must own.
    async fn load_owned_card(&self, user: &User, card_id: i64) -> DomainResult<Card> {
        let card = self.load_card(card_id).await?;
        if !card.is_owned_by(user.id) {
            warn!(user_id = user.id, card_id, "Access to foreign card refused");
            return Err(DomainError::Unauthorized);
        }
        Ok(card)
    }

    fn project_page(&self, page: PaginatedResult<Card>) -> DomainResult<PaginatedResult<CardView>> {
        page.try_map(|card| CardView::project(card, &self.codec))
    }

    // ── Administration ──────────────────────────────────────────

    pub async fn create_card(&self, input: CreateCard) -> DomainResult<CardView> {
        if !is_valid_card_number(&input.card_number) {
            return Err(DomainError::Validation(
                "card number must be 16 to 19 digits".into(),
            ));
        }
        if input.balance < Decimal::ZERO {
            return Err(DomainError::Validation("balance must not be negative".into()));
        }
        check_money(input.balance, "balance")?;
        let mut balance = input.balance;
        balance.rescale(MONEY_SCALE);

        let owner = self.resolve_user(&input.owner_email).await?;
        let card_number_ciphertext = self.codec.encode(&input.card_number)?;

        let card = self
            .cards
            .insert(NewCard {
                card_number_ciphertext,
                owner_id: owner.id,
                expiration_date: input.expiration_date,
                status: input.status,
                balance,
            })
            .await?;

        metrics::counter!("cards_created_total").increment(1);
        info!(card_id = card.id, user_id = owner.id, status = %card.status, "Card created");
        CardView::project(card, &self.codec)
    }

    /// Admin listing: optional owner and status filters, combined.
    pub async fn list_cards(
        &self,
        owner_email: Option<&str>,
        status: Option<CardStatus>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<CardView>> {
        let owner_id = match owner_email {
            Some(email) => Some(self.resolve_user(email).await?.id),
            None => None,
        };

        let cards = self
            .cards
            .list(CardFilter { owner_id, status }, page)
            .await?;
        self.project_page(cards)
    }

    /// Set a card's status; administrators may move it either way.
    pub async fn change_status(&self, card_id: i64, status: CardStatus) -> DomainResult<()> {
        if !self.cards.update_status(card_id, status).await? {
            return Err(DomainError::card_not_found());
        }

        metrics::counter!("card_status_changes_total", "status" => status.as_str()).increment(1);
        info!(card_id, status = %status, "Card status changed");
        Ok(())
    }

    pub async fn delete_card(&self, card_id: i64) -> DomainResult<()> {
        if !self.cards.delete(card_id).await? {
            return Err(DomainError::card_not_found());
        }
        info!(card_id, "Card deleted");
        Ok(())
    }

    // ── Account holder ──────────────────────────────────────────

    pub async fn list_own_cards(
        &self,
        owner_email: &str,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<CardView>> {
        let owner = self.resolve_user(owner_email).await?;
        let cards = self
            .cards
            .list(
                CardFilter {
                    owner_id: Some(owner.id),
                    status: None,
                },
                page,
            )
            .await?;
        self.project_page(cards)
    }

    /// Owner asks to block an active card.
    pub async fn request_block(&self, owner_email: &str, card_id: i64) -> DomainResult<()> {
        let owner = self.resolve_user(owner_email).await?;
        let card = self.load_owned_card(&owner, card_id).await?;

        if !card.is_active() {
            warn!(card_id, user_id = owner.id, "Block request on inactive card");
            return Err(DomainError::InvalidState("card not active"));
        }

        if !self.cards.update_status(card_id, CardStatus::Blocked).await? {
            return Err(DomainError::card_not_found());
        }

        metrics::counter!("card_status_changes_total", "status" => CardStatus::Blocked.as_str())
            .increment(1);
        info!(card_id, user_id = owner.id, "Card blocked at owner's request");
        Ok(())
    }

    pub async fn get_balance(&self, owner_email: &str, card_id: i64) -> DomainResult<BalanceView> {
        let owner = self.resolve_user(owner_email).await?;
        let card = self.load_owned_card(&owner, card_id).await?;
        Ok(BalanceView {
            id: card.id,
            balance: card.balance,
        })
    }

    /// Move `amount` between two cards of the same owner.
    ///
    /// Either both balances change or neither does. The funds check runs
    /// against the locked rows, so concurrent transfers cannot overdraw.
    pub async fn transfer(
        &self,
        owner_email: &str,
        source_card_id: i64,
        target_card_id: i64,
        amount: Decimal,
    ) -> DomainResult<()> {
        if amount <= Decimal::ZERO {
            record_transfer("rejected");
            return Err(DomainError::Validation("amount must be positive".into()));
        }
        if let Err(e) = check_money(amount, "amount") {
            record_transfer("rejected");
            return Err(e);
        }
        if source_card_id == target_card_id {
            record_transfer("rejected");
            return Err(DomainError::Validation(
                "source and target card must differ".into(),
            ));
        }

        let owner = self.resolve_user(owner_email).await?;

        let source = self
            .cards
            .find_by_id(source_card_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "source card",
            })?;
        let target = self
            .cards
            .find_by_id(target_card_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "target card",
            })?;

        if !source.is_owned_by(owner.id) || !target.is_owned_by(owner.id) {
            record_transfer("rejected");
            warn!(
                user_id = owner.id,
                source_card_id, target_card_id, "Transfer touching a foreign card refused"
            );
            return Err(DomainError::Unauthorized);
        }

        let unit = self
            .cards
            .begin_transfer(source_card_id, target_card_id)
            .await?;

        let source_balance = unit.source().balance;
        if source_balance < amount {
            record_transfer("insufficient_funds");
            warn!(
                user_id = owner.id,
                source_card_id,
                amount = %amount,
                "Transfer refused: insufficient funds"
            );
            return Err(DomainError::InsufficientFunds);
        }

        let target_balance = unit.target().balance + amount;
        if to_minor_units(target_balance).is_none() {
            record_transfer("rejected");
            return Err(DomainError::Validation(
                "target balance would exceed the allowed range".into(),
            ));
        }
        unit.commit(source_balance - amount, target_balance).await?;

        record_transfer("success");
        info!(
            user_id = owner.id,
            source_card_id,
            target_card_id,
            amount = %amount,
            "Transfer completed"
        );
        Ok(())
    }
}

//! Card repository.
//!
//! Cards are looked up by PAN hash; the raw PAN is never stored or queried.

use chrono::Utc;
use fuelgate_core::card::{Card, CardCredentials, CardStatus, PanError};
use fuelgate_shared::types::{CardId, OrganizationId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::cards;

/// Error types for card operations.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// The PAN cannot be hashed.
    #[error("Invalid card number: {0}")]
    InvalidPan(#[from] PanError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a card.
#[derive(Clone)]
pub struct CreateCardInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Raw PAN; only its hash and last four digits are stored.
    pub card_number: String,
    /// Initial status.
    pub status: CardStatus,
}

/// Result of resolving an inbound PAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLookup {
    /// Exactly one card matched.
    Found(Card),
    /// Nothing matched.
    NotFound,
    /// More than one card matched; the PAN cannot identify a single card.
    Ambiguous,
}

impl CardLookup {
    fn from_matches(mut cards: Vec<Card>) -> Self {
        if cards.len() > 1 {
            return Self::Ambiguous;
        }
        cards.pop().map_or(Self::NotFound, Self::Found)
    }
}

/// Card repository.
#[derive(Debug, Clone)]
pub struct CardRepository {
    db: DatabaseConnection,
}

impl CardRepository {
    /// Creates a new card repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a card.
    ///
    /// # Errors
    ///
    /// Returns an error if the PAN is invalid or the insert fails (including
    /// a PAN already registered for the organization).
    pub async fn create(&self, input: CreateCardInput) -> Result<Card, CardError> {
        let credentials = CardCredentials::from_pan(&input.card_number)?;

        let model = cards::ActiveModel {
            id: Set(CardId::new().into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            card_number_hash: Set(credentials.pan_hash),
            last4: Set(credentials.last4),
            status: Set(input.status.into()),
            vehicle_id: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(to_domain(model))
    }

    /// Resolves a card from hashed credentials.
    ///
    /// The PAN hash is authoritative. When it matches nothing and
    /// `allow_last4_fallback` is set, the last four digits are tried and
    /// accepted only if they identify exactly one card.
    pub async fn resolve<C: ConnectionTrait>(
        &self,
        conn: &C,
        credentials: &CardCredentials,
        allow_last4_fallback: bool,
    ) -> Result<CardLookup, DbErr> {
        let by_hash =
            Self::find_where(conn, cards::Column::CardNumberHash.eq(credentials.pan_hash.as_str()))
                .await?;
        let lookup = CardLookup::from_matches(by_hash);
        if lookup != CardLookup::NotFound || !allow_last4_fallback {
            return Ok(lookup);
        }

        let by_last4 =
            Self::find_where(conn, cards::Column::Last4.eq(credentials.last4.as_str())).await?;
        let lookup = CardLookup::from_matches(by_last4);
        if matches!(lookup, CardLookup::Found(_)) {
            tracing::warn!(last4 = %credentials.last4, "Card resolved by last-4 fallback");
        }
        Ok(lookup)
    }

    /// Finds a card by ID.
    pub async fn find_by_id(&self, id: CardId) -> Result<Option<Card>, DbErr> {
        Ok(cards::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(to_domain))
    }

    // At most two rows are needed to tell "one" from "many".
    async fn find_where<C: ConnectionTrait>(
        conn: &C,
        condition: sea_orm::sea_query::SimpleExpr,
    ) -> Result<Vec<Card>, DbErr> {
        Ok(cards::Entity::find()
            .filter(condition)
            .order_by_asc(cards::Column::CreatedAt)
            .limit(2)
            .all(conn)
            .await?
            .into_iter()
            .map(to_domain)
            .collect())
    }
}

fn to_domain(model: cards::Model) -> Card {
    Card {
        id: CardId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        pan_hash: model.card_number_hash,
        last4: model.last4,
        status: model.status.into(),
    }
}

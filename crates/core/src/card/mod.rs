//! Fuel cards and PAN handling.
//!
//! Cards are identified by a one-way hash of their PAN. The raw number never
//! leaves the request that carried it.

pub mod pan;

use fuelgate_shared::types::{CardId, OrganizationId};
use serde::{Deserialize, Serialize};

pub use pan::{CardCredentials, PanError, hash_card_number, mask_card_number};

/// Card lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Card may transact.
    Active,
    /// Card is blocked; every transaction is declined.
    Blocked,
}

impl CardStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            other => Err(format!("unknown card status: {other}")),
        }
    }
}

/// A fuel card as seen by the authorization engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Card identifier.
    pub id: CardId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// `sha256:`-prefixed hash of the PAN.
    pub pan_hash: String,
    /// Last four digits, kept for support lookups and receipts.
    pub last4: String,
    /// Lifecycle status.
    pub status: CardStatus,
}

impl Card {
    /// Returns true if the card is blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == CardStatus::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_status_roundtrip() {
        for status in [CardStatus::Active, CardStatus::Blocked] {
            assert_eq!(status.as_str().parse::<CardStatus>().unwrap(), status);
        }
        assert!("ACTIVE".parse::<CardStatus>().is_err());
    }

    #[test]
    fn test_is_blocked() {
        let mut card = Card {
            id: CardId::new(),
            organization_id: OrganizationId::new(),
            pan_hash: hash_card_number("4242424242424242").unwrap(),
            last4: "4242".into(),
            status: CardStatus::Active,
        };
        assert!(!card.is_blocked());
        card.status = CardStatus::Blocked;
        assert!(card.is_blocked());
    }
}

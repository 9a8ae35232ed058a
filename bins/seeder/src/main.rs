//! Database seeder for FuelGate development and testing.
//!
//! Seeds one organization with a funded account, one card with a daily
//! limit, and one station. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use fuelgate_core::card::{CardCredentials, CardStatus};
use fuelgate_core::limits::PeriodType;
use fuelgate_db::entities::organizations;
use fuelgate_db::repositories::{
    CardLookup, CardRepository, CreateCardInput, CreateOrganizationInput, LimitRuleRepository,
    NewLimitRule, OrganizationRepository, StationRepository,
};
use fuelgate_shared::AppConfig;
use fuelgate_shared::types::{Money, OrganizationId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

const ORG_NAME: &str = "Acme Co";
const ORG_CURRENCY: &str = "USD";
/// $50,000.00
const OPENING_BALANCE_CENTS: i64 = 5_000_000;
const CARD_NUMBER: &str = "4242424242424242";
/// $2,000.00
const DAILY_LIMIT_CENTS: i64 = 200_000;
const STATION_CODE: &str = "STN-001";
const STATION_NAME: &str = "Fuel Station #1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = fuelgate_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding organization...");
    let organization_id = seed_organization(&db).await?;

    println!("Seeding card and limit rule...");
    seed_card(&db, organization_id).await?;

    println!("Seeding station...");
    StationRepository::new(db.clone(), &config.cache)
        .register(STATION_CODE, STATION_NAME)
        .await?;

    println!("Seeding complete!");
    Ok(())
}

/// Creates the organization and its funded account unless it exists.
async fn seed_organization(db: &DatabaseConnection) -> anyhow::Result<OrganizationId> {
    if let Some(existing) = organizations::Entity::find()
        .filter(organizations::Column::Name.eq(ORG_NAME))
        .one(db)
        .await?
    {
        println!("  {ORG_NAME} already exists, skipping...");
        return Ok(OrganizationId::from_uuid(existing.id));
    }

    let created = OrganizationRepository::new(db.clone())
        .create_with_account(CreateOrganizationInput {
            name: ORG_NAME.to_string(),
            currency: ORG_CURRENCY.parse()?,
            opening_balance: Money::from_minor(OPENING_BALANCE_CENTS),
        })
        .await?;
    println!("  Created {ORG_NAME} with balance {OPENING_BALANCE_CENTS} cents");
    Ok(OrganizationId::from_uuid(created.organization.id))
}

/// Registers the demo card with a DAILY calendar limit unless it exists.
async fn seed_card(db: &DatabaseConnection, organization_id: OrganizationId) -> anyhow::Result<()> {
    let cards = CardRepository::new(db.clone());
    let credentials = CardCredentials::from_pan(CARD_NUMBER)?;

    let card = match cards.resolve(db, &credentials, false).await? {
        CardLookup::Found(card) => {
            println!("  Card ending {} already exists, skipping...", card.last4);
            card
        }
        CardLookup::NotFound | CardLookup::Ambiguous => {
            cards
                .create(CreateCardInput {
                    organization_id,
                    card_number: CARD_NUMBER.to_string(),
                    status: CardStatus::Active,
                })
                .await?
        }
    };

    let rules = LimitRuleRepository::new(db.clone());
    if rules.active_for_card(db, card.id).await?.is_empty() {
        rules
            .create(NewLimitRule::calendar(
                card.id,
                PeriodType::Daily,
                Money::from_minor(DAILY_LIMIT_CENTS),
            ))
            .await?;
        println!("  Added DAILY limit of {DAILY_LIMIT_CENTS} cents");
    }
    Ok(())
}

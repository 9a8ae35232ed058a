//! Initial database migration.
//!
//! All amounts are BIGINT minor units. Usage buckets may not overlap per
//! (card, period type), enforced with a GiST exclusion constraint.
//! `fuel_transactions` becomes a TimescaleDB hypertable when the extension
//! can be loaded and stays a plain table otherwise.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;

        // ============================================================
        // PART 2: ORGANIZATIONS & ACCOUNTS
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(ORG_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: CARDS & LIMITS
        // ============================================================
        db.execute_unprepared(CARDS_SQL).await?;
        db.execute_unprepared(CARD_LIMIT_RULES_SQL).await?;
        db.execute_unprepared(CARD_USAGE_BUCKETS_SQL).await?;

        // ============================================================
        // PART 4: STATIONS & WEBHOOKS
        // ============================================================
        db.execute_unprepared(STATIONS_SQL).await?;
        db.execute_unprepared(WEBHOOK_EVENTS_SQL).await?;

        // ============================================================
        // PART 5: TRANSACTIONS & LEDGER
        // ============================================================
        db.execute_unprepared(FUEL_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(HYPERTABLE_SQL).await?;
        db.execute_unprepared(ORG_LEDGER_ENTRIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const EXTENSIONS_SQL: &str = r"
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS organizations (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'suspended')),
    currency    TEXT NOT NULL DEFAULT 'USD' CHECK (char_length(currency) = 3),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ORG_ACCOUNTS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS org_accounts (
    id               UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id  UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    available_cents  BIGINT NOT NULL CHECK (available_cents >= 0),
    version          BIGINT NOT NULL DEFAULT 0,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id)
);
";

const CARDS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS cards (
    id                UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id   UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    card_number_hash  TEXT NOT NULL,
    last4             TEXT NOT NULL CHECK (char_length(last4) = 4),
    status            TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'blocked')),
    vehicle_id        UUID,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, card_number_hash)
);

CREATE INDEX IF NOT EXISTS idx_cards_hash ON cards(card_number_hash);
CREATE INDEX IF NOT EXISTS idx_cards_last4 ON cards(last4);
";

const CARD_LIMIT_RULES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS card_limit_rules (
    id                   UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    card_id              UUID NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    period_type          TEXT NOT NULL CHECK (period_type IN ('DAILY', 'WEEKLY', 'MONTHLY', 'CUSTOM')),
    limit_cents          BIGINT NOT NULL CHECK (limit_cents >= 0),
    window_mode          TEXT NOT NULL DEFAULT 'CALENDAR' CHECK (window_mode IN ('CALENDAR', 'ANCHOR', 'ROLLING')),
    anchor_day_of_month  SMALLINT,
    anchor_length_days   SMALLINT,
    rolling_hours        INT,
    active               BOOLEAN NOT NULL DEFAULT true,
    created_at           TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_limit_rules_card_type
    ON card_limit_rules (card_id, period_type)
    WHERE active = true;
";

const CARD_USAGE_BUCKETS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS card_usage_buckets (
    id            UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    card_id       UUID NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    period_type   TEXT NOT NULL CHECK (period_type IN ('DAILY', 'WEEKLY', 'MONTHLY', 'CUSTOM')),
    bucket_start  TIMESTAMPTZ NOT NULL,
    bucket_end    TIMESTAMPTZ NOT NULL,
    spent_cents   BIGINT NOT NULL DEFAULT 0 CHECK (spent_cents >= 0),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (bucket_end > bucket_start),
    CONSTRAINT cub_no_overlap EXCLUDE USING gist (
        card_id WITH =,
        period_type WITH =,
        tstzrange(bucket_start, bucket_end, '[)') WITH &&
    )
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_cub_card_type_window
    ON card_usage_buckets (card_id, period_type, bucket_start, bucket_end);
";

const STATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS stations (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const WEBHOOK_EVENTS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS webhook_events (
    id               UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    station_id       UUID REFERENCES stations(id) ON DELETE SET NULL,
    idempotency_key  TEXT,
    raw_payload      JSONB NOT NULL,
    signature        TEXT,
    received_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    processed_at     TIMESTAMPTZ,
    status           TEXT NOT NULL DEFAULT 'received' CHECK (status IN ('received', 'processed', 'failed')),
    error_message    TEXT,
    UNIQUE (station_id, idempotency_key)
);
";

const FUEL_TRANSACTIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS fuel_transactions (
    id               UUID NOT NULL,
    card_id          UUID NOT NULL REFERENCES cards(id) ON DELETE RESTRICT,
    organization_id  UUID NOT NULL REFERENCES organizations(id) ON DELETE RESTRICT,
    station_id       UUID REFERENCES stations(id) ON DELETE SET NULL,
    external_ref     TEXT,
    amount_cents     BIGINT NOT NULL CHECK (amount_cents > 0),
    currency         TEXT NOT NULL,
    occurred_at      TIMESTAMPTZ NOT NULL,
    status           TEXT NOT NULL CHECK (status IN ('approved', 'rejected', 'pending')),
    decline_reason   TEXT,
    meta             JSONB NOT NULL DEFAULT '{}',
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (id, occurred_at)
);

CREATE INDEX IF NOT EXISTS idx_tx_card_time ON fuel_transactions (card_id, occurred_at DESC);
CREATE INDEX IF NOT EXISTS idx_tx_org_time ON fuel_transactions (organization_id, occurred_at DESC);
CREATE INDEX IF NOT EXISTS idx_tx_status_time ON fuel_transactions (status, occurred_at DESC);
";

// TimescaleDB is optional: plain Postgres keeps a regular table.
const HYPERTABLE_SQL: &str = r"
DO $$
BEGIN
    IF EXISTS (SELECT 1 FROM pg_available_extensions WHERE name = 'timescaledb') THEN
        CREATE EXTENSION IF NOT EXISTS timescaledb;
        PERFORM create_hypertable(
            'fuel_transactions',
            'occurred_at',
            if_not_exists => TRUE,
            chunk_time_interval => INTERVAL '7 days'
        );
    END IF;
EXCEPTION WHEN OTHERS THEN
    RAISE NOTICE 'timescaledb unavailable, fuel_transactions stays a plain table: %', SQLERRM;
END
$$;
";

const ORG_LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS org_ledger_entries (
    id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id     UUID NOT NULL REFERENCES org_accounts(id) ON DELETE CASCADE,
    tx_id          UUID,
    entry_type     TEXT NOT NULL CHECK (entry_type IN ('DEBIT', 'CREDIT')),
    amount_cents   BIGINT NOT NULL CHECK (amount_cents > 0),
    balance_after  BIGINT NOT NULL CHECK (balance_after >= 0),
    meta           JSONB NOT NULL DEFAULT '{}',
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_ledger_account_time ON org_ledger_entries (account_id, created_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS org_ledger_entries CASCADE;
DROP TABLE IF EXISTS fuel_transactions CASCADE;
DROP TABLE IF EXISTS webhook_events CASCADE;
DROP TABLE IF EXISTS stations CASCADE;
DROP TABLE IF EXISTS card_usage_buckets CASCADE;
DROP TABLE IF EXISTS card_limit_rules CASCADE;
DROP TABLE IF EXISTS cards CASCADE;
DROP TABLE IF EXISTS org_accounts CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;
";

//! Ledger schema: wallets, transaction rows, money requests.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(MONEY_REQUESTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

// Declaration order is the sort order for `ORDER BY` on these columns.
const ENUMS_SQL: &str = r"
CREATE TYPE transaction_type AS ENUM (
    'CREDIT',
    'DEBIT',
    'TRANSFER',
    'WITHDRAWAL',
    'DEPOSIT'
);

CREATE TYPE transaction_status AS ENUM (
    'PENDING',
    'COMPLETED',
    'FAILED',
    'CANCELLED'
);

CREATE TYPE money_request_status AS ENUM (
    'PENDING',
    'APPROVED',
    'REJECTED'
);
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    balance NUMERIC(20, 2) NOT NULL DEFAULT 0,
    currency VARCHAR(16) NOT NULL DEFAULT 'G_COIN',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_wallets_user UNIQUE (user_id),
    CONSTRAINT chk_wallets_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_wallets_currency CHECK (currency = 'G_COIN')
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    seq BIGSERIAL NOT NULL UNIQUE,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    transaction_type transaction_type NOT NULL,
    amount NUMERIC(20, 2) NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(255),
    status transaction_status NOT NULL DEFAULT 'COMPLETED',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_transactions_wallet_created ON transactions(wallet_id, created_at DESC);
CREATE INDEX idx_transactions_wallet_type ON transactions(wallet_id, transaction_type);
CREATE INDEX idx_transactions_reference ON transactions(reference) WHERE reference IS NOT NULL;
";

const MONEY_REQUESTS_SQL: &str = r"
CREATE TABLE money_requests (
    id UUID PRIMARY KEY,
    requester_id UUID NOT NULL,
    from_user_id UUID NOT NULL,
    amount NUMERIC(20, 2) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status money_request_status NOT NULL DEFAULT 'PENDING',
    rejection_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_money_requests_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_money_requests_distinct_parties CHECK (requester_id <> from_user_id)
);

CREATE INDEX idx_money_requests_requester ON money_requests(requester_id);
CREATE INDEX idx_money_requests_from_user ON money_requests(from_user_id);
CREATE INDEX idx_money_requests_status ON money_requests(status);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS money_requests CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TYPE IF EXISTS money_request_status CASCADE;
DROP TYPE IF EXISTS transaction_status CASCADE;
DROP TYPE IF EXISTS transaction_type CASCADE;
";

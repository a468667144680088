//! Initial database migration.
//!
//! Creates the enums and tables of the investment and transaction domains.
//! Users are owned by the identity service; `user_id` columns carry its ids
//! without a foreign key.

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
        // PART 2: INVESTMENTS
        // ============================================================
        db.execute_unprepared(PORTFOLIOS_SQL).await?;
        db.execute_unprepared(SECURITIES_SQL).await?;
        db.execute_unprepared(TRADES_SQL).await?;
        db.execute_unprepared(HOLDINGS_SQL).await?;
        db.execute_unprepared(PRICE_HISTORY_SQL).await?;

        // ============================================================
        // PART 3: ACCOUNTS & TRANSACTIONS
        // ============================================================
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(RECURRING_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(BUDGETS_SQL).await?;

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

const ENUMS_SQL: &str = r"
CREATE TYPE trade_side AS ENUM ('buy', 'sell');

CREATE TYPE transaction_type AS ENUM ('income', 'expense', 'transfer');

CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'failed');

CREATE TYPE recurrence_frequency AS ENUM ('daily', 'weekly', 'monthly', 'yearly');

CREATE TYPE budget_period AS ENUM ('monthly', 'yearly');
";

const PORTFOLIOS_SQL: &str = r"
CREATE TABLE portfolios (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL DEFAULT 'USD',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_portfolios_user ON portfolios(user_id);
";

const SECURITIES_SQL: &str = r"
CREATE TABLE securities (
    id BIGSERIAL PRIMARY KEY,
    symbol VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const TRADES_SQL: &str = r"
-- Append-only ledger of buys and sells
CREATE TABLE trades (
    id BIGSERIAL PRIMARY KEY,
    portfolio_id BIGINT NOT NULL REFERENCES portfolios(id) ON DELETE CASCADE,
    security_id BIGINT NOT NULL REFERENCES securities(id),
    side trade_side NOT NULL,
    quantity NUMERIC(19, 8) NOT NULL CHECK (quantity > 0),
    price NUMERIC(19, 4) NOT NULL CHECK (price > 0),
    fee NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (fee >= 0),
    trade_date TIMESTAMPTZ NOT NULL,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Replay order for one (portfolio, security) pair
CREATE INDEX idx_trades_replay ON trades(portfolio_id, security_id, trade_date, id);
";

const HOLDINGS_SQL: &str = r"
-- Cache of the trade replay; rows exist only for open positions
CREATE TABLE holdings (
    id BIGSERIAL PRIMARY KEY,
    portfolio_id BIGINT NOT NULL REFERENCES portfolios(id) ON DELETE CASCADE,
    security_id BIGINT NOT NULL REFERENCES securities(id),
    quantity NUMERIC(19, 8) NOT NULL CHECK (quantity > 0),
    average_cost NUMERIC(28, 12) NOT NULL CHECK (average_cost >= 0),
    total_cost NUMERIC(28, 12) NOT NULL CHECK (total_cost >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_holdings_position UNIQUE (portfolio_id, security_id)
);
";

const PRICE_HISTORY_SQL: &str = r"
CREATE TABLE price_history (
    id BIGSERIAL PRIMARY KEY,
    security_id BIGINT NOT NULL REFERENCES securities(id) ON DELETE CASCADE,
    date DATE NOT NULL,
    open NUMERIC(19, 4) NOT NULL CHECK (open >= 0),
    high NUMERIC(19, 4) NOT NULL CHECK (high >= 0),
    low NUMERIC(19, 4) NOT NULL CHECK (low >= 0),
    close NUMERIC(19, 4) NOT NULL CHECK (close >= 0),
    volume BIGINT NOT NULL DEFAULT 0 CHECK (volume >= 0),
    CONSTRAINT uq_price_history_day UNIQUE (security_id, date)
);

-- Latest close lookup
CREATE INDEX idx_price_history_latest ON price_history(security_id, date DESC);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_categories_name UNIQUE (user_id, name)
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL,
    -- Cache over completed transactions; may go negative
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    opening_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_accounts_user ON accounts(user_id);
";

const RECURRING_TRANSACTIONS_SQL: &str = r"
CREATE TABLE recurring_transactions (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    account_id BIGINT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    destination_account_id BIGINT REFERENCES accounts(id) ON DELETE CASCADE,
    category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL,
    transaction_type transaction_type NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency CHAR(3) NOT NULL,
    description TEXT,
    frequency recurrence_frequency NOT NULL,
    next_date TIMESTAMPTZ NOT NULL,
    end_date TIMESTAMPTZ,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_recurring_destination CHECK (
        (transaction_type = 'transfer') = (destination_account_id IS NOT NULL)
    )
);

-- Due-rule sweep
CREATE INDEX idx_recurring_due ON recurring_transactions(next_date) WHERE is_active = true;
CREATE INDEX idx_recurring_user ON recurring_transactions(user_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    account_id BIGINT NOT NULL REFERENCES accounts(id),
    destination_account_id BIGINT REFERENCES accounts(id),
    category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL,
    recurring_transaction_id BIGINT REFERENCES recurring_transactions(id) ON DELETE SET NULL,
    transaction_type transaction_type NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency CHAR(3) NOT NULL,
    description TEXT,
    transaction_date TIMESTAMPTZ NOT NULL,
    status transaction_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_destination CHECK (
        (transaction_type = 'transfer') = (destination_account_id IS NOT NULL)
    ),
    CONSTRAINT chk_transactions_distinct_accounts CHECK (
        destination_account_id IS NULL OR destination_account_id <> account_id
    )
);

CREATE INDEX idx_transactions_user_date ON transactions(user_id, transaction_date DESC);
CREATE INDEX idx_transactions_account ON transactions(account_id);
CREATE INDEX idx_transactions_destination ON transactions(destination_account_id)
    WHERE destination_account_id IS NOT NULL;
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    period budget_period NOT NULL DEFAULT 'monthly',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_budgets_category_period UNIQUE (user_id, category_id, period)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS recurring_transactions CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS price_history CASCADE;
DROP TABLE IF EXISTS holdings CASCADE;
DROP TABLE IF EXISTS trades CASCADE;
DROP TABLE IF EXISTS securities CASCADE;
DROP TABLE IF EXISTS portfolios CASCADE;

DROP TYPE IF EXISTS budget_period;
DROP TYPE IF EXISTS recurrence_frequency;
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS trade_side;
";

//! Initial ledger migration.
//!
//! Creates the chart of accounts, both ledger representations, accounting
//! periods, sequence counters and the company settings row.

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
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL (authoritative ledger)
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 4: LEGACY LEDGER
        // ============================================================
        db.execute_unprepared(LEGACY_LEDGER_SQL).await?;

        // ============================================================
        // PART 5: PERIODS, SEQUENCES, SETTINGS
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;
        db.execute_unprepared(SEQUENCE_COUNTERS_SQL).await?;
        db.execute_unprepared(COMPANY_SETTINGS_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_SEQUENCE_COUNTERS_SQL).await?;
        db.execute_unprepared(SEED_COMPANY_SETTINGS_SQL).await?;

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
CREATE TYPE account_type AS ENUM ('ASSET', 'LIABILITY', 'EQUITY', 'REVENUE', 'EXPENSE');

CREATE TYPE journal_status AS ENUM ('DRAFT', 'POSTED');

CREATE TYPE journal_source AS ENUM ('MANUAL', 'CLOSING', 'ADJUSTMENT', 'OPENING');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id              UUID PRIMARY KEY,
    code            VARCHAR(20) NOT NULL UNIQUE,
    name            VARCHAR(255) NOT NULL,
    account_type    account_type NOT NULL,
    parent_id       UUID REFERENCES accounts(id),
    is_header       BOOLEAN NOT NULL DEFAULT false,
    is_active       BOOLEAN NOT NULL DEFAULT true,
    -- Running balance in the account's normal orientation
    balance         NUMERIC(20, 2) NOT NULL DEFAULT 0,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at      TIMESTAMPTZ,

    CONSTRAINT chk_no_self_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_accounts_type ON accounts(account_type) WHERE deleted_at IS NULL;
CREATE INDEX idx_accounts_parent ON accounts(parent_id);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id                  UUID PRIMARY KEY,
    entry_number        VARCHAR(30) NOT NULL UNIQUE,
    entry_date          DATE NOT NULL,
    description         TEXT NOT NULL,
    reference           VARCHAR(100),
    source              journal_source NOT NULL DEFAULT 'MANUAL',
    status              journal_status NOT NULL DEFAULT 'DRAFT',
    total_debit         NUMERIC(20, 2) NOT NULL DEFAULT 0,
    total_credit        NUMERIC(20, 2) NOT NULL DEFAULT 0,
    is_balanced         BOOLEAN NOT NULL DEFAULT false,
    is_auto_generated   BOOLEAN NOT NULL DEFAULT false,
    created_by          UUID,
    posted_at           TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at          TIMESTAMPTZ,

    -- A posted entry must balance
    CONSTRAINT chk_posted_is_balanced CHECK (status <> 'POSTED' OR is_balanced),
    CONSTRAINT chk_balanced_flag CHECK (NOT is_balanced OR total_debit = total_credit)
);

CREATE INDEX idx_journal_entries_posted_date
    ON journal_entries(entry_date)
    WHERE status = 'POSTED' AND deleted_at IS NULL;
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id                  UUID PRIMARY KEY,
    journal_entry_id    UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id          UUID NOT NULL REFERENCES accounts(id),
    line_number         INTEGER NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    debit_amount        NUMERIC(20, 2) NOT NULL DEFAULT 0,
    credit_amount       NUMERIC(20, 2) NOT NULL DEFAULT 0,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- One-sided, non-negative, non-zero
    CONSTRAINT chk_line_amounts CHECK (
        debit_amount >= 0 AND credit_amount >= 0
        AND (debit_amount = 0) <> (credit_amount = 0)
    ),
    CONSTRAINT uq_line_number UNIQUE (journal_entry_id, line_number)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
CREATE INDEX idx_journal_lines_entry ON journal_lines(journal_entry_id);
";

const LEGACY_LEDGER_SQL: &str = r"
CREATE TABLE legacy_journal_entries (
    id              UUID PRIMARY KEY,
    entry_date      DATE NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    status          journal_status NOT NULL DEFAULT 'POSTED',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at      TIMESTAMPTZ
);

CREATE TABLE legacy_journal_lines (
    id                  UUID PRIMARY KEY,
    journal_entry_id    UUID NOT NULL REFERENCES legacy_journal_entries(id) ON DELETE CASCADE,
    account_id          UUID NOT NULL REFERENCES accounts(id),
    debit_amount        NUMERIC(20, 2) NOT NULL DEFAULT 0,
    credit_amount       NUMERIC(20, 2) NOT NULL DEFAULT 0
);

CREATE INDEX idx_legacy_journal_lines_account ON legacy_journal_lines(account_id);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id                  UUID PRIMARY KEY,
    start_date          DATE NOT NULL,
    end_date            DATE NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    is_closed           BOOLEAN NOT NULL DEFAULT false,
    is_locked           BOOLEAN NOT NULL DEFAULT false,
    closed_by           UUID,
    closed_at           TIMESTAMPTZ,
    total_revenue       NUMERIC(20, 2) NOT NULL DEFAULT 0,
    total_expense       NUMERIC(20, 2) NOT NULL DEFAULT 0,
    net_income          NUMERIC(20, 2) NOT NULL DEFAULT 0,
    closing_entry_id    UUID REFERENCES journal_entries(id),
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_period_dates CHECK (start_date <= end_date),
    CONSTRAINT chk_net_income CHECK (net_income = total_revenue - total_expense)
);

CREATE INDEX idx_accounting_periods_dates ON accounting_periods(start_date, end_date);
";

const SEQUENCE_COUNTERS_SQL: &str = r"
CREATE TABLE sequence_counters (
    document_type   VARCHAR(30) PRIMARY KEY,
    prefix          VARCHAR(10) NOT NULL,
    next_number     BIGINT NOT NULL DEFAULT 1,
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_next_number_positive CHECK (next_number >= 1)
);
";

const COMPANY_SETTINGS_SQL: &str = r"
CREATE TABLE company_settings (
    id                  INTEGER PRIMARY KEY DEFAULT 1,
    company_name        VARCHAR(255) NOT NULL DEFAULT '',
    company_address     TEXT NOT NULL DEFAULT '',
    company_phone       VARCHAR(50) NOT NULL DEFAULT '',
    company_email       VARCHAR(255) NOT NULL DEFAULT '',
    currency            VARCHAR(3) NOT NULL DEFAULT 'IDR',
    fiscal_year_start   VARCHAR(30) NOT NULL DEFAULT 'January 1',
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_single_row CHECK (id = 1)
);
";

const SEED_SEQUENCE_COUNTERS_SQL: &str = r"
INSERT INTO sequence_counters (document_type, prefix, next_number) VALUES
    ('INVOICE', 'INV', 1),
    ('SALES_ORDER', 'SOA', 1),
    ('QUOTATION', 'QT', 1),
    ('PURCHASE_ORDER', 'PO', 1),
    ('RECEIPT', 'RCV', 1),
    ('PAYMENT', 'PAY', 1),
    ('JOURNAL', 'JE', 1)
ON CONFLICT (document_type) DO NOTHING;
";

const SEED_COMPANY_SETTINGS_SQL: &str = r"
INSERT INTO company_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS company_settings CASCADE;
DROP TABLE IF EXISTS sequence_counters CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS legacy_journal_lines CASCADE;
DROP TABLE IF EXISTS legacy_journal_entries CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS journal_source CASCADE;
DROP TYPE IF EXISTS journal_status CASCADE;
DROP TYPE IF EXISTS account_type CASCADE;
";

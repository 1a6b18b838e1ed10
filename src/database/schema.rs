use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

/// Statements are idempotent and run in order
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        email       TEXT NOT NULL,
        password    TEXT NOT NULL,
        username    TEXT NOT NULL,
        role        TEXT NOT NULL DEFAULT 'user',
        credit      BIGINT NOT NULL DEFAULT 0,
        amount      NUMERIC(14, 2) NOT NULL DEFAULT 0,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT accounts_email_key UNIQUE (email),
        CONSTRAINT accounts_username_key UNIQUE (username),
        CONSTRAINT accounts_role_check CHECK (role IN ('user', 'admin', 'superadmin')),
        CONSTRAINT accounts_credit_check CHECK (credit >= 0),
        CONSTRAINT accounts_amount_check CHECK (amount >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS accounts_role_amount_idx ON accounts (role, amount DESC)",
];

/// Create the accounts table and its indexes if they are missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema is up to date");
    Ok(())
}

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::application::LedgerError;
use crate::domain::{Account, Cents, TransactionKind, TransactionRecord};

use super::{AccountStore, MIGRATION_001_INITIAL};

/// Durable account store backed by SQLite.
///
/// Each mutating operation runs inside a single database transaction holding
/// both the balance change and its audit row: commit on success, rollback on
/// any validation failure. Debits use a conditional `UPDATE ... WHERE
/// balance >= ?` so concurrent connections cannot interleave a read-check
/// with a stale write.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self, LedgerError> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Debit `origin` by `amount` inside the caller's transaction, returning
    /// the new balance. The conditional update keeps the check-and-subtract
    /// atomic; on no-op we look the row up again to tell "missing" apart from
    /// "underfunded". The transaction is rolled back by the caller on error.
    async fn debit(
        tx: &mut Transaction<'_, Sqlite>,
        origin: &str,
        amount: Cents,
    ) -> Result<Cents, LedgerError> {
        let row = sqlx::query(
            "UPDATE accounts SET balance = balance - ?1 WHERE id = ?2 AND balance >= ?1 RETURNING balance",
        )
        .bind(amount)
        .bind(origin)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to debit account")?;

        match row {
            Some(row) => Ok(row.get("balance")),
            None => {
                let existing = sqlx::query("SELECT balance FROM accounts WHERE id = ?")
                    .bind(origin)
                    .fetch_optional(&mut **tx)
                    .await
                    .context("Failed to fetch account")?;

                match existing {
                    Some(row) => Err(LedgerError::InsufficientBalance {
                        account: origin.to_string(),
                        balance: row.get("balance"),
                        requested: amount,
                    }),
                    None => Err(LedgerError::AccountNotFound(origin.to_string())),
                }
            }
        }
    }

    /// Create-or-credit `destination` by `amount`, returning the new balance.
    async fn credit(
        tx: &mut Transaction<'_, Sqlite>,
        destination: &str,
        amount: Cents,
    ) -> Result<Cents, LedgerError> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (id, balance) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET balance = balance + excluded.balance
            RETURNING balance
            "#,
        )
        .bind(destination)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to credit account")?;

        Ok(row.get("balance"))
    }

    /// Append the audit row for a committed operation, inside the same
    /// transaction as the balance change.
    async fn insert_record(
        tx: &mut Transaction<'_, Sqlite>,
        kind: TransactionKind,
        amount: Cents,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (type, amount, origin, destination, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(kind.as_str())
        .bind(amount)
        .bind(origin)
        .bind(destination)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to record transaction")?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Account {
        Account {
            id: row.get("id"),
            balance: row.get("balance"),
        }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TransactionRecord, LedgerError> {
        let kind_str: String = row.get("type");
        let timestamp_str: String = row.get("timestamp");

        Ok(TransactionRecord {
            id: row.get("id"),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", kind_str))?,
            amount: row.get("amount"),
            origin: row.get("origin"),
            destination: row.get("destination"),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .context("Invalid timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<Account>, LedgerError> {
        let row = sqlx::query("SELECT id, balance FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        Ok(row.as_ref().map(Self::row_to_account))
    }

    async fn upsert_increment(&self, id: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let balance = Self::credit(&mut tx, id, amount).await?;
        Self::insert_record(&mut tx, TransactionKind::Deposit, amount, None, Some(id)).await?;
        tx.commit().await.context("Failed to commit deposit")?;

        Ok(Account::new(id, balance))
    }

    async fn decrement(&self, id: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let balance = Self::debit(&mut tx, id, amount).await?;
        Self::insert_record(&mut tx, TransactionKind::Withdraw, amount, Some(id), None).await?;
        tx.commit().await.context("Failed to commit withdrawal")?;

        Ok(Account::new(id, balance))
    }

    async fn transfer(
        &self,
        origin: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<(Account, Account), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let origin_balance = Self::debit(&mut tx, origin, amount).await?;
        let destination_balance = Self::credit(&mut tx, destination, amount).await?;
        Self::insert_record(
            &mut tx,
            TransactionKind::Transfer,
            amount,
            Some(origin),
            Some(destination),
        )
        .await?;
        tx.commit().await.context("Failed to commit transfer")?;

        let origin_account = if origin == destination {
            Account::new(origin, destination_balance)
        } else {
            Account::new(origin, origin_balance)
        };
        Ok((origin_account, Account::new(destination, destination_balance)))
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let rows = sqlx::query("SELECT id, balance FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.iter().map(Self::row_to_account).collect())
    }

    async fn transactions(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, type, amount, origin, destination, timestamp
            FROM transactions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn reset(&self) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM transactions")
            .execute(&mut *tx)
            .await
            .context("Failed to clear transactions")?;
        sqlx::query("DELETE FROM accounts")
            .execute(&mut *tx)
            .await
            .context("Failed to clear accounts")?;

        tx.commit().await.context("Failed to commit reset")?;
        Ok(())
    }
}

use crate::domain::{
    build_integrity_report, Account, Cents, IntegrityReport, TransactionRecord,
};
use crate::storage::{AccountStore, MemoryStore, SqliteStore};

use super::LedgerError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, tests).
///
/// The service owns its store and is passed by reference wherever it is
/// needed; there is no ambient global state. Input validation happens here,
/// atomicity is delegated to the store.
pub struct LedgerService<S> {
    store: S,
}

/// Both legs of a committed transfer.
#[derive(Debug)]
pub struct TransferOutcome {
    pub origin: Account,
    pub destination: Account,
}

impl LedgerService<MemoryStore> {
    /// Create a service backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl LedgerService<SqliteStore> {
    /// Initialize a new database at the given path (connect + migrate).
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteStore::init(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteStore::connect(&db_url).await?;
        Ok(Self::new(store))
    }
}

impl<S: AccountStore> LedgerService<S> {
    /// Create a new ledger service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Deposit an amount into an account, creating the account on first use.
    ///
    /// Once the amount is validated a deposit cannot fail on balance grounds.
    pub async fn deposit(&self, destination: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.upsert_increment(destination, amount).await?;
        log::debug!(
            "deposit: {} into {} (balance {})",
            amount,
            account.id,
            account.balance
        );
        Ok(account)
    }

    /// Withdraw an amount from an existing account.
    ///
    /// Withdrawing the full balance is permitted and leaves the balance at 0.
    pub async fn withdraw(&self, origin: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.decrement(origin, amount).await?;
        log::debug!(
            "withdraw: {} from {} (balance {})",
            amount,
            account.id,
            account.balance
        );
        Ok(account)
    }

    /// Move an amount between two accounts as a single atomic unit.
    ///
    /// The origin must exist; the destination is created on the fly if absent.
    pub async fn transfer(
        &self,
        origin: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<TransferOutcome, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let (origin, destination) = self.store.transfer(origin, destination, amount).await?;
        log::debug!(
            "transfer: {} from {} to {} (balances {} / {})",
            amount,
            origin.id,
            destination.id,
            origin.balance,
            destination.balance
        );
        Ok(TransferOutcome {
            origin,
            destination,
        })
    }

    /// Look up an account and its current balance. Pure read.
    pub async fn get_balance(&self, id: &str) -> Result<Account, LedgerError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// Snapshot of every account, ordered by id.
    pub async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.accounts().await
    }

    /// The append-only audit log, in commit order.
    pub async fn transactions(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.store.transactions().await
    }

    /// Clear every account and transaction record. Idempotent.
    pub async fn reset(&self) -> Result<(), LedgerError> {
        self.store.reset().await?;
        log::debug!("reset: ledger cleared");
        Ok(())
    }

    /// Replay the audit log and verify it matches the stored balances.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let accounts = self.store.accounts().await?;
        let records = self.store.transactions().await?;
        Ok(build_integrity_report(&accounts, &records))
    }
}

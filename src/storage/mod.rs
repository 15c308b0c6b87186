mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::application::LedgerError;
use crate::domain::{Account, Cents, TransactionRecord};

/// SQL migration for the initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Single source of truth for balances, safe under concurrent access.
///
/// The two backends (in-memory and SQLite) implement one contract: every
/// mutating call either commits the balance change together with its audit
/// record, or leaves the store untouched. Partial effects are never visible
/// to other callers.
///
/// Amount validation belongs to the service layer, but implementations still
/// reject non-positive amounts so a misbehaving caller cannot corrupt state.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Read an account. Never mutates.
    async fn get(&self, id: &str) -> Result<Option<Account>, LedgerError>;

    /// Create the account with `balance = amount` if absent, otherwise
    /// atomically add `amount` to the existing balance.
    async fn upsert_increment(&self, id: &str, amount: Cents) -> Result<Account, LedgerError>;

    /// Atomically reduce the balance by `amount`, only if `balance >= amount`.
    /// Fails with `AccountNotFound` or `InsufficientBalance` without mutating.
    async fn decrement(&self, id: &str, amount: Cents) -> Result<Account, LedgerError>;

    /// Debit the origin and credit the destination as a single unit. The
    /// destination is created with balance 0 before crediting if absent.
    /// Returns both resulting accounts, origin first.
    async fn transfer(
        &self,
        origin: &str,
        destination: &str,
        amount: Cents,
    ) -> Result<(Account, Account), LedgerError>;

    /// Snapshot of every account, ordered by id.
    async fn accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// The audit log in commit order.
    async fn transactions(&self) -> Result<Vec<TransactionRecord>, LedgerError>;

    /// Clear every account and record. After this returns, any prior id is
    /// not found and record ids restart at 1. Blocks out all other operations
    /// while it runs.
    async fn reset(&self) -> Result<(), LedgerError>;
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::LedgerError;
use crate::domain::{Account, AccountId, Cents, TransactionRecord};

use super::AccountStore;

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, Cents>,
    log: Vec<TransactionRecord>,
    next_id: i64,
}

impl State {
    fn append(&mut self, mut record: TransactionRecord) {
        self.next_id += 1;
        record.id = self.next_id;
        self.log.push(record);
    }

    fn account(&self, id: &str) -> Option<Account> {
        self.accounts
            .get(id)
            .map(|balance| Account::new(id, *balance))
    }
}

/// Thread-safe in-memory account store.
///
/// A single store-wide lock guards the account map, the audit log and the id
/// counter, so each mutation commits its balance change and its audit record
/// as one atomic unit. The critical sections are short; transfers touch both
/// accounts inside the same write guard, which also rules out lock-ordering
/// deadlocks between opposite-direction transfers. `reset` takes the same
/// exclusive lock, so no caller ever observes a partially cleared ledger.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Account>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.account(id))
    }

    async fn upsert_increment(&self, id: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write().await;
        *state.accounts.entry(id.to_string()).or_insert(0) += amount;
        state.append(TransactionRecord::deposit(id, amount));
        Ok(state.account(id).unwrap())
    }

    async fn decrement(&self, id: &str, amount: Cents) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write().await;
        let balance = match state.accounts.get_mut(id) {
            None => return Err(LedgerError::AccountNotFound(id.to_string())),
            Some(balance) => balance,
        };
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: id.to_string(),
                balance: *balance,
                requested: amount,
            });
        }

        *balance -= amount;
        state.append(TransactionRecord::withdraw(id, amount));
        Ok(state.account(id).unwrap())
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

        let mut state = self.state.write().await;
        let origin_balance = match state.accounts.get(origin) {
            None => return Err(LedgerError::AccountNotFound(origin.to_string())),
            Some(balance) => *balance,
        };
        if origin_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: origin.to_string(),
                balance: origin_balance,
                requested: amount,
            });
        }

        *state.accounts.get_mut(origin).unwrap() -= amount;
        *state.accounts.entry(destination.to_string()).or_insert(0) += amount;
        state.append(TransactionRecord::transfer(origin, destination, amount));

        // Re-read both so a self-transfer reports the final balance
        Ok((
            state.account(origin).unwrap(),
            state.account(destination).unwrap(),
        ))
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .iter()
            .map(|(id, balance)| Account::new(id.clone(), *balance))
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn transactions(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.log.clone())
    }

    async fn reset(&self) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        *state = State::default();
        Ok(())
    }
}

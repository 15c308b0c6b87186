use thiserror::Error;

use crate::domain::{AccountId, Cents};

/// Typed failures returned by every ledger operation.
///
/// No error is thrown across the core boundary and no partial mutation is
/// ever visible on failure: a failed call leaves both the balances and the
/// audit log untouched.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient balance in account {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        balance: Cents,
        requested: Cents,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] anyhow::Error),
}

use serde::{Deserialize, Serialize};

use super::Cents;

/// Opaque, externally supplied account identifier.
pub type AccountId = String;

/// An account and its current balance.
///
/// Accounts are created implicitly by the first deposit that references them
/// (or lazily as a transfer destination) and are only ever removed by a full
/// reset. The balance never goes below zero through a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Cents,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, balance: Cents) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_new() {
        let account = Account::new("100", 2500);
        assert_eq!(account.id, "100");
        assert_eq!(account.balance, 2500);
    }
}

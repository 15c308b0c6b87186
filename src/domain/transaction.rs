use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering the ledger; destination only
    Deposit,
    /// Money leaving the ledger; origin only
    Withdraw,
    /// Money moving between two accounts; origin and destination
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdraw" => Some(TransactionKind::Withdraw),
            "transfer" => Some(TransactionKind::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only audit record of one committed ledger operation.
///
/// Records are immutable once appended and are only removed by a full reset.
/// The id is assigned by the store in monotonically increasing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonically assigned by the store; 0 until appended
    pub id: i64,
    pub kind: TransactionKind,
    /// Always positive; operations are validated before a record is created
    pub amount: Cents,
    pub origin: Option<AccountId>,
    pub destination: Option<AccountId>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    fn new(
        kind: TransactionKind,
        amount: Cents,
        origin: Option<AccountId>,
        destination: Option<AccountId>,
    ) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        Self {
            id: 0, // Will be set by the store
            kind,
            amount,
            origin,
            destination,
            timestamp: Utc::now(),
        }
    }

    pub fn deposit(destination: impl Into<AccountId>, amount: Cents) -> Self {
        Self::new(TransactionKind::Deposit, amount, None, Some(destination.into()))
    }

    pub fn withdraw(origin: impl Into<AccountId>, amount: Cents) -> Self {
        Self::new(TransactionKind::Withdraw, amount, Some(origin.into()), None)
    }

    pub fn transfer(
        origin: impl Into<AccountId>,
        destination: impl Into<AccountId>,
        amount: Cents,
    ) -> Self {
        Self::new(
            TransactionKind::Transfer,
            amount,
            Some(origin.into()),
            Some(destination.into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_record_has_destination_only() {
        let record = TransactionRecord::deposit("100", 1000);
        assert_eq!(record.kind, TransactionKind::Deposit);
        assert_eq!(record.origin, None);
        assert_eq!(record.destination, Some("100".to_string()));
        assert_eq!(record.amount, 1000);
    }

    #[test]
    fn test_withdraw_record_has_origin_only() {
        let record = TransactionRecord::withdraw("100", 500);
        assert_eq!(record.kind, TransactionKind::Withdraw);
        assert_eq!(record.origin, Some("100".to_string()));
        assert_eq!(record.destination, None);
    }

    #[test]
    fn test_transfer_record_has_both_ends() {
        let record = TransactionRecord::transfer("100", "200", 1500);
        assert_eq!(record.kind, TransactionKind::Transfer);
        assert_eq!(record.origin, Some("100".to_string()));
        assert_eq!(record.destination, Some("200".to_string()));
    }

    #[test]
    fn test_kind_round_trips_through_strings() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::Withdraw,
            TransactionKind::Transfer,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("chargeback"), None);
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_record_requires_positive_amount() {
        TransactionRecord::deposit("100", 0);
    }
}

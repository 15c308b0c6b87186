use std::collections::HashMap;

use super::{Account, AccountId, Cents, TransactionKind, TransactionRecord};

/// Compute the balance for a single account by replaying the audit log.
/// Balance = deposits and incoming transfers - withdrawals and outgoing transfers
pub fn replay_balance(account_id: &str, records: &[TransactionRecord]) -> Cents {
    records.iter().fold(0, |balance, record| {
        let incoming = record.destination.as_deref() == Some(account_id);
        let outgoing = record.origin.as_deref() == Some(account_id);
        match (incoming, outgoing) {
            (true, true) => balance, // self-transfer, net zero
            (true, false) => balance + record.amount,
            (false, true) => balance - record.amount,
            (false, false) => balance,
        }
    })
}

/// Compute balances for every account mentioned in the audit log.
/// Returns a map of account id -> balance.
pub fn replay_all_balances(records: &[TransactionRecord]) -> HashMap<AccountId, Cents> {
    let mut balances: HashMap<AccountId, Cents> = HashMap::new();

    for record in records {
        if let Some(origin) = &record.origin {
            *balances.entry(origin.clone()).or_insert(0) -= record.amount;
        }
        if let Some(destination) = &record.destination {
            *balances.entry(destination.clone()).or_insert(0) += record.amount;
        }
    }

    balances
}

/// A stored balance that disagrees with the balance replayed from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMismatch {
    pub account_id: AccountId,
    pub stored: Cents,
    pub replayed: Cents,
}

/// Result of verifying the stored balances against the audit log.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub account_count: usize,
    pub transaction_count: usize,
    /// Accounts whose stored balance differs from the replayed balance
    pub mismatches: Vec<BalanceMismatch>,
    /// Accounts holding a negative balance at rest
    pub negative_balances: Vec<AccountId>,
    /// Audit records carrying a non-positive amount
    pub invalid_amounts: usize,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty() && self.negative_balances.is_empty() && self.invalid_amounts == 0
    }
}

/// Replay the audit log and compare it against the stored accounts.
///
/// Transfers conserve the total, so the replayed balance of every account must
/// match its stored balance exactly; any drift means a balance change was
/// committed without its audit row or vice versa.
pub fn build_integrity_report(
    accounts: &[Account],
    records: &[TransactionRecord],
) -> IntegrityReport {
    let replayed = replay_all_balances(records);

    let mut mismatches = Vec::new();
    let mut negative_balances = Vec::new();
    for account in accounts {
        let expected = replayed.get(&account.id).copied().unwrap_or(0);
        if account.balance != expected {
            mismatches.push(BalanceMismatch {
                account_id: account.id.clone(),
                stored: account.balance,
                replayed: expected,
            });
        }
        if account.balance < 0 {
            negative_balances.push(account.id.clone());
        }
    }

    let invalid_amounts = records.iter().filter(|r| r.amount <= 0).count();

    IntegrityReport {
        account_count: accounts.len(),
        transaction_count: records.len(),
        mismatches,
        negative_balances,
        invalid_amounts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_balance_empty() {
        assert_eq!(replay_balance("100", &[]), 0);
    }

    #[test]
    fn test_replay_balance_mixed() {
        let records = vec![
            TransactionRecord::deposit("100", 2000),
            TransactionRecord::withdraw("100", 500),
            TransactionRecord::transfer("100", "200", 1000),
        ];

        assert_eq!(replay_balance("100", &records), 500);
        assert_eq!(replay_balance("200", &records), 1000);
        assert_eq!(replay_balance("unknown", &records), 0);
    }

    #[test]
    fn test_replay_self_transfer_is_net_zero() {
        let records = vec![
            TransactionRecord::deposit("100", 1000),
            TransactionRecord::transfer("100", "100", 400),
        ];

        assert_eq!(replay_balance("100", &records), 1000);
    }

    #[test]
    fn test_replay_all_balances() {
        let records = vec![
            TransactionRecord::deposit("100", 5000),
            TransactionRecord::transfer("100", "200", 2000),
            TransactionRecord::withdraw("200", 500),
        ];

        let balances = replay_all_balances(&records);
        assert_eq!(balances.get("100"), Some(&3000));
        assert_eq!(balances.get("200"), Some(&1500));
    }

    #[test]
    fn test_transfers_conserve_the_total() {
        let records = vec![
            TransactionRecord::deposit("a", 1000),
            TransactionRecord::deposit("b", 500),
            TransactionRecord::transfer("a", "b", 700),
            TransactionRecord::transfer("b", "c", 300),
        ];

        let balances = replay_all_balances(&records);
        let total: Cents = balances.values().sum();
        assert_eq!(total, 1500, "Transfers must redistribute, never create");
    }

    #[test]
    fn test_integrity_report_clean() {
        let records = vec![
            TransactionRecord::deposit("100", 1000),
            TransactionRecord::transfer("100", "200", 400),
        ];
        let accounts = vec![Account::new("100", 600), Account::new("200", 400)];

        let report = build_integrity_report(&accounts, &records);
        assert!(report.is_ok());
        assert_eq!(report.account_count, 2);
        assert_eq!(report.transaction_count, 2);
    }

    #[test]
    fn test_integrity_report_detects_drift() {
        let records = vec![TransactionRecord::deposit("100", 1000)];
        let accounts = vec![Account::new("100", 900)];

        let report = build_integrity_report(&accounts, &records);
        assert!(!report.is_ok());
        assert_eq!(
            report.mismatches,
            vec![BalanceMismatch {
                account_id: "100".to_string(),
                stored: 900,
                replayed: 1000,
            }]
        );
    }

    #[test]
    fn test_integrity_report_flags_negative_balance() {
        let accounts = vec![Account::new("100", -50)];
        let report = build_integrity_report(&accounts, &[]);
        assert!(!report.is_ok());
        assert_eq!(report.negative_balances, vec!["100".to_string()]);
    }
}

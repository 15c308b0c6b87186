use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, TransactionRecord};
use crate::storage::AccountStore;

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<TransactionRecord>,
}

/// Exporter for converting ledger data to tabular or JSON formats
pub struct Exporter<'a, S> {
    service: &'a LedgerService<S>,
}

impl<'a, S: AccountStore> Exporter<'a, S> {
    pub fn new(service: &'a LedgerService<S>) -> Self {
        Self { service }
    }

    /// Export the audit log to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.service.transactions().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "type", "amount", "origin", "destination", "timestamp"])?;

        let mut count = 0;
        for record in &records {
            csv_writer.write_record([
                record.id.to_string(),
                record.kind.to_string(),
                record.amount.to_string(),
                record.origin.clone().unwrap_or_default(),
                record.destination.clone().unwrap_or_default(),
                record.timestamp.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export account balances to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account", "balance"])?;

        let mut count = 0;
        for account in &accounts {
            csv_writer.write_record([account.id.clone(), account.balance.to_string()])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full ledger state as a JSON snapshot
    pub async fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts: self.service.accounts().await?,
            transactions: self.service.transactions().await?,
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_transactions_csv() {
        let service = LedgerService::in_memory();
        service.deposit("100", 1000).await.unwrap();
        service.transfer("100", "200", 400).await.unwrap();

        let mut buf = Vec::new();
        let count = Exporter::new(&service)
            .export_transactions_csv(&mut buf)
            .await
            .unwrap();

        assert_eq!(count, 2);
        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("id,type,amount,origin,destination,timestamp")
        );
        assert!(lines.next().unwrap().starts_with("1,deposit,1000,,100,"));
        assert!(lines.next().unwrap().starts_with("2,transfer,400,100,200,"));
    }

    #[tokio::test]
    async fn test_export_balances_csv() {
        let service = LedgerService::in_memory();
        service.deposit("b", 500).await.unwrap();
        service.deposit("a", 1000).await.unwrap();

        let mut buf = Vec::new();
        let count = Exporter::new(&service)
            .export_balances_csv(&mut buf)
            .await
            .unwrap();

        assert_eq!(count, 2);
        let output = String::from_utf8(buf).unwrap();
        // Ordered by account id
        assert_eq!(output, "account,balance\na,1000\nb,500\n");
    }

    #[tokio::test]
    async fn test_export_snapshot_json() {
        let service = LedgerService::in_memory();
        service.deposit("100", 1000).await.unwrap();

        let mut buf = Vec::new();
        let snapshot = Exporter::new(&service)
            .export_snapshot_json(&mut buf)
            .await
            .unwrap();

        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.transactions.len(), 1);

        let parsed: LedgerSnapshot = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.accounts, snapshot.accounts);
    }
}

mod common;

use anyhow::Result;
use cassa::application::{LedgerError, LedgerService};
use common::sqlite_service;

#[tokio::test]
async fn test_state_survives_reconnect() -> Result<()> {
    let (service, temp) = sqlite_service().await?;
    let db_path = temp.path().join("test.db");

    service.deposit("100", 1500).await?;
    service.transfer("100", "200", 500).await?;
    drop(service);

    let service = LedgerService::connect(db_path.to_str().unwrap()).await?;
    assert_eq!(service.get_balance("100").await?.balance, 1000);
    assert_eq!(service.get_balance("200").await?.balance, 500);

    let records = service.transactions().await?;
    assert_eq!(records.len(), 2);
    assert!(service.check_integrity().await?.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_transfer_creates_destination_lazily() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.deposit("100", 800).await?;

    let outcome = service.transfer("100", "fresh", 300).await?;
    assert_eq!(outcome.origin.balance, 500);
    assert_eq!(outcome.destination.balance, 300);
    Ok(())
}

#[tokio::test]
async fn test_failed_operations_append_no_audit_row() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.deposit("100", 100).await?;

    let _ = service.withdraw("100", 500).await.unwrap_err();
    let _ = service.withdraw("ghost", 10).await.unwrap_err();
    let _ = service.transfer("100", "200", 500).await.unwrap_err();

    assert_eq!(service.transactions().await?.len(), 1);
    assert_eq!(service.get_balance("100").await?.balance, 100);
    assert!(service.check_integrity().await?.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_reset_clears_and_restarts_record_ids() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.deposit("100", 1000).await?;
    service.withdraw("100", 200).await?;
    assert_eq!(service.transactions().await?.last().unwrap().id, 2);

    service.reset().await?;
    assert!(matches!(
        service.get_balance("100").await.unwrap_err(),
        LedgerError::AccountNotFound(_)
    ));
    assert!(service.transactions().await?.is_empty());

    service.deposit("100", 50).await?;
    assert_eq!(service.transactions().await?[0].id, 1);
    Ok(())
}

#[tokio::test]
async fn test_reset_on_empty_database_is_a_no_op() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.reset().await?;
    service.reset().await?;
    assert!(service.accounts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_full_balance_withdrawal_reaches_zero() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.deposit("100", 1234).await?;

    let account = service.withdraw("100", 1234).await?;
    assert_eq!(account.balance, 0);

    // The account still exists at zero; only reset removes it
    assert_eq!(service.get_balance("100").await?.balance, 0);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_balance_error_carries_context() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    service.deposit("100", 300).await?;

    let err = service.withdraw("100", 450).await.unwrap_err();
    match err {
        LedgerError::InsufficientBalance {
            account,
            balance,
            requested,
        } => {
            assert_eq!(account, "100");
            assert_eq!(balance, 300);
            assert_eq!(requested, 450);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

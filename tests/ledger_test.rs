mod common;

use anyhow::Result;
use common::{StandardAccounts, test_service};
use tally::application::LedgerError;
use tally::domain::{IntegrityIssue, TransactionType, compute_balance};

#[tokio::test]
async fn test_deposit_withdraw_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ana = StandardAccounts::ana(&service).await?;
    assert_eq!(ana.balance, 10000);
    assert!(ana.is_active);

    let opening = service.get_transactions(ana.id, 10).await?;
    assert_eq!(opening.total_count, 1);
    let first = &opening.transactions[0];
    assert_eq!(first.transaction_type, TransactionType::Deposit);
    assert_eq!(first.amount, 10000);
    assert_eq!(first.balance_after, 10000);
    assert_eq!(first.description, "Initial deposit");

    let deposit = service.deposit(ana.id, 5000, None).await?;
    assert_eq!(deposit.new_balance, 15000);

    let withdrawal = service
        .withdraw(ana.id, 3000, Some("Groceries".into()))
        .await?;
    assert_eq!(withdrawal.new_balance, 12000);
    assert_eq!(withdrawal.transaction.description, "Groceries");

    let err = service.withdraw(ana.id, 999900, None).await.unwrap_err();
    match err {
        LedgerError::InsufficientFunds {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 12000);
            assert_eq!(requested, 999900);
        }
        other => panic!("expected insufficient funds, got {other:?}"),
    }
    assert_eq!(service.get_balance(ana.id).await?.balance, 12000);

    // Rejected withdrawal leaves no record
    let history = service.get_transactions(ana.id, 10).await?;
    assert_eq!(history.total_count, 3);
    let summary: Vec<_> = history
        .transactions
        .iter()
        .map(|tx| (tx.transaction_type, tx.amount, tx.balance_after))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TransactionType::Withdrawal, 3000, 12000),
            (TransactionType::Deposit, 5000, 15000),
            (TransactionType::Deposit, 10000, 10000),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_balance_matches_replayed_history() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;

    for amount in [1250, 75, 40000] {
        service.deposit(ana.id, amount, None).await?;
    }
    for amount in [999, 10000] {
        service.withdraw(ana.id, amount, None).await?;
    }

    let history = service
        .repository()
        .list_transactions_chronological(ana.id)
        .await?;
    let account = service.get_account(ana.id).await?;
    assert_eq!(compute_balance(&history), account.balance);
    assert_eq!(account.balance, 10000 + 1250 + 75 + 40000 - 999 - 10000);

    let report = service.check_integrity().await?;
    assert!(report.is_healthy());
    assert_eq!(report.account_count, 1);
    assert_eq!(report.transaction_count, 6);
    assert_eq!(report.total_balance, i128::from(account.balance));

    Ok(())
}

#[tokio::test]
async fn test_withdraw_exact_balance_reaches_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;

    let result = service.withdraw(ana.id, 10000, None).await?;
    assert_eq!(result.new_balance, 0);

    let err = service.withdraw(ana.id, 1, None).await.unwrap_err();
    assert_eq!(err.code(), "insufficient_funds");
    assert_eq!(err.to_string(), "Insufficient funds. Available balance: $0.00");

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;

    for amount in [0, -500] {
        let err = service.deposit(ana.id, amount, None).await.unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
        let err = service.withdraw(ana.id, amount, None).await.unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    assert_eq!(service.get_balance(ana.id).await?.balance, 10000);
    assert_eq!(service.get_transactions(ana.id, 10).await?.total_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_unknown_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.deposit(42, 100, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));
    let err = service.withdraw(42, 100, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));
    assert!(matches!(
        service.get_balance(42).await.unwrap_err(),
        LedgerError::AccountNotFound(42)
    ));
    assert!(matches!(
        service.get_transactions(42, 10).await.unwrap_err(),
        LedgerError::AccountNotFound(42)
    ));
    assert!(matches!(
        service.deactivate_account(42).await.unwrap_err(),
        LedgerError::AccountNotFound(42)
    ));

    Ok(())
}

#[tokio::test]
async fn test_account_creation_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .create_account("   ", "blank@example.com", 0)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    let err = service.create_account("Blank", "", 0).await.unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    let err = service
        .create_account("Negative", "neg@example.com", -100)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    // Surrounding whitespace is trimmed before storing
    let account = service
        .create_account("  Cleo  ", " cleo@example.com ", 0)
        .await?;
    assert_eq!(account.name, "Cleo");
    assert_eq!(account.email, "cleo@example.com");

    assert_eq!(service.list_all_accounts().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::ana(&service).await?;

    let err = service
        .create_account("Another Ana", "ana@example.com", 500)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateEmail(ref email) if email == "ana@example.com"));

    // Nothing from the failed attempt was recorded
    assert_eq!(service.list_all_accounts().await?.len(), 1);
    assert_eq!(service.list_all_transactions().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_zero_initial_deposit_records_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ben = StandardAccounts::ben(&service).await?;

    assert_eq!(ben.balance, 0);
    let history = service.get_transactions(ben.id, 10).await?;
    assert!(history.transactions.is_empty());
    assert_eq!(history.total_count, 0);
    assert_eq!(history.account_name, "Ben Okafor");

    Ok(())
}

#[tokio::test]
async fn test_history_limit_is_clamped() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ben = StandardAccounts::ben(&service).await?;

    for i in 1..=105 {
        service.deposit(ben.id, i, None).await?;
    }

    let history = service.get_transactions(ben.id, 5).await?;
    assert_eq!(history.transactions.len(), 5);
    assert_eq!(history.total_count, 105);
    let amounts: Vec<_> = history.transactions.iter().map(|tx| tx.amount).collect();
    assert_eq!(amounts, vec![105, 104, 103, 102, 101]);

    assert_eq!(service.get_transactions(ben.id, 0).await?.transactions.len(), 10);
    assert_eq!(service.get_transactions(ben.id, -3).await?.transactions.len(), 10);
    assert_eq!(service.get_transactions(ben.id, 500).await?.transactions.len(), 100);

    Ok(())
}

#[tokio::test]
async fn test_list_accounts_newest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;
    let ben = StandardAccounts::ben(&service).await?;
    let cleo = service
        .create_account("Cleo", "cleo@example.com", 0)
        .await?;

    service.deactivate_account(ben.id).await?;

    let accounts = service.list_accounts(10).await?;
    let ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![cleo.id, ana.id]);

    assert_eq!(service.list_accounts(1).await?.len(), 1);
    assert_eq!(service.list_accounts(0).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_deactivated_account_refuses_mutations() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;

    let deactivated = service.deactivate_account(ana.id).await?;
    assert!(!deactivated.is_active);

    let err = service.deposit(ana.id, 100, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInactive(id) if id == ana.id));
    let err = service.withdraw(ana.id, 100, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInactive(id) if id == ana.id));

    // Reads keep working
    let view = service.get_balance(ana.id).await?;
    assert_eq!(view.balance, 10000);
    assert!(!view.is_active);
    assert_eq!(service.get_transactions(ana.id, 10).await?.total_count, 1);

    // Deactivating again is a no-op
    assert!(!service.deactivate_account(ana.id).await?.is_active);

    Ok(())
}

#[tokio::test]
async fn test_integrity_check_detects_tampering() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;
    service.deposit(ana.id, 2500, None).await?;

    sqlx::query("UPDATE accounts SET balance = balance + 1 WHERE id = ?")
        .bind(ana.id)
        .execute(service.repository().pool())
        .await?;

    let report = service.check_integrity().await?;
    assert!(!report.is_healthy());
    assert!(report.issues.contains(&IntegrityIssue::BalanceMismatch {
        account_id: ana.id,
        stored: 12501,
        replayed: 12500,
    }));

    Ok(())
}

#[tokio::test]
async fn test_data_survives_reopen() -> Result<()> {
    let (service, temp) = test_service().await?;
    let ana = StandardAccounts::ana(&service).await?;
    service.deposit(ana.id, 5000, None).await?;
    service.close().await;

    let db_path = temp.path().join("test.db");
    let reopened = tally::application::LedgerService::connect(db_path.to_str().unwrap()).await?;
    assert_eq!(reopened.get_balance(ana.id).await?.balance, 15000);
    assert_eq!(reopened.get_transactions(ana.id, 10).await?.total_count, 2);

    Ok(())
}

#[tokio::test]
async fn test_integrity_total_beyond_single_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let half = i64::MAX / 2 + 1;

    service
        .create_account("Ana Ruiz", "ana@example.com", half)
        .await?;
    service
        .create_account("Ben Okafor", "ben@example.com", half)
        .await?;

    let report = service.check_integrity().await?;
    assert!(report.is_healthy(), "unexpected issues: {:?}", report.issues);
    assert_eq!(report.account_count, 2);
    assert_eq!(report.total_balance, 2 * i128::from(half));

    Ok(())
}

#[tokio::test]
async fn test_deposit_past_max_balance_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let rich = service
        .create_account("Cleo", "cleo@example.com", i64::MAX)
        .await?;

    let err = service.deposit(rich.id, 1, None).await.unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    assert_eq!(service.get_balance(rich.id).await?.balance, i64::MAX);
    assert_eq!(service.get_transactions(rich.id, 10).await?.total_count, 1);

    // Withdrawals still work at the ceiling
    let result = service.withdraw(rich.id, 1, None).await?;
    assert_eq!(result.new_balance, i64::MAX - 1);

    Ok(())
}

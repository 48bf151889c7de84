// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tally::application::LedgerService;
use tally::domain::Account;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard account holders
pub struct StandardAccounts;

impl StandardAccounts {
    /// Ana Ruiz, opened with 100.00
    pub async fn ana(service: &LedgerService) -> Result<Account> {
        Ok(service
            .create_account("Ana Ruiz", "ana@example.com", 10000)
            .await?)
    }

    /// Ben Okafor, opened with no deposit
    pub async fn ben(service: &LedgerService) -> Result<Account> {
        Ok(service
            .create_account("Ben Okafor", "ben@example.com", 0)
            .await?)
    }
}

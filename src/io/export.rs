use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, Transaction, format_cents};

/// Snapshot of the whole ledger for JSON export
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Exporter for converting ledger data to CSV and JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every account (active or not) to CSV
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_all_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "email",
            "balance",
            "is_active",
            "created_at",
        ])?;

        for account in &accounts {
            csv_writer.write_record([
                account.id.to_string(),
                account.name.clone(),
                account.email.clone(),
                format_cents(account.balance),
                account.is_active.to_string(),
                account.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Export every transaction to CSV, in recording order
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_all_transactions().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "account_id",
            "type",
            "amount",
            "balance_after",
            "description",
            "timestamp",
        ])?;

        for tx in &transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.account_id.to_string(),
                tx.transaction_type.as_str().to_string(),
                format_cents(tx.amount),
                format_cents(tx.balance_after),
                tx.description.clone(),
                tx.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export accounts and transactions as one JSON document, read from a
    /// single consistent view of the store
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let (accounts, transactions) = self.service.snapshot().await?;
        let snapshot = LedgerSnapshot {
            exported_at: Utc::now(),
            accounts,
            transactions,
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(snapshot)
    }
}

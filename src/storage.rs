/**
 * Snapshot persistence. The whole ledger is written as two CSV tables,
 * one row per account and one row per transaction, and both are replaced
 * wholesale on every save.
 */
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bank::{Account, AccountType, Ledger};
use crate::config::Config;
use crate::error::StorageError;
use crate::fixedpoint::Amount;
use crate::transactions::{Transaction, TransactionKind};

type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Serialize, Deserialize)]
struct AccountRow {
    account_number: u32,
    owner_name: String,
    account_type: AccountType,
    balance: Amount,
    checkbook_issued: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionRow {
    account_number: u32,
    kind: TransactionKind,
    amount: Amount,
    resulting_balance: Amount,
    timestamp: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            kind: row.kind,
            amount: row.amount,
            resulting_balance: row.resulting_balance,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    accounts_path: PathBuf,
    transactions_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(config: &Config) -> Self {
        SnapshotStore {
            data_dir: config.data_dir().to_path_buf(),
            accounts_path: config.accounts_path(),
            transactions_path: config.transactions_path(),
        }
    }

    /// An absent snapshot is an empty ledger.
    pub fn load(&self) -> Result<Ledger> {
        if !self.accounts_path.exists() {
            info!(path = %self.accounts_path.display(), "no snapshot found, starting with an empty ledger");
            return Ok(Ledger::default());
        }

        let account_rows: Vec<AccountRow> = read_rows(&self.accounts_path)?;
        let mut histories: BTreeMap<u32, Vec<Transaction>> = account_rows
            .iter()
            .map(|row| (row.account_number, Vec::new()))
            .collect();

        if self.transactions_path.exists() {
            for row in read_rows::<TransactionRow>(&self.transactions_path)? {
                let history = histories.get_mut(&row.account_number).ok_or_else(|| {
                    StorageError::Inconsistent(format!(
                        "transaction for unknown account {:05}",
                        row.account_number
                    ))
                })?;
                history.push(row.into());
            }
        }

        let mut accounts = Vec::with_capacity(account_rows.len());
        for row in account_rows {
            let history = histories.remove(&row.account_number).unwrap_or_default();
            let account = Account::restore(
                row.account_number,
                row.owner_name,
                row.account_type,
                row.checkbook_issued,
                history,
            )?;
            if account.balance() != row.balance {
                return Err(StorageError::Inconsistent(format!(
                    "account {:05} records balance {} but its history ends at {}",
                    row.account_number,
                    row.balance,
                    account.balance()
                )));
            }
            accounts.push(account);
        }

        let ledger = Ledger::from_accounts(accounts)
            .map_err(|e| StorageError::Inconsistent(e.to_string()))?;
        debug!(accounts = ledger.len(), "snapshot loaded");
        Ok(ledger)
    }

    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let staged_accounts = stage_rows(
            &self.accounts_path,
            ledger.accounts().map(|account| AccountRow {
                account_number: account.number(),
                owner_name: account.owner_name().to_string(),
                account_type: account.account_type(),
                balance: account.balance(),
                checkbook_issued: account.checkbook_issued(),
            }),
        )?;
        let staged_transactions = stage_rows(
            &self.transactions_path,
            ledger.accounts().flat_map(|account| {
                account
                    .show_history()
                    .iter()
                    .map(move |transaction| TransactionRow {
                        account_number: account.number(),
                        kind: transaction.kind,
                        amount: transaction.amount,
                        resulting_balance: transaction.resulting_balance,
                        timestamp: transaction.timestamp,
                    })
            }),
        );
        let staged_transactions = match staged_transactions {
            Ok(staged) => staged,
            Err(e) => {
                let _ = fs::remove_file(&staged_accounts);
                return Err(e);
            }
        };

        // Both tables are fully written before either replaces its target.
        fs::rename(&staged_accounts, &self.accounts_path)?;
        fs::rename(&staged_transactions, &self.transactions_path)?;

        debug!(accounts = ledger.len(), "snapshot saved");
        Ok(())
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    reader
        .into_deserialize()
        .map(|row| row.map_err(StorageError::from))
        .collect()
}

/// Writes the rows to a staging file next to `path` and returns it. The
/// target itself is left untouched.
fn stage_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<PathBuf> {
    let staging = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&staging)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(staging)
}

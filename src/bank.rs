use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BankError, Result, StorageError};
use crate::fixedpoint::Amount;
use crate::transactions::{Transaction, TransactionKind};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

impl FromStr for AccountType {
    type Err = BankError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            other => Err(BankError::InvalidInput(format!(
                "unknown account type '{}', expected checking or savings",
                other
            ))),
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    number: u32,
    owner_name: String,
    account_type: AccountType,
    balance: Amount,
    checkbook_issued: bool,
    transactions: Vec<Transaction>,
}

impl Account {
    fn open(number: u32, owner_name: String, account_type: AccountType) -> Self {
        Account {
            number,
            owner_name,
            account_type,
            balance: Amount::ZERO,
            checkbook_issued: false,
            transactions: vec![Transaction::creation()],
        }
    }

    /**
     * Rebuilds an account from a persisted snapshot. The history has to
     * replay cleanly: it starts with the creation record and every entry's
     * resulting balance follows from the one before it.
     */
    pub(crate) fn restore(
        number: u32,
        owner_name: String,
        account_type: AccountType,
        checkbook_issued: bool,
        transactions: Vec<Transaction>,
    ) -> std::result::Result<Self, StorageError> {
        let inconsistent = |reason: &str| {
            StorageError::Inconsistent(format!("account {:05}: {}", number, reason))
        };

        if checkbook_issued && account_type == AccountType::Savings {
            return Err(inconsistent("savings account marked with a checkbook"));
        }

        let mut records = transactions.iter();
        match records.next() {
            Some(first)
                if first.kind == TransactionKind::Creation
                    && first.amount.is_zero()
                    && first.resulting_balance.is_zero() => {}
            _ => return Err(inconsistent("history does not start with a creation record")),
        }

        let mut balance = Amount::ZERO;
        for record in records {
            let expected = match record.kind {
                TransactionKind::Deposit => balance.checked_add(record.amount),
                TransactionKind::Withdrawal => balance.checked_sub(record.amount),
                TransactionKind::Creation => None,
            };
            if record.amount.is_zero() || expected != Some(record.resulting_balance) {
                return Err(inconsistent("history does not replay to its recorded balances"));
            }
            balance = record.resulting_balance;
        }

        Ok(Account {
            number,
            owner_name,
            account_type,
            balance,
            checkbook_issued,
            transactions,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn checkbook_issued(&self) -> bool {
        self.checkbook_issued
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<Transaction> {
        if amount.is_zero() {
            return Err(BankError::InvalidAmount(
                "deposit must be greater than zero".to_string(),
            ));
        }
        let new_balance = self.balance.checked_add(amount).ok_or_else(|| {
            BankError::InvalidAmount(format!("depositing ${} overflows the balance", amount))
        })?;

        Ok(self.record(TransactionKind::Deposit, amount, new_balance))
    }

    pub fn withdraw(&mut self, amount: Amount) -> Result<Transaction> {
        if amount.is_zero() {
            return Err(BankError::InvalidAmount(
                "withdrawal must be greater than zero".to_string(),
            ));
        }
        let new_balance =
            self.balance
                .checked_sub(amount)
                .ok_or(BankError::InsufficientFunds {
                    requested: amount,
                    available: self.balance,
                })?;

        Ok(self.record(TransactionKind::Withdrawal, amount, new_balance))
    }

    fn record(&mut self, kind: TransactionKind, amount: Amount, new_balance: Amount) -> Transaction {
        let transaction = Transaction::new(kind, amount, new_balance);
        self.balance = new_balance;
        self.transactions.push(transaction.clone());
        debug!(account = self.number, %kind, %amount, balance = %new_balance, "recorded transaction");
        transaction
    }

    pub fn show_history(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn summary(&self) -> String {
        format!(
            "{} Account {:05} ({}) Balance: ${}",
            self.account_type, self.number, self.owner_name, self.balance
        )
    }
}

/// Every account known to the bank, keyed by account number.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    accounts: BTreeMap<u32, Account>,
}

impl Ledger {
    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Result<Self> {
        let mut ledger = Ledger::default();
        for account in accounts {
            let number = account.number;
            if ledger.accounts.insert(number, account).is_some() {
                return Err(BankError::InvalidInput(format!(
                    "duplicate account number {:05}",
                    number
                )));
            }
        }
        Ok(ledger)
    }

    pub fn create_account(&mut self, owner_name: &str, account_type: AccountType) -> Result<&Account> {
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(BankError::InvalidInput(
                "owner name must not be empty".to_string(),
            ));
        }

        // One past the highest number on record; gaps are never reused.
        let number = match self.accounts.keys().next_back() {
            None => 1,
            Some(highest) => highest.checked_add(1).ok_or_else(|| {
                BankError::InvalidInput("account numbers exhausted".to_string())
            })?,
        };

        debug!(account = number, %account_type, "opening account");
        let account = self
            .accounts
            .entry(number)
            .or_insert_with(|| Account::open(number, owner_name.to_string(), account_type));
        Ok(&*account)
    }

    pub fn find_account(&self, number: u32) -> Result<&Account> {
        self.accounts
            .get(&number)
            .ok_or(BankError::AccountNotFound(number))
    }

    fn find_account_mut(&mut self, number: u32) -> Result<&mut Account> {
        self.accounts
            .get_mut(&number)
            .ok_or(BankError::AccountNotFound(number))
    }

    pub fn deposit(&mut self, number: u32, amount: Amount) -> Result<Transaction> {
        self.find_account_mut(number)?.deposit(amount)
    }

    pub fn withdraw(&mut self, number: u32, amount: Amount) -> Result<Transaction> {
        self.find_account_mut(number)?.withdraw(amount)
    }

    pub fn issue_checkbook(&mut self, number: u32) -> Result<&Account> {
        let account = self.find_account_mut(number)?;
        match (account.account_type, account.checkbook_issued) {
            (AccountType::Savings, _) => Err(BankError::UnsupportedOperation(format!(
                "account {:05} is a savings account and cannot hold a checkbook",
                number
            ))),
            (AccountType::Checking, true) => Err(BankError::AlreadyIssued(number)),
            (AccountType::Checking, false) => {
                account.checkbook_issued = true;
                debug!(account = number, "checkbook issued");
                Ok(&*account)
            }
        }
    }

    /// Accounts in ascending account number order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

use std::fmt::Display;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::fixedpoint::Amount;

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Creation,
    Deposit,
    Withdrawal,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransactionKind::Creation => "Account opened",
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
        })
    }
}

/// One immutable entry in an account's history.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub resulting_balance: Amount,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(kind: TransactionKind, amount: Amount, resulting_balance: Amount) -> Self {
        Transaction {
            kind,
            amount,
            resulting_balance,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn creation() -> Self {
        Self::new(TransactionKind::Creation, Amount::ZERO, Amount::ZERO)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} - ${} - Balance: ${}",
            self.timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            self.amount,
            self.resulting_balance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_record_is_zeroed() {
        let record = Transaction::creation();
        assert_eq!(record.kind, TransactionKind::Creation);
        assert!(record.amount.is_zero());
        assert!(record.resulting_balance.is_zero());
    }

    #[test]
    fn display_names_kind_and_balance() {
        let amount: Amount = "100".parse().unwrap();
        let record = Transaction::new(TransactionKind::Deposit, amount, amount);
        let line = record.to_string();

        assert!(line.contains(" - Deposit - $100.00 - Balance: $100.00"));
    }
}

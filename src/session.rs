use tracing::error;

use crate::activity::ActivityLog;
use crate::bank::{Account, AccountType, Ledger};
use crate::error::{BankError, Result};
use crate::fixedpoint::Amount;
use crate::storage::SnapshotStore;
use crate::transactions::Transaction;

/// Accepts zero padded numbers as printed by the bank (`00001`).
pub fn parse_account_number(text: &str) -> Result<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BankError::InvalidInput("account number is required".to_string()));
    }
    text.parse()
        .map_err(|_| BankError::InvalidInput(format!("'{}' is not an account number", text)))
}

/**
 * One operator sitting at the counter: the ledger, where it is persisted,
 * and where activity is written.
 *
 * Every mutating command is applied in memory, then the full snapshot is
 * saved, then the activity line is written. Failures are written to the
 * activity log as warnings and handed back to the caller untouched.
 */
pub struct Session {
    ledger: Ledger,
    store: SnapshotStore,
    activity: ActivityLog,
}

impl Session {
    pub fn new(ledger: Ledger, store: SnapshotStore, activity: ActivityLog) -> Self {
        Session {
            ledger,
            store,
            activity,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn create(&mut self, owner_name: &str, account_type: &str) -> Result<&Account> {
        let created = account_type
            .parse::<AccountType>()
            .and_then(|account_type| {
                self.ledger
                    .create_account(owner_name, account_type)
                    .map(|account| (account.number(), account_type))
            });

        match created {
            Ok((number, account_type)) => {
                self.persist()?;
                self.activity.info(format_args!(
                    "Created {} account {:05} for {}",
                    account_type.to_string().to_lowercase(),
                    number,
                    owner_name.trim()
                ));
                self.ledger.find_account(number)
            }
            Err(e) => {
                self.activity.warning(format_args!("Failed create: {}", e));
                Err(e)
            }
        }
    }

    pub fn deposit(&mut self, account_number: &str, amount: &str) -> Result<Transaction> {
        let result = self.balance_operation(account_number, amount, Ledger::deposit);
        self.finish_balance_operation("deposit", account_number, result, |t, number| {
            format!("Deposited ${} to account {:05}", t.amount, number)
        })
    }

    pub fn withdraw(&mut self, account_number: &str, amount: &str) -> Result<Transaction> {
        let result = self.balance_operation(account_number, amount, Ledger::withdraw);
        self.finish_balance_operation("withdraw", account_number, result, |t, number| {
            format!("Withdrew ${} from account {:05}", t.amount, number)
        })
    }

    fn balance_operation(
        &mut self,
        account_number: &str,
        amount: &str,
        operation: fn(&mut Ledger, u32, Amount) -> Result<Transaction>,
    ) -> Result<(u32, Transaction)> {
        let number = parse_account_number(account_number)?;
        // Unknown accounts are reported before a malformed amount.
        self.ledger.find_account(number)?;
        let amount: Amount = amount.parse()?;
        operation(&mut self.ledger, number, amount).map(|t| (number, t))
    }

    fn finish_balance_operation(
        &mut self,
        command: &str,
        account_number: &str,
        result: Result<(u32, Transaction)>,
        describe: impl FnOnce(&Transaction, u32) -> String,
    ) -> Result<Transaction> {
        match result {
            Ok((number, transaction)) => {
                self.persist()?;
                self.activity.info(describe(&transaction, number));
                Ok(transaction)
            }
            Err(e) => {
                self.activity.warning(format_args!(
                    "Failed {} on {}: {}",
                    command,
                    account_number.trim(),
                    e
                ));
                Err(e)
            }
        }
    }

    /// Resolves an account number typed for `command`, logging the failure
    /// when there is no such account.
    pub fn check_account(&self, command: &str, account_number: &str) -> Result<u32> {
        parse_account_number(account_number)
            .and_then(|number| self.ledger.find_account(number).map(|_| number))
            .map_err(|e| {
                self.activity.warning(format_args!(
                    "Failed {} on {}: {}",
                    command,
                    account_number.trim(),
                    e
                ));
                e
            })
    }

    pub fn show(&mut self, account_number: &str) -> Result<&Account> {
        let number = self.check_account("show", account_number)?;
        self.activity.info(format_args!("Viewed account {:05}", number));
        self.ledger.find_account(number)
    }

    pub fn issue_checkbook(&mut self, account_number: &str) -> Result<&Account> {
        let issued = parse_account_number(account_number).and_then(|number| {
            self.ledger
                .issue_checkbook(number)
                .map(|account| account.number())
        });

        match issued {
            Ok(number) => {
                self.persist()?;
                self.activity
                    .info(format_args!("Issued checkbook to account {:05}", number));
                self.ledger.find_account(number)
            }
            Err(e) => {
                self.activity.warning(format_args!(
                    "Failed checkbook on {}: {}",
                    account_number.trim(),
                    e
                ));
                Err(e)
            }
        }
    }

    /// Final save, then the goodbye line.
    pub fn exit(&mut self) -> Result<()> {
        self.persist()?;
        self.activity.info("User exited the banking system.");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.ledger).map_err(|e| {
            error!(error = %e, "could not save snapshot");
            BankError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transactions::TransactionKind;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: Config,
        session: Session,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path(), dir.path().join("bank_log.txt"));
        let session = Session::new(
            Ledger::default(),
            SnapshotStore::new(&config),
            ActivityLog::new(&config.log_file),
        );
        Fixture {
            _dir: dir,
            config,
            session,
        }
    }

    fn log_lines(config: &Config) -> Vec<String> {
        std::fs::read_to_string(&config.log_file)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn account_number_parsing() {
        assert_eq!(parse_account_number("00001").unwrap(), 1);
        assert_eq!(parse_account_number(" 42 ").unwrap(), 42);
        assert!(matches!(parse_account_number(""), Err(BankError::InvalidInput(_))));
        assert!(matches!(parse_account_number("abc"), Err(BankError::InvalidInput(_))));
        assert!(matches!(parse_account_number("-1"), Err(BankError::InvalidInput(_))));
    }

    mod create {
        use super::*;

        #[test]
        fn create_persists_and_logs() {
            let mut f = fixture();
            let number = f.session.create("Alice", "Checking").unwrap().number();

            assert_eq!(number, 1);
            let reloaded = SnapshotStore::new(&f.config).load().unwrap();
            assert_eq!(&reloaded, f.session.ledger());
            let lines = log_lines(&f.config);
            assert!(lines[0].ends_with("INFO - Created checking account 00001 for Alice"));
        }

        #[test]
        fn create_with_bad_type_changes_nothing() {
            let mut f = fixture();
            let result = f.session.create("Alice", "brokerage");

            assert!(matches!(result, Err(BankError::InvalidInput(_))));
            assert!(f.session.ledger().is_empty());
            assert!(!f.config.accounts_path().exists());
            assert!(log_lines(&f.config)[0].contains("WARNING - Failed create"));
        }
    }

    mod balance {
        use super::*;

        #[test]
        fn deposit_and_withdraw_are_logged() {
            let mut f = fixture();
            f.session.create("Alice", "checking").unwrap();
            f.session.deposit("00001", "100").unwrap();
            let withdrawal = f.session.withdraw("1", "$25.50").unwrap();

            assert_eq!(withdrawal.kind, TransactionKind::Withdrawal);
            assert_eq!(withdrawal.resulting_balance.to_string(), "74.50");
            let lines = log_lines(&f.config);
            assert!(lines[1].ends_with("INFO - Deposited $100.00 to account 00001"));
            assert!(lines[2].ends_with("INFO - Withdrew $25.50 from account 00001"));
        }

        #[test]
        fn unknown_account_reported_before_bad_amount() {
            let mut f = fixture();
            let result = f.session.deposit("9999", "not money");

            assert!(matches!(result, Err(BankError::AccountNotFound(9999))));
        }

        #[test]
        fn malformed_amount_rejected() {
            let mut f = fixture();
            f.session.create("Alice", "checking").unwrap();

            assert!(matches!(
                f.session.deposit("1", "ten dollars"),
                Err(BankError::InvalidAmount(_))
            ));
            assert!(matches!(
                f.session.withdraw("1", "-5"),
                Err(BankError::InvalidAmount(_))
            ));
            assert_eq!(f.session.ledger().find_account(1).unwrap().show_history().len(), 1);
        }

        #[test]
        fn overdraft_is_a_warning() {
            let mut f = fixture();
            f.session.create("Alice", "checking").unwrap();
            let result = f.session.withdraw("1", "1");

            assert!(matches!(result, Err(BankError::InsufficientFunds { .. })));
            let lines = log_lines(&f.config);
            assert!(lines.last().unwrap().contains("WARNING - Failed withdraw on 1: Insufficient funds"));
        }
    }

    mod checkbook {
        use super::*;

        #[test]
        fn checkbook_issue_is_persisted() {
            let mut f = fixture();
            f.session.create("Alice", "checking").unwrap();
            f.session.issue_checkbook("00001").unwrap();

            let reloaded = SnapshotStore::new(&f.config).load().unwrap();
            assert!(reloaded.find_account(1).unwrap().checkbook_issued());
            assert!(matches!(
                f.session.issue_checkbook("1"),
                Err(BankError::AlreadyIssued(1))
            ));
        }

        #[test]
        fn savings_checkbook_rejected() {
            let mut f = fixture();
            f.session.create("Bob", "savings").unwrap();

            assert!(matches!(
                f.session.issue_checkbook("1"),
                Err(BankError::UnsupportedOperation(_))
            ));
        }
    }

    #[test]
    fn check_account_logs_unknown_numbers() {
        let mut f = fixture();
        f.session.create("Alice", "checking").unwrap();

        assert_eq!(f.session.check_account("deposit", "00001").unwrap(), 1);
        assert!(matches!(
            f.session.check_account("deposit", "42"),
            Err(BankError::AccountNotFound(42))
        ));
        assert!(matches!(
            f.session.check_account("withdraw", "forty"),
            Err(BankError::InvalidInput(_))
        ));

        let lines = log_lines(&f.config);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("WARNING - Failed deposit on 42: Account 00042 not found"));
        assert!(lines[2].contains("WARNING - Failed withdraw on forty"));
    }

    #[test]
    fn show_and_exit_are_logged() {
        let mut f = fixture();
        f.session.create("Alice", "checking").unwrap();
        f.session.show("00001").unwrap();
        assert!(matches!(f.session.show("2"), Err(BankError::AccountNotFound(2))));
        f.session.exit().unwrap();

        let lines = log_lines(&f.config);
        assert!(lines[1].ends_with("INFO - Viewed account 00001"));
        assert!(lines[2].contains("WARNING - Failed show on 2"));
        assert!(lines[3].ends_with("INFO - User exited the banking system."));
    }

    #[test]
    fn unwritable_store_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let config = Config::new(&blocker, dir.path().join("bank_log.txt"));
        let mut session = Session::new(
            Ledger::default(),
            SnapshotStore::new(&config),
            ActivityLog::new(&config.log_file),
        );

        assert!(matches!(
            session.create("Alice", "checking"),
            Err(BankError::Storage(_))
        ));
    }
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::repl::write_account;
use crate::session::Session;

/// A small bank: accounts, deposits, withdrawals and checkbooks.
#[derive(Parser, Debug)]
#[clap(name = "bank-ledger", version)]
pub struct Args {
    /// Directory holding accounts.csv and transactions.csv
    #[clap(long, env = "BANK_DATA_DIR", default_value = ".", global = true)]
    pub data_dir: PathBuf,

    /// Activity log, appended to on every operation
    #[clap(long, env = "BANK_LOG_FILE", default_value = "bank_log.txt", global = true)]
    pub log_file: PathBuf,

    /// Without a subcommand the interactive prompt is started
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Open a new account
    Create {
        owner_name: String,
        /// checking or savings
        account_type: String,
    },
    /// Put money into an account
    Deposit { account_number: String, amount: String },
    /// Take money out of an account
    Withdraw { account_number: String, amount: String },
    /// Print an account summary and its history
    Show { account_number: String },
    /// Issue the checkbook of a checking account
    Checkbook { account_number: String },
    /// Print every account summary
    List,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config::new(&args.data_dir, &args.log_file)
    }
}

/// Runs a single non-interactive command. Domain errors are returned so the
/// process exits unsuccessfully.
pub fn run_command(session: &mut Session, command: &Command, output: &mut impl Write) -> Result<()> {
    match command {
        Command::Create {
            owner_name,
            account_type,
        } => {
            let account = session.create(owner_name, account_type)?;
            writeln!(output, "{}", account.summary())?;
        }
        Command::Deposit {
            account_number,
            amount,
        } => {
            let transaction = session.deposit(account_number, amount)?;
            writeln!(output, "{}", transaction)?;
        }
        Command::Withdraw {
            account_number,
            amount,
        } => {
            let transaction = session.withdraw(account_number, amount)?;
            writeln!(output, "{}", transaction)?;
        }
        Command::Show { account_number } => {
            let account = session.show(account_number)?;
            write_account(output, account)?;
        }
        Command::Checkbook { account_number } => {
            let account = session.issue_checkbook(account_number)?;
            writeln!(output, "Checkbook issued to account {:05}", account.number())?;
        }
        Command::List => {
            if session.ledger().is_empty() {
                writeln!(output, "No accounts.")?;
            }
            for account in session.ledger().accounts() {
                writeln!(output, "{}", account.summary())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityLog;
    use crate::bank::Ledger;
    use crate::error::BankError;
    use crate::storage::SnapshotStore;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bank-ledger").chain(args.iter().copied())).unwrap()
    }

    mod arguments {
        use super::*;

        #[test]
        fn defaults_to_interactive() {
            let args = parse(&[]);

            assert_eq!(args.command, None);
            assert_eq!(args.log_file, PathBuf::from("bank_log.txt"));
        }

        #[test]
        fn global_options_after_subcommand() {
            let args = parse(&["deposit", "00001", "12.50", "--data-dir", "/tmp/bank"]);

            assert_eq!(
                args.command,
                Some(Command::Deposit {
                    account_number: "00001".to_string(),
                    amount: "12.50".to_string()
                })
            );
            assert_eq!(
                Config::from(&args).accounts_path(),
                PathBuf::from("/tmp/bank/accounts.csv")
            );
        }

        #[test]
        fn create_needs_owner_and_type() {
            assert!(Args::try_parse_from(["bank-ledger", "create", "Alice"]).is_err());
        }
    }

    mod commands {
        use super::*;

        fn session_in(dir: &tempfile::TempDir) -> Session {
            let config = Config::new(dir.path(), dir.path().join("bank_log.txt"));
            Session::new(
                Ledger::default(),
                SnapshotStore::new(&config),
                ActivityLog::new(&config.log_file),
            )
        }

        fn run(session: &mut Session, args: &[&str]) -> Result<String> {
            let command = parse(args).command.unwrap();
            let mut output = Vec::new();
            run_command(session, &command, &mut output)?;
            Ok(String::from_utf8(output).unwrap())
        }

        #[test]
        fn one_shot_commands() {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session_in(&dir);

            let created = run(&mut session, &["create", "Alice", "checking"]).unwrap();
            assert_eq!(created, "Checking Account 00001 (Alice) Balance: $0.00\n");

            let deposited = run(&mut session, &["deposit", "1", "20"]).unwrap();
            assert!(deposited.contains("Deposit - $20.00 - Balance: $20.00"));

            let issued = run(&mut session, &["checkbook", "1"]).unwrap();
            assert_eq!(issued, "Checkbook issued to account 00001\n");

            let shown = run(&mut session, &["show", "00001"]).unwrap();
            assert_eq!(shown.lines().count(), 3);

            run(&mut session, &["create", "Bob", "savings"]).unwrap();
            let listed = run(&mut session, &["list"]).unwrap();
            assert_eq!(listed.lines().count(), 2);
        }

        #[test]
        fn domain_errors_propagate() {
            let dir = tempfile::tempdir().unwrap();
            let mut session = session_in(&dir);
            run(&mut session, &["create", "Alice", "checking"]).unwrap();

            let error = run(&mut session, &["withdraw", "1", "5"]).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<BankError>(),
                Some(BankError::InsufficientFunds { .. })
            ));
        }
    }
}

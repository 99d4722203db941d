use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::bank::{Account, AccountType};
use crate::error::BankError;
use crate::session::Session;

const COMMANDS: &str = "Commands: create, deposit, withdraw, show, checkbook, help, exit";

/// Interactive prompt over any line oriented input and output.
pub struct Repl<'a, R, W> {
    session: &'a mut Session,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Repl<'a, R, W> {
    pub fn new(session: &'a mut Session, input: R, output: W) -> Self {
        Repl {
            session,
            input,
            output,
        }
    }

    /// Runs until `exit` or end of input. Only storage and terminal
    /// failures end the loop early.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to the bank")?;
        writeln!(self.output, "{}", COMMANDS)?;

        loop {
            let command = match self.ask("\n> ")? {
                Some(command) => command.to_lowercase(),
                None => break,
            };

            let outcome = match command.as_str() {
                "" => Ok(()),
                "create" => self.create(),
                "deposit" => self.deposit(),
                "withdraw" => self.withdraw(),
                "show" => self.show(),
                "checkbook" => self.checkbook(),
                "help" => writeln!(self.output, "{}", COMMANDS).map_err(Into::into),
                "exit" => break,
                _ => writeln!(self.output, "Unknown command.").map_err(Into::into),
            };

            if let Err(e) = outcome {
                match e.downcast_ref::<BankError>() {
                    Some(BankError::Storage(_)) | None => return Err(e),
                    Some(bank_error) => writeln!(self.output, "Error: {}", bank_error)?,
                }
            }
        }

        self.session.exit().context("saving the ledger on exit")?;
        writeln!(self.output, "Goodbye.")?;
        Ok(())
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_or_empty(&mut self, prompt: &str) -> Result<String> {
        Ok(self.ask(prompt)?.unwrap_or_default())
    }

    fn create(&mut self) -> Result<()> {
        let owner_name = self.ask_or_empty("Owner name: ")?;
        let account_type = self.ask_or_empty("Type (savings/checking): ")?;
        let account = self.session.create(&owner_name, &account_type)?;
        let number = account.number();

        writeln!(self.output, "Assigned account number: {:05}", number)?;
        writeln!(self.output, "Account created.")?;
        Ok(())
    }

    fn deposit(&mut self) -> Result<()> {
        let account_number = self.ask_or_empty("Account number: ")?;
        self.session.check_account("deposit", &account_number)?;
        let amount = self.ask_or_empty("Amount: ")?;
        let transaction = self.session.deposit(&account_number, &amount)?;

        writeln!(
            self.output,
            "Deposit successful. Balance: ${}",
            transaction.resulting_balance
        )?;
        Ok(())
    }

    fn withdraw(&mut self) -> Result<()> {
        let account_number = self.ask_or_empty("Account number: ")?;
        self.session.check_account("withdraw", &account_number)?;
        let amount = self.ask_or_empty("Amount: ")?;
        let transaction = self.session.withdraw(&account_number, &amount)?;

        writeln!(
            self.output,
            "Withdrawal successful. Balance: ${}",
            transaction.resulting_balance
        )?;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let account_number = self.ask_or_empty("Account number: ")?;
        let account = self.session.show(&account_number)?;
        write_account(&mut self.output, account)?;

        let offer_checkbook =
            account.account_type() == AccountType::Checking && !account.checkbook_issued();
        if offer_checkbook {
            let response = self.ask_or_empty(
                "Checkbook on this checking account has not been issued. Issue checkbook? [y/n]: ",
            )?;
            if response.eq_ignore_ascii_case("y") {
                self.session.issue_checkbook(&account_number)?;
                writeln!(self.output, "Checkbook has been issued.")?;
            } else {
                writeln!(self.output, "Account checkbook remains unissued.")?;
            }
        }
        Ok(())
    }

    fn checkbook(&mut self) -> Result<()> {
        let account_number = self.ask_or_empty("Account number: ")?;
        self.session.issue_checkbook(&account_number)?;
        writeln!(self.output, "Checkbook has been issued.")?;
        Ok(())
    }
}

pub fn write_account(output: &mut impl Write, account: &Account) -> std::io::Result<()> {
    writeln!(output, "{}", account.summary())?;
    for transaction in account.show_history() {
        writeln!(output, "  {}", transaction)?;
    }
    Ok(())
}

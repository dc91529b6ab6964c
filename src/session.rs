//! Interactive driver: the main menu, the reports menu and the multi-step
//! forms. It owns no state of its own; it borrows the ledger for the whole
//! session and calls into validation, admission and execution.

use crate::{
    clock::Clock,
    compute::{Ledger, NewAccount},
    data::{Account, AccountId, Execution, ExecutionPolicy, Outcome, PendingTransfer, DISPLAY_DIGITS},
    read::Prompter,
    report::{self, Entry},
    validate,
    write::{write_accounts, write_transfers},
};
use anyhow::Result;
use serde::Serialize;
use std::io::{BufRead, Write};

const MAIN_MENU: &str = "
--- Banking System Menu ---
1. Add a new transaction
2. Execute all pending transactions
3. Execute all due transactions
4. Reports interface
5. Open a new account
6. Exit";

const REPORTS_MENU: &str = "
--- Reports Menu: ---
1. Print all bank accounts details
2. Print account details by account number
3. Print account details by ID
4. Print account details by first name
5. Print all accounts sorted by balance
6. Print all transaction history
7. Print today's transactions
8. Print accounts with negative balance
9. Print the sum of all account balances
10. Return to main menu";

const RETRY_FIELD: &str = "Please enter valid information and try again.";
const RETRY_ACCOUNT: &str = "Please enter a valid account number.";

pub(crate) struct Session<'l, R, W, C> {
    ledger: &'l mut Ledger,
    prompter: Prompter<R, W>,
    clock: C,
}

impl<'l, R: BufRead, W: Write, C: Clock> Session<'l, R, W, C> {
    pub fn new(ledger: &'l mut Ledger, input: R, output: W, clock: C) -> Self {
        Self {
            ledger,
            prompter: Prompter::new(input, output),
            clock,
        }
    }

    /// Runs the main menu until the user exits or the input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.prompter.out(), "{MAIN_MENU}")?;
            let Some(choice) = self.prompter.ask("Select an option (1-6): ")? else {
                writeln!(self.prompter.out(), "\nExiting the system.")?;
                return Ok(());
            };
            match choice.trim() {
                "1" => self.add_transaction()?,
                "2" => self.execute(ExecutionPolicy::All)?,
                "3" => self.execute(ExecutionPolicy::DueOnly)?,
                "4" => self.reports()?,
                "5" => self.open_account()?,
                "6" => {
                    writeln!(self.prompter.out(), "Exiting the system.")?;
                    return Ok(());
                }
                _ => writeln!(self.prompter.out(), "Invalid option. Please try again.")?,
            }
        }
    }

    fn add_transaction(&mut self) -> Result<()> {
        writeln!(self.prompter.out(), "\n--- Add a New Transaction ---")?;
        let ledger = &*self.ledger;
        let clock = &self.clock;

        let Outcome::Given(source) = self.prompter.ask_until(
            "Enter source account number (or type 'EX' to return to the main menu): ",
            "Please try again.",
            |input| validate::account(input, ledger),
        )?
        else {
            return Ok(());
        };
        let Outcome::Given(target) = self.prompter.ask_until(
            "Enter target account number (or type 'EX' to return to the main menu): ",
            "Please try again.",
            |input| validate::target_account(input, source, ledger),
        )?
        else {
            return Ok(());
        };
        let Outcome::Given(amount) = self.prompter.ask_until(
            "Enter amount to transfer (or type 'EX' to return to the main menu): ",
            "Please enter a valid positive number.",
            |input| validate::amount(input, source, ledger),
        )?
        else {
            return Ok(());
        };
        let created = clock.now();
        let Outcome::Given(scheduled) = self.prompter.ask_until(
            "Enter the future time for execution (YYYY-MM-DD HH:MM:SS) \
             or type 'EX' to return to the main menu: ",
            "Please try again.",
            |input| validate::future_time(input, clock.now()),
        )?
        else {
            return Ok(());
        };

        let tx = PendingTransfer {
            created,
            scheduled,
            source,
            target,
            amount,
        };
        match self.ledger.admit(tx) {
            Ok(()) => writeln!(self.prompter.out(), "Transaction added successfully.")?,
            Err(e) => writeln!(self.prompter.out(), "Error: {e}")?,
        }
        Ok(())
    }

    fn execute(&mut self, policy: ExecutionPolicy) -> Result<()> {
        let ledger = &*self.ledger;
        let Outcome::Given(id) = self.prompter.ask_until(
            "Enter the account number to execute transactions \
             (or type 'EX' to return to the main menu): ",
            RETRY_ACCOUNT,
            |input| validate::account(input, ledger),
        )?
        else {
            return Ok(());
        };

        let now = self.clock.now();
        let out = self.prompter.out();
        match self.ledger.execute(id, policy, now) {
            Ok(Execution::Executed(done)) => {
                for tx in &done {
                    writeln!(out, "Executed transaction: {tx}")?;
                }
                if let Some(account) = self.ledger.account(id) {
                    show_account(out, id, account)?;
                }
            }
            Ok(Execution::NothingExecuted) => writeln!(out, "No transactions were executed.")?,
            Err(e) => writeln!(out, "Error: {e}")?,
        }
        Ok(())
    }

    fn open_account(&mut self) -> Result<()> {
        writeln!(self.prompter.out(), "\n--- Open a New Account ---")?;

        let Outcome::Given(first_name) = self.prompter.ask_until(
            "Enter first name (or type 'EX' to return to the main menu): ",
            RETRY_FIELD,
            |input| validate::name(input, "First name"),
        )?
        else {
            return Ok(());
        };
        let Outcome::Given(last_name) = self.prompter.ask_until(
            "Enter last name (or type 'EX' to return to the main menu): ",
            RETRY_FIELD,
            |input| validate::name(input, "Last name"),
        )?
        else {
            return Ok(());
        };
        let Outcome::Given(id_number) = self.prompter.ask_until(
            "Enter ID number (or type 'EX' to return to the main menu): ",
            RETRY_FIELD,
            validate::id_number,
        )?
        else {
            return Ok(());
        };
        let Outcome::Given(balance) = self.prompter.ask_until(
            "Enter initial balance (or type 'EX' to return to the main menu): ",
            RETRY_FIELD,
            validate::initial_balance,
        )?
        else {
            return Ok(());
        };

        let id = self.ledger.open_account(NewAccount {
            first_name,
            last_name,
            id_number,
            balance,
        });
        writeln!(
            self.prompter.out(),
            "New account created successfully with account number {id}."
        )?;
        Ok(())
    }

    fn reports(&mut self) -> Result<()> {
        loop {
            writeln!(self.prompter.out(), "{REPORTS_MENU}")?;
            let Some(choice) = self.prompter.ask("Select an option (1-10): ")? else {
                return Ok(());
            };
            let ledger = &*self.ledger;
            match choice.trim() {
                "1" => {
                    let out = self.prompter.out();
                    writeln!(out, "\nAll bank accounts:")?;
                    show_accounts(out, &ledger.accounts().collect::<Vec<_>>())?;
                }
                "2" => {
                    let picked = self.prompter.ask_until(
                        "Enter account number (or type 'EX' to return to the main menu): ",
                        RETRY_ACCOUNT,
                        |input| validate::account(input, ledger),
                    )?;
                    if let Outcome::Given(id) = picked {
                        if let Some(account) = ledger.account(id) {
                            show_account(self.prompter.out(), id, account)?;
                        }
                    }
                }
                "3" => self.search(
                    "Enter ID number (or type 'EX' to return to the main menu): ",
                    "ID number does not exist.",
                    |ledger, input| report::by_id_number(ledger, input.trim()),
                )?,
                "4" => self.search(
                    "Enter first name (or type 'EX' to return to the main menu): ",
                    "First name does not exist in any account.",
                    |ledger, input| report::by_first_name(ledger, input.trim()),
                )?,
                "5" => {
                    let out = self.prompter.out();
                    writeln!(out, "\nAccounts sorted by balance:")?;
                    show_accounts(out, &report::sorted_by_balance(ledger))?;
                }
                "6" => {
                    let out = self.prompter.out();
                    writeln!(out, "\nAll transaction history:")?;
                    write_transfers(&mut *out, &report::history(ledger))?;
                }
                "7" => {
                    let today = self.clock.now().date();
                    let out = self.prompter.out();
                    writeln!(out, "\nTransactions for today ({today}):")?;
                    write_transfers(&mut *out, &report::created_on(ledger, today))?;
                }
                "8" => {
                    let out = self.prompter.out();
                    writeln!(out, "\nAccounts with negative balance:")?;
                    let negative = report::negative_balances(ledger);
                    if negative.is_empty() {
                        writeln!(out, "No account with negative balance was found.")?;
                    } else {
                        show_accounts(out, &negative)?;
                    }
                }
                "9" => {
                    let out = self.prompter.out();
                    match report::total_balance(ledger) {
                        Ok(total) => writeln!(
                            out,
                            "\nTotal balance of all accounts: {:.*}",
                            DISPLAY_DIGITS, total
                        )?,
                        Err(e) => writeln!(out, "Error: {e}")?,
                    }
                }
                "10" => {
                    writeln!(self.prompter.out(), "Returning to main menu.")?;
                    return Ok(());
                }
                _ => writeln!(self.prompter.out(), "Invalid option. Please try again.")?,
            }
        }
    }

    /// Asks for a search term until it matches at least one account.
    fn search(
        &mut self,
        question: &str,
        not_found: &str,
        find: impl for<'a> Fn(&'a Ledger, &str) -> Vec<Entry<'a>>,
    ) -> Result<()> {
        loop {
            let Some(input) = self.prompter.ask(question)? else {
                return Ok(());
            };
            if validate::is_abort(&input) {
                return Ok(());
            }
            let found = find(&*self.ledger, &input);
            let out = self.prompter.out();
            if found.is_empty() {
                writeln!(out, "Error: {not_found} Please try again.")?;
                continue;
            }
            for &(id, account) in &found {
                show_account(&mut *out, id, account)?;
            }
            return Ok(());
        }
    }
}

fn show_accounts<W: Write>(out: &mut W, accounts: &[Entry<'_>]) -> Result<()> {
    write_accounts(out, accounts)
}

/// Full state of one account: summary row, then both transfer lists.
fn show_account<W: Write>(out: &mut W, id: AccountId, account: &Account) -> Result<()> {
    writeln!(out, "\nAccount {id} details:")?;
    write_accounts(&mut *out, &[(id, account)])?;
    show_transfers(out, "Transactions to execute:", &account.pending)?;
    show_transfers(out, "Transaction history:", &account.history)
}

fn show_transfers<W: Write, T: Serialize>(out: &mut W, title: &str, list: &[T]) -> Result<()> {
    writeln!(out, "{title}")?;
    if list.is_empty() {
        writeln!(out, "(none)")?;
        return Ok(());
    }
    write_transfers(out, list)
}

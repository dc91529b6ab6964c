//! Checks run on raw user input before anything reaches the ledger.
//!
//! Each check trims its input, recognizes the abort token, and returns either
//! `Outcome::Given` with a typed value, `Outcome::Aborted`, or the `Error`
//! to show before asking again. None of them mutate the ledger.

use crate::{
    compute::Ledger,
    data::{AccountId, Error, Outcome, Timestamp, ABORT_TOKEN},
};
use rust_decimal::Decimal;
use std::str::FromStr;

type Checked<T> = Result<Outcome<T>, Error>;

pub(crate) fn is_abort(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(ABORT_TOKEN)
}

fn number<T: FromStr>(input: &str) -> Result<T, Error> {
    input
        .parse()
        .map_err(|_| Error::InvalidNumber(input.to_string()))
}

/// The identifier must be a key of the ledger.
pub(crate) fn account(input: &str, ledger: &Ledger) -> Checked<AccountId> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    let id = number(input)?;
    if ledger.account(id).is_none() {
        return Err(Error::AccountNotFound(id));
    }
    Ok(Outcome::Given(id))
}

/// Like `account`, but also refuses the transfer's own source.
pub(crate) fn target_account(input: &str, source: AccountId, ledger: &Ledger) -> Checked<AccountId> {
    match account(input, ledger)? {
        Outcome::Given(id) if id == source => Err(Error::SameSourceAndTarget),
        other => Ok(other),
    }
}

/// The amount is checked against the source balance as it is right now.
/// Nothing re-checks it when the transfer eventually executes.
pub(crate) fn amount(input: &str, source: AccountId, ledger: &Ledger) -> Checked<Decimal> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    let amount: Decimal = number(input)?;
    if amount <= Decimal::ZERO {
        return Err(Error::NonPositiveAmount);
    }
    let available = ledger
        .account(source)
        .ok_or(Error::AccountNotFound(source))?
        .balance;
    if amount > available {
        return Err(Error::InsufficientFunds { available });
    }
    Ok(Outcome::Given(amount))
}

/// The time must parse in the fixed format and lie strictly after `now`.
pub(crate) fn future_time(input: &str, now: Timestamp) -> Checked<Timestamp> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    let at: Timestamp = input.parse()?;
    if at <= now {
        return Err(Error::PastOrPresentTime);
    }
    Ok(Outcome::Given(at))
}

/// `field` names the value in the error message ("First name", "Last name").
pub(crate) fn name(input: &str, field: &'static str) -> Checked<String> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    if input.is_empty() || !input.chars().all(char::is_alphabetic) {
        return Err(Error::InvalidName(field));
    }
    Ok(Outcome::Given(input.to_string()))
}

pub(crate) fn id_number(input: &str) -> Checked<String> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidIdFormat);
    }
    Ok(Outcome::Given(input.to_string()))
}

pub(crate) fn initial_balance(input: &str) -> Checked<Decimal> {
    let input = input.trim();
    if is_abort(input) {
        return Ok(Outcome::Aborted);
    }
    let balance: Decimal = number(input)?;
    if balance < Decimal::ZERO {
        return Err(Error::NegativeBalance);
    }
    Ok(Outcome::Given(balance))
}

//! Read-only queries over a `Ledger`. Nothing here schedules, validates or
//! mutates anything.

use crate::{
    compute::Ledger,
    data::{Account, AccountId, Error, ExecutedTransfer},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(crate) type Entry<'a> = (AccountId, &'a Account);

pub(crate) fn filter<'a>(ledger: &'a Ledger, pred: impl Fn(&Account) -> bool) -> Vec<Entry<'a>> {
    ledger.accounts().filter(|(_, account)| pred(*account)).collect()
}

pub(crate) fn negative_balances(ledger: &Ledger) -> Vec<Entry<'_>> {
    filter(ledger, |account| account.balance < Decimal::ZERO)
}

/// Case-insensitive substring match on the first name.
pub(crate) fn by_first_name<'a>(ledger: &'a Ledger, needle: &str) -> Vec<Entry<'a>> {
    let needle = needle.to_lowercase();
    filter(ledger, |account| {
        account.first_name.to_lowercase().contains(&needle)
    })
}

pub(crate) fn by_id_number<'a>(ledger: &'a Ledger, id_number: &str) -> Vec<Entry<'a>> {
    filter(ledger, |account| account.id_number == id_number)
}

/// Lowest balance first; equal balances stay in identifier order.
pub(crate) fn sorted_by_balance(ledger: &Ledger) -> Vec<Entry<'_>> {
    let mut accounts: Vec<_> = ledger.accounts().collect();
    accounts.sort_by_key(|(_, account)| account.balance);
    accounts
}

pub(crate) fn total_balance(ledger: &Ledger) -> Result<Decimal, Error> {
    ledger
        .accounts()
        .try_fold(Decimal::ZERO, |sum, (_, account)| sum.checked_add(account.balance))
        .ok_or(Error::TotalOverflow)
}

/// Every executed transfer of every account, newest creation time first.
pub(crate) fn history(ledger: &Ledger) -> Vec<&ExecutedTransfer> {
    let mut transfers: Vec<_> = ledger
        .accounts()
        .flat_map(|(_, account)| account.history.iter())
        .collect();
    transfers.sort_by(|a, b| b.transfer.created.cmp(&a.transfer.created));
    transfers
}

/// Executed transfers created on `day`.
pub(crate) fn created_on(ledger: &Ledger, day: NaiveDate) -> Vec<&ExecutedTransfer> {
    ledger
        .accounts()
        .flat_map(|(_, account)| account.history.iter())
        .filter(|done| done.transfer.created.date() == day)
        .collect()
}

use crate::{
    data::{Account, AccountId, DISPLAY_DIGITS},
    report::Entry,
};
use serde::Serialize;

/// One account as shown to a user: balance at display precision, queues
/// summarized by their length.
#[derive(Serialize)]
struct AccountRow<'a> {
    account: AccountId,
    first_name: &'a str,
    last_name: &'a str,
    id_number: &'a str,
    balance: String,
    pending: usize,
    executed: usize,
}

impl<'a> From<(AccountId, &'a Account)> for AccountRow<'a> {
    fn from((account, details): (AccountId, &'a Account)) -> Self {
        Self {
            account,
            first_name: &details.first_name,
            last_name: &details.last_name,
            id_number: &details.id_number,
            balance: format!("{:.*}", DISPLAY_DIGITS, details.balance),
            pending: details.pending.len(),
            executed: details.history.len(),
        }
    }
}

/// CSV table of accounts, header included.
pub(crate) fn write_accounts<W: std::io::Write>(
    writer: W,
    accounts: &[Entry<'_>],
) -> Result<(), anyhow::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for &entry in accounts {
        wtr.serialize(AccountRow::from(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

/// CSV table of transfer records (pending or executed), in field order:
/// created, scheduled, source, target, amount, executed.
pub(crate) fn write_transfers<W, T>(writer: W, transfers: &[T]) -> Result<(), anyhow::Error>
where
    W: std::io::Write,
    T: Serialize,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transfers {
        wtr.serialize(tx)?;
    }
    wtr.flush()?;
    Ok(())
}

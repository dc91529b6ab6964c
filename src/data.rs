use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub type AccountId = u32;

/// Digits shown after the decimal point whenever money is presented to a user.
/// Balances and amounts are stored at full precision.
pub const DISPLAY_DIGITS: usize = 2;

/// The only accepted textual form of a point in time, local time, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reserved input cancelling the current multi-step operation (case-insensitive).
pub const ABORT_TOKEN: &str = "EX";

/// Identifier given to the first account of an empty ledger.
pub const FIRST_ACCOUNT_ID: AccountId = 1001;

/// A local instant with whole-second precision. It always prints and parses
/// through `TIMESTAMP_FORMAT`, so a value written out re-reads to the same
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at.trunc_subsecs(0))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| Error::MalformedTimestamp(s.to_string()))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One ledger account. Accounts are never deleted; the `pending` queue holds
/// transfers where this account is the source, oldest first, and `history` is
/// append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Account {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub balance: Decimal,
    pub pending: Vec<PendingTransfer>,
    pub history: Vec<ExecutedTransfer>,
}

impl Account {
    pub fn new(first_name: String, last_name: String, id_number: String, balance: Decimal) -> Self {
        Self {
            first_name,
            last_name,
            id_number,
            balance,
            pending: Vec::new(),
            history: Vec::new(),
        }
    }
}

/// A transfer admitted but not yet applied to balances. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "TransferRow")]
pub(crate) struct PendingTransfer {
    pub created: Timestamp,
    pub scheduled: Timestamp,
    pub source: AccountId,
    pub target: AccountId,
    pub amount: Decimal,
}

impl PendingTransfer {
    /// Consumes the pending record, stamping it with its execution time.
    pub fn executed_at(self, executed: Timestamp) -> ExecutedTransfer {
        ExecutedTransfer {
            transfer: self,
            executed,
        }
    }
}

impl fmt::Display for PendingTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {:.*})",
            self.created, self.scheduled, self.source, self.target, DISPLAY_DIGITS, self.amount
        )
    }
}

/// A transfer that has been applied; lives in the source account's history
/// and is never touched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "TransferRow")]
pub(crate) struct ExecutedTransfer {
    pub transfer: PendingTransfer,
    pub executed: Timestamp,
}

impl fmt::Display for ExecutedTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tx = &self.transfer;
        write!(
            f,
            "({}, {}, {}, {}, {:.*}, {})",
            tx.created,
            tx.scheduled,
            tx.source,
            tx.target,
            DISPLAY_DIGITS,
            tx.amount,
            self.executed
        )
    }
}

/// Flat proxy used to serialize both transfer variants with the same column
/// order: creation, schedule, source, target, amount, then execution time
/// (left empty for pending records). The amount is rendered at display
/// precision.
#[derive(Serialize)]
pub(crate) struct TransferRow {
    pub created: Timestamp,
    pub scheduled: Timestamp,
    pub source: AccountId,
    pub target: AccountId,
    pub amount: String,
    pub executed: Option<Timestamp>,
}

impl From<PendingTransfer> for TransferRow {
    fn from(tx: PendingTransfer) -> Self {
        Self {
            created: tx.created,
            scheduled: tx.scheduled,
            source: tx.source,
            target: tx.target,
            amount: format!("{:.*}", DISPLAY_DIGITS, tx.amount),
            executed: None,
        }
    }
}

impl From<ExecutedTransfer> for TransferRow {
    fn from(tx: ExecutedTransfer) -> Self {
        Self {
            executed: Some(tx.executed),
            ..tx.transfer.into()
        }
    }
}

/// Result of an interactive step: either a value, or the user typed the abort
/// token. Keeps cancellation apart from any legitimate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome<T> {
    Given(T),
    Aborted,
}

/// Which pending transfers an execution pass may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionPolicy {
    /// Everything in the queue, whatever its schedule.
    All,
    /// Only transfers scheduled at or before the current instant.
    DueOnly,
}

impl ExecutionPolicy {
    pub fn admits(self, tx: &PendingTransfer, now: Timestamp) -> bool {
        match self {
            ExecutionPolicy::All => true,
            ExecutionPolicy::DueOnly => tx.scheduled <= now,
        }
    }
}

/// What an execution pass did. "Nothing executed" is an informational
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Execution {
    Executed(Vec<ExecutedTransfer>),
    NothingExecuted,
}

/// Input-class errors. Every one of them is recoverable: the caller shows the
/// message and asks for the same field again. The ledger is never left
/// half-updated when one of these is returned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Account number {0} does not exist.")]
    AccountNotFound(AccountId),
    #[error("The source and target account numbers cannot be the same.")]
    SameSourceAndTarget,
    #[error("The amount must be a positive number.")]
    NonPositiveAmount,
    #[error("The amount exceeds the available balance. You can transfer up to {available:.2}.")]
    InsufficientFunds { available: Decimal },
    #[error("\"{0}\" does not match the format YYYY-MM-DD HH:MM:SS.")]
    MalformedTimestamp(String),
    #[error("The time entered must be in the future.")]
    PastOrPresentTime,
    #[error("{0} should only contain letters.")]
    InvalidName(&'static str),
    #[error("ID number should only contain digits.")]
    InvalidIdFormat,
    #[error("Initial balance cannot be negative.")]
    NegativeBalance,
    #[error("\"{0}\" is not a valid number.")]
    InvalidNumber(String),
    #[error("The balance of account {0} would exceed the largest amount the ledger can hold.")]
    AmountOverflow(AccountId),
    #[error("The sum of all balances exceeds the largest amount the ledger can hold.")]
    TotalOverflow,
}

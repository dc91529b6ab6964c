use crate::data::{
    Account, AccountId, Error, Execution, ExecutionPolicy, PendingTransfer, Timestamp,
    FIRST_ACCOUNT_ID,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// This is where accounts are stored. One driver owns it for the whole session
/// and lends it to each operation; there is no internal locking, so anything
/// that shares it between threads must wrap it in its own mutex.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
}

/// Already-validated fields of an account to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub balance: Decimal,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three sample accounts used at bring-up.
    pub fn seeded() -> Result<Self, Error> {
        let mut ledger = Self::new();

        let mut alice = Account::new(
            "Alice".to_string(),
            "Smith".to_string(),
            "123456789".to_string(),
            dec!(2500.50),
        );
        alice.pending = vec![
            PendingTransfer {
                created: "2024-08-17 14:00:00".parse()?,
                scheduled: "2024-08-18 14:00:00".parse()?,
                source: 1001,
                target: 1002,
                amount: dec!(300),
            },
            PendingTransfer {
                created: "2024-08-17 15:00:00".parse()?,
                scheduled: "2024-08-19 15:00:00".parse()?,
                source: 1001,
                target: 1003,
                amount: dec!(200),
            },
        ];
        alice.history = vec![PendingTransfer {
            created: "2024-08-15 09:00:00".parse()?,
            scheduled: "2024-08-15 09:30:00".parse()?,
            source: 1001,
            target: 1002,
            amount: dec!(500),
        }
        .executed_at("2024-08-15 09:30:00".parse()?)];
        ledger.insert(1001, alice);

        ledger.insert(
            1002,
            Account::new(
                "Bob".to_string(),
                "Johnson".to_string(),
                "987654321".to_string(),
                dec!(1500.00),
            ),
        );
        ledger.insert(
            1003,
            Account::new(
                "Charlie".to_string(),
                "Brown".to_string(),
                "555555555".to_string(),
                dec!(3500.75),
            ),
        );
        Ok(ledger)
    }

    pub fn insert(&mut self, id: AccountId, account: Account) {
        self.accounts.insert(id, account);
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, Error> {
        self.accounts.get_mut(&id).ok_or(Error::AccountNotFound(id))
    }

    /// All accounts in identifier order.
    pub fn accounts(&self) -> impl Iterator<Item = (AccountId, &Account)> {
        self.accounts.iter().map(|(id, account)| (*id, account))
    }

    /// One past the highest identifier in use.
    pub fn next_account_id(&self) -> AccountId {
        self.accounts
            .keys()
            .next_back()
            .map_or(FIRST_ACCOUNT_ID, |last| last + 1)
    }

    pub fn open_account(&mut self, new: NewAccount) -> AccountId {
        let id = self.next_account_id();
        info!(account = id, balance = %new.balance, "account opened");
        self.insert(
            id,
            Account::new(new.first_name, new.last_name, new.id_number, new.balance),
        );
        id
    }

    /// Queues a transfer on its source account. Balances are not touched.
    pub fn admit(&mut self, tx: PendingTransfer) -> Result<(), Error> {
        if tx.source == tx.target {
            return Err(Error::SameSourceAndTarget);
        }
        if self.account(tx.target).is_none() {
            return Err(Error::AccountNotFound(tx.target));
        }
        let source = self.account_mut(tx.source)?;
        source.pending.push(tx);
        info!(
            source = tx.source,
            target = tx.target,
            amount = %tx.amount,
            scheduled = %tx.scheduled,
            "transfer queued"
        );
        Ok(())
    }

    /// Runs one pass over the pending queue of `id`, in queue order. Only
    /// transfers whose source is `id` are considered; being the target of
    /// someone else's pending transfer does not make it run here.
    ///
    /// Balances are not checked again: a queue that was admitted against the
    /// same funds several times can leave the source negative.
    pub fn execute(
        &mut self,
        id: AccountId,
        policy: ExecutionPolicy,
        now: Timestamp,
    ) -> Result<Execution, Error> {
        let account = self.account(id).ok_or(Error::AccountNotFound(id))?;
        let (eligible, waiting): (Vec<_>, Vec<_>) = account
            .pending
            .iter()
            .copied()
            .partition(|tx| policy.admits(tx, now));

        // Work the whole pass out on copies of the balances first, so that a
        // missing counterpart or an overflow leaves the ledger untouched.
        let mut balances: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        for tx in &eligible {
            for party in [tx.source, tx.target] {
                let account = self.account(party).ok_or(Error::AccountNotFound(party))?;
                balances.entry(party).or_insert(account.balance);
            }
            let debited = balances[&tx.source]
                .checked_sub(tx.amount)
                .ok_or(Error::AmountOverflow(tx.source))?;
            balances.insert(tx.source, debited);
            let credited = balances[&tx.target]
                .checked_add(tx.amount)
                .ok_or(Error::AmountOverflow(tx.target))?;
            balances.insert(tx.target, credited);
        }
        for tx in &waiting {
            debug!(source = tx.source, scheduled = %tx.scheduled, "transfer not due yet");
        }

        let mut executed = Vec::with_capacity(eligible.len());
        for tx in eligible {
            let done = tx.executed_at(now);
            self.account_mut(id)?.history.push(done);
            info!(
                source = tx.source,
                target = tx.target,
                amount = %tx.amount,
                "transfer executed"
            );
            executed.push(done);
        }
        for (party, balance) in balances {
            if balance < Decimal::ZERO {
                warn!(account = party, balance = %balance, "balance went negative");
            }
            self.account_mut(party)?.balance = balance;
        }
        self.account_mut(id)?.pending = waiting;

        if executed.is_empty() {
            Ok(Execution::NothingExecuted)
        } else {
            Ok(Execution::Executed(executed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ledger, NewAccount};
    use crate::data::{Account, Error, Execution, ExecutionPolicy::*, PendingTransfer, Timestamp};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn two_accounts() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.insert(
            1,
            Account::new("Ann".into(), "Lee".into(), "1".into(), dec!(1000)),
        );
        ledger.insert(
            2,
            Account::new("Ben".into(), "Ray".into(), "2".into(), dec!(500)),
        );
        ledger
    }

    fn transfer(source: u32, target: u32, amount: rust_decimal::Decimal, due: &str) -> PendingTransfer {
        PendingTransfer {
            created: at("2030-01-01 00:00:00"),
            scheduled: at(due),
            source,
            target,
            amount,
        }
    }

    #[test]
    fn test_seeded() {
        let ledger = Ledger::seeded().unwrap();
        assert_eq!(ledger.accounts().count(), 3);
        let alice = ledger.account(1001).unwrap();
        assert_eq!(alice.balance, dec!(2500.50));
        assert_eq!(alice.pending.len(), 2);
        assert_eq!(alice.history.len(), 1);
        assert_eq!(ledger.account(1003).unwrap().balance, dec!(3500.75));
        assert_eq!(ledger.next_account_id(), 1004);
    }

    #[test]
    fn test_admit_leaves_balances_alone() {
        let mut ledger = two_accounts();
        let tx = transfer(1, 2, dec!(300), "2030-06-01 00:00:00");
        ledger.admit(tx).unwrap();
        assert_eq!(ledger.account(1).unwrap().balance, dec!(1000));
        assert_eq!(ledger.account(2).unwrap().balance, dec!(500));
        assert_eq!(ledger.account(1).unwrap().pending, [tx]);
        assert!(ledger.account(2).unwrap().pending.is_empty());
    }

    #[test]
    fn test_admit_rejects_bad_parties() {
        let mut ledger = two_accounts();
        assert_eq!(
            ledger.admit(transfer(1, 1, dec!(1), "2030-06-01 00:00:00")),
            Err(Error::SameSourceAndTarget)
        );
        assert_eq!(
            ledger.admit(transfer(1, 7, dec!(1), "2030-06-01 00:00:00")),
            Err(Error::AccountNotFound(7))
        );
        assert_eq!(
            ledger.admit(transfer(7, 1, dec!(1), "2030-06-01 00:00:00")),
            Err(Error::AccountNotFound(7))
        );
        assert!(ledger.account(1).unwrap().pending.is_empty());
    }

    #[test]
    fn test_execute_due() {
        let mut ledger = two_accounts();
        ledger
            .admit(transfer(1, 2, dec!(300), "2030-01-01 10:00:00"))
            .unwrap();
        let now = at("2030-01-02 00:00:00");
        let outcome = ledger.execute(1, DueOnly, now).unwrap();
        let Execution::Executed(done) = outcome else {
            panic!("expected an execution");
        };
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].executed, now);
        assert_eq!(ledger.account(1).unwrap().balance, dec!(700));
        assert_eq!(ledger.account(2).unwrap().balance, dec!(800));
        assert!(ledger.account(1).unwrap().pending.is_empty());
        assert_eq!(ledger.account(1).unwrap().history, done);
        assert!(ledger.account(2).unwrap().history.is_empty());
    }

    #[test]
    fn test_execute_due_is_idempotent() {
        let mut ledger = two_accounts();
        ledger
            .admit(transfer(1, 2, dec!(300), "2030-01-01 10:00:00"))
            .unwrap();
        let now = at("2030-01-02 00:00:00");
        assert!(matches!(
            ledger.execute(1, DueOnly, now),
            Ok(Execution::Executed(_))
        ));
        assert_eq!(ledger.execute(1, DueOnly, now), Ok(Execution::NothingExecuted));
        assert_eq!(ledger.account(1).unwrap().balance, dec!(700));
        assert_eq!(ledger.account(1).unwrap().history.len(), 1);
    }

    #[test]
    fn test_execute_due_keeps_future_transfers() {
        let mut ledger = two_accounts();
        let early = transfer(1, 2, dec!(100), "2030-01-01 10:00:00");
        let late = transfer(1, 2, dec!(200), "2030-03-01 10:00:00");
        ledger.admit(late).unwrap();
        ledger.admit(early).unwrap();
        ledger
            .execute(1, DueOnly, at("2030-02-01 00:00:00"))
            .unwrap();
        assert_eq!(ledger.account(1).unwrap().pending, [late]);
        assert_eq!(ledger.account(1).unwrap().balance, dec!(900));
        assert_eq!(ledger.account(2).unwrap().balance, dec!(600));
    }

    #[test]
    fn test_execute_all_ignores_schedule_and_keeps_order() {
        let mut ledger = two_accounts();
        let queued = [
            transfer(1, 2, dec!(10), "2031-01-01 00:00:00"),
            transfer(1, 2, dec!(20), "2030-06-01 00:00:00"),
            transfer(1, 2, dec!(30), "2032-01-01 00:00:00"),
        ];
        for tx in queued {
            ledger.admit(tx).unwrap();
        }
        let now = at("2030-01-02 00:00:00");
        ledger.execute(1, All, now).unwrap();
        let history: Vec<_> = ledger
            .account(1)
            .unwrap()
            .history
            .iter()
            .map(|done| done.transfer)
            .collect();
        assert_eq!(history, queued);
        assert_eq!(ledger.account(1).unwrap().balance, dec!(940));
        assert_eq!(ledger.account(2).unwrap().balance, dec!(560));
    }

    #[test]
    fn test_execute_can_overdraw() {
        let mut ledger = two_accounts();
        // Each admitted against the full 1000 balance.
        ledger
            .admit(transfer(1, 2, dec!(800), "2030-01-01 10:00:00"))
            .unwrap();
        ledger
            .admit(transfer(1, 2, dec!(700), "2030-01-01 11:00:00"))
            .unwrap();
        ledger
            .execute(1, All, at("2030-01-02 00:00:00"))
            .unwrap();
        assert_eq!(ledger.account(1).unwrap().balance, dec!(-500));
        assert_eq!(ledger.account(2).unwrap().balance, dec!(2000));
    }

    #[test]
    fn test_execute_is_source_scoped() {
        let mut ledger = two_accounts();
        ledger
            .admit(transfer(1, 2, dec!(300), "2030-01-01 10:00:00"))
            .unwrap();
        assert_eq!(
            ledger.execute(2, All, at("2030-01-02 00:00:00")),
            Ok(Execution::NothingExecuted)
        );
        assert_eq!(ledger.account(1).unwrap().pending.len(), 1);
        assert_eq!(ledger.account(2).unwrap().balance, dec!(500));
    }

    #[test]
    fn test_execute_unknown_account() {
        let mut ledger = two_accounts();
        assert_eq!(
            ledger.execute(42, All, at("2030-01-02 00:00:00")),
            Err(Error::AccountNotFound(42))
        );
    }

    #[test]
    fn test_execute_missing_target_applies_nothing() {
        let mut ledger = two_accounts();
        let good = transfer(1, 2, dec!(10), "2030-01-01 10:00:00");
        let orphan = transfer(1, 9, dec!(20), "2030-01-01 10:00:00");
        ledger.account_mut(1).unwrap().pending = vec![good, orphan];
        assert_eq!(
            ledger.execute(1, All, at("2030-01-02 00:00:00")),
            Err(Error::AccountNotFound(9))
        );
        assert_eq!(ledger.account(1).unwrap().balance, dec!(1000));
        assert_eq!(ledger.account(1).unwrap().pending, [good, orphan]);
    }

    #[test]
    fn test_execute_overflow_applies_nothing() {
        let mut ledger = two_accounts();
        ledger.insert(
            3,
            Account::new("Cy".into(), "Max".into(), "3".into(), Decimal::MAX),
        );
        let tx = transfer(3, 2, Decimal::MAX, "2030-01-01 10:00:00");
        ledger.admit(tx).unwrap();
        assert_eq!(
            ledger.execute(3, All, at("2030-01-02 00:00:00")),
            Err(Error::AmountOverflow(2))
        );
        assert_eq!(ledger.account(3).unwrap().balance, Decimal::MAX);
        assert_eq!(ledger.account(2).unwrap().balance, dec!(500));
        assert_eq!(ledger.account(3).unwrap().pending, [tx]);
        assert!(ledger.account(3).unwrap().history.is_empty());
    }

    #[test]
    fn test_open_account() {
        let mut ledger = two_accounts();
        let id = ledger.open_account(NewAccount {
            first_name: "Cleo".into(),
            last_name: "Park".into(),
            id_number: "77".into(),
            balance: dec!(12.5),
        });
        assert_eq!(id, 3);
        let account = ledger.account(3).unwrap();
        assert_eq!(account.balance, dec!(12.5));
        assert!(account.pending.is_empty());
        assert!(account.history.is_empty());
        assert_eq!(ledger.next_account_id(), 4);
    }

    #[test]
    fn test_open_first_account() {
        let mut ledger = Ledger::new();
        let id = ledger.open_account(NewAccount {
            first_name: "Cleo".into(),
            last_name: "Park".into(),
            id_number: "77".into(),
            balance: dec!(0),
        });
        assert_eq!(id, 1001);
    }
}

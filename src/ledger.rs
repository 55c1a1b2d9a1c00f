//! The honor-point ledger: a balance table plus an append-only audit
//! history.  All writes go through [`Ledger::credit`] and
//! [`Ledger::debit`]; every accepted mutation persists both resources
//! before returning, so on-disk state never lags a confirmed command.

use crate::store::{Store, StoreError};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("you cannot grant honor points to yourself")]
    SelfTarget,
    #[error("{name} does not have enough honor points")]
    InsufficientBalance { name: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A command participant.  Ids and display names are resolved by the
/// platform layer before they reach the ledger; the ledger itself never
/// talks to Discord.
pub struct Actor {
    pub id: String,
    pub name: String,
}

pub struct Ledger {
    balances: HashMap<String, i64>,
    history: Vec<String>,
    store: Store,
}

impl Ledger {
    pub async fn load(store: Store) -> Result<Self, StoreError> {
        let balances = store.load_balances().await?;
        let history = store.load_history().await;
        Ok(Self {
            balances,
            history,
            store,
        })
    }

    pub fn balance(&self, id: &str) -> Option<i64> {
        self.balances.get(id).copied()
    }

    /// Grant `amount` points from `granter` to `recipient`.  Returns the
    /// recipient's new total.
    ///
    /// The amount's sign is deliberately unconstrained; a negative grant
    /// quietly lowers the balance without the entry-removal rule that
    /// debits apply.  Inherited source behavior, kept as is.
    pub async fn credit(
        &mut self,
        granter: &Actor,
        recipient: &Actor,
        amount: i64,
    ) -> Result<i64, LedgerError> {
        if granter.id == recipient.id {
            return Err(LedgerError::SelfTarget);
        }

        let balance = self.balances.entry(recipient.id.clone()).or_insert(0);
        *balance += amount;
        let balance = *balance;

        self.history.push(format!(
            "{} - {} granted {} points to {}",
            now_stamp(),
            granter.name,
            amount,
            recipient.name,
        ));

        self.persist().await?;
        Ok(balance)
    }

    /// Deduct `amount` points from `recipient`.  Returns the remaining
    /// total, which is 0 when the entry was removed.
    ///
    /// Callers are responsible for the privileged-role check; the ledger
    /// assumes it already passed.
    pub async fn debit(
        &mut self,
        remover: &Actor,
        recipient: &Actor,
        amount: i64,
    ) -> Result<i64, LedgerError> {
        let remaining = match self.balances.get_mut(&recipient.id) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                *balance
            }
            _ => {
                return Err(LedgerError::InsufficientBalance {
                    name: recipient.name.clone(),
                })
            }
        };

        // Non-positive totals are removed outright, never stored as zero.
        if remaining <= 0 {
            self.balances.remove(&recipient.id);
        }

        self.history.push(format!(
            "{} - {} deducted {} points from {}",
            now_stamp(),
            remover.name,
            amount,
            recipient.name,
        ));

        self.persist().await?;
        Ok(remaining.max(0))
    }

    /// Top balances, highest first, at most `limit` entries.  Ties are
    /// broken by user id so the ordering is reproducible.
    pub fn rank(&self, limit: usize) -> Vec<(String, i64)> {
        let mut ranked: Vec<(String, i64)> = self
            .balances
            .iter()
            .map(|(id, points)| (id.clone(), *points))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// The last `limit` audit lines in insertion order, optionally only
    /// those containing `filter`.  An empty result is not an error; the
    /// presentation layer renders its own "no records" message.
    pub fn history(&self, filter: Option<&str>, limit: usize) -> Vec<&str> {
        let matching: Vec<&str> = self
            .history
            .iter()
            .map(String::as_str)
            .filter(|line| filter.map_or(true, |f| line.contains(f)))
            .collect();
        let start = matching.len().saturating_sub(limit);
        matching[start..].to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.store.save_balances(&self.balances).await?;
        self.store.save_history(&self.history).await
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn actor(id: &str, name: &str) -> Actor {
        Actor {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    async fn empty_ledger() -> (Ledger, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(Store::new(dir.path())).await.unwrap();
        (ledger, dir)
    }

    #[tokio::test]
    async fn grants_accumulate() {
        let (mut ledger, _dir) = empty_ledger().await;
        let alice = actor("1", "alice");
        let bob = actor("2", "bob");

        assert_eq!(ledger.credit(&alice, &bob, 10).await.unwrap(), 10);
        assert_eq!(ledger.credit(&alice, &bob, 5).await.unwrap(), 15);

        assert_eq!(ledger.balance("2"), Some(15));
        assert_eq!(ledger.history_len(), 2);
        assert!(ledger
            .history(Some("bob"), 10)
            .iter()
            .all(|line| line.contains("granted") && line.contains("bob")));
    }

    #[tokio::test]
    async fn self_grant_is_rejected_without_mutation() {
        let (mut ledger, _dir) = empty_ledger().await;
        let alice = actor("1", "alice");
        let also_alice = actor("1", "alice");

        match ledger.credit(&alice, &also_alice, 10).await {
            Err(LedgerError::SelfTarget) => {}
            other => panic!("expected SelfTarget, got {:?}", other.map(|_| ())),
        }
        assert_eq!(ledger.balance("1"), None);
        assert_eq!(ledger.history_len(), 0);
    }

    #[tokio::test]
    async fn debit_to_zero_removes_the_entry() {
        let (mut ledger, _dir) = empty_ledger().await;
        let alice = actor("1", "alice");
        let bob = actor("2", "bob");
        let staff = actor("9", "staff");

        ledger.credit(&alice, &bob, 5).await.unwrap();
        assert_eq!(ledger.debit(&staff, &bob, 5).await.unwrap(), 0);

        // Removed entirely, not retained as zero.
        assert_eq!(ledger.balance("2"), None);
        assert_eq!(ledger.history_len(), 2);
    }

    #[tokio::test]
    async fn overdraft_debit_leaves_state_untouched() {
        let (mut ledger, _dir) = empty_ledger().await;
        let alice = actor("1", "alice");
        let bob = actor("2", "bob");
        let staff = actor("9", "staff");

        ledger.credit(&alice, &bob, 5).await.unwrap();
        match ledger.debit(&staff, &bob, 10).await {
            Err(LedgerError::InsufficientBalance { name }) => assert_eq!(name, "bob"),
            other => panic!("expected InsufficientBalance, got {:?}", other.map(|_| ())),
        }

        assert_eq!(ledger.balance("2"), Some(5));
        assert_eq!(ledger.history_len(), 1);
    }

    #[tokio::test]
    async fn debit_without_an_entry_fails() {
        let (mut ledger, _dir) = empty_ledger().await;
        let staff = actor("9", "staff");
        let bob = actor("2", "bob");

        assert!(matches!(
            ledger.debit(&staff, &bob, 1).await,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.history_len(), 0);
    }

    #[tokio::test]
    async fn rank_sorts_descending_with_stable_ties() {
        let (mut ledger, _dir) = empty_ledger().await;
        let granter = actor("0", "granter");

        ledger.credit(&granter, &actor("3", "carol"), 5).await.unwrap();
        ledger.credit(&granter, &actor("1", "alice"), 10).await.unwrap();
        ledger.credit(&granter, &actor("2", "bob"), 5).await.unwrap();

        let ranked = ledger.rank(10);
        assert_eq!(
            ranked,
            vec![
                ("1".to_string(), 10),
                ("2".to_string(), 5),
                ("3".to_string(), 5),
            ]
        );

        assert_eq!(ledger.rank(2).len(), 2);
    }

    #[tokio::test]
    async fn history_returns_the_filtered_tail() {
        let (mut ledger, _dir) = empty_ledger().await;
        let granter = actor("0", "granter");
        let bob = actor("2", "bob");
        let carol = actor("3", "carol");

        for n in 1..=3 {
            ledger.credit(&granter, &bob, n).await.unwrap();
        }
        ledger.credit(&granter, &carol, 7).await.unwrap();

        let all = ledger.history(None, 2);
        assert_eq!(all.len(), 2);
        assert!(all[0].contains("granted 3 points to bob"));
        assert!(all[1].contains("granted 7 points to carol"));

        let bobs = ledger.history(Some("bob"), 10);
        assert_eq!(bobs.len(), 3);
        assert!(bobs.iter().all(|line| line.contains("bob")));

        assert!(ledger.history(Some("nobody"), 10).is_empty());
    }

    #[tokio::test]
    async fn mutations_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut ledger = Ledger::load(Store::new(dir.path())).await.unwrap();
            let alice = actor("1", "alice");
            let bob = actor("2", "bob");
            ledger.credit(&alice, &bob, 12).await.unwrap();
        }

        let reloaded = Ledger::load(Store::new(dir.path())).await.unwrap();
        assert_eq!(reloaded.balance("2"), Some(12));
        assert_eq!(reloaded.history_len(), 1);
        assert!(reloaded.history(None, 10)[0].contains("granted 12 points to bob"));
    }
}

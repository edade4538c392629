//! The event ledger proper.

use std::collections::{HashMap, HashSet};

use borsh::{BorshDeserialize, BorshSerialize};
use parking_lot::RwLock;
use tracing::*;
use trestle_bridge_types::{StakeEventKind, StakeLinkingFact};
use trestle_checkpoint::{
    Component, ComponentName, LoadContext, SnapshotError, StateProvider,
};
use trestle_primitives::{hash, Buf32, U256};

use crate::errors::{LedgerError, LedgerResult};

const SNAPSHOT_KEY: &str = "accounting";

#[derive(Default)]
struct Inner {
    /// Parties in first-seen order; fixes the balance hash ordering.
    parties: Vec<String>,

    /// Per-party facts, kept sorted by replay key.
    facts: HashMap<String, Vec<StakeLinkingFact>>,

    /// Running balances, refolded on every insert.
    balances: HashMap<String, U256>,

    /// Every fact id ever stored. Never evicted.
    ids: HashSet<String>,
}

/// Per-party ledger of stake linking facts with point-in-time and
/// ranged balance queries.
pub struct EventLedger {
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for EventLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("EventLedger")
            .field("parties", &inner.parties.len())
            .field("facts", &inner.ids.len())
            .finish()
    }
}

impl Default for EventLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Inserts a witnessed fact under the party's entry and refolds the
    /// running balance.
    ///
    /// Facts are kept sorted by `(timestamp, Deposited before Removed)`
    /// so a same-timestamp deposit-then-withdraw nets correctly
    /// regardless of arrival order. A fold that would go negative
    /// returns [`LedgerError::NegativeBalance`] without discarding the
    /// fact; the balance holds at its pre-negative value.
    pub fn add_event(&self, party: &str, fact: StakeLinkingFact) -> LedgerResult<()> {
        fact.validate()?;
        if fact.party != party {
            return Err(LedgerError::PartyMismatch {
                expected: party.to_owned(),
                got: fact.party.clone(),
            });
        }

        let mut inner = self.inner.write();
        if !inner.ids.insert(fact.id.clone()) {
            return Err(LedgerError::DuplicateEvent(fact.id));
        }

        if !inner.facts.contains_key(party) {
            inner.parties.push(party.to_owned());
            inner.facts.insert(party.to_owned(), Vec::new());
        }
        let facts = inner.facts.get_mut(party).expect("ledger: entry ensured");
        let key = fact.replay_key();
        let pos = facts.partition_point(|f| f.replay_key() <= key);
        facts.insert(pos, fact);

        let (balance, ok) = fold_balance(facts.iter());
        inner.balances.insert(party.to_owned(), balance);
        if !ok {
            debug!(%party, %balance, "stake fold went negative, holding balance");
            return Err(LedgerError::NegativeBalance(party.to_owned()));
        }
        Ok(())
    }

    /// Current available balance for the party, zero if unknown.
    pub fn available_balance(&self, party: &str) -> U256 {
        self.inner
            .read()
            .balances
            .get(party)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Balance folding only facts with `timestamp <= t`.
    pub fn available_balance_at(&self, party: &str, t: i64) -> U256 {
        let inner = self.inner.read();
        let Some(facts) = inner.facts.get(party) else {
            return U256::ZERO;
        };
        fold_balance(facts.iter().filter(|f| f.timestamp <= t)).0
    }

    /// The minimum balance the party held over `(from, to]`, starting
    /// from the balance at `from`. Guarantees the party held at least
    /// the returned stake throughout the window.
    pub fn available_balance_in_range(&self, party: &str, from: i64, to: i64) -> U256 {
        let inner = self.inner.read();
        let Some(facts) = inner.facts.get(party) else {
            return U256::ZERO;
        };

        let mut balance = fold_balance(facts.iter().filter(|f| f.timestamp <= from)).0;
        let mut min = balance;
        for fact in facts.iter().filter(|f| f.timestamp > from && f.timestamp <= to) {
            balance = match apply(balance, fact) {
                Some(b) => b,
                // Hold at pre-negative value, same as the stored fold.
                None => break,
            };
            if balance < min {
                min = balance;
            }
        }
        min
    }

    /// Deterministic hash over every party's balance, in first-seen
    /// party order, for cross-validator comparison.
    pub fn balance_hash(&self) -> Buf32 {
        let inner = self.inner.read();
        let pairs: Vec<(&String, U256)> = inner
            .parties
            .iter()
            .map(|p| (p, inner.balances.get(p).copied().unwrap_or(U256::ZERO)))
            .collect();
        hash::sha256_borsh(&pairs)
    }

    fn snapshot_payload(&self) -> LedgerSnapshot {
        let inner = self.inner.read();
        LedgerSnapshot {
            parties: inner
                .parties
                .iter()
                .map(|p| PartyFacts {
                    party: p.clone(),
                    facts: inner.facts.get(p).cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }

    fn restore_payload(&self, snapshot: LedgerSnapshot) {
        let mut inner = self.inner.write();
        *inner = Inner::default();
        for entry in snapshot.parties {
            let (balance, _) = fold_balance(entry.facts.iter());
            for fact in &entry.facts {
                inner.ids.insert(fact.id.clone());
            }
            inner.parties.push(entry.party.clone());
            inner.balances.insert(entry.party.clone(), balance);
            inner.facts.insert(entry.party, entry.facts);
        }
    }
}

/// Folds facts in stored order. Returns the balance and whether the
/// fold completed without going negative; on violation the balance is
/// the value before the offending fact.
fn fold_balance<'a>(facts: impl Iterator<Item = &'a StakeLinkingFact>) -> (U256, bool) {
    let mut balance = U256::ZERO;
    for fact in facts {
        match apply(balance, fact) {
            Some(b) => balance = b,
            None => return (balance, false),
        }
    }
    (balance, true)
}

fn apply(balance: U256, fact: &StakeLinkingFact) -> Option<U256> {
    match fact.kind {
        StakeEventKind::Deposited => balance.checked_add(fact.amount),
        StakeEventKind::Removed => balance.checked_sub(fact.amount),
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct PartyFacts {
    party: String,
    facts: Vec<StakeLinkingFact>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct LedgerSnapshot {
    parties: Vec<PartyFacts>,
}

impl StateProvider for EventLedger {
    fn namespace(&self) -> &'static str {
        "staking"
    }

    fn keys(&self) -> Vec<String> {
        vec![SNAPSHOT_KEY.to_owned()]
    }

    fn get_state(&self, key: &str) -> Result<Vec<u8>, SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        borsh::to_vec(&self.snapshot_payload())
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))
    }

    fn load_state(&mut self, key: &str, payload: &[u8]) -> Result<(), SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let snapshot: LedgerSnapshot = borsh::from_slice(payload)
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;
        self.restore_payload(snapshot);
        Ok(())
    }
}

impl Component for EventLedger {
    fn name(&self) -> ComponentName {
        ComponentName::Staking
    }

    fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.get_state(SNAPSHOT_KEY)?)
    }

    fn load(&mut self, data: &[u8], _ctx: &mut LoadContext) -> anyhow::Result<()> {
        self.load_state(SNAPSHOT_KEY, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trestle_bridge_types::StakeStatus;

    use super::*;

    fn fact(id: &str, kind: StakeEventKind, amount: u64, ts: i64) -> StakeLinkingFact {
        StakeLinkingFact {
            id: id.to_owned(),
            party: "p1".to_owned(),
            kind,
            amount: U256::from(amount),
            timestamp: ts,
            block_height: 1,
            log_index: 0,
            tx_hash: Buf32::from([1; 32]),
            status: StakeStatus::Accepted,
            finalized_at: ts,
        }
    }

    fn deposit(id: &str, amount: u64, ts: i64) -> StakeLinkingFact {
        fact(id, StakeEventKind::Deposited, amount, ts)
    }

    fn removal(id: &str, amount: u64, ts: i64) -> StakeLinkingFact {
        fact(id, StakeEventKind::Removed, amount, ts)
    }

    /// Ledger loaded with the reference fold fixture.
    fn reference_ledger() -> EventLedger {
        let ledger = EventLedger::new();
        ledger.add_event("p1", deposit("e1", 10, 100)).unwrap();
        ledger.add_event("p1", removal("e2", 1, 105)).unwrap();
        ledger.add_event("p1", deposit("e3", 3, 106)).unwrap();
        ledger.add_event("p1", removal("e4", 4, 107)).unwrap();
        ledger.add_event("p1", deposit("e5", 5, 120)).unwrap();
        ledger.add_event("p1", removal("e6", 6, 125)).unwrap();
        ledger
    }

    #[test]
    fn test_balance_fold_reference_vectors() {
        let ledger = reference_ledger();
        assert_eq!(ledger.available_balance_at("p1", 10), U256::ZERO);
        assert_eq!(ledger.available_balance_at("p1", 120), U256::from(13u64));
        assert_eq!(ledger.available_balance("p1"), U256::from(7u64));
        // Minimum balance observed over the window, not the final one.
        assert_eq!(
            ledger.available_balance_in_range("p1", 101, 109),
            U256::from(8u64)
        );
        assert_eq!(
            ledger.available_balance_in_range("p1", 101, 126),
            U256::from(7u64)
        );
    }

    #[test]
    fn test_unknown_party_is_zero() {
        let ledger = reference_ledger();
        assert_eq!(ledger.available_balance("nobody"), U256::ZERO);
        assert_eq!(ledger.available_balance_at("nobody", 1000), U256::ZERO);
        assert_eq!(
            ledger.available_balance_in_range("nobody", 0, 1000),
            U256::ZERO
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let ledger = EventLedger::new();
        ledger.add_event("p1", deposit("e1", 10, 100)).unwrap();
        assert_eq!(
            ledger.add_event("p1", deposit("e1", 20, 200)),
            Err(LedgerError::DuplicateEvent("e1".to_owned()))
        );
        assert_eq!(ledger.available_balance("p1"), U256::from(10u64));
    }

    #[test]
    fn test_malformed_rejected() {
        let ledger = EventLedger::new();
        let mut f = deposit("e1", 0, 100);
        f.amount = U256::ZERO;
        assert!(matches!(
            ledger.add_event("p1", f),
            Err(LedgerError::InvalidFact(_))
        ));

        let f = deposit("e2", 10, 100);
        assert!(matches!(
            ledger.add_event("p2", f),
            Err(LedgerError::PartyMismatch { .. })
        ));
    }

    #[test]
    fn test_same_timestamp_deposit_sorts_before_removal() {
        // Removal arrives first; the sort still nets it after the
        // deposit so the fold never goes negative.
        let ledger = EventLedger::new();
        assert_eq!(
            ledger.add_event("p1", removal("e1", 5, 100)),
            Err(LedgerError::NegativeBalance("p1".to_owned()))
        );
        ledger.add_event("p1", deposit("e2", 5, 100)).unwrap();
        assert_eq!(ledger.available_balance("p1"), U256::ZERO);
    }

    #[test]
    fn test_negative_fold_holds_and_corrects() {
        let ledger = EventLedger::new();
        // Removal observed before the deposit that funds it.
        assert_eq!(
            ledger.add_event("p1", removal("e1", 5, 200)),
            Err(LedgerError::NegativeBalance("p1".to_owned()))
        );
        // Held at the pre-negative state.
        assert_eq!(ledger.available_balance("p1"), U256::ZERO);

        // The earlier deposit arrives; the stored removal re-derives a
        // valid order.
        ledger.add_event("p1", deposit("e2", 8, 100)).unwrap();
        assert_eq!(ledger.available_balance("p1"), U256::from(3u64));
    }

    #[test]
    fn test_balance_hash_deterministic_and_order_sensitive() {
        let a = reference_ledger();
        let b = reference_ledger();
        assert_eq!(a.balance_hash(), b.balance_hash());

        // A second party changes the hash.
        let mut f = deposit("x1", 9, 100);
        f.party = "p2".to_owned();
        b.add_event("p2", f).unwrap();
        assert_ne!(a.balance_hash(), b.balance_hash());
    }

    #[test]
    fn test_snapshot_idempotent_replay() {
        let ledger = reference_ledger();
        let state = ledger.get_state(SNAPSHOT_KEY).unwrap();

        let mut restored = EventLedger::new();
        restored.load_state(SNAPSHOT_KEY, &state).unwrap();
        assert_eq!(restored.get_state(SNAPSHOT_KEY).unwrap(), state);
        assert_eq!(restored.available_balance("p1"), U256::from(7u64));
        assert_eq!(restored.balance_hash(), ledger.balance_hash());

        // Restored ids still dedup.
        assert_eq!(
            restored.add_event("p1", deposit("e1", 10, 100)),
            Err(LedgerError::DuplicateEvent("e1".to_owned()))
        );
    }

    #[test]
    fn test_snapshot_unknown_key() {
        let ledger = reference_ledger();
        assert!(matches!(
            ledger.get_state("bogus"),
            Err(SnapshotError::UnknownKey(_))
        ));
    }
}

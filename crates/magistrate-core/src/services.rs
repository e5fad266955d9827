//! World services the legal subsystem consumes.
//!
//! The wider simulation owns actors and money; the jurisdiction only
//! queries and instructs them through these seams. Each trait ships with
//! an in-memory implementation used by tests and the standalone engine.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use thiserror::Error;

use magistrate_law::ActorFacts;
use magistrate_types::{ActorId, AppearanceSnapshot, JurisdictionId, LocationId};

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The result of resolving a reference against a live world.
///
/// Crimes and patrols hold bare ids; the actor behind an id can log out,
/// die, or be purged at any time, so every resolution is explicit about
/// the miss case instead of pretending references are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The reference resolved to a live value.
    Resolved(T),
    /// The reference no longer points at anything.
    Unresolved,
}

impl<T> Resolution<T> {
    /// Convert to an `Option`, dropping the distinction's name.
    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved => None,
        }
    }

    /// Whether the reference resolved.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

// ---------------------------------------------------------------------------
// ActorDirectory
// ---------------------------------------------------------------------------

/// Errors from directory mutations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The actor does not exist in the directory.
    #[error("unknown actor: {0}")]
    UnknownActor(ActorId),
}

/// What the directory knows about one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    /// The actor's id.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Current location, if the actor is in the world.
    pub location: Option<LocationId>,
    /// Perception skill used for witness thresholds.
    pub notice_skill: u32,
    /// Whether the actor is currently unable to resist.
    pub helpless: bool,
    /// Free-form tags legal-class predicates match on.
    pub tags: BTreeSet<String>,
    /// True describable characteristics.
    pub characteristics: AppearanceSnapshot,
    /// Carried items, confiscated on custody and returned on release.
    pub belongings: Vec<String>,
}

impl ActorRecord {
    /// Create a minimal record with no location, skill, or tags.
    pub fn new(id: ActorId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            location: None,
            notice_skill: 0,
            helpless: false,
            tags: BTreeSet::new(),
            characteristics: AppearanceSnapshot::new(),
            belongings: Vec::new(),
        }
    }

    /// Build the predicate-facing fact view of this record.
    pub fn facts(&self) -> ActorFacts {
        ActorFacts {
            id: self.id,
            location: self.location,
            tags: self.tags.clone(),
            notice_skill: self.notice_skill,
            helpless: self.helpless,
        }
    }
}

/// Lookup and mutation seam over the wider simulation's actor store.
pub trait ActorDirectory {
    /// Resolve an actor id to its record.
    fn resolve(&self, actor: ActorId) -> Resolution<ActorRecord>;

    /// Where an actor currently is.
    fn location_of(&self, actor: ActorId) -> Option<LocationId>;

    /// Every actor present at a location.
    fn actors_at(&self, location: LocationId) -> Vec<ActorId>;

    /// Whether a witness perceives events at a location.
    fn perceives(&self, witness: ActorId, location: LocationId) -> bool;

    /// Predicate-facing facts for an actor.
    fn facts(&self, actor: ActorId) -> Resolution<ActorFacts>;

    /// Move an actor to a location.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UnknownActor`] for a dangling id.
    fn move_actor(&mut self, actor: ActorId, to: LocationId) -> Result<(), DirectoryError>;

    /// Take everything an actor carries, for storage during custody.
    fn confiscate_belongings(&mut self, actor: ActorId) -> Vec<String>;

    /// Give stored items back to an actor.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UnknownActor`] for a dangling id; the
    /// caller keeps the items in that case.
    fn return_belongings(
        &mut self,
        actor: ActorId,
        items: Vec<String>,
    ) -> Result<(), DirectoryError>;
}

/// In-memory [`ActorDirectory`] for tests and the standalone engine.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    actors: BTreeMap<ActorId, ActorRecord>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn upsert(&mut self, record: ActorRecord) {
        self.actors.insert(record.id, record);
    }

    /// Remove a record, simulating logout or death.
    pub fn remove(&mut self, actor: ActorId) -> Option<ActorRecord> {
        self.actors.remove(&actor)
    }

    /// Mutable access for test setups.
    pub fn record_mut(&mut self, actor: ActorId) -> Option<&mut ActorRecord> {
        self.actors.get_mut(&actor)
    }
}

impl ActorDirectory for MemoryDirectory {
    fn resolve(&self, actor: ActorId) -> Resolution<ActorRecord> {
        self.actors
            .get(&actor)
            .cloned()
            .map_or(Resolution::Unresolved, Resolution::Resolved)
    }

    fn location_of(&self, actor: ActorId) -> Option<LocationId> {
        self.actors.get(&actor).and_then(|r| r.location)
    }

    fn actors_at(&self, location: LocationId) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|r| r.location == Some(location))
            .map(|r| r.id)
            .collect()
    }

    fn perceives(&self, witness: ActorId, location: LocationId) -> bool {
        self.actors
            .get(&witness)
            .is_some_and(|r| !r.helpless && r.location == Some(location))
    }

    fn facts(&self, actor: ActorId) -> Resolution<ActorFacts> {
        self.actors
            .get(&actor)
            .map(ActorRecord::facts)
            .map_or(Resolution::Unresolved, Resolution::Resolved)
    }

    fn move_actor(&mut self, actor: ActorId, to: LocationId) -> Result<(), DirectoryError> {
        let record = self
            .actors
            .get_mut(&actor)
            .ok_or(DirectoryError::UnknownActor(actor))?;
        record.location = Some(to);
        Ok(())
    }

    fn confiscate_belongings(&mut self, actor: ActorId) -> Vec<String> {
        self.actors
            .get_mut(&actor)
            .map(|r| std::mem::take(&mut r.belongings))
            .unwrap_or_default()
    }

    fn return_belongings(
        &mut self,
        actor: ActorId,
        items: Vec<String>,
    ) -> Result<(), DirectoryError> {
        let record = self
            .actors
            .get_mut(&actor)
            .ok_or(DirectoryError::UnknownActor(actor))?;
        record.belongings.extend(items);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CurrencyAccounts
// ---------------------------------------------------------------------------

/// Who owns a currency account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccountOwner {
    /// A character's purse.
    Actor(ActorId),
    /// A jurisdiction's treasury (fines and forfeited bail land here).
    Jurisdiction(JurisdictionId),
}

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A debit exceeded the account balance.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the debit asked for.
        requested: Decimal,
        /// Amount actually available.
        available: Decimal,
    },

    /// Amounts must be non-negative.
    #[error("negative amount: {0}")]
    NegativeAmount(Decimal),
}

/// Money movement seam used for fines and bail.
pub trait CurrencyAccounts {
    /// Current balance of an account. Missing accounts read as zero.
    fn balance(&self, owner: AccountOwner) -> Decimal;

    /// Add to an account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for a negative credit.
    fn credit(&mut self, owner: AccountOwner, amount: Decimal) -> Result<(), LedgerError>;

    /// Take from an account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] when the balance does
    /// not cover the debit, or [`LedgerError::NegativeAmount`] for a
    /// negative debit.
    fn debit(&mut self, owner: AccountOwner, amount: Decimal) -> Result<(), LedgerError>;

    /// Move money between two accounts atomically.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CurrencyAccounts::debit`]; on failure
    /// neither account changes.
    fn transfer(
        &mut self,
        from: AccountOwner,
        to: AccountOwner,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

/// In-memory [`CurrencyAccounts`] for tests and the standalone engine.
#[derive(Debug, Default)]
pub struct MemoryAccounts {
    balances: BTreeMap<AccountOwner, Decimal>,
}

impl MemoryAccounts {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CurrencyAccounts for MemoryAccounts {
    fn balance(&self, owner: AccountOwner) -> Decimal {
        self.balances.get(&owner).copied().unwrap_or(Decimal::ZERO)
    }

    fn credit(&mut self, owner: AccountOwner, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let entry = self.balances.entry(owner).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    fn debit(&mut self, owner: AccountOwner, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let available = self.balance(owner);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        self.balances
            .insert(owner, available.saturating_sub(amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(location: LocationId) -> ActorRecord {
        let mut record = ActorRecord::new(ActorId::new(), "townsman");
        record.location = Some(location);
        record
    }

    // ---- Directory ----

    #[test]
    fn resolution_is_explicit_about_misses() {
        let mut directory = MemoryDirectory::new();
        let ghost = ActorId::new();
        assert!(!directory.resolve(ghost).is_resolved());

        let record = ActorRecord::new(ghost, "ghost");
        directory.upsert(record);
        assert!(directory.resolve(ghost).is_resolved());

        directory.remove(ghost);
        assert_eq!(directory.facts(ghost).resolved(), None);
    }

    #[test]
    fn perception_requires_presence_and_capacity() {
        let square = LocationId::new();
        let elsewhere = LocationId::new();
        let mut directory = MemoryDirectory::new();

        let present = record_at(square);
        let present_id = present.id;
        directory.upsert(present);

        let absent = record_at(elsewhere);
        let absent_id = absent.id;
        directory.upsert(absent);

        let mut bound = record_at(square);
        bound.helpless = true;
        let bound_id = bound.id;
        directory.upsert(bound);

        assert!(directory.perceives(present_id, square));
        assert!(!directory.perceives(absent_id, square));
        assert!(!directory.perceives(bound_id, square));
    }

    #[test]
    fn belongings_round_trip_through_custody() {
        let mut directory = MemoryDirectory::new();
        let mut record = ActorRecord::new(ActorId::new(), "prisoner");
        let id = record.id;
        record.belongings = vec![String::from("knife"), String::from("purse")];
        directory.upsert(record);

        let stored = directory.confiscate_belongings(id);
        assert_eq!(stored.len(), 2);
        assert!(directory
            .resolve(id)
            .resolved()
            .is_some_and(|r| r.belongings.is_empty()));

        assert!(directory.return_belongings(id, stored).is_ok());
        assert!(directory
            .resolve(id)
            .resolved()
            .is_some_and(|r| r.belongings.len() == 2));
    }

    // ---- Ledger ----

    #[test]
    fn debit_fails_without_funds_and_leaves_balance() {
        let mut accounts = MemoryAccounts::new();
        let purse = AccountOwner::Actor(ActorId::new());
        assert!(accounts.credit(purse, Decimal::new(10, 0)).is_ok());

        let result = accounts.debit(purse, Decimal::new(25, 0));
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(accounts.balance(purse), Decimal::new(10, 0));
    }

    #[test]
    fn transfer_moves_between_purse_and_treasury() {
        let mut accounts = MemoryAccounts::new();
        let purse = AccountOwner::Actor(ActorId::new());
        let treasury = AccountOwner::Jurisdiction(JurisdictionId::new());
        assert!(accounts.credit(purse, Decimal::new(100, 0)).is_ok());

        assert!(accounts.transfer(purse, treasury, Decimal::new(40, 0)).is_ok());
        assert_eq!(accounts.balance(purse), Decimal::new(60, 0));
        assert_eq!(accounts.balance(treasury), Decimal::new(40, 0));
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut accounts = MemoryAccounts::new();
        let purse = AccountOwner::Actor(ActorId::new());
        assert!(matches!(
            accounts.credit(purse, Decimal::new(-1, 0)),
            Err(LedgerError::NegativeAmount(_))
        ));
    }
}

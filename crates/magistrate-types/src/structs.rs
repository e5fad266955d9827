//! Shared value structs that cross crate boundaries.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{CharacteristicKind, LegalEventKind};
use crate::ids::{ActorId, CrimeId, EnforcementAuthorityId, JurisdictionId};

// ---------------------------------------------------------------------------
// AppearanceSnapshot
// ---------------------------------------------------------------------------

/// An offender's describable characteristics as captured at the moment a
/// crime was committed.
///
/// The snapshot stored on a crime starts as the offender's true
/// characteristics; witness reporting may overwrite individual entries
/// with corrupted values, so the snapshot converges on "what witnesses
/// believe" rather than ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppearanceSnapshot {
    /// Characteristic values keyed by kind.
    pub traits: BTreeMap<CharacteristicKind, String>,
}

impl AppearanceSnapshot {
    /// Create an empty snapshot.
    pub const fn new() -> Self {
        Self {
            traits: BTreeMap::new(),
        }
    }

    /// Build a snapshot from `(kind, value)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (CharacteristicKind, String)>,
    {
        Self {
            traits: pairs.into_iter().collect(),
        }
    }

    /// Look up the recorded value for a characteristic kind.
    pub fn get(&self, kind: CharacteristicKind) -> Option<&str> {
        self.traits.get(&kind).map(String::as_str)
    }

    /// Overwrite the recorded value for a characteristic kind.
    pub fn set(&mut self, kind: CharacteristicKind, value: String) {
        self.traits.insert(kind, value);
    }

    /// Number of recorded characteristics.
    pub fn len(&self) -> usize {
        self.traits.len()
    }

    /// Whether the snapshot records no characteristics.
    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PunishmentOutcome
// ---------------------------------------------------------------------------

/// The concrete penalties a punishment strategy resolves a conviction to.
///
/// Outcomes aggregate across an offender's crimes at sentencing: fines and
/// custodial time sum, execution is sticky, and the longest bond wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PunishmentOutcome {
    /// Fine amount in the jurisdiction's currency.
    pub fine: Decimal,
    /// Custodial sentence length in world ticks.
    pub custodial_ticks: u64,
    /// Whether the offender is to be executed.
    pub execute: bool,
    /// Good-behaviour bond length in world ticks.
    pub bond_ticks: u64,
}

impl PunishmentOutcome {
    /// An outcome carrying no penalty at all.
    pub const NONE: Self = Self {
        fine: Decimal::ZERO,
        custodial_ticks: 0,
        execute: false,
        bond_ticks: 0,
    };

    /// Fold another outcome into this one using the aggregation rules.
    pub fn absorb(&mut self, other: Self) {
        self.fine = self.fine.saturating_add(other.fine);
        self.custodial_ticks = self.custodial_ticks.saturating_add(other.custodial_ticks);
        self.execute = self.execute || other.execute;
        self.bond_ticks = self.bond_ticks.max(other.bond_ticks);
    }

    /// Whether this outcome imposes any penalty.
    pub fn is_none(&self) -> bool {
        self.fine == Decimal::ZERO
            && self.custodial_ticks == 0
            && !self.execute
            && self.bond_ticks == 0
    }
}

// ---------------------------------------------------------------------------
// StaffingRequirement
// ---------------------------------------------------------------------------

/// How many enforcers holding a given authority a patrol route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingRequirement {
    /// The enforcement authority the enforcers must hold (directly or via
    /// inclusion).
    pub authority: EnforcementAuthorityId,
    /// Minimum headcount.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// LegalEvent
// ---------------------------------------------------------------------------

/// An outbound notification describing a legal milestone.
///
/// Published fire-and-forget on the notification channel; consumers that
/// are not configured simply never see these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEvent {
    /// The milestone kind.
    pub kind: LegalEventKind,
    /// The jurisdiction the milestone occurred in.
    pub jurisdiction: JurisdictionId,
    /// The principal actor (offender, released prisoner, etc.).
    pub actor: ActorId,
    /// The crime involved, when the milestone concerns one.
    pub crime: Option<CrimeId>,
    /// The world tick at which the milestone occurred.
    pub tick: u64,
    /// Renderable one-line description.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_set_and_get() {
        let mut snapshot = AppearanceSnapshot::new();
        assert!(snapshot.is_empty());

        snapshot.set(CharacteristicKind::Height, String::from("tall"));
        assert_eq!(snapshot.get(CharacteristicKind::Height), Some("tall"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn outcome_absorb_aggregation_rules() {
        let mut total = PunishmentOutcome {
            fine: Decimal::new(100, 0),
            custodial_ticks: 50,
            execute: false,
            bond_ticks: 10,
        };
        total.absorb(PunishmentOutcome {
            fine: Decimal::new(25, 0),
            custodial_ticks: 30,
            execute: true,
            bond_ticks: 5,
        });

        assert_eq!(total.fine, Decimal::new(125, 0));
        assert_eq!(total.custodial_ticks, 80);
        assert!(total.execute);
        // Longest bond wins rather than summing.
        assert_eq!(total.bond_ticks, 10);
    }

    #[test]
    fn outcome_none_is_none() {
        assert!(PunishmentOutcome::NONE.is_none());
        let fined = PunishmentOutcome {
            fine: Decimal::ONE,
            ..PunishmentOutcome::NONE
        };
        assert!(!fined.is_none());
    }

    #[test]
    fn legal_event_roundtrip_serde() {
        let event = LegalEvent {
            kind: LegalEventKind::Arrest,
            jurisdiction: JurisdictionId::new(),
            actor: ActorId::new(),
            crime: Some(CrimeId::new()),
            tick: 42,
            detail: String::from("arrested for theft"),
        };
        let json = serde_json::to_string(&event).ok();
        assert!(json.is_some());
        let restored: Result<LegalEvent, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok_and(|e| e == event));
    }
}

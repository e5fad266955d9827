//! Probabilistic disclosure: whether and how accurately a witnessed crime
//! becomes known.
//!
//! A [`WitnessProfile`] is a location-scoped model of a population's
//! willingness to report. Witnessing draws against a per-time-of-day base
//! rate scaled by a reporting-multiplier predicate; a successful draw
//! produces a report whose accuracy depends on the profile's reliability.
//!
//! Reporting with `identity_known = true` establishes the offender's
//! identity permanently. Otherwise each recorded characteristic is
//! independently corrupted to a random alternative with probability
//! `1 - reliability`, bounded by the profile's corruption cap, so an
//! unreliable population still cannot invent an entirely fictional
//! offender.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use magistrate_types::{
    ActorId, JurisdictionId, LegalClassId, TimeOfDay, WitnessProfileId,
};

use crate::crime::Crime;
use crate::error::LawError;
use crate::predicate::{ActorFacts, ActorMultiplier, ActorPredicate};

// ---------------------------------------------------------------------------
// WitnessOutcome
// ---------------------------------------------------------------------------

/// What happened when a witness was given the chance to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessOutcome {
    /// The profile does not cooperate with the crime's jurisdiction.
    NotCooperating,
    /// A party's legal class is on the profile's ignore list.
    IgnoredParty,
    /// The witness's notice skill is below the profile's threshold.
    BelowNoticeThreshold,
    /// The report draw failed; the crime stays as it was.
    Unreported,
    /// The crime was reported.
    Reported {
        /// Whether the report established the offender's identity.
        identity_known: bool,
    },
}

// ---------------------------------------------------------------------------
// WitnessProfile
// ---------------------------------------------------------------------------

/// A location-scoped probabilistic model of crime disclosure.
#[derive(Debug, Clone)]
pub struct WitnessProfile {
    /// Unique identifier.
    pub id: WitnessProfileId,
    /// Display name.
    pub name: String,
    /// Jurisdictions this population reports to.
    pub cooperating: BTreeSet<JurisdictionId>,
    /// Offender classes this population refuses to report on.
    pub ignored_offender_classes: BTreeSet<LegalClassId>,
    /// Victim classes this population refuses to report for.
    pub ignored_victim_classes: BTreeSet<LegalClassId>,
    /// Base report probability per time-of-day phase. Missing phases
    /// never report.
    pub base_report_rate: BTreeMap<TimeOfDay, Decimal>,
    /// Per-characteristic faithfulness of reports, 0..=1.
    pub reliability: Decimal,
    /// Whether a given witness recognizes the offender personally.
    /// Unconfigured means identity is never disclosed by this population.
    pub identity_disclosure: Option<ActorPredicate>,
    /// Scales the base report rate per witness (fear, loyalty, bribes).
    pub reporting_multiplier: Option<ActorMultiplier>,
    /// Minimum notice skill for a witness to have perceived enough to
    /// report at all.
    pub min_notice_skill: u32,
    /// Upper bound on corrupted characteristics across a single report.
    pub max_corruptions: u32,
}

impl WitnessProfile {
    /// Create a profile with sane defaults: cooperates with nobody,
    /// perfectly reliable, never discloses identity.
    pub fn new(id: WitnessProfileId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            cooperating: BTreeSet::new(),
            ignored_offender_classes: BTreeSet::new(),
            ignored_victim_classes: BTreeSet::new(),
            base_report_rate: BTreeMap::new(),
            reliability: Decimal::ONE,
            identity_disclosure: None,
            reporting_multiplier: None,
            min_notice_skill: 0,
            max_corruptions: u32::MAX,
        }
    }

    /// Validate rates and reliability at configuration time.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::InvalidConfig`] when reliability or any base
    /// rate lies outside `0..=1`.
    pub fn validate(&self) -> Result<(), LawError> {
        if self.reliability < Decimal::ZERO || self.reliability > Decimal::ONE {
            return Err(LawError::InvalidConfig {
                reason: format!(
                    "witness profile {}: reliability {} outside 0..=1",
                    self.name, self.reliability
                ),
            });
        }
        for (phase, rate) in &self.base_report_rate {
            if *rate < Decimal::ZERO || *rate > Decimal::ONE {
                return Err(LawError::InvalidConfig {
                    reason: format!(
                        "witness profile {}: rate {rate} for {phase:?} outside 0..=1",
                        self.name
                    ),
                });
            }
        }
        Ok(())
    }

    /// Give one witness the chance to report a crime.
    ///
    /// No-ops (with a typed outcome) unless the profile cooperates with
    /// the crime's jurisdiction and neither party's class is ignored. On a
    /// successful draw the crime is reported through [`report_crime`].
    ///
    /// # Errors
    ///
    /// Propagates lifecycle errors from the crime record (stale or
    /// finalized records cannot be reported).
    #[allow(clippy::too_many_arguments)]
    pub fn witness_crime(
        &self,
        crime: &mut Crime,
        witness: &ActorFacts,
        offender_class: Option<LegalClassId>,
        victim_class: Option<LegalClassId>,
        time_of_day: TimeOfDay,
        tick: u64,
        rng: &mut impl Rng,
    ) -> Result<WitnessOutcome, LawError> {
        if !self.cooperating.contains(&crime.jurisdiction) {
            return Ok(WitnessOutcome::NotCooperating);
        }
        if offender_class.is_some_and(|c| self.ignored_offender_classes.contains(&c))
            || victim_class.is_some_and(|c| self.ignored_victim_classes.contains(&c))
        {
            return Ok(WitnessOutcome::IgnoredParty);
        }
        if witness.notice_skill < self.min_notice_skill {
            return Ok(WitnessOutcome::BelowNoticeThreshold);
        }

        let base = self
            .base_report_rate
            .get(&time_of_day)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let multiplier = self
            .reporting_multiplier
            .as_ref()
            .map_or(Decimal::ONE, |m| m.eval(witness));
        let chance = base
            .saturating_mul(multiplier)
            .clamp(Decimal::ZERO, Decimal::ONE);

        if !rng.random_bool(chance.to_f64().unwrap_or(0.0)) {
            return Ok(WitnessOutcome::Unreported);
        }

        let identity_known = self
            .identity_disclosure
            .as_ref()
            .is_some_and(|p| p.eval(witness));

        debug!(
            crime = %crime.id,
            witness = %witness.id,
            identity_known,
            "Witness reporting crime"
        );

        report_crime(
            crime,
            Some(witness.id),
            identity_known,
            self.reliability,
            self.max_corruptions,
            tick,
            rng,
        )?;
        Ok(WitnessOutcome::Reported { identity_known })
    }
}

// ---------------------------------------------------------------------------
// report_crime
// ---------------------------------------------------------------------------

/// Report a crime, possibly corrupting its evidentiary snapshot.
///
/// With `identity_known`, the offender's identity is established
/// permanently and the snapshot is left untouched (identification
/// supersedes description). Otherwise each recorded characteristic is
/// independently replaced by a random alternative from its value pool
/// with probability `1 - reliability`, up to `max_corruptions` failures.
///
/// Moves the record unknown -> known (idempotent), stamps the report
/// tick, and sets the accuser only if unset.
///
/// # Errors
///
/// Propagates lifecycle errors (stale or finalized records).
pub fn report_crime(
    crime: &mut Crime,
    reporter: Option<ActorId>,
    identity_known: bool,
    reliability: Decimal,
    max_corruptions: u32,
    tick: u64,
    rng: &mut impl Rng,
) -> Result<(), LawError> {
    // Validate the transition before touching the snapshot so a rejected
    // report leaves the record fully unchanged.
    crime.mark_reported(tick, reporter)?;

    if identity_known {
        crime.mark_identity_known()?;
        return Ok(());
    }

    let corruption_chance = Decimal::ONE
        .saturating_sub(reliability)
        .clamp(Decimal::ZERO, Decimal::ONE)
        .to_f64()
        .unwrap_or(0.0);

    let kinds: Vec<_> = crime.appearance.traits.keys().copied().collect();
    let mut corruptions: u32 = 0;

    for kind in kinds {
        if corruptions >= max_corruptions {
            break;
        }
        if !rng.random_bool(corruption_chance) {
            continue;
        }
        let current = crime.appearance.get(kind).map(str::to_owned);
        let alternatives: Vec<&str> = kind
            .value_pool()
            .iter()
            .copied()
            .filter(|v| current.as_deref() != Some(*v))
            .collect();
        if let Some(replacement) = alternatives.choose(rng) {
            crime.appearance.set(kind, (*replacement).to_owned());
            corruptions = corruptions.saturating_add(1);
        }
    }

    Ok(())
}

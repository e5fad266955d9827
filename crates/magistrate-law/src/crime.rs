//! Realized violations and their lifecycle.
//!
//! A [`Crime`] records one concrete violation of a law: the parties, the
//! place and time, the evidentiary detail witnesses can corrupt, and two
//! state machines -- disclosure (which jurisdiction bucket the record
//! lives in) and adjudication (what enforcement has decided about it).
//!
//! # Invariants
//!
//! - `identity_known` flips `false -> true` only, never back.
//! - Disclosure moves along `Unknown -> Known`, `Unknown -> Stale`,
//!   `Known -> Stale`, `Known -> Resolved`; nothing else.
//! - Once finalized (convicted or forgiven), outcome fields are immutable;
//!   every mutator returns [`LawError::CrimeFinalized`] afterwards.
//!
//! Crimes store ids, not references: the offender, victim, and location
//! are resolved on demand through the actor directory, so deletion
//! elsewhere in the simulation needs no subscription teardown here.

use magistrate_types::{
    ActorId, AdjudicationState, AppearanceSnapshot, CrimeId, DisclosureState, JurisdictionId,
    LawId, LocationId, OffenseCategory, PunishmentOutcome,
};

use crate::error::LawError;

/// One realized violation of a law.
#[derive(Debug, Clone)]
pub struct Crime {
    /// Unique identifier.
    pub id: CrimeId,
    /// The law this crime was created under.
    pub law: LawId,
    /// The offense category (copied from the law for cheap matching).
    pub category: OffenseCategory,
    /// The jurisdiction that owns this record.
    pub jurisdiction: JurisdictionId,
    /// The offender.
    pub offender: ActorId,
    /// The victim, when there is one.
    pub victim: Option<ActorId>,
    /// A third party involved in the offense (stolen-from owner, target
    /// object holder), when there is one.
    pub object: Option<ActorId>,
    /// Where the offense occurred.
    pub location: LocationId,
    /// World tick at which the offense was committed.
    pub committed_tick: u64,
    /// World tick at which the crime was first reported, once known.
    reported_tick: Option<u64>,
    /// Actors who perceived the offense as it happened.
    pub witnesses: Vec<ActorId>,
    /// Free-form evidentiary note supplied by the reporting event.
    pub note: String,
    /// The offender's characteristics as witnesses believe them.
    pub appearance: AppearanceSnapshot,
    /// Which bucket the record lives in.
    disclosure: DisclosureState,
    /// What enforcement has decided.
    adjudication: AdjudicationState,
    /// Whether the offender's identity is established. Monotonic.
    identity_known: bool,
    /// The first reporter to come forward, set once.
    accuser: Option<ActorId>,
    /// World tick of arrest, set once when enforcement succeeds.
    arrest_tick: Option<u64>,
    /// Final penalties, set exactly once at conviction.
    outcome: Option<PunishmentOutcome>,
}

impl Crime {
    /// Create a fresh, unknown, pending crime record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CrimeId,
        law: LawId,
        category: OffenseCategory,
        jurisdiction: JurisdictionId,
        offender: ActorId,
        victim: Option<ActorId>,
        object: Option<ActorId>,
        location: LocationId,
        committed_tick: u64,
        appearance: AppearanceSnapshot,
        note: String,
    ) -> Self {
        Self {
            id,
            law,
            category,
            jurisdiction,
            offender,
            victim,
            object,
            location,
            committed_tick,
            reported_tick: None,
            witnesses: Vec::new(),
            note,
            appearance,
            disclosure: DisclosureState::Unknown,
            adjudication: AdjudicationState::Pending,
            identity_known: false,
            accuser: None,
            arrest_tick: None,
            outcome: None,
        }
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// Current disclosure state.
    pub const fn disclosure(&self) -> DisclosureState {
        self.disclosure
    }

    /// Current adjudication state.
    pub const fn adjudication(&self) -> AdjudicationState {
        self.adjudication
    }

    /// Whether the offender's identity is established.
    pub const fn identity_known(&self) -> bool {
        self.identity_known
    }

    /// The first reporter to come forward, if any.
    pub const fn accuser(&self) -> Option<ActorId> {
        self.accuser
    }

    /// World tick of arrest, if the crime has been enforced.
    pub const fn arrest_tick(&self) -> Option<u64> {
        self.arrest_tick
    }

    /// World tick of first report, if the crime is known.
    pub const fn reported_tick(&self) -> Option<u64> {
        self.reported_tick
    }

    /// Final penalties, once convicted.
    pub const fn outcome(&self) -> Option<PunishmentOutcome> {
        self.outcome
    }

    /// Whether enforcement has physically reached the offender.
    pub const fn is_enforced(&self) -> bool {
        self.arrest_tick.is_some()
    }

    /// Whether the record is finalized and immutable.
    pub const fn is_finalized(&self) -> bool {
        self.adjudication.is_final()
    }

    /// Whether this record matches another offense for repeat
    /// suppression: same offender, victim, object, and location.
    pub fn is_repeat_of(
        &self,
        offender: ActorId,
        victim: Option<ActorId>,
        object: Option<ActorId>,
        location: LocationId,
    ) -> bool {
        self.offender == offender
            && self.victim == victim
            && self.object == object
            && self.location == location
    }

    /// Whether the offender is eligible for automatic conviction: identity
    /// established, already enforced, and past the post-arrest delay.
    pub fn eligible_for_auto_conviction(&self, now: u64, post_arrest_delay: u64) -> bool {
        if self.is_finalized() || !self.identity_known {
            return false;
        }
        self.arrest_tick
            .is_some_and(|arrested| now >= arrested.saturating_add(post_arrest_delay))
    }

    // -----------------------------------------------------------------------
    // Lifecycle mutators
    // -----------------------------------------------------------------------

    /// Record a witness who perceived the offense.
    pub fn add_witness(&mut self, witness: ActorId) {
        if !self.witnesses.contains(&witness) {
            self.witnesses.push(witness);
        }
    }

    /// Establish the offender's identity. Monotonic and idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] on a finalized record.
    pub fn mark_identity_known(&mut self) -> Result<(), LawError> {
        self.guard_not_finalized()?;
        self.identity_known = true;
        Ok(())
    }

    /// Record a report: move unknown -> known (idempotent), stamp the
    /// report tick once, and set the accuser only if unset.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] on a finalized record and
    /// [`LawError::InvalidTransition`] when the record is stale.
    pub fn mark_reported(&mut self, tick: u64, reporter: Option<ActorId>) -> Result<(), LawError> {
        self.guard_not_finalized()?;
        match self.disclosure {
            DisclosureState::Unknown => {
                self.transition(DisclosureState::Known)?;
                self.reported_tick = Some(tick);
            }
            DisclosureState::Known => {
                // Idempotent: a second report changes nothing structural.
            }
            from @ (DisclosureState::Stale | DisclosureState::Resolved) => {
                return Err(LawError::InvalidTransition {
                    crime: self.id,
                    from,
                    to: DisclosureState::Known,
                });
            }
        }
        if self.accuser.is_none() {
            self.accuser = reporter;
        }
        Ok(())
    }

    /// Record an arrest: stamp the arrest tick once and advance
    /// adjudication to accused.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] on a finalized record.
    pub fn record_arrest(&mut self, tick: u64) -> Result<(), LawError> {
        self.guard_not_finalized()?;
        if self.arrest_tick.is_none() {
            self.arrest_tick = Some(tick);
        }
        if self.adjudication == AdjudicationState::Pending {
            self.adjudication = AdjudicationState::Accused;
        }
        Ok(())
    }

    /// Finalize a conviction, setting the outcome exactly once and moving
    /// the record to resolved.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] if the record is already
    /// finalized, and [`LawError::InvalidTransition`] if the crime was
    /// never disclosed (an unknown crime cannot be convicted).
    pub fn finalize_conviction(&mut self, outcome: PunishmentOutcome) -> Result<(), LawError> {
        self.guard_not_finalized()?;
        if self.disclosure != DisclosureState::Known {
            return Err(LawError::InvalidTransition {
                crime: self.id,
                from: self.disclosure,
                to: DisclosureState::Resolved,
            });
        }
        self.transition(DisclosureState::Resolved)?;
        self.adjudication = AdjudicationState::Convicted;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Forgive the crime. Idempotent on an already-forgiven record.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] if the record was convicted.
    pub fn forgive(&mut self) -> Result<(), LawError> {
        if self.adjudication == AdjudicationState::Forgiven {
            return Ok(());
        }
        self.guard_not_finalized()?;
        if self.disclosure != DisclosureState::Resolved {
            self.disclosure = DisclosureState::Resolved;
        }
        self.adjudication = AdjudicationState::Forgiven;
        Ok(())
    }

    /// Time-bar the record into the stale bucket.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::CrimeFinalized`] on a finalized record and
    /// [`LawError::InvalidTransition`] when already stale or resolved.
    pub fn mark_stale(&mut self) -> Result<(), LawError> {
        self.guard_not_finalized()?;
        self.transition(DisclosureState::Stale)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn guard_not_finalized(&self) -> Result<(), LawError> {
        if self.is_finalized() {
            return Err(LawError::CrimeFinalized(self.id));
        }
        Ok(())
    }

    /// Apply a disclosure transition, validating the permitted edges.
    fn transition(&mut self, to: DisclosureState) -> Result<(), LawError> {
        let permitted = matches!(
            (self.disclosure, to),
            (DisclosureState::Unknown, DisclosureState::Known | DisclosureState::Stale)
                | (DisclosureState::Known, DisclosureState::Stale | DisclosureState::Resolved)
        );
        if !permitted {
            return Err(LawError::InvalidTransition {
                crime: self.id,
                from: self.disclosure,
                to,
            });
        }
        self.disclosure = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use magistrate_types::CharacteristicKind;
    use rust_decimal::Decimal;

    use super::*;

    fn make_crime() -> Crime {
        let mut appearance = AppearanceSnapshot::new();
        appearance.set(CharacteristicKind::Height, String::from("tall"));
        Crime::new(
            CrimeId::new(),
            LawId::new(),
            OffenseCategory::Theft,
            JurisdictionId::new(),
            ActorId::new(),
            Some(ActorId::new()),
            None,
            LocationId::new(),
            100,
            appearance,
            String::from("a purse was taken"),
        )
    }

    // -----------------------------------------------------------------------
    // Disclosure transitions
    // -----------------------------------------------------------------------

    #[test]
    fn report_moves_unknown_to_known_once() {
        let mut crime = make_crime();
        let reporter = ActorId::new();

        assert!(crime.mark_reported(110, Some(reporter)).is_ok());
        assert_eq!(crime.disclosure(), DisclosureState::Known);
        assert_eq!(crime.reported_tick(), Some(110));
        assert_eq!(crime.accuser(), Some(reporter));

        // Second report is idempotent; accuser and tick are unchanged.
        assert!(crime.mark_reported(120, Some(ActorId::new())).is_ok());
        assert_eq!(crime.reported_tick(), Some(110));
        assert_eq!(crime.accuser(), Some(reporter));
    }

    #[test]
    fn stale_crime_rejects_report() {
        let mut crime = make_crime();
        assert!(crime.mark_stale().is_ok());
        assert!(matches!(
            crime.mark_reported(200, None),
            Err(LawError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn identity_known_is_monotonic() {
        let mut crime = make_crime();
        assert!(!crime.identity_known());
        assert!(crime.mark_identity_known().is_ok());
        assert!(crime.identity_known());
        // There is no API to unset it; a second call is a no-op.
        assert!(crime.mark_identity_known().is_ok());
        assert!(crime.identity_known());
    }

    // -----------------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------------

    #[test]
    fn conviction_finalizes_outcome_immutably() {
        let mut crime = make_crime();
        assert!(crime.mark_reported(110, None).is_ok());
        assert!(crime.record_arrest(120).is_ok());

        let outcome = PunishmentOutcome {
            fine: Decimal::new(40, 0),
            custodial_ticks: 600,
            execute: false,
            bond_ticks: 0,
        };
        assert!(crime.finalize_conviction(outcome).is_ok());
        assert_eq!(crime.disclosure(), DisclosureState::Resolved);
        assert_eq!(crime.adjudication(), AdjudicationState::Convicted);
        assert_eq!(crime.outcome(), Some(outcome));

        // Every mutator now refuses.
        assert!(matches!(
            crime.finalize_conviction(PunishmentOutcome::NONE),
            Err(LawError::CrimeFinalized(_))
        ));
        assert!(matches!(
            crime.mark_identity_known(),
            Err(LawError::CrimeFinalized(_))
        ));
        assert!(matches!(
            crime.record_arrest(130),
            Err(LawError::CrimeFinalized(_))
        ));
        assert_eq!(crime.outcome(), Some(outcome));
    }

    #[test]
    fn unknown_crime_cannot_be_convicted() {
        let mut crime = make_crime();
        assert!(matches!(
            crime.finalize_conviction(PunishmentOutcome::NONE),
            Err(LawError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn forgive_is_idempotent_but_not_after_conviction() {
        let mut crime = make_crime();
        assert!(crime.mark_reported(110, None).is_ok());
        assert!(crime.forgive().is_ok());
        assert_eq!(crime.adjudication(), AdjudicationState::Forgiven);
        assert_eq!(crime.disclosure(), DisclosureState::Resolved);
        // Idempotent.
        assert!(crime.forgive().is_ok());

        let mut convicted = make_crime();
        assert!(convicted.mark_reported(110, None).is_ok());
        assert!(convicted.finalize_conviction(PunishmentOutcome::NONE).is_ok());
        assert!(matches!(
            convicted.forgive(),
            Err(LawError::CrimeFinalized(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Enforcement and eligibility
    // -----------------------------------------------------------------------

    #[test]
    fn arrest_stamps_once_and_accuses() {
        let mut crime = make_crime();
        assert!(crime.record_arrest(150).is_ok());
        assert_eq!(crime.arrest_tick(), Some(150));
        assert_eq!(crime.adjudication(), AdjudicationState::Accused);

        // A second arrest attempt does not move the stamp.
        assert!(crime.record_arrest(200).is_ok());
        assert_eq!(crime.arrest_tick(), Some(150));
    }

    #[test]
    fn auto_conviction_eligibility_requires_all_three() {
        let mut crime = make_crime();
        assert!(!crime.eligible_for_auto_conviction(1_000, 60));

        assert!(crime.mark_identity_known().is_ok());
        assert!(!crime.eligible_for_auto_conviction(1_000, 60));

        assert!(crime.record_arrest(900).is_ok());
        // Not yet past the delay.
        assert!(!crime.eligible_for_auto_conviction(930, 60));
        // Past the delay.
        assert!(crime.eligible_for_auto_conviction(960, 60));
    }

    #[test]
    fn repeat_matching_keys_on_all_four_fields() {
        let crime = make_crime();
        assert!(crime.is_repeat_of(crime.offender, crime.victim, crime.object, crime.location));
        assert!(!crime.is_repeat_of(ActorId::new(), crime.victim, crime.object, crime.location));
        assert!(!crime.is_repeat_of(crime.offender, None, crime.object, crime.location));
        assert!(!crime.is_repeat_of(crime.offender, crime.victim, crime.object, LocationId::new()));
    }

    #[test]
    fn witnesses_deduplicate() {
        let mut crime = make_crime();
        let witness = ActorId::new();
        crime.add_witness(witness);
        crime.add_witness(witness);
        assert_eq!(crime.witnesses.len(), 1);
    }
}

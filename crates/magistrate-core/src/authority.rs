//! The jurisdiction aggregate.
//!
//! A [`LegalAuthority`] owns everything legal about one territory: its
//! laws, legal classes, enforcement authorities, witness profiles, and
//! the four disclosure buckets of crime records (unknown, known, stale,
//! resolved). Crimes move between buckets only through aggregate methods
//! so the offender index always agrees with bucket membership.
//!
//! The aggregate holds no references into the wider world. Actors and
//! money are reached through the [`ActorDirectory`] and
//! [`CurrencyAccounts`] seams, and milestone events accumulate in an
//! internal log the engine drains toward its notification channel.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use magistrate_law::{
    Crime, EnforcementAuthority, Law, LawError, LegalClass, PredicateRegistry, WitnessProfile,
    authority_can_accuse, resolve_class, try_add_inclusion,
};
use magistrate_law::predicate::{ActorFacts, ActorPredicate, OffenseFacts};
use magistrate_patrol::SightedOffender;
use magistrate_types::{
    ActorId, CrimeId, CurrencyId, DisclosureState, EnforcementAuthorityId, FineId, JurisdictionId,
    LawId, LegalClassId, LegalEvent, LegalEventKind, LocationId, OffenseCategory,
    PunishmentOutcome, TimeOfDay, WitnessProfileId,
};

use crate::config::JusticeConfig;
use crate::services::{ActorDirectory, CurrencyAccounts, LedgerError, Resolution};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by jurisdiction operations.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// A rule-layer operation failed.
    #[error(transparent)]
    Law(#[from] LawError),

    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The crime id is not in any bucket.
    #[error("unknown crime: {0}")]
    UnknownCrime(CrimeId),

    /// The law id is not registered.
    #[error("unknown law: {0}")]
    UnknownLaw(LawId),

    /// The fine id is not in the ledger.
    #[error("unknown fine: {0}")]
    UnknownFine(FineId),

    /// The accusing authority lacks the capability.
    #[error("authority {authority} may not accuse members of this class")]
    AccusationRefused {
        /// The authority that attempted the accusation.
        authority: EnforcementAuthorityId,
    },

    /// The offender has no bail-eligible arrested crime.
    #[error("no bail-eligible crime for actor {0}")]
    NotBailEligible(ActorId),

    /// The offender is out on bail; the operation must wait.
    #[error("actor {0} is out on bail")]
    OnBail(ActorId),

    /// The offender is not in custody.
    #[error("actor {0} is not in custody")]
    NotInCustody(ActorId),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Fixed locations the jurisdiction operates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JurisdictionLocations {
    /// Where patrols assemble and disband.
    pub marshalling: Option<LocationId>,
    /// Where arrested and convicted offenders are held.
    pub jail: Option<LocationId>,
    /// Where judges preside.
    pub court: Option<LocationId>,
    /// Where released offenders are placed.
    pub release: Option<LocationId>,
}

impl JurisdictionLocations {
    /// Whether enough locations are set for enforcement to operate.
    /// The court is optional; everything else is required.
    pub const fn configured(&self) -> bool {
        self.marshalling.is_some() && self.jail.is_some() && self.release.is_some()
    }
}

/// An assessed fine awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fine {
    /// Unique identifier.
    pub id: FineId,
    /// Who owes it.
    pub actor: ActorId,
    /// The conviction it stems from, when tied to a single crime.
    pub crime: Option<CrimeId>,
    /// Amount owed.
    pub amount: Decimal,
    /// The currency the amount is denominated in, when the jurisdiction
    /// has one configured.
    pub currency: Option<CurrencyId>,
    /// Tick after which the fine is overdue.
    pub due_tick: u64,
    /// Whether it has been paid.
    pub paid: bool,
}

/// A custodial sentence being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyRecord {
    /// The prisoner.
    pub actor: ActorId,
    /// Tick at which the sentence completes.
    pub release_tick: u64,
    /// Items stored at intake, returned on release.
    pub belongings: Vec<String>,
}

/// Posted bail awaiting the offender's return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BailRecord {
    /// The bailed offender.
    pub actor: ActorId,
    /// The arrested crime bail was posted against.
    pub crime: CrimeId,
    /// Amount held in escrow.
    pub amount: Decimal,
    /// Tick by which the offender must return.
    pub return_by_tick: u64,
}

/// A world event reported into the rule engine for offense matching.
#[derive(Debug, Clone)]
pub struct OffenseReport {
    /// Who did it.
    pub offender: ActorId,
    /// The offense-category tag of what they did.
    pub category: OffenseCategory,
    /// Who it was done to, if anyone.
    pub victim: Option<ActorId>,
    /// A third party the offense concerned (stolen-from owner, etc.).
    pub object: Option<ActorId>,
    /// Free-form evidentiary note.
    pub note: String,
}

// ---------------------------------------------------------------------------
// LegalAuthority
// ---------------------------------------------------------------------------

/// One territory's complete legal apparatus.
#[derive(Debug)]
pub struct LegalAuthority {
    /// Unique identifier.
    pub id: JurisdictionId,
    /// Display name.
    pub name: String,
    config: JusticeConfig,
    currency: Option<CurrencyId>,
    // Locations the jurisdiction polices. Empty means everywhere.
    enforcement_zone: BTreeSet<LocationId>,
    auto_convict: bool,
    imprisonment_gate: Option<ActorPredicate>,
    registry: PredicateRegistry,
    laws: BTreeMap<LawId, Law>,
    classes: BTreeMap<LegalClassId, LegalClass>,
    authorities: BTreeMap<EnforcementAuthorityId, EnforcementAuthority>,
    profiles: BTreeMap<WitnessProfileId, WitnessProfile>,
    location_profiles: BTreeMap<LocationId, WitnessProfileId>,
    // Crime buckets. Mutated only through take_crime/place_crime so the
    // offender index stays consistent.
    unknown: BTreeMap<CrimeId, Crime>,
    known: BTreeMap<CrimeId, Crime>,
    stale: BTreeMap<CrimeId, Crime>,
    resolved: BTreeMap<CrimeId, Crime>,
    active_by_offender: BTreeMap<ActorId, BTreeSet<CrimeId>>,
    convictions: BTreeMap<ActorId, u32>,
    pending_sentencing: BTreeSet<ActorId>,
    fines: BTreeMap<FineId, Fine>,
    custody: BTreeMap<ActorId, CustodyRecord>,
    bonds: BTreeMap<ActorId, u64>,
    bail: BTreeMap<ActorId, BailRecord>,
    locations: JurisdictionLocations,
    events: Vec<LegalEvent>,
}

impl LegalAuthority {
    /// Create an empty jurisdiction.
    pub fn new(id: JurisdictionId, name: &str, config: JusticeConfig) -> Self {
        Self {
            id,
            name: name.to_owned(),
            config,
            currency: None,
            enforcement_zone: BTreeSet::new(),
            auto_convict: true,
            imprisonment_gate: None,
            registry: PredicateRegistry::new(),
            laws: BTreeMap::new(),
            classes: BTreeMap::new(),
            authorities: BTreeMap::new(),
            profiles: BTreeMap::new(),
            location_profiles: BTreeMap::new(),
            unknown: BTreeMap::new(),
            known: BTreeMap::new(),
            stale: BTreeMap::new(),
            resolved: BTreeMap::new(),
            active_by_offender: BTreeMap::new(),
            convictions: BTreeMap::new(),
            pending_sentencing: BTreeSet::new(),
            fines: BTreeMap::new(),
            custody: BTreeMap::new(),
            bonds: BTreeMap::new(),
            bail: BTreeMap::new(),
            locations: JurisdictionLocations::default(),
            events: Vec::new(),
        }
    }

    // ---- Configuration ----

    /// The justice timing parameters.
    pub const fn config(&self) -> &JusticeConfig {
        &self.config
    }

    /// The predicate registry used by configuration and administration.
    pub const fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Mutable registry access.
    pub const fn registry_mut(&mut self) -> &mut PredicateRegistry {
        &mut self.registry
    }

    /// The fixed locations.
    pub const fn locations(&self) -> &JurisdictionLocations {
        &self.locations
    }

    /// Set the fixed locations.
    pub const fn set_locations(&mut self, locations: JurisdictionLocations) {
        self.locations = locations;
    }

    /// The world currency fines and bail are denominated in, when set.
    pub const fn currency(&self) -> Option<CurrencyId> {
        self.currency
    }

    /// Denominate fines and bail in the given world currency.
    pub const fn set_currency(&mut self, currency: CurrencyId) {
        self.currency = Some(currency);
    }

    /// The locations this jurisdiction polices. Empty means everywhere.
    pub const fn enforcement_zone(&self) -> &BTreeSet<LocationId> {
        &self.enforcement_zone
    }

    /// Add a location to the enforcement zone.
    pub fn add_zone_location(&mut self, location: LocationId) {
        self.enforcement_zone.insert(location);
    }

    /// Whether the jurisdiction takes notice of events at a location.
    pub fn in_zone(&self, location: LocationId) -> bool {
        self.enforcement_zone.is_empty() || self.enforcement_zone.contains(&location)
    }

    /// Whether the heartbeat convicts arrested offenders automatically.
    pub const fn auto_convict(&self) -> bool {
        self.auto_convict
    }

    /// Enable or disable automatic conviction.
    pub const fn set_auto_convict(&mut self, enabled: bool) {
        self.auto_convict = enabled;
    }

    /// Install a predicate that exempts actors from imprisonment. An
    /// exempted offender still pays fines and carries bonds.
    pub fn set_imprisonment_gate(&mut self, gate: ActorPredicate) {
        self.imprisonment_gate = Some(gate);
    }

    /// Register a law.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] when a law of that name
    /// already exists.
    pub fn add_law(&mut self, law: Law) -> Result<LawId, AuthorityError> {
        if self.laws.values().any(|l| l.name == law.name) {
            return Err(LawError::DuplicateName(law.name).into());
        }
        let id = law.id;
        self.laws.insert(id, law);
        Ok(id)
    }

    /// Register a legal class.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] on name collision.
    pub fn add_class(&mut self, class: LegalClass) -> Result<LegalClassId, AuthorityError> {
        if self.classes.values().any(|c| c.name == class.name) {
            return Err(LawError::DuplicateName(class.name).into());
        }
        let id = class.id;
        self.classes.insert(id, class);
        Ok(id)
    }

    /// Register an enforcement authority.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] on name collision.
    pub fn add_authority(
        &mut self,
        authority: EnforcementAuthority,
    ) -> Result<EnforcementAuthorityId, AuthorityError> {
        if self.authorities.values().any(|a| a.name == authority.name) {
            return Err(LawError::DuplicateName(authority.name).into());
        }
        let id = authority.id;
        self.authorities.insert(id, authority);
        Ok(id)
    }

    /// Add an inclusion edge between two authorities.
    ///
    /// # Errors
    ///
    /// Propagates the graph layer's missing-endpoint and cycle errors.
    pub fn add_inclusion(
        &mut self,
        includer: EnforcementAuthorityId,
        included: EnforcementAuthorityId,
    ) -> Result<(), AuthorityError> {
        try_add_inclusion(&mut self.authorities, includer, included)?;
        Ok(())
    }

    /// Register a witness profile.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::DuplicateName`] on name collision and
    /// propagates the profile's own validation errors.
    pub fn add_witness_profile(
        &mut self,
        profile: WitnessProfile,
    ) -> Result<WitnessProfileId, AuthorityError> {
        profile.validate()?;
        if self.profiles.values().any(|p| p.name == profile.name) {
            return Err(LawError::DuplicateName(profile.name).into());
        }
        let id = profile.id;
        self.profiles.insert(id, profile);
        Ok(id)
    }

    /// Assign a witness profile to a location.
    ///
    /// # Errors
    ///
    /// Returns [`LawError::InvalidConfig`] for an unknown profile id.
    pub fn assign_witness_profile(
        &mut self,
        location: LocationId,
        profile: WitnessProfileId,
    ) -> Result<(), AuthorityError> {
        if !self.profiles.contains_key(&profile) {
            return Err(LawError::InvalidConfig {
                reason: format!("unknown witness profile: {profile}"),
            }
            .into());
        }
        self.location_profiles.insert(location, profile);
        Ok(())
    }

    // ---- Lookups ----

    /// Look up a law.
    pub fn law(&self, id: LawId) -> Option<&Law> {
        self.laws.get(&id)
    }

    /// All registered laws.
    pub fn laws(&self) -> impl Iterator<Item = &Law> {
        self.laws.values()
    }

    /// Look up a legal class.
    pub fn class(&self, id: LegalClassId) -> Option<&LegalClass> {
        self.classes.get(&id)
    }

    /// All registered classes.
    pub fn classes(&self) -> impl Iterator<Item = &LegalClass> {
        self.classes.values()
    }

    /// Look up an enforcement authority.
    pub fn authority(&self, id: EnforcementAuthorityId) -> Option<&EnforcementAuthority> {
        self.authorities.get(&id)
    }

    /// All enforcement authorities.
    pub fn authorities(
        &self,
    ) -> impl Iterator<Item = &EnforcementAuthority> {
        self.authorities.values()
    }

    /// The authority map, for closure computations.
    pub const fn authority_map(
        &self,
    ) -> &BTreeMap<EnforcementAuthorityId, EnforcementAuthority> {
        &self.authorities
    }

    /// Look up a witness profile.
    pub fn witness_profile(&self, id: WitnessProfileId) -> Option<&WitnessProfile> {
        self.profiles.get(&id)
    }

    /// All witness profiles.
    pub fn witness_profiles(&self) -> impl Iterator<Item = &WitnessProfile> {
        self.profiles.values()
    }

    /// Resolve an actor's legal class from their facts.
    pub fn resolve_actor_class(&self, facts: &ActorFacts) -> Option<&LegalClass> {
        resolve_class(self.classes.values(), facts)
    }

    /// Find a crime in any bucket.
    pub fn crime(&self, id: CrimeId) -> Option<&Crime> {
        self.unknown
            .get(&id)
            .or_else(|| self.known.get(&id))
            .or_else(|| self.stale.get(&id))
            .or_else(|| self.resolved.get(&id))
    }

    /// Bucket sizes: `(unknown, known, stale, resolved)`.
    pub fn bucket_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.unknown.len(),
            self.known.len(),
            self.stale.len(),
            self.resolved.len(),
        )
    }

    /// Known crimes, in id order.
    pub fn known_crimes(&self) -> impl Iterator<Item = &Crime> {
        self.known.values()
    }

    /// Unresolved (unknown or known) crimes of one offender.
    pub fn active_crimes_of(&self, offender: ActorId) -> Vec<&Crime> {
        self.active_by_offender
            .get(&offender)
            .into_iter()
            .flatten()
            .filter_map(|id| self.unknown.get(id).or_else(|| self.known.get(id)))
            .collect()
    }

    /// Conviction count of an offender.
    pub fn conviction_count(&self, offender: ActorId) -> u32 {
        self.convictions.get(&offender).copied().unwrap_or(0)
    }

    /// The offender's custody record, if they are serving a sentence.
    pub fn custody(&self, offender: ActorId) -> Option<&CustodyRecord> {
        self.custody.get(&offender)
    }

    /// The offender's bail record, if they are out on bail.
    pub fn bail(&self, offender: ActorId) -> Option<&BailRecord> {
        self.bail.get(&offender)
    }

    /// Whether the actor is under a good-behaviour bond at `now`.
    pub fn under_bond(&self, actor: ActorId, now: u64) -> bool {
        self.bonds.get(&actor).is_some_and(|until| *until > now)
    }

    /// A fine by id.
    pub fn fine(&self, id: FineId) -> Option<&Fine> {
        self.fines.get(&id)
    }

    /// Unpaid fines of one actor.
    pub fn unpaid_fines_of(&self, actor: ActorId) -> Vec<&Fine> {
        self.fines
            .values()
            .filter(|f| f.actor == actor && !f.paid)
            .collect()
    }

    /// Drain the accumulated milestone events.
    pub fn drain_events(&mut self) -> Vec<LegalEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Offense matching ----

    /// Non-mutating test: which auto-apply laws would the report violate?
    pub fn would_be_offense<D>(
        &self,
        directory: &D,
        now: u64,
        report: &OffenseReport,
    ) -> Vec<LawId>
    where
        D: ActorDirectory + ?Sized,
    {
        let Some(parties) = self.assemble_parties(directory, now, report) else {
            return Vec::new();
        };
        if !self.in_zone(parties.facts.location) {
            return Vec::new();
        }
        self.matching_laws(&parties)
    }

    /// Evaluate a reported world event against the auto-apply laws and
    /// create crime records for every violation found.
    ///
    /// Repeat offenses inside the suppression window fold into the
    /// existing record instead of creating a new one. Each created crime
    /// snapshots the offender's characteristics, records co-located
    /// perceiving witnesses, and runs the location's witness-profile
    /// disclosure rolls. Returns the created crime ids.
    pub fn evaluate_possible_offense<D, R>(
        &mut self,
        directory: &D,
        rng: &mut R,
        now: u64,
        time_of_day: TimeOfDay,
        report: &OffenseReport,
    ) -> Vec<CrimeId>
    where
        D: ActorDirectory + ?Sized,
        R: Rng,
    {
        let Some(parties) = self.assemble_parties(directory, now, report) else {
            debug!(offender = %report.offender, "Offense report with unresolvable parties");
            return Vec::new();
        };
        if !self.in_zone(parties.facts.location) {
            debug!(
                offender = %report.offender,
                location = %parties.facts.location,
                "Offense outside the enforcement zone"
            );
            return Vec::new();
        }
        let law_ids = self.matching_laws(&parties);
        if law_ids.is_empty() {
            return Vec::new();
        }

        let location = parties.facts.location;
        let witnesses: Vec<ActorId> = directory
            .actors_at(location)
            .into_iter()
            .filter(|w| *w != report.offender)
            .filter(|w| directory.perceives(*w, location))
            .collect();

        let mut created = Vec::new();
        for law_id in law_ids {
            let Some(law) = self.laws.get(&law_id) else {
                continue;
            };
            if law.suppress_repeats {
                if let Some(existing) = self.find_repeat(report, location, now) {
                    debug!(crime = %existing, law = %law.name, "Folding repeat offense");
                    if let Some(crime) = self
                        .unknown
                        .get_mut(&existing)
                        .or_else(|| self.known.get_mut(&existing))
                    {
                        for &witness in &witnesses {
                            crime.add_witness(witness);
                        }
                    }
                    continue;
                }
            }

            let appearance = directory
                .resolve(report.offender)
                .resolved()
                .map(|r| r.characteristics)
                .unwrap_or_default();
            let mut crime = Crime::new(
                CrimeId::new(),
                law_id,
                report.category,
                self.id,
                report.offender,
                report.victim,
                report.object,
                location,
                now,
                appearance,
                report.note.clone(),
            );
            for &witness in &witnesses {
                crime.add_witness(witness);
            }
            info!(
                crime = %crime.id,
                law = %law.name,
                offender = %report.offender,
                witnesses = witnesses.len(),
                "Crime recorded"
            );
            self.push_event(
                LegalEventKind::CrimeRecorded,
                report.offender,
                Some(crime.id),
                now,
                &report.note,
            );

            self.run_disclosure(directory, &mut *rng, &mut crime, &parties, time_of_day, now);
            created.push(crime.id);
            self.place_crime(crime);
        }
        created
    }

    /// A formal accusation by an enforcement authority, for laws that
    /// are not auto-applied. Establishes the offender's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::AccusationRefused`] when the authority
    /// cannot accuse the offender's class, and propagates lifecycle
    /// errors from the crime record.
    pub fn accuse<D>(
        &mut self,
        directory: &D,
        crime_id: CrimeId,
        authority: EnforcementAuthorityId,
        accuser: ActorId,
        now: u64,
    ) -> Result<(), AuthorityError>
    where
        D: ActorDirectory + ?Sized,
    {
        let offender = self
            .crime(crime_id)
            .ok_or(AuthorityError::UnknownCrime(crime_id))?
            .offender;
        let offender_class = directory
            .facts(offender)
            .resolved()
            .and_then(|facts| self.resolve_actor_class(&facts).map(|c| c.id));
        let Some(class) = offender_class else {
            return Err(AuthorityError::AccusationRefused { authority });
        };
        if !authority_can_accuse(&self.authorities, authority, class) {
            return Err(AuthorityError::AccusationRefused { authority });
        }

        let mut crime = self
            .take_crime(crime_id)
            .ok_or(AuthorityError::UnknownCrime(crime_id))?;
        let result = crime
            .mark_reported(now, Some(accuser))
            .and_then(|()| crime.mark_identity_known());
        self.place_crime(crime);
        result?;
        self.push_event(
            LegalEventKind::CrimeReported,
            offender,
            Some(crime_id),
            now,
            "formal accusation",
        );
        Ok(())
    }

    // ---- Adjudication ----

    /// Stamp an arrest on a crime and mark the offender for sentencing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::UnknownCrime`] for a missing id and
    /// propagates lifecycle errors (finalized, already arrested).
    pub fn record_arrest(&mut self, crime_id: CrimeId, now: u64) -> Result<(), AuthorityError> {
        let mut crime = self
            .take_crime(crime_id)
            .ok_or(AuthorityError::UnknownCrime(crime_id))?;
        let offender = crime.offender;
        let result = crime.record_arrest(now);
        self.place_crime(crime);
        result?;
        self.pending_sentencing.insert(offender);
        self.push_event(LegalEventKind::Arrest, offender, Some(crime_id), now, "");
        Ok(())
    }

    /// Forgive a crime outright, moving it to the resolved bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::UnknownCrime`] for a missing id and
    /// [`LawError::CrimeFinalized`] for an already-convicted crime.
    pub fn forgive_crime(&mut self, crime_id: CrimeId, now: u64) -> Result<(), AuthorityError> {
        let mut crime = self
            .take_crime(crime_id)
            .ok_or(AuthorityError::UnknownCrime(crime_id))?;
        let offender = crime.offender;
        let result = crime.forgive();
        self.place_crime(crime);
        result?;
        self.push_event(LegalEventKind::Forgiveness, offender, Some(crime_id), now, "");
        Ok(())
    }

    /// Move unresolved crimes past their law's investigation window into
    /// the stale bucket. A window of zero means the law never goes
    /// stale. Returns how many records moved.
    pub fn stale_sweep(&mut self, now: u64) -> usize {
        let mut expired = Vec::new();
        for crime in self.unknown.values().chain(self.known.values()) {
            if crime.is_enforced() {
                continue;
            }
            let Some(law) = self.laws.get(&crime.law) else {
                continue;
            };
            if law.investigation_window_ticks == 0 {
                continue;
            }
            if now.saturating_sub(crime.committed_tick) > law.investigation_window_ticks {
                expired.push(crime.id);
            }
        }
        let moved = expired.len();
        for id in expired {
            if let Some(mut crime) = self.take_crime(id) {
                if let Err(error) = crime.mark_stale() {
                    warn!(crime = %id, %error, "Stale sweep skipped crime");
                }
                self.place_crime(crime);
            }
        }
        if moved > 0 {
            debug!(moved, "Stale sweep time-barred crimes");
        }
        moved
    }

    /// Offenders in the sentencing queue with at least one crime ready
    /// for automatic conviction at `now`, excluding those out on bail.
    /// Empty when the jurisdiction's auto-convict flag is off.
    pub fn convictable_offenders(&self, now: u64) -> Vec<ActorId> {
        if !self.auto_convict {
            return Vec::new();
        }
        let delay = self.config.post_arrest_delay_ticks;
        let mut offenders: BTreeSet<ActorId> = BTreeSet::new();
        for crime in self.known.values() {
            if crime.eligible_for_auto_conviction(now, delay)
                && self.pending_sentencing.contains(&crime.offender)
                && !self.bail.contains_key(&crime.offender)
            {
                offenders.insert(crime.offender);
            }
        }
        offenders.into_iter().collect()
    }

    /// Whether an offender is marked for the sentencing queue.
    pub fn awaiting_sentencing(&self, actor: ActorId) -> bool {
        self.pending_sentencing.contains(&actor)
    }

    /// Whether the jurisdiction may take this offender into custody. An
    /// exempted offender still pays fines and carries bonds.
    fn may_imprison<D>(&self, directory: &D, offender: ActorId) -> bool
    where
        D: ActorDirectory + ?Sized,
    {
        let Some(gate) = &self.imprisonment_gate else {
            return true;
        };
        let facts = directory
            .facts(offender)
            .resolved()
            .unwrap_or_else(|| ActorFacts::bare(offender));
        let allowed = gate.eval(&facts);
        if !allowed {
            info!(%offender, gate = gate.name(), "Imprisonment exempted");
        }
        allowed
    }

    /// Convict an offender across all their conviction-ready crimes.
    ///
    /// Punishments aggregate: fines sum, custodial ticks sum, execution
    /// is sticky, the longest bond wins. Each crime is finalized with its
    /// own resolved outcome; the aggregate drives the fine ledger, the
    /// custody record, and the bond.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::OnBail`] for a bailed offender and
    /// propagates finalization errors.
    pub fn convict_offender<D>(
        &mut self,
        directory: &mut D,
        offender: ActorId,
        now: u64,
    ) -> Result<PunishmentOutcome, AuthorityError>
    where
        D: ActorDirectory + ?Sized,
    {
        if self.bail.contains_key(&offender) {
            return Err(AuthorityError::OnBail(offender));
        }
        let delay = self.config.post_arrest_delay_ticks;
        let ready: Vec<CrimeId> = self
            .known
            .values()
            .filter(|c| c.offender == offender && c.eligible_for_auto_conviction(now, delay))
            .map(|c| c.id)
            .collect();

        let mut total = PunishmentOutcome::NONE;
        for crime_id in ready {
            let Some(mut crime) = self.take_crime(crime_id) else {
                continue;
            };
            let priors = self.conviction_count(offender);
            let outcome = self
                .laws
                .get(&crime.law)
                .map(|law| law.punishment.resolve(priors))
                .unwrap_or(PunishmentOutcome::NONE);
            let result = crime.finalize_conviction(outcome);
            self.place_crime(crime);
            result?;
            total.absorb(outcome);
            let count = self.convictions.entry(offender).or_insert(0);
            *count = count.saturating_add(1);
            self.push_event(LegalEventKind::Conviction, offender, Some(crime_id), now, "");
        }

        // The sentencing marker lifts only once no arrested, unfinalized
        // crime remains, so an offender with a second arrest still awaiting
        // its post-arrest delay stays queued.
        let still_pending = self
            .known
            .values()
            .any(|c| c.offender == offender && c.is_enforced() && !c.is_finalized());
        if !still_pending {
            self.pending_sentencing.remove(&offender);
        }

        if total.is_none() {
            return Ok(total);
        }

        if total.fine > Decimal::ZERO {
            let fine = Fine {
                id: FineId::new(),
                actor: offender,
                crime: None,
                amount: total.fine,
                currency: self.currency,
                due_tick: now.saturating_add(self.config.fine_due_ticks),
                paid: false,
            };
            self.fines.insert(fine.id, fine);
        }
        if total.custodial_ticks > 0 && self.may_imprison(directory, offender) {
            let release_tick = now.saturating_add(total.custodial_ticks);
            let belongings = directory.confiscate_belongings(offender);
            match self.custody.get_mut(&offender) {
                Some(record) => {
                    record.release_tick = record.release_tick.max(release_tick);
                    record.belongings.extend(belongings);
                }
                None => {
                    self.custody.insert(
                        offender,
                        CustodyRecord {
                            actor: offender,
                            release_tick,
                            belongings,
                        },
                    );
                }
            }
        }
        if total.bond_ticks > 0 {
            let bond_until = now
                .saturating_add(total.custodial_ticks)
                .saturating_add(total.bond_ticks);
            let entry = self.bonds.entry(offender).or_insert(0);
            *entry = (*entry).max(bond_until);
        }
        info!(
            %offender,
            fine = %total.fine,
            custodial_ticks = total.custodial_ticks,
            execute = total.execute,
            "Offender convicted"
        );
        Ok(total)
    }

    // ---- Bail ----

    /// Post bail for an arrested offender against their first
    /// bail-eligible crime. The amount leaves the payer's purse into
    /// escrow. Returns the amount held.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::NotBailEligible`] when no arrested
    /// crime permits bail, and propagates ledger failures.
    pub fn post_bail<A>(
        &mut self,
        accounts: &mut A,
        offender: ActorId,
        payer: crate::services::AccountOwner,
        now: u64,
    ) -> Result<Decimal, AuthorityError>
    where
        A: CurrencyAccounts + ?Sized,
    {
        let eligible = self.known.values().find(|c| {
            c.offender == offender
                && c.is_enforced()
                && !c.is_finalized()
                && self
                    .laws
                    .get(&c.law)
                    .is_some_and(|law| law.bail_eligible)
        });
        let Some(crime) = eligible else {
            return Err(AuthorityError::NotBailEligible(offender));
        };
        let crime_id = crime.id;
        let Some(law) = self.laws.get(&crime.law) else {
            return Err(AuthorityError::UnknownLaw(crime.law));
        };
        let amount = law.bail_amount;
        let return_by_tick = now.saturating_add(law.bail_return_ticks);

        accounts.debit(payer, amount)?;
        self.bail.insert(
            offender,
            BailRecord {
                actor: offender,
                crime: crime_id,
                amount,
                return_by_tick,
            },
        );
        self.pending_sentencing.remove(&offender);
        self.push_event(LegalEventKind::BailPosted, offender, Some(crime_id), now, "");
        Ok(amount)
    }

    /// The offender returned in time: refund the escrowed amount and
    /// put them back in the sentencing queue.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::NotBailEligible`] when no bail record
    /// exists, and propagates ledger failures.
    pub fn conclude_bail<A>(
        &mut self,
        accounts: &mut A,
        offender: ActorId,
        refund_to: crate::services::AccountOwner,
    ) -> Result<(), AuthorityError>
    where
        A: CurrencyAccounts + ?Sized,
    {
        let record = self
            .bail
            .remove(&offender)
            .ok_or(AuthorityError::NotBailEligible(offender))?;
        accounts.credit(refund_to, record.amount)?;
        self.pending_sentencing.insert(offender);
        Ok(())
    }

    /// Bailed offenders past their return deadline.
    pub fn bail_skips(&self, now: u64) -> Vec<ActorId> {
        self.bail
            .values()
            .filter(|record| now > record.return_by_tick)
            .map(|record| record.actor)
            .collect()
    }

    /// Forfeit a bail escrow into the jurisdiction's treasury.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::NotBailEligible`] when no bail record
    /// exists, and propagates ledger failures.
    pub fn forfeit_bail<A>(
        &mut self,
        accounts: &mut A,
        offender: ActorId,
        now: u64,
    ) -> Result<Decimal, AuthorityError>
    where
        A: CurrencyAccounts + ?Sized,
    {
        let record = self
            .bail
            .remove(&offender)
            .ok_or(AuthorityError::NotBailEligible(offender))?;
        accounts.credit(
            crate::services::AccountOwner::Jurisdiction(self.id),
            record.amount,
        )?;
        self.pending_sentencing.insert(offender);
        self.push_event(
            LegalEventKind::BailForfeited,
            offender,
            Some(record.crime),
            now,
            "",
        );
        Ok(record.amount)
    }

    // ---- Sentences and fines ----

    /// Prisoners whose release tick has passed.
    pub fn completed_sentences(&self, now: u64) -> Vec<ActorId> {
        self.custody
            .values()
            .filter(|record| now >= record.release_tick)
            .map(|record| record.actor)
            .collect()
    }

    /// Release a prisoner: return stored belongings where possible and
    /// move them to the release location.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::NotInCustody`] when no custody record
    /// exists.
    pub fn release_offender<D>(
        &mut self,
        directory: &mut D,
        offender: ActorId,
        now: u64,
    ) -> Result<(), AuthorityError>
    where
        D: ActorDirectory + ?Sized,
    {
        let record = self
            .custody
            .remove(&offender)
            .ok_or(AuthorityError::NotInCustody(offender))?;
        if let Err(error) = directory.return_belongings(offender, record.belongings) {
            // The items stay lost; the release still proceeds.
            warn!(%offender, %error, "Could not return stored belongings");
        }
        if let Some(release) = self.locations.release {
            if let Err(error) = directory.move_actor(offender, release) {
                warn!(%offender, %error, "Could not move released offender");
            }
        }
        self.push_event(LegalEventKind::Release, offender, None, now, "");
        Ok(())
    }

    /// Pay a fine from an account into the jurisdiction treasury.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::UnknownFine`] for a missing id and
    /// propagates ledger failures; an already-paid fine is a no-op.
    pub fn pay_fine<A>(
        &mut self,
        accounts: &mut A,
        fine_id: FineId,
        payer: crate::services::AccountOwner,
    ) -> Result<(), AuthorityError>
    where
        A: CurrencyAccounts + ?Sized,
    {
        let treasury = crate::services::AccountOwner::Jurisdiction(self.id);
        let fine = self
            .fines
            .get_mut(&fine_id)
            .ok_or(AuthorityError::UnknownFine(fine_id))?;
        if fine.paid {
            return Ok(());
        }
        accounts.transfer(payer, treasury, fine.amount)?;
        fine.paid = true;
        Ok(())
    }

    /// Debtors at a location with overdue fines whose legal class
    /// permits detention for unpaid fines.
    pub fn overdue_fine_debtors<D>(
        &self,
        directory: &D,
        at: LocationId,
        now: u64,
    ) -> Vec<ActorId>
    where
        D: ActorDirectory + ?Sized,
    {
        let mut debtors = BTreeSet::new();
        for fine in self.fines.values() {
            if fine.paid || now <= fine.due_tick {
                continue;
            }
            if directory.location_of(fine.actor) != Some(at) {
                continue;
            }
            let detainable = directory
                .facts(fine.actor)
                .resolved()
                .and_then(|facts| self.resolve_actor_class(&facts))
                .is_some_and(|class| class.detainable_for_unpaid_fines);
            if detainable {
                debtors.insert(fine.actor);
            }
        }
        debtors.into_iter().collect()
    }

    // ---- Patrol support ----

    /// Known, identity-established, unenforced offenders visible at a
    /// location, with their law's enforcement response.
    pub fn sighted_offenders<D>(&self, directory: &D, at: LocationId) -> Vec<SightedOffender>
    where
        D: ActorDirectory + ?Sized,
    {
        self.known
            .values()
            .filter(|c| c.identity_known() && !c.is_enforced() && !c.is_finalized())
            .filter(|c| directory.location_of(c.offender) == Some(at))
            .filter_map(|c| {
                let law = self.laws.get(&c.law)?;
                Some(SightedOffender {
                    actor: c.offender,
                    crime: c.id,
                    category: c.category,
                    response: law.response,
                })
            })
            .collect()
    }

    /// Whether a crime is still actionable for engagement: known,
    /// unenforced, unresolved.
    pub fn crime_actionable(&self, id: CrimeId) -> bool {
        self.known
            .get(&id)
            .is_some_and(|c| !c.is_enforced() && !c.is_finalized())
    }

    // ---- Internal plumbing ----

    fn assemble_parties<D>(
        &self,
        directory: &D,
        now: u64,
        report: &OffenseReport,
    ) -> Option<Parties>
    where
        D: ActorDirectory + ?Sized,
    {
        let offender_facts = directory.facts(report.offender).resolved()?;
        let location = offender_facts.location?;
        let offender_class = self.resolve_actor_class(&offender_facts).map(|c| c.id);

        let victim_facts = match report.victim {
            Some(victim) => match directory.facts(victim) {
                Resolution::Resolved(facts) => Some(facts),
                Resolution::Unresolved => return None,
            },
            None => None,
        };
        let victim_class = victim_facts
            .as_ref()
            .map(|facts| self.resolve_actor_class(facts).map(|c| c.id));

        let facts = OffenseFacts {
            category: report.category,
            offender: offender_facts,
            victim: victim_facts,
            location,
            tick: now,
        };
        Some(Parties {
            facts,
            offender_class,
            victim_class,
        })
    }

    fn matching_laws(&self, parties: &Parties) -> Vec<LawId> {
        let mut matches: Vec<&Law> = self
            .laws
            .values()
            .filter(|law| law.auto_apply && law.category == parties.facts.category)
            .filter(|law| {
                law.applies_to(parties.offender_class, parties.victim_class, &parties.facts)
            })
            .collect();
        matches.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        matches.into_iter().map(|law| law.id).collect()
    }

    fn find_repeat(
        &self,
        report: &OffenseReport,
        location: LocationId,
        now: u64,
    ) -> Option<CrimeId> {
        let window = self.config.repeat_suppression_window_ticks;
        self.active_by_offender
            .get(&report.offender)?
            .iter()
            .filter_map(|id| self.unknown.get(id).or_else(|| self.known.get(id)))
            .find(|crime| {
                crime.is_repeat_of(report.offender, report.victim, report.object, location)
                    && now.saturating_sub(crime.committed_tick) <= window
            })
            .map(|crime| crime.id)
    }

    fn run_disclosure<D, R>(
        &mut self,
        directory: &D,
        rng: &mut R,
        crime: &mut Crime,
        parties: &Parties,
        time_of_day: TimeOfDay,
        now: u64,
    ) where
        D: ActorDirectory + ?Sized,
        R: Rng,
    {
        let Some(profile) = self
            .location_profiles
            .get(&crime.location)
            .and_then(|id| self.profiles.get(id))
        else {
            return;
        };
        let witnesses = crime.witnesses.clone();
        for witness in witnesses {
            let Some(facts) = directory.facts(witness).resolved() else {
                continue;
            };
            let victim_class = parties.victim_class.flatten();
            match profile.witness_crime(
                crime,
                &facts,
                parties.offender_class,
                victim_class,
                time_of_day,
                now,
                rng,
            ) {
                Ok(outcome) => {
                    debug!(crime = %crime.id, %witness, ?outcome, "Disclosure roll");
                }
                Err(error) => {
                    warn!(crime = %crime.id, %witness, %error, "Disclosure roll failed");
                }
            }
        }
        if crime.disclosure() == DisclosureState::Known {
            self.push_event(
                LegalEventKind::CrimeReported,
                crime.offender,
                Some(crime.id),
                now,
                "",
            );
        }
    }

    fn take_crime(&mut self, id: CrimeId) -> Option<Crime> {
        let crime = self
            .unknown
            .remove(&id)
            .or_else(|| self.known.remove(&id))
            .or_else(|| self.stale.remove(&id))
            .or_else(|| self.resolved.remove(&id))?;
        if let Some(set) = self.active_by_offender.get_mut(&crime.offender) {
            set.remove(&id);
            if set.is_empty() {
                self.active_by_offender.remove(&crime.offender);
            }
        }
        Some(crime)
    }

    fn place_crime(&mut self, crime: Crime) {
        let id = crime.id;
        let offender = crime.offender;
        match crime.disclosure() {
            DisclosureState::Unknown => {
                self.unknown.insert(id, crime);
                self.active_by_offender.entry(offender).or_default().insert(id);
            }
            DisclosureState::Known => {
                self.known.insert(id, crime);
                self.active_by_offender.entry(offender).or_default().insert(id);
            }
            DisclosureState::Stale => {
                self.stale.insert(id, crime);
            }
            DisclosureState::Resolved => {
                self.resolved.insert(id, crime);
            }
        }
    }

    fn push_event(
        &mut self,
        kind: LegalEventKind,
        actor: ActorId,
        crime: Option<CrimeId>,
        tick: u64,
        detail: &str,
    ) {
        self.events.push(LegalEvent {
            kind,
            jurisdiction: self.id,
            actor,
            crime,
            tick,
            detail: detail.to_owned(),
        });
    }
}

/// Resolved parties of one offense report.
struct Parties {
    facts: OffenseFacts,
    offender_class: Option<LegalClassId>,
    /// `Some(..)` when a victim is present; inner option is their class.
    victim_class: Option<Option<LegalClassId>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use magistrate_law::{ActorPredicate, EnforcementResponse, PunishmentStrategy};

    use super::*;
    use crate::services::{AccountOwner, ActorRecord, MemoryAccounts, MemoryDirectory};

    // ---- Fixture ----

    struct Fixture {
        authority: LegalAuthority,
        directory: MemoryDirectory,
        square: LocationId,
        commoner: LegalClassId,
        theft_law: LawId,
    }

    fn fixture() -> Fixture {
        let mut authority = LegalAuthority::new(
            JurisdictionId::new(),
            "rivertown",
            JusticeConfig::default(),
        );
        let commoner = LegalClass {
            id: LegalClassId::new(),
            name: String::from("commoner"),
            membership: ActorPredicate::new("is-citizen", |facts| facts.has_tag("citizen")),
            priority: 0,
            detainable_for_unpaid_fines: true,
        };
        let commoner_id = authority.add_class(commoner).unwrap();

        let mut law = Law::new(LawId::new(), "petty-theft", OffenseCategory::Theft);
        law.offender_classes.insert(commoner_id);
        law.victim_classes.insert(commoner_id);
        law.response = EnforcementResponse::WarnThenArrest;
        law.punishment = PunishmentStrategy::Fine {
            amount: Decimal::new(25, 0),
        };
        law.auto_apply = true;
        law.arrestable = true;
        law.suppress_repeats = true;
        law.investigation_window_ticks = 3_000;
        let theft_law = authority.add_law(law).unwrap();

        Fixture {
            authority,
            directory: MemoryDirectory::new(),
            square: LocationId::new(),
            commoner: commoner_id,
            theft_law,
        }
    }

    fn citizen_at(directory: &mut MemoryDirectory, location: LocationId) -> ActorId {
        let mut record = ActorRecord::new(ActorId::new(), "citizen");
        record.location = Some(location);
        record.tags.insert(String::from("citizen"));
        let id = record.id;
        directory.upsert(record);
        id
    }

    fn theft_report(offender: ActorId, victim: ActorId) -> OffenseReport {
        OffenseReport {
            offender,
            category: OffenseCategory::Theft,
            victim: Some(victim),
            object: None,
            note: String::from("a purse went missing"),
        }
    }

    // ---- Matching ----

    #[test]
    fn offense_creates_unknown_crime_with_witnesses() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let bystander = citizen_at(&mut fx.directory, fx.square);
        let mut rng = StdRng::seed_from_u64(1);

        let created = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            100,
            TimeOfDay::Morning,
            &theft_report(offender, victim),
        );
        assert_eq!(created.len(), 1);
        let crime = fx
            .authority
            .crime(created.first().copied().unwrap())
            .unwrap();
        assert_eq!(crime.law, fx.theft_law);
        // Victim and bystander both witnessed; no disclosure profile is
        // assigned, so the record stays unknown.
        assert!(crime.witnesses.contains(&victim));
        assert!(crime.witnesses.contains(&bystander));
        assert_eq!(fx.authority.bucket_counts(), (1, 0, 0, 0));
    }

    #[test]
    fn actor_without_standing_matches_nothing() {
        let mut fx = fixture();
        // Offender lacks the citizen tag, so no class accepts them.
        let mut record = ActorRecord::new(ActorId::new(), "outlander");
        record.location = Some(fx.square);
        let offender = record.id;
        fx.directory.upsert(record);
        let victim = citizen_at(&mut fx.directory, fx.square);

        let matched = fx.authority.would_be_offense(
            &fx.directory,
            100,
            &theft_report(offender, victim),
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn repeat_within_window_folds_into_existing_crime() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let mut rng = StdRng::seed_from_u64(2);

        let report = theft_report(offender, victim);
        let first = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            100,
            TimeOfDay::Morning,
            &report,
        );
        assert_eq!(first.len(), 1);

        // 120 ticks later, inside the 600-tick window: folded.
        let second = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            220,
            TimeOfDay::Morning,
            &report,
        );
        assert!(second.is_empty());
        assert_eq!(fx.authority.bucket_counts(), (1, 0, 0, 0));

        // 900 ticks later, outside the window: a fresh record.
        let third = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            1_000,
            TimeOfDay::Morning,
            &report,
        );
        assert_eq!(third.len(), 1);
        assert_eq!(fx.authority.bucket_counts(), (2, 0, 0, 0));
    }

    #[test]
    fn would_be_offense_never_mutates() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);

        let matched = fx.authority.would_be_offense(
            &fx.directory,
            100,
            &theft_report(offender, victim),
        );
        assert_eq!(matched, vec![fx.theft_law]);
        assert_eq!(fx.authority.bucket_counts(), (0, 0, 0, 0));
    }

    // ---- Lifecycle through the aggregate ----

    fn known_crime(fx: &mut Fixture, offender: ActorId, victim: ActorId, now: u64) -> CrimeId {
        let mut rng = StdRng::seed_from_u64(3);
        let created = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            now,
            TimeOfDay::Morning,
            &theft_report(offender, victim),
        );
        let id = created.first().copied().unwrap();
        // Report it directly with identity, as an eyewitness would.
        let mut crime = fx.authority.take_crime(id).unwrap();
        crime.mark_reported(now, Some(victim)).unwrap();
        crime.mark_identity_known().unwrap();
        fx.authority.place_crime(crime);
        id
    }

    #[test]
    fn arrest_then_conviction_resolves_and_fines() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);

        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        // Not yet past the post-arrest delay (300 ticks).
        assert!(fx.authority.convictable_offenders(200).is_empty());
        assert_eq!(fx.authority.convictable_offenders(500), vec![offender]);

        let outcome = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 500)
            .unwrap();
        assert_eq!(outcome.fine, Decimal::new(25, 0));
        assert_eq!(fx.authority.bucket_counts(), (0, 0, 0, 1));
        assert_eq!(fx.authority.conviction_count(offender), 1);
        assert_eq!(fx.authority.unpaid_fines_of(offender).len(), 1);
    }

    #[test]
    fn finalized_crime_rejects_further_mutation() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        let _ = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 500)
            .unwrap();

        assert!(matches!(
            fx.authority.forgive_crime(crime_id, 600),
            Err(AuthorityError::Law(LawError::CrimeFinalized(_)))
        ));
    }

    #[test]
    fn stale_sweep_time_bars_old_crimes() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let mut rng = StdRng::seed_from_u64(4);
        let _ = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            100,
            TimeOfDay::Morning,
            &theft_report(offender, victim),
        );

        // Window is 3000 ticks; nothing moves early.
        assert_eq!(fx.authority.stale_sweep(2_000), 0);
        assert_eq!(fx.authority.stale_sweep(4_000), 1);
        assert_eq!(fx.authority.bucket_counts(), (0, 0, 1, 0));
        // Stale crimes leave the offender's active index.
        assert!(fx.authority.active_crimes_of(offender).is_empty());
    }

    #[test]
    fn bail_defers_conviction_and_skipping_forfeits() {
        let mut fx = fixture();
        // Make the theft law bail-eligible.
        let law = fx.authority.laws.get_mut(&fx.theft_law).unwrap();
        law.bail_eligible = true;
        law.bail_amount = Decimal::new(50, 0);
        law.bail_return_ticks = 200;

        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());

        let mut accounts = MemoryAccounts::new();
        let purse = AccountOwner::Actor(offender);
        accounts.credit(purse, Decimal::new(80, 0)).unwrap();

        let held = fx
            .authority
            .post_bail(&mut accounts, offender, purse, 160)
            .unwrap();
        assert_eq!(held, Decimal::new(50, 0));
        assert_eq!(accounts.balance(purse), Decimal::new(30, 0));

        // Out on bail: excluded from auto-conviction.
        assert!(fx.authority.convictable_offenders(1_000).is_empty());

        // Past the return deadline (160 + 200): a skip.
        assert_eq!(fx.authority.bail_skips(400), vec![offender]);
        let forfeited = fx
            .authority
            .forfeit_bail(&mut accounts, offender, 400)
            .unwrap();
        assert_eq!(forfeited, Decimal::new(50, 0));
        let treasury = AccountOwner::Jurisdiction(fx.authority.id);
        assert_eq!(accounts.balance(treasury), Decimal::new(50, 0));
        // No longer bailed: conviction may proceed.
        assert_eq!(fx.authority.convictable_offenders(1_000), vec![offender]);
    }

    // ---- Sentencing queue ----

    #[test]
    fn penaltyless_conviction_still_clears_the_sentencing_queue() {
        let mut fx = fixture();
        let law = fx.authority.laws.get_mut(&fx.theft_law).unwrap();
        law.punishment = PunishmentStrategy::Fine {
            amount: Decimal::ZERO,
        };

        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        assert!(fx.authority.awaiting_sentencing(offender));

        let outcome = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 500)
            .unwrap();
        assert!(outcome.is_none());
        // A zero-penalty outcome leaves nothing to collect, but the
        // offender must not stay queued for sentencing.
        assert!(!fx.authority.awaiting_sentencing(offender));
        assert!(fx.authority.convictable_offenders(1_000).is_empty());
    }

    #[test]
    fn sentencing_queue_follows_the_bail_lifecycle() {
        let mut fx = fixture();
        let law = fx.authority.laws.get_mut(&fx.theft_law).unwrap();
        law.bail_eligible = true;
        law.bail_amount = Decimal::new(50, 0);
        law.bail_return_ticks = 200;

        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        assert!(fx.authority.awaiting_sentencing(offender));

        let mut accounts = MemoryAccounts::new();
        let purse = AccountOwner::Actor(offender);
        accounts.credit(purse, Decimal::new(50, 0)).unwrap();
        fx.authority
            .post_bail(&mut accounts, offender, purse, 160)
            .unwrap();
        // Bail suspends the queue entry along with conviction.
        assert!(!fx.authority.awaiting_sentencing(offender));

        fx.authority
            .forfeit_bail(&mut accounts, offender, 400)
            .unwrap();
        assert!(fx.authority.awaiting_sentencing(offender));
        assert_eq!(fx.authority.convictable_offenders(1_000), vec![offender]);
    }

    #[test]
    fn queue_retains_offender_with_a_later_arrest_outstanding() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let other_victim = citizen_at(&mut fx.directory, fx.square);

        let first = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(first, 150).is_ok());
        // A second, unrelated theft well outside the repeat window.
        let second = known_crime(&mut fx, offender, other_victim, 1_000);
        assert!(fx.authority.record_arrest(second, 1_010).is_ok());

        // Only the first crime has cleared the post-arrest delay.
        let outcome = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 1_100)
            .unwrap();
        assert_eq!(outcome.fine, Decimal::new(25, 0));
        assert!(fx.authority.awaiting_sentencing(offender));
        assert_eq!(fx.authority.convictable_offenders(1_400), vec![offender]);

        let _ = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 1_400)
            .unwrap();
        assert!(!fx.authority.awaiting_sentencing(offender));
    }

    #[test]
    fn auto_convict_toggle_empties_the_queue() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());

        fx.authority.set_auto_convict(false);
        assert!(fx.authority.convictable_offenders(1_000).is_empty());
        fx.authority.set_auto_convict(true);
        assert_eq!(fx.authority.convictable_offenders(1_000), vec![offender]);
    }

    // ---- Jurisdiction configuration ----

    #[test]
    fn offenses_outside_the_enforcement_zone_are_ignored() {
        let mut fx = fixture();
        let market = LocationId::new();
        fx.authority.add_zone_location(market);

        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let mut rng = StdRng::seed_from_u64(5);
        let report = theft_report(offender, victim);

        // The square is outside the configured zone.
        assert!(fx.authority.would_be_offense(&fx.directory, 100, &report).is_empty());
        let created = fx.authority.evaluate_possible_offense(
            &fx.directory,
            &mut rng,
            100,
            TimeOfDay::Morning,
            &report,
        );
        assert!(created.is_empty());
        assert_eq!(fx.authority.bucket_counts(), (0, 0, 0, 0));

        fx.authority.add_zone_location(fx.square);
        assert_eq!(
            fx.authority.would_be_offense(&fx.directory, 100, &report),
            vec![fx.theft_law]
        );
    }

    #[test]
    fn fines_carry_the_jurisdiction_currency() {
        let mut fx = fixture();
        let coin = CurrencyId::new();
        fx.authority.set_currency(coin);

        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        let _ = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 500)
            .unwrap();

        let fines = fx.authority.unpaid_fines_of(offender);
        assert_eq!(fines.first().unwrap().currency, Some(coin));
    }

    #[test]
    fn imprisonment_gate_exempts_custody_but_not_conviction() {
        let mut fx = fixture();
        let law = fx.authority.laws.get_mut(&fx.theft_law).unwrap();
        law.punishment = PunishmentStrategy::Custodial {
            ticks: 400,
            bond_ticks: 0,
        };
        fx.authority
            .set_imprisonment_gate(ActorPredicate::new("not-clergy", |facts| {
                !facts.has_tag("clergy")
            }));

        let mut record = ActorRecord::new(ActorId::new(), "curate");
        record.location = Some(fx.square);
        record.tags.insert(String::from("citizen"));
        record.tags.insert(String::from("clergy"));
        let offender = record.id;
        fx.directory.upsert(record);
        let victim = citizen_at(&mut fx.directory, fx.square);

        let crime_id = known_crime(&mut fx, offender, victim, 100);
        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        let outcome = fx
            .authority
            .convict_offender(&mut fx.directory, offender, 500)
            .unwrap();
        assert_eq!(outcome.custodial_ticks, 400);
        // Convicted and finalized, but never taken into custody.
        assert_eq!(fx.authority.conviction_count(offender), 1);
        assert!(fx.authority.custody(offender).is_none());
    }

    #[test]
    fn sighted_offenders_require_identity_and_no_arrest() {
        let mut fx = fixture();
        let offender = citizen_at(&mut fx.directory, fx.square);
        let victim = citizen_at(&mut fx.directory, fx.square);
        let crime_id = known_crime(&mut fx, offender, victim, 100);

        let sighted = fx.authority.sighted_offenders(&fx.directory, fx.square);
        assert_eq!(sighted.len(), 1);
        let first = sighted.first().unwrap();
        assert_eq!(first.actor, offender);
        assert_eq!(first.response, EnforcementResponse::WarnThenArrest);

        assert!(fx.authority.record_arrest(crime_id, 150).is_ok());
        assert!(fx.authority.sighted_offenders(&fx.directory, fx.square).is_empty());
        assert!(!fx.authority.crime_actionable(crime_id));
    }
}

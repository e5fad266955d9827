//! The runnable justice world.
//!
//! [`JusticeWorld`] owns one jurisdiction's full apparatus: the clock,
//! the legal aggregate, the actor directory, the currency ledger, the
//! patrol controller, and the persistence plumbing. The engine binary
//! registers its cadence passes on a [`Scheduler`](crate::scheduler) and
//! calls [`JusticeWorld::advance`] once per tick.
//!
//! Patrols reach the world through [`PatrolContext`], implemented here on
//! a short-lived borrow bundle so the controller and the rest of the
//! world never fight over `&mut self`.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use magistrate_law::all_included;
use magistrate_patrol::{IdlePool, PatrolContext, PatrolController, PatrolError, SightedOffender};
use magistrate_types::{
    ActorId, CrimeId, EnforcementAuthorityId, JurisdictionId, LocationId, OffenseCategory,
    PatrolId, TimeOfDay,
};

use crate::admin::AdminRegistry;
use crate::authority::{LegalAuthority, OffenseReport};
use crate::clock::{ClockError, WorldClock};
use crate::config::MagistrateConfig;
use crate::heartbeat::{HeartbeatReport, run_heartbeat};
use crate::narration::NarrationTable;
use crate::notify::{NotificationChannel, notify};
use crate::persist::{DirtyTracker, EntityStore, MemoryStore};
use crate::services::{ActorDirectory, MemoryAccounts, MemoryDirectory};

const CRIME_KIND: &str = "crime";

/// One jurisdiction's complete simulation state.
pub struct JusticeWorld {
    clock: WorldClock,
    authority: LegalAuthority,
    directory: MemoryDirectory,
    accounts: MemoryAccounts,
    controller: PatrolController,
    narration: NarrationTable,
    admin: AdminRegistry,
    idle: IdlePool,
    enforcer_grants: BTreeMap<ActorId, BTreeSet<EnforcementAuthorityId>>,
    dirty: DirtyTracker,
    store: Box<dyn EntityStore + Send>,
    channel: Option<Box<dyn NotificationChannel>>,
    rng: StdRng,
}

impl std::fmt::Debug for JusticeWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JusticeWorld")
            .field("tick", &self.clock.tick())
            .field("jurisdiction", &self.authority.name)
            .field("live_patrols", &self.controller.live_patrols())
            .finish_non_exhaustive()
    }
}

impl JusticeWorld {
    /// Build a world from configuration with an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for an unusable tick-day.
    pub fn new(config: &MagistrateConfig) -> Result<Self, ClockError> {
        let clock = WorldClock::new(&config.time)?;
        let rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            clock,
            authority: LegalAuthority::new(
                JurisdictionId::new(),
                &config.world.name,
                config.justice.clone(),
            ),
            directory: MemoryDirectory::new(),
            accounts: MemoryAccounts::new(),
            controller: PatrolController::new(),
            narration: NarrationTable::new(),
            admin: AdminRegistry::with_builtins(),
            idle: IdlePool::new(),
            enforcer_grants: BTreeMap::new(),
            dirty: DirtyTracker::new(),
            store: Box::new(MemoryStore::new()),
            channel: None,
            rng,
        })
    }

    /// Replace the durable store.
    pub fn set_store(&mut self, store: Box<dyn EntityStore + Send>) {
        self.store = store;
    }

    /// Install a notification channel for legal milestones.
    pub fn set_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channel = Some(channel);
    }

    // ---- Accessors ----

    /// The world clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// The jurisdiction aggregate.
    pub const fn authority(&self) -> &LegalAuthority {
        &self.authority
    }

    /// Mutable jurisdiction access for setup and administration.
    pub const fn authority_mut(&mut self) -> &mut LegalAuthority {
        &mut self.authority
    }

    /// The actor directory.
    pub const fn directory(&self) -> &MemoryDirectory {
        &self.directory
    }

    /// Mutable directory access.
    pub const fn directory_mut(&mut self) -> &mut MemoryDirectory {
        &mut self.directory
    }

    /// The currency ledger.
    pub const fn accounts(&self) -> &MemoryAccounts {
        &self.accounts
    }

    /// Mutable ledger access.
    pub const fn accounts_mut(&mut self) -> &mut MemoryAccounts {
        &mut self.accounts
    }

    /// The patrol controller.
    pub const fn controller(&self) -> &PatrolController {
        &self.controller
    }

    /// Mutable controller access for route administration.
    pub const fn controller_mut(&mut self) -> &mut PatrolController {
        &mut self.controller
    }

    /// The narration table.
    pub const fn narration(&self) -> &NarrationTable {
        &self.narration
    }

    /// Mutable narration-table access.
    pub const fn narration_mut(&mut self) -> &mut NarrationTable {
        &mut self.narration
    }

    /// The admin capability registry.
    pub const fn admin(&self) -> &AdminRegistry {
        &self.admin
    }

    /// Idle enforcers currently available for patrol, by authority.
    pub const fn idle_pool(&self) -> &IdlePool {
        &self.idle
    }

    // ---- Setup ----

    /// Register an actor as an idle enforcer holding the given
    /// authorities. The inclusion closure is expanded here, so the
    /// enforcer can staff requirements for every authority their grants
    /// reach.
    pub fn register_enforcer(&mut self, actor: ActorId, held: &[EnforcementAuthorityId]) {
        let mut expanded = BTreeSet::new();
        for &authority in held {
            expanded.extend(all_included(self.authority.authority_map(), authority));
        }
        for &authority in &expanded {
            self.idle.entry(authority).or_default().insert(actor);
        }
        self.enforcer_grants.insert(actor, expanded);
    }

    /// Remove an enforcer from the idle pool and forget their grants.
    /// An enforcer out on patrol is simply not re-pooled when the patrol
    /// disbands.
    pub fn retire_enforcer(&mut self, actor: ActorId) {
        self.enforcer_grants.remove(&actor);
        for pool in self.idle.values_mut() {
            pool.remove(&actor);
        }
    }

    // ---- Tick and cadence passes ----

    /// Advance the clock one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at the end of representable
    /// time.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.clock.advance()?;
        Ok(self.clock.tick())
    }

    /// Report a possible offense into the rule engine.
    ///
    /// Matching, witness recording, and disclosure all happen here;
    /// resulting milestone events go out immediately. Returns the
    /// created crime ids.
    pub fn report_offense(&mut self, report: &OffenseReport) -> Vec<CrimeId> {
        let created = self.authority.evaluate_possible_offense(
            &self.directory,
            &mut self.rng,
            self.clock.tick(),
            self.clock.time_of_day(),
            report,
        );
        for &crime in &created {
            self.dirty.mark(CRIME_KIND, crime.into_inner());
        }
        self.dispatch_events();
        created
    }

    /// Fast-cadence pass: step every live patrol.
    pub fn patrol_pass(&mut self) {
        // The context gets a forked rng so the world's own stream stays
        // usable alongside it.
        let seed = self.rng.random();
        let mut ctx = EnforcementContext {
            tick: self.clock.tick(),
            time_of_day: self.clock.time_of_day(),
            authority: &mut self.authority,
            directory: &mut self.directory,
            rng: StdRng::seed_from_u64(seed),
            released: Vec::new(),
            touched: Vec::new(),
        };
        self.controller.step_patrols(&mut ctx);
        let EnforcementContext {
            released, touched, ..
        } = ctx;
        for actor in released {
            self.return_to_idle(actor);
        }
        for crime in touched {
            self.dirty.mark(CRIME_KIND, crime.into_inner());
        }
        self.dispatch_events();
    }

    /// Medium-cadence pass: launch patrols for routes whose staffing and
    /// schedule are met.
    pub fn muster_pass(&mut self) -> Vec<PatrolId> {
        let time_of_day = self.clock.time_of_day();
        let seed = self.rng.random();
        let ctx = EnforcementContext {
            tick: self.clock.tick(),
            time_of_day,
            authority: &mut self.authority,
            directory: &mut self.directory,
            rng: StdRng::seed_from_u64(seed),
            released: Vec::new(),
            touched: Vec::new(),
        };
        let launched = self
            .controller
            .muster(&ctx, time_of_day, &mut self.idle, &mut self.rng);
        if !launched.is_empty() {
            debug!(launched = launched.len(), "Muster pass launched patrols");
        }
        launched
    }

    /// Slow-cadence pass: justice heartbeat, then event delivery and a
    /// persistence flush.
    pub fn heartbeat_pass(&mut self) -> HeartbeatReport {
        let now = self.clock.tick();
        let time_of_day = self.clock.time_of_day();
        let report = run_heartbeat(
            &mut self.authority,
            &mut self.directory,
            &mut self.accounts,
            &mut self.rng,
            now,
            time_of_day,
        );
        for &offender in &report.executions {
            info!(%offender, "Sentence of execution carried out");
            self.directory.remove(offender);
            self.retire_enforcer(offender);
        }
        self.dispatch_events();
        self.flush();
        report
    }

    /// Post bail for an arrested offender from the given account.
    ///
    /// # Errors
    ///
    /// Propagates eligibility and ledger failures from the aggregate.
    pub fn post_bail(
        &mut self,
        offender: ActorId,
        payer: crate::services::AccountOwner,
    ) -> Result<rust_decimal::Decimal, crate::authority::AuthorityError> {
        let now = self.clock.tick();
        let held = self
            .authority
            .post_bail(&mut self.accounts, offender, payer, now)?;
        self.dispatch_events();
        Ok(held)
    }

    /// Pay a fine from the given account into the treasury.
    ///
    /// # Errors
    ///
    /// Propagates unknown-fine and ledger failures from the aggregate.
    pub fn pay_fine(
        &mut self,
        fine: magistrate_types::FineId,
        payer: crate::services::AccountOwner,
    ) -> Result<(), crate::authority::AuthorityError> {
        self.authority.pay_fine(&mut self.accounts, fine, payer)
    }

    /// Narrate a crime for player-facing output.
    pub fn narrate_crime(&self, crime: CrimeId) -> Option<String> {
        let crime = self.authority.crime(crime)?;
        let offender = self.display_name(crime.offender);
        let victim = crime.victim.map(|v| self.display_name(v));
        let location = crime.location.to_string();
        Some(self.narration.narrate(
            crime.category,
            &crate::narration::NarrationFacts {
                offender: &offender,
                victim: victim.as_deref(),
                location: &location,
            },
        ))
    }

    // ---- Internal ----

    fn return_to_idle(&mut self, actor: ActorId) {
        let Some(grants) = self.enforcer_grants.get(&actor) else {
            return;
        };
        for authority in grants {
            self.idle.entry(*authority).or_default().insert(actor);
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.authority.drain_events() {
            if let Some(crime) = event.crime {
                self.dirty.mark(CRIME_KIND, crime.into_inner());
            }
            notify(self.channel.as_deref(), &event);
        }
    }

    fn flush(&mut self) {
        for (kind, id) in self.dirty.drain() {
            let result = if kind == CRIME_KIND {
                match self.authority.crime(CrimeId::from(id)) {
                    Some(crime) => self.store.upsert(&kind, id, crime_record(crime)),
                    None => self.store.delete(&kind, id),
                }
            } else {
                self.store.delete(&kind, id)
            };
            if let Err(error) = result {
                warn!(%kind, %id, %error, "Persistence flush failed for record");
            }
        }
    }

    fn display_name(&self, actor: ActorId) -> String {
        self.directory
            .resolve(actor)
            .resolved()
            .map_or_else(|| actor.to_string(), |record| record.name)
    }
}

/// Durable projection of a crime record.
fn crime_record(crime: &magistrate_law::Crime) -> serde_json::Value {
    serde_json::json!({
        "id": crime.id.to_string(),
        "law": crime.law.to_string(),
        "category": crime.category.to_string(),
        "jurisdiction": crime.jurisdiction.to_string(),
        "offender": crime.offender.to_string(),
        "victim": crime.victim.map(|v| v.to_string()),
        "object": crime.object.map(|o| o.to_string()),
        "location": crime.location.to_string(),
        "committed_tick": crime.committed_tick,
        "disclosure": format!("{:?}", crime.disclosure()),
        "identity_known": crime.identity_known(),
        "enforced": crime.is_enforced(),
        "outcome": crime.outcome(),
        "witnesses": crime.witnesses.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "appearance": crime.appearance,
        "note": crime.note,
    })
}

// ---------------------------------------------------------------------------
// Patrol context
// ---------------------------------------------------------------------------

/// Short-lived borrow bundle patrols act through.
///
/// Roster returns and crime mutations are buffered here and applied by
/// the world after the controller hands the borrow back.
struct EnforcementContext<'a> {
    tick: u64,
    time_of_day: TimeOfDay,
    authority: &'a mut LegalAuthority,
    directory: &'a mut MemoryDirectory,
    rng: StdRng,
    released: Vec<ActorId>,
    touched: Vec<CrimeId>,
}

impl PatrolContext for EnforcementContext<'_> {
    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn locations_configured(&self) -> bool {
        self.authority.locations().configured()
    }

    fn actor_location(&self, actor: ActorId) -> Option<LocationId> {
        self.directory.location_of(actor)
    }

    fn move_toward(
        &mut self,
        actor: ActorId,
        destination: LocationId,
    ) -> Result<bool, PatrolError> {
        // Movement is modeled as a single step; route pacing comes from
        // waypoint linger, not travel time.
        self.directory
            .move_actor(actor, destination)
            .map_err(|_| PatrolError::ActorUnresolved(actor))?;
        Ok(true)
    }

    fn is_helpless(&self, actor: ActorId) -> bool {
        self.directory
            .resolve(actor)
            .resolved()
            .is_some_and(|record| record.helpless)
    }

    fn sighted_offenders(&self, at: LocationId) -> Vec<SightedOffender> {
        self.authority.sighted_offenders(self.directory, at)
    }

    fn crime_actionable(&self, crime: CrimeId) -> bool {
        self.authority.crime_actionable(crime)
    }

    fn issue_warning(&mut self, enforcer: ActorId, offender: ActorId, crime: CrimeId) {
        info!(%enforcer, %offender, %crime, "Warning issued");
    }

    fn arrest(
        &mut self,
        enforcer: ActorId,
        offender: ActorId,
        crime: CrimeId,
    ) -> Result<(), PatrolError> {
        if let Err(error) = self.authority.record_arrest(crime, self.tick) {
            // The crime went unactionable between sighting and engagement;
            // the patrol just moves on.
            warn!(%offender, %crime, %error, "Arrest could not be recorded");
            return Ok(());
        }
        self.touched.push(crime);
        info!(%enforcer, %offender, %crime, "Offender arrested");
        if let Some(jail) = self.authority.locations().jail {
            self.directory
                .move_actor(offender, jail)
                .map_err(|_| PatrolError::ActorUnresolved(offender))?;
        }
        Ok(())
    }

    fn use_lethal_force(
        &mut self,
        enforcer: ActorId,
        offender: ActorId,
        crime: CrimeId,
    ) -> Result<(), PatrolError> {
        if let Err(error) = self.authority.record_arrest(crime, self.tick) {
            warn!(%offender, %crime, %error, "Lethal engagement on unactionable crime");
            return Ok(());
        }
        self.touched.push(crime);
        info!(%enforcer, %offender, %crime, "Offender killed resisting the law");
        self.directory.remove(offender);
        Ok(())
    }

    fn record_resisting(&mut self, offender: ActorId, note: &str) -> Vec<CrimeId> {
        let created = self.authority.evaluate_possible_offense(
            &*self.directory,
            &mut self.rng,
            self.tick,
            self.time_of_day,
            &OffenseReport {
                offender,
                category: OffenseCategory::ResistArrest,
                victim: None,
                object: None,
                note: note.to_owned(),
            },
        );
        self.touched.extend(created.iter().copied());
        created
    }

    fn overdue_fine_debtors(&self, at: LocationId) -> Vec<ActorId> {
        self.authority
            .overdue_fine_debtors(self.directory, at, self.tick)
    }

    fn detain_for_fines(
        &mut self,
        enforcer: ActorId,
        debtor: ActorId,
    ) -> Result<(), PatrolError> {
        info!(%enforcer, %debtor, "Debtor detained over overdue fines");
        if let Some(jail) = self.authority.locations().jail {
            self.directory
                .move_actor(debtor, jail)
                .map_err(|_| PatrolError::ActorUnresolved(debtor))?;
        }
        Ok(())
    }

    fn release_roster(&mut self, members: &[ActorId]) {
        self.released.extend_from_slice(members);
    }
}

//! Live patrol state machine.
//!
//! A [`Patrol`] is created by the controller once a route's staffing is
//! met, steps through `Preparation -> Marshalling -> Patrolling -> Return`
//! on the fast cadence, and is torn down on conclusion or abort. All
//! world interaction flows through the [`PatrolContext`] seam; the patrol
//! itself owns only its roster, cursor, and engagement bookkeeping.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use magistrate_law::EnforcementResponse;
use magistrate_types::{
    ActorId, CrimeId, LocationId, OffenseCategory, PatrolId, PatrolPhase, PatrolRouteId,
};

use crate::error::PatrolError;
use crate::route::PatrolRoute;

// ---------------------------------------------------------------------------
// PatrolContext
// ---------------------------------------------------------------------------

/// An offender a patrol can see at a location, with the enforcement
/// response the matching law prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SightedOffender {
    /// The offender.
    pub actor: ActorId,
    /// The known crime that makes them a target.
    pub crime: CrimeId,
    /// Offense category of that crime.
    pub category: OffenseCategory,
    /// What the law says to do on sight.
    pub response: EnforcementResponse,
}

/// The world seam a patrol acts through.
///
/// The jurisdiction aggregate implements this; tests implement it with a
/// scripted stub.
pub trait PatrolContext {
    /// Current world tick.
    fn current_tick(&self) -> u64;

    /// Whether the jurisdiction's fixed locations (marshalling point,
    /// jail, court, release point) are configured.
    fn locations_configured(&self) -> bool;

    /// Where an actor currently is, if the directory can resolve them.
    fn actor_location(&self, actor: ActorId) -> Option<LocationId>;

    /// Move an actor one step toward a destination. Returns `true` once
    /// the actor is at the destination.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::ActorUnresolved`] when the actor no longer
    /// exists in the world.
    fn move_toward(&mut self, actor: ActorId, destination: LocationId)
    -> Result<bool, PatrolError>;

    /// Whether an actor is helpless (restrained, unconscious, yielding).
    fn is_helpless(&self, actor: ActorId) -> bool;

    /// Known, identity-established, unenforced offenders visible at a
    /// location.
    fn sighted_offenders(&self, at: LocationId) -> Vec<SightedOffender>;

    /// Whether a crime is still actionable (known and unresolved).
    fn crime_actionable(&self, crime: CrimeId) -> bool;

    /// Deliver a verbal warning from an enforcer to an offender.
    fn issue_warning(&mut self, enforcer: ActorId, offender: ActorId, crime: CrimeId);

    /// Arrest an offender for a crime, stamping the enforcement marker.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::ActorUnresolved`] when either party no
    /// longer exists.
    fn arrest(&mut self, enforcer: ActorId, offender: ActorId, crime: CrimeId)
    -> Result<(), PatrolError>;

    /// Apply lethal force to an offender under a kill-on-sight response.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::ActorUnresolved`] when either party no
    /// longer exists.
    fn use_lethal_force(
        &mut self,
        enforcer: ActorId,
        offender: ActorId,
        crime: CrimeId,
    ) -> Result<(), PatrolError>;

    /// Record a resist-arrest offense against an offender, returning any
    /// crime ids the rule engine created.
    fn record_resisting(&mut self, offender: ActorId, note: &str) -> Vec<CrimeId>;

    /// Debtors at a location whose fines are overdue and whose legal
    /// class permits detention for unpaid fines.
    fn overdue_fine_debtors(&self, at: LocationId) -> Vec<ActorId>;

    /// Detain a debtor over overdue fines.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::ActorUnresolved`] when either party no
    /// longer exists.
    fn detain_for_fines(&mut self, enforcer: ActorId, debtor: ActorId)
    -> Result<(), PatrolError>;

    /// Return a disbanded patrol's roster to the idle pool.
    fn release_roster(&mut self, members: &[ActorId]);
}

// ---------------------------------------------------------------------------
// Patrol
// ---------------------------------------------------------------------------

/// What an engagement sub-step did, for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementStep {
    /// No active target; nothing happened.
    NoTarget,
    /// The offender was warned and given a chance to comply.
    Warned,
    /// The offender was noted under a report-only response.
    Observed,
    /// The offender was arrested.
    Arrested,
    /// Lethal force was applied.
    Killed,
    /// The offender resisted; these crimes were recorded and the patrol
    /// retargeted.
    Resisted {
        /// Crimes the rule engine created for the resistance.
        crimes: Vec<CrimeId>,
    },
    /// The active target was invalidated and cleared.
    Invalidated,
}

/// The patrol's current enforcement focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTarget {
    actor: ActorId,
    crime: CrimeId,
    response: EnforcementResponse,
}

/// A live patrol walking a route.
#[derive(Debug)]
pub struct Patrol {
    /// Unique identifier.
    pub id: PatrolId,
    /// The route this patrol was launched from.
    pub route: PatrolRouteId,
    leader: ActorId,
    members: Vec<ActorId>,
    phase: PatrolPhase,
    waypoint_cursor: usize,
    linger_remaining: u64,
    target: Option<ActiveTarget>,
    warned: BTreeSet<ActorId>,
    finished: bool,
}

impl Patrol {
    /// Create a patrol in the preparation phase.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::InvalidConfig`] when the roster is empty or
    /// the leader is not part of it.
    pub fn new(
        id: PatrolId,
        route: PatrolRouteId,
        leader: ActorId,
        members: Vec<ActorId>,
    ) -> Result<Self, PatrolError> {
        if members.is_empty() {
            return Err(PatrolError::InvalidConfig {
                reason: String::from("patrol roster is empty"),
            });
        }
        if !members.contains(&leader) {
            return Err(PatrolError::InvalidConfig {
                reason: String::from("patrol leader is not on the roster"),
            });
        }
        Ok(Self {
            id,
            route,
            leader,
            members,
            phase: PatrolPhase::Preparation,
            waypoint_cursor: 0,
            linger_remaining: 0,
            target: None,
            warned: BTreeSet::new(),
            finished: false,
        })
    }

    // ---- Accessors ----

    /// The current phase.
    pub const fn phase(&self) -> PatrolPhase {
        self.phase
    }

    /// The patrol leader.
    pub const fn leader(&self) -> ActorId {
        self.leader
    }

    /// The full roster, leader included.
    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    /// The active target's actor and crime, if engaged.
    pub fn target(&self) -> Option<(ActorId, CrimeId)> {
        self.target.map(|t| (t.actor, t.crime))
    }

    /// Whether the patrol has concluded or aborted.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// The waypoint the patrol is currently working toward.
    pub fn current_waypoint(&self, route: &PatrolRoute) -> Option<LocationId> {
        route.waypoints.get(self.waypoint_cursor).copied()
    }

    /// Whether the cursor has walked off the end of the route.
    pub fn route_exhausted(&self, route: &PatrolRoute) -> bool {
        self.waypoint_cursor >= route.waypoints.len()
    }

    // ---- Phase machine ----

    /// Drive one fast-cadence step of the pre- and post-patrol phases.
    ///
    /// The `Patrolling` phase itself is driven by the route's strategy;
    /// this method handles convergence, the marshalling linger, the
    /// understaffing guard, and the walk home.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the context.
    pub fn step_phase(
        &mut self,
        route: &PatrolRoute,
        ctx: &mut dyn PatrolContext,
    ) -> Result<(), PatrolError> {
        if self.finished {
            return Ok(());
        }
        let Some(marshalling) = route.marshalling_point() else {
            return Err(PatrolError::NoWaypoints(route.id));
        };

        match self.phase {
            PatrolPhase::Preparation => {
                if self.move_roster(ctx, marshalling)? {
                    self.phase = PatrolPhase::Marshalling;
                    self.linger_remaining = route.linger_ticks;
                    debug!(patrol = %self.id, "Patrol assembled at marshalling point");
                }
            }
            PatrolPhase::Marshalling => {
                if self.linger_remaining > 0 {
                    self.linger_remaining = self.linger_remaining.saturating_sub(1);
                    return Ok(());
                }
                // The staffing guard re-checks here because members can be
                // lost between launch and departure.
                if let Err(shortfall) = self.check_staffing(route) {
                    warn!(patrol = %self.id, error = %shortfall, "Aborting understaffed patrol");
                    self.abort(ctx);
                    return Ok(());
                }
                self.phase = PatrolPhase::Patrolling;
                self.linger_remaining = route.linger_ticks;
                info!(patrol = %self.id, route = %route.name, "Patrol departing");
            }
            PatrolPhase::Patrolling => {
                // Driven by the strategy; nothing to do here.
            }
            PatrolPhase::Return => {
                if self.move_roster(ctx, marshalling)? {
                    self.conclude(ctx);
                }
            }
        }
        Ok(())
    }

    /// Switch to the return phase. Safe to call from any phase.
    pub fn begin_return(&mut self) {
        if !self.finished && self.phase != PatrolPhase::Return {
            self.phase = PatrolPhase::Return;
            self.target = None;
        }
    }

    /// Advance the waypoint cursor and reset the linger countdown.
    pub fn advance_waypoint(&mut self, route: &PatrolRoute) {
        self.waypoint_cursor = self.waypoint_cursor.saturating_add(1);
        self.linger_remaining = route.linger_ticks;
    }

    /// Count down the waypoint linger. Returns `true` when it elapses.
    pub fn tick_linger(&mut self) -> bool {
        if self.linger_remaining == 0 {
            return true;
        }
        self.linger_remaining = self.linger_remaining.saturating_sub(1);
        self.linger_remaining == 0
    }

    /// Move every roster member one step toward a destination, dropping
    /// members the world can no longer resolve. Returns `true` once the
    /// whole remaining roster has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::ActorUnresolved`] only when the roster
    /// empties out entirely.
    pub fn move_roster(
        &mut self,
        ctx: &mut dyn PatrolContext,
        destination: LocationId,
    ) -> Result<bool, PatrolError> {
        let mut all_arrived = true;
        let mut lost = Vec::new();
        for &member in &self.members {
            match ctx.move_toward(member, destination) {
                Ok(arrived) => all_arrived &= arrived,
                Err(PatrolError::ActorUnresolved(actor)) => lost.push(actor),
                Err(other) => return Err(other),
            }
        }
        for actor in lost {
            warn!(patrol = %self.id, %actor, "Dropping unresolvable patrol member");
            self.members.retain(|m| *m != actor);
        }
        if self.members.is_empty() {
            self.abort(ctx);
            return Err(PatrolError::ActorUnresolved(self.leader));
        }
        if !self.members.contains(&self.leader) {
            // Promote the first surviving member.
            if let Some(&next) = self.members.first() {
                self.leader = next;
            }
        }
        Ok(all_arrived)
    }

    fn check_staffing(&self, route: &PatrolRoute) -> Result<(), PatrolError> {
        let available = u32::try_from(self.members.len()).unwrap_or(u32::MAX);
        let required = route.total_staffing();
        if available < required {
            let authority = route
                .staffing
                .first()
                .map(|req| req.authority)
                .unwrap_or_default();
            return Err(PatrolError::Understaffed {
                route: route.id,
                authority,
                required,
                available,
            });
        }
        Ok(())
    }

    // ---- Engagement ----

    /// Take a sighted offender as the active target if none is held.
    /// Returns whether the sighting was taken.
    pub fn acquire_target(&mut self, sighting: SightedOffender) -> bool {
        if self.target.is_some() {
            return false;
        }
        self.target = Some(ActiveTarget {
            actor: sighting.actor,
            crime: sighting.crime,
            response: sighting.response,
        });
        debug!(patrol = %self.id, offender = %sighting.actor, "Patrol acquired target");
        true
    }

    /// Engage the active target: warn first when the response calls for
    /// it and the strategy allows warnings, otherwise escalate directly.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the context.
    pub fn engage_target(
        &mut self,
        ctx: &mut dyn PatrolContext,
        allow_warning: bool,
    ) -> Result<EngagementStep, PatrolError> {
        let Some(target) = self.target else {
            return Ok(EngagementStep::NoTarget);
        };
        if !ctx.crime_actionable(target.crime) {
            return Ok(self.invalidate_active_crime());
        }
        if target.response == EnforcementResponse::ReportOnly {
            self.target = None;
            return Ok(EngagementStep::Observed);
        }
        if allow_warning && target.response.warns_first() && !self.warned.contains(&target.actor) {
            return Ok(self.warn_criminal(ctx));
        }
        self.escalate(ctx, target)
    }

    /// Deliver the warning step of a warn-then-arrest engagement.
    pub fn warn_criminal(&mut self, ctx: &mut dyn PatrolContext) -> EngagementStep {
        let Some(target) = self.target else {
            return EngagementStep::NoTarget;
        };
        self.warned.insert(target.actor);
        ctx.issue_warning(self.leader, target.actor, target.crime);
        info!(patrol = %self.id, offender = %target.actor, "Offender warned");
        EngagementStep::Warned
    }

    /// React to the target fleeing. Flight forfeits any remaining warning
    /// and escalates immediately.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the context.
    pub fn criminal_started_moving(
        &mut self,
        ctx: &mut dyn PatrolContext,
    ) -> Result<EngagementStep, PatrolError> {
        let Some(target) = self.target else {
            return Ok(EngagementStep::NoTarget);
        };
        debug!(patrol = %self.id, offender = %target.actor, "Target fleeing, escalating");
        self.escalate(ctx, target)
    }

    /// React to the target ignoring a delivered warning.
    ///
    /// A helpless offender is simply arrested; an able one has a
    /// resist-arrest offense recorded against them and the patrol
    /// retargets onto the new crime.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the context.
    pub fn criminal_failed_to_comply(
        &mut self,
        ctx: &mut dyn PatrolContext,
    ) -> Result<EngagementStep, PatrolError> {
        let Some(target) = self.target else {
            return Ok(EngagementStep::NoTarget);
        };
        if ctx.is_helpless(target.actor) {
            ctx.arrest(self.leader, target.actor, target.crime)?;
            self.target = None;
            return Ok(EngagementStep::Arrested);
        }
        let crimes = ctx.record_resisting(target.actor, "refused a lawful order to submit");
        if let Some(&new_crime) = crimes.first() {
            self.target = Some(ActiveTarget {
                actor: target.actor,
                crime: new_crime,
                response: EnforcementResponse::ArrestOnSight,
            });
        }
        Ok(EngagementStep::Resisted { crimes })
    }

    /// Clear the active target and revoke its warning, because the crime
    /// was resolved or invalidated out from under the engagement.
    pub fn invalidate_active_crime(&mut self) -> EngagementStep {
        let Some(target) = self.target.take() else {
            return EngagementStep::NoTarget;
        };
        self.warned.remove(&target.actor);
        debug!(patrol = %self.id, offender = %target.actor, "Active crime invalidated");
        EngagementStep::Invalidated
    }

    fn escalate(
        &mut self,
        ctx: &mut dyn PatrolContext,
        target: ActiveTarget,
    ) -> Result<EngagementStep, PatrolError> {
        if target.response.lethal() {
            ctx.use_lethal_force(self.leader, target.actor, target.crime)?;
            self.target = None;
            self.warned.remove(&target.actor);
            return Ok(EngagementStep::Killed);
        }
        ctx.arrest(self.leader, target.actor, target.crime)?;
        self.target = None;
        self.warned.remove(&target.actor);
        Ok(EngagementStep::Arrested)
    }

    // ---- Teardown ----

    /// Conclude the patrol normally, releasing the roster. Idempotent.
    pub fn conclude(&mut self, ctx: &mut dyn PatrolContext) {
        if self.finished {
            return;
        }
        self.finished = true;
        ctx.release_roster(&self.members);
        info!(patrol = %self.id, "Patrol concluded");
    }

    /// Abort the patrol early, releasing the roster. Idempotent.
    pub fn abort(&mut self, ctx: &mut dyn PatrolContext) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.target = None;
        ctx.release_roster(&self.members);
        warn!(patrol = %self.id, "Patrol aborted");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use magistrate_types::{PatrolStrategyKind, StaffingRequirement};

    use super::*;

    // ---- Scripted context ----

    #[derive(Default)]
    struct StubContext {
        tick: u64,
        locations: BTreeMap<ActorId, LocationId>,
        helpless: BTreeSet<ActorId>,
        actionable: BTreeSet<CrimeId>,
        resisting_crimes: Vec<CrimeId>,
        warnings: Vec<(ActorId, ActorId)>,
        arrests: Vec<(ActorId, CrimeId)>,
        kills: Vec<ActorId>,
        released: Vec<Vec<ActorId>>,
    }

    impl PatrolContext for StubContext {
        fn current_tick(&self) -> u64 {
            self.tick
        }
        fn locations_configured(&self) -> bool {
            true
        }
        fn actor_location(&self, actor: ActorId) -> Option<LocationId> {
            self.locations.get(&actor).copied()
        }
        fn move_toward(
            &mut self,
            actor: ActorId,
            destination: LocationId,
        ) -> Result<bool, PatrolError> {
            if !self.locations.contains_key(&actor) {
                return Err(PatrolError::ActorUnresolved(actor));
            }
            self.locations.insert(actor, destination);
            Ok(true)
        }
        fn is_helpless(&self, actor: ActorId) -> bool {
            self.helpless.contains(&actor)
        }
        fn sighted_offenders(&self, _at: LocationId) -> Vec<SightedOffender> {
            Vec::new()
        }
        fn crime_actionable(&self, crime: CrimeId) -> bool {
            self.actionable.contains(&crime)
        }
        fn issue_warning(&mut self, enforcer: ActorId, offender: ActorId, _crime: CrimeId) {
            self.warnings.push((enforcer, offender));
        }
        fn arrest(
            &mut self,
            _enforcer: ActorId,
            offender: ActorId,
            crime: CrimeId,
        ) -> Result<(), PatrolError> {
            self.arrests.push((offender, crime));
            Ok(())
        }
        fn use_lethal_force(
            &mut self,
            _enforcer: ActorId,
            offender: ActorId,
            _crime: CrimeId,
        ) -> Result<(), PatrolError> {
            self.kills.push(offender);
            Ok(())
        }
        fn record_resisting(&mut self, _offender: ActorId, _note: &str) -> Vec<CrimeId> {
            self.resisting_crimes.clone()
        }
        fn overdue_fine_debtors(&self, _at: LocationId) -> Vec<ActorId> {
            Vec::new()
        }
        fn detain_for_fines(
            &mut self,
            _enforcer: ActorId,
            _debtor: ActorId,
        ) -> Result<(), PatrolError> {
            Ok(())
        }
        fn release_roster(&mut self, members: &[ActorId]) {
            self.released.push(members.to_vec());
        }
    }

    // ---- Helpers ----

    fn two_point_route() -> PatrolRoute {
        let mut route = PatrolRoute::new(
            PatrolRouteId::new(),
            "wall-walk",
            PatrolStrategyKind::ArmedRoaming,
        );
        route.waypoints = vec![LocationId::new(), LocationId::new()];
        route.staffing = vec![StaffingRequirement {
            authority: magistrate_types::EnforcementAuthorityId::new(),
            count: 2,
        }];
        route.linger_ticks = 0;
        route
    }

    fn patrol_with_roster(route: &PatrolRoute, size: usize) -> (Patrol, StubContext) {
        let members: Vec<ActorId> = (0..size).map(|_| ActorId::new()).collect();
        let leader = members.first().copied().unwrap_or_else(ActorId::new);
        let mut ctx = StubContext::default();
        let start = LocationId::new();
        for &member in &members {
            ctx.locations.insert(member, start);
        }
        let patrol = Patrol::new(PatrolId::new(), route.id, leader, members).unwrap();
        (patrol, ctx)
    }

    fn sighting(response: EnforcementResponse) -> SightedOffender {
        SightedOffender {
            actor: ActorId::new(),
            crime: CrimeId::new(),
            category: OffenseCategory::Theft,
            response,
        }
    }

    // ---- Phase machine ----

    #[test]
    fn phases_advance_in_order() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);

        assert_eq!(patrol.phase(), PatrolPhase::Preparation);
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Marshalling);
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Patrolling);

        patrol.begin_return();
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert!(patrol.is_finished());
        assert_eq!(ctx.released.len(), 1);
    }

    #[test]
    fn understaffed_patrol_never_departs() {
        let route = two_point_route();
        // Staffing requires two; give it one.
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 1);

        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Marshalling);
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());

        assert!(patrol.is_finished());
        assert_ne!(patrol.phase(), PatrolPhase::Patrolling);
    }

    #[test]
    fn marshalling_waits_out_linger() {
        let mut route = two_point_route();
        route.linger_ticks = 2;
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);

        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Marshalling);
        // Two linger ticks, then departure.
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Marshalling);
        assert!(patrol.step_phase(&route, &mut ctx).is_ok());
        assert_eq!(patrol.phase(), PatrolPhase::Patrolling);
    }

    #[test]
    fn lost_member_is_dropped_and_leader_promoted() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 3);
        let old_leader = patrol.leader();
        ctx.locations.remove(&old_leader);

        let Some(destination) = route.marshalling_point() else {
            return;
        };
        assert!(patrol.move_roster(&mut ctx, destination).is_ok());
        assert_eq!(patrol.members().len(), 2);
        assert_ne!(patrol.leader(), old_leader);
    }

    // ---- Engagement ----

    #[test]
    fn warn_then_arrest_warns_before_escalating() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::WarnThenArrest);
        ctx.actionable.insert(target.crime);

        assert!(patrol.acquire_target(target));
        let step = patrol.engage_target(&mut ctx, true);
        assert!(step.is_ok_and(|s| s == EngagementStep::Warned));
        assert_eq!(ctx.warnings.len(), 1);

        // The warning is not repeated; the next engagement escalates.
        let step = patrol.engage_target(&mut ctx, true);
        assert!(step.is_ok_and(|s| s == EngagementStep::Arrested));
        assert_eq!(ctx.arrests.len(), 1);
        assert!(patrol.target().is_none());
    }

    #[test]
    fn kill_on_sight_skips_warning() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::KillOnSight);
        ctx.actionable.insert(target.crime);

        assert!(patrol.acquire_target(target));
        let step = patrol.engage_target(&mut ctx, true);
        assert!(step.is_ok_and(|s| s == EngagementStep::Killed));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn strategy_can_suppress_warning() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::WarnThenArrest);
        ctx.actionable.insert(target.crime);

        assert!(patrol.acquire_target(target));
        let step = patrol.engage_target(&mut ctx, false);
        assert!(step.is_ok_and(|s| s == EngagementStep::Arrested));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn flight_escalates_without_warning() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::WarnThenArrest);
        ctx.actionable.insert(target.crime);

        assert!(patrol.acquire_target(target));
        let step = patrol.criminal_started_moving(&mut ctx);
        assert!(step.is_ok_and(|s| s == EngagementStep::Arrested));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn noncompliant_helpless_offender_is_arrested() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::WarnThenArrest);
        ctx.actionable.insert(target.crime);
        ctx.helpless.insert(target.actor);

        assert!(patrol.acquire_target(target));
        let step = patrol.criminal_failed_to_comply(&mut ctx);
        assert!(step.is_ok_and(|s| s == EngagementStep::Arrested));
    }

    #[test]
    fn noncompliant_able_offender_resists_and_patrol_retargets() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::WarnThenArrest);
        ctx.actionable.insert(target.crime);
        let resist_crime = CrimeId::new();
        ctx.resisting_crimes = vec![resist_crime];

        assert!(patrol.acquire_target(target));
        let step = patrol.criminal_failed_to_comply(&mut ctx);
        assert!(
            step.is_ok_and(|s| s == EngagementStep::Resisted { crimes: vec![resist_crime] })
        );
        assert_eq!(patrol.target(), Some((target.actor, resist_crime)));
    }

    #[test]
    fn stale_crime_invalidates_engagement() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::ArrestOnSight);
        // Crime never added to the actionable set.

        assert!(patrol.acquire_target(target));
        let step = patrol.engage_target(&mut ctx, true);
        assert!(step.is_ok_and(|s| s == EngagementStep::Invalidated));
        assert!(patrol.target().is_none());
    }

    #[test]
    fn report_only_response_observes_and_moves_on() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);
        let target = sighting(EnforcementResponse::ReportOnly);
        ctx.actionable.insert(target.crime);

        assert!(patrol.acquire_target(target));
        let step = patrol.engage_target(&mut ctx, true);
        assert!(step.is_ok_and(|s| s == EngagementStep::Observed));
        assert!(ctx.arrests.is_empty());
    }

    // ---- Teardown ----

    #[test]
    fn conclude_and_abort_are_idempotent() {
        let route = two_point_route();
        let (mut patrol, mut ctx) = patrol_with_roster(&route, 2);

        patrol.conclude(&mut ctx);
        patrol.conclude(&mut ctx);
        patrol.abort(&mut ctx);
        assert_eq!(ctx.released.len(), 1);
    }
}

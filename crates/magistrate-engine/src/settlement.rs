//! Demo settlement setup.
//!
//! Builds a small river-port jurisdiction through the public world API:
//! locations, a commoner legal class, a handful of laws, the town watch
//! and its sheriff, a market-crowd witness profile, a patrol route, and
//! the seed population. The `settlement` section of
//! `magistrate-config.yaml` controls the population counts and the
//! scripted offense cadence.

use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use magistrate_core::{ActorRecord, JurisdictionLocations, JusticeWorld};
use magistrate_law::{
    ActorPredicate, EnforcementAuthority, EnforcementResponse, Law, LegalClass,
    PunishmentStrategy, WitnessProfile,
};
use magistrate_patrol::PatrolRoute;
use magistrate_types::{
    ActorId, AppearanceSnapshot, CharacteristicKind, CurrencyId, EnforcementAuthorityId, LawId,
    LegalClassId, LocationId, OffenseCategory, PatrolRouteId, PatrolStrategyKind,
    StaffingRequirement, TimeOfDay, WitnessProfileId,
};

use crate::error::EngineError;

/// Settlement settings from the `settlement` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Number of seed citizens to place on the square.
    #[serde(default = "default_citizens")]
    pub citizens: usize,

    /// Number of watch officers to register as idle enforcers.
    #[serde(default = "default_enforcers")]
    pub enforcers: usize,

    /// Ticks between scripted offenses. Zero disables the script.
    #[serde(default = "default_offense_interval")]
    pub offense_interval_ticks: u64,

    /// Stop the engine after this many ticks. Unset runs until
    /// interrupted.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            citizens: default_citizens(),
            enforcers: default_enforcers(),
            offense_interval_ticks: default_offense_interval(),
            max_ticks: None,
        }
    }
}

const fn default_citizens() -> usize {
    6
}

const fn default_enforcers() -> usize {
    2
}

const fn default_offense_interval() -> u64 {
    45
}

/// Handles into the built settlement that the tick loop needs.
#[derive(Debug)]
pub struct Settlement {
    /// Citizens eligible to appear in scripted offenses.
    pub citizens: Vec<ActorId>,
}

const CITIZEN_NAMES: [&str; 10] = [
    "Rald", "Mira", "Tobin", "Ysolt", "Garin", "Petra", "Aldous", "Senna", "Brank", "Odile",
];

const ENFORCER_NAMES: [&str; 4] = ["Osric", "Hale", "Wenna", "Corvin"];

/// Build the demo jurisdiction inside the given world.
pub fn build_settlement<R: Rng>(
    world: &mut JusticeWorld,
    config: &SettlementConfig,
    rng: &mut R,
) -> Result<Settlement, EngineError> {
    let square = LocationId::new();
    let gate = LocationId::new();
    let jail = LocationId::new();
    let court = LocationId::new();
    world.authority_mut().set_locations(JurisdictionLocations {
        marshalling: Some(square),
        jail: Some(jail),
        court: Some(court),
        release: Some(gate),
    });
    // Fines and bail are settled in the town's silver mark.
    world.authority_mut().set_currency(CurrencyId::new());
    for location in [square, gate, jail, court] {
        world.authority_mut().add_zone_location(location);
    }

    let commoner = world.authority_mut().add_class(LegalClass {
        id: LegalClassId::new(),
        name: String::from("commoner"),
        membership: ActorPredicate::new("is-citizen", |facts| facts.has_tag("citizen")),
        priority: 0,
        detainable_for_unpaid_fines: true,
    })?;

    add_laws(world, commoner)?;

    let mut watch = EnforcementAuthority::new(EnforcementAuthorityId::new(), "town-watch");
    watch.can_accuse = true;
    watch.accusable_classes.insert(commoner);
    watch.arrestable_classes.insert(commoner);
    let watch = world.authority_mut().add_authority(watch)?;

    let mut sheriff = EnforcementAuthority::new(EnforcementAuthorityId::new(), "sheriff");
    sheriff.can_accuse = true;
    sheriff.accusable_classes.insert(commoner);
    sheriff.arrestable_classes.insert(commoner);
    let sheriff = world.authority_mut().add_authority(sheriff)?;
    world.authority_mut().add_inclusion(sheriff, watch)?;

    add_market_crowd(world, square, gate)?;
    add_market_beat(world, watch, square, gate)?;

    let citizens = spawn_citizens(world, config.citizens, square, rng);
    spawn_enforcers(world, config.enforcers, sheriff, gate, rng);

    info!(
        citizens = citizens.len(),
        enforcers = config.enforcers,
        "Settlement built"
    );
    Ok(Settlement { citizens })
}

fn add_laws(world: &mut JusticeWorld, commoner: LegalClassId) -> Result<(), EngineError> {
    let mut theft = Law::new(LawId::new(), "petty-theft", OffenseCategory::Theft);
    theft.offender_classes.insert(commoner);
    theft.victim_classes.insert(commoner);
    theft.response = EnforcementResponse::ArrestOnSight;
    theft.punishment = PunishmentStrategy::Fine {
        amount: Decimal::new(25, 0),
    };
    theft.auto_apply = true;
    theft.arrestable = true;
    theft.suppress_repeats = true;
    theft.investigation_window_ticks = 3_600;
    world.authority_mut().add_law(theft)?;

    let mut affray = Law::new(LawId::new(), "affray", OffenseCategory::Assault);
    affray.offender_classes.insert(commoner);
    affray.victim_classes.insert(commoner);
    affray.response = EnforcementResponse::WarnThenArrest;
    affray.punishment = PunishmentStrategy::Custodial {
        ticks: 900,
        bond_ticks: 300,
    };
    affray.auto_apply = true;
    affray.arrestable = true;
    affray.bail_eligible = true;
    affray.bail_amount = Decimal::new(60, 0);
    affray.bail_return_ticks = 600;
    affray.investigation_window_ticks = 3_600;
    world.authority_mut().add_law(affray)?;

    let mut resisting = Law::new(
        LawId::new(),
        "resisting-the-watch",
        OffenseCategory::ResistArrest,
    );
    resisting.offender_classes.insert(commoner);
    resisting.punishment = PunishmentStrategy::Custodial {
        ticks: 600,
        bond_ticks: 0,
    };
    resisting.auto_apply = true;
    resisting.arrestable = true;
    world.authority_mut().add_law(resisting)?;

    let mut skipping = Law::new(LawId::new(), "bail-skipping", OffenseCategory::BailViolation);
    skipping.offender_classes.insert(commoner);
    skipping.punishment = PunishmentStrategy::Custodial {
        ticks: 1_200,
        bond_ticks: 0,
    };
    skipping.auto_apply = true;
    skipping.arrestable = true;
    world.authority_mut().add_law(skipping)?;

    Ok(())
}

fn add_market_crowd(
    world: &mut JusticeWorld,
    square: LocationId,
    gate: LocationId,
) -> Result<(), EngineError> {
    let mut crowd = WitnessProfile::new(WitnessProfileId::new(), "market-crowd");
    crowd.cooperating.insert(world.authority().id);
    crowd.base_report_rate.extend([
        (TimeOfDay::Dawn, Decimal::new(4, 1)),
        (TimeOfDay::Morning, Decimal::new(8, 1)),
        (TimeOfDay::Afternoon, Decimal::new(8, 1)),
        (TimeOfDay::Dusk, Decimal::new(5, 1)),
        (TimeOfDay::Night, Decimal::new(2, 1)),
    ]);
    crowd.reliability = Decimal::new(75, 2);
    // Locals put a name to a face; strangers only describe one.
    crowd.identity_disclosure = Some(ActorPredicate::new("knows-neighbours", |facts| {
        facts.has_tag("citizen")
    }));
    crowd.max_corruptions = 2;
    let crowd = world.authority_mut().add_witness_profile(crowd)?;
    world.authority_mut().assign_witness_profile(square, crowd)?;
    world.authority_mut().assign_witness_profile(gate, crowd)?;
    Ok(())
}

fn add_market_beat(
    world: &mut JusticeWorld,
    watch: EnforcementAuthorityId,
    square: LocationId,
    gate: LocationId,
) -> Result<(), EngineError> {
    let mut route = PatrolRoute::new(
        PatrolRouteId::new(),
        "market-beat",
        PatrolStrategyKind::ArmedRoaming,
    );
    route.waypoints = vec![square, gate];
    route.staffing = vec![StaffingRequirement {
        authority: watch,
        count: 1,
    }];
    route.active_phases.extend([
        TimeOfDay::Dawn,
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Dusk,
    ]);
    route.linger_ticks = 6;
    route.ready = true;
    world.controller_mut().add_route(route)?;
    Ok(())
}

fn spawn_citizens<R: Rng>(
    world: &mut JusticeWorld,
    count: usize,
    square: LocationId,
    rng: &mut R,
) -> Vec<ActorId> {
    let mut citizens = Vec::with_capacity(count);
    for index in 0..count {
        let name = CITIZEN_NAMES
            .get(index)
            .map_or_else(|| format!("settler-{index}"), ToString::to_string);
        let mut record = ActorRecord::new(ActorId::new(), &name);
        record.location = Some(square);
        record.notice_skill = 2;
        record.tags.insert(String::from("citizen"));
        record.characteristics = random_appearance(rng);
        citizens.push(record.id);
        world.directory_mut().upsert(record);
    }
    citizens
}

fn spawn_enforcers<R: Rng>(
    world: &mut JusticeWorld,
    count: usize,
    sheriff: EnforcementAuthorityId,
    gate: LocationId,
    rng: &mut R,
) {
    for index in 0..count {
        let name = ENFORCER_NAMES
            .get(index)
            .map_or_else(|| format!("deputy-{index}"), ToString::to_string);
        let mut record = ActorRecord::new(ActorId::new(), &name);
        record.location = Some(gate);
        record.notice_skill = 4;
        record.tags.insert(String::from("citizen"));
        record.characteristics = random_appearance(rng);
        let id = record.id;
        world.directory_mut().upsert(record);
        // Sheriff grants include the watch, so one registration staffs
        // both pools.
        world.register_enforcer(id, &[sheriff]);
    }
}

fn random_appearance<R: Rng>(rng: &mut R) -> AppearanceSnapshot {
    AppearanceSnapshot::from_pairs(CharacteristicKind::ALL.into_iter().map(|kind| {
        let pool = kind.value_pool();
        let value = pool
            .get(rng.random_range(0..pool.len()))
            .copied()
            .unwrap_or("nondescript");
        (kind, value.to_owned())
    }))
}

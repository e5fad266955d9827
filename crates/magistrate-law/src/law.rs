//! Offense rules: eligibility, response, and punishment.
//!
//! A [`Law`] binds an offense-category tag to offender/victim class
//! eligibility, an optional custom predicate, an enforcement-response
//! strategy (what patrols do on sight), a punishment strategy (what a
//! conviction costs), and timing parameters.
//!
//! A law with `auto_apply = false` exists for manual accusation only and
//! never auto-generates crimes from reported world events.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use magistrate_types::{LawId, LegalClassId, OffenseCategory, PunishmentOutcome};

use crate::predicate::{OffenseFacts, OffensePredicate};

// ---------------------------------------------------------------------------
// EnforcementResponse
// ---------------------------------------------------------------------------

/// What an enforcement patrol does when it engages an offender under this
/// law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnforcementResponse {
    /// Note the crime; take no physical action.
    ReportOnly,
    /// Issue a warning first, escalate on non-compliance.
    WarnThenArrest,
    /// Arrest immediately, no warning.
    ArrestOnSight,
    /// Lethal force, no warning.
    KillOnSight,
}

impl EnforcementResponse {
    /// Whether engagement starts with a warning step.
    pub const fn warns_first(self) -> bool {
        matches!(self, Self::WarnThenArrest)
    }

    /// Whether the response authorizes lethal force.
    pub const fn lethal(self) -> bool {
        matches!(self, Self::KillOnSight)
    }

    /// Coarse severity used when a patrol must pick among several known
    /// crimes. Higher is more urgent.
    pub const fn severity(self) -> u8 {
        match self {
            Self::ReportOnly => 0,
            Self::WarnThenArrest => 1,
            Self::ArrestOnSight => 2,
            Self::KillOnSight => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// PunishmentStrategy
// ---------------------------------------------------------------------------

/// Pluggable policy converting a conviction into concrete penalties.
///
/// Resolution takes the offender's prior conviction count so repeat
/// offenders can be punished progressively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PunishmentStrategy {
    /// A flat fine.
    Fine {
        /// Fine amount in the jurisdiction's currency.
        amount: Decimal,
    },
    /// A custodial sentence, optionally followed by a good-behaviour bond.
    Custodial {
        /// Sentence length in world ticks.
        ticks: u64,
        /// Bond length in world ticks after release (0 for none).
        bond_ticks: u64,
    },
    /// Fines that grow with prior convictions, escalating to custody.
    Graduated {
        /// Fine for a first conviction.
        base_fine: Decimal,
        /// Added to the fine per prior conviction.
        fine_step: Decimal,
        /// Prior-conviction count at which custody is added.
        custodial_after: u32,
        /// Custodial length once custody applies.
        custodial_ticks: u64,
        /// Bond length applied alongside custody.
        bond_ticks: u64,
    },
    /// Execution.
    Capital,
}

impl PunishmentStrategy {
    /// Resolve this strategy into a concrete outcome.
    pub fn resolve(&self, prior_convictions: u32) -> PunishmentOutcome {
        match self {
            Self::Fine { amount } => PunishmentOutcome {
                fine: *amount,
                ..PunishmentOutcome::NONE
            },
            Self::Custodial { ticks, bond_ticks } => PunishmentOutcome {
                custodial_ticks: *ticks,
                bond_ticks: *bond_ticks,
                ..PunishmentOutcome::NONE
            },
            Self::Graduated {
                base_fine,
                fine_step,
                custodial_after,
                custodial_ticks,
                bond_ticks,
            } => {
                let escalation = fine_step.saturating_mul(Decimal::from(prior_convictions));
                let fine = base_fine.saturating_add(escalation);
                if prior_convictions >= *custodial_after {
                    PunishmentOutcome {
                        fine,
                        custodial_ticks: *custodial_ticks,
                        bond_ticks: *bond_ticks,
                        ..PunishmentOutcome::NONE
                    }
                } else {
                    PunishmentOutcome {
                        fine,
                        ..PunishmentOutcome::NONE
                    }
                }
            }
            Self::Capital => PunishmentOutcome {
                execute: true,
                ..PunishmentOutcome::NONE
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Law
// ---------------------------------------------------------------------------

/// One offense rule within a jurisdiction.
#[derive(Debug, Clone)]
pub struct Law {
    /// Unique identifier.
    pub id: LawId,
    /// Display name, unique within the owning jurisdiction.
    pub name: String,
    /// The offense-category tag this law matches.
    pub category: OffenseCategory,
    /// Legal classes an offender must resolve to for this law to apply.
    pub offender_classes: BTreeSet<LegalClassId>,
    /// Legal classes a victim must resolve to, when a victim is present.
    pub victim_classes: BTreeSet<LegalClassId>,
    /// Optional custom applicability test.
    pub applicability: Option<OffensePredicate>,
    /// What patrols do when they engage an offender under this law.
    pub response: EnforcementResponse,
    /// What a conviction under this law costs.
    pub punishment: PunishmentStrategy,
    /// How long (ticks) an unresolved crime stays actionable before it is
    /// time-barred into the stale bucket.
    pub investigation_window_ticks: u64,
    /// Matching priority; higher-priority laws are tested first.
    pub priority: i32,
    /// Whether reported world events auto-generate crimes under this law.
    pub auto_apply: bool,
    /// Whether offenders may be physically arrested.
    pub arrestable: bool,
    /// Whether arrested offenders may post bail.
    pub bail_eligible: bool,
    /// Bail amount, when bail-eligible.
    pub bail_amount: Decimal,
    /// Ticks an offender on bail has before they must return.
    pub bail_return_ticks: u64,
    /// Whether an identical offense within the repeat-suppression window
    /// is folded into the existing crime instead of creating a new one.
    pub suppress_repeats: bool,
}

impl Law {
    /// Create a law with conservative defaults: applies to nobody,
    /// report-only, no punishment, not auto-applied.
    pub fn new(id: LawId, name: &str, category: OffenseCategory) -> Self {
        Self {
            id,
            name: name.to_owned(),
            category,
            offender_classes: BTreeSet::new(),
            victim_classes: BTreeSet::new(),
            applicability: None,
            response: EnforcementResponse::ReportOnly,
            punishment: PunishmentStrategy::Fine {
                amount: Decimal::ZERO,
            },
            investigation_window_ticks: 0,
            priority: 0,
            auto_apply: false,
            arrestable: false,
            bail_eligible: false,
            bail_amount: Decimal::ZERO,
            bail_return_ticks: 0,
            suppress_repeats: false,
        }
    }

    /// Whether this law applies to the given parties.
    ///
    /// The offender must resolve to a class inside the law's offender set.
    /// When a victim is present, they must resolve to a class inside the
    /// victim set. A party with no standing (unresolved class) never
    /// matches. Finally the custom predicate, if configured, must accept.
    pub fn applies_to(
        &self,
        offender_class: Option<LegalClassId>,
        victim_class: Option<Option<LegalClassId>>,
        facts: &OffenseFacts,
    ) -> bool {
        let Some(offender_class) = offender_class else {
            return false;
        };
        if !self.offender_classes.contains(&offender_class) {
            return false;
        }
        // victim_class is Some(..) when a victim is present.
        if let Some(resolved) = victim_class {
            let Some(resolved) = resolved else {
                return false;
            };
            if !self.victim_classes.contains(&resolved) {
                return false;
            }
        }
        self.applicability
            .as_ref()
            .is_none_or(|predicate| predicate.eval(facts))
    }
}

#[cfg(test)]
mod tests {
    use magistrate_types::ActorId;

    use super::*;
    use crate::predicate::ActorFacts;

    fn offense_facts(category: OffenseCategory) -> OffenseFacts {
        OffenseFacts {
            category,
            offender: ActorFacts::bare(ActorId::new()),
            victim: None,
            location: magistrate_types::LocationId::new(),
            tick: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Punishment strategies
    // -----------------------------------------------------------------------

    #[test]
    fn flat_fine_resolves_to_fine_only() {
        let strategy = PunishmentStrategy::Fine {
            amount: Decimal::new(50, 0),
        };
        let outcome = strategy.resolve(3);
        assert_eq!(outcome.fine, Decimal::new(50, 0));
        assert_eq!(outcome.custodial_ticks, 0);
        assert!(!outcome.execute);
    }

    #[test]
    fn graduated_fine_escalates_with_priors() {
        let strategy = PunishmentStrategy::Graduated {
            base_fine: Decimal::new(10, 0),
            fine_step: Decimal::new(5, 0),
            custodial_after: 2,
            custodial_ticks: 100,
            bond_ticks: 50,
        };

        let first = strategy.resolve(0);
        assert_eq!(first.fine, Decimal::new(10, 0));
        assert_eq!(first.custodial_ticks, 0);

        let third = strategy.resolve(2);
        assert_eq!(third.fine, Decimal::new(20, 0));
        assert_eq!(third.custodial_ticks, 100);
        assert_eq!(third.bond_ticks, 50);
    }

    #[test]
    fn capital_resolves_to_execution() {
        let outcome = PunishmentStrategy::Capital.resolve(0);
        assert!(outcome.execute);
        assert_eq!(outcome.fine, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // Applicability
    // -----------------------------------------------------------------------

    #[test]
    fn offender_outside_class_set_never_matches() {
        let mut law = Law::new(LawId::new(), "theft", OffenseCategory::Theft);
        law.offender_classes.insert(LegalClassId::new());

        let facts = offense_facts(OffenseCategory::Theft);
        // Different class id than the one in the set.
        assert!(!law.applies_to(Some(LegalClassId::new()), None, &facts));
        // No standing at all.
        assert!(!law.applies_to(None, None, &facts));
    }

    #[test]
    fn victim_class_checked_only_when_victim_present() {
        let offender_class = LegalClassId::new();
        let victim_class = LegalClassId::new();
        let mut law = Law::new(LawId::new(), "assault", OffenseCategory::Assault);
        law.offender_classes.insert(offender_class);
        law.victim_classes.insert(victim_class);

        let facts = offense_facts(OffenseCategory::Assault);
        // Victimless report under a victim-scoped law still matches.
        assert!(law.applies_to(Some(offender_class), None, &facts));
        // Present victim of the right class matches.
        assert!(law.applies_to(Some(offender_class), Some(Some(victim_class)), &facts));
        // Present victim of a foreign class does not.
        assert!(!law.applies_to(
            Some(offender_class),
            Some(Some(LegalClassId::new())),
            &facts
        ));
        // Present victim with no standing does not.
        assert!(!law.applies_to(Some(offender_class), Some(None), &facts));
    }

    #[test]
    fn custom_predicate_can_reject() {
        let offender_class = LegalClassId::new();
        let mut law = Law::new(LawId::new(), "night-theft", OffenseCategory::Theft);
        law.offender_classes.insert(offender_class);
        law.applicability = Some(OffensePredicate::new("after-dark", |facts| facts.tick >= 100));

        let mut facts = offense_facts(OffenseCategory::Theft);
        facts.tick = 50;
        assert!(!law.applies_to(Some(offender_class), None, &facts));

        facts.tick = 150;
        assert!(law.applies_to(Some(offender_class), None, &facts));
    }

    #[test]
    fn response_severity_ordering() {
        assert!(
            EnforcementResponse::KillOnSight.severity()
                > EnforcementResponse::ArrestOnSight.severity()
        );
        assert!(EnforcementResponse::WarnThenArrest.warns_first());
        assert!(!EnforcementResponse::ArrestOnSight.warns_first());
        assert!(EnforcementResponse::KillOnSight.lethal());
    }
}

//! Enumerations shared across the legal simulation.
//!
//! These classify offenses, lifecycle states, patrol phases, and the
//! world's time-of-day phases. Everything here derives `Serialize` /
//! `Deserialize` because each value appears in persisted records.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OffenseCategory
// ---------------------------------------------------------------------------

/// The enumerated kind of offense a law binds to.
///
/// Laws are matched by category tag: a world event reports "this looked
/// like theft" and every auto-applicable theft law in the jurisdiction is
/// tested against the parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OffenseCategory {
    /// Taking property from another actor without consent.
    Theft,
    /// Physical attack on another actor.
    Assault,
    /// Killing another actor.
    Murder,
    /// Obtaining value through deliberate deception.
    Fraud,
    /// Damaging property belonging to another actor.
    Vandalism,
    /// Entering a restricted area without permission.
    Trespass,
    /// Moving prohibited goods through an enforcement zone.
    Smuggling,
    /// Defying a sitting court or its officers.
    Contempt,
    /// Resisting a lawful arrest attempt.
    ResistArrest,
    /// Breaking out of lawful custody.
    EscapeCustody,
    /// Failing to return from bail by the deadline.
    BailViolation,
    /// Acting against the jurisdiction itself.
    Treason,
}

impl OffenseCategory {
    /// All categories, in declaration order.
    ///
    /// Used by the narration table loader to verify template coverage.
    pub const ALL: [Self; 12] = [
        Self::Theft,
        Self::Assault,
        Self::Murder,
        Self::Fraud,
        Self::Vandalism,
        Self::Trespass,
        Self::Smuggling,
        Self::Contempt,
        Self::ResistArrest,
        Self::EscapeCustody,
        Self::BailViolation,
        Self::Treason,
    ];
}

impl core::fmt::Display for OffenseCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Theft => "theft",
            Self::Assault => "assault",
            Self::Murder => "murder",
            Self::Fraud => "fraud",
            Self::Vandalism => "vandalism",
            Self::Trespass => "trespass",
            Self::Smuggling => "smuggling",
            Self::Contempt => "contempt",
            Self::ResistArrest => "resisting arrest",
            Self::EscapeCustody => "escaping custody",
            Self::BailViolation => "bail violation",
            Self::Treason => "treason",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// DisclosureState
// ---------------------------------------------------------------------------

/// The disclosure state of a crime -- which of the four jurisdiction
/// buckets it currently lives in.
///
/// Permitted transitions are one-directional: `Unknown -> Known`,
/// `Unknown -> Stale`, `Known -> Stale`, `Known -> Resolved`. A crime never
/// returns to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisclosureState {
    /// The crime happened but nobody has reported it.
    Unknown,
    /// The crime has been reported and is actionable.
    Known,
    /// The investigation window expired before resolution (time-barred).
    Stale,
    /// The crime was adjudicated (convicted or forgiven).
    Resolved,
}

impl core::fmt::Display for DisclosureState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Known => "known",
            Self::Stale => "stale",
            Self::Resolved => "resolved",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// AdjudicationState
// ---------------------------------------------------------------------------

/// The adjudication state of a crime, advanced by enforcement and the
/// conviction workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjudicationState {
    /// No enforcement outcome yet.
    Pending,
    /// The offender has been formally accused (typically at arrest).
    Accused,
    /// The offender was convicted; outcome fields are finalized.
    Convicted,
    /// The crime was forgiven by a competent authority; no punishment.
    Forgiven,
}

impl AdjudicationState {
    /// Whether this state is terminal (the crime can no longer change).
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Convicted | Self::Forgiven)
    }
}

// ---------------------------------------------------------------------------
// PatrolPhase
// ---------------------------------------------------------------------------

/// The phase of a live patrol's state machine.
///
/// Phases advance strictly forward: `Preparation -> Marshalling ->
/// Patrolling -> Return`, then the patrol instance is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatrolPhase {
    /// Roster members are converging on the marshalling point.
    Preparation,
    /// The full roster is assembled and waiting out the marshalling linger.
    Marshalling,
    /// The patrol is walking its waypoints and enforcing.
    Patrolling,
    /// The patrol is heading back to the marshalling point to disband.
    Return,
}

// ---------------------------------------------------------------------------
// PatrolStrategyKind
// ---------------------------------------------------------------------------

/// The behavioral strategy a patrol route assigns to its live patrols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatrolStrategyKind {
    /// Roams waypoints, warns criminals before escalating.
    ArmedRoaming,
    /// Holds a single post; enforces only what comes to it.
    Stationary,
    /// Court presence; never warns, targets only contempt in its chamber.
    Judge,
    /// Roams like an armed patrol but prioritizes known crimes by severity
    /// and may detain for unpaid fines.
    Sheriff,
}

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

/// The five phases of the simulated day.
///
/// Witness report rates and patrol route activation are keyed by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// First light.
    Dawn,
    /// Morning.
    Morning,
    /// Afternoon.
    Afternoon,
    /// Fading light.
    Dusk,
    /// Night.
    Night,
}

impl TimeOfDay {
    /// All phases, in chronological order.
    pub const ALL: [Self; 5] = [
        Self::Dawn,
        Self::Morning,
        Self::Afternoon,
        Self::Dusk,
        Self::Night,
    ];
}

// ---------------------------------------------------------------------------
// CharacteristicKind
// ---------------------------------------------------------------------------

/// A describable offender characteristic captured in a crime's appearance
/// snapshot.
///
/// Witness reliability operates per characteristic: an unreliable witness
/// replaces individual values with random alternatives drawn from the
/// kind's value pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CharacteristicKind {
    /// Overall height impression.
    Height,
    /// Body build.
    Build,
    /// Hair color.
    HairColor,
    /// Voice quality.
    Voice,
}

impl CharacteristicKind {
    /// All characteristic kinds, in declaration order.
    pub const ALL: [Self; 4] = [Self::Height, Self::Build, Self::HairColor, Self::Voice];

    /// The pool of describable values for this kind.
    ///
    /// Corruption draws a *different* value from this pool, so every pool
    /// must contain at least two entries.
    pub const fn value_pool(self) -> &'static [&'static str] {
        match self {
            Self::Height => &["short", "average height", "tall", "towering"],
            Self::Build => &["slight", "lean", "stocky", "heavyset"],
            Self::HairColor => &["black-haired", "brown-haired", "fair-haired", "grey-haired"],
            Self::Voice => &["soft-spoken", "plain-voiced", "gravelly", "booming"],
        }
    }
}

// ---------------------------------------------------------------------------
// LegalEventKind
// ---------------------------------------------------------------------------

/// The milestone kinds published on the outbound notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegalEventKind {
    /// A new crime record was created (still unknown).
    CrimeRecorded,
    /// A crime was reported and became known.
    CrimeReported,
    /// An offender was arrested for a crime.
    Arrest,
    /// An offender was convicted and sentenced.
    Conviction,
    /// An offender completed a custodial sentence and was released.
    Release,
    /// Bail was posted for an offender.
    BailPosted,
    /// Bail was forfeited after a skipped return deadline.
    BailForfeited,
    /// A crime was forgiven by a competent authority.
    Forgiveness,
}

//! Location data model for the world graph: vertices, hard exits, and the
//! soft "exit availability" layer (pending/forbidden narrative metadata).
//!
//! The wire format is the game's existing camelCase JSON, so serde renames
//! accordingly where field names are compound.

use crate::direction::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// A vertex in the world graph: a place the player can occupy.
///
/// Invariant (enforced at blueprint load): a direction appears in at most one
/// of `exits`, `exit_availability.pending`, `exit_availability.forbidden`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Stable opaque identifier; never reassigned once seeded.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Hard (already built) passages out of this location.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exits: Vec<Exit>,
    #[serde(default, skip_serializing_if = "ExitAvailability::is_empty")]
    pub exit_availability: ExitAvailability,
}

/// A directed, already-built passage. A→B never implies B→A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub direction: Direction,
    /// Destination location id.
    pub to: String,
}

/// Soft narrative metadata about exits that are not hard passages yet:
/// anticipated-but-unbuilt (`pending`) or permanently blocked (`forbidden`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitAvailability {
    /// direction → free-text reason the exit is anticipated.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pending: BTreeMap<Direction, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub forbidden: BTreeMap<Direction, ForbiddenExit>,
}

/// Why passage in a direction is permanently blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForbiddenExit {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motif: Option<BlockMotif>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<RevealTiming>,
}

/// Which availability family an entry or candidate belongs to.
///
/// Ordered so that `Forbidden` ranks above `Pending` wherever the two compete
/// for the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityKind {
    Pending,
    Forbidden,
}

impl AvailabilityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            AvailabilityKind::Pending => "pending",
            AvailabilityKind::Forbidden => "forbidden",
        }
    }
}

/// The string was not `pending` or `forbidden`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized availability: {0:?} (expected pending or forbidden)")]
pub struct ParseAvailabilityError(pub String);

impl FromStr for AvailabilityKind {
    type Err = ParseAvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AvailabilityKind::Pending),
            "forbidden" => Ok(AvailabilityKind::Forbidden),
            other => Err(ParseAvailabilityError(other.to_string())),
        }
    }
}

/// The narrative device blocking a forbidden exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMotif {
    Cliff,
    Ward,
    Water,
    Law,
    Ruin,
}

/// When the player learns a forbidden exit is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealTiming {
    OnLook,
    OnTryMove,
}

/// The string was not a recognized block motif token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized motif: {0:?} (expected cliff, ward, water, law, or ruin)")]
pub struct ParseMotifError(pub String);

impl FromStr for BlockMotif {
    type Err = ParseMotifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cliff" => Ok(BlockMotif::Cliff),
            "ward" => Ok(BlockMotif::Ward),
            "water" => Ok(BlockMotif::Water),
            "law" => Ok(BlockMotif::Law),
            "ruin" => Ok(BlockMotif::Ruin),
            other => Err(ParseMotifError(other.to_string())),
        }
    }
}

/// The string was not a recognized reveal-timing token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized reveal timing: {0:?} (expected onLook or onTryMove)")]
pub struct ParseRevealError(pub String);

impl FromStr for RevealTiming {
    type Err = ParseRevealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onLook" => Ok(RevealTiming::OnLook),
            "onTryMove" => Ok(RevealTiming::OnTryMove),
            other => Err(ParseRevealError(other.to_string())),
        }
    }
}

impl ExitAvailability {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.forbidden.is_empty()
    }

    /// Directions carrying any availability entry, pending or forbidden.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.pending
            .keys()
            .chain(self.forbidden.keys())
            .copied()
    }
}

impl Location {
    /// True iff the direction is taken by a hard exit, a pending entry, or a
    /// forbidden entry. Coverage is what makes additions and candidate
    /// detection skip a direction.
    pub fn covers_direction(&self, direction: Direction) -> bool {
        self.exits.iter().any(|e| e.direction == direction)
            || self.exit_availability.pending.contains_key(&direction)
            || self.exit_availability.forbidden.contains_key(&direction)
    }

    /// All covered directions, deduplicated and ordered.
    pub fn covered_directions(&self) -> BTreeSet<Direction> {
        self.exits
            .iter()
            .map(|e| e.direction)
            .chain(self.exit_availability.directions())
            .collect()
    }
}

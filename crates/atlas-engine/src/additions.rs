//! Validated, non-destructive merge of curated exit-availability additions.
//!
//! Addition files are schema-checked all-or-nothing: one bad entry rejects
//! the whole batch before anything mutates, so a merge never leaves a
//! half-applied blueprint behind. Per-entry conditions discovered during the
//! merge itself (unknown location, direction already covered) are skips, not
//! errors.

use anyhow::{Context, Result};
use atlas_core::direction::Direction;
use atlas_core::world::{AvailabilityKind, BlockMotif, ForbiddenExit, Location, RevealTiming};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Wire form of one availability addition. Weakly typed on purpose: every
/// field tolerates junk at deserialization so validation can report all of a
/// batch's problems at once instead of stopping at the first serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionEntry {
    #[serde(default)]
    pub location_id: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motif: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<String>,
}

/// An addition that passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAddition {
    pub location_id: String,
    pub direction: Direction,
    pub payload: AdditionPayload,
}

/// What a valid addition writes into a location's availability map. Motif and
/// reveal are unrepresentable on pending entries by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionPayload {
    Pending {
        reason: String,
    },
    Forbidden {
        reason: String,
        motif: Option<BlockMotif>,
        reveal: Option<RevealTiming>,
    },
}

impl AdditionPayload {
    pub fn kind(&self) -> AvailabilityKind {
        match self {
            AdditionPayload::Pending { .. } => AvailabilityKind::Pending,
            AdditionPayload::Forbidden { .. } => AvailabilityKind::Forbidden,
        }
    }
}

/// A whole addition batch failed schema validation.
#[derive(Debug, thiserror::Error)]
pub enum AdditionError {
    #[error("addition batch rejected, nothing applied:\n  - {}", .errors.join("\n  - "))]
    BatchRejected { errors: Vec<String> },
}

/// Load an addition file: a JSON array of [`AdditionEntry`].
pub fn load_additions(path: &Path) -> Result<Vec<AdditionEntry>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read additions {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("invalid additions JSON in {}", path.display()))
}

/// Schema-check a single entry. `index` is the entry's position in the batch,
/// used to label error messages. Returns every problem found, not just the
/// first.
pub fn validate_entry(entry: &AdditionEntry, index: usize) -> Result<ValidAddition, Vec<String>> {
    let mut errors = Vec::new();

    if entry.location_id.trim().is_empty() {
        errors.push(format!("entry {index}: locationId is required"));
    }
    let direction = if entry.direction.trim().is_empty() {
        errors.push(format!("entry {index}: direction is required"));
        None
    } else {
        match entry.direction.parse::<Direction>() {
            Ok(d) => Some(d),
            Err(e) => {
                errors.push(format!("entry {index}: {e}"));
                None
            }
        }
    };
    let kind = if entry.availability.trim().is_empty() {
        errors.push(format!("entry {index}: availability is required"));
        None
    } else {
        match entry.availability.parse::<AvailabilityKind>() {
            Ok(k) => Some(k),
            Err(e) => {
                errors.push(format!("entry {index}: {e}"));
                None
            }
        }
    };
    if entry.reason.trim().is_empty() {
        errors.push(format!("entry {index}: reason is required"));
    }

    let motif = match entry.motif.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<BlockMotif>() {
            Ok(m) => Some(m),
            Err(e) => {
                errors.push(format!("entry {index}: {e}"));
                None
            }
        },
    };
    let reveal = match entry.reveal.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<RevealTiming>() {
            Ok(r) => Some(r),
            Err(e) => {
                errors.push(format!("entry {index}: {e}"));
                None
            }
        },
    };
    if kind == Some(AvailabilityKind::Pending) {
        if entry.motif.is_some() {
            errors.push(format!("entry {index}: motif is not allowed on pending entries"));
        }
        if entry.reveal.is_some() {
            errors.push(format!("entry {index}: reveal is not allowed on pending entries"));
        }
    }

    match (direction, kind) {
        (Some(direction), Some(kind)) if errors.is_empty() => {
            let payload = match kind {
                AvailabilityKind::Pending => AdditionPayload::Pending {
                    reason: entry.reason.clone(),
                },
                AvailabilityKind::Forbidden => AdditionPayload::Forbidden {
                    reason: entry.reason.clone(),
                    motif,
                    reveal,
                },
            };
            Ok(ValidAddition {
                location_id: entry.location_id.clone(),
                direction,
                payload,
            })
        }
        _ => Err(errors),
    }
}

/// Validate a whole batch. Any invalid entry rejects the batch with the full
/// error list; nothing is applied.
pub fn validate_additions(entries: &[AdditionEntry]) -> Result<Vec<ValidAddition>, AdditionError> {
    let mut valid = Vec::new();
    let mut errors = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry, index) {
            Ok(addition) => valid.push(addition),
            Err(mut entry_errors) => errors.append(&mut entry_errors),
        }
    }
    if errors.is_empty() {
        Ok(valid)
    } else {
        Err(AdditionError::BatchRejected { errors })
    }
}

/// One addition written into a location's availability map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAddition {
    pub location_id: String,
    pub direction: Direction,
    pub availability: AvailabilityKind,
}

/// Why an addition was skipped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    UnknownLocation,
    DirectionCovered,
}

/// One addition passed over during a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAddition {
    pub location_id: String,
    pub direction: Direction,
    pub reason: SkipReason,
}

/// The exact partition of a merge's input: every addition lands in `applied`
/// or `skipped`, never both, never neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub applied: Vec<AppliedAddition>,
    pub skipped: Vec<SkippedAddition>,
}

/// Merge validated additions into the locations, in place. Existing coverage
/// is never overwritten: an already covered direction skips the addition.
/// Callers wanting dry-run semantics pass a deep copy.
pub fn apply_additions(locations: &mut [Location], additions: &[ValidAddition]) -> MergeOutcome {
    let index_by_id: BTreeMap<String, usize> = locations
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.clone(), i))
        .collect();

    let mut outcome = MergeOutcome::default();
    for addition in additions {
        let Some(&i) = index_by_id.get(&addition.location_id) else {
            outcome.skipped.push(SkippedAddition {
                location_id: addition.location_id.clone(),
                direction: addition.direction,
                reason: SkipReason::UnknownLocation,
            });
            continue;
        };
        let location = &mut locations[i];
        if location.covers_direction(addition.direction) {
            outcome.skipped.push(SkippedAddition {
                location_id: addition.location_id.clone(),
                direction: addition.direction,
                reason: SkipReason::DirectionCovered,
            });
            continue;
        }
        match &addition.payload {
            AdditionPayload::Pending { reason } => {
                location
                    .exit_availability
                    .pending
                    .insert(addition.direction, reason.clone());
            }
            AdditionPayload::Forbidden {
                reason,
                motif,
                reveal,
            } => {
                location.exit_availability.forbidden.insert(
                    addition.direction,
                    ForbiddenExit {
                        reason: reason.clone(),
                        motif: *motif,
                        reveal: *reveal,
                    },
                );
            }
        }
        outcome.applied.push(AppliedAddition {
            location_id: addition.location_id.clone(),
            direction: addition.direction,
            availability: addition.payload.kind(),
        });
    }
    outcome
}

//! Implicit-exit candidate detection over location descriptions.
//!
//! Runs the pattern library against each location's prose and proposes
//! at most one candidate per (location, direction). Candidates rank by
//! suggested availability first, confidence second; a forbidden hint
//! always beats a pending one, and an exact tie keeps the earlier
//! pattern's match.

use crate::patterns::{Confidence, normalize_direction_token, pattern_library};
use atlas_core::direction::Direction;
use atlas_core::world::{AvailabilityKind, Location};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// A proposed availability entry for a direction the location does not
/// already cover.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCandidate {
    pub location_id: String,
    pub direction: Direction,
    pub suggested_availability: AvailabilityKind,
    pub confidence: Confidence,
    pub pattern: String,
    pub evidence: String,
}

/// A location the detector could not read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLocation {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub locations_scanned: usize,
    pub locations_skipped: usize,
    pub total_candidates: usize,
    pub pending_candidates: usize,
    pub forbidden_candidates: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub generated_at: DateTime<Utc>,
    pub summary: DetectionSummary,
    pub candidates: Vec<LocationCandidate>,
    pub skipped: Vec<SkippedLocation>,
}

/// Run the pattern library over every location description.
///
/// Locations without a usable description land in the report's skipped
/// list. Directions already covered by a hard exit or an availability
/// entry never produce candidates.
pub fn detect_candidates(locations: &[Location]) -> DetectionReport {
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for location in locations {
        let Some(description) = location
            .description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        else {
            skipped.push(SkippedLocation {
                id: location.id.clone(),
                name: location.name.clone(),
            });
            continue;
        };

        let mut best: BTreeMap<Direction, LocationCandidate> = BTreeMap::new();
        for pattern in pattern_library() {
            for captures in pattern.regex.captures_iter(description) {
                let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                let Some(direction) = normalize_direction_token(token.as_str()) else {
                    continue;
                };
                if location.covers_direction(direction) {
                    continue;
                }
                let candidate = LocationCandidate {
                    location_id: location.id.clone(),
                    direction,
                    suggested_availability: pattern.availability,
                    confidence: pattern.confidence,
                    pattern: pattern.name.to_string(),
                    evidence: evidence_window(description, whole.start(), whole.end()),
                };
                match best.entry(direction) {
                    Entry::Vacant(slot) => {
                        slot.insert(candidate);
                    }
                    Entry::Occupied(mut slot) => {
                        // Strictly greater only: ties keep the first match.
                        if rank(&candidate) > rank(slot.get()) {
                            slot.insert(candidate);
                        }
                    }
                }
            }
        }
        candidates.extend(best.into_values());
    }

    let summary = summarize(locations.len(), &candidates, &skipped);
    DetectionReport {
        generated_at: Utc::now(),
        summary,
        candidates,
        skipped,
    }
}

fn rank(candidate: &LocationCandidate) -> (AvailabilityKind, Confidence) {
    (candidate.suggested_availability, candidate.confidence)
}

/// Ten characters of context each side of the match, ellipsis-marked
/// where the description continues past the window. Slices on char
/// boundaries, so multi-byte prose is safe.
fn evidence_window(text: &str, start: usize, end: usize) -> String {
    let before = &text[..start];
    let after = &text[end..];
    let window_start = before.char_indices().rev().nth(9).map_or(0, |(i, _)| i);
    let window_end = after.char_indices().nth(10).map_or(after.len(), |(i, _)| i);

    let mut out = String::new();
    if window_start > 0 {
        out.push_str("...");
    }
    out.push_str(&before[window_start..]);
    out.push_str(&text[start..end]);
    out.push_str(&after[..window_end]);
    if window_end < after.len() {
        out.push_str("...");
    }
    out
}

fn summarize(
    total: usize,
    candidates: &[LocationCandidate],
    skipped: &[SkippedLocation],
) -> DetectionSummary {
    let mut summary = DetectionSummary {
        locations_scanned: total - skipped.len(),
        locations_skipped: skipped.len(),
        total_candidates: candidates.len(),
        ..DetectionSummary::default()
    };
    for candidate in candidates {
        match candidate.suggested_availability {
            AvailabilityKind::Pending => summary.pending_candidates += 1,
            AvailabilityKind::Forbidden => summary.forbidden_candidates += 1,
        }
        match candidate.confidence {
            Confidence::High => summary.high_confidence += 1,
            Confidence::Medium => summary.medium_confidence += 1,
            Confidence::Low => summary.low_confidence += 1,
        }
    }
    summary
}

//! Ordered text-pattern library for implicit-exit detection.
//!
//! Regex heuristics over location prose, not a parser. The library is
//! tried in order; earlier entries are the more specific phrasings and
//! the detector resolves collisions by rank, never by position alone.

use atlas_core::direction::Direction;
use atlas_core::world::AvailabilityKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How strongly a pattern match suggests a real exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the pattern library.
///
/// Each regex carries exactly one capture group: the direction token.
#[derive(Debug)]
pub struct ExitPattern {
    pub name: &'static str,
    pub availability: AvailabilityKind,
    pub confidence: Confidence,
    pub regex: Regex,
}

/// Direction vocabulary as it appears in prose. Compounds come first so
/// "northeast" is never consumed as "north"; `wards?` absorbs the
/// adverbial forms ("westward", "northwards").
const DIRECTION_TOKEN: &str = r"(?:north[ -]?east|north[ -]?west|south[ -]?east|south[ -]?west|north|south|east|west|up|down|in|out)(?:wards?)?";

/// The pattern library in priority order. Compiled once per process.
pub fn pattern_library() -> &'static [ExitPattern] {
    static LIBRARY: OnceLock<Vec<ExitPattern>> = OnceLock::new();
    LIBRARY.get_or_init(build_library)
}

fn build_library() -> Vec<ExitPattern> {
    // (name, suggested availability, confidence, template). `{dir}` marks
    // the capture slot; `[^.!?]*?` keeps a match inside one sentence.
    let entries: [(&str, AvailabilityKind, Confidence, &str); 9] = [
        (
            "blocked-passage",
            AvailabilityKind::Forbidden,
            Confidence::High,
            r"\b(?:cliffs?|walls?|gates?|rockfall|rubble|thickets?|thorns|boulders?|landslide)\b[^.!?]*?\bblock(?:s|ed|ing)?\b[^.!?]*?\b{dir}\b",
        ),
        (
            "no-passage",
            AvailabilityKind::Forbidden,
            Confidence::High,
            r"\bno (?:passage|path|way|exit|route|road)\b[^.!?]*?\b{dir}\b",
        ),
        (
            "cannot-go",
            AvailabilityKind::Forbidden,
            Confidence::High,
            r"\b(?:cannot|can't|can no longer|could not)\s+(?:go|pass|travel|proceed|continue|climb)\b[^.!?]*?\b{dir}\b",
        ),
        (
            "way-leads",
            AvailabilityKind::Pending,
            Confidence::High,
            r"\b(?:way|path|trail|road|route|passage|stairs?|stairway|tunnel|bridge|track)\b[^.!?]*?\b(?:leads?|runs?|continues?|climbs?|descends?|winds?|heads?)\b[^.!?]*?\b{dir}\b",
        ),
        (
            "sealed-passage",
            AvailabilityKind::Forbidden,
            Confidence::Medium,
            r"\b(?:way|path|passage|road|route|door|gate|arch|stairs?)\b[^.!?]*?\b{dir}\b[^.!?]*?\b(?:is|are|lies|stands|remains)\s+(?:blocked|sealed|barred|shut|impassable|forbidden|walled off)\b",
        ),
        (
            "to-the-direction",
            AvailabilityKind::Pending,
            Confidence::Medium,
            r"\b(?:to|toward|towards) the {dir}\b",
        ),
        (
            "direction-opens",
            AvailabilityKind::Pending,
            Confidence::Medium,
            r"\b{dir}\b[^.!?]*?\b(?:opens?|beckons?|stretch(?:es)?|extends?|widens?|awaits?)\b",
        ),
        (
            "far-direction",
            AvailabilityKind::Pending,
            Confidence::Low,
            r"\b(?:far|distant|hazy)\b[^.!?]*?\b{dir}\b",
        ),
        (
            "in-the-distance",
            AvailabilityKind::Pending,
            Confidence::Low,
            r"\b{dir}\b[^.!?]*?\bin the distance\b",
        ),
    ];

    entries
        .into_iter()
        .map(|(name, availability, confidence, template)| ExitPattern {
            name,
            availability,
            confidence,
            regex: Regex::new(&format!(
                "(?i){}",
                template.replace("{dir}", &format!("({DIRECTION_TOKEN})"))
            ))
            .unwrap(),
        })
        .collect()
}

/// Map a captured token ("North-East", "westwards") onto its canonical
/// direction. Returns `None` for words outside the vocabulary.
pub fn normalize_direction_token(token: &str) -> Option<Direction> {
    let lowered = token.to_lowercase();
    let folded: String = lowered
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let stem = folded
        .strip_suffix("wards")
        .or_else(|| folded.strip_suffix("ward"))
        .unwrap_or(&folded);
    stem.parse().ok()
}

//! Export a world blueprint as DOT (Graphviz) or Mermaid flowchart.

use atlas_core::world::Location;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Export format for world visualization.
#[derive(Debug, Clone, Copy)]
pub enum ExportFormat {
    Dot,
    Mermaid,
}

/// Export the world as a DOT (Graphviz) string. Anchored locations get
/// a filled highlight; pending and forbidden directions show up inside
/// the node label.
pub fn export_dot(locations: &[Location], anchors: &BTreeSet<String>) -> String {
    let mut out = String::new();
    writeln!(out, "digraph world {{").unwrap();
    writeln!(out, "  rankdir=LR;").unwrap();
    writeln!(out, "  node [shape=box, fontsize=10];").unwrap();
    writeln!(out).unwrap();

    for location in locations {
        let fill = if anchors.contains(&location.id) {
            "#e0e0ff"
        } else {
            "#ffffff"
        };
        writeln!(
            out,
            "  \"{}\" [style=filled, fillcolor=\"{}\", label=\"{}\"];",
            location.id,
            fill,
            node_label(location)
        )
        .unwrap();
    }

    writeln!(out).unwrap();

    for location in locations {
        for exit in &location.exits {
            writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                location.id, exit.to, exit.direction
            )
            .unwrap();
        }
    }

    writeln!(out, "}}").unwrap();
    out
}

/// Export the world as a Mermaid flowchart string.
pub fn export_mermaid(locations: &[Location], anchors: &BTreeSet<String>) -> String {
    let mut out = String::new();
    writeln!(out, "flowchart LR").unwrap();
    writeln!(out, "  classDef anchor fill:#e0e0ff,stroke:#555;").unwrap();
    writeln!(out).unwrap();

    for location in locations {
        let safe_id = mermaid_safe_id(&location.id);
        let suffix = if anchors.contains(&location.id) {
            ":::anchor"
        } else {
            ""
        };
        writeln!(out, "  {}[\"{}\"]{}", safe_id, node_label(location), suffix).unwrap();
    }

    writeln!(out).unwrap();

    for location in locations {
        let src = mermaid_safe_id(&location.id);
        for exit in &location.exits {
            writeln!(
                out,
                "  {} -->|{}| {}",
                src,
                exit.direction,
                mermaid_safe_id(&exit.to)
            )
            .unwrap();
        }
    }

    out
}

/// Node label: name plus any pending/forbidden directions, one line each.
fn node_label(location: &Location) -> String {
    let mut label = location.name.clone();
    let pending: Vec<&str> = location
        .exit_availability
        .pending
        .keys()
        .map(|d| d.as_str())
        .collect();
    if !pending.is_empty() {
        label.push_str("\\npending: ");
        label.push_str(&pending.join(", "));
    }
    let forbidden: Vec<&str> = location
        .exit_availability
        .forbidden
        .keys()
        .map(|d| d.as_str())
        .collect();
    if !forbidden.is_empty() {
        label.push_str("\\nforbidden: ");
        label.push_str(&forbidden.join(", "));
    }
    label
}

/// Mermaid node ids cannot carry punctuation; fold it to underscores.
fn mermaid_safe_id(id: &str) -> String {
    id.replace([':', '/', '.', ' ', '-'], "_")
}

/// Export the world in the given format.
pub fn export(locations: &[Location], anchors: &BTreeSet<String>, format: ExportFormat) -> String {
    match format {
        ExportFormat::Dot => export_dot(locations, anchors),
        ExportFormat::Mermaid => export_mermaid(locations, anchors),
    }
}

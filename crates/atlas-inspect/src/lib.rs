//! Read-side tooling over the Atlas world graph.
//!
//! Provides the consistency scanner (dangling exits, orphan locations,
//! missing reciprocal passages), the implicit-exit candidate detector
//! driven by the ordered pattern library, and DOT/Mermaid exports.

pub mod detect;
pub mod export;
pub mod patterns;
pub mod scan;

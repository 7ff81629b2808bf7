//! Graph mutation engine for the world location graph.
//!
//! Two operations, both idempotent in effect: blueprint seeding
//! ([`seed::seed_blueprint`]) and validated merge of exit-availability
//! additions ([`additions::apply_additions`]). Neither ever removes or
//! overwrites existing graph content.

pub mod additions;
pub mod seed;

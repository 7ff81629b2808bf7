//! Core types and storage for the world location graph.
//!
//! Provides the direction model ([`direction::Direction`]), the location data
//! model ([`world::Location`]), blueprint file I/O, the [`store::GraphStore`]
//! abstraction with its in-memory and file-backed implementations, and
//! project configuration.

pub mod blueprint;
pub mod config;
pub mod direction;
pub mod filestore;
pub mod store;
pub mod world;

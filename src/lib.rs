//! Ridgeline - aggregation service for mountain-area geospatial and
//! weather data.
//!
//! # Overview
//!
//! Ridgeline pulls mountain-area data from three independent open-data
//! providers (a cellular base-station registry, mountain weather
//! observations, and a hazard point-of-interest registry) and exposes the
//! merged records through a small HTTP API. A fourth, token-authenticated
//! provider resolves addresses to WGS84 coordinates.
//!
//! The providers disagree on almost everything: envelope shapes,
//! pagination signals, and authentication. The crate's job is to hide that
//! variance behind one retrying transport, one page loop, and a
//! process-wide token cache.
//!
//! # Modules
//!
//! - [`transport`]: retrying HTTP GET shared by every client
//! - [`sources`]: per-provider paginated fetch clients
//! - [`geocoding`]: SGIS geocoding with cached bearer tokens
//! - [`model`]: record schemas and response envelopes
//! - [`api`]: HTTP API handlers
//! - [`mock`]: seeded mock data generation
//! - [`export`]: JSON/CSV snapshot files
//! - [`config`]: environment-driven settings

pub mod api;
pub mod config;
pub mod export;
pub mod geocoding;
pub mod mock;
pub mod model;
pub mod sources;
pub mod transport;

//! Flowcalc Core -- maximum-throughput analysis of production networks.
//!
//! A [`network::Network`] holds sources, buffers, station groups and waste
//! points connected by material-labelled edges. For an extraction point it
//! computes the highest sustainable rate as a linear program, then explains
//! that rate as a chain of limiting capacity constraints.
//!
//! # Analysis Pipeline
//!
//! 1. **Search** -- walk backwards from the output point to the sources
//!    and station groups that can feed it, pulling in waste points that
//!    share upstream capacity ([`search`]).
//! 2. **Build** -- one variable per station group, transfer edge and waste
//!    point; mass balance and ratio equalities; tagged capacity caps ([`lp`]).
//! 3. **Solve** -- maximise extraction, then re-solve at the same rate to
//!    minimise weighted waste when anything is being discarded ([`solver`]).
//! 4. **Decompose** -- drop the first binding cap and re-solve until the rate
//!    is unbounded ([`analysis`]).
//!
//! ```
//! use flowcalc_core::network::{Network, OutputPoint};
//! use flowcalc_core::station::RecipeStation;
//!
//! let mut network = Network::new();
//! let ore = network.add_source("iron_ore", Some(30.0)).unwrap();
//! let smelter = RecipeStation::new(
//!     "smelter",
//!     vec![("iron_ore".into(), 1.0)],
//!     vec![("iron_plate".into(), 1.0)],
//!     3.2,
//! )
//! .unwrap();
//! let smelters = network.add_station_group(smelter, None).unwrap();
//! network.connect(ore, smelters, &[]).unwrap();
//!
//! let result = network.analyse(&OutputPoint::new(smelters, "iron_plate")).unwrap();
//! assert!((result.rate - 30.0).abs() < 1e-6);
//! ```
//!
//! # Key Types
//!
//! - [`network::Network`] -- node arena, construction API and output points.
//! - [`station::StationType`] -- per-unit consumption and production rates of
//!   a station group; [`station::RecipeStation`] is the built-in recipe model.
//! - [`result::SingleResult`] / [`result::AggregateResult`] -- rates and
//!   bottleneck chains.
//! - [`config::AnalysisConfig`] -- numerical tolerance and optional passes.

pub mod analysis;
pub mod config;
pub mod id;
pub mod lp;
pub mod network;
pub mod node;
pub mod result;
pub mod search;
pub mod solver;
pub mod station;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

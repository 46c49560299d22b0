//! Headless runner for the geopolitical simulation.
//!
//! Loads a [`Scenario`](scenario::Scenario), wires it to a
//! [`PointGeometry`](geometry::PointGeometry) and hands back a ready
//! [`Simulation`](geosim_core::Simulation).

pub mod geometry;
pub mod scenario;

pub use geometry::{CountryShape, PointGeometry};
pub use scenario::Scenario;

//! Particle transport through accelerator fields.
//!
//! Coordinate transforms, equation of motion, the integrator family and
//! the factory that builds field, equation and integrator from a recipe.

pub mod dipole;
pub mod equation;
pub mod factory;
pub mod fringe;
pub mod generic;
pub mod integrator;
pub mod multipole;
pub mod navigator;
pub mod quadrupole;
pub mod query;
pub mod recipe;
pub mod solenoid;
pub mod thin;

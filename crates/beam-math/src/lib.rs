//! Numerical primitives for SCPN Beam Core.

pub mod interp;
pub mod rk;
pub mod series;
pub mod transfer;
pub mod vector;

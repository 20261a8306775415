//! Gas planning module.
//!
//! Minimum gas (the reserve needed to get two divers to the surface on one
//! supply) and the turnaround figures that follow from it, exposed as
//! HTTP endpoints.

mod calculator;
mod models;
mod routes;
mod tanks;

pub use calculator::GasError;
pub use routes::router;
pub use tanks::{TankSpec, TANKS};

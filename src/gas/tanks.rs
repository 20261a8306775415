//! Cylinder table and configuration lookup.

use std::str::FromStr;

use serde::Serialize;

use super::calculator::GasError;

/// Single cylinder entry: cubic feet of gas per 100 psi.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TankSpec {
    pub name: &'static str,
    pub capacity_factor: f64,
}

/// Known cylinders, in the order they are offered to the diver.
pub static TANKS: [TankSpec; 11] = [
    TankSpec { name: "AL40", capacity_factor: 1.25 },
    TankSpec { name: "AL80", capacity_factor: 2.5 },
    TankSpec { name: "LP80", capacity_factor: 3.0 },
    TankSpec { name: "LP83", capacity_factor: 3.5 },
    TankSpec { name: "LP95", capacity_factor: 4.0 },
    TankSpec { name: "LP104", capacity_factor: 4.3 },
    TankSpec { name: "LP120", capacity_factor: 4.5 },
    TankSpec { name: "HP80", capacity_factor: 2.3 },
    TankSpec { name: "HP100", capacity_factor: 3.0 },
    TankSpec { name: "HP120", capacity_factor: 3.5 },
    TankSpec { name: "HP130", capacity_factor: 4.0 },
];

/// How many cylinders of the chosen type the diver carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankConfig {
    Single,
    Double,
}

impl TankConfig {
    fn multiplier(self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::Double => 2.0,
        }
    }
}

impl FromStr for TankConfig {
    type Err = GasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            other => Err(GasError::InvalidInput(format!(
                "config must be \"single\" or \"double\", got {other:?}"
            ))),
        }
    }
}

/// Look up a cylinder by its exact table name.
pub fn find_tank(name: &str) -> Option<&'static TankSpec> {
    TANKS.iter().find(|t| t.name == name)
}

/// Capacity factor for `name`, doubled for a twinset.
pub fn capacity_factor(name: &str, config: TankConfig) -> Result<f64, GasError> {
    let tank = find_tank(name)
        .ok_or_else(|| GasError::InvalidInput(format!("unknown tank {name:?}")))?;
    Ok(tank.capacity_factor * config.multiplier())
}

//! Minimum gas and turnaround arithmetic.
//!
//! All depths are in feet of seawater, volumes in cubic feet and pressures
//! in psi. Nothing is rounded here; rounding happens when the response is
//! built.

use thiserror::Error;

use super::models::{MinimumGas, TurnData};
use super::tanks::{capacity_factor, TankConfig};

/// Feet of seawater per atmosphere.
const FEET_PER_ATM: f64 = 33.0;
/// Ascent rate in ft/min.
const ASCENT_RATE: f64 = 10.0;
/// Descent rate in ft/min.
const DESCENT_RATE: f64 = 30.0;
/// Safety stop (ascent) or settling time (descent), minutes.
const STOP_MINUTES: f64 = 1.0;
/// Two divers breathing from one supply during the ascent.
const SHARED_ASCENT_DIVERS: f64 = 2.0;
/// Lowest reserve ever reported.
pub const MINIMUM_GAS_FLOOR_PSI: f64 = 500.0;

/// Gas planning errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GasError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Start pressure must be greater than minimum gas.")]
    InsufficientStartPressure,
    #[error("The gas tank type/ starting pressure is not suitable for this dive.")]
    UnsuitableDiveProfile,
}

/// Time to the surface from `depth`, including the safety stop.
pub fn ascent_time(depth: f64) -> f64 {
    depth / ASCENT_RATE + STOP_MINUTES
}

/// Time to reach `depth` from the surface.
pub fn descent_time(depth: f64) -> f64 {
    depth / DESCENT_RATE + STOP_MINUTES
}

/// Absolute pressure at `depth`, in atmospheres.
pub fn ambient_pressure(depth: f64) -> f64 {
    depth / FEET_PER_ATM + 1.0
}

/// Reserve needed to bring two divers up from `depth` on one supply.
pub fn compute_minimum_gas(
    consumption_rate: f64,
    depth: f64,
    tank: &str,
    config: TankConfig,
) -> Result<MinimumGas, GasError> {
    if !consumption_rate.is_finite() || !depth.is_finite() {
        return Err(GasError::InvalidInput(
            "consumption rate and depth must be numbers".to_string(),
        ));
    }
    let factor = capacity_factor(tank, config)?;

    // Average depth of the ascent is half the working depth.
    let average_ata = ambient_pressure(depth / 2.0);
    let volume_cf = consumption_rate * SHARED_ASCENT_DIVERS * average_ata * ascent_time(depth);
    let pressure_psi = (volume_cf / factor * 100.0).max(MINIMUM_GAS_FLOOR_PSI);

    Ok(MinimumGas {
        pressure_psi,
        average_ata,
    })
}

/// Turnaround figures for a dive starting at `start_pressure` that must
/// surface with `minimum_gas` still in the cylinder.
pub fn compute_turn_data(
    start_pressure: f64,
    minimum_gas: f64,
    tank: &str,
    config: TankConfig,
    consumption_rate: f64,
    depth: f64,
) -> Result<TurnData, GasError> {
    // Also rejects NaN on either side.
    if !(start_pressure > minimum_gas) {
        return Err(GasError::InsufficientStartPressure);
    }

    let usable_gas = start_pressure - minimum_gas;
    let turn_pressure = start_pressure - usable_gas / 2.0;
    let factor = capacity_factor(tank, config)?;

    let consumption_at_depth = consumption_rate * ambient_pressure(depth);
    let psi_per_minute = consumption_at_depth / factor * 100.0;

    let gas_before_turn_psi = start_pressure - turn_pressure;
    let gas_before_turn_cf = gas_before_turn_psi * factor / 100.0;

    if turn_pressure <= minimum_gas || gas_before_turn_psi <= minimum_gas {
        return Err(GasError::UnsuitableDiveProfile);
    }

    let turn = TurnData {
        usable_gas,
        turn_pressure,
        consumption_at_depth,
        gas_before_turn_psi,
        gas_before_turn_cf,
        time_before_turn: gas_before_turn_psi / psi_per_minute,
        total_dive_time: usable_gas / psi_per_minute,
        descent_time: descent_time(depth),
        ascent_time: ascent_time(depth),
    };

    // Underflow in the consumption rate or overflow in the pressures shows
    // up here as inf/NaN.
    if !turn.is_finite() {
        return Err(GasError::InvalidInput(
            "inputs produce dive figures outside the representable range".to_string(),
        ));
    }

    Ok(turn)
}

//! Data types for gas planning.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::calculator::GasError;
use super::tanks::TankConfig;

/// Raw request payload for `/calculate`.
///
/// Fields stay untyped until [`DiveInputs::try_from`] so that a missing or
/// malformed value is reported as a gas planning error rather than a
/// generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct CalculateRequest {
    /// Surface air consumption, cubic feet per minute
    #[serde(default)]
    pub sac: Option<Value>,
    /// Planned depth in feet
    #[serde(default)]
    pub depth: Option<Value>,
    /// Tank name from the tank table
    #[serde(default)]
    pub tank: Option<Value>,
    /// "single" or "double"
    #[serde(default)]
    pub config: Option<Value>,
    /// Starting cylinder pressure in psi
    #[serde(default)]
    pub start_pressure: Option<Value>,
}

/// Validated diver input.
#[derive(Debug, Clone, PartialEq)]
pub struct DiveInputs {
    pub sac: f64,
    pub depth: f64,
    pub tank: String,
    pub config: TankConfig,
    pub start_pressure: f64,
}

impl TryFrom<CalculateRequest> for DiveInputs {
    type Error = GasError;

    fn try_from(request: CalculateRequest) -> Result<Self, Self::Error> {
        let sac = number_field("sac", request.sac.as_ref())?;
        let depth = number_field("depth", request.depth.as_ref())?;
        let tank = string_field("tank", request.tank.as_ref())?.to_string();
        let config = string_field("config", request.config.as_ref())?.parse::<TankConfig>()?;
        let start_pressure = number_field("start_pressure", request.start_pressure.as_ref())?;

        check_range("sac", sac, SAC_RANGE)?;
        check_range("depth", depth, DEPTH_RANGE)?;
        check_range("start_pressure", start_pressure, START_PRESSURE_RANGE)?;

        Ok(DiveInputs {
            sac,
            depth,
            tank,
            config,
            start_pressure,
        })
    }
}

/// Accepted surface consumption, cubic feet per minute.
pub const SAC_RANGE: RangeInclusive<f64> = 0.01..=10.0;
/// Accepted depth, feet.
pub const DEPTH_RANGE: RangeInclusive<f64> = 0.0..=1000.0;
/// Accepted starting pressure, psi.
pub const START_PRESSURE_RANGE: RangeInclusive<f64> = 1.0..=10_000.0;

fn check_range(name: &str, value: f64, range: RangeInclusive<f64>) -> Result<(), GasError> {
    if !range.contains(&value) {
        return Err(GasError::InvalidInput(format!(
            "{name} must be between {} and {}",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

/// Accepts a JSON number or a string holding one.
fn number_field(name: &str, value: Option<&Value>) -> Result<f64, GasError> {
    let parsed = match value {
        None | Some(Value::Null) => {
            return Err(GasError::InvalidInput(format!("missing field {name}")))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(GasError::InvalidInput(format!("{name} must be a number"))),
    }
}

fn string_field<'a>(name: &str, value: Option<&'a Value>) -> Result<&'a str, GasError> {
    match value {
        None | Some(Value::Null) => Err(GasError::InvalidInput(format!("missing field {name}"))),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(GasError::InvalidInput(format!("{name} must be a string"))),
    }
}

/// Reserve pressure and the mean ambient pressure it was computed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumGas {
    /// Reserve in psi, never below 500
    pub pressure_psi: f64,
    /// Ambient pressure at half depth, atmospheres
    pub average_ata: f64,
}

/// Turnaround figures, unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnData {
    pub usable_gas: f64,
    pub turn_pressure: f64,
    /// Cubic feet per minute at the working depth
    pub consumption_at_depth: f64,
    pub gas_before_turn_psi: f64,
    pub gas_before_turn_cf: f64,
    /// Minutes
    pub time_before_turn: f64,
    /// Minutes
    pub total_dive_time: f64,
    /// Minutes
    pub descent_time: f64,
    /// Minutes
    pub ascent_time: f64,
}

impl TurnData {
    /// True when every figure is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.usable_gas,
            self.turn_pressure,
            self.consumption_at_depth,
            self.gas_before_turn_psi,
            self.gas_before_turn_cf,
            self.time_before_turn,
            self.total_dive_time,
            self.descent_time,
            self.ascent_time,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Time/pressure series fed to the chart. Absent entries mark legs whose
/// pressure is not known and are skipped when plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoints {
    pub times: Vec<Option<f64>>,
    pub pressures: Vec<Option<f64>>,
}

impl Waypoints {
    /// Start, end of descent, turn, end of return leg, end of dive.
    pub fn for_dive(start_pressure: f64, minimum_gas: f64, turn: &TurnData) -> Self {
        let descent = turn.descent_time.round();
        let before_turn = turn.time_before_turn.round();
        let ascent = turn.ascent_time.round();
        let total = turn.total_dive_time.round();

        Waypoints {
            times: vec![
                Some(0.0),
                Some(descent),
                Some(before_turn),
                Some(ascent + before_turn),
                Some(total),
            ],
            pressures: vec![
                Some(start_pressure),
                None,
                Some(turn.turn_pressure),
                None,
                Some(minimum_gas.round()),
            ],
        }
    }
}

/// Response payload from `/calculate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub minimum_gas: i64,
    pub turn_pressure: i64,
    pub gas_before_turn_psi: f64,
    pub gas_before_turn_cf: f64,
    pub total_dive_time_min: f64,
    pub time_before_turn: f64,
    pub usable_gas: f64,
    /// Base64 PNG chart of pressure over time
    pub graph_img: String,
}

impl CalculateResponse {
    pub fn new(minimum_gas: f64, turn: &TurnData, graph_img: String) -> Self {
        CalculateResponse {
            minimum_gas: minimum_gas.round() as i64,
            turn_pressure: turn.turn_pressure.round() as i64,
            gas_before_turn_psi: round2(turn.gas_before_turn_psi),
            gas_before_turn_cf: round2(turn.gas_before_turn_cf),
            total_dive_time_min: round2(turn.total_dive_time),
            time_before_turn: round2(turn.time_before_turn),
            usable_gas: round2(turn.usable_gas),
            graph_img,
        }
    }
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

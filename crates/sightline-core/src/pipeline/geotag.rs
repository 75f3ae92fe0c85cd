//! Location extraction from raw capture metadata.
//!
//! Platforms report GPS fields as either numeric values or numeric strings;
//! parsing is intentionally lenient and never fails the capture.

use serde_json::{Map, Value};

use crate::device::gps_keys;
use crate::types::Location;

/// Parse a [`Location`] from the raw metadata map.
///
/// Returns `Some` only when both latitude and longitude parse. A half-parsed
/// coordinate pair yields `None`, never a zeroed coordinate.
pub fn parse(metadata: &Map<String, Value>) -> Option<Location> {
    let latitude = numeric(metadata.get(gps_keys::LATITUDE)?)?;
    let longitude = numeric(metadata.get(gps_keys::LONGITUDE)?)?;

    Some(Location {
        latitude,
        longitude,
        altitude: metadata.get(gps_keys::ALTITUDE).and_then(numeric),
        accuracy: metadata.get(gps_keys::H_POSITIONING_ERROR).and_then(numeric),
    })
}

/// Read a numeric value or a numeric string as f64.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// Mapper from the setpoint payload to the exported JSON document
use crate::domain::numeric::MAX_SAFE_INTEGER;
use crate::domain::setpoint::{Reading, Setpoint};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// Document written when the payload cannot be encoded
pub const EMPTY_DOCUMENT: &str = "[]";

#[derive(Serialize)]
struct WireReading {
    #[serde(serialize_with = "serialize_number")]
    system_id: f64,
    parameter: &'static str,
    #[serde(serialize_with = "serialize_number")]
    nominal: f64,
}

impl From<&Reading> for WireReading {
    fn from(reading: &Reading) -> Self {
        Self {
            system_id: reading.system_id,
            parameter: reading.parameter.as_str(),
            nominal: reading.nominal,
        }
    }
}

/// Integral values are written without a fraction (`40`, not `40.0`);
/// non-finite values have no JSON form and fail the whole encode.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(S::Error::custom(format!("non-finite number {}", value)));
    }
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Encode the payload as compact or two-space indented JSON.
/// Falls back to [`EMPTY_DOCUMENT`] if anything cannot be represented.
pub fn encode(payload: &[Setpoint], compact: bool) -> String {
    let document: Vec<Vec<WireReading>> = payload
        .iter()
        .map(|setpoint| setpoint.readings().iter().map(WireReading::from).collect())
        .collect();

    let encoded = if compact {
        serde_json::to_string(&document)
    } else {
        serde_json::to_string_pretty(&document)
    };

    encoded.unwrap_or_else(|e| {
        tracing::warn!("Payload encoding failed, exporting empty document: {}", e);
        EMPTY_DOCUMENT.to_string()
    })
}

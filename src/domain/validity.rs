// Export gate over the form inputs
use super::numeric::parse_strict;
use super::setpoint::{build, humidity_value, SetpointGroup};

/// Whether every field of the form holds an acceptable value.
///
/// The system id must be a finite number above zero and every group needs a
/// parsable temperature. Empty humidity fields are allowed; filled ones must
/// parse and fall inside the humidity range.
pub fn is_valid(system_id: f64, groups: &[SetpointGroup]) -> bool {
    if !system_id.is_finite() || system_id <= 0.0 {
        return false;
    }

    groups.iter().all(|group| {
        parse_strict(&group.temperature).is_some()
            && group
                .humidities
                .iter()
                .all(|entry| entry.nominal.is_empty() || humidity_value(&entry.nominal).is_some())
    })
}

/// Valid and producing at least one setpoint
pub fn is_export_ready(system_id: f64, groups: &[SetpointGroup]) -> bool {
    is_valid(system_id, groups) && !build(system_id, groups).is_empty()
}

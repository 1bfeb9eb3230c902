// Setpoint domain model and payload builder
use super::numeric::parse_strict;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Accepted relative humidity, inclusive
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HumidityId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for HumidityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One humidity field of a setpoint group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumidityEntry {
    pub id: HumidityId,
    pub nominal: String,
}

impl HumidityEntry {
    pub fn new(id: HumidityId, nominal: impl Into<String>) -> Self {
        Self {
            id,
            nominal: nominal.into(),
        }
    }
}

/// One row of user input: a temperature field and its humidity fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetpointGroup {
    pub id: GroupId,
    pub temperature: String,
    pub humidities: Vec<HumidityEntry>,
}

impl SetpointGroup {
    pub fn new(id: GroupId, temperature: impl Into<String>, humidities: Vec<HumidityEntry>) -> Self {
        Self {
            id,
            temperature: temperature.into(),
            humidities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Temperature,
    Humidity,
}

impl Parameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Humidity => "Humidity",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub system_id: f64,
    pub parameter: Parameter,
    pub nominal: f64,
}

/// A temperature reading followed by zero or more humidity readings.
/// The constructor is the only way in, so the temperature always leads.
#[derive(Debug, Clone, PartialEq)]
pub struct Setpoint {
    readings: Vec<Reading>,
}

impl Setpoint {
    pub fn new(system_id: f64, temperature: f64) -> Self {
        Self {
            readings: vec![Reading {
                system_id,
                parameter: Parameter::Temperature,
                nominal: temperature,
            }],
        }
    }

    pub fn push_humidity(&mut self, nominal: f64) {
        let system_id = self.readings[0].system_id;
        self.readings.push(Reading {
            system_id,
            parameter: Parameter::Humidity,
            nominal,
        });
    }

    pub fn with_humidity(mut self, nominal: f64) -> Self {
        self.push_humidity(nominal);
        self
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn temperature(&self) -> f64 {
        self.readings[0].nominal
    }
}

pub type Payload = Vec<Setpoint>;

/// Value of a humidity field if it would be exported
pub fn humidity_value(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    parse_strict(text).filter(|value| HUMIDITY_RANGE.contains(value))
}

/// Build the export payload from the form groups.
///
/// Groups whose temperature does not parse are skipped; humidity fields that
/// are empty, unparsable or outside [`HUMIDITY_RANGE`] are skipped. Order is
/// preserved. `system_id` is copied verbatim into every reading.
pub fn build(system_id: f64, groups: &[SetpointGroup]) -> Payload {
    groups
        .iter()
        .filter_map(|group| {
            let temperature = parse_strict(&group.temperature)?;
            let mut setpoint = Setpoint::new(system_id, temperature);
            for entry in &group.humidities {
                if let Some(nominal) = humidity_value(&entry.nominal) {
                    setpoint.push_humidity(nominal);
                }
            }
            Some(setpoint)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn group(id: u64, temperature: &str, humidities: &[&str]) -> SetpointGroup {
        SetpointGroup::new(
            GroupId(id),
            temperature,
            humidities
                .iter()
                .enumerate()
                .map(|(i, h)| HumidityEntry::new(HumidityId(id * 100 + i as u64), *h))
                .collect(),
        )
    }

    #[test]
    fn test_single_temperature() {
        let payload = build(1.0, &[group(1, "-95.0", &[])]);
        assert_eq!(payload, vec![Setpoint::new(1.0, -95.0)]);
    }

    #[test]
    fn test_temperature_with_humidities_in_order() {
        let payload = build(1.0, &[group(1, "40.0", &["33.0", "80.0"])]);
        assert_eq!(
            payload,
            vec![Setpoint::new(1.0, 40.0).with_humidity(33.0).with_humidity(80.0)]
        );
    }

    #[test]
    fn test_empty_humidity_dropped() {
        let payload = build(2.0, &[group(1, "40.0", &[""])]);
        assert_eq!(payload, vec![Setpoint::new(2.0, 40.0)]);
    }

    #[test]
    fn test_multiple_groups_share_system_id() {
        let payload = build(3.0, &[group(1, "0.0", &[]), group(2, "40.0", &["33"])]);
        assert_eq!(
            payload,
            vec![
                Setpoint::new(3.0, 0.0),
                Setpoint::new(3.0, 40.0).with_humidity(33.0)
            ]
        );
        assert!(payload
            .iter()
            .flat_map(|s| s.readings())
            .all(|r| r.system_id == 3.0));
    }

    #[test]
    fn test_out_of_range_humidity_dropped() {
        let payload = build(4.0, &[group(1, "25.0", &["-5", "120", "50"])]);
        assert_eq!(payload, vec![Setpoint::new(4.0, 25.0).with_humidity(50.0)]);
    }

    #[test]
    fn test_non_numeric_humidity_dropped() {
        let payload = build(5.0, &[group(1, "10", &["abc", "75"])]);
        assert_eq!(payload, vec![Setpoint::new(5.0, 10.0).with_humidity(75.0)]);
    }

    #[test]
    fn test_humidity_bounds_are_inclusive() {
        let payload = build(1.0, &[group(1, "20", &["0", "100", "100.0001"])]);
        assert_eq!(
            payload,
            vec![Setpoint::new(1.0, 20.0).with_humidity(0.0).with_humidity(100.0)]
        );
    }

    #[test]
    fn test_group_with_bad_temperature_dropped_entirely() {
        let groups = [
            group(1, "", &["50"]),
            group(2, "-", &["50"]),
            group(3, "abc", &[]),
            group(4, "12", &["40"]),
        ];
        let payload = build(1.0, &groups);
        assert_eq!(payload, vec![Setpoint::new(1.0, 12.0).with_humidity(40.0)]);
    }

    #[test]
    fn test_every_setpoint_starts_with_temperature() {
        let groups = [
            group(1, "5", &["1", "x", "2"]),
            group(2, "nope", &["3"]),
            group(3, "-40", &[]),
        ];
        for setpoint in build(9.0, &groups) {
            let (first, rest) = setpoint.readings().split_first().unwrap();
            assert_eq!(first.parameter, Parameter::Temperature);
            assert!(rest.iter().all(|r| r.parameter == Parameter::Humidity));
        }
    }

    #[test]
    fn test_system_id_taken_verbatim() {
        let payload = build(-3.0, &[group(1, "1", &[])]);
        assert_eq!(payload[0].readings()[0].system_id, -3.0);

        let payload = build(f64::NAN, &[group(1, "1", &["2"])]);
        assert!(payload[0].readings().iter().all(|r| r.system_id.is_nan()));
    }

    #[test]
    fn test_build_is_idempotent_and_never_grows() {
        let groups = [
            group(1, "10", &["20", "bad"]),
            group(2, "", &[]),
            group(3, "30", &["40"]),
        ];
        let first = build(7.0, &groups);
        let second = build(7.0, &groups);
        assert_eq!(first, second);
        assert!(first.len() <= groups.len());
        let temperatures: Vec<f64> = first.iter().map(Setpoint::temperature).collect();
        assert_eq!(temperatures, vec![10.0, 30.0]);
    }

    /// Field text as a user might leave it: numbers in and out of the
    /// humidity range, exponent forms, padding, junk and editing states
    pub(crate) fn arb_field() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("-".to_string()),
            Just(".".to_string()),
            (-200.0f64..200.0).prop_map(|v| v.to_string()),
            (-200i32..200).prop_map(|v| format!("{}.0", v)),
            (-9i32..10, -3i32..4).prop_map(|(m, e)| format!("{}e{}", m, e)),
            (-200i32..200).prop_map(|v| format!(" {}", v)),
            (-200i32..200).prop_map(|v| format!("{} ", v)),
            "[a-z]{1,4}",
            "[ \\t]{1,3}",
        ]
    }

    pub(crate) fn arb_groups() -> impl Strategy<Value = Vec<SetpointGroup>> {
        prop::collection::vec(
            (arb_field(), prop::collection::vec(arb_field(), 0..5)),
            0..6,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (temperature, humidities))| {
                    let id = i as u64 + 1;
                    let entries = humidities
                        .into_iter()
                        .enumerate()
                        .map(|(j, h)| HumidityEntry::new(HumidityId(id * 100 + j as u64), h))
                        .collect();
                    SetpointGroup::new(GroupId(id), temperature, entries)
                })
                .collect()
        })
    }

    /// Plain std parsing, finite values only
    fn finite(text: &str) -> Option<f64> {
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    proptest! {
        #[test]
        fn group_contributes_iff_temperature_is_finite(
            system_id in 1u32..10_000,
            groups in arb_groups()
        ) {
            let payload = build(system_id as f64, &groups);
            let expected: Vec<f64> = groups.iter().filter_map(|g| finite(&g.temperature)).collect();
            let temperatures: Vec<f64> = payload.iter().map(Setpoint::temperature).collect();
            prop_assert_eq!(temperatures, expected);
        }

        #[test]
        fn humidity_kept_iff_finite_and_in_range(groups in arb_groups()) {
            let payload = build(1.0, &groups);
            let contributing = groups.iter().filter(|g| finite(&g.temperature).is_some());
            for (setpoint, group) in payload.iter().zip(contributing) {
                let expected: Vec<f64> = group
                    .humidities
                    .iter()
                    .filter_map(|h| finite(&h.nominal))
                    .filter(|v| (0.0..=100.0).contains(v))
                    .collect();
                let kept: Vec<f64> = setpoint.readings()[1..].iter().map(|r| r.nominal).collect();
                prop_assert_eq!(kept, expected);
            }
        }

        #[test]
        fn readings_keep_shape_and_share_system_id(
            system_id in 1u32..10_000,
            groups in arb_groups()
        ) {
            let system_id = system_id as f64;
            let payload = build(system_id, &groups);
            prop_assert!(payload.len() <= groups.len());
            for setpoint in &payload {
                let (first, rest) = setpoint.readings().split_first().unwrap();
                prop_assert_eq!(first.parameter, Parameter::Temperature);
                prop_assert!(rest.iter().all(|r| r.parameter == Parameter::Humidity));
                prop_assert!(setpoint.readings().iter().all(|r| r.system_id == system_id));
            }
        }

        #[test]
        fn build_is_idempotent(system_id in 1u32..10_000, groups in arb_groups()) {
            prop_assert_eq!(build(system_id as f64, &groups), build(system_id as f64, &groups));
        }
    }
}

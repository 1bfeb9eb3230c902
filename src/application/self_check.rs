// Self-check harness - Fixed builder regression cases run at startup and on demand
use crate::domain::setpoint::{
    build, GroupId, HumidityEntry, HumidityId, Payload, Setpoint, SetpointGroup,
};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfCheckStatus {
    Passed,
    Failed,
    Crashed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfCheckSummary {
    pub status: SelfCheckStatus,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub failures: Vec<String>,
    pub ran_at: String,
}

struct Case {
    name: &'static str,
    system_id: f64,
    groups: Vec<SetpointGroup>,
    expected: Payload,
}

fn group(id: u64, temperature: &str, humidities: &[&str]) -> SetpointGroup {
    let entries = humidities
        .iter()
        .enumerate()
        .map(|(i, nominal)| HumidityEntry::new(HumidityId(i as u64 + 1), *nominal))
        .collect();
    SetpointGroup::new(GroupId(id), temperature, entries)
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "single temperature",
            system_id: 1.0,
            groups: vec![group(1, "-95.0", &[])],
            expected: vec![Setpoint::new(1.0, -95.0)],
        },
        Case {
            name: "temperature with two humidities",
            system_id: 1.0,
            groups: vec![group(1, "40.0", &["33.0", "80.0"])],
            expected: vec![Setpoint::new(1.0, 40.0).with_humidity(33.0).with_humidity(80.0)],
        },
        Case {
            name: "empty humidity dropped",
            system_id: 2.0,
            groups: vec![group(1, "40.0", &[""])],
            expected: vec![Setpoint::new(2.0, 40.0)],
        },
        Case {
            name: "two groups share system id",
            system_id: 3.0,
            groups: vec![group(1, "0.0", &[]), group(2, "40.0", &["33"])],
            expected: vec![
                Setpoint::new(3.0, 0.0),
                Setpoint::new(3.0, 40.0).with_humidity(33.0),
            ],
        },
        Case {
            name: "out-of-range humidity dropped",
            system_id: 4.0,
            groups: vec![group(1, "25.0", &["-5", "120", "50"])],
            expected: vec![Setpoint::new(4.0, 25.0).with_humidity(50.0)],
        },
        Case {
            name: "non-numeric humidity dropped",
            system_id: 5.0,
            groups: vec![group(1, "10", &["abc", "75"])],
            expected: vec![Setpoint::new(5.0, 10.0).with_humidity(75.0)],
        },
    ]
}

/// Run the regression cases against the payload builder
pub fn run_self_checks() -> SelfCheckSummary {
    run_with(build)
}

fn run_with<F>(builder: F) -> SelfCheckSummary
where
    F: Fn(f64, &[SetpointGroup]) -> Payload,
{
    let ran_at = chrono::Utc::now().to_rfc3339();
    let cases = cases();
    let total = cases.len();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        cases
            .iter()
            .filter(|case| builder(case.system_id, &case.groups) != case.expected)
            .map(|case| case.name.to_string())
            .collect::<Vec<_>>()
    }));

    match outcome {
        Ok(failures) => {
            let failed = failures.len();
            SelfCheckSummary {
                status: if failed == 0 {
                    SelfCheckStatus::Passed
                } else {
                    SelfCheckStatus::Failed
                },
                passed: total - failed,
                failed,
                total,
                failures,
                ran_at,
            }
        }
        Err(_) => SelfCheckSummary {
            status: SelfCheckStatus::Crashed,
            passed: 0,
            failed: 0,
            total,
            failures: Vec::new(),
            ran_at,
        },
    }
}

/// Holds the most recent self-check result
#[derive(Clone)]
pub struct SelfCheckService {
    last: Arc<RwLock<SelfCheckSummary>>,
}

impl SelfCheckService {
    /// Runs the checks once immediately
    pub fn new() -> Self {
        let summary = run_self_checks();
        log_summary(&summary);
        Self {
            last: Arc::new(RwLock::new(summary)),
        }
    }

    pub fn last(&self) -> SelfCheckSummary {
        match self.last.read() {
            Ok(summary) => summary.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn rerun(&self) -> SelfCheckSummary {
        let summary = run_self_checks();
        log_summary(&summary);
        match self.last.write() {
            Ok(mut last) => *last = summary.clone(),
            Err(poisoned) => *poisoned.into_inner() = summary.clone(),
        }
        summary
    }
}

fn log_summary(summary: &SelfCheckSummary) {
    match summary.status {
        SelfCheckStatus::Passed => tracing::info!(
            "Self-check passed: {}/{} cases",
            summary.passed,
            summary.total
        ),
        SelfCheckStatus::Failed => tracing::warn!(
            "Self-check failed: {}/{} cases passed, failing: {:?}",
            summary.passed,
            summary.total,
            summary.failures
        ),
        SelfCheckStatus::Crashed => tracing::error!("Self-check crashed before completing"),
    }
}

//! Ledger of per-instance outcomes for one command invocation

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;

const SUCCESSFUL: &str = "successful";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ResultKey {
    org: String,
    space: String,
    name: String,
    offering: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult {
    pub org_name: String,
    pub space_name: String,
    pub service_name: String,
    pub service_offering_name: String,
    pub message: String,
}

/// Results are keyed by (org, space, name, offering); writing the same key
/// again replaces the earlier row and moves its count.
///
/// Each counter has its own lock, separate from the results map.
#[derive(Debug, Default)]
pub struct Summary {
    results: Mutex<HashMap<ResultKey, (Outcome, String)>>,
    successes: Mutex<usize>,
    skipped: Mutex<usize>,
    failures: Mutex<usize>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_successful_service(&self, org: &str, space: &str, name: &str, offering: &str) {
        self.add(org, space, name, offering, Outcome::Success, SUCCESSFUL.to_string());
    }

    pub fn add_skipped_service(
        &self,
        org: &str,
        space: &str,
        name: &str,
        offering: &str,
        reason: impl Display,
    ) {
        self.add(
            org,
            space,
            name,
            offering,
            Outcome::Skipped,
            format!("skipped: {reason}"),
        );
    }

    pub fn add_failed_service(
        &self,
        org: &str,
        space: &str,
        name: &str,
        offering: &str,
        err: impl Display,
    ) {
        self.add(org, space, name, offering, Outcome::Failed, err.to_string());
    }

    pub fn success_count(&self) -> usize {
        *self.successes.lock()
    }

    pub fn skipped_count(&self) -> usize {
        *self.skipped.lock()
    }

    pub fn failure_count(&self) -> usize {
        *self.failures.lock()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Snapshot sorted by org, space and service name
    pub fn results(&self) -> Vec<ServiceResult> {
        self.snapshot().into_iter().map(|(result, _)| result).collect()
    }

    /// Aligned table plus the aggregate line; empty when nothing was recorded.
    /// The totals are counted from the same snapshot as the rows.
    pub fn display(&self) -> String {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return String::new();
        }

        let mut totals = [0usize; 3];
        for (_, outcome) in &snapshot {
            totals[*outcome as usize] += 1;
        }
        let results = snapshot.into_iter().map(|(result, _)| result);

        let mut rows = vec![[
            "Org".to_string(),
            "Space".to_string(),
            "Name".to_string(),
            "Service".to_string(),
            "Result".to_string(),
        ]];
        rows.extend(results.map(|r| {
            [
                r.org_name,
                r.space_name,
                r.service_name,
                r.service_offering_name,
                r.message,
            ]
        }));

        let mut widths = [0usize; 5];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in &rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i + 1 == row.len() {
                    line.push_str(cell);
                } else {
                    line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&format!(
            "{} successes, {} skipped, {} errors.\n",
            totals[Outcome::Success as usize],
            totals[Outcome::Skipped as usize],
            totals[Outcome::Failed as usize]
        ));
        out
    }

    fn snapshot(&self) -> Vec<(ServiceResult, Outcome)> {
        let mut entries: Vec<(ResultKey, Outcome, String)> = self
            .results
            .lock()
            .iter()
            .map(|(key, (outcome, message))| (key.clone(), *outcome, message.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        entries
            .into_iter()
            .map(|(key, outcome, message)| {
                let result = ServiceResult {
                    org_name: key.org,
                    space_name: key.space,
                    service_name: key.name,
                    service_offering_name: key.offering,
                    message,
                };
                (result, outcome)
            })
            .collect()
    }

    fn add(&self, org: &str, space: &str, name: &str, offering: &str, outcome: Outcome, message: String) {
        if name.is_empty() {
            return;
        }

        let key = ResultKey {
            org: org.to_string(),
            space: space.to_string(),
            name: name.to_string(),
            offering: offering.to_string(),
        };
        // counters are adjusted while the results lock is held
        let mut results = self.results.lock();
        if let Some((old, _)) = results.insert(key, (outcome, message)) {
            *self.counter(old).lock() -= 1;
        }
        *self.counter(outcome).lock() += 1;
    }

    fn counter(&self, outcome: Outcome) -> &Mutex<usize> {
        match outcome {
            Outcome::Success => &self.successes,
            Outcome::Skipped => &self.skipped,
            Outcome::Failed => &self.failures,
        }
    }
}

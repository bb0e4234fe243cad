pub mod fitness;
pub mod mutation;

pub use mutation::MutationGenerator;

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::SondoError;
use crate::llm::parse::extract_object;
use crate::llm::{ChatOptions, Embedder, TextGenerator};
use crate::models::{Job, TargetItem};
use crate::prompts;
use crate::utils::preview;

const GENERATION_SYSTEM: &str = "You are a senior IoT fuzzing expert. Strictly follow the specifications in prompt/target_choosing.md for output formatting.";
const PREREQUISITES_SYSTEM: &str = "You are a senior IoT fuzzing expert. Strictly follow the specifications in prompt/prerequisites.md for output formatting.";

fn default_max_rounds() -> usize {
    3
}

fn default_fitness_threshold() -> f64 {
    0.6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Upper bound on generation rounds per job.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Minimum fitness for a candidate to count as matching a clue.
    #[serde(default = "default_fitness_threshold")]
    pub fitness_threshold: f64,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            fitness_threshold: default_fitness_threshold(),
        }
    }
}

/// Clue bookkeeping carried between rounds. The current set drives the round,
/// the used set only grows and is what mutation must avoid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub current_clues: Vec<String>,
    pub used_clues: Vec<String>,
}

impl RoundState {
    pub fn seed(clues: Vec<String>) -> Self {
        Self {
            current_clues: clues,
            used_clues: Vec::new(),
        }
    }

    /// Fold the current clues into the used set, keeping first-seen order.
    pub fn absorb(mut self) -> Self {
        for clue in &self.current_clues {
            if !self.used_clues.contains(clue) {
                self.used_clues.push(clue.clone());
            }
        }
        self
    }

    /// Swap in replacement clues for the next round. An empty replacement
    /// keeps the current set, so a failed mutation costs nothing.
    pub fn advance(self, fresh: Vec<String>) -> Self {
        if fresh.is_empty() {
            self
        } else {
            Self {
                current_clues: fresh,
                used_clues: self.used_clues,
            }
        }
    }
}

/// How a job's synthesis ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    /// Some candidate matched a clue; items carry fetched prerequisites.
    Converged(Vec<TargetItem>),
    /// No round matched; the final round's raw candidates, no prerequisites.
    Exhausted(Vec<TargetItem>),
}

impl SynthesisOutcome {
    pub fn items(&self) -> &[TargetItem] {
        match self {
            Self::Converged(items) | Self::Exhausted(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<TargetItem> {
        match self {
            Self::Converged(items) | Self::Exhausted(items) => items,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }
}

/// Drives the generate / score / mutate rounds for one job and fetches
/// prerequisites for the round that converges.
pub struct SynthesisLoop {
    llm: Arc<dyn TextGenerator>,
    embedder: Option<Arc<dyn Embedder>>,
    mutation: MutationGenerator,
    prerequisites_template: String,
    settings: SynthesisSettings,
}

impl SynthesisLoop {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        embedder: Option<Arc<dyn Embedder>>,
        prerequisites_template: String,
        settings: SynthesisSettings,
    ) -> Self {
        let mutation = MutationGenerator::new(llm.clone());
        Self {
            llm,
            embedder,
            mutation,
            prerequisites_template,
            settings,
        }
    }

    /// Run the rounds for one classified job, seeded with the registry's
    /// clues for its category. Makes at most `max_rounds` generation calls.
    pub async fn run(&self, job: &Job, clues: Vec<String>) -> SynthesisOutcome {
        let mut state = RoundState::seed(clues);
        let mut last_items: Vec<TargetItem> = Vec::new();

        for round in 1..=self.settings.max_rounds {
            state = state.absorb();
            info!(
                round,
                total = self.settings.max_rounds,
                clues = ?state.current_clues,
                "payload generation round"
            );

            let prompt = prompts::fill_generation(
                &job.template_prompt,
                &state.current_clues,
                job.operation_type_str(),
                job.function_category_str(),
            );
            let items = self.generate_candidates(&prompt).await;
            debug!("parsed {} candidate target parameters", items.len());

            if self.round_matches(&items, &state.current_clues).await {
                let mut items = items;
                self.fetch_prerequisites(job, &prompt, &mut items).await;
                return SynthesisOutcome::Converged(items);
            }
            info!(round, "no candidate matched the clue set");
            last_items = items;

            if round < self.settings.max_rounds {
                let fresh = self
                    .mutation
                    .propose(job.function_category_str(), &job.uri, &state.used_clues)
                    .await;
                if fresh.is_empty() {
                    debug!("mutation produced nothing, keeping current clues");
                }
                state = state.advance(fresh);
            }
        }
        SynthesisOutcome::Exhausted(last_items)
    }

    async fn generate_candidates(&self, prompt: &str) -> Vec<TargetItem> {
        let options = ChatOptions::with_temperature(0.1);
        let response = match self.llm.complete(prompt, Some(GENERATION_SYSTEM), &options).await {
            Ok(response) => response,
            Err(e) => {
                warn!("payload generation call failed: {}", e);
                return Vec::new();
            }
        };
        debug!("generation response: {}", preview(&response.content));
        match extract_object(&response.content) {
            Some(value) => TargetItem::batch_from_value(&value),
            None => {
                warn!("generation response carried no JSON object, round yields nothing");
                Vec::new()
            }
        }
    }

    /// A round matches when any candidate reaches the threshold against any
    /// current clue. Every candidate is scored so the log shows them all.
    async fn round_matches(&self, items: &[TargetItem], clues: &[String]) -> bool {
        let embedder = self.embedder.as_deref();
        let mut matched_any = false;
        for item in items {
            if item.target.is_empty() {
                continue;
            }
            let mut matched = false;
            for clue in clues {
                let score = fitness::score(clue, &item.target, embedder).await;
                if score >= self.settings.fitness_threshold {
                    info!(clue, target = %item.target, score, "candidate matched clue");
                    matched = true;
                    matched_any = true;
                    break;
                }
            }
            if !matched {
                debug!(target = %item.target, "candidate matched no clue");
            }
        }
        matched_any
    }

    /// Fetch prerequisite and companion groups for every accepted candidate.
    /// A failure for one target leaves that item with empty groups and does
    /// not disturb the others.
    async fn fetch_prerequisites(&self, job: &Job, filled_prompt: &str, items: &mut [TargetItem]) {
        let data_packet = if job.baseline_packet.is_empty() {
            extract_data_packet(filled_prompt)
        } else {
            job.baseline_packet.clone()
        };
        for item in items.iter_mut() {
            if item.target.is_empty() {
                continue;
            }
            match self
                .prerequisites_for(&data_packet, &item.target, &job.frontend_context)
                .await
            {
                Ok((prerequisites, other_params)) => {
                    debug!(target = %item.target, ?prerequisites, ?other_params, "prerequisites acquired");
                    item.prerequisites = prerequisites;
                    item.other_params = other_params;
                }
                Err(e) => {
                    warn!(target = %item.target, "prerequisite fetch failed: {}", e);
                    item.prerequisites = Vec::new();
                    item.other_params = Vec::new();
                }
            }
        }
    }

    async fn prerequisites_for(
        &self,
        data_packet: &str,
        target: &str,
        frontend: &str,
    ) -> Result<(Vec<Vec<String>>, Vec<Vec<String>>), SondoError> {
        let prompt =
            prompts::fill_prerequisites(&self.prerequisites_template, data_packet, target, frontend);
        let options = ChatOptions::with_temperature(0.1);
        let response = self
            .llm
            .complete(&prompt, Some(PREREQUISITES_SYSTEM), &options)
            .await?;
        let value = extract_object(&response.content).ok_or_else(|| {
            SondoError::LLMApi(format!(
                "prerequisite response for {} carried no JSON object",
                target
            ))
        })?;
        Ok((
            string_groups(value.get("prerequisites")),
            string_groups(value.get("other_param")),
        ))
    }
}

/// Decode a JSON value as groups of strings, dropping anything else.
fn string_groups(value: Option<&Value>) -> Vec<Vec<String>> {
    let Some(groups) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(Value::as_array)
        .map(|group| {
            group
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Recover the data packet from an already filled generation prompt, for
/// inputs that arrived without one.
fn extract_data_packet(prompt: &str) -> String {
    let bold = Regex::new(r"(?i)\*\*DATA Packet\*\*[:\s]*`([^`]+)`").unwrap();
    if let Some(captures) = bold.captures(prompt) {
        return captures[1].to_string();
    }
    let plain = Regex::new(r"(?i)DATA Packet[:\s]*`([^`]+)`").unwrap();
    if let Some(captures) = plain.captures(prompt) {
        return captures[1].to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_state_absorb_dedups() {
        let state = RoundState::seed(vec!["ssid".into(), "channel".into()]);
        let state = state.absorb();
        assert_eq!(state.used_clues, vec!["ssid", "channel"]);
        let state = state.advance(vec!["ssid".into(), "pwd".into()]).absorb();
        assert_eq!(state.used_clues, vec!["ssid", "channel", "pwd"]);
        assert_eq!(state.current_clues, vec!["ssid", "pwd"]);
    }

    #[test]
    fn test_round_state_empty_advance_keeps_clues() {
        let state = RoundState::seed(vec!["ssid".into()]).absorb();
        let state = state.advance(Vec::new());
        assert_eq!(state.current_clues, vec!["ssid"]);
    }

    #[test]
    fn test_extract_data_packet_bold_form() {
        let prompt = "Intro\n- **DATA Packet**: `a=1&b=2`\nRest";
        assert_eq!(extract_data_packet(prompt), "a=1&b=2");
    }

    #[test]
    fn test_extract_data_packet_plain_form() {
        let prompt = "data packet: `x=9`";
        assert_eq!(extract_data_packet(prompt), "x=9");
    }

    #[test]
    fn test_extract_data_packet_absent() {
        assert_eq!(extract_data_packet("nothing here"), "");
    }

    #[test]
    fn test_string_groups_skips_malformed() {
        let value = serde_json::json!([
            ["a=1", "a=2"],
            "not a group",
            [1, "b=2"],
        ]);
        let groups = string_groups(Some(&value));
        assert_eq!(groups, vec![vec!["a=1".to_string(), "a=2".to_string()], vec!["b=2".to_string()]]);
        assert!(string_groups(None).is_empty());
        assert!(string_groups(Some(&serde_json::json!("flat"))).is_empty());
    }
}

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::parse::strict_string_list;
use crate::llm::{ChatOptions, TextGenerator};
use crate::prompts::render_clue_list;

const SYSTEM_MESSAGE: &str = "You are an IoT fuzz testing expert, specializing in analyzing configuration parameters of network devices. You excel at identifying the most core and critical configuration parameter names.";

const MAX_NEW_CLUES: usize = 5;

/// Asks the model for a fresh clue parameter when the current clue set failed
/// to match any generated candidate.
pub struct MutationGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl MutationGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Propose replacement clues for the next round. The model is asked for
    /// exactly one, told which clues are spent, and its answer is only
    /// accepted as a literal JSON list of strings. Anything else, and any
    /// transport failure, yields an empty list so the caller keeps its
    /// current clues.
    pub async fn propose(&self, function_category: &str, uri: &str, used_clues: &[String]) -> Vec<String> {
        let prompt = mutation_prompt(function_category, uri, used_clues);
        let options = ChatOptions {
            temperature: 0.3,
            top_p: Some(0.8),
            max_tokens: Some(100),
        };
        let response = match self.llm.complete(&prompt, Some(SYSTEM_MESSAGE), &options).await {
            Ok(response) => response,
            Err(e) => {
                warn!("clue mutation call failed: {}", e);
                return Vec::new();
            }
        };

        let flat = response.content.trim().replace('\n', "");
        let parsed = strict_string_list(&flat);
        if parsed.is_empty() {
            debug!("mutation response was not a literal string list: {}", crate::utils::preview(&response.content));
            return Vec::new();
        }

        let fresh: Vec<String> = parsed
            .into_iter()
            .filter(|clue| !used_clues.contains(clue))
            .take(MAX_NEW_CLUES)
            .collect();
        debug!("mutation produced {} fresh clues", fresh.len());
        fresh
    }
}

fn mutation_prompt(function_category: &str, uri: &str, used_clues: &[String]) -> String {
    format!(
        r#"Please analyze the {uri} based on its functional category {category}. Identify the most essential and critical configuration parameter required for this type of functionality, and generate its likely parameter name.

## CRITICAL Requirements:

1. **Quantity**: Only one clue field should be returned.

2. **Core Configuration Focus**: Only consider the most essential and critical configuration-related clue within the function "{category}".

3. **Duplication Avoidance**: Ensure the generated clue is not in the already used list.

## Clues Already Used (MUST EXCLUDE):
{used}

## Output Format:
Return ONLY a JSON list with EXACTLY 1 item, named clue1. Do NOT include any explanation or extra text:
["clue1"]
"#,
        uri = uri,
        category = function_category,
        used = render_clue_list(used_clues),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::errors::SondoError;
    use crate::llm::LLMResponse;

    struct ScriptedGenerator {
        reply: Result<String, SondoError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(SondoError::Network("connection refused".into())),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(
            &self,
            prompt: &str,
            _system: Option<&str>,
            _options: &ChatOptions,
        ) -> Result<LLMResponse, SondoError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(content) => Ok(LLMResponse {
                    content: content.clone(),
                    input_tokens: None,
                    output_tokens: None,
                    model: "scripted".to_string(),
                }),
                Err(e) => Err(SondoError::Network(e.to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn used(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_literal_list_accepted() {
        let llm = ScriptedGenerator::replying(r#"["ntpServer"]"#);
        let gen = MutationGenerator::new(llm);
        let clues = gen.propose("time.ntp_set", "goform/SetSysTime", &[]).await;
        assert_eq!(clues, vec!["ntpServer"]);
    }

    #[tokio::test]
    async fn test_used_clues_never_returned() {
        let llm = ScriptedGenerator::replying(r#"["ssid", "channel", "ssid"]"#);
        let gen = MutationGenerator::new(llm);
        let clues = gen.propose("wifi.ssid_set", "goform/WifiBasicSet", &used(&["ssid"])).await;
        assert_eq!(clues, vec!["channel"]);
    }

    #[tokio::test]
    async fn test_capped_at_five() {
        let llm = ScriptedGenerator::replying(r#"["a", "b", "c", "d", "e", "f", "g"]"#);
        let gen = MutationGenerator::new(llm);
        let clues = gen.propose("wifi.ssid_set", "u", &[]).await;
        assert_eq!(clues.len(), 5);
    }

    #[tokio::test]
    async fn test_prose_reply_rejected() {
        let llm = ScriptedGenerator::replying("Sure! A good clue would be: [\"ssid\"]");
        let gen = MutationGenerator::new(llm);
        assert!(gen.propose("wifi.ssid_set", "u", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_single_quoted_list_rejected() {
        let llm = ScriptedGenerator::replying("['ssid']");
        let gen = MutationGenerator::new(llm);
        assert!(gen.propose("wifi.ssid_set", "u", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_multiline_list_survives_flattening() {
        let llm = ScriptedGenerator::replying("[\n  \"ssid\"\n]");
        let gen = MutationGenerator::new(llm);
        assert_eq!(gen.propose("wifi.ssid_set", "u", &[]).await, vec!["ssid"]);
    }

    #[tokio::test]
    async fn test_transport_failure_is_empty() {
        let llm = ScriptedGenerator::failing();
        let gen = MutationGenerator::new(llm);
        assert!(gen.propose("wifi.ssid_set", "u", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_exclusions() {
        let llm = ScriptedGenerator::replying(r#"["x"]"#);
        let gen = MutationGenerator::new(llm.clone());
        gen.propose("dns.server_set", "goform/DnsSet", &used(&["dns1", "dns2"])).await;
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("dns.server_set"));
        assert!(prompts[0].contains("goform/DnsSet"));
        assert!(prompts[0].contains("['dns1', 'dns2']"));
    }
}

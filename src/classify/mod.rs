use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm::parse::extract_object;
use crate::llm::{ChatOptions, TextGenerator};
use crate::models::{Job, OperationType};
use crate::prompts::render_clue_list;
use crate::store::CategoryStore;
use crate::utils::preview;

/// Coarse functional taxonomy: category name and the registry prefix its
/// function categories carry.
pub const COARSE_CATEGORIES: &[(&str, &str)] = &[
    ("WiFiSettings", "wifi."),
    ("ParentControl", "parental_control."),
    ("VPN", "vpn."),
    ("USB", "usb."),
    ("Bandwidth", "bandwidth."),
    ("Power", "power."),
    ("Led", "led."),
    ("Filter", "filter."),
    ("Firewall", "firewall."),
    ("IPTV", "iptv."),
    ("Route", "route."),
    ("DNS", "dns."),
    ("DMZ", "dmz."),
    ("UPnP", "upnp."),
    ("WAN", "wan."),
    ("DHCP", "dhcp."),
    ("LAN", "lan."),
    ("Time", "time."),
    ("Login", "login."),
    ("RemoteControl", "remote_control."),
    ("Diagnostic", "diagnostic."),
    ("Log", "log."),
];

/// Registry prefix for a coarse category, empty for names outside the table.
pub fn coarse_prefix(name: &str) -> &'static str {
    COARSE_CATEGORIES
        .iter()
        .find(|(category, _)| *category == name)
        .map(|(_, prefix)| *prefix)
        .unwrap_or("")
}

fn category_names() -> Vec<String> {
    COARSE_CATEGORIES.iter().map(|(name, _)| name.to_string()).collect()
}

/// Two-step classifier: coarse category first, then the fine function
/// category and operation type against the registry's candidates.
pub struct Classifier {
    llm: Arc<dyn TextGenerator>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Enrich a job in place. Either step may fail without stopping the
    /// pipeline: a failed first step leaves the job unclassified, a failed
    /// second step keeps the coarse category alone. Newly accepted function
    /// categories are inserted into the registry.
    pub async fn classify(&self, store: &mut CategoryStore, job: &mut Job) {
        debug!(label = job.label(), "coarse classification");
        let Some(coarse) = self.coarse_step(job).await else {
            warn!(label = job.label(), "coarse classification failed, job stays unclassified");
            return;
        };
        let prefix = coarse_prefix(&coarse);
        job.coarse_category = Some(coarse.clone());

        let candidates = store.candidates_for_prefix(prefix);
        debug!(coarse, prefix, candidates = candidates.len(), "fine classification");
        let Some((function_category, operation_type)) =
            self.fine_step(job, &coarse, prefix, &candidates).await
        else {
            warn!(label = job.label(), "fine classification failed, keeping coarse category only");
            return;
        };

        if !function_category.is_empty() {
            if store.insert(&function_category, prefix) {
                info!(category = %function_category, "new function category added to registry");
            } else {
                debug!(category = %function_category, "function category already known");
            }
            job.function_category = Some(function_category);
        }
        job.operation_type = operation_type;
    }

    async fn coarse_step(&self, job: &Job) -> Option<String> {
        let names = category_names();
        let prompt = format!(
            r#"I will provide information from a network device's management interface. Your task is to classify this information into the most appropriate category.

### Input Data:
- UI Text/ID: {ui}
- Endpoint/URL Path: {uri}

### Classification Rules:
1. Select the most relevant category from this list: {categories}
2. Base your decision on the functionality implied by the UI information and URL.
3. If multiple categories seem relevant, choose the most specific one.

### Output Requirement:

Return ONLY a JSON object: {{"coarse_category": "category_name"}}
"#,
            ui = job.ui_label,
            uri = job.uri,
            categories = render_clue_list(&names),
        );

        let response = self.call(&prompt).await?;
        let value = extract_object(&response)?;
        value
            .get("coarse_category")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    async fn fine_step(
        &self,
        job: &Job,
        coarse: &str,
        prefix: &str,
        candidates: &[String],
    ) -> Option<(String, Option<OperationType>)> {
        let candidate_list =
            serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string());
        let prompt = format!(
            r#"You are analyzing IoT device functionality to determine the specific function category and operation type.

**INPUT INFORMATION:**
1. UI Information: {ui}
2. URI Path: {uri}
3. Frontend code: {frontend}
4. Candidate Functions (from database): {candidates}
5. Coarse Category: {coarse} (prefix: {prefix})

**TASK:**
Using the input information above, you need to:
1. Select the most appropriate `function_category` from the candidate functions list. Only when **no candidate is semantically relevant at all** may you create a new one, following the format `{prefix}<function_name>` with `<action>_<target>` naming.
2. Determine the `operation_type` based on how the function operates.

**OPERATION TYPE DEFINITIONS:**
- **set**: Parameters that configure system settings when the function is executed. These parameters generally do not get passed to command execution functions. (e.g., password changes)
- **get**: Function retrieves system information without modifying state (e.g., device status, configuration reading)
- **exec**: Parameters are likely to be passed to functions such as doSystemCmd or system. These typically include items like ping destinations, command arguments.

Note: There can be overlaps between exec and set. For example, some key parameters (such as name-type fields) may appear in both configuration and command execution contexts. In such cases, you can return "set&exec".

**OUTPUT REQUIREMENTS AND FORMAT:**
{{
    "function_category": "MUST be selected from candidates if any match exists. Only generate new if NO candidate matches.",
    "operation_type": "set|get|exec|set&exec"
}}
"#,
            ui = job.ui_label,
            uri = job.uri,
            frontend = job.frontend_context,
            candidates = candidate_list,
            coarse = coarse,
            prefix = prefix,
        );

        let response = self.call(&prompt).await?;
        let value = extract_object(&response)?;
        let function_category = value
            .get("function_category")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let operation_type = value
            .get("operation_type")
            .and_then(|v| v.as_str())
            .and_then(OperationType::parse);
        Some((function_category, operation_type))
    }

    async fn call(&self, prompt: &str) -> Option<String> {
        let options = ChatOptions {
            temperature: 0.0,
            top_p: None,
            max_tokens: Some(1024),
        };
        match self.llm.complete(prompt, None, &options).await {
            Ok(response) => {
                debug!("classification response: {}", preview(&response.content));
                Some(response.content)
            }
            Err(e) => {
                warn!("classification call failed: {}", e);
                None
            }
        }
    }
}

/// Compact per-job result line shown even in quiet runs.
pub fn summary_line(job: &Job) -> String {
    format!(
        "URL Path：{}，{{\"coarse_category\": \"{}\", \"function_category\": \"{}\"}}",
        job.uri,
        job.coarse_category.as_deref().unwrap_or(""),
        job.function_category.as_deref().unwrap_or(""),
    )
}

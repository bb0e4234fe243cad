use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::SondoError;

pub const TARGET_TEMPLATE: &str = "target_choosing.md";
pub const PREREQUISITES_TEMPLATE: &str = "prerequisites.md";

/// Loads the generation, prerequisite and proof-of-concept templates from the
/// workspace `prompt/` directory.
pub struct PromptLibrary {
    prompts_dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(workspace: &Path) -> Self {
        let prompts_dir = workspace.join("prompt");
        debug!(dir = %prompts_dir.display(), "prompt library initialized");
        Self { prompts_dir }
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Per-round payload generation template.
    pub fn target_template(&self) -> Result<String, SondoError> {
        self.read(Path::new(TARGET_TEMPLATE))
    }

    /// Per-target prerequisite fetch template.
    pub fn prerequisites_template(&self) -> Result<String, SondoError> {
        self.read(Path::new(PREREQUISITES_TEMPLATE))
    }

    /// Vendor-specific proof-of-concept script template, `poc/<vendor>.py`.
    pub fn poc_template(&self, vendor: &str) -> Result<String, SondoError> {
        let rel = Path::new("poc").join(format!("{}.py", vendor));
        self.read(&rel)
    }

    fn read(&self, rel: &Path) -> Result<String, SondoError> {
        let file_path = self.prompts_dir.join(rel);
        if !file_path.exists() {
            return Err(SondoError::Prompt(format!(
                "Prompt template not found: {}",
                file_path.display()
            )));
        }
        std::fs::read_to_string(&file_path).map_err(|e| {
            SondoError::Prompt(format!(
                "Failed to read prompt template {}: {}",
                file_path.display(),
                e
            ))
        })
    }
}

/// Render clues the way the templates expect them, as a quoted literal list:
/// `['ssid', 'wrlPwd']`, `[]` when empty.
pub fn render_clue_list(clues: &[String]) -> String {
    if clues.is_empty() {
        return "[]".to_string();
    }
    let quoted: Vec<String> = clues.iter().map(|c| format!("'{}'", c)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Fill the scan-time slots of the generation template. The frontend-context
/// slot is cleared here; that context feeds classification and prerequisite
/// fetching instead.
pub fn fill_target(template: &str, data_packet: &str) -> String {
    template
        .replace("{DATA_PACKET}", data_packet)
        .replace("{PREREQUISITES}", "")
}

/// Fill the per-round slots of a job's generation prompt.
pub fn fill_generation(
    template_prompt: &str,
    clues: &[String],
    operation_type: &str,
    function_category: &str,
) -> String {
    template_prompt
        .replace("{cues}", &render_clue_list(clues))
        .replace("{operation_type}", operation_type)
        .replace("{function_category}", function_category)
}

/// Fill the prerequisite template for one target parameter.
pub fn fill_prerequisites(template: &str, data_packet: &str, target: &str, frontend: &str) -> String {
    template
        .replace("{DATA_PACKET}", data_packet)
        .replace("{TARGET}", target)
        .replace("{PREREQUISITES}", frontend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup_test_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let prompt_dir = dir.path().join("prompt");
        fs::create_dir_all(prompt_dir.join("poc")).unwrap();
        fs::write(
            prompt_dir.join(TARGET_TEMPLATE),
            "Packet: `{DATA_PACKET}`\nClues: {cues}\nOp: {operation_type} Cat: {function_category}\nContext: {PREREQUISITES}",
        )
        .unwrap();
        fs::write(
            prompt_dir.join(PREREQUISITES_TEMPLATE),
            "Packet: {DATA_PACKET}\nTarget: {TARGET}\nContext: {PREREQUISITES}",
        )
        .unwrap();
        fs::write(prompt_dir.join("poc/Tenda.py"), "send('{URI}', 'payload')\n").unwrap();
        dir
    }

    #[test]
    fn test_load_templates() {
        let dir = setup_test_dir();
        let library = PromptLibrary::new(dir.path());
        assert!(library.target_template().unwrap().contains("{DATA_PACKET}"));
        assert!(library.prerequisites_template().unwrap().contains("{TARGET}"));
        assert!(library.poc_template("Tenda").unwrap().contains("payload"));
    }

    #[test]
    fn test_missing_template_is_prompt_error() {
        let dir = setup_test_dir();
        let library = PromptLibrary::new(dir.path());
        let err = library.poc_template("NoSuchVendor").unwrap_err();
        assert!(matches!(err, SondoError::Prompt(_)));
    }

    #[test]
    fn test_render_clue_list() {
        assert_eq!(render_clue_list(&[]), "[]");
        assert_eq!(render_clue_list(&["ssid".to_string()]), "['ssid']");
        assert_eq!(
            render_clue_list(&["ssid".to_string(), "wrlPwd".to_string()]),
            "['ssid', 'wrlPwd']"
        );
    }

    #[test]
    fn test_fill_target_clears_context_slot() {
        let filled = fill_target("P: {DATA_PACKET} C: {PREREQUISITES}", "a=1&b=2");
        assert_eq!(filled, "P: a=1&b=2 C: ");
    }

    #[test]
    fn test_fill_generation() {
        let template = "Clues: {cues} Op: {operation_type} Cat: {function_category}";
        let filled = fill_generation(template, &["ssid".to_string()], "set", "wifi.ssid_set");
        assert_eq!(filled, "Clues: ['ssid'] Op: set Cat: wifi.ssid_set");
    }

    #[test]
    fn test_fill_prerequisites() {
        let template = "{DATA_PACKET}|{TARGET}|{PREREQUISITES}";
        let filled = fill_prerequisites(template, "a=1", "ssid={overflow}", "<form>");
        assert_eq!(filled, "a=1|ssid={overflow}|<form>");
    }
}

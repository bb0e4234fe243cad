use serde::{Deserialize, Serialize};

/// What the input scanner yields for one discovered UI input artifact, before
/// classification has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSeed {
    pub uri: String,
    pub ui_label: String,
    pub baseline_packet: String,
    pub frontend_context: String,
}

/// How the function behind an endpoint treats its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Set,
    Get,
    Exec,
    #[serde(rename = "set&exec")]
    SetAndExec,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Get => "get",
            Self::Exec => "exec",
            Self::SetAndExec => "set&exec",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "set" => Some(Self::Set),
            "get" => Some(Self::Get),
            "exec" => Some(Self::Exec),
            "set&exec" => Some(Self::SetAndExec),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work, created from a `JobSeed` at scan time, enriched in place
/// by classification, consumed once by artifact writing. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub vendor: String,
    pub product: String,
    pub uri: String,
    pub ui_label: String,
    pub baseline_packet: String,
    pub frontend_context: String,
    pub coarse_category: Option<String>,
    pub function_category: Option<String>,
    pub operation_type: Option<OperationType>,
    /// Generation prompt with the data packet already filled in; the
    /// per-round placeholders stay for the synthesis loop.
    pub template_prompt: String,
}

impl Job {
    pub fn from_seed(seed: JobSeed, vendor: &str, product: &str, template_prompt: String) -> Self {
        Self {
            vendor: vendor.to_string(),
            product: product.to_string(),
            uri: seed.uri,
            ui_label: seed.ui_label,
            baseline_packet: seed.baseline_packet,
            frontend_context: seed.frontend_context,
            coarse_category: None,
            function_category: None,
            operation_type: None,
            template_prompt,
        }
    }

    /// Display label: the endpoint path when known, the UI label otherwise.
    /// Also the directory/file basename for this job's artifacts.
    pub fn label(&self) -> &str {
        if self.uri.is_empty() {
            &self.ui_label
        } else {
            &self.uri
        }
    }

    pub fn function_category_str(&self) -> &str {
        self.function_category.as_deref().unwrap_or("")
    }

    pub fn operation_type_str(&self) -> &str {
        self.operation_type.map(|op| op.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_roundtrip() {
        for s in ["set", "get", "exec", "set&exec"] {
            assert_eq!(OperationType::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(OperationType::parse(" Set "), Some(OperationType::Set));
        assert_eq!(OperationType::parse("delete"), None);
    }

    #[test]
    fn test_label_prefers_uri() {
        let seed = JobSeed {
            uri: "goform/WifiBasicSet".into(),
            ui_label: "Wireless".into(),
            baseline_packet: String::new(),
            frontend_context: String::new(),
        };
        let job = Job::from_seed(seed, "Tenda", "AC18", String::new());
        assert_eq!(job.label(), "goform/WifiBasicSet");

        let seed = JobSeed {
            uri: String::new(),
            ui_label: "Wireless".into(),
            baseline_packet: String::new(),
            frontend_context: String::new(),
        };
        let job = Job::from_seed(seed, "Tenda", "AC18", String::new());
        assert_eq!(job.label(), "Wireless");
    }
}

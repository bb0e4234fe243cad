use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload family a generated candidate belongs to. Anything the model labels
/// outside the known set is folded into command injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PayloadKind {
    #[default]
    Cmdi,
    Overflow,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cmdi => "cmdi",
            Self::Overflow => "overflow",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "overflow" => Self::Overflow,
            _ => Self::Cmdi,
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PayloadKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PayloadKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One candidate parameter the generation step proposed for a job, together
/// with everything later stages need to expand it into request bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetItem {
    /// `name=value` assignment carrying the payload.
    #[serde(default)]
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: PayloadKind,
    /// Alternative parameter groups that must be present for the target to
    /// take effect. Filled by the prerequisite step, empty until then.
    #[serde(default)]
    pub prerequisites: Vec<Vec<String>>,
    /// Alternative groups of companion parameters the model suggested
    /// alongside the target.
    #[serde(default, rename = "other_param", alias = "other_params")]
    pub other_params: Vec<Vec<String>>,
}

impl TargetItem {
    pub fn new(target: impl Into<String>, kind: PayloadKind) -> Self {
        Self {
            target: target.into(),
            kind,
            prerequisites: Vec::new(),
            other_params: Vec::new(),
        }
    }

    /// Parameter name on the left of the first `=`, or the whole string when
    /// there is none.
    pub fn param_name(&self) -> &str {
        match self.target.split_once('=') {
            Some((name, _)) => name,
            None => self.target.as_str(),
        }
    }

    /// Pull the `items` array out of a decoded generation response, dropping
    /// entries that do not fit the expected shape.
    pub fn batch_from_value(value: &Value) -> Vec<TargetItem> {
        let Some(items) = value.get("items").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }
}

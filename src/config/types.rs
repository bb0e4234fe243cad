use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::EngineSettings;
use crate::errors::SondoError;
use crate::synthesis::SynthesisSettings;

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("database.json")
}

/// Run configuration. Vendor and product may come from the file or from CLI
/// overrides; everything else has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SondoConfig {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product: String,
    /// Root holding `prompt/` and the per-vendor data directories.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    /// Category registry file, resolved from the working directory.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default)]
    pub synthesis: SynthesisSettings,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Default for SondoConfig {
    fn default() -> Self {
        Self {
            vendor: String::new(),
            product: String::new(),
            workspace: default_workspace(),
            store_path: default_store_path(),
            synthesis: SynthesisSettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl SondoConfig {
    /// Vendor/product data directory, `{workspace}/{vendor}/{product}`.
    pub fn base_dir(&self) -> PathBuf {
        self.workspace.join(&self.vendor).join(&self.product)
    }

    pub fn input_dir(&self) -> PathBuf {
        self.base_dir().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir().join("output")
    }

    /// Must hold before any subcommand runs.
    pub fn validate(&self) -> Result<(), SondoError> {
        if self.vendor.is_empty() {
            return Err(SondoError::Config(
                "No vendor configured (set `vendor` in the config file or pass --vendor)".into(),
            ));
        }
        if self.product.is_empty() {
            return Err(SondoError::Config(
                "No product configured (set `product` in the config file or pass --product)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_compose() {
        let config = SondoConfig {
            vendor: "Tenda".into(),
            product: "AC18".into(),
            workspace: PathBuf::from("/ws"),
            ..Default::default()
        };
        assert_eq!(config.base_dir(), PathBuf::from("/ws/Tenda/AC18"));
        assert_eq!(config.input_dir(), PathBuf::from("/ws/Tenda/AC18/input"));
        assert_eq!(config.output_dir(), PathBuf::from("/ws/Tenda/AC18/output"));
    }

    #[test]
    fn test_validate_requires_vendor_and_product() {
        let mut config = SondoConfig::default();
        assert!(config.validate().is_err());
        config.vendor = "Tenda".into();
        assert!(config.validate().is_err());
        config.product = "AC18".into();
        assert!(config.validate().is_ok());
    }
}

use std::path::Path;

use super::types::SondoConfig;
use crate::errors::SondoError;

pub async fn parse_config(path: &Path) -> Result<SondoConfig, SondoError> {
    if !path.exists() {
        return Err(SondoError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(SondoError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: SondoConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::SondoError;

/// Dedup key for an artifact: the filename stem minus its trailing sequence
/// number. Stems with fewer than three `_` parts are used whole.
pub fn derive_prefix(stem: &str) -> String {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() >= 3 {
        parts[..parts.len() - 1].join("_")
    } else {
        stem.to_string()
    }
}

/// Curated directory of artifacts that produced a success, plus the in-run
/// set of prefixes already covered. The prefix set starts empty each run;
/// only this run's registrations feed the dedup pre-check.
#[derive(Debug)]
pub struct SuccessSet {
    dir: PathBuf,
    prefixes: HashSet<String>,
}

impl SuccessSet {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SondoError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefixes: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Drop everything recorded by earlier runs.
    pub fn reset(&mut self) -> Result<(), SondoError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        self.prefixes.clear();
        info!("success directory cleared");
        Ok(())
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Copy a succeeding artifact in and mark its prefix covered.
    pub fn register(&mut self, artifact: &Path, prefix: &str) -> Result<(), SondoError> {
        let name = artifact
            .file_name()
            .ok_or_else(|| SondoError::Execution(format!("artifact has no filename: {}", artifact.display())))?;
        fs::copy(artifact, self.dir.join(name))?;
        self.prefixes.insert(prefix.to_string());
        debug!(prefix, "prefix marked successful, same-prefix artifacts will be skipped");
        Ok(())
    }

    /// Recorded artifacts in filename order.
    pub fn artifacts(&self) -> Result<Vec<PathBuf>, SondoError> {
        let pattern = format!("{}/*.py", self.dir.display());
        let mut paths: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| SondoError::Execution(format!("bad success glob {}: {}", pattern, e)))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_derive_prefix_strips_sequence() {
        assert_eq!(derive_prefix("AdvSetLanip_ssid_1"), "AdvSetLanip_ssid");
        assert_eq!(derive_prefix("Wifi_Basic_ssid_12"), "Wifi_Basic_ssid");
    }

    #[test]
    fn test_derive_prefix_short_stems_kept_whole() {
        assert_eq!(derive_prefix("standalone"), "standalone");
        assert_eq!(derive_prefix("two_parts"), "two_parts");
    }

    #[test]
    fn test_register_copies_and_marks() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("Lan_ip_1.py");
        fs::write(&artifact, "print('x')").unwrap();

        let mut set = SuccessSet::open(dir.path().join("success")).unwrap();
        assert!(!set.contains("Lan_ip"));
        set.register(&artifact, "Lan_ip").unwrap();
        assert!(set.contains("Lan_ip"));
        assert_eq!(set.artifacts().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_clears_files_and_prefixes() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("Lan_ip_1.py");
        fs::write(&artifact, "print('x')").unwrap();

        let mut set = SuccessSet::open(dir.path().join("success")).unwrap();
        set.register(&artifact, "Lan_ip").unwrap();
        set.reset().unwrap();
        assert!(!set.contains("Lan_ip"));
        assert!(set.artifacts().unwrap().is_empty());
    }

    #[test]
    fn test_artifacts_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let success = dir.path().join("success");
        fs::create_dir_all(&success).unwrap();
        fs::write(success.join("b_x_2.py"), "").unwrap();
        fs::write(success.join("a_x_1.py"), "").unwrap();
        fs::write(success.join("notes.txt"), "").unwrap();

        let set = SuccessSet::open(&success).unwrap();
        let artifacts = set.artifacts().unwrap();
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].ends_with("a_x_1.py"));
        assert!(artifacts[1].ends_with("b_x_2.py"));
    }
}

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::SondoError;

/// Index of the next artifact to run, persisted as a bare decimal integer so
/// an interrupted run resumes where it stopped. Read once at open; saves only
/// move forward.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    position: usize,
}

impl Checkpoint {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let position = match fs::read_to_string(&path) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(position) => position,
                Err(_) => {
                    warn!("checkpoint file {} is not a number, starting from 0", path.display());
                    0
                }
            },
            Err(_) => 0,
        };
        debug!(position, "checkpoint loaded");
        Self { path, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Record that every artifact before `next` is done. Going backwards is a
    /// no-op; the persisted value never decreases within a run.
    pub fn save(&mut self, next: usize) -> Result<(), SondoError> {
        if next <= self.position {
            return Ok(());
        }
        fs::write(&self.path, next.to_string())?;
        self.position = next;
        debug!(next, "checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_at_zero() {
        let dir = TempDir::new().unwrap();
        let cp = Checkpoint::open(dir.path().join("progress.txt"));
        assert_eq!(cp.position(), 0);
    }

    #[test]
    fn test_garbage_file_starts_at_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        fs::write(&path, "three\n").unwrap();
        assert_eq!(Checkpoint::open(&path).position(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut cp = Checkpoint::open(&path);
        cp.save(7).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "7");
        assert_eq!(Checkpoint::open(&path).position(), 7);
    }

    #[test]
    fn test_save_never_goes_backwards() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut cp = Checkpoint::open(&path);
        cp.save(5).unwrap();
        cp.save(3).unwrap();
        assert_eq!(cp.position(), 5);
        assert_eq!(fs::read_to_string(&path).unwrap(), "5");
    }

    #[test]
    fn test_whitespace_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        fs::write(&path, " 12 \n").unwrap();
        assert_eq!(Checkpoint::open(&path).position(), 12);
    }
}

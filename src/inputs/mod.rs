use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::SondoError;
use crate::models::JobSeed;

/// Scan a vendor/product input directory into job seeds, in filename order.
///
/// Filenames encode `uri&ui-label` in the stem; a stem without `&` is a bare
/// UI label. The file body holds the observed data packet and, after an
/// optional `---` separator, captured frontend context.
pub fn scan_inputs(input_dir: &Path) -> Result<Vec<JobSeed>, SondoError> {
    if !input_dir.is_dir() {
        return Err(SondoError::Input(format!(
            "Input directory not found: {}",
            input_dir.display()
        )));
    }

    let mut paths: Vec<_> = fs::read_dir(input_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut seeds = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (uri, ui_label) = match stem.split_once('&') {
            Some((uri, label)) => (uri.to_string(), label.to_string()),
            None => (String::new(), stem),
        };

        let content = fs::read_to_string(&path)?;
        let (baseline_packet, frontend_context) = match content.split_once("---") {
            Some((packet, context)) => (packet.trim().to_string(), context.trim().to_string()),
            None => (content.trim().to_string(), String::new()),
        };

        debug!(uri, ui_label, "input loaded from {}", path.display());
        seeds.push(JobSeed {
            uri,
            ui_label,
            baseline_packet,
            frontend_context,
        });
    }
    Ok(seeds)
}

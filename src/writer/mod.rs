use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::SondoError;
use crate::expand::expand;
use crate::models::{Job, TargetItem};

/// Wipe and recreate a vendor/product output root before a generation run.
pub fn clean_output_root(output_root: &Path) -> Result<(), SondoError> {
    if output_root.exists() {
        fs::remove_dir_all(output_root)?;
    }
    fs::create_dir_all(output_root)?;
    Ok(())
}

/// Substitute one expanded body into the proof-of-concept template. Every
/// literal `payload` token is replaced; `{URI}` becomes the slash-prefixed
/// endpoint path, bare `/` when the job has none.
fn render_poc(template: &str, body: &str, uri: &str) -> String {
    let rendered = template.replace("payload", body);
    if uri.is_empty() {
        rendered.replace("{URI}", "/")
    } else {
        rendered.replace("{URI}", &format!("/{}", uri))
    }
}

/// Expand a job's accepted items into proof-of-concept scripts under
/// `{output_root}/{kind}/{basename}/`, named `{basename}_{param}_{seq}.py`
/// with `seq` counting from 1 across the whole job. Items without a target
/// are skipped; a job that produced no items at all is an error the caller
/// may log and move past.
pub fn write_artifacts(
    job: &Job,
    items: &[TargetItem],
    poc_template: &str,
    output_root: &Path,
) -> Result<Vec<PathBuf>, SondoError> {
    if items.is_empty() {
        return Err(SondoError::Output(format!(
            "no candidate items to write for {}",
            job.label()
        )));
    }

    let basename = job.label();
    let mut written = Vec::new();
    let mut seq: u32 = 1;

    for item in items {
        if item.target.is_empty() {
            continue;
        }
        let bodies = expand(
            &item.target,
            &item.prerequisites,
            &item.other_params,
            &job.baseline_packet,
        );
        debug!(
            target = %item.target,
            kind = %item.kind,
            combinations = bodies.len(),
            "expanding target into artifacts"
        );

        let dir = output_root.join(item.kind.as_str()).join(basename);
        fs::create_dir_all(&dir)?;

        let param = item.param_name();
        for body in &bodies {
            let filename = format!("{}_{}_{}.py", basename, param, seq);
            let path = dir.join(filename);
            fs::write(&path, render_poc(poc_template, body, &job.uri))?;
            debug!("wrote {}", path.display());
            written.push(path);
            seq += 1;
        }
    }

    info!(count = written.len(), label = basename, "artifacts written");
    Ok(written)
}

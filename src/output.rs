use anyhow::{Context, Result};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::client::ApiClient;
use crate::fields;

/// Results land under `output/` next to where the command is run.
pub const OUTPUT_DIR: &str = "output";

pub fn result_path(output_dir: &Path, job_id: &str) -> PathBuf {
    output_dir.join(format!("{}.json", job_id))
}

/// Artifact indices are 1-based in the on-disk scheme.
pub fn artifact_path(output_dir: &Path, job_id: &str, index: usize, ext: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.{}", job_id, index, ext))
}

/// Writes the terminal job document verbatim to `<output_dir>/<job_id>.json`.
/// Repeated calls for the same job overwrite the same file.
pub fn save_result(output_dir: &Path, job_id: &str, body: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = result_path(output_dir, job_id);
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// The `audio_paths` array of a job document, in order.
pub fn artifact_paths(body: &str) -> Vec<String> {
    let doc: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    fields::strings_at(&doc, "audio_paths")
}

/// Downloads every artifact referenced by the job document. A failed
/// download is reported and skipped; the rest still go through. Returns
/// how many files were saved.
pub async fn download_artifacts(
    client: &ApiClient,
    output_dir: &Path,
    job_id: &str,
    body: &str,
    ext: &str,
) -> Result<usize> {
    let paths = artifact_paths(body);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let mut saved = 0;
    for (index, remote) in paths.iter().filter(|p| !p.is_empty()).enumerate() {
        let local = artifact_path(output_dir, job_id, index + 1, ext);
        match client.fetch_bytes(remote).await {
            Ok(bytes) => {
                std::fs::write(&local, bytes)
                    .with_context(|| format!("Failed to write {}", local.display()))?;
                println!("{} Saved {}", "✓".green(), local.display());
                saved += 1;
            }
            Err(e) => {
                println!("{} Skipping {}: {}", "⚠".yellow(), remote, e);
            }
        }
    }

    Ok(saved)
}

//! Output file naming.

use std::path::{Path, PathBuf};

use crate::types::{Configuration, Job, OutputFormat};

/// File name for the output of the `sequence`-th image.
///
/// Without a pattern (or with an empty one) the source's base name is kept.
/// With one, `{num}` is
/// replaced by the zero-padded sequence (at least three digits) and
/// `{orig}` by the source's base name. The extension always follows the
/// output format.
pub fn output_name(
    source: &Path,
    sequence: usize,
    pattern: Option<&str>,
    format: OutputFormat,
) -> String {
    let base = base_name(source);
    let stem = match pattern {
        Some(pattern) if !pattern.is_empty() => pattern
            .replace("{num}", &format!("{sequence:03}"))
            .replace("{orig}", &base),
        _ => base,
    };
    format!("{}.{}", stem, format.extension())
}

/// Full output path for a job under `output_dir`.
pub fn output_path(output_dir: &Path, job: &Job, config: &Configuration) -> PathBuf {
    output_dir.join(output_name(
        &job.source,
        job.sequence,
        config.rename.as_deref(),
        config.output_format,
    ))
}

/// File name without its last extension.
fn base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/*!
 * Versioned output paths under the project's review directory
 *
 * Names follow `<YYYY-MM-DD>_<HH><MM><AM|PM>_<project>_v<NN>.<ext>`. The
 * version is one more than the highest version found for the same day and
 * project, and the path is reserved with an exclusive create so concurrent
 * runs never share a version.
 */

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;
use tokio::fs::{self, OpenOptions};
use tracing::debug;

use crate::error::Result;
use crate::utils::OUTPUT_DIR_NAME;

/// Reservation attempts before giving up on a crowded directory
const MAX_RESERVE_ATTEMPTS: u32 = 1000;

/// Date prefix, e.g. `2024-01-01`
pub fn date_prefix(now: &NaiveDateTime) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// File timestamp, e.g. `2024-01-01_0305PM`
pub fn file_timestamp(now: &NaiveDateTime) -> String {
    now.format("%Y-%m-%d_%I%M%p").to_string()
}

/// Directory receiving documents and logs for `base_dir`
pub fn output_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(OUTPUT_DIR_NAME)
}

/// Highest version among `names` for the given day, project and extension
pub fn max_version<'a, I>(
    names: I,
    date_prefix: &str,
    project_name: &str,
    extension: &str,
) -> Result<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = Regex::new(&format!(r"_v(\d+)\.{}$", regex::escape(extension)))?;

    Ok(names
        .into_iter()
        .filter(|name| name.starts_with(date_prefix) && name.contains(project_name))
        .filter_map(|name| pattern.captures(name))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0))
}

/// Compute and reserve the next free output path.
///
/// Creates `<base_dir>/codereview` (and missing ancestors) first. The
/// returned file exists and is empty.
pub async fn next_output_path(
    base_dir: &Path,
    project_name: &str,
    now: &NaiveDateTime,
    extension: &str,
) -> Result<PathBuf> {
    let dir = output_dir(base_dir);
    fs::create_dir_all(&dir).await?;

    let mut names = Vec::new();
    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    let prefix = date_prefix(now);
    let timestamp = file_timestamp(now);
    let start = max_version(
        names.iter().map(String::as_str),
        &prefix,
        project_name,
        extension,
    )?
    .saturating_add(1);
    // An exhausted version range falls through to the error below
    let end = start.saturating_add(MAX_RESERVE_ATTEMPTS);

    for version in start..end {
        let candidate = dir.join(format!(
            "{}_{}_v{:02}.{}",
            timestamp, project_name, version, extension
        ));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => {
                debug!(path = %candidate.display(), "Reserved output path");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "Output path taken, trying next version");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("No free output version in {}", dir.display()),
    )
    .into())
}

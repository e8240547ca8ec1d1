use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn data_dir_path(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("aniview"))
}

pub fn store_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("aniview.db")
}

/// The two dataset snapshots: the seasonal list (a plain JSON array) and
/// the "other anime" document (an object with an `other_anime` array).
pub fn dataset_file_paths(data_dir: &Path) -> (PathBuf, PathBuf) {
    (
        data_dir.join("anime_data.json"),
        data_dir.join("other_anime_sorted.json"),
    )
}

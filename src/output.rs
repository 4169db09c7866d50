use crate::error::{DalleError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const IMAGE_EXTENSION: &str = "png";

/// Creates `<root>/<uuid>` for one run. The directory is never removed by us.
pub fn create_run_dir(root: &Path) -> Result<PathBuf> {
    let dir = root.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&dir).map_err(|e| {
        DalleError::ConfigError(format!(
            "failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(dir)
}

pub fn image_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.{}", Uuid::new_v4(), IMAGE_EXTENSION))
}

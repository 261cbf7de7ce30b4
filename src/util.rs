use crate::error::CaptureResult;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

/// Idempotent directory creation.
pub fn ensure_dir(p: &Path) -> CaptureResult<()> {
    std::fs::create_dir_all(p).map_err(|e| {
        std::io::Error::new(e.kind(), format!("create_dir_all {}: {e}", p.display()))
    })?;
    Ok(())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Look a binary up on PATH.
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

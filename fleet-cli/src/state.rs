use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `$FLEET_HOME`, else `~/.fleet`.
pub fn fleet_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FLEET_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".fleet"))
}

pub fn ensure_fleet_home() -> Result<PathBuf> {
    let dir = fleet_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Write through a sibling temp file, then rename over `path`.
pub fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

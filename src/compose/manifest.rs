//! Record of a successful composition, written next to the build outputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::build_state::tmp_name;
use crate::error::{Error, Result};
use crate::gateway::Mutation;
use crate::platform::Platform;

pub const MANIFEST_FILENAME: &str = "gameimage.package.json";

#[derive(Debug, Clone, Serialize)]
pub struct PackageManifest {
    pub image: PathBuf,
    pub projects: Vec<String>,
    pub platforms: Vec<Platform>,
    pub steps: Vec<Mutation>,
    pub started_at_unix: u64,
    pub finished_at_unix: u64,
}

impl PackageManifest {
    /// Write `<build_dir>/gameimage.package.json` via a temp file and rename.
    pub fn write_to(&self, build_dir: &Path) -> Result<PathBuf> {
        let path = build_dir.join(MANIFEST_FILENAME);
        let tmp = build_dir.join(tmp_name(&path));
        let json = serde_json::to_vec_pretty(self).map_err(|e| Error::database(&path, e))?;
        fs::write(&tmp, json)
            .map_err(|e| Error::io(format!("writing '{}'", tmp.display()), e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::io(format!("replacing '{}'", path.display()), e)
        })?;
        Ok(path)
    }
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! Layer resolution: which platform layers a request needs, and where each
//! layer artifact lives on disk.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::build_state::ProjectRecord;
use crate::error::{Error, Result};
use crate::platform::Platform;

/// File suffix shared by platform and project layer artifacts.
pub const LAYER_SUFFIX: &str = ".layer";

/// Projects to package, in the order their layers are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionRequest {
    pub project_names: Vec<String>,
}

impl CompositionRequest {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            project_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a colon separated project list (`game1:game2`). Empty segments are dropped.
    pub fn from_colon_list(list: &str) -> Self {
        Self::new(
            list.split(':')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }
}

/// Deduplicated, sorted set of platforms required by `project_names`.
///
/// Names with no matching record are skipped.
pub fn resolve_required_platforms(
    project_names: &[String],
    records: &[ProjectRecord],
) -> BTreeSet<Platform> {
    records
        .iter()
        .filter(|record| project_names.contains(&record.name))
        .map(|record| record.platform)
        .collect()
}

/// `<cache_dir>/<platform>.layer`. Existence is not checked.
pub fn resolve_platform_layer_path(platform: Platform, cache_dir: &Path) -> PathBuf {
    cache_dir.join(format!("{}{LAYER_SUFFIX}", platform.as_str()))
}

/// The project root with `.layer` appended to its final component.
///
/// `/build/game1` becomes `/build/game1.layer`, even when the root looks like
/// it already has an extension.
pub fn resolve_project_layer_path(project_root: &Path) -> Result<PathBuf> {
    let mut raw = OsString::from(project_root.as_os_str());
    raw.push(LAYER_SUFFIX);
    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(Error::LayerMissing(path));
    }
    Ok(path)
}

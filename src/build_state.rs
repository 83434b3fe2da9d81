//! Build state database: per-project platform and path records.
//!
//! The document is written by the wizard during a build session. This crate
//! reads it, and only writes it to switch the current project.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::platform::Platform;

/// One project known to the build session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub platform: Platform,
    #[serde(rename = "path_dir_project_root")]
    pub path_project_root: PathBuf,
    #[serde(rename = "path_file_image")]
    pub path_output_image: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct BuildDatabase {
    project: String,
    path_dir_build: PathBuf,
    #[serde(default)]
    path_dir_cache: Option<PathBuf>,
    #[serde(default)]
    projects: Vec<ProjectRecord>,
}

/// Handle on the build state database file.
///
/// The untouched JSON document is kept alongside the typed view so that
/// writing it back preserves fields this crate does not model.
#[derive(Debug, Clone)]
pub struct BuildStore {
    path: PathBuf,
    db: BuildDatabase,
    doc: serde_json::Value,
}

impl BuildStore {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::database(path, e))?;
        let doc: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::database(path, e))?;
        if !doc.is_object() {
            return Err(Error::database(path, "build database must be a JSON object"));
        }
        let db = BuildDatabase::deserialize(&doc).map_err(|e| Error::database(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            db,
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_dir_build(&self) -> &Path {
        &self.db.path_dir_build
    }

    pub fn path_dir_cache(&self) -> Option<&Path> {
        self.db.path_dir_cache.as_deref()
    }

    /// All project records, in database order.
    pub fn records(&self) -> &[ProjectRecord] {
        &self.db.projects
    }

    pub fn find(&self, name: &str) -> Result<&ProjectRecord> {
        self.db
            .projects
            .iter()
            .find(|record| record.name == name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Record of the project currently selected in the build session.
    pub fn current(&self) -> Result<&ProjectRecord> {
        self.find(&self.db.project)
    }

    /// Select `name` as the current project and persist the change.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        self.find(name)?;
        if self.db.project == name {
            return Ok(());
        }
        let doc = self
            .doc
            .as_object_mut()
            .ok_or_else(|| Error::database(&self.path, "build database must be a JSON object"))?;
        doc.insert("project".into(), serde_json::Value::String(name.to_string()));
        self.db.project = name.to_string();
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json =
            serde_json::to_vec_pretty(&self.doc).map_err(|e| Error::database(&self.path, e))?;
        let tmp = self.path.with_file_name(tmp_name(&self.path));
        fs::write(&tmp, json)
            .map_err(|e| Error::io(format!("writing '{}'", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::io(format!("replacing '{}'", self.path.display()), e)
        })
    }
}

/// Unique sibling name for staging a replacement of `path`.
pub(crate) fn tmp_name(path: &Path) -> String {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gameimage.json".to_string());
    format!(".{stem}.tmp-{}-{n}", std::process::id())
}

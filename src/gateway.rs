//! Mutation gateway: the only point of contact with the image tool.
//!
//! A flatimage mutates itself when invoked with `fim-*` commands:
//!
//! ```text
//! <image> fim-layer add <layer>
//! <image> fim-exec cp <src> <dst>
//! <image> fim-boot /bin/bash -c '<cmd>' --
//! <image> fim-notify on
//! <image> fim-commit
//! ```
//!
//! Inside a running image the host is reached through a portal binary, which
//! takes the image path as its first argument and forwards the rest.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::process::Cmd;

/// One mutation applied to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Mutation {
    LayerAdd { path: PathBuf },
    ExecCopy { src: PathBuf, dst: String },
    Boot { program: String, args: Vec<String> },
    Notify { enabled: bool },
    Commit,
}

impl Mutation {
    /// The `fim-*` command word.
    pub fn command(&self) -> &'static str {
        match self {
            Mutation::LayerAdd { .. } => "fim-layer",
            Mutation::ExecCopy { .. } => "fim-exec",
            Mutation::Boot { .. } => "fim-boot",
            Mutation::Notify { .. } => "fim-notify",
            Mutation::Commit => "fim-commit",
        }
    }

    /// Full argument vector after the image path.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = vec![OsString::from(self.command())];
        match self {
            Mutation::LayerAdd { path } => {
                argv.push("add".into());
                argv.push(path.into());
            }
            Mutation::ExecCopy { src, dst } => {
                argv.push("cp".into());
                argv.push(src.into());
                argv.push(dst.into());
            }
            Mutation::Boot { program, args } => {
                argv.push(program.into());
                argv.extend(args.iter().map(OsString::from));
            }
            Mutation::Notify { enabled } => {
                argv.push(if *enabled { "on" } else { "off" }.into());
            }
            Mutation::Commit => {}
        }
        argv
    }
}

/// Applies mutations to an image file, blocking until each completes.
pub trait MutationGateway {
    fn apply(&mut self, image: &Path, mutation: &Mutation) -> Result<()>;
}

/// Gateway that runs the image (or a portal in front of it) as a child process.
#[derive(Debug, Clone, Default)]
pub struct FimGateway {
    portal: Option<PathBuf>,
}

impl FimGateway {
    /// Invoke the image directly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every call through `portal <image> ...`.
    pub fn with_portal(portal: impl Into<PathBuf>) -> Self {
        Self {
            portal: Some(portal.into()),
        }
    }
}

impl MutationGateway for FimGateway {
    fn apply(&mut self, image: &Path, mutation: &Mutation) -> Result<()> {
        let cmd = match &self.portal {
            Some(portal) => Cmd::new(portal).arg_path(image),
            None => Cmd::new(image_program(image)),
        };
        let label = mutation
            .argv()
            .iter()
            .take(2)
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        cmd.args(mutation.argv()).label(label).run()?;
        Ok(())
    }
}

/// A bare file name would be looked up in `PATH`; anchor it to the working directory.
fn image_program(image: &Path) -> PathBuf {
    match image.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(image),
        _ => image.to_path_buf(),
    }
}

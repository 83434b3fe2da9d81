//! Image composition.
//!
//! Drives a target image through a fixed sequence of mutations:
//!
//! ```text
//! Opened -> PlatformsApplied -> ProjectsApplied -> LauncherInjected
//!        -> BootSet -> NotifyEnabled -> Committed
//! ```
//!
//! Every step is a blocking gateway call. The first failure aborts the run;
//! mutations already applied stay on disk, since the image tool offers no
//! rollback.

mod lock;
mod manifest;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::build_state::BuildStore;
use crate::error::{Error, Result};
use crate::gateway::{Mutation, MutationGateway};
use crate::platform::{Platform, Registry, DEFAULT_LAYER};
use crate::resolve::{
    resolve_platform_layer_path, resolve_project_layer_path, resolve_required_platforms,
    CompositionRequest,
};

pub use lock::ImageLock;
pub use manifest::{PackageManifest, MANIFEST_FILENAME};

/// File name of the bundled launcher, both on the host and inside the image.
pub const LAUNCHER_NAME: &str = "gameimage-launcher";
/// Where the launcher lives inside the image.
pub const LAUNCHER_IMAGE_PATH: &str = "/fim/static/gameimage-launcher";
const BOOT_SHELL: &str = "/bin/bash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComposeState {
    Opened,
    PlatformsApplied,
    ProjectsApplied,
    LauncherInjected,
    BootSet,
    NotifyEnabled,
    Committed,
}

/// Host locations the composer reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Holds `<platform>.layer` artifacts.
    pub cache_dir: PathBuf,
    /// Holds the `gameimage-launcher` binary to inject.
    pub launcher_dir: PathBuf,
}

struct Target {
    image: PathBuf,
    build_dir: PathBuf,
    _lock: ImageLock,
}

pub struct ImageComposer<'a, G> {
    gateway: G,
    store: &'a mut BuildStore,
    registry: Option<&'a Registry>,
    options: ComposeOptions,
    state: Option<ComposeState>,
    steps: Vec<Mutation>,
}

impl<'a, G: MutationGateway> ImageComposer<'a, G> {
    pub fn new(gateway: G, store: &'a mut BuildStore, options: ComposeOptions) -> Self {
        Self {
            gateway,
            store,
            registry: None,
            options,
            state: None,
            steps: Vec::new(),
        }
    }

    /// Use `registry` to name download locators when a platform layer is missing.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Last state reached; `None` until the target image has been opened.
    pub fn state(&self) -> Option<ComposeState> {
        self.state
    }

    /// Mutations issued so far, in order.
    pub fn steps(&self) -> &[Mutation] {
        &self.steps
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Compose the current project's image from `request` and commit it.
    pub fn run(&mut self, request: &CompositionRequest) -> Result<PackageManifest> {
        let started_at_unix = manifest::now_unix();
        let target = self.open()?;

        let platforms = self.apply_platforms(&target, request)?;
        self.apply_projects(&target, request)?;
        self.inject_launcher(&target)?;
        self.set_boot(&target)?;
        self.enable_notify(&target)?;
        self.commit(&target)?;

        let manifest = PackageManifest {
            image: target.image.clone(),
            projects: request.project_names.clone(),
            platforms: platforms.into_iter().collect(),
            steps: self.steps.clone(),
            started_at_unix,
            finished_at_unix: manifest::now_unix(),
        };
        let path = manifest.write_to(&target.build_dir)?;
        info!("[package:{}] committed; manifest at {}", target.image.display(), path.display());
        Ok(manifest)
    }

    fn open(&mut self) -> Result<Target> {
        let image = self.store.current()?.path_output_image.clone();
        if !image.is_file() {
            return Err(Error::ImageMissing(image));
        }
        let image = std::path::absolute(&image)
            .map_err(|e| Error::io(format!("resolving image path '{}'", image.display()), e))?;
        let build_dir = self.store.path_dir_build().to_path_buf();
        if !build_dir.is_dir() {
            return Err(Error::BuildDirMissing(build_dir));
        }
        let lock = ImageLock::acquire(&image)?;

        self.state = Some(ComposeState::Opened);
        Ok(Target {
            image,
            build_dir,
            _lock: lock,
        })
    }

    fn apply_platforms(
        &mut self,
        target: &Target,
        request: &CompositionRequest,
    ) -> Result<BTreeSet<Platform>> {
        self.expect(ComposeState::Opened);
        let platforms = resolve_required_platforms(&request.project_names, self.store.records());

        for &platform in &platforms {
            let path = resolve_platform_layer_path(platform, &self.options.cache_dir);
            if !path.is_file() {
                return Err(Error::PlatformLayerMissing {
                    platform: platform.as_str(),
                    path,
                    locator: self.download_hint(platform),
                });
            }
            self.apply(target, Mutation::LayerAdd { path })?;
        }

        self.state = Some(ComposeState::PlatformsApplied);
        Ok(platforms)
    }

    fn apply_projects(&mut self, target: &Target, request: &CompositionRequest) -> Result<()> {
        self.expect(ComposeState::PlatformsApplied);

        for name in &request.project_names {
            self.store.set_current(name)?;
            let root = self.store.find(name)?.path_project_root.clone();
            let path = resolve_project_layer_path(&root)?;
            self.apply(target, Mutation::LayerAdd { path })?;
        }

        self.state = Some(ComposeState::ProjectsApplied);
        Ok(())
    }

    fn inject_launcher(&mut self, target: &Target) -> Result<()> {
        self.expect(ComposeState::ProjectsApplied);

        let src = self.options.launcher_dir.join(LAUNCHER_NAME);
        if !src.is_file() {
            return Err(Error::LauncherMissing(src));
        }
        let dst = target.build_dir.join(LAUNCHER_NAME);
        fs::copy(&src, &dst).map_err(|e| {
            Error::io(
                format!("copying launcher '{}' to '{}'", src.display(), dst.display()),
                e,
            )
        })?;

        self.apply(
            target,
            Mutation::ExecCopy {
                src: dst,
                dst: LAUNCHER_IMAGE_PATH.to_string(),
            },
        )?;
        self.state = Some(ComposeState::LauncherInjected);
        Ok(())
    }

    fn set_boot(&mut self, target: &Target) -> Result<()> {
        self.expect(ComposeState::LauncherInjected);
        self.apply(
            target,
            Mutation::Boot {
                program: BOOT_SHELL.to_string(),
                args: vec![
                    "-c".to_string(),
                    format!("{LAUNCHER_IMAGE_PATH} \"$@\""),
                    "--".to_string(),
                ],
            },
        )?;
        self.state = Some(ComposeState::BootSet);
        Ok(())
    }

    fn enable_notify(&mut self, target: &Target) -> Result<()> {
        self.expect(ComposeState::BootSet);
        self.apply(target, Mutation::Notify { enabled: true })?;
        self.state = Some(ComposeState::NotifyEnabled);
        Ok(())
    }

    fn commit(&mut self, target: &Target) -> Result<()> {
        self.expect(ComposeState::NotifyEnabled);
        self.apply(target, Mutation::Commit)?;
        self.state = Some(ComposeState::Committed);
        Ok(())
    }

    fn apply(&mut self, target: &Target, mutation: Mutation) -> Result<()> {
        info!(
            "[package:{}] {}",
            target.image.display(),
            mutation
                .argv()
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.gateway.apply(&target.image, &mutation)?;
        self.steps.push(mutation);
        Ok(())
    }

    fn expect(&self, state: ComposeState) {
        debug_assert_eq!(self.state, Some(state), "composition steps out of order");
    }

    fn download_hint(&self, platform: Platform) -> Option<String> {
        let locators = self.registry?.get(platform).ok()?;
        Some(
            locators
                .layer(DEFAULT_LAYER)
                .unwrap_or(locators.base())
                .to_string(),
        )
    }
}

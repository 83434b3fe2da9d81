//! Game image composition.
//!
//! Builds a distributable game image by layering platform runtimes and
//! project payloads onto a base flatimage, then finalising its boot metadata.
//!
//! - **Platform registry** - Base, layer and core locators per platform
//! - **Build state** - Per-project platform and path records
//! - **Layer resolution** - Required platforms and layer artifact paths
//! - **Image composition** - Ordered mutation sequence ending in a commit
//! - **Mutation gateway** - Blocking calls into the image's `fim-*` commands
//!
//! # Architecture
//!
//! ```text
//! CLI request (project list)
//!     │
//!     ├── resolve: Registry + BuildStore -> platforms, layer paths
//!     │
//!     └── compose: ImageComposer
//!             ├── fim-layer add   (each platform, then each project)
//!             ├── fim-exec cp     (launcher)
//!             ├── fim-boot        (launcher through bash)
//!             ├── fim-notify on
//!             └── fim-commit
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use gameimage_package::{BuildStore, ComposeOptions, CompositionRequest, FimGateway, ImageComposer};
//!
//! let mut store = BuildStore::open(Path::new("gameimage.json"))?;
//! let options = ComposeOptions { cache_dir, launcher_dir };
//! let mut composer = ImageComposer::new(FimGateway::new(), &mut store, options);
//! composer.run(&CompositionRequest::from_colon_list("game1:game2"))?;
//! ```

pub mod build_state;
pub mod compose;
pub mod config;
pub mod error;
pub mod gateway;
pub mod platform;
pub mod process;
pub mod resolve;

pub use build_state::{BuildStore, ProjectRecord};
pub use compose::{ComposeOptions, ComposeState, ImageComposer, PackageManifest};
pub use config::Settings;
pub use error::{Error, Result};
pub use gateway::{FimGateway, Mutation, MutationGateway};
pub use platform::{CoreLocator, Platform, PlatformLocators, Registry, DEFAULT_LAYER};
pub use resolve::CompositionRequest;

//! Platform metadata model.
//!
//! Every supported runtime target shares one record shape: a base image
//! locator, a table of named layer locators and (Retroarch only) a list of
//! emulation core locators. The [`registry`] module populates these records
//! from the declarative platform database.

pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

pub use registry::Registry;

/// Layer identifier used when the caller does not name one.
pub const DEFAULT_LAYER: &str = "default";

/// Closed set of supported platforms.
///
/// Declaration order is the composition order for platform layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Linux,
    Retroarch,
    Pcsx2,
    Rpcs3,
    Wine,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Linux,
        Platform::Retroarch,
        Platform::Pcsx2,
        Platform::Rpcs3,
        Platform::Wine,
    ];

    /// Lowercase identifier, as used in databases and cache file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Retroarch => "retroarch",
            Platform::Pcsx2 => "pcsx2",
            Platform::Rpcs3 => "rpcs3",
            Platform::Wine => "wine",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let wanted = value.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|platform| platform.as_str() == wanted)
            .ok_or_else(|| Error::UnknownPlatform(value.to_string()))
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A pluggable emulation core and where to download it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreLocator {
    pub name: String,
    pub locator: String,
}

/// Download locators for one platform. Immutable once the registry is built.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformLocators {
    platform: Platform,
    base: String,
    layers: BTreeMap<String, String>,
    cores: Vec<CoreLocator>,
}

impl PlatformLocators {
    pub(crate) fn new(
        platform: Platform,
        base: String,
        layers: BTreeMap<String, String>,
        cores: Vec<CoreLocator>,
    ) -> Self {
        Self {
            platform,
            base,
            layers,
            cores,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Look up a named layer locator.
    pub fn layer(&self, identifier: &str) -> Result<&str> {
        self.layers
            .get(identifier)
            .map(String::as_str)
            .ok_or_else(|| Error::LayerNotFound {
                platform: self.platform.as_str(),
                identifier: identifier.to_string(),
            })
    }

    /// All layer locators, ordered by identifier.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn cores(&self) -> &[CoreLocator] {
        &self.cores
    }
}

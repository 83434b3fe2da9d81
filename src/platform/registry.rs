//! Platform registry loaded from the declarative platform database.
//!
//! The database is a JSON document of the shape:
//!
//! ```json
//! {
//!   "linux":     { "base": "..." },
//!   "pcsx2":     { "base": "...", "layer": "..." },
//!   "rpcs3":     { "base": "...", "layer": "..." },
//!   "wine":      { "base": "...", "layer": { "default": "...", "staging": "..." } },
//!   "retroarch": { "base": "...", "layer": "...", "core": { "snes9x": "..." } }
//! }
//! ```
//!
//! A `layer` given as a plain string is stored under [`DEFAULT_LAYER`]; a
//! mapping must name a [`DEFAULT_LAYER`] entry of its own.
//! Parsing is all-or-nothing: the first missing or malformed field aborts
//! construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::{CoreLocator, Platform, PlatformLocators, DEFAULT_LAYER};
use crate::error::{Error, Result};

/// Locators for every supported platform, keyed by platform.
#[derive(Debug, Clone)]
pub struct Registry {
    platforms: BTreeMap<Platform, PlatformLocators>,
}

impl Registry {
    /// Read and parse the platform database at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::database(path, e))?;
        let doc: Value = serde_json::from_slice(&bytes).map_err(|e| Error::database(path, e))?;
        Self::from_doc(path, &doc)
    }

    /// Parse a platform database held in memory.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(src).map_err(|e| Error::database("<inline>", e))?;
        Self::from_doc(Path::new("<inline>"), &doc)
    }

    fn from_doc(path: &Path, doc: &Value) -> Result<Self> {
        let sections = doc
            .as_object()
            .ok_or_else(|| Error::database(path, "platform database must be a JSON object"))?;

        let mut platforms = BTreeMap::new();
        for platform in Platform::ALL {
            let locators = build_locators(platform, sections.get(platform.as_str()))?;
            platforms.insert(platform, locators);
        }

        Ok(Self { platforms })
    }

    /// Locators for `platform`.
    pub fn get(&self, platform: Platform) -> Result<&PlatformLocators> {
        self.platforms
            .get(&platform)
            .ok_or_else(|| Error::UnknownPlatform(platform.to_string()))
    }

    /// Locators for a platform given by its textual identifier.
    pub fn get_by_name(&self, name: &str) -> Result<&PlatformLocators> {
        self.get(name.parse()?)
    }

    /// Locator of the layer named `identifier` (usually [`DEFAULT_LAYER`]).
    pub fn get_layer(&self, platform: Platform, identifier: &str) -> Result<&str> {
        self.get(platform)?.layer(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformLocators> {
        self.platforms.values()
    }
}

/// Validate one platform section. Absent fields and fields of the wrong JSON
/// type are both reported as `ConfigParse` naming the platform and field.
fn build_locators(platform: Platform, section: Option<&Value>) -> Result<PlatformLocators> {
    let name = platform.as_str();
    let invalid = |field: &'static str| Error::ConfigParse {
        platform: name,
        field,
    };
    let empty = Map::new();
    let section = match section {
        Some(Value::Object(map)) => map,
        None => &empty,
        Some(_) => return Err(invalid("base")),
    };

    let base = section
        .get("base")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("base"))?
        .to_string();

    let layers = match section.get("layer") {
        Some(Value::String(url)) => BTreeMap::from([(DEFAULT_LAYER.to_string(), url.clone())]),
        Some(Value::Object(map)) => {
            let layers = string_map(map).ok_or_else(|| invalid("layer"))?;
            if !layers.contains_key(DEFAULT_LAYER) {
                return Err(invalid("layer"));
            }
            layers
        }
        // Linux ships only a base image.
        None if platform == Platform::Linux => BTreeMap::new(),
        _ => return Err(invalid("layer")),
    };

    let cores = if platform == Platform::Retroarch {
        section
            .get("core")
            .and_then(Value::as_object)
            .and_then(string_map)
            .ok_or_else(|| invalid("core"))?
            .into_iter()
            .map(|(name, locator)| CoreLocator { name, locator })
            .collect()
    } else {
        Vec::new()
    };

    Ok(PlatformLocators::new(platform, base, layers, cores))
}

/// `None` if any value is not a string.
fn string_map(map: &Map<String, Value>) -> Option<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| Some((key.clone(), value.as_str()?.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DATABASE: &str = r#"{
        "version": "1.0",
        "linux": { "base": "https://host/linux.flatimage" },
        "pcsx2": { "base": "https://host/pcsx2.flatimage", "layer": "https://host/pcsx2.layer" },
        "rpcs3": { "base": "https://host/rpcs3.flatimage", "layer": "https://host/rpcs3.layer" },
        "wine": {
            "base": "https://host/wine.flatimage",
            "layer": { "default": "https://host/wine.layer", "staging": "https://host/wine-staging.layer" }
        },
        "retroarch": {
            "base": "https://host/retroarch.flatimage",
            "layer": "https://host/retroarch.layer",
            "core": { "snes9x": "https://host/snes9x.so", "bsnes": "https://host/bsnes.so" }
        }
    }"#;

    #[test]
    fn loads_every_platform() {
        let registry = Registry::from_json_str(DATABASE).unwrap();
        assert_eq!(registry.iter().count(), Platform::ALL.len());
        assert_eq!(
            registry.get(Platform::Linux).unwrap().base(),
            "https://host/linux.flatimage"
        );
        assert_eq!(
            registry.get_layer(Platform::Pcsx2, DEFAULT_LAYER).unwrap(),
            "https://host/pcsx2.layer"
        );
        assert_eq!(
            registry.get_layer(Platform::Wine, "staging").unwrap(),
            "https://host/wine-staging.layer"
        );
    }

    #[test]
    fn retroarch_cores_are_ordered_by_name() {
        let registry = Registry::from_json_str(DATABASE).unwrap();
        let cores = registry.get(Platform::Retroarch).unwrap().cores();
        let names: Vec<&str> = cores.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["bsnes", "snes9x"]);
        assert!(registry.get(Platform::Wine).unwrap().cores().is_empty());
    }

    #[test]
    fn unknown_layer_identifier_fails() {
        let registry = Registry::from_json_str(DATABASE).unwrap();
        for platform in Platform::ALL {
            let err = registry.get_layer(platform, "nonexistent-id").unwrap_err();
            assert!(matches!(err, Error::LayerNotFound { .. }), "{platform}");
        }
    }

    #[test]
    fn linux_without_layer_has_no_default() {
        let registry = Registry::from_json_str(DATABASE).unwrap();
        let err = registry
            .get_layer(Platform::Linux, DEFAULT_LAYER)
            .unwrap_err();
        assert!(matches!(err, Error::LayerNotFound { platform: "linux", .. }));
    }

    #[test]
    fn missing_wine_base_names_platform_and_field() {
        let mut doc: serde_json::Value = serde_json::from_str(DATABASE).unwrap();
        doc["wine"].as_object_mut().unwrap().remove("base");
        let err = Registry::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigParse {
                platform: "wine",
                field: "base"
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("wine") && msg.contains("base"));
    }

    #[test]
    fn missing_retroarch_core_fails() {
        let mut doc: serde_json::Value = serde_json::from_str(DATABASE).unwrap();
        doc["retroarch"].as_object_mut().unwrap().remove("core");
        let err = Registry::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigParse {
                platform: "retroarch",
                field: "core"
            }
        ));
    }

    #[test]
    fn wrong_typed_fields_name_platform_and_field() {
        let cases = [
            ("wine", "base", serde_json::json!(42)),
            ("wine", "layer", serde_json::json!(7)),
            ("pcsx2", "layer", serde_json::json!({ "default": 1 })),
            ("retroarch", "core", serde_json::json!(["snes9x"])),
            ("retroarch", "core", serde_json::json!({ "snes9x": null })),
        ];
        for (platform, field, value) in cases {
            let mut doc: serde_json::Value = serde_json::from_str(DATABASE).unwrap();
            doc[platform][field] = value;
            let err = Registry::from_json_str(&doc.to_string()).unwrap_err();
            assert!(
                matches!(err, Error::ConfigParse { platform: p, field: f } if p == platform && f == field),
                "{platform}.{field}: {err}"
            );
        }
    }

    #[test]
    fn layer_map_without_default_fails() {
        let mut doc: serde_json::Value = serde_json::from_str(DATABASE).unwrap();
        doc["wine"]["layer"] = serde_json::json!({ "staging": "https://host/wine-staging.layer" });
        let err = Registry::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigParse {
                platform: "wine",
                field: "layer"
            }
        ));
    }

    #[test]
    fn non_object_database_fails() {
        assert!(matches!(
            Registry::from_json_str("[]"),
            Err(Error::Database { .. })
        ));
    }

    #[test]
    fn missing_platform_section_fails() {
        let mut doc: serde_json::Value = serde_json::from_str(DATABASE).unwrap();
        doc.as_object_mut().unwrap().remove("rpcs3");
        let err = Registry::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { platform: "rpcs3", .. }));
    }

    #[test]
    fn get_by_name_rejects_unknown_identifier() {
        let registry = Registry::from_json_str(DATABASE).unwrap();
        assert_eq!(
            registry.get_by_name("Wine").unwrap().platform(),
            Platform::Wine
        );
        assert!(matches!(
            registry.get_by_name("dreamcast"),
            Err(Error::UnknownPlatform(_))
        ));
    }

    #[test]
    fn load_reports_path_on_bad_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gameimage.fetch.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Registry::load(&path).unwrap_err();
        assert!(matches!(err, Error::Database { .. }));
        assert!(err.to_string().contains("gameimage.fetch.json"));
    }
}

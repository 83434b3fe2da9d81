use anyhow::{Context, Result};
use gameimage_package::{Registry, Settings};

fn load_registry() -> Result<Registry> {
    let settings = Settings::from_env()?;
    Registry::load(&settings.fetch_database).context("loading platform database")
}

pub(crate) fn show_platform(name: &str) -> Result<()> {
    let registry = load_registry()?;
    let locators = registry.get_by_name(name)?;
    let json = serde_json::to_string_pretty(locators).context("serializing platform locators")?;
    println!("{json}");
    Ok(())
}

pub(crate) fn show_layer(name: &str, identifier: &str) -> Result<()> {
    let registry = load_registry()?;
    println!("{}", registry.get_by_name(name)?.layer(identifier)?);
    Ok(())
}

pub(crate) fn show_cores(name: &str) -> Result<()> {
    let registry = load_registry()?;
    for core in registry.get_by_name(name)?.cores() {
        println!("{}\t{}", core.name, core.locator);
    }
    Ok(())
}

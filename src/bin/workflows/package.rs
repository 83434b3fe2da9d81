use anyhow::{Context, Result};
use gameimage_package::{
    BuildStore, ComposeOptions, CompositionRequest, FimGateway, ImageComposer, Registry, Settings,
};
use tracing::{info, warn};

pub(crate) fn package(projects: &str) -> Result<()> {
    let settings = Settings::from_env()?;
    let request = CompositionRequest::from_colon_list(projects);

    let mut store = BuildStore::open(&settings.build_database)
        .context("opening build database")?;

    // The platform database only enriches error messages; packaging works without it.
    let registry = if settings.fetch_database.is_file() {
        Some(Registry::load(&settings.fetch_database).context("loading platform database")?)
    } else {
        warn!(
            "platform database '{}' not found; missing layers will not name a download locator",
            settings.fetch_database.display()
        );
        None
    };

    let options = ComposeOptions {
        cache_dir: settings.cache_dir_for(&store),
        launcher_dir: settings.launcher_dir()?,
    };
    let gateway = match &settings.portal {
        Some(portal) => FimGateway::with_portal(portal),
        None => FimGateway::new(),
    };

    info!(
        "[package] projects: {}",
        if request.project_names.is_empty() {
            "<none>".to_string()
        } else {
            request.project_names.join(", ")
        }
    );

    let mut composer = ImageComposer::new(gateway, &mut store, options);
    if let Some(registry) = registry.as_ref() {
        composer = composer.with_registry(registry);
    }
    let manifest = composer
        .run(&request)
        .with_context(|| format!("packaging projects '{projects}'"))?;

    println!("{}", manifest.image.display());
    Ok(())
}

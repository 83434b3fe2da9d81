use anyhow::{bail, Context, Result};
use gameimage_package::DEFAULT_LAYER;

pub(crate) fn dispatch(args: &[String]) -> Result<()> {
    let command = match args {
        [cmd, projects] if cmd == "package" => crate::workflows::package(projects),
        [cmd, platform] if cmd == "platform" => crate::workflows::show_platform(platform),
        [cmd, platform, layer] if cmd == "platform" && layer == "layer" => {
            crate::workflows::show_layer(platform, DEFAULT_LAYER)
        }
        [cmd, platform, layer, identifier] if cmd == "platform" && layer == "layer" => {
            crate::workflows::show_layer(platform, identifier)
        }
        [cmd, platform, cores] if cmd == "platform" && cores == "cores" => {
            crate::workflows::show_cores(platform)
        }
        _ => bail!(crate::usage()),
    };
    command.with_context(|| format!("running '{}'", args.join(" ")))
}

use anyhow::Result;

mod workflows;

fn usage() -> &'static str {
    "Usage:\n  gameimage-package package <project[:project...]>\n  gameimage-package platform <linux|retroarch|pcsx2|rpcs3|wine>\n  gameimage-package platform <name> layer [identifier]\n  gameimage-package platform <name> cores"
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    workflows::dispatch(&args)
}

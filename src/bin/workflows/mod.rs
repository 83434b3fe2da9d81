mod commands;
mod package;
mod platform;

pub(crate) use commands::dispatch;
pub(crate) use package::package;
pub(crate) use platform::{show_cores, show_layer, show_platform};

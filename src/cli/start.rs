use crate::cli::{actions::Action, commands, dispatch::handler, globals::GlobalArgs};
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Start the CLI
pub fn start() -> Result<(Action, GlobalArgs)> {
    let matches = commands::new().get_matches();

    let verbosity_level = match matches.get_one::<u8>("verbosity").map_or(0, |&v| v) {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    // RUST_LOG=
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy();

    let subscriber = Registry::default().with(fmt_layer).with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    let globals = GlobalArgs::new(
        matches
            .get_one::<String>("api-url")
            .map(String::to_string)
            .context("missing required argument: --api-url")?,
        matches
            .get_one::<std::path::PathBuf>("auth-store")
            .cloned()
            .context("missing required argument: --auth-store")?,
    );

    let action = handler(&matches)?;

    Ok((action, globals))
}

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

mod env;

pub use env::LogFormat;

/// Installs the global tracing subscriber.
///
/// Events go to stderr, filtered by `RUST_LOG` (default `info`). Set
/// `SAMPLEWEB_LOG_FORMAT=json` for one JSON object per line.
pub fn init_globally() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env()?
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let fmt_layer = match LogFormat::from_env() {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .boxed(),
    };

    registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install the global tracing subscriber: {e}"))
}

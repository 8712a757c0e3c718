use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use super::settings::LogFormat;

pub(crate) fn init_logging(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    result.map_err(|e| anyhow!("failed to init logging: {e}"))
}

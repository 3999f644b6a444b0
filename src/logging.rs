use std::path::Path;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. Menu output goes to stdout, so log lines go to
/// stderr; `RUST_LOG` overrides the default `info` filter. When `log_dir`
/// is given, a daily-rolling file log is added alongside.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    const DAYS_TO_KEEP: usize = 7;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .max_log_files(DAYS_TO_KEEP)
                .filename_prefix("medley")
                .filename_suffix("log")
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            registry
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .try_init()?;

            // Guard must outlive the subscriber or the file layer stops.
            std::mem::forget(guard);
        }
        None => {
            registry.with(stderr_layer).try_init()?;
        }
    }

    Ok(())
}

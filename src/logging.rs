use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, RetailError};
use crate::settings::config_dir;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogTarget {
    /// One-shot commands log to stderr, leaving stdout for report output.
    Stderr,
    /// The dashboard owns the terminal, so logs go to `<config dir>/tillroll.log`.
    File,
}

fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "tillroll=warn",
        1 => "tillroll=info",
        _ => "tillroll=debug",
    }
}

pub fn init(verbosity: u8, target: LogTarget) -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(verbosity).into());

    let stderr_layer = (target == LogTarget::Stderr).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let file_layer = if target == LogTarget::File {
        let dir = config_dir();
        std::fs::create_dir_all(&dir)?;
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("tillroll.log"))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RetailError::Other(format!("Logging already initialised: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_filter(0), "tillroll=warn");
        assert_eq!(default_filter(1), "tillroll=info");
        assert_eq!(default_filter(5), "tillroll=debug");
    }
}

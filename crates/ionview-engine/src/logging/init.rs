use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "ionview_engine=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

/// Filter actually applied: explicit filter, then `RUST_LOG`, then `None` (info level).
pub fn resolve_filter(explicit: Option<&str>, rust_log: Option<&str>) -> Option<String> {
    fn clean(f: Option<&str>) -> Option<&str> {
        f.map(str::trim).filter(|f| !f.is_empty())
    }
    clean(explicit).or(clean(rust_log)).map(str::to_string)
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Subsequent calls are ignored. Call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let rust_log = std::env::var("RUST_LOG").ok();
        match resolve_filter(config.env_filter.as_deref(), rust_log.as_deref()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
                // wgpu is chatty at info.
                builder.filter_module("wgpu_core", log::LevelFilter::Warn);
                builder.filter_module("wgpu_hal", log::LevelFilter::Warn);
                builder.filter_module("naga", log::LevelFilter::Warn);
            }
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn")).as_deref(), Some("debug"));
    }

    #[test]
    fn falls_back_to_rust_log_then_default() {
        assert_eq!(resolve_filter(None, Some("warn")).as_deref(), Some("warn"));
        assert_eq!(resolve_filter(None, None), None);
        assert_eq!(resolve_filter(Some("  "), Some("warn")).as_deref(), Some("warn"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::with_filter("off"));
        init_logging(LoggingConfig::default());
    }
}

use std::sync::Once;

use crate::scheduler;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "cadence_engine::scheduler=trace,winit=warn"). When unset, `RUST_LOG` is
/// consulted, then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Replace the default panic hook with one that reports through `log`.
    pub log_panics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            log_panics: true,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; subsequent calls are ignored. Fails silently (with a message on
/// stderr) if another logger was installed first, in which case the panic hook
/// is left alone too.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
            }
        }

        builder.write_style(config.write_style);
        builder.format_timestamp_millis();

        if let Err(e) = builder.try_init() {
            eprintln!("cadence: logger already initialized: {e}");
            return;
        }

        if config.log_panics {
            std::panic::set_hook(Box::new(|info| {
                log::log!(target: "panic", panic_level(scheduler::in_callback()), "{info}");
            }));
        }

        log::debug!("logging initialized");
    });
}

/// Frame callback panics are caught and reported by the scheduler with the
/// consumer id; the hook only adds the location at `debug`.
fn panic_level(in_callback: bool) -> log::Level {
    if in_callback {
        log::Level::Debug
    } else {
        log::Level::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_panics_are_demoted() {
        assert_eq!(panic_level(true), log::Level::Debug);
        assert_eq!(panic_level(false), log::Level::Error);
    }

    #[test]
    fn defaults_route_panics_through_log() {
        let config = LoggingConfig::default();
        assert!(config.log_panics);
        assert_eq!(config.default_level, log::LevelFilter::Info);
        assert!(config.env_filter.is_none());
    }
}

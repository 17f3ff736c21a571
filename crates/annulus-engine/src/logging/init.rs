use std::sync::Once;

/// Crates whose info-level output drowns the engine's own.
const NOISY_BACKEND_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "annulus_engine::frame=trace,wgpu=warn") and wins over `RUST_LOG`. Without
/// either, `level` applies everywhere and `quiet_backend` holds the wgpu
/// internals at `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub level: log::LevelFilter,
    pub quiet_backend: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            level: log::LevelFilter::Info,
            quiet_backend: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { env_filter: Some(filter.into()), ..Self::default() }
    }

    /// Filter string used when neither `env_filter` nor `RUST_LOG` is set.
    fn fallback_filter(&self) -> String {
        let mut filter = self.level.to_string().to_lowercase();
        if self.quiet_backend && self.level > log::LevelFilter::Warn {
            for module in NOISY_BACKEND_MODULES {
                filter.push_str(&format!(",{module}=warn"));
            }
        }
        filter
    }

    fn resolve_filter(&self, from_env: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(from_env)
            .unwrap_or_else(|| self.fallback_filter())
    }
}

static INIT: Once = Once::new();

/// Installs the global `env_logger` once; later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter).write_style(config.write_style);

        // A test harness may already own the global logger.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized with `{filter}`");
        }
    });
}

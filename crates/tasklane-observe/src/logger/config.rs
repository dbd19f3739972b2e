use crate::logger::{error::LoggerError, format::LoggerFormat};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives, e.g. `info` or `info,tasklane_core=debug`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || atty::is(atty::Stream::Stdout);
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `<PREFIX>_LOG_LEVEL`, `<PREFIX>_LOG_FORMAT` and `NO_COLOR`.
    pub fn from_env(prefix: &str) -> Result<Self, LoggerError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = lookup(&format!("{prefix}_LOG_LEVEL")) {
            cfg.level = level;
        }
        if let Some(format) = lookup(&format!("{prefix}_LOG_FORMAT")) {
            cfg.format = format.parse()?;
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}

use std::{fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{Context, bail};
use tasklane_core::{DedupPolicy, MissingPolicy, RefreshConfig};
use tasklane_observe::LoggerConfig;
use time::Duration;

const PREFIX: &str = "TASKLANE";

/// Daemon configuration. Every field has a default; `TASKLANE_*` variables override them.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub listen: SocketAddr,
    pub refresh_interval: std::time::Duration,
    /// JSON history dump to serve; an empty store is used when unset.
    pub history_file: Option<PathBuf>,
    pub refresh: RefreshConfig,
    pub logger: LoggerConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5006)),
            refresh_interval: std::time::Duration::from_secs(1),
            history_file: None,
            refresh: RefreshConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::from_lookup(|key| std::env::var(key).ok())?;
        cfg.logger = LoggerConfig::from_env(PREFIX)?;
        Ok(cfg)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        let var = |name: &str| lookup(&format!("{PREFIX}_{name}"));

        if let Some(listen) = parse(&var, "LISTEN")? {
            cfg.listen = listen;
        }
        if let Some(ms) = parse::<u64>(&var, "REFRESH_MS")? {
            if ms == 0 {
                bail!("{PREFIX}_REFRESH_MS must be positive");
            }
            cfg.refresh_interval = std::time::Duration::from_millis(ms);
        }
        if let Some(path) = var("HISTORY_FILE").filter(|p| !p.is_empty()) {
            cfg.history_file = Some(PathBuf::from(path));
        }
        if let Some(secs) = parse::<i64>(&var, "TIME_WINDOW_SECS")? {
            if secs < 0 {
                bail!("{PREFIX}_TIME_WINDOW_SECS must not be negative");
            }
            cfg.refresh.time_window = Duration::seconds(secs);
        }
        if let Some(ms) = parse::<i64>(&var, "SHORT_THRESHOLD_MS")? {
            if ms < 0 {
                bail!("{PREFIX}_SHORT_THRESHOLD_MS must not be negative");
            }
            cfg.refresh.short_threshold = Duration::milliseconds(ms);
        }
        if let Some(max) = parse(&var, "MAX_FINISHED")? {
            cfg.refresh.fetch.max_finished = max;
        }
        if let Some(max) = parse(&var, "MAX_FAILED")? {
            cfg.refresh.fetch.max_failed = max;
        }
        if let Some(policy) = var("ON_MISSING") {
            cfg.refresh.fetch.missing = match policy.trim().to_ascii_lowercase().as_str() {
                "abort" => MissingPolicy::Abort,
                "skip" => MissingPolicy::Skip,
                other => {
                    bail!("{PREFIX}_ON_MISSING: unknown policy {other:?} (expected: abort|skip)")
                }
            };
        }
        if let Some(policy) = var("DEDUP") {
            cfg.refresh.fetch.dedup = match policy.trim().to_ascii_lowercase().as_str() {
                "keep-all" | "off" => DedupPolicy::KeepAll,
                "prefer-terminal" | "on" => DedupPolicy::PreferTerminal,
                other => bail!(
                    "{PREFIX}_DEDUP: unknown policy {other:?} (expected: keep-all|prefer-terminal)"
                ),
            };
        }
        Ok(cfg)
    }
}

fn parse<T>(var: impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = var(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {PREFIX}_{name}: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = MonitorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.listen.port(), 5006);
        assert_eq!(cfg.refresh_interval, std::time::Duration::from_secs(1));
        assert_eq!(cfg.refresh.time_window, Duration::hours(48));
        assert_eq!(cfg.refresh.short_threshold, Duration::SECOND);
        assert_eq!(cfg.refresh.fetch.max_finished, 1000);
        assert_eq!(cfg.refresh.fetch.missing, MissingPolicy::Skip);
        assert_eq!(cfg.refresh.fetch.dedup, DedupPolicy::PreferTerminal);
        assert!(cfg.history_file.is_none());
    }

    #[test]
    fn overrides() {
        let cfg = MonitorConfig::from_lookup(lookup(&[
            ("TASKLANE_LISTEN", "127.0.0.1:9000"),
            ("TASKLANE_REFRESH_MS", "250"),
            ("TASKLANE_HISTORY_FILE", "/tmp/history.json"),
            ("TASKLANE_TIME_WINDOW_SECS", "3600"),
            ("TASKLANE_SHORT_THRESHOLD_MS", "500"),
            ("TASKLANE_MAX_FINISHED", "10"),
            ("TASKLANE_MAX_FAILED", "0"),
            ("TASKLANE_ON_MISSING", "Abort"),
            ("TASKLANE_DEDUP", "keep-all"),
        ]))
        .unwrap();

        assert_eq!(cfg.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.refresh_interval, std::time::Duration::from_millis(250));
        assert_eq!(cfg.history_file, Some(PathBuf::from("/tmp/history.json")));
        assert_eq!(cfg.refresh.time_window, Duration::hours(1));
        assert_eq!(cfg.refresh.short_threshold, Duration::milliseconds(500));
        assert_eq!(cfg.refresh.fetch.max_finished, 10);
        assert_eq!(cfg.refresh.fetch.max_failed, 0);
        assert_eq!(cfg.refresh.fetch.missing, MissingPolicy::Abort);
        assert_eq!(cfg.refresh.fetch.dedup, DedupPolicy::KeepAll);
    }

    #[test]
    fn rejects_bad_values() {
        let err =
            MonitorConfig::from_lookup(lookup(&[("TASKLANE_MAX_FAILED", "lots")])).unwrap_err();
        assert!(err.to_string().contains("TASKLANE_MAX_FAILED"));

        assert!(MonitorConfig::from_lookup(lookup(&[("TASKLANE_REFRESH_MS", "0")])).is_err());
        assert!(MonitorConfig::from_lookup(lookup(&[("TASKLANE_ON_MISSING", "retry")])).is_err());
    }

    #[test]
    fn rejects_negative_durations() {
        let err = MonitorConfig::from_lookup(lookup(&[("TASKLANE_TIME_WINDOW_SECS", "-60")]))
            .unwrap_err();
        assert!(err.to_string().contains("TASKLANE_TIME_WINDOW_SECS"));

        let err = MonitorConfig::from_lookup(lookup(&[("TASKLANE_SHORT_THRESHOLD_MS", "-1")]))
            .unwrap_err();
        assert!(err.to_string().contains("TASKLANE_SHORT_THRESHOLD_MS"));

        let cfg = MonitorConfig::from_lookup(lookup(&[
            ("TASKLANE_TIME_WINDOW_SECS", "0"),
            ("TASKLANE_SHORT_THRESHOLD_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.refresh.time_window, Duration::ZERO);
        assert_eq!(cfg.refresh.short_threshold, Duration::ZERO);
    }
}

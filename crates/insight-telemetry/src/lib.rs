use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

pub const ENV_LOG_DIR: &str = "INSIGHT_LOG_DIR";
pub const ENV_LOG_ROTATION: &str = "INSIGHT_LOG_ROTATION";
const LOG_PREFIX: &str = "insight";

static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
}

impl Rotation {
    /// Unknown values fall back to daily.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        }
    }
}

/// Console tracing filtered by `RUST_LOG` (default `info`), plus a rolling
/// file log when `INSIGHT_LOG_DIR` is set.
pub fn init() {
    let dir = std::env::var_os(ENV_LOG_DIR).map(PathBuf::from);
    let rotation = std::env::var(ENV_LOG_ROTATION).ok();
    init_with(dir.as_deref(), rotation.as_deref());
}

/// Like [`init`] with explicit log settings; env values still take precedence.
/// Safe to call more than once: later calls leave the first subscriber in place.
pub fn init_with(dir: Option<&Path>, rotation: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(console.with_filter(filter));

    let env_dir = std::env::var_os(ENV_LOG_DIR).map(PathBuf::from);
    let Some(dir) = env_dir.as_deref().or(dir) else {
        let _ = registry.try_init();
        return;
    };
    let rotation = std::env::var(ENV_LOG_ROTATION)
        .ok()
        .or_else(|| rotation.map(str::to_string))
        .map(|raw| Rotation::parse(&raw))
        .unwrap_or_default();
    if std::fs::create_dir_all(dir).is_err() {
        tracing::warn!(directory = %dir.display(), "failed to create log directory");
    }
    let (writer, guard) = tracing_appender::non_blocking(rolling_writer(dir, rotation));
    let _ = FILE_GUARD.set(guard);
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(file_filter);
    let _ = registry.with(file_layer).try_init();
}

fn rolling_writer(dir: &Path, rotation: Rotation) -> tracing_appender::rolling::RollingFileAppender {
    match rotation {
        Rotation::Hourly => tracing_appender::rolling::hourly(dir, LOG_PREFIX),
        Rotation::Minutely => tracing_appender::rolling::minutely(dir, LOG_PREFIX),
        Rotation::Daily => tracing_appender::rolling::daily(dir, LOG_PREFIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_parsing_defaults_to_daily() {
        assert_eq!(Rotation::parse("HOURLY"), Rotation::Hourly);
        assert_eq!(Rotation::parse(" minutely "), Rotation::Minutely);
        assert_eq!(Rotation::parse("weekly"), Rotation::Daily);
        assert_eq!(Rotation::default(), Rotation::Daily);
    }

    #[test]
    fn rolling_file_is_created_under_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = rolling_writer(tmp.path(), Rotation::Daily);
        std::io::Write::write_all(&mut writer, b"line\n").unwrap();
        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with(LOG_PREFIX)), "{names:?}");
    }
}

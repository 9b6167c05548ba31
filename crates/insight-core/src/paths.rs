use crate::config::Config;
use insight_kernel::DB_FILE;
use std::path::{Path, PathBuf};

pub use insight_telemetry::ENV_LOG_DIR;

/// Rolling log directory: env, then config; `None` keeps logging console-only.
pub fn logs_dir(cfg: &Config) -> Option<PathBuf> {
    std::env::var_os(ENV_LOG_DIR)
        .map(PathBuf::from)
        .or_else(|| cfg.logging.dir.as_deref().map(PathBuf::from))
}

/// Effective state, database and log locations after env and config overlays.
/// An explicit `state_dir` (a command-line flag) wins over both.
pub fn effective_paths(cfg: &Config, state_dir: Option<&Path>) -> serde_json::Value {
    let norm = |p: PathBuf| p.to_string_lossy().replace('\\', "/");
    let state_dir = state_dir.map_or_else(|| cfg.state_dir(), Path::to_path_buf);
    serde_json::json!({
        "state_dir": norm(state_dir.clone()),
        "db_path": norm(state_dir.join(DB_FILE)),
        "logs_dir": logs_dir(cfg).map(norm),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_STATE_DIR;
    use crate::test_support::env;
    use serial_test::serial;

    #[test]
    #[serial]
    fn reports_env_overlays() {
        let mut scope = env::scoped(&[]);
        scope.set(ENV_STATE_DIR, "/srv/insight");
        scope.set(ENV_LOG_DIR, "/srv/insight/logs");
        let paths = effective_paths(&Config::default(), None);
        assert_eq!(paths["state_dir"], "/srv/insight");
        assert_eq!(paths["db_path"], "/srv/insight/insights.sqlite");
        assert_eq!(paths["logs_dir"], "/srv/insight/logs");
    }

    #[test]
    #[serial]
    fn explicit_state_dir_wins_and_logs_default_to_none() {
        let _scope = env::scoped(&[ENV_LOG_DIR]);
        let paths = effective_paths(&Config::default(), Some(Path::new("/opt/state")));
        assert_eq!(paths["state_dir"], "/opt/state");
        assert!(paths["logs_dir"].is_null());
    }
}

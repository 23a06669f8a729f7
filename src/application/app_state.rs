use crate::application::bootstrap::bootstrap_workspace;
use crate::application::interval_service::{IntervalService, PageLimits};
use crate::infrastructure::config::{ServerConfig, apply_server_overrides, load_server_config};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::interval_repository::{IntervalRepository, SqliteIntervalRepository};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const REQUEST_LOG_FILE: &str = "requests.log";

pub struct AppState {
    config: ServerConfig,
    logs_dir: PathBuf,
    service: IntervalService,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::new_with_lookup(workspace_root, |key| std::env::var(key).ok())
    }

    pub fn new_with_lookup<F>(workspace_root: PathBuf, lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config = apply_server_overrides(load_server_config(&bootstrap.config_dir)?, lookup)?;
        let repository = Arc::new(SqliteIntervalRepository::new(&bootstrap.database_path));

        Ok(Self::from_parts(config, repository, bootstrap.logs_dir))
    }

    pub fn from_parts(
        config: ServerConfig,
        repository: Arc<dyn IntervalRepository>,
        logs_dir: PathBuf,
    ) -> Self {
        let service = IntervalService::new(repository, PageLimits::from(&config));
        Self {
            config,
            logs_dir,
            service,
            log_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &IntervalService {
        &self.service
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn request_error(&self, operation: &str, error: &InfraError) -> String {
        self.log_error(operation, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, operation: &str, message: &str) {
        info!(operation, "{message}");
        self.append_log("info", operation, message);
    }

    pub fn log_error(&self, operation: &str, message: &str) {
        error!(operation, "{message}");
        self.append_log("error", operation, message);
    }

    fn append_log(&self, level: &str, operation: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join(REQUEST_LOG_FILE);
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "operation": operation,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "activity-app-state-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn new_bootstraps_workspace_layout() {
        let workspace = TempWorkspace::new();
        let state = AppState::new_with_lookup(workspace.path.clone(), |_| None).expect("app state");

        assert!(workspace.path.join("config").join("app.json").exists());
        assert!(workspace.path.join("state").join("activity.sqlite").exists());
        assert!(state.logs_dir().exists());
        assert_eq!(state.config(), &ServerConfig::default());
    }

    #[test]
    fn environment_overrides_reach_config() {
        let workspace = TempWorkspace::new();
        let state = AppState::new_with_lookup(workspace.path.clone(), |key| match key {
            "ACTIVITY_CORS_ORIGIN" => Some("https://tracker.example".to_string()),
            _ => None,
        })
        .expect("app state");
        assert_eq!(state.config().cors_allowed_origin, "https://tracker.example");
    }

    #[test]
    fn request_error_is_appended_to_log() {
        let workspace = TempWorkspace::new();
        let state = AppState::new_with_lookup(workspace.path.clone(), |_| None).expect("app state");

        let message = state.request_error(
            "create_interval",
            &InfraError::Validation("start must be less than end".to_string()),
        );
        assert_eq!(message, "start must be less than end");

        let log = fs::read_to_string(state.logs_dir().join(REQUEST_LOG_FILE)).expect("read log");
        let entry: serde_json::Value =
            serde_json::from_str(log.lines().last().expect("log line")).expect("json line");
        assert_eq!(entry["level"], "error");
        assert_eq!(entry["operation"], "create_interval");
        assert_eq!(entry["message"], "start must be less than end");
    }
}

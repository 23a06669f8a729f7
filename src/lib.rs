pub mod application;
pub mod domain;
pub mod infrastructure;

use application::app_state::AppState;
use application::http_api::serve;
use application::list_controller::IntervalListController;
use infrastructure::config::load_client_config_from_lookup;
use infrastructure::error::InfraError;
use infrastructure::intervals_client::ReqwestIntervalsClient;
use infrastructure::settings_store::FileViewSettingsStore;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Bootstraps the workspace in the current directory and serves the
/// interval API until shutdown.
pub async fn run() -> Result<(), InfraError> {
    init_tracing();
    let workspace_root = std::env::current_dir()?;
    let state = AppState::new(workspace_root)?;
    serve(Arc::new(state)).await
}

pub type DefaultListController = IntervalListController<ReqwestIntervalsClient, FileViewSettingsStore>;

/// Client-side list controller talking to the API named by
/// `ACTIVITY_API_BASE_URL`, with view settings kept under `settings_dir`.
pub fn list_controller_from_env(settings_dir: &Path) -> Result<DefaultListController, InfraError> {
    list_controller_from_lookup(settings_dir, |key| std::env::var(key).ok())
}

pub fn list_controller_from_lookup<F>(
    settings_dir: &Path,
    lookup: F,
) -> Result<DefaultListController, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    let client = ReqwestIntervalsClient::from_config(&load_client_config_from_lookup(lookup))?;
    Ok(IntervalListController::new(
        Arc::new(client),
        Arc::new(FileViewSettingsStore::new(settings_dir)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::list_controller::LOAD_FAILED_MESSAGE;
    use crate::domain::models::SortDirection;
    use crate::domain::view_settings::{SortItem, ViewSettings};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_SETTINGS_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempSettingsDir {
        path: PathBuf,
    }

    impl TempSettingsDir {
        fn new() -> Self {
            let sequence = NEXT_SETTINGS_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "activity-lib-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            std::fs::create_dir_all(&path).expect("create temp settings dir");
            Self { path }
        }
    }

    impl Drop for TempSettingsDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn unreachable_api(key: &str) -> Option<String> {
        match key {
            "ACTIVITY_API_BASE_URL" => Some("http://127.0.0.1:9/api/v1".to_string()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn lookup_controller_persists_settings_to_directory() {
        let dir = TempSettingsDir::new();
        let controller = list_controller_from_lookup(&dir.path, unreachable_api).expect("controller");
        assert_eq!(controller.settings(), ViewSettings::default());

        let settings = ViewSettings::new(4, 20, vec![SortItem::new("type", SortDirection::Desc)]);
        controller.load_items(settings.clone()).await;
        assert_eq!(controller.snapshot().error.as_deref(), Some(LOAD_FAILED_MESSAGE));
        assert!(dir.path.join("intervals_table_settings.json").exists());

        let reopened = list_controller_from_lookup(&dir.path, unreachable_api).expect("controller");
        assert_eq!(reopened.settings(), settings);
    }

    #[test]
    fn lookup_controller_rejects_invalid_base_url() {
        let dir = TempSettingsDir::new();
        let result = list_controller_from_lookup(&dir.path, |key| match key {
            "ACTIVITY_API_BASE_URL" => Some("not a url".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(InfraError::InvalidConfig(_))));
    }
}

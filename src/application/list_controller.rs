use crate::domain::models::{Interval, NewInterval};
use crate::domain::pagination::{current_range, total_pages};
use crate::domain::view_settings::{VIEW_SETTINGS_KEY, ViewSettings};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::intervals_client::IntervalsApi;
use crate::infrastructure::settings_store::ViewSettingsStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load intervals";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create interval";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ControllerError {
    pub message: String,
}

impl ControllerError {
    fn from_infra(error: &InfraError, fallback: &str) -> Self {
        Self {
            message: error.server_message().unwrap_or(fallback).to_string(),
        }
    }
}

/// Everything a table view needs to render the interval list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    /// Bumped on every transition.
    pub revision: u64,
    pub settings: ViewSettings,
    pub intervals: Vec<Interval>,
    pub total_elements: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub dialog_open: bool,
}

impl ListSnapshot {
    fn new(settings: ViewSettings) -> Self {
        Self {
            revision: 0,
            settings,
            intervals: Vec::new(),
            total_elements: 0,
            loading: false,
            error: None,
            dialog_open: false,
        }
    }
}

type Listener = Arc<dyn Fn(&ListSnapshot) + Send + Sync>;

pub struct IntervalListController<A, S>
where
    A: IntervalsApi + ?Sized,
    S: ViewSettingsStore + ?Sized,
{
    api: Arc<A>,
    store: Arc<S>,
    state: Mutex<ListSnapshot>,
    generation: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl<A, S> IntervalListController<A, S>
where
    A: IntervalsApi + ?Sized,
    S: ViewSettingsStore + ?Sized,
{
    /// Restores the persisted view settings, falling back to defaults.
    pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
        let settings = restore_settings(store.as_ref());
        Self {
            api,
            store,
            state: Mutex::new(ListSnapshot::new(settings)),
            generation: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Listeners run after the state lock is released, so snapshots from
    /// transitions on different threads may arrive out of order. Compare
    /// `revision` to keep the newest one.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&ListSnapshot) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    pub fn snapshot(&self) -> ListSnapshot {
        lock(&self.state).clone()
    }

    pub fn settings(&self) -> ViewSettings {
        lock(&self.state).settings.clone()
    }

    /// Replaces page, page size and sort in one step, then refetches.
    pub async fn load_items(&self, settings: ViewSettings) {
        let changed = self.update(|state| {
            if state.settings == settings {
                return false;
            }
            state.settings = settings.clone();
            true
        });
        if changed {
            self.persist(&settings);
        }
        self.fetch().await;
    }

    /// Only the most recently issued fetch applies its result.
    pub async fn fetch(&self) {
        let (generation, page, size, sort) = self.update(|state| {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
            (
                generation,
                state.settings.wire_page(),
                state.settings.items_per_page,
                state.settings.wire_sort(),
            )
        });

        let result = self.api.list_intervals(page, size, &sort).await;

        let applied = self.update_if(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &result {
                Ok(page) => {
                    state.intervals = page.intervals.clone();
                    state.total_elements = page.total_elements;
                }
                Err(error) => {
                    state.error = Some(ControllerError::from_infra(error, LOAD_FAILED_MESSAGE).message);
                    state.intervals.clear();
                    state.total_elements = 0;
                }
            }
            state.loading = false;
            true
        });

        match (&result, applied) {
            (_, false) => debug!(generation, "discarding stale interval list response"),
            (Err(error), true) => warn!(generation, %error, "fetching intervals failed"),
            (Ok(page), true) => debug!(
                generation,
                returned = page.intervals.len(),
                total = page.total_elements,
                "interval list refreshed"
            ),
        }
    }

    /// On failure the dialog stays open and the current list is kept.
    pub async fn add_interval(&self, data: NewInterval) -> Result<Interval, ControllerError> {
        match self.api.create_interval(&data).await {
            Ok(created) => {
                info!(id = %created.id, "interval added");
                self.fetch().await;
                self.close_dialog();
                Ok(created)
            }
            Err(error) => {
                warn!(%error, "adding interval failed");
                Err(ControllerError::from_infra(&error, CREATE_FAILED_MESSAGE))
            }
        }
    }

    pub fn open_dialog(&self) {
        self.update(|state| state.dialog_open = true);
    }

    pub fn close_dialog(&self) {
        self.update(|state| state.dialog_open = false);
    }

    pub fn clear_error(&self) {
        self.update(|state| state.error = None);
    }

    pub fn total_pages(&self) -> u64 {
        let state = lock(&self.state);
        total_pages(
            i64::try_from(state.total_elements).unwrap_or(i64::MAX),
            i64::from(state.settings.items_per_page),
        )
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).intervals.is_empty()
    }

    pub fn current_range(&self) -> String {
        let state = lock(&self.state);
        current_range(
            state.settings.page,
            state.settings.items_per_page,
            state.intervals.len(),
        )
    }

    fn persist(&self, settings: &ViewSettings) {
        let result = serde_json::to_string(settings)
            .map_err(InfraError::from)
            .and_then(|raw| self.store.save(VIEW_SETTINGS_KEY, &raw));
        if let Err(error) = result {
            warn!(%error, "failed to persist view settings");
        }
    }

    fn update<R>(&self, mutate: impl FnOnce(&mut ListSnapshot) -> R) -> R {
        let (result, snapshot) = {
            let mut state = lock(&self.state);
            let result = mutate(&mut state);
            state.revision += 1;
            (result, state.clone())
        };
        self.notify(&snapshot);
        result
    }

    fn update_if(&self, mutate: impl FnOnce(&mut ListSnapshot) -> bool) -> bool {
        let snapshot = {
            let mut state = lock(&self.state);
            if !mutate(&mut state) {
                return false;
            }
            state.revision += 1;
            state.clone()
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &ListSnapshot) {
        let listeners = lock(&self.listeners).clone();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn restore_settings<S>(store: &S) -> ViewSettings
where
    S: ViewSettingsStore + ?Sized,
{
    match store.load(VIEW_SETTINGS_KEY) {
        Ok(Some(raw)) => ViewSettings::parse(&raw).unwrap_or_else(|message| {
            warn!(%message, "stored view settings are malformed; using defaults");
            ViewSettings::default()
        }),
        Ok(None) => ViewSettings::default(),
        Err(error) => {
            warn!(%error, "failed to read view settings; using defaults");
            ViewSettings::default()
        }
    }
}

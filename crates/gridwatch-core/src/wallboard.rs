// ── Wallboard facade ──
//
// Full lifecycle management for one wallboard session. Owns the slot
// grid, the watch channels consumers render from, the persistence
// coordinator, and the background tasks (polling, debounced remote
// flush). Mutations come in from the UI thread, get applied under a
// short lock, and fan out as fresh snapshots — the render path never
// reaches into mutable state.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use gridwatch_api::GatewayClient;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::layout::{LayoutPreset, SlotGrid};
use crate::model::{DeviceId, DeviceSummary, InterfaceInfo, Slot};
use crate::persist::{self, PersistenceCoordinator, RemotePayload};
use crate::rate::TelemetrySnapshot;
use crate::scheduler::{self, PollInterval, PollSettings};

// ── GridView ────────────────────────────────────────────────────────

/// Immutable render snapshot of the slot grid, published through a
/// watch channel after every mutation.
#[derive(Debug, Clone)]
pub struct GridView {
    pub layout: LayoutPreset,
    pub slots: Vec<Option<Slot>>,
    pub page: usize,
    pub page_count: usize,
}

impl GridView {
    /// The active page's cells, zero-padded to the preset capacity.
    pub fn page_slots(&self) -> Vec<Option<&Slot>> {
        let capacity = self.layout.capacity();
        let start = self.page * capacity;
        (start..start + capacity)
            .map(|i| self.slots.get(i).and_then(Option::as_ref))
            .collect()
    }

    /// Translate a cell position on the active page to its global index.
    pub fn global_index(&self, cell: usize) -> usize {
        self.page * self.layout.capacity() + cell
    }
}

impl From<&SlotGrid> for GridView {
    fn from(grid: &SlotGrid) -> Self {
        Self {
            layout: grid.layout(),
            slots: grid.slots().to_vec(),
            page: grid.page(),
            page_count: grid.page_count(),
        }
    }
}

// ── Wallboard ───────────────────────────────────────────────────────

/// The main entry point for consumers. Cheaply cloneable via
/// `Arc<WallboardInner>`.
#[derive(Clone)]
pub struct Wallboard {
    inner: Arc<WallboardInner>,
}

struct WallboardInner {
    api: GatewayClient,
    /// Mutated only under short, non-await-holding sections from the UI
    /// flow; every other consumer reads watch snapshots.
    grid: Mutex<SlotGrid>,
    grid_tx: watch::Sender<GridView>,
    telemetry_tx: watch::Sender<Arc<TelemetrySnapshot>>,
    devices_tx: watch::Sender<Arc<Vec<DeviceSummary>>>,
    settings_tx: watch::Sender<PollSettings>,
    persist: PersistenceCoordinator,
    /// Handed to the flush task on start.
    pending_rx: Mutex<Option<watch::Receiver<Option<RemotePayload>>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Wallboard {
    /// Build a wallboard session. Reads the local config cache
    /// synchronously so the first render already shows the saved grid;
    /// call [`start()`](Self::start) to begin polling and remote sync.
    pub fn new(api: GatewayClient, cache_path: PathBuf, interval: PollInterval) -> Self {
        let (persist, pending_rx) = PersistenceCoordinator::new(cache_path);
        let grid = persist
            .load_local()
            .map_or_else(SlotGrid::default, SlotGrid::from_config);

        let (grid_tx, _) = watch::channel(GridView::from(&grid));
        let (telemetry_tx, _) = watch::channel(Arc::new(TelemetrySnapshot::default()));
        let (devices_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (settings_tx, _) = watch::channel(PollSettings {
            interval,
            ..PollSettings::default()
        });

        Self {
            inner: Arc::new(WallboardInner {
                api,
                grid: Mutex::new(grid),
                grid_tx,
                telemetry_tx,
                devices_tx,
                settings_tx,
                persist,
                pending_rx: Mutex::new(Some(pending_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background tasks: counter polling, the debounced
    /// remote flush, the authoritative remote config load, and the
    /// initial registry refresh. Must run inside a tokio runtime.
    pub fn start(&self) {
        let mut handles = lock(&self.inner.task_handles);

        handles.push(tokio::spawn(scheduler::poll_task(
            self.inner.api.clone(),
            self.inner.grid_tx.subscribe(),
            self.inner.settings_tx.subscribe(),
            self.inner.telemetry_tx.clone(),
            self.inner.cancel.clone(),
        )));

        if let Some(pending_rx) = lock(&self.inner.pending_rx).take() {
            handles.push(tokio::spawn(persist::remote_flush_task(
                self.inner.api.clone(),
                pending_rx,
                self.inner.cancel.clone(),
            )));
        }

        // Remote config overwrites the locally cached grid once it
        // resolves; a failed fetch leaves the local state standing.
        let wallboard = self.clone();
        handles.push(tokio::spawn(async move {
            match persist::load_remote(&wallboard.inner.api).await {
                Ok(Some(config)) => {
                    debug!("remote config loaded, replacing local state");
                    wallboard.apply_remote_config(config);
                }
                Ok(None) => debug!("no remote config saved yet"),
                Err(e) => debug!(error = %e, "remote config fetch failed, keeping local state"),
            }
        }));

        // Initial registry snapshot. Failure here is background noise —
        // the user can always trigger a loud manual refresh.
        let wallboard = self.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = wallboard.refresh_devices().await {
                warn!(error = %e, "initial device refresh failed");
            }
        }));
    }

    /// Cancel background tasks and wait for them to finish. The flush
    /// task performs its best-effort final write during this teardown.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = lock(&self.inner.task_handles).drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("wallboard session shut down");
    }

    fn apply_remote_config(&self, config: crate::model::PersistedConfig) {
        {
            let mut grid = lock(&self.inner.grid);
            *grid = SlotGrid::from_config(config.clone());
            let _ = self.inner.grid_tx.send(GridView::from(&*grid));
        }
        // Bring the cache in line without echoing back to remote.
        self.inner.persist.write_local(&config);
    }

    // ── Grid mutations ───────────────────────────────────────────────

    pub fn set_slot(&self, index: usize, slot: Slot) {
        self.mutate(true, |grid| grid.set_slot(index, slot));
    }

    pub fn clear_slot(&self, index: usize) {
        self.mutate(true, |grid| grid.clear_slot(index));
    }

    /// Exchange two global slot indices — the drag-drop commit.
    pub fn swap_slots(&self, i: usize, j: usize) {
        self.mutate(true, |grid| grid.swap(i, j));
    }

    pub fn set_layout(&self, preset: LayoutPreset) {
        self.mutate(true, |grid| grid.set_layout(preset));
    }

    // Page changes are view state only — published but never persisted.

    pub fn next_page(&self) {
        self.mutate(false, SlotGrid::next_page);
    }

    pub fn prev_page(&self) {
        self.mutate(false, SlotGrid::prev_page);
    }

    /// Apply a mutation under the grid lock, then publish the fresh
    /// view and (for config-bearing changes) record it for persistence.
    fn mutate<R>(&self, persist: bool, f: impl FnOnce(&mut SlotGrid) -> R) -> R {
        let (result, view, config) = {
            let mut grid = lock(&self.inner.grid);
            let result = f(&mut grid);
            (result, GridView::from(&*grid), grid.to_config())
        };
        let _ = self.inner.grid_tx.send(view);
        if persist {
            self.inner.persist.record(&config);
        }
        result
    }

    // ── Poll settings ────────────────────────────────────────────────

    pub fn set_interval(&self, interval: PollInterval) {
        self.inner
            .settings_tx
            .send_modify(|settings| settings.interval = interval);
    }

    pub fn toggle_pause(&self) {
        self.inner
            .settings_tx
            .send_modify(|settings| settings.paused = !settings.paused);
    }

    /// Track whether the wallboard is actually being watched. Poll
    /// cycles are skipped while invisible.
    pub fn set_visible(&self, visible: bool) {
        self.inner
            .settings_tx
            .send_modify(|settings| settings.visible = visible);
    }

    pub fn settings(&self) -> PollSettings {
        *self.inner.settings_tx.borrow()
    }

    // ── Foreground operations (fail loudly) ──────────────────────────

    /// Re-fetch the device registry. This is the explicit refresh that
    /// confirms removals: slots bound to devices the registry no longer
    /// lists are cleared. Returns how many were cleared.
    pub async fn refresh_devices(&self) -> Result<usize, CoreError> {
        let records = self.inner.api.list_devices().await?;
        let devices: Vec<DeviceSummary> = records.into_iter().map(DeviceSummary::from).collect();
        let live: HashSet<DeviceId> = devices.iter().map(|d| d.id.clone()).collect();
        info!(count = devices.len(), "device registry refreshed");
        let _ = self.inner.devices_tx.send(Arc::new(devices));

        let cleared = {
            let mut grid = lock(&self.inner.grid);
            grid.prune_missing(&live)
        };
        if cleared > 0 {
            info!(cleared, "cleared slots bound to removed devices");
            self.mutate(true, |_| ());
        }
        Ok(cleared)
    }

    /// Interface discovery for the slot picker.
    pub async fn list_interfaces(&self, device: &DeviceId) -> Result<Vec<InterfaceInfo>, CoreError> {
        let records = self.inner.api.list_interfaces(device.as_str()).await?;
        Ok(records.into_iter().map(InterfaceInfo::from).collect())
    }

    /// Push the current config to the remote store immediately,
    /// bypassing the debounce window. Deliberate action — fails loudly.
    pub async fn sync_now(&self) -> Result<(), CoreError> {
        let config = lock(&self.inner.grid).to_config();
        persist::sync_remote(&self.inner.api, &config).await?;
        self.inner.persist.write_local(&config);
        Ok(())
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn grid_view(&self) -> GridView {
        self.inner.grid_tx.borrow().clone()
    }

    pub fn subscribe_grid(&self) -> watch::Receiver<GridView> {
        self.inner.grid_tx.subscribe()
    }

    pub fn telemetry(&self) -> Arc<TelemetrySnapshot> {
        self.inner.telemetry_tx.borrow().clone()
    }

    pub fn subscribe_telemetry(&self) -> watch::Receiver<Arc<TelemetrySnapshot>> {
        self.inner.telemetry_tx.subscribe()
    }

    pub fn devices(&self) -> Arc<Vec<DeviceSummary>> {
        self.inner.devices_tx.borrow().clone()
    }

    pub fn subscribe_devices(&self) -> watch::Receiver<Arc<Vec<DeviceSummary>>> {
        self.inner.devices_tx.subscribe()
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<PollSettings> {
        self.inner.settings_tx.subscribe()
    }
}

/// Lock a std mutex, recovering from poisoning — a panicked writer
/// leaves the grid in a consistent state because every mutation is a
/// single in-place operation.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Persistence coordinator ──
//
// Two independent channels hold the same PersistedConfig: a local cache
// file written synchronously on every mutation (fast, possibly stale
// relative to other sessions), and the remote settings store written
// through a debounced flush (authoritative, shared). Load order is
// local-first for instant render, remote-overwrite once it resolves.
// All background persistence failures are swallowed; the wallboard must
// stay usable with storage unreachable.

use std::path::PathBuf;
use std::time::Duration;

use gridwatch_api::GatewayClient;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;
use crate::model::PersistedConfig;

/// Settings-store key holding the serialized layout preset token.
pub const LAYOUT_KEY: &str = "wallboard.layout";

/// Settings-store key holding the serialized slots array.
pub const SLOTS_KEY: &str = "wallboard.slots";

const LAYOUT_DESCRIPTION: &str = "wallboard grid layout preset";
const SLOTS_DESCRIPTION: &str = "wallboard slot assignments";

/// Quiet window after the last edit before the remote write fires.
/// Collapses a burst of edits into one write.
pub(crate) const REMOTE_DEBOUNCE: Duration = Duration::from_millis(700);

// ── Remote payload ──────────────────────────────────────────────────

/// The serialized form that actually crosses the wire. Compared for
/// byte-identity against the last successful write so redundant flushes
/// are skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemotePayload {
    layout: String,
    slots: String,
}

impl RemotePayload {
    fn from_config(config: &PersistedConfig) -> serde_json::Result<Self> {
        Ok(Self {
            layout: config.layout_token(),
            slots: config.slots_json()?,
        })
    }

    async fn write(&self, api: &GatewayClient) -> Result<(), gridwatch_api::Error> {
        api.put_setting(LAYOUT_KEY, &self.layout, Some(LAYOUT_DESCRIPTION))
            .await?;
        api.put_setting(SLOTS_KEY, &self.slots, Some(SLOTS_DESCRIPTION))
            .await
    }
}

// ── Coordinator ─────────────────────────────────────────────────────

/// Front half of the two-stage pipeline: synchronous local write plus
/// scheduling of the debounced remote write. The back half is
/// [`remote_flush_task`], which consumes the pending-payload channel.
pub(crate) struct PersistenceCoordinator {
    cache_path: PathBuf,
    pending_tx: watch::Sender<Option<RemotePayload>>,
}

impl PersistenceCoordinator {
    pub(crate) fn new(cache_path: PathBuf) -> (Self, watch::Receiver<Option<RemotePayload>>) {
        let (pending_tx, pending_rx) = watch::channel(None);
        (
            Self {
                cache_path,
                pending_tx,
            },
            pending_rx,
        )
    }

    /// Record a config mutation: immediate local write, remote write
    /// scheduled behind the debounce window. Never fails — local I/O
    /// errors are logged and retried implicitly on the next mutation.
    pub(crate) fn record(&self, config: &PersistedConfig) {
        self.write_local(config);

        match RemotePayload::from_config(config) {
            Ok(payload) => {
                let _ = self.pending_tx.send(Some(payload));
            }
            Err(e) => debug!(error = %e, "config serialization failed, remote write skipped"),
        }
    }

    /// Local-only write, used when remote state is the source (applying
    /// a freshly fetched remote config must not echo it back).
    pub(crate) fn write_local(&self, config: &PersistedConfig) {
        let raw = match config.to_local_json() {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "config serialization failed, local write skipped");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.cache_path, raw) {
            debug!(path = %self.cache_path.display(), error = %e, "local cache write failed");
        }
    }

    /// Read the local cache. Always available synchronously; a missing
    /// or corrupt file is simply no config.
    pub(crate) fn load_local(&self) -> Option<PersistedConfig> {
        let raw = std::fs::read_to_string(&self.cache_path).ok()?;
        PersistedConfig::from_local_json(&raw)
    }
}

/// Fetch the authoritative remote config from the two settings keys.
/// `Ok(None)` when nothing was ever saved.
pub(crate) async fn load_remote(api: &GatewayClient) -> Result<Option<PersistedConfig>, CoreError> {
    let layout = api.get_setting(LAYOUT_KEY).await?;
    let slots = api.get_setting(SLOTS_KEY).await?;
    Ok(PersistedConfig::from_settings(
        layout.as_deref(),
        slots.as_deref(),
    ))
}

/// Immediate remote write for the user-facing "sync now" action.
/// Unlike the background flush this propagates failures — a deliberate
/// action fails loudly.
pub(crate) async fn sync_remote(
    api: &GatewayClient,
    config: &PersistedConfig,
) -> Result<(), CoreError> {
    let payload = RemotePayload::from_config(config)?;
    payload.write(api).await?;
    Ok(())
}

// ── Debounced flush task ────────────────────────────────────────────

/// Back half of the pipeline: waits for a pending payload, lets the
/// debounce window absorb further edits (every new edit restarts the
/// timer), then writes — unless the payload is byte-identical to the
/// last successful write. On cancellation a final best-effort flush
/// runs so the last edit is not lost to the debounce window.
pub(crate) async fn remote_flush_task(
    api: GatewayClient,
    mut pending_rx: watch::Receiver<Option<RemotePayload>>,
    cancel: CancellationToken,
) {
    let mut last_written: Option<RemotePayload> = None;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let pending = pending_rx.borrow().clone();
                flush(&api, pending, &mut last_written).await;
                break;
            }
            changed = pending_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            let pending = pending_rx.borrow_and_update().clone();
                            flush(&api, pending, &mut last_written).await;
                            return;
                        }
                        Ok(()) = pending_rx.changed() => {
                            // Another edit inside the window — restart it.
                        }
                        () = tokio::time::sleep(REMOTE_DEBOUNCE) => break,
                    }
                }
                let pending = pending_rx.borrow_and_update().clone();
                flush(&api, pending, &mut last_written).await;
            }
        }
    }

    debug!("remote flush task shut down");
}

async fn flush(
    api: &GatewayClient,
    pending: Option<RemotePayload>,
    last_written: &mut Option<RemotePayload>,
) {
    let Some(payload) = pending else { return };
    if last_written.as_ref() == Some(&payload) {
        return;
    }

    match payload.write(api).await {
        Ok(()) => *last_written = Some(payload),
        Err(e) => {
            // Retried when the next mutation schedules a new flush.
            debug!(error = %e, "remote config write failed");
        }
    }
}

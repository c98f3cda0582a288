//! Per-path watch state, per-retrieval leases and the background observer
//!
//! Each watched path has one [`WatchState`] owned by the source and one
//! observer task. Every observed change bumps the state's content version.
//! Each retrieval holds a [`WatchLease`] recording the version it read, so a
//! change is reported to every retrieval older than it, no matter who waits
//! or re-reads first.
//!
//! ```text
//! Idle --wait--> Watching --version > seen--> Updated --> Idle
//!                         --close-----------> Closed (permanent)
//! ```

use async_trait::async_trait;
use confsource_core::{Error, Result, WatchSignal, Watchable};
use confsource_fs::Fingerprint;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, Span};

/// With filesystem events available, polling only runs every this many
/// intervals to catch events the platform dropped.
const EVENT_FALLBACK_FACTOR: u32 = 8;

/// Where a retrieval's watch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// No caller is waiting.
    Idle,
    /// One caller is blocked in `wait_for_update`.
    Watching,
    /// The owning source was closed.
    Closed,
}

#[derive(Debug)]
struct Inner {
    closed: bool,
    version: u64,
    baseline: Fingerprint,
}

/// Watch state of one path, shared by every retrieval of it.
#[derive(Debug)]
pub struct WatchState {
    path: PathBuf,
    inner: Mutex<Inner>,
    notify: Notify,
}

impl WatchState {
    pub fn new(path: impl Into<PathBuf>, baseline: Fingerprint) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            inner: Mutex::new(Inner {
                closed: false,
                version: 0,
                baseline,
            }),
            notify: Notify::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of changes seen since the state was created.
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Record an observation. Returns true when it differs from the baseline.
    pub fn observe(&self, current: Fingerprint) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed || inner.baseline == current {
                return false;
            }
            inner.baseline = current;
            inner.version += 1;
        }
        self.notify.notify_waiters();
        true
    }

    /// Move the baseline to content a caller has just read and return the
    /// version that content corresponds to.
    ///
    /// Content the observer has not seen yet still counts as a change for
    /// older retrievals.
    pub fn rebase(&self, current: Fingerprint) -> u64 {
        let version = {
            let mut inner = self.inner.lock();
            if inner.closed || inner.baseline == current {
                return inner.version;
            }
            inner.baseline = current;
            inner.version += 1;
            inner.version
        };
        self.notify.notify_waiters();
        version
    }

    /// Mark closed and release every waiter. Idempotent.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Wait until the version passes `seen`. `None` once closed.
    async fn changed_since(&self, seen: u64) -> Option<u64> {
        loop {
            // Register interest before checking so a notification between
            // the check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let inner = self.inner.lock();
                if inner.closed {
                    return None;
                }
                if inner.version > seen {
                    return Some(inner.version);
                }
            }

            notified.await;
        }
    }
}

/// Runs once when the last clone of a lease's handle is dropped.
pub(crate) type Release = Box<dyn FnOnce() + Send + Sync>;

/// One retrieval's view of a [`WatchState`].
///
/// Holds the state weakly: the source owns it. At most one caller waits on a
/// lease at a time; a second concurrent waiter is rejected with
/// [`Error::WatchInProgress`].
pub struct WatchLease {
    state: Weak<WatchState>,
    seen: AtomicU64,
    waiting: AtomicBool,
    release: Option<Release>,
}

impl WatchLease {
    pub fn new(state: &Arc<WatchState>, seen: u64) -> Self {
        Self {
            state: Arc::downgrade(state),
            seen: AtomicU64::new(seen),
            waiting: AtomicBool::new(false),
            release: None,
        }
    }

    pub(crate) fn with_release(mut self, release: Release) -> Self {
        self.release = Some(release);
        self
    }

    /// Version of the content this lease last reported.
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> WatchPhase {
        match self.state.upgrade() {
            Some(state) if !state.is_closed() => {
                if self.waiting.load(Ordering::Acquire) {
                    WatchPhase::Watching
                } else {
                    WatchPhase::Idle
                }
            }
            _ => WatchPhase::Closed,
        }
    }

    fn claim(&self, path: &Path) -> Result<WaiterSlot<'_>> {
        self.waiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::WatchInProgress {
                path: path.to_path_buf(),
            })?;
        Ok(WaiterSlot {
            waiting: &self.waiting,
        })
    }
}

#[async_trait]
impl Watchable for WatchLease {
    async fn wait_for_update(&self) -> Result<WatchSignal> {
        let Some(state) = self.state.upgrade() else {
            return Ok(WatchSignal::Closed);
        };
        if state.is_closed() {
            return Ok(WatchSignal::Closed);
        }
        let _slot = self.claim(state.path())?;

        match state.changed_since(self.seen()).await {
            Some(version) => {
                self.seen.fetch_max(version, Ordering::AcqRel);
                Ok(WatchSignal::Updated)
            }
            None => Ok(WatchSignal::Closed),
        }
    }
}

impl fmt::Debug for WatchLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLease")
            .field("seen", &self.seen())
            .field("phase", &self.phase())
            .finish()
    }
}

impl Drop for WatchLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Frees the lease's single waiter slot when the wait ends or is dropped.
struct WaiterSlot<'a> {
    waiting: &'a AtomicBool,
}

impl Drop for WaiterSlot<'_> {
    fn drop(&mut self) {
        self.waiting.store(false, Ordering::Release);
    }
}

/// Forward filesystem events touching `path` to `events`.
fn watch_events(path: &Path, events: mpsc::UnboundedSender<()>) -> notify::Result<RecommendedWatcher> {
    let Some(dir) = path.parent() else {
        return Err(notify::Error::generic("watched path has no parent directory"));
    };
    let name = path.file_name().map(OsString::from);

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let relevant = match &event {
            Ok(event) => event
                .paths
                .iter()
                .any(|p| p.file_name() == name.as_deref()),
            Err(_) => true,
        };
        if relevant {
            let _ = events.send(());
        }
    })?;
    // The directory, not the file: editors replace files by rename.
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Spawn the observer for `state`'s file.
///
/// Checks run on filesystem events and on a timer: every `interval` when
/// events are unavailable, less often when they are. Stops when `shutdown`
/// flips to true or its sender is dropped.
pub(crate) fn spawn_observer(
    state: Arc<WatchState>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    span: Span,
) -> JoinHandle<()> {
    let task = async move {
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let watcher = match watch_events(state.path(), events_tx) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::debug!(path = ?state.path(), error = %e, "Filesystem events unavailable, polling");
                None
            }
        };
        let period = match watcher {
            Some(_) => interval.saturating_mul(EVENT_FALLBACK_FACTOR),
            None => interval,
        };

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
                Some(()) = events.recv() => {
                    while events.try_recv().is_ok() {}
                }
            }
            if *shutdown.borrow() {
                break;
            }

            let observed = Fingerprint::from_read(tokio::fs::read(state.path()).await);
            match observed {
                Ok(current) => {
                    if state.observe(current) {
                        tracing::debug!(path = ?state.path(), "Watched file changed");
                    }
                }
                Err(e) => {
                    tracing::warn!(path = ?state.path(), error = %e, "Failed to check watched file");
                }
            }
        }
    };

    tokio::spawn(task.instrument(span))
}

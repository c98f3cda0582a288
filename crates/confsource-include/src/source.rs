//! The include config source

use crate::settings::IncludeSettings;
use crate::template;
use crate::watch::{self, Release, WatchLease, WatchState};
use async_trait::async_trait;
use confsource_core::{ConfigSource, Error, Params, Result, Retrieved, WatchHandle};
use confsource_fs::{Fingerprint, io};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::watch as signal;
use tokio::task::JoinHandle;
use tracing::Span;

/// A watched path: its state, its observer and how many leases are live.
struct Watched {
    state: Arc<WatchState>,
    observer: JoinHandle<()>,
    leases: usize,
}

/// Resources owned by one session, from construction until `close`.
#[derive(Default)]
struct Session {
    closed: bool,
    watches: HashMap<PathBuf, Watched>,
}

/// Session state reachable from leases, which hold it weakly.
struct Shared {
    span: Span,
    session: Mutex<Session>,
}

impl Shared {
    /// Drop one lease on `key`; stop watching once none are left.
    fn release(&self, key: &Path, state: &Weak<WatchState>) {
        let mut session = self.session.lock();
        let Some(watched) = session.watches.get_mut(key) else {
            return;
        };
        if !std::ptr::eq(Arc::as_ptr(&watched.state), state.as_ptr()) {
            return;
        }
        watched.leases = watched.leases.saturating_sub(1);
        if watched.leases > 0 {
            return;
        }

        if let Some(watched) = session.watches.remove(key) {
            watched.observer.abort();
            watched.state.close();
            tracing::debug!(parent: &self.span, path = ?key, "Stopped watching included file");
        }
    }
}

/// Config source resolving selectors to file content.
///
/// Watch states are keyed by canonical path and shared by every retrieval of
/// the same file. The source owns them and their observers; a path stops
/// being watched when the last retrieved value referring to it is dropped.
pub struct IncludeSource {
    settings: IncludeSettings,
    shared: Arc<Shared>,
    shutdown: signal::Sender<bool>,
}

impl IncludeSource {
    pub fn new(settings: IncludeSettings, span: Span) -> Self {
        if settings.watch_files && settings.delete_files {
            tracing::warn!(parent: &span, "delete_files is set; included files will not be watched");
        }
        let (shutdown, _) = signal::channel(false);
        Self {
            settings,
            shared: Arc::new(Shared {
                span,
                session: Mutex::new(Session::default()),
            }),
            shutdown,
        }
    }

    pub fn settings(&self) -> &IncludeSettings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.shared.session.lock().closed
    }

    /// Number of paths currently watched.
    pub fn watched_paths(&self) -> usize {
        self.shared.session.lock().watches.len()
    }

    /// Take a lease on the watch state for `path`, creating it if needed.
    fn lease(&self, path: &Path, raw: &[u8]) -> Result<WatchLease> {
        let key = io::canonical_key(path);
        let fingerprint = Fingerprint::of_bytes(raw);

        let mut session = self.shared.session.lock();
        if session.closed {
            return Err(Error::SourceClosed);
        }

        let watched = match session.watches.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let state = WatchState::new(key.clone(), fingerprint.clone());
                let observer = watch::spawn_observer(
                    Arc::clone(&state),
                    self.settings.poll_interval(),
                    self.shutdown.subscribe(),
                    self.shared.span.clone(),
                );
                tracing::debug!(parent: &self.shared.span, path = ?key, "Watching included file");
                entry.insert(Watched {
                    state,
                    observer,
                    leases: 0,
                })
            }
        };

        let seen = watched.state.rebase(fingerprint);
        watched.leases += 1;
        let release = release_fn(
            Arc::downgrade(&self.shared),
            key,
            Arc::downgrade(&watched.state),
        );
        Ok(WatchLease::new(&watched.state, seen).with_release(release))
    }
}

fn release_fn(shared: Weak<Shared>, key: PathBuf, state: Weak<WatchState>) -> Release {
    Box::new(move || {
        if let Some(shared) = shared.upgrade() {
            shared.release(&key, &state);
        }
    })
}

#[async_trait]
impl ConfigSource for IncludeSource {
    async fn retrieve(&self, selector: &str, params: &Params) -> Result<Retrieved> {
        if self.is_closed() {
            return Err(Error::SourceClosed);
        }

        let path = Path::new(selector);
        let raw = io::read_bytes(path)?;
        let value = template::render(path, &raw, params, self.settings.template)?;

        if self.settings.delete_files {
            io::remove_file(path).map_err(Error::delete_failed)?;
            tracing::debug!(parent: &self.shared.span, ?path, "Deleted included file after read");
            return Ok(Retrieved::new(value));
        }

        if !self.settings.watch_files {
            return Ok(Retrieved::new(value));
        }

        let lease = self.lease(path, &raw)?;
        Ok(Retrieved::watched(value, WatchHandle::new(lease)))
    }

    async fn close(&self) -> Result<()> {
        // Teardown order: mark closed, stop observers, release waiters, join.
        let watches = {
            let mut session = self.shared.session.lock();
            if session.closed {
                return Ok(());
            }
            session.closed = true;
            std::mem::take(&mut session.watches)
        };

        self.shutdown.send_replace(true);
        for watched in watches.values() {
            watched.state.close();
        }
        let count = watches.len();
        for (_, watched) in watches {
            if let Err(e) = watched.observer.await {
                tracing::warn!(parent: &self.shared.span, error = %e, "Observer task failed");
            }
        }

        tracing::debug!(parent: &self.shared.span, watched = count, "Closed include config source");
        Ok(())
    }
}

impl Drop for IncludeSource {
    fn drop(&mut self) {
        // Observers also stop once the sender is gone; abort so none outlive us.
        self.shutdown.send_replace(true);
        let watches = std::mem::take(&mut self.shared.session.lock().watches);
        for (_, watched) in watches {
            watched.state.close();
            watched.observer.abort();
        }
    }
}

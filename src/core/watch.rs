//! Purpose: File-change notification seam and its `notify`-backed implementation.
//! Exports: `WatchService`, `NotifyWatch`, `Subscription`, `ChangeFn`.
//! Role: Lets a bag reload when its backing file changes; tests plug in a manual service.
//! Invariants: Callbacks run on the service's own thread, never the caller's.
//! Invariants: Dropping a `Subscription` stops delivery for that watch.
//! Notes: The parent directory is watched so rename-based atomic writes are observed.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::error::{Error, ErrorKind};

/// Invoked with the watched path after its contents change.
pub type ChangeFn = Box<dyn Fn(&Path) + Send + Sync>;

pub trait WatchService: Send + Sync {
    fn watch(&self, path: &Path, on_change: ChangeFn) -> Result<Subscription, Error>;
}

/// Keeps a watch alive; dropping it ends the watch.
pub struct Subscription {
    _guard: Box<dyn Send>,
}

impl Subscription {
    pub fn new(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NotifyWatch;

impl WatchService for NotifyWatch {
    fn watch(&self, path: &Path, on_change: ChangeFn) -> Result<Subscription, Error> {
        let target = std::path::absolute(path)
            .map_err(|err| Error::io(err, path, "failed to resolve watched path"))?;
        let (dir, file_name) = split_target(&target)?;

        let watched = target.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if is_content_change(&event.kind) && touches(&event, &file_name) {
                        debug!(path = %watched.display(), kind = ?event.kind, "params file changed");
                        on_change(&watched);
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            }
        })
        .map_err(|err| watch_error(err, &target))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|err| watch_error(err, &dir))?;
        Ok(Subscription::new(watcher))
    }
}

fn split_target(target: &Path) -> Result<(PathBuf, OsString), Error> {
    match (target.parent(), target.file_name()) {
        (Some(dir), Some(name)) => Ok((dir.to_path_buf(), name.to_os_string())),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("watched path must name a file")
            .with_path(target)),
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

fn watch_error(err: notify::Error, path: &Path) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to watch params file")
        .with_path(path)
        .with_source(err)
}

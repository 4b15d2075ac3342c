//! Purpose: The parameter registry: names to handles, backing file, and hot reload.
//! Exports: `Bag`, `BagOptions`, `WatchConfig`, `LoadReport`, `LoadStatus`, `ChangeEvent`, `global`.
//! Role: Owns the name→handle map; saves, loads, and reacts to file changes.
//! Invariants: Names are unique within a bag; duplicate registration is rejected.
//! Invariants: The map lock is never held while decoding or running callbacks.
//! Invariants: `load` applies an entry only while its parameter is still registered under the same id.
//! Invariants: `ParamId`s are unique across every bag in the process.
//! Invariants: A parse failure aborts `load` before any parameter is touched.
//! Invariants: The backing file is created when missing and never deleted here.
//! Notes: Reload callbacks run on the watcher thread; use `subscribe` to hand changes to another thread.
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, mpsc};

use parking_lot::Mutex;
use serde_json::Map;
use tracing::{debug, warn};

use super::document::Document;
use super::error::{Error, ErrorKind};
use super::kind::{Kind, ParamKind, ParamValue};
use super::param::{Handle, LiveParam, ParamId, Registration, UpdateFn, noop};
use super::watch::{NotifyWatch, Subscription, WatchService};
use crate::notice::{Notice, NoticeKind};
use crate::params_paths::params_path_from_env;

#[derive(Clone, Default)]
pub enum WatchConfig {
    Disabled,
    #[default]
    Notify,
    Service(Arc<dyn WatchService>),
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchConfig::Disabled => f.write_str("Disabled"),
            WatchConfig::Notify => f.write_str("Notify"),
            WatchConfig::Service(_) => f.write_str("Service"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BagOptions {
    path: PathBuf,
    watch: WatchConfig,
}

impl BagOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watch: WatchConfig::default(),
        }
    }

    /// Uses `LIVEPARAM_PATH`, then `LIVEPARAM_DIR`, then `assets/`.
    pub fn from_env() -> Self {
        Self::new(params_path_from_env())
    }

    pub fn without_watch(mut self) -> Self {
        self.watch = WatchConfig::Disabled;
        self
    }

    pub fn with_watch_service(mut self, service: Arc<dyn WatchService>) -> Self {
        self.watch = WatchConfig::Service(service);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One value change applied by `load`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub name: String,
    pub value: ParamValue,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadStatus {
    Loaded,
    /// The backing file does not exist; nothing was loaded.
    Missing,
}

#[derive(Clone, Debug)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    pub notices: Vec<Notice>,
}

impl LoadReport {
    fn new(status: LoadStatus) -> Self {
        Self {
            status,
            changed: Vec::new(),
            unchanged: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }
}

struct Entry {
    id: ParamId,
    handle: Handle,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct BagShared {
    path: PathBuf,
    items: Mutex<HashMap<String, Entry>>,
    subscribers: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl BagShared {
    pub(crate) fn remove_target(&self, id: ParamId) -> bool {
        let mut items = self.items.lock();
        let name = items
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(name, _)| name.clone());
        match name {
            Some(name) => {
                items.remove(&name);
                debug!(param = %name, %id, "param unregistered");
                true
            }
            None => {
                warn!(
                    kind = NoticeKind::UnknownTarget.as_str(),
                    %id,
                    "remove target not found"
                );
                false
            }
        }
    }

    fn is_current(&self, name: &str, id: ParamId) -> bool {
        self.items
            .lock()
            .get(name)
            .is_some_and(|entry| entry.id == id)
    }

    fn entries(&self) -> HashMap<String, (ParamId, Handle)> {
        self.items
            .lock()
            .iter()
            .map(|(name, entry)| (name.clone(), (entry.id, entry.handle.clone())))
            .collect()
    }

    fn handles(&self) -> Vec<(String, Handle)> {
        let items = self.items.lock();
        let mut handles: Vec<(String, Handle)> = items
            .iter()
            .map(|(name, entry)| (name.clone(), entry.handle.clone()))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }

    fn load(&self) -> Result<LoadReport, Error> {
        let Some(document) = Document::read(&self.path)? else {
            debug!(path = %self.path.display(), "params file missing; nothing to load");
            return Ok(LoadReport::new(LoadStatus::Missing));
        };
        let registered = self.entries();

        let mut report = LoadReport::new(LoadStatus::Loaded);
        for (name, entry) in document.entries() {
            let Some((id, handle)) = registered.get(name) else {
                push_notice(
                    &mut report,
                    Notice::new(
                        NoticeKind::UnknownParam,
                        format!("no parameter named '{name}'"),
                    )
                    .with_param(name),
                );
                continue;
            };
            // Callbacks for earlier entries may have dropped this one.
            if !self.is_current(name, *id) {
                debug!(param = %name, %id, "param unregistered during load; skipped");
                continue;
            }
            match handle.decode(name, entry) {
                Ok(true) => {
                    report.changed.push(name.to_string());
                    self.publish(ChangeEvent {
                        name: name.to_string(),
                        value: handle.value(),
                    });
                }
                Ok(false) => report.unchanged.push(name.to_string()),
                Err(err) => {
                    let message = err.message().unwrap_or("decode failed").to_string();
                    push_notice(
                        &mut report,
                        Notice::new(NoticeKind::Mismatch, message).with_param(name),
                    );
                }
            }
        }
        debug!(
            path = %self.path.display(),
            changed = report.changed.len(),
            unchanged = report.unchanged.len(),
            notices = report.notices.len(),
            "params loaded"
        );
        Ok(report)
    }

    fn reload(&self) {
        if let Err(err) = self.load() {
            warn!(error = %err, "params reload failed");
        }
    }

    fn publish(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn push_notice(report: &mut LoadReport, notice: Notice) {
    warn!(
        kind = notice.kind.as_str(),
        param = notice.param.as_deref().unwrap_or(""),
        "{}",
        notice.message
    );
    report.notices.push(notice);
}

/// A registry of live parameters bound to one backing file.
///
/// Cloning is cheap and every clone refers to the same registry. Cells hold
/// only a weak reference, so dropping every `Bag` clone ends the watch and
/// turns later cell drops into no-ops.
#[derive(Clone)]
pub struct Bag {
    shared: Arc<BagShared>,
}

impl Bag {
    /// Opens a bag, creating an empty backing file if none exists.
    ///
    /// Failing to create the file is an error. Failing to start the watch is
    /// logged and the bag works without automatic reload.
    pub fn open(options: BagOptions) -> Result<Self, Error> {
        let BagOptions { path, watch } = options;
        ensure_backing_file(&path)?;

        let shared = Arc::new(BagShared {
            path,
            items: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
        });

        let service: Option<Arc<dyn WatchService>> = match watch {
            WatchConfig::Disabled => None,
            WatchConfig::Notify => Some(Arc::new(NotifyWatch)),
            WatchConfig::Service(service) => Some(service),
        };
        if let Some(service) = service {
            let weak = Arc::downgrade(&shared);
            let on_change = Box::new(move |_: &Path| {
                if let Some(shared) = weak.upgrade() {
                    shared.reload();
                }
            });
            match service.watch(&shared.path, on_change) {
                Ok(subscription) => *shared.subscription.lock() = Some(subscription),
                Err(err) => warn!(error = %err, "params file watch unavailable"),
            }
        }

        Ok(Self { shared })
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn is_watching(&self) -> bool {
        self.shared.subscription.lock().is_some()
    }

    /// Registers `param` under `name` with no update callback.
    pub fn add<T: ParamKind>(&self, param: &mut LiveParam<T>, name: &str) -> Result<ParamId, Error> {
        self.register(param, name, noop())
    }

    /// Registers `param` under `name`; `on_update` runs each time a load
    /// changes its value. Watcher-driven loads run it on the watcher thread.
    pub fn add_with<T: ParamKind>(
        &self,
        param: &mut LiveParam<T>,
        name: &str,
        on_update: impl Fn() + Send + Sync + 'static,
    ) -> Result<ParamId, Error> {
        self.register(param, name, Arc::new(on_update))
    }

    fn register<T: ParamKind>(
        &self,
        param: &mut LiveParam<T>,
        name: &str,
        on_update: UpdateFn,
    ) -> Result<ParamId, Error> {
        if let Some(existing) = param.name() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("param is already registered as '{existing}'"))
                .with_param(name));
        }
        let mut items = self.shared.items.lock();
        if items.contains_key(name) {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("a parameter with this name is already registered")
                .with_param(name)
                .with_hint("Parameter names must be unique within a bag."));
        }
        let id = ParamId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        param.bind(
            Registration {
                bag: Arc::downgrade(&self.shared),
                id,
                name: name.to_string(),
            },
            on_update,
        );
        items.insert(
            name.to_string(),
            Entry {
                id,
                handle: param.handle(),
            },
        );
        debug!(param = %name, kind = T::KIND.as_str(), %id, "param registered");
        Ok(id)
    }

    /// Writes every registered parameter to the backing file, sorted by name.
    pub fn save(&self) -> Result<(), Error> {
        let document = self.document();
        document.write_atomic(&self.shared.path)?;
        debug!(path = %self.shared.path.display(), params = document.len(), "params saved");
        Ok(())
    }

    /// The document `save` would write, without touching the file.
    pub fn document(&self) -> Document {
        let mut params = Map::new();
        for (name, handle) in self.shared.handles() {
            handle.encode(&name, &mut params);
        }
        let mut document = Document::new();
        *document.params_mut() = params;
        document
    }

    /// Reads the backing file and applies every entry that matches a
    /// registered parameter. Callbacks run on the calling thread.
    pub fn load(&self) -> Result<LoadReport, Error> {
        self.shared.load()
    }

    /// Receives every change applied by `load`, from any thread.
    pub fn subscribe(&self) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    pub fn names(&self) -> Vec<String> {
        self.shared
            .handles()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shared.items.lock().contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.shared
            .items
            .lock()
            .get(name)
            .map(|entry| entry.handle.kind())
    }

    pub fn value_of(&self, name: &str) -> Option<ParamValue> {
        let handle = self.shared.items.lock().get(name)?.handle.clone();
        Some(handle.value())
    }

    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.items.lock().is_empty()
    }
}

impl std::fmt::Debug for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bag")
            .field("path", &self.shared.path)
            .field("params", &self.len())
            .finish()
    }
}

fn ensure_backing_file(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|err| Error::io(err, parent, "failed to create params directory"))?;
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => {
            debug!(path = %path.display(), "created empty params file");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(Error::io(err, path, "failed to create params file")
            .with_hint("The params directory must be writable.")),
    }
}

static GLOBAL: OnceLock<Bag> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = parking_lot::const_mutex(());

/// The process-wide bag, opened from `BagOptions::from_env()` on first use.
///
/// Initialization runs once even under concurrent first calls. A failed
/// initialization is returned to the caller and retried on the next call.
pub fn global() -> Result<&'static Bag, Error> {
    if let Some(bag) = GLOBAL.get() {
        return Ok(bag);
    }
    let _guard = GLOBAL_INIT.lock();
    if let Some(bag) = GLOBAL.get() {
        return Ok(bag);
    }
    let bag = Bag::open(BagOptions::from_env())?;
    Ok(GLOBAL.get_or_init(|| bag))
}

#[cfg(test)]
mod tests {
    use super::{Bag, BagOptions, LoadStatus};
    use crate::core::error::ErrorKind;
    use crate::core::kind::{Color, ParamValue, Vec3};
    use crate::core::param::LiveParam;
    use crate::notice::NoticeKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn open_bag(dir: &tempfile::TempDir) -> Bag {
        Bag::open(BagOptions::new(dir.path().join("live_params.json")).without_watch())
            .expect("open bag")
    }

    #[test]
    fn open_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("assets").join("live_params.json");
        let bag = Bag::open(BagOptions::new(&path).without_watch()).expect("open");
        assert!(path.exists());
        assert!(!bag.is_watching());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "");
    }

    #[test]
    fn open_keeps_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("live_params.json");
        std::fs::write(&path, r#"{"params": {"friction": "0.5"}}"#).expect("seed");
        let _bag = Bag::open(BagOptions::new(&path).without_watch()).expect("open");
        assert!(
            std::fs::read_to_string(&path)
                .expect("read")
                .contains("friction")
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut first = LiveParam::new(1.0f32);
        let mut second = LiveParam::new(2.0f32);
        bag.add(&mut first, "friction").expect("first");
        let err = bag.add(&mut second, "friction").expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(!second.is_registered());
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn registering_twice_is_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut param = LiveParam::new(true);
        bag.add(&mut param, "enabled").expect("add");
        let err = bag.add(&mut param, "enabled_again").expect_err("twice");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(param.name(), Some("enabled"));
    }

    #[test]
    fn empty_file_loads_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut param = LiveParam::new(3i32);
        bag.add(&mut param, "count").expect("add");
        let report = bag.load().expect("load");
        assert_eq!(report.status, LoadStatus::Loaded);
        assert!(report.changed.is_empty());
        assert!(report.is_clean());
        assert_eq!(param.get(), 3);
    }

    #[test]
    fn save_writes_sorted_canonical_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut springk = LiveParam::new(0.1f32);
        let mut color = LiveParam::new(Color::new(1.0, 0.0, 0.0));
        bag.add(&mut springk, "springk").expect("add");
        bag.add(&mut color, "disk_color").expect("add");
        bag.save().expect("save");

        let text = std::fs::read_to_string(bag.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(
            value,
            json!({"params": {
                "disk_color": {"r": "1", "g": "0", "b": "0"},
                "springk": "0.1"
            }})
        );
        assert_eq!(bag.names(), ["disk_color", "springk"]);
    }

    #[test]
    fn load_skips_mismatched_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut position = LiveParam::new(Vec3::default());
        let mut scale = LiveParam::new(1.0f32);
        bag.add(&mut position, "position").expect("add");
        bag.add(&mut scale, "scale").expect("add");
        std::fs::write(
            bag.path(),
            r#"{"params": {"position": "0.5", "scale": "2"}}"#,
        )
        .expect("write");

        let report = bag.load().expect("load");
        assert_eq!(report.changed, ["scale"]);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].kind, NoticeKind::Mismatch);
        assert_eq!(report.notices[0].param.as_deref(), Some("position"));
        assert_eq!(position.get(), Vec3::default());
        assert_eq!(scale.get(), 2.0);
    }

    #[test]
    fn subscribers_receive_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut radius = LiveParam::new(10.0f32);
        bag.add(&mut radius, "disk_radius").expect("add");
        let changes = bag.subscribe();

        std::fs::write(bag.path(), r#"{"params": {"disk_radius": "25"}}"#).expect("write");
        bag.load().expect("load");
        let event = changes.try_recv().expect("event");
        assert_eq!(event.name, "disk_radius");
        assert_eq!(event.value, ParamValue::Float(25.0));

        bag.load().expect("reload");
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut radius = LiveParam::new(10.0f32);
        bag.add(&mut radius, "disk_radius").expect("add");
        drop(bag.subscribe());

        std::fs::write(bag.path(), r#"{"params": {"disk_radius": "12"}}"#).expect("write");
        bag.load().expect("load");
        assert!(bag.shared.subscribers.lock().is_empty());
    }

    #[test]
    fn callback_may_reenter_the_bag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let seen = Arc::new(AtomicUsize::new(0));
        let mut flag = LiveParam::new(false);
        let reentrant = bag.clone();
        let sink = seen.clone();
        bag.add_with(&mut flag, "enabled", move || {
            sink.store(reentrant.len(), Ordering::SeqCst);
        })
        .expect("add");

        std::fs::write(bag.path(), r#"{"params": {"enabled": "true"}}"#).expect("write");
        bag.load().expect("load");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_unknown_target_is_reported_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut param = LiveParam::new(1i32);
        let id = bag.add(&mut param, "count").expect("add");
        assert!(param.unregister());
        assert!(!bag.shared.remove_target(id));
        assert!(bag.is_empty());
    }

    #[test]
    fn cells_outliving_the_bag_drop_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut param = LiveParam::new(1i32);
        {
            let bag = open_bag(&dir);
            bag.add(&mut param, "count").expect("add");
        }
        assert!(param.is_registered());
        assert!(!param.unregister());
    }

    #[test]
    fn value_and_kind_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let mut color = LiveParam::new(Color::gray(0.5));
        bag.add(&mut color, "background").expect("add");
        assert_eq!(
            bag.kind_of("background"),
            Some(crate::core::kind::Kind::Color)
        );
        assert_eq!(
            bag.value_of("background"),
            Some(ParamValue::Color(Color::gray(0.5)))
        );
        assert!(bag.value_of("missing").is_none());
        assert!(bag.contains("background"));
    }

    #[test]
    fn cells_dropped_by_an_earlier_callback_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bag = open_bag(&dir);
        let holder: Arc<std::sync::Mutex<Option<LiveParam<i32>>>> =
            Arc::new(std::sync::Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut second = LiveParam::new(1i32);
        let counter = calls.clone();
        bag.add_with(&mut second, "b_second", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("add second");
        *holder.lock().expect("holder") = Some(second);

        let mut first = LiveParam::new(1i32);
        let dropper = holder.clone();
        bag.add_with(&mut first, "a_first", move || {
            dropper.lock().expect("holder").take();
        })
        .expect("add first");
        let changes = bag.subscribe();

        std::fs::write(bag.path(), r#"{"params": {"a_first": "2", "b_second": "2"}}"#)
            .expect("write");
        let report = bag.load().expect("load");

        assert!(holder.lock().expect("holder").is_none());
        assert!(!bag.contains("b_second"));
        assert_eq!(report.changed, ["a_first"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(changes.try_recv().expect("event").name, "a_first");
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn ids_are_unique_across_bags() {
        let first_dir = tempfile::tempdir().expect("tempdir");
        let second_dir = tempfile::tempdir().expect("tempdir");
        let first = open_bag(&first_dir);
        let second = open_bag(&second_dir);
        let mut x = LiveParam::new(1i32);
        let mut y = LiveParam::new(2i32);
        let id_x = first.add(&mut x, "x").expect("add x");
        let id_y = second.add(&mut y, "y").expect("add y");
        assert_ne!(id_x, id_y);

        assert!(!second.shared.remove_target(id_x));
        assert!(second.contains("y"));
        assert!(y.is_registered());
        assert!(first.contains("x"));
    }

    #[test]
    fn unregistered_cell_can_join_another_bag() {
        let first_dir = tempfile::tempdir().expect("tempdir");
        let second_dir = tempfile::tempdir().expect("tempdir");
        let first = open_bag(&first_dir);
        let second = open_bag(&second_dir);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gain = LiveParam::new(1.0f32);
        first.add(&mut gain, "gain").expect("add");
        assert!(gain.unregister());
        assert!(first.is_empty());

        let counter = calls.clone();
        second
            .add_with(&mut gain, "gain", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("re-add");
        std::fs::write(second.path(), r#"{"params": {"gain": "3"}}"#).expect("write");
        second.load().expect("load");
        assert_eq!(gain.get(), 3.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Purpose: Typed live parameter cells and the type-erased handles a bag stores.
//! Exports: `LiveParam`, `ParamId`, `UpdateFn`, `Handle`, `Slot`.
//! Role: Owner-side value storage plus the registry-side view of it.
//! Invariants: Direct writes (`set`, `modify`) never run the update callback.
//! Invariants: `update` runs the callback only when the value changed, after releasing the value lock.
//! Invariants: Dropping a registered cell removes exactly its own bag entry.
//! Invariants: A detached slot (dropped or unregistered cell) ignores `update` and never calls back.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::bag::BagShared;
use super::codec::Codec;
use super::error::{Error, ErrorKind};
use super::kind::{Color, Kind, ParamKind, ParamValue, Quat, Vec2, Vec3, Vec4};

/// Change callback. Runs on whichever thread applied the change, which is
/// the watcher thread for automatic reloads.
pub type UpdateFn = Arc<dyn Fn() + Send + Sync>;

/// Stable identity issued by a bag at registration time; never reused.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub(crate) u64);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[doc(hidden)]
pub struct Slot<T> {
    value: RwLock<T>,
    on_update: RwLock<UpdateFn>,
    detached: AtomicBool,
}

impl<T: ParamKind> Slot<T> {
    fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            on_update: RwLock::new(noop()),
            detached: AtomicBool::new(false),
        }
    }

    fn get(&self) -> T {
        self.value.read().clone()
    }

    pub(crate) fn update(&self, next: T) -> bool {
        {
            let mut value = self.value.write();
            if self.is_detached() || *value == next {
                return false;
            }
            *value = next;
        }
        if self.is_detached() {
            return true;
        }
        let callback = self.on_update.read().clone();
        callback();
        true
    }

    // Taken under the value lock so an in-flight `update` either finishes
    // its store first or observes the flag.
    fn detach(&self) {
        let _value = self.value.write();
        self.detached.store(true, Ordering::Release);
    }

    fn attach(&self) {
        self.detached.store(false, Ordering::Release);
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    fn set_update_fn(&self, callback: UpdateFn) {
        *self.on_update.write() = callback;
    }
}

pub(crate) fn noop() -> UpdateFn {
    Arc::new(|| {})
}

pub(crate) struct Registration {
    pub(crate) bag: Weak<BagShared>,
    pub(crate) id: ParamId,
    pub(crate) name: String,
}

/// A named, typed value that a bag can save, load, and hot-reload.
///
/// Reads and writes go through a lock so the watcher thread can update the
/// value while the owning thread keeps reading it.
pub struct LiveParam<T: ParamKind> {
    slot: Arc<Slot<T>>,
    registration: Option<Registration>,
}

impl<T: ParamKind> LiveParam<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Slot::new(value)),
            registration: None,
        }
    }

    pub fn get(&self) -> T {
        self.slot.get()
    }

    /// Replaces the value without running the update callback.
    pub fn set(&self, value: T) {
        *self.slot.value.write() = value;
    }

    /// Mutates the value in place without running the update callback.
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.slot.value.write())
    }

    pub fn set_update_fn(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.slot.set_update_fn(Arc::new(callback));
    }

    pub fn kind(&self) -> Kind {
        T::KIND
    }

    pub fn id(&self) -> Option<ParamId> {
        self.registration.as_ref().map(|registration| registration.id)
    }

    pub fn name(&self) -> Option<&str> {
        self.registration
            .as_ref()
            .map(|registration| registration.name.as_str())
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Removes this parameter from its bag. Returns false when it was not
    /// registered or the bag no longer exists.
    pub fn unregister(&mut self) -> bool {
        let Some(registration) = self.registration.take() else {
            return false;
        };
        self.slot.detach();
        self.slot.set_update_fn(noop());
        match registration.bag.upgrade() {
            Some(bag) => bag.remove_target(registration.id),
            None => false,
        }
    }

    /// Stores `value` through change detection: the update callback runs
    /// once if it differs from the current value, and not at all otherwise.
    pub fn update(&self, value: T) -> bool {
        self.slot.update(value)
    }

    pub(crate) fn handle(&self) -> Handle {
        T::handle(self.slot.clone())
    }

    pub(crate) fn bind(&mut self, registration: Registration, callback: UpdateFn) {
        self.slot.set_update_fn(callback);
        self.slot.attach();
        self.registration = Some(registration);
    }
}

impl<T: ParamKind + Default> Default for LiveParam<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ParamKind> fmt::Debug for LiveParam<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveParam")
            .field("name", &self.name())
            .field("value", &self.get())
            .finish()
    }
}

impl<T: ParamKind> Drop for LiveParam<T> {
    fn drop(&mut self) {
        self.slot.detach();
        if let Some(registration) = self.registration.take() {
            if let Some(bag) = registration.bag.upgrade() {
                bag.remove_target(registration.id);
            }
        }
    }
}

/// Registry-side view of one cell, dispatched over the closed kind set.
#[doc(hidden)]
#[derive(Clone)]
pub enum Handle {
    Bool(Arc<Slot<bool>>),
    Int(Arc<Slot<i32>>),
    Float(Arc<Slot<f32>>),
    Vec2(Arc<Slot<Vec2>>),
    Vec3(Arc<Slot<Vec3>>),
    Vec4(Arc<Slot<Vec4>>),
    Quat(Arc<Slot<Quat>>),
    Color(Arc<Slot<Color>>),
}

macro_rules! dispatch {
    ($handle:expr, $slot:ident => $body:expr) => {
        match $handle {
            Handle::Bool($slot) => $body,
            Handle::Int($slot) => $body,
            Handle::Float($slot) => $body,
            Handle::Vec2($slot) => $body,
            Handle::Vec3($slot) => $body,
            Handle::Vec4($slot) => $body,
            Handle::Quat($slot) => $body,
            Handle::Color($slot) => $body,
        }
    };
}

impl Handle {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Handle::Bool(_) => Kind::Bool,
            Handle::Int(_) => Kind::Int,
            Handle::Float(_) => Kind::Float,
            Handle::Vec2(_) => Kind::Vec2,
            Handle::Vec3(_) => Kind::Vec3,
            Handle::Vec4(_) => Kind::Vec4,
            Handle::Quat(_) => Kind::Quat,
            Handle::Color(_) => Kind::Color,
        }
    }

    pub(crate) fn value(&self) -> ParamValue {
        dispatch!(self, slot => slot.get().into_value())
    }

    pub(crate) fn encode(&self, name: &str, params: &mut Map<String, Value>) {
        let node = dispatch!(self, slot => slot.get().encode());
        params.insert(name.to_string(), node);
    }

    /// Decodes `entry` and applies it. Returns whether the value changed.
    pub(crate) fn decode(&self, name: &str, entry: &Value) -> Result<bool, Error> {
        dispatch!(self, slot => apply(slot, name, entry))
    }
}

fn apply<T: ParamKind>(slot: &Slot<T>, name: &str, entry: &Value) -> Result<bool, Error> {
    let next = T::decode(entry).map_err(|err| with_param(err, name))?;
    Ok(slot.update(next))
}

fn with_param(err: Error, name: &str) -> Error {
    if err.kind() == ErrorKind::Mismatch && err.param().is_none() {
        return err.with_param(name);
    }
    err
}

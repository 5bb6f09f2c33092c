use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased, shareable value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// A typed key into an [`EntryPoint`].
///
/// The key's name identifies the slot; the type parameter fixes what is
/// stored there, so lookups never need a cast at the call site.
///
/// ```
/// use cmdgraph_core::{ContextKey, EntryPoint};
///
/// const CHANNEL: ContextKey<String> = ContextKey::new("channel");
///
/// let entry = EntryPoint::default().with(&CHANNEL, "#general".to_string());
/// assert_eq!(entry.get(&CHANNEL).map(String::as_str), Some("#general"));
/// ```
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Key for the slot called `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Slot name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

/// Ambient data available to argument types while parsing and loading.
///
/// Hosts put whatever the argument types need here (the originating
/// conversation, a user directory handle, ...). Cloning is cheap.
#[derive(Clone, Default)]
pub struct EntryPoint {
    values: Arc<BTreeMap<&'static str, AnyValue>>,
}

impl EntryPoint {
    /// Copy of this entry point with `value` stored under `key`.
    pub fn with<T: Send + Sync + 'static>(mut self, key: &ContextKey<T>, value: T) -> Self {
        Arc::make_mut(&mut self.values).insert(key.name, Arc::new(value));
        self
    }

    /// The value stored under `key`, if present with the key's type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &ContextKey<T>) -> Option<&T> {
        self.values.get(key.name)?.downcast_ref::<T>()
    }

    /// Whether a value is stored under `key`.
    pub fn contains<T: Send + Sync + 'static>(&self, key: &ContextKey<T>) -> bool {
        self.get(key).is_some()
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

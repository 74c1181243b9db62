use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

/// Callback notified of every effective change to a [`ValueMap`].
pub type ValueListener<K, V> = Box<dyn Fn(&ValueChange<'_, K, V>)>;

/// An ordered attribute to value map that tracks original values.
///
/// The first value put for a key initializes it. Any later change records the value it
/// replaced as the key's original, and the key stays modified until it is saved,
/// reverted, or set back to the original value.
///
/// Listeners are never cloned along with the map.
pub struct ValueMap<K, V> {
    values: IndexMap<K, V>,

    /// Populated lazily, only for modified keys
    originals: IndexMap<K, V>,

    listeners: Vec<ValueListener<K, V>>,
}

/// Describes a change made to a [`ValueMap`].
#[derive(Debug)]
pub struct ValueChange<'a, K, V> {
    /// The key whose value changed
    pub key: &'a K,

    /// The new value
    pub value: &'a V,

    /// The value replaced by this change, `None` if the key had no value
    pub previous: Option<&'a V>,

    /// True if this change put the first value for the key
    pub initialization: bool,
}

impl<K, V> ValueMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    pub fn new() -> ValueMap<K, V> {
        ValueMap {
            values: IndexMap::new(),
            originals: IndexMap::new(),
            listeners: vec![],
        }
    }

    /// Associates `value` with `key`, returning the previous value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        // An equal value replaces the stored one without counting as a change
        if let Some(current) = self.values.get_mut(&key) {
            if *current == value {
                return Some(std::mem::replace(current, value));
            }
        }
        let initialization = !self.values.contains_key(&key);

        let previous = self.values.insert(key.clone(), value);
        if let Some(previous) = &previous {
            self.update_original(&key, previous);
        }

        if !self.listeners.is_empty() {
            if let Some(value) = self.values.get(&key) {
                self.notify(&ValueChange {
                    key: &key,
                    value,
                    previous: previous.as_ref(),
                    initialization,
                });
            }
        }

        previous
    }

    fn update_original(&mut self, key: &K, previous: &V) {
        match self.originals.get(key) {
            Some(original) => {
                if self.values.get(key) == Some(original) {
                    self.originals.shift_remove(key);
                }
            }
            None => {
                self.originals.insert(key.clone(), previous.clone());
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.contains_key(key)
    }

    /// Returns the original value of `key` if it has been modified, otherwise the
    /// current value.
    pub fn original<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.originals.get(key).or_else(|| self.values.get(key))
    }

    /// Returns `true` if any value has been modified.
    pub fn is_modified(&self) -> bool {
        !self.originals.is_empty()
    }

    pub fn is_modified_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.originals.contains_key(key)
    }

    /// Accepts the current value of `key` as its baseline.
    pub fn save<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.originals.shift_remove(key);
    }

    pub fn save_all(&mut self) {
        self.originals.clear();
    }

    /// Restores the original value of `key`, if it has been modified.
    pub fn revert<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let original = self
            .originals
            .get_key_value(key)
            .map(|(key, original)| (key.clone(), original.clone()));

        // Putting the original back drops the original record
        if let Some((key, original)) = original {
            self.put(key, original);
        }
    }

    pub fn revert_all(&mut self) {
        let keys: Vec<K> = self.originals.keys().cloned().collect();
        for key in keys {
            self.revert(&key);
        }
    }

    /// Removes `key` along with its original value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.originals.shift_remove(key);
        self.values.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.originals.clear();
    }

    /// Replaces the contents of this map with a copy of `other`, originals included.
    pub fn set_as(&mut self, other: &ValueMap<K, V>) {
        self.values = other.values.clone();
        self.originals = other.originals.clone();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.values.iter()
    }

    /// Keys with a recorded original value, in the order they were modified.
    pub fn original_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.originals.keys()
    }

    pub fn add_listener(&mut self, listener: impl Fn(&ValueChange<'_, K, V>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Sends `change` to every listener.
    pub fn notify(&self, change: &ValueChange<'_, K, V>) {
        for listener in &self.listeners {
            listener(change);
        }
    }

    /// Builds a map from current and original values without notifying anyone. Originals
    /// for keys without a current value are dropped.
    pub fn from_parts(values: IndexMap<K, V>, mut originals: IndexMap<K, V>) -> ValueMap<K, V> {
        originals.retain(|key, original| matches!(values.get(key), Some(current) if current != original));
        ValueMap {
            values,
            originals,
            listeners: vec![],
        }
    }
}

impl<K, V> Default for ValueMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        ValueMap::new()
    }
}

impl<K: Clone, V: Clone> Clone for ValueMap<K, V> {
    fn clone(&self) -> Self {
        ValueMap {
            values: self.values.clone(),
            originals: self.originals.clone(),
            listeners: vec![],
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ValueMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMap")
            .field("values", &self.values)
            .field("originals", &self.originals)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

//! Keyspace holding streams and other values.
//!
//! Each key owns one [`Object`]. Commands take the keyspace lock for their
//! whole duration, so every stream has a single writer at a time and no
//! cursor outlives the lock it was created under.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::Stream;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity hint for number of keys
    pub initial_capacity: usize,
    /// Whether writes may create a missing stream. When false every XADD
    /// behaves as if NOMKSTREAM was given.
    pub auto_create_streams: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            auto_create_streams: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial keyspace capacity.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets whether missing streams are created on write.
    #[must_use]
    pub const fn auto_create_streams(mut self, value: bool) -> Self {
        self.auto_create_streams = value;
        self
    }
}

/// A value stored under a key.
#[derive(Debug)]
pub enum Object {
    /// A stream log.
    Stream(Stream),
    /// A plain byte string.
    String(Vec<u8>),
}

impl Object {
    /// Type name as reported to clients.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Stream(_) => "stream",
            Object::String(_) => "string",
        }
    }
}

/// A concurrent keyspace.
pub struct Store {
    objects: RwLock<HashMap<String, Object>>,
    config: Config,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a new empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            objects: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Type name of the value under `key`.
    pub fn type_of(&self, key: &str) -> Option<&'static str> {
        self.objects.read().get(key).map(Object::type_name)
    }

    /// Store a plain string, replacing whatever was there.
    pub fn set_string(&self, key: &str, value: impl Into<Vec<u8>>) -> Option<Object> {
        self.objects
            .write()
            .insert(key.to_owned(), Object::String(value.into()))
    }

    /// Remove a key.
    pub fn remove(&self, key: &str) -> Option<Object> {
        let removed = self.objects.write().remove(key);
        if removed.is_some() {
            debug!(key, "removed key");
        }
        removed
    }

    /// Run `f` against the stream under `key`.
    ///
    /// Returns `Ok(None)` for a missing key and [`Error::WrongType`] when the
    /// key holds something else.
    pub fn read_stream<T>(&self, key: &str, f: impl FnOnce(&Stream) -> Result<T>) -> Result<Option<T>> {
        let objects = self.objects.read();
        match objects.get(key) {
            None => Ok(None),
            Some(object) => f(Stream::from_object(object)?).map(Some),
        }
    }

    /// Run `f` against the stream under `key` for writing.
    ///
    /// A missing key is created when `create` is set and the configuration
    /// allows it; otherwise [`Error::NoSuchStream`]. A stream created here is
    /// only kept if `f` succeeds.
    pub fn write_stream<T>(
        &self,
        key: &str,
        create: bool,
        f: impl FnOnce(&mut Stream) -> Result<T>,
    ) -> Result<T> {
        let mut objects = self.objects.write();
        if let Some(object) = objects.get_mut(key) {
            return f(Stream::from_object_mut(object)?);
        }

        if !create || !self.config.auto_create_streams {
            return Err(Error::NoSuchStream);
        }
        let mut stream = Stream::new();
        match f(&mut stream) {
            Ok(out) => {
                objects.insert(key.to_owned(), Object::Stream(stream));
                debug!(key, "created stream");
                Ok(out)
            }
            Err(err) => {
                debug!(key, %err, "discarded stream created for failed write");
                Err(err)
            }
        }
    }
}

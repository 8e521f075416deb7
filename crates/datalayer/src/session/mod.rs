//! Session persistence abstraction
//!
//! The data layer stores its whole mapping as one opaque value under
//! [`SESSION_KEY`]. Hosts supply the backend by implementing [`SessionStore`].

use std::sync::Arc;

use crate::entries::Entries;
use crate::errors::DataLayerError;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileSessionStore;
pub use memory::MemorySessionStore;

/// Key under which the data layer mapping lives inside a session.
pub const SESSION_KEY: &str = "datalayer";

/// Get/put access to the persisted data layer mapping of one end-user session.
pub trait SessionStore {
    /// Persisted mapping, or `default` when nothing was stored yet.
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError>;
    /// Overwrite the persisted mapping.
    fn put(&self, entries: Entries) -> Result<(), DataLayerError>;
}

impl<T: SessionStore + ?Sized> SessionStore for &T {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> { (**self).get(default) }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> { (**self).put(entries) }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> { (**self).get(default) }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> { (**self).put(entries) }
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> { (**self).get(default) }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> { (**self).put(entries) }
}

use std::sync::Mutex;

use super::SessionStore;
use crate::entries::Entries;
use crate::errors::DataLayerError;

/// In-process session backend. Shareable across stores via `&` or `Arc`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Entries>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_entries(entries: Entries) -> Self {
        Self { slot: Mutex::new(Some(entries)) }
    }

    /// Raw persisted value; `None` until the first `put`.
    pub fn snapshot(&self) -> Result<Option<Entries>, DataLayerError> {
        let slot = self.slot.lock().map_err(|e| DataLayerError::session(e.to_string()))?;
        Ok(slot.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> {
        let slot = self.slot.lock().map_err(|e| DataLayerError::session(e.to_string()))?;
        Ok(slot.clone().unwrap_or(default))
    }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> {
        let mut slot = self.slot.lock().map_err(|e| DataLayerError::session(e.to_string()))?;
        *slot = Some(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_falls_back_to_default() {
        let s = MemorySessionStore::new();
        let mut d = Entries::new();
        d.insert("k".into(), json!(1));
        assert_eq!(s.get(d.clone()).unwrap(), d);
        assert!(s.snapshot().unwrap().is_none());
    }

    #[test]
    fn put_overwrites() {
        let s = MemorySessionStore::new();
        let mut a = Entries::new();
        a.insert("a".into(), json!(1));
        s.put(a).unwrap();
        s.put(Entries::new()).unwrap();
        assert_eq!(s.snapshot().unwrap(), Some(Entries::new()));
    }
}

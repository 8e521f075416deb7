use std::{fs, path::PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::{SessionStore, SESSION_KEY};
use crate::entries::Entries;
use crate::errors::DataLayerError;

/// JSON file-backed session bag.
///
/// The file holds a whole session object; only the value under
/// [`SESSION_KEY`] is read or replaced, other keys are left as found.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    file_path: PathBuf,
}

impl JsonFileSessionStore {
    /// Open the bag at `path`. Creates the file with an empty object if missing.
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, DataLayerError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !file_path.exists() {
            fs::write(&file_path, b"{}")?;
        }
        Ok(Self { file_path })
    }

    pub fn path(&self) -> &std::path::Path { &self.file_path }

    fn read_bag(&self) -> Result<Map<String, Value>, DataLayerError> {
        let bytes = match fs::read(&self.file_path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(bag) => Ok(bag),
            other => Err(DataLayerError::session(format!(
                "session file {} holds {} instead of an object",
                self.file_path.display(),
                kind(&other)
            ))),
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl SessionStore for JsonFileSessionStore {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> {
        let mut bag = self.read_bag()?;
        match bag.remove(SESSION_KEY) {
            None => Ok(default),
            Some(Value::Object(entries)) => Ok(entries),
            Some(other) => Err(DataLayerError::session(format!(
                "session key {SESSION_KEY} holds {}",
                kind(&other)
            ))),
        }
    }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> {
        let mut bag = self.read_bag()?;
        bag.insert(SESSION_KEY.to_string(), Value::Object(entries));
        let data = serde_json::to_vec(&bag)?;
        fs::write(&self.file_path, data)?;
        debug!(path = %self.file_path.display(), "session bag written");
        Ok(())
    }
}

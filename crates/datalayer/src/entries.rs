use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value data accumulated for the client-side `dataLayer`.
pub type Entries = Map<String, Value>;

/// Options accepted by `set` and `merge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOptions {
    /// Emit immediately instead of buffering
    #[serde(default)]
    pub echo: bool,
    /// Persist to the session store after buffering
    #[serde(default)]
    pub session: bool,
}

impl PushOptions {
    pub fn echo() -> Self { Self { echo: true, session: false } }

    pub fn session() -> Self { Self { echo: false, session: true } }
}

/// Options accepted by `publish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOptions {
    #[serde(default = "default_true")]
    pub init: bool,
    #[serde(default = "default_true")]
    pub script: bool,
    #[serde(default = "default_true")]
    pub clear: bool,
}

fn default_true() -> bool { true }

impl Default for PublishOptions {
    fn default() -> Self {
        Self { init: true, script: true, clear: true }
    }
}

impl PublishOptions {
    pub fn with_init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    pub fn with_script(mut self, script: bool) -> Self {
        self.script = script;
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

/// Which surfaces a clear operation empties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Empty both the in-memory entries and the persisted copy.
    #[default]
    Both,
    /// Empty only the persisted copy; in-memory entries live until the store is dropped.
    PersistedOnly,
}

/// Merge `source` over `target`; later keys win.
pub(crate) fn merge_into(target: &mut Entries, source: Entries) {
    for (k, v) in source {
        target.insert(k, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_defaults_are_all_on() {
        let o = PublishOptions::default();
        assert!(o.init && o.script && o.clear);
        let o: PublishOptions = serde_json::from_value(json!({"clear": false})).unwrap();
        assert!(o.init && o.script && !o.clear);
    }

    #[test]
    fn push_defaults_are_all_off() {
        assert_eq!(PushOptions::default(), PushOptions { echo: false, session: false });
    }

    #[test]
    fn merge_into_overwrites_conflicts() {
        let mut a = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();
        let b = json!({"b": 3}).as_object().cloned().unwrap();
        merge_into(&mut a, b);
        assert_eq!(Value::Object(a), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn clear_policy_parses_snake_case() {
        let p: ClearPolicy = serde_json::from_value(json!("persisted_only")).unwrap();
        assert_eq!(p, ClearPolicy::PersistedOnly);
    }
}

//! Request-scoped data layer buffer.
//!
//! One [`DataLayerStore`] is built per request, hydrated from the session,
//! mutated while the request is handled and dropped at the end. Nothing is
//! persisted unless `save`, a `session` push option or `publish` asks for it.

use serde_json::Value;
use tracing::{debug, warn};

use crate::diagnostic::DiagnosticSink;
use crate::entries::{merge_into, ClearPolicy, Entries, PublishOptions, PushOptions};
use crate::errors::DataLayerError;
use crate::escape::to_safe_json;
use crate::markup::{self, MarkupWriter};
use crate::session::{SessionStore, SESSION_KEY};

pub struct DataLayerStore<S, W = String> {
    entries: Entries,
    session: S,
    tag_id: String,
    out: W,
    clear_policy: ClearPolicy,
    halted: bool,
}

impl<S: SessionStore> DataLayerStore<S, String> {
    /// Build a store writing into an in-memory `String` buffer.
    pub fn new(session: S, tag_id: impl Into<String>) -> Result<Self, DataLayerError> {
        Self::with_writer(session, tag_id, String::new())
    }
}

impl<S: SessionStore, W: MarkupWriter> DataLayerStore<S, W> {
    /// Build a store and hydrate it from the session immediately.
    pub fn with_writer(session: S, tag_id: impl Into<String>, out: W) -> Result<Self, DataLayerError> {
        let mut store = Self {
            entries: Entries::new(),
            session,
            tag_id: tag_id.into(),
            out,
            clear_policy: ClearPolicy::default(),
            halted: false,
        };
        store.load()?;
        Ok(store)
    }

    pub fn with_clear_policy(mut self, policy: ClearPolicy) -> Self {
        self.clear_policy = policy;
        self
    }

    pub fn tag_id(&self) -> &str { &self.tag_id }

    pub fn clear_policy(&self) -> ClearPolicy { self.clear_policy }

    pub fn session(&self) -> &S { &self.session }

    /// Replace the in-memory entries with the persisted ones.
    pub fn load(&mut self) -> Result<(), DataLayerError> {
        self.entries = self.session.get(Entries::new())?;
        debug!(session_key = SESSION_KEY, keys = self.entries.len(), "data layer loaded");
        Ok(())
    }

    /// Empty the persisted copy, and the in-memory entries under `ClearPolicy::Both`.
    pub fn clear(&mut self) -> Result<(), DataLayerError> {
        self.session.put(Entries::new())?;
        if self.clear_policy == ClearPolicy::Both {
            self.entries.clear();
        }
        debug!(session_key = SESSION_KEY, policy = ?self.clear_policy, "data layer cleared");
        Ok(())
    }

    /// Persist the in-memory entries verbatim.
    pub fn save(&self) -> Result<(), DataLayerError> {
        self.session.put(self.entries.clone())?;
        debug!(session_key = SESSION_KEY, keys = self.entries.len(), "data layer saved");
        Ok(())
    }

    /// Snapshot of the buffered entries.
    pub fn data(&self) -> Entries { self.entries.clone() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Buffer a single key, or emit `{key: value}` straight away with `echo`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>, opts: PushOptions) -> Result<(), DataLayerError> {
        let key = key.into();
        let value = value.into();
        if opts.echo {
            let mut single = Entries::new();
            single.insert(key, value);
            return self.push_data(&single, false);
        }
        debug!(%key, "data layer set");
        self.entries.insert(key, value);
        if opts.session {
            self.save()?;
        }
        Ok(())
    }

    /// Merge a mapping over the buffer (later keys win), or emit it with `echo`.
    pub fn merge(&mut self, data: Entries, opts: PushOptions) -> Result<(), DataLayerError> {
        if opts.echo {
            return self.push_data(&data, false);
        }
        debug!(keys = data.len(), "data layer merge");
        merge_into(&mut self.entries, data);
        if opts.session {
            self.save()?;
        }
        Ok(())
    }

    /// `merge` for dynamically typed input; only JSON objects are accepted.
    pub fn merge_value(&mut self, value: Value, opts: PushOptions) -> Result<(), DataLayerError> {
        match value {
            Value::Object(map) => self.merge(map, opts),
            other => Err(DataLayerError::invalid(format!("expected a JSON object to merge, got {other}"))),
        }
    }

    /// Merge parallel key and value lists. Lists of different length are rejected
    /// before anything is buffered.
    pub fn set_pairs<K, I, J>(&mut self, keys: I, values: J, opts: PushOptions) -> Result<(), DataLayerError>
    where
        K: Into<String>,
        I: IntoIterator<Item = K>,
        J: IntoIterator<Item = Value>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let values: Vec<Value> = values.into_iter().collect();
        if keys.len() != values.len() {
            return Err(DataLayerError::invalid(format!(
                "{} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        self.merge(keys.into_iter().zip(values).collect(), opts)
    }

    /// Emit init snippet, buffered entries and GTM bootstrap, as selected by `opts`.
    pub fn publish(&mut self, opts: PublishOptions) -> Result<(), DataLayerError> {
        if opts.init {
            self.init()?;
        }
        if !self.entries.is_empty() {
            let data = self.entries.clone();
            self.push_data(&data, opts.clear)?;
        }
        if opts.script {
            self.script(None)?;
        }
        Ok(())
    }

    /// Write `data` as a `dataLayer.push(...)` call, then clear if asked.
    pub fn push_data(&mut self, data: &Entries, clear: bool) -> Result<(), DataLayerError> {
        let json = to_safe_json(data)?;
        let written = self.emit(&markup::push_snippet(&json))?;
        debug!(keys = data.len(), clear, written, "data layer pushed");
        // entries that never reached the page must survive
        if clear && written {
            self.clear()?;
        }
        Ok(())
    }

    /// Ensure `window.dataLayer` exists on the client.
    pub fn init(&mut self) -> Result<(), DataLayerError> {
        self.emit(&markup::init_snippet()).map(drop)
    }

    /// GTM bootstrap script; `None` or an empty id uses the configured tag id.
    pub fn script(&mut self, tag_id: Option<&str>) -> Result<(), DataLayerError> {
        let snippet = markup::script_snippet(self.resolve_tag_id(tag_id));
        self.emit(&snippet).map(drop)
    }

    /// GTM `<noscript>` iframe fallback.
    pub fn no_script(&mut self, tag_id: Option<&str>) -> Result<(), DataLayerError> {
        let snippet = markup::no_script_snippet(self.resolve_tag_id(tag_id));
        self.emit(&snippet).map(drop)
    }

    /// Dump the buffered entries through `sink` and halt all further output.
    pub fn dd(&mut self, sink: &mut dyn DiagnosticSink) -> Result<(), DataLayerError> {
        if !self.halted {
            sink.dump(&self.entries, &mut self.out)?;
        }
        self.halted = true;
        Ok(())
    }

    pub fn is_halted(&self) -> bool { self.halted }

    pub fn output(&self) -> &W { &self.out }

    pub fn into_output(self) -> W { self.out }

    /// Move the markup written so far out of the store, leaving an empty writer.
    pub fn take_output(&mut self) -> W
    where
        W: Default,
    {
        std::mem::take(&mut self.out)
    }

    fn resolve_tag_id<'a>(&'a self, tag_id: Option<&'a str>) -> &'a str {
        match tag_id {
            Some(id) if !id.is_empty() => id,
            _ => &self.tag_id,
        }
    }

    /// Returns whether the markup was written.
    fn emit(&mut self, markup: &str) -> Result<bool, DataLayerError> {
        if self.halted {
            warn!(bytes = markup.len(), "output halted by debug dump; markup dropped");
            return Ok(false);
        }
        self.out.write_markup(markup)?;
        Ok(true)
    }
}

//! Request-scoped data layer for Google Tag Manager.
//! - Accumulates key/value entries while a request is handled.
//! - Persists them through a pluggable [`SessionStore`].
//! - Emits them as HTML-safe `dataLayer.push(...)` markup.

pub mod diagnostic;
pub mod entries;
pub mod errors;
pub mod escape;
pub mod markup;
pub mod session;
pub mod store;

pub use diagnostic::{DiagnosticSink, PreformattedDump, TracingDump};
pub use entries::{ClearPolicy, Entries, PublishOptions, PushOptions};
pub use errors::DataLayerError;
pub use markup::MarkupWriter;
pub use session::{JsonFileSessionStore, MemorySessionStore, SessionStore, SESSION_KEY};
pub use store::DataLayerStore;

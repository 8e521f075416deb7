//! Developer-only dump of the buffered entries.

use tracing::debug;

use crate::entries::Entries;
use crate::errors::DataLayerError;
use crate::escape::escape_html;
use crate::markup::MarkupWriter;

/// Where `DataLayerStore::dd` sends the entries before halting output.
pub trait DiagnosticSink {
    fn dump(&mut self, entries: &Entries, out: &mut dyn MarkupWriter) -> Result<(), DataLayerError>;
}

/// Pretty-printed JSON inside a `<pre>` block on the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreformattedDump;

impl DiagnosticSink for PreformattedDump {
    fn dump(&mut self, entries: &Entries, out: &mut dyn MarkupWriter) -> Result<(), DataLayerError> {
        let pretty = serde_json::to_string_pretty(entries)?;
        out.write_markup(&format!("<pre>{}</pre>", escape_html(&pretty)))
    }
}

/// Log-only dump; nothing reaches the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDump;

impl DiagnosticSink for TracingDump {
    fn dump(&mut self, entries: &Entries, _out: &mut dyn MarkupWriter) -> Result<(), DataLayerError> {
        let json = serde_json::to_string(entries)?;
        debug!(entries = %json, "data layer dump");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preformatted_dump_escapes_markup() {
        let mut e = Entries::new();
        e.insert("a".into(), json!("<b>"));
        let mut out = String::new();
        PreformattedDump.dump(&e, &mut out).unwrap();
        assert!(out.starts_with("<pre>"));
        assert!(out.contains("&lt;b&gt;"));
    }

    #[test]
    fn tracing_dump_writes_nothing() {
        let mut out = String::new();
        TracingDump.dump(&Entries::new(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}

//! HTML-safe JSON encoding for inline `<script>` embedding.
//!
//! `<` `>` `&` `'` `"` inside string literals are written as `\u003C`,
//! `\u003E`, `\u0026`, `\u0027` and `\u0022`, so a payload can never close the
//! surrounding script tag or break out of an attribute.

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter, Serializer};

use crate::errors::DataLayerError;

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (i, b) in bytes.iter().enumerate() {
            let esc: &[u8] = match b {
                b'<' => b"\\u003C",
                b'>' => b"\\u003E",
                b'&' => b"\\u0026",
                b'\'' => b"\\u0027",
                _ => continue,
            };
            writer.write_all(&bytes[start..i])?;
            writer.write_all(esc)?;
            start = i + 1;
        }
        writer.write_all(&bytes[start..])
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::Quote => writer.write_all(b"\\u0022"),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// Serialize any value to compact, HTML-safe JSON text.
pub fn to_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DataLayerError> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    String::from_utf8(buf).map_err(|e| DataLayerError::Output(e.to_string()))
}

/// Escape a plain string for interpolation into HTML text, attributes or a
/// single-quoted JS literal.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            '\\' => out.push_str("&#92;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_all_five_characters() {
        let s = to_safe_json(&json!({"k": "<>&'\""})).unwrap();
        assert_eq!(s, r#"{"k":"\u003C\u003E\u0026\u0027\u0022"}"#);
    }

    #[test]
    fn script_payload_cannot_close_tag() {
        let s = to_safe_json(&json!({"a": "<script>alert(1)</script>"})).unwrap();
        assert!(!s.contains("</script>"));
        assert!(!s.contains('<'));
        assert_eq!(s, r#"{"a":"\u003Cscript\u003Ealert(1)\u003C/script\u003E"}"#);
    }

    #[test]
    fn keys_are_escaped_too() {
        let s = to_safe_json(&json!({"<k>": 1})).unwrap();
        assert_eq!(s, r#"{"\u003Ck\u003E":1}"#);
    }

    #[test]
    fn plain_values_are_untouched() {
        let s = to_safe_json(&json!({"n": 1.5, "b": true, "z": null, "l": [1, "x"]})).unwrap();
        assert_eq!(s, r#"{"b":true,"l":[1,"x"],"n":1.5,"z":null}"#);
    }

    #[test]
    fn control_characters_keep_standard_escapes() {
        let s = to_safe_json(&json!("a\nb\\c")).unwrap();
        assert_eq!(s, r#""a\nb\\c""#);
    }

    #[test]
    fn escape_html_covers_quotes() {
        assert_eq!(escape_html(r#"GTM-<'">"#), "GTM-&lt;&#39;&quot;&gt;");
    }
}

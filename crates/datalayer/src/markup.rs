//! Output boundary and the fixed GTM snippets.

use crate::errors::DataLayerError;
use crate::escape::escape_html;

/// Name of the client-side queue.
pub const DATA_LAYER_NAME: &str = "dataLayer";

/// Sink for raw markup appended to the current response.
pub trait MarkupWriter {
    fn write_markup(&mut self, markup: &str) -> Result<(), DataLayerError>;
}

impl MarkupWriter for String {
    fn write_markup(&mut self, markup: &str) -> Result<(), DataLayerError> {
        self.push_str(markup);
        Ok(())
    }
}

/// One element per emission; keeps emission boundaries observable.
impl MarkupWriter for Vec<String> {
    fn write_markup(&mut self, markup: &str) -> Result<(), DataLayerError> {
        self.push(markup.to_string());
        Ok(())
    }
}

impl<W: MarkupWriter + ?Sized> MarkupWriter for &mut W {
    fn write_markup(&mut self, markup: &str) -> Result<(), DataLayerError> {
        (**self).write_markup(markup)
    }
}

pub fn init_snippet() -> String {
    format!("<script>window.{DATA_LAYER_NAME} = window.{DATA_LAYER_NAME} || [];</script>")
}

/// `json` must already be HTML-safe (see [`crate::escape::to_safe_json`]).
pub fn push_snippet(json: &str) -> String {
    format!("<script>window.{DATA_LAYER_NAME}.push({json});</script>")
}

pub fn script_snippet(tag_id: &str) -> String {
    let id = escape_html(tag_id);
    format!(
        "<!-- Google Tag Manager -->\n\
<script>(function(w,d,s,l,i){{w[l]=w[l]||[];w[l].push({{'gtm.start':\n\
new Date().getTime(),event:'gtm.js'}});var f=d.getElementsByTagName(s)[0],\n\
j=d.createElement(s),dl=l!=='dataLayer'?'&l='+l:'';j.async=true;j.src=\n\
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);\n\
}})(window,document,'script','{DATA_LAYER_NAME}','{id}');</script>\n\
<!-- End Google Tag Manager -->"
    )
}

pub fn no_script_snippet(tag_id: &str) -> String {
    let id = escape_html(tag_id);
    format!(
        "<!-- Google Tag Manager (noscript) -->\n\
<noscript><iframe src=\"https://www.googletagmanager.com/ns.html?id={id}\" height=\"0\" width=\"0\" style=\"display:none;visibility:hidden\"></iframe></noscript>\n\
<!-- End Google Tag Manager (noscript) -->"
    )
}

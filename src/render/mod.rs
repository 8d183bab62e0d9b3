//! Markdown rendering for page assets
//!
//! Pages are stored as markdown. `render_page` turns the raw content into an
//! HTML body using comrak with the common extensions enabled (tables,
//! strikethrough, autolinks, definition lists, smart punctuation). Raw HTML
//! embedded in the markdown is not passed through.

use comrak::{markdown_to_html, Options};
use serde::Serialize;

/// A page ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// The page path doubles as its title
    pub title: String,
    /// Rendered HTML
    pub body: String,
    /// Markdown as stored
    pub raw: String,
}

fn options() -> Options<'static> {
    let mut options = Options::default();
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.description_lists = true;
    options.parse.smart = true;
    options
}

/// Render stored markdown `raw` for the page at `path`
pub fn render_page(path: &str, raw: String) -> Page {
    let body = markdown_to_html(&raw, &options());
    Page {
        title: path.to_string(),
        body,
        raw,
    }
}

//! Text rendering of fetched bodies.
//!
//! Normal mode strips markup and prints only the text inside `<body>`,
//! decoding entity references. View-source mode prints the markup itself.

mod state;

use std::io::{self, Write};

use html_escape::{decode_html_entities, encode_quoted_attribute};

pub use state::{Emit, RenderState};

/// How a body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Visible text of the body region.
    #[default]
    Normal,
    /// Markup source; expects input produced by [`transform`].
    ViewSource,
}

/// Escape every character that has an HTML entity form (`& < > " '`).
///
/// Rendering the result in [`RenderMode::ViewSource`] reproduces `body` exactly.
pub fn transform(body: &str) -> String {
    encode_quoted_attribute(body).into_owned()
}

/// Render `body` to `out`.
///
/// An entity reference still open at the end of input is never written.
pub fn render<W: Write + ?Sized>(body: &str, mode: RenderMode, out: &mut W) -> io::Result<()> {
    match mode {
        RenderMode::ViewSource => out.write_all(decode_html_entities(body).as_bytes()),
        RenderMode::Normal => {
            let mut state = RenderState::new();
            for emit in body.chars().filter_map(|c| state.feed(c)) {
                write!(out, "{emit}")?;
            }
            Ok(())
        }
    }
}

/// Render `body` into a string.
pub fn render_to_string(body: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::ViewSource => decode_html_entities(body).into_owned(),
        RenderMode::Normal => {
            let mut state = RenderState::new();
            let mut text = String::with_capacity(body.len());
            for emit in body.chars().filter_map(|c| state.feed(c)) {
                match emit {
                    Emit::Char(c) => text.push(c),
                    Emit::Entity(s) => text.push_str(&s),
                }
            }
            text
        }
    }
}

//! A streaming Markdown to HTML renderer.
//!
//! Input arrives as text chunks of any size; finished blocks come back as
//! HTML fragments as soon as they are complete. The output does not depend
//! on where the input was split.
//!
//! ```
//! use streammark::{MarkdownParser, Options};
//!
//! let mut parser = MarkdownParser::new(Options::default());
//! let mut html = parser.push("# ti").unwrap();
//! html.extend(parser.push("tle\n\n*hi*").unwrap());
//! html.extend(parser.finish().unwrap());
//! assert_eq!(html.concat(), "<h1>title</h1><p><em>hi</em></p>");
//! ```
pub mod ast;
pub mod autolink;
pub mod buffer;
pub mod error;
pub mod html;
pub mod inline;
pub mod list;
pub mod options;
pub mod parser;
pub mod renderer;
pub mod scanner;
pub mod slug;

pub use error::{Error, HookError, HookKind};
pub use options::{Hooks, Options};
pub use parser::MarkdownParser;

/// Render a complete document with default options
pub fn markdown_to_html(markdown: &str) -> Result<String, Error> {
    render_chunks([markdown], Options::default(), Hooks::new())
}

/// Feed `chunks` through one parser and concatenate every fragment
pub fn render_chunks<'a, I>(chunks: I, options: Options, hooks: Hooks) -> Result<String, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parser = MarkdownParser::with_hooks(options, hooks);
    let mut html = String::new();
    for chunk in chunks {
        for fragment in parser.push(chunk)? {
            html.push_str(&fragment);
        }
    }
    for fragment in parser.finish()? {
        html.push_str(&fragment);
    }
    Ok(html)
}

/// Streaming Markdown parser: chunks in, HTML fragments out
use crate::ast::Block;
use crate::error::Error;
use crate::inline;
use crate::list::ListAccumulator;
use crate::options::{Hooks, Options};
use crate::renderer::HtmlRenderer;
use crate::scanner::{Event, Scanner};

/// One parser serves one input stream.
///
/// Fragments are returned as soon as the block they render is complete, so
/// the output of a `push` may lag the input by one open block. A fault
/// leaves the parser halted; every later call fails with [`Error::Halted`].
#[derive(Debug)]
pub struct MarkdownParser {
    scanner: Scanner,
    list: ListAccumulator,
    options: Options,
    hooks: Hooks,
    halted: bool,
}

impl MarkdownParser {
    pub fn new(options: Options) -> Self {
        Self::with_hooks(options, Hooks::new())
    }

    pub fn with_hooks(options: Options, hooks: Hooks) -> Self {
        MarkdownParser {
            scanner: Scanner::new(),
            list: ListAccumulator::new(),
            options,
            hooks,
            halted: false,
        }
    }

    /// Scan a chunk of input, returning every fragment it completed
    pub fn push(&mut self, chunk: &str) -> Result<Vec<String>, Error> {
        if self.halted {
            return Err(Error::Halted);
        }
        let result = self
            .scanner
            .feed_str(chunk)
            .and_then(|()| self.drain());
        self.halt_on_error(result)
    }

    /// Signal end of input: close the open block and any list run
    pub fn finish(mut self) -> Result<Vec<String>, Error> {
        if self.halted {
            return Err(Error::Halted);
        }
        let result = self.scanner.finish().and_then(|()| self.drain());
        self.halt_on_error(result)
    }

    fn halt_on_error<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            log::debug!("parser halted: {}", err);
            self.halted = true;
        }
        result
    }

    fn drain(&mut self) -> Result<Vec<String>, Error> {
        let renderer = HtmlRenderer::new(&self.options, &self.hooks);
        let mut fragments = Vec::new();
        for event in self.scanner.take_events() {
            let block = match event {
                Event::ListItem { kind, span } => {
                    let html = renderer.render_inlines(&inline::resolve(&span))?;
                    self.list.push(kind, html);
                    continue;
                }
                Event::ListEnd => {
                    if let Some(html) = self.list.finish() {
                        log::debug!("list complete: {} bytes", html.len());
                        fragments.push(html);
                    }
                    continue;
                }
                Event::Paragraph(span) => Block::Paragraph(inline::resolve(&span)),
                Event::Heading { level, span } => Block::Heading {
                    level,
                    children: inline::resolve(&span),
                },
                Event::Quote(span) => Block::BlockQuote(inline::resolve(&span)),
                Event::Code { language, literal } => Block::CodeBlock { language, literal },
                Event::Rule => Block::ThematicBreak,
                Event::Html(html) => Block::HtmlBlock(html),
            };
            fragments.push(renderer.render_block(&block)?);
        }
        Ok(fragments)
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fragments_arrive_as_blocks_complete() {
        let mut parser = MarkdownParser::default();
        assert_eq!(parser.push("blab").unwrap(), Vec::<String>::new());
        assert_eq!(
            parser.push("labla\n\nzzz").unwrap(),
            vec!["<p>blablabla</p>".to_string()]
        );
        assert_eq!(parser.finish().unwrap(), vec!["<p>zzz</p>".to_string()]);
    }

    #[test]
    fn test_list_flushes_when_run_ends() {
        let mut parser = MarkdownParser::default();
        assert_eq!(parser.push("- a\n- b\n").unwrap(), Vec::<String>::new());
        assert_eq!(
            parser.push("\n").unwrap(),
            vec!["<ul><li>a</li><li>b</li></ul>".to_string()]
        );
        assert_eq!(parser.finish().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_empty_chunks() {
        let mut parser = MarkdownParser::default();
        assert!(parser.push("").unwrap().is_empty());
        assert!(parser.finish().unwrap().is_empty());
    }

    #[test]
    fn test_hook_failure_halts_the_stream() {
        let hooks = Hooks::new().link_href(|_| Err("refused".into()));
        let mut parser = MarkdownParser::with_hooks(Options::default(), hooks);
        let err = parser.push("[a](b)\n\n").unwrap_err();
        assert!(matches!(err, Error::Hook { .. }));
        assert!(matches!(parser.push("more"), Err(Error::Halted)));
        assert!(matches!(parser.finish(), Err(Error::Halted)));
    }

    #[test]
    fn test_options_reach_the_renderer() {
        let options = Options::from_json(r#"{"languagePrefix": "lang-"}"#).unwrap();
        let mut parser = MarkdownParser::new(options);
        let mut html = parser.push("```rs\nfn main() {}\n```\n").unwrap();
        html.extend(parser.finish().unwrap());
        assert_eq!(
            html,
            vec!["<pre><code class=\"lang-rs\">fn main() {}</code></pre>".to_string()]
        );
    }
}

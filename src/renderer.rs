/// HTML renderer for finished blocks
use crate::ast::{Block, Inline};
use crate::error::{Error, HookKind};
use crate::options::{Hooks, Options};

pub struct HtmlRenderer<'a> {
    options: &'a Options,
    hooks: &'a Hooks,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(options: &'a Options, hooks: &'a Hooks) -> Self {
        HtmlRenderer { options, hooks }
    }

    pub fn render_block(&self, block: &Block) -> Result<String, Error> {
        let html = match block {
            Block::Paragraph(children) => format!("<p>{}</p>", self.render_inlines(children)?),
            Block::Heading { level, children } => {
                let content = self.render_inlines(children)?;
                format!("<h{}>{}</h{}>", level, content, level)
            }
            Block::CodeBlock { language, literal } => {
                let code = self.highlight(literal, language)?;
                if language.is_empty() {
                    format!("<pre><code>{}</code></pre>", code)
                } else {
                    format!(
                        "<pre><code class=\"{}{}\">{}</code></pre>",
                        escape_attribute(&self.options.language_prefix),
                        escape_attribute(language),
                        code
                    )
                }
            }
            Block::ThematicBreak => "<hr>".to_string(),
            Block::BlockQuote(children) => {
                let content = self.render_inlines(children)?;
                format!("<blockquote><p>{}</p></blockquote>", content)
            }
            Block::HtmlBlock(html) => html.clone(),
        };
        Ok(html)
    }

    pub fn render_inlines(&self, nodes: &[Inline]) -> Result<String, Error> {
        nodes.iter().map(|node| self.render_inline(node)).collect()
    }

    fn render_inline(&self, node: &Inline) -> Result<String, Error> {
        let html = match node {
            Inline::Text(text) => escape_html(text),
            Inline::Code(code) => format!("<code>{}</code>", escape_html(code)),
            Inline::Emphasis(children) => format!("<em>{}</em>", self.render_inlines(children)?),
            Inline::Strong(children) => {
                format!("<strong>{}</strong>", self.render_inlines(children)?)
            }
            Inline::Delete(children) => format!("<del>{}</del>", self.render_inlines(children)?),
            Inline::Link {
                destination,
                children,
            } => format!(
                "<a href=\"{}\">{}</a>",
                escape_attribute(&self.href(destination)?),
                self.render_inlines(children)?
            ),
            Inline::AutoLink(url) => format!(
                "<a href=\"{}\">{}</a>",
                escape_attribute(&self.href(url)?),
                escape_html(url)
            ),
            Inline::ReferenceLink { slug, children } => format!(
                "<a href=\"#{}\">{}</a>",
                escape_attribute(slug),
                self.render_inlines(children)?
            ),
            Inline::ReferenceDefinition {
                slug,
                destination,
                label,
            } => format!(
                "<a id=\"{}\" href=\"{}\">{}</a>",
                escape_attribute(slug),
                escape_attribute(&self.href(destination)?),
                escape_html(label)
            ),
            Inline::Image { destination, alt } => self.image(destination, &Inline::plain_text(alt))?,
        };
        Ok(html)
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, Error> {
        if let Some(hook) = &self.hooks.highlight {
            let html = hook(code, language).map_err(|source| Error::Hook {
                hook: HookKind::Highlight,
                source,
            })?;
            if !html.is_empty() {
                return Ok(html);
            }
        }
        Ok(escape_html(code))
    }

    fn href(&self, destination: &str) -> Result<String, Error> {
        match &self.hooks.link_href {
            Some(hook) => hook(destination).map_err(|source| Error::Hook {
                hook: HookKind::LinkHref,
                source,
            }),
            None => Ok(destination.to_string()),
        }
    }

    fn image(&self, src: &str, alt: &str) -> Result<String, Error> {
        match &self.hooks.media {
            Some(hook) => hook(src, alt).map_err(|source| Error::Hook {
                hook: HookKind::Media,
                source,
            }),
            None => Ok(format!(
                "<img alt=\"{}\" src=\"{}\">",
                escape_attribute(alt),
                escape_attribute(src)
            )),
        }
    }
}

fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

fn escape_attribute(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn render(block: &Block, hooks: &Hooks) -> Result<String, Error> {
        HtmlRenderer::new(&Options::default(), hooks).render_block(block)
    }

    #[test]
    fn test_text_is_escaped() {
        let block = Block::Paragraph(vec![text("1 & 1 < 3")]);
        assert_eq!(
            render(&block, &Hooks::new()).unwrap(),
            "<p>1 &amp; 1 &lt; 3</p>"
        );
    }

    #[test]
    fn test_code_block_language_class() {
        let block = Block::CodeBlock {
            language: "html".to_string(),
            literal: "<b>".to_string(),
        };
        assert_eq!(
            render(&block, &Hooks::new()).unwrap(),
            "<pre><code class=\"language-html\">&lt;b&gt;</code></pre>"
        );

        let options = Options {
            language_prefix: "lang-".to_string(),
        };
        let hooks = Hooks::new();
        let html = HtmlRenderer::new(&options, &hooks)
            .render_block(&block)
            .unwrap();
        assert_eq!(html, "<pre><code class=\"lang-html\">&lt;b&gt;</code></pre>");
    }

    #[test]
    fn test_highlight_hook() {
        let block = Block::CodeBlock {
            language: "rs".to_string(),
            literal: "fn".to_string(),
        };
        let hooks = Hooks::new().highlight(|code, language| {
            Ok(if language == "rs" {
                format!("<span>{}</span>", code)
            } else {
                String::new()
            })
        });
        assert_eq!(
            render(&block, &hooks).unwrap(),
            "<pre><code class=\"language-rs\"><span>fn</span></code></pre>"
        );

        let plain = Block::CodeBlock {
            language: "txt".to_string(),
            literal: "a<b".to_string(),
        };
        assert_eq!(
            render(&plain, &hooks).unwrap(),
            "<pre><code class=\"language-txt\">a&lt;b</code></pre>"
        );
    }

    #[test]
    fn test_link_href_hook_skips_fragments() {
        let hooks = Hooks::new().link_href(|href| Ok(format!("/out?to={}", href)));
        let block = Block::Paragraph(vec![
            Inline::Link {
                destination: "a.org".to_string(),
                children: vec![text("a")],
            },
            Inline::ReferenceLink {
                slug: "b".to_string(),
                children: vec![text("b")],
            },
        ]);
        assert_eq!(
            render(&block, &hooks).unwrap(),
            "<p><a href=\"/out?to=a.org\">a</a><a href=\"#b\">b</a></p>"
        );
    }

    #[test]
    fn test_image_and_media_hook() {
        let block = Block::Paragraph(vec![Inline::Image {
            destination: "../images/about.jpg".to_string(),
            alt: vec![text("drinking "), Inline::Emphasis(vec![text("face")])],
        }]);
        assert_eq!(
            render(&block, &Hooks::new()).unwrap(),
            "<p><img alt=\"drinking face\" src=\"../images/about.jpg\"></p>"
        );

        let hooks = Hooks::new().media(|src, alt| Ok(format!("<video src=\"{src}\" title=\"{alt}\">")));
        assert_eq!(
            render(&block, &hooks).unwrap(),
            "<p><video src=\"../images/about.jpg\" title=\"drinking face\"></p>"
        );
    }

    #[test]
    fn test_hook_failure_names_the_hook() {
        let hooks = Hooks::new().media(|_, _| Err("no media".into()));
        let block = Block::Paragraph(vec![Inline::Image {
            destination: "x.png".to_string(),
            alt: vec![],
        }]);
        let err = render(&block, &hooks).unwrap_err();
        assert!(matches!(
            err,
            Error::Hook {
                hook: HookKind::Media,
                ..
            }
        ));
        assert_eq!(err.to_string(), "media hook failed: no media");
    }

    #[test]
    fn test_reference_definition() {
        let block = Block::Paragraph(vec![Inline::ReferenceDefinition {
            slug: "example-and-you".to_string(),
            destination: "https://example.com/".to_string(),
            label: "EXAMPLE AND YOU".to_string(),
        }]);
        assert_eq!(
            render(&block, &Hooks::new()).unwrap(),
            "<p><a id=\"example-and-you\" href=\"https://example.com/\">EXAMPLE AND YOU</a></p>"
        );
    }
}
